use std::process::{Command, Output};

fn run_headless(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_arcology"))
        .args(args)
        .env("RUST_LOG", "warn,arcology=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Pull the number after `label` out of the log output
fn logged_value(stderr: &str, label: &str) -> f32 {
    let line = stderr
        .lines()
        .find(|line| line.contains(label))
        .unwrap_or_else(|| panic!("Could not find '{}' line", label));

    // Format: "[2026-10-17T09:12:44Z INFO  arcology::simulation::stats] Success rate: 76.2%"
    let parts: Vec<&str> = line.split(label).collect();
    let value = parts
        .get(1)
        .map(|s| s.trim().trim_end_matches('%'))
        .unwrap_or_else(|| panic!("Could not parse value from line: {}", line));
    value
        .parse()
        .unwrap_or_else(|_| panic!("Could not parse '{}' as a number", value))
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_headless(&["--ticks", "1200", "--quiet", "--seed", "1"]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that transport statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_headless(&["--ticks", "1200", "--quiet", "--seed", "1"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in [
        "Trips requested:",
        "Trips completed:",
        "Elevator boardings:",
        "Sky lobby transfers:",
        "Fallback walks:",
        "Abandoned trips:",
        "Success rate:",
    ] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }
}

/// Test that residents ride the elevators during a working morning
#[test]
fn test_elevators_carry_commuters() {
    let output = run_headless(&["--ticks", "1500", "--quiet", "--seed", "7"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(logged_value(&stderr, "Trips requested:") > 0.0);
    assert!(
        logged_value(&stderr, "Elevator boardings:") > 0.0,
        "Nobody boarded an elevator"
    );
    assert!(logged_value(&stderr, "Trips completed:") > 0.0);
}

#[test]
fn test_invalid_speed_is_rejected() {
    let output = run_headless(&["--ticks", "10", "--speed", "3"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid speed"), "stderr: {}", stderr);
}

#[test]
fn test_paused_run_simulates_nothing() {
    let output = run_headless(&["--ticks", "100", "--quiet", "--speed", "0"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(logged_value(&stderr, "Trips completed:"), 0.0);
    assert!(stderr.contains("Day 1 (Monday) 06:00"), "stderr: {}", stderr);
}
