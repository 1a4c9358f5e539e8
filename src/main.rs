use anyhow::Result;
use clap::Parser;
use log::info;

use arcology::simulation::{SimWorld, MS_PER_GAME_HOUR};

#[derive(Parser)]
#[command(name = "arcology")]
#[command(about = "Tower simulation with a zoned elevator network, run headless")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "6000")]
    ticks: u32,

    /// Time delta per tick in milliseconds
    #[arg(long, default_value = "100")]
    delta: f32,

    /// Speed multiplier (0 pauses, 1, 2 or 4)
    #[arg(long, default_value = "1")]
    speed: u32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Only log the final statistics
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,arcology=info"))
        .init();

    let cli = Cli::parse();
    if cli.delta <= 0.0 {
        anyhow::bail!("--delta must be positive, got {}", cli.delta);
    }
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    let mut world = match cli.seed {
        Some(seed) => SimWorld::create_test_world_with_seed(seed),
        None => SimWorld::create_test_world(),
    };
    world.set_speed(cli.speed)?;

    // Report once per game hour of simulated time
    let scaled_delta = cli.delta * cli.speed.max(1) as f32;
    let ticks_per_report = ((MS_PER_GAME_HOUR / scaled_delta).ceil() as u32).max(1);

    if !cli.quiet {
        println!("Running arcology simulation in headless mode...");
        println!(
            "Ticks: {}, Delta: {}ms, Speed: {}x",
            cli.ticks, cli.delta, cli.speed
        );
        println!("Reporting every {} ticks (one game hour)", ticks_per_report);
        println!();
        println!("Initial state:");
        world.print_summary();
        world.draw_tower();
        println!();
    }

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_report.min(cli.ticks - tick);
        for _ in 0..ticks_to_run {
            tick += 1;
            world.tick(cli.delta);
        }

        if !cli.quiet {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick,
                world.stats.elapsed_ms / 1000.0
            );
            world.print_summary();
            world.draw_tower();
            println!();
        }
    }

    if !cli.quiet {
        println!("=== Final State ===");
        world.print_summary();
        world.draw_tower();
    }

    info!("Finished at {}", world.time);
    world
        .stats
        .log_summary(world.agents.len(), world.elevators.shaft_count());
    Ok(())
}
