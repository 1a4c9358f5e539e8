//! Transport statistics collected while the world runs

use log::info;

/// Running totals for elevator trips
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub trips_requested: u32,
    pub trips_completed: u32,
    pub boardings: u32,
    pub transfers: u32,
    /// Sum of boarding waits in milliseconds
    pub total_wait_ms: f64,
    pub max_wait_ms: f64,
    pub fallback_walks: u32,
    pub abandoned_trips: u32,
    pub agents_spawned: u32,
    pub agents_removed: u32,
    /// Scaled milliseconds simulated
    pub elapsed_ms: f64,
}

impl SimStats {
    pub fn record_boarding(&mut self, waited_ms: f64) {
        self.boardings += 1;
        self.total_wait_ms += waited_ms;
        self.max_wait_ms = self.max_wait_ms.max(waited_ms);
    }

    pub fn average_wait_ms(&self) -> f64 {
        if self.boardings == 0 {
            0.0
        } else {
            self.total_wait_ms / self.boardings as f64
        }
    }

    /// Percentage of requested trips that reached their room
    pub fn completion_rate(&self) -> f32 {
        if self.trips_requested == 0 {
            0.0
        } else {
            self.trips_completed as f32 / self.trips_requested as f32 * 100.0
        }
    }

    pub fn log_summary(&self, active_agents: usize, shafts: usize) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {:.2}s", self.elapsed_ms / 1000.0);
        info!("Agents spawned: {}", self.agents_spawned);
        info!("Agents removed: {}", self.agents_removed);
        info!("Active agents: {}", active_agents);
        info!("Elevator shafts: {}", shafts);
        info!("Trips requested: {}", self.trips_requested);
        info!("Trips completed: {}", self.trips_completed);
        info!("Elevator boardings: {}", self.boardings);
        info!("Sky lobby transfers: {}", self.transfers);
        info!(
            "Average wait: {:.1}s (max {:.1}s)",
            self.average_wait_ms() / 1000.0,
            self.max_wait_ms / 1000.0
        );
        info!("Fallback walks: {}", self.fallback_walks);
        info!("Abandoned trips: {}", self.abandoned_trips);
        info!("Success rate: {:.1}%", self.completion_rate());
    }
}
