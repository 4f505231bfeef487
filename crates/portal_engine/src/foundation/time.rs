//! Simulation time keeping

/// Fixed-step simulation clock
///
/// The simulation advances in discrete ticks; each tick runs to completion
/// before the next begins. The clock only accumulates, it never sleeps.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick_seconds: f32,
    total_time: f32,
    tick_count: u64,
}

impl SimulationClock {
    /// Create a clock that advances `tick_seconds` per tick
    pub fn new(tick_seconds: f32) -> Self {
        Self {
            tick_seconds,
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Advance the clock by one tick and return the new total time
    pub fn tick(&mut self) -> f32 {
        self.total_time += self.tick_seconds;
        self.tick_count += 1;
        self.total_time
    }

    /// Seconds per tick
    pub fn tick_seconds(&self) -> f32 {
        self.tick_seconds
    }

    /// Get the total elapsed simulation time in seconds
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}
