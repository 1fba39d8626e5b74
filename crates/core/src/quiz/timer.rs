/// Default per-session time budget.
pub const DEFAULT_TIME_BUDGET_SECS: u32 = 300;

/// Result of feeding one elapsed second to a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// The countdown is stopped; the tick had no effect.
    Idle,
    Running { remaining: u32 },
    /// Reached zero on this tick. Reported once; the countdown stops itself.
    Expired,
}

/// Whole-second countdown driven by explicit ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    /// A stopped countdown. A zero budget is raised to one second.
    #[must_use]
    pub fn new(budget_secs: u32) -> Self {
        let budget = budget_secs.max(1);
        Self {
            budget,
            remaining: budget,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> CountdownTick {
        if !self.running {
            return CountdownTick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            CountdownTick::Expired
        } else {
            CountdownTick::Running {
                remaining: self.remaining,
            }
        }
    }

    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.budget - self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_BUDGET_SECS)
    }
}
