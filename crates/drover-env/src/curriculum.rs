//! Curriculum schedule.
//!
//! The factor scales reward magnitude and is raised to `decay_factor` after
//! each training iteration, drifting from `initial_factor` toward 1.

use drover_core::config::CurriculumConfig;

#[derive(Debug, Clone)]
pub struct Curriculum {
    factor: f64,
    decay: f64,
}

impl Curriculum {
    #[must_use]
    pub fn new(config: &CurriculumConfig) -> Self {
        Self {
            factor: config.initial_factor,
            decay: config.decay_factor,
        }
    }

    /// Current factor in (0, 1].
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Raise the factor one iteration: `factor ← factor^decay`.
    pub fn advance(&mut self) {
        self.factor = self.factor.powf(self.decay);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
