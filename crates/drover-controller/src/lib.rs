//! Perception and reward-shaping core for a legged object-pushing task.
//!
//! The controller maintains rolling histories of proprioceptive,
//! exteroceptive, and action signals, assembles them into a normalized
//! fixed-length observation, accumulates a seven-term shaped reward over
//! physics sub-steps, and detects illegal-contact terminations.
//!
//! One [`DroverController`](controller::DroverController) per simulated
//! environment; the simulation world stays external and is borrowed per
//! call through the `drover-core` traits.

pub mod controller;
pub mod estimator;
pub mod history;
pub mod observation;
pub mod rewards;
pub mod termination;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::controller::{DroverController, EE_FRAME, FOOT_LINKS};
    pub use crate::estimator::{ObjectInfo, PlanarFeature, RobotState};
    pub use crate::history::HistoryBuffer;
    pub use crate::observation::ObservationAssembler;
    pub use crate::rewards::{RewardAccumulator, RewardInputs, STEP_DATA_TAGS};
    pub use crate::termination::ContactGuard;
}
