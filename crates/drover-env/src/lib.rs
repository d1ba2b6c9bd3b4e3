//! Environment glue for the drover controller: episode lifecycle,
//! curriculum schedule, and the control-step loop.

pub mod curriculum;
pub mod env;
pub mod episode;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::curriculum::Curriculum;
    pub use crate::env::{Environment, StepReport};
    pub use crate::episode::{Episode, EpisodeState};
}
