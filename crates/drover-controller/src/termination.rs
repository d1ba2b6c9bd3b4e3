//! Illegal-contact detection.
//!
//! Only the four feet may touch the world. Any contact on another body, or
//! any self-collision, ends the episode with a fixed penalty.

use drover_core::error::WorldError;
use drover_core::traits::ArticulatedBody;
use drover_core::types::Contact;

// ---------------------------------------------------------------------------
// ContactGuard
// ---------------------------------------------------------------------------

/// Checks the contact set against the configured foot bodies.
#[derive(Debug, Clone)]
pub struct ContactGuard {
    foot_indices: [usize; 4],
    terminal_coeff: f64,
}

impl ContactGuard {
    /// Resolve the four foot link names on the robot. Any unresolved name
    /// is a fatal error at construction.
    pub fn new(
        robot: &dyn ArticulatedBody,
        foot_links: &[&str; 4],
        terminal_coeff: f64,
    ) -> Result<Self, WorldError> {
        let mut foot_indices = [0usize; 4];
        for (slot, link) in foot_indices.iter_mut().zip(foot_links.iter()) {
            *slot = robot
                .body_index(link)
                .ok_or_else(|| WorldError::BodyNotFound((*link).into()))?;
        }
        Ok(Self {
            foot_indices,
            terminal_coeff,
        })
    }

    /// `(true, terminal_coeff)` if any contact violates the foot whitelist
    /// or is a self-collision, `(false, 0.0)` otherwise.
    #[must_use]
    pub fn check(&self, contacts: &[Contact]) -> (bool, f64) {
        for contact in contacts {
            if contact.self_collision || !self.foot_indices.contains(&contact.local_body_index) {
                return (true, self.terminal_coeff);
            }
        }
        (false, 0.0)
    }

    #[must_use]
    pub const fn foot_indices(&self) -> &[usize; 4] {
        &self.foot_indices
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
