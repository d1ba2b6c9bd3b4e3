//! The narrow seam between the controller and the external simulation world.
//!
//! The physics engine owns the bodies; the controller only ever sees them
//! through these traits, borrowed per call. Lookup is by name and checked
//! for kind — asking for an articulated body under a name registered as a
//! plain rigid object is a typed error, not a cast.

use nalgebra::{DVector, Matrix3, Vector3};

use crate::error::WorldError;
use crate::types::Contact;

// ---------------------------------------------------------------------------
// ArticulatedBody
// ---------------------------------------------------------------------------

/// Read access to an articulated (jointed, floating-base) body.
///
/// Generalized coordinates are laid out as base position (3), base
/// orientation quaternion w,x,y,z (4), then joint angles; generalized
/// velocities as base linear (3), base angular (3), then joint velocities.
pub trait ArticulatedBody {
    /// Generalized coordinate dimension.
    fn gc_dim(&self) -> usize;

    /// Generalized velocity dimension.
    fn gv_dim(&self) -> usize;

    /// Copy the current generalized coordinates and velocities into the
    /// caller-provided vectors. Both must already have the right length.
    fn state(&self, gc: &mut DVector<f64>, gv: &mut DVector<f64>);

    /// Generalized force vector (one entry per velocity coordinate).
    fn generalized_force(&self) -> DVector<f64>;

    /// Index of a named body, if present.
    fn body_index(&self, link_name: &str) -> Option<usize>;

    /// World-frame position of a named frame.
    fn frame_position(&self, frame_name: &str) -> Option<Vector3<f64>>;

    /// World-frame linear velocity of a named frame.
    fn frame_velocity(&self, frame_name: &str) -> Option<Vector3<f64>>;

    /// Contacts involving this body, as reported by the last physics step.
    fn contacts(&self) -> Vec<Contact>;
}

// ---------------------------------------------------------------------------
// RigidObject
// ---------------------------------------------------------------------------

/// Read access to a single rigid body tracked by the controller.
pub trait RigidObject {
    /// World-frame position.
    fn position(&self) -> Vector3<f64>;

    /// World-frame linear velocity.
    fn linear_velocity(&self) -> Vector3<f64>;

    /// World-frame angular velocity.
    fn angular_velocity(&self) -> Vector3<f64>;

    fn mass(&self) -> f64;

    /// Center of mass in the body frame.
    fn com(&self) -> Vector3<f64>;

    /// 3x3 inertia tensor in the body frame.
    fn inertia_body(&self) -> Matrix3<f64>;

    /// Rotation matrix (body to world).
    fn orientation(&self) -> Matrix3<f64>;
}

// ---------------------------------------------------------------------------
// SimWorld
// ---------------------------------------------------------------------------

/// The simulation world as seen by the controller and environment glue.
///
/// Bodies are looked up by name; a lookup under the wrong kind fails with
/// [`WorldError::WrongKind`]. `integrate` advances physics by one sub-step
/// of `sim_dt` seconds; the integration itself is the engine's business.
pub trait SimWorld {
    /// Look up a named articulated body.
    fn articulated(&self, name: &str) -> Result<&dyn ArticulatedBody, WorldError>;

    /// Look up a named rigid object.
    fn rigid(&self, name: &str) -> Result<&dyn RigidObject, WorldError>;

    /// Fixed physics sub-step duration in seconds.
    fn sim_dt(&self) -> f64;

    /// Advance physics by one sub-step.
    fn integrate(&mut self);
}

// ---------------------------------------------------------------------------
// WorldControl
// ---------------------------------------------------------------------------

/// Episode-reset mutations the environment applies to the world.
pub trait WorldControl {
    /// Place a named rigid object at a pose (orientation is body-to-world).
    fn set_rigid_pose(
        &mut self,
        name: &str,
        position: Vector3<f64>,
        orientation: Matrix3<f64>,
    ) -> Result<(), WorldError>;
}
