//! Kinematic state estimation.
//!
//! Converts raw generalized coordinates/velocities and the tracked object's
//! pose into body-frame quantities: base orientation, body-frame velocities,
//! and the exteroceptive [`ObjectInfo`] feature block. Everything here is
//! recomputed from scratch every physics sub-step; history retention lives
//! in [`crate::history`].

use nalgebra::{DVector, Matrix3, Quaternion, UnitQuaternion, Vector2, Vector3, Vector4};
use tracing::warn;

use drover_core::error::{ConfigError, WorldError};
use drover_core::traits::{ArticulatedBody, RigidObject};

/// Planar distances below this are treated as coincident points.
pub(crate) const DIRECTION_EPS: f64 = 1e-8;

/// Relative-distance observation channels are clamped to this value.
pub const MAX_FEATURE_DISTANCE: f64 = 2.0;

// ---------------------------------------------------------------------------
// Orientation helpers
// ---------------------------------------------------------------------------

/// Rotation matrix (body to world) from a w,x,y,z quaternion.
#[must_use]
pub fn quat_to_rot(w: f64, x: f64, y: f64, z: f64) -> Matrix3<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
        .to_rotation_matrix()
        .into_inner()
}

// ---------------------------------------------------------------------------
// PlanarFeature
// ---------------------------------------------------------------------------

/// A relative position expressed as a unit direction in the horizontal
/// body-frame plane plus a clamped scalar distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarFeature {
    pub direction: Vector2<f64>,
    pub distance: f64,
}

impl PlanarFeature {
    /// Build from a world-frame difference vector.
    ///
    /// The vertical component is dropped, the remainder rotated into the
    /// body frame, then split into unit direction and clamped distance.
    /// Coincident points yield a zero direction instead of a NaN.
    #[must_use]
    pub fn from_world_delta(delta: Vector3<f64>, base_rot: &Matrix3<f64>) -> Self {
        let mut planar = delta;
        planar.z = 0.0;
        let body = base_rot.transpose() * planar;
        let xy = body.xy();
        let distance = xy.norm();
        let direction = if distance < DIRECTION_EPS {
            warn!(distance, "degenerate planar feature; emitting zero direction");
            Vector2::zeros()
        } else {
            xy / distance
        };
        Self {
            direction,
            distance: distance.min(MAX_FEATURE_DISTANCE),
        }
    }

    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            direction: Vector2::new(0.0, 0.0),
            distance: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RobotState
// ---------------------------------------------------------------------------

/// Latest snapshot of the robot's kinematic state.
///
/// Owned exclusively by the controller and overwritten every sub-step.
#[derive(Debug, Clone)]
pub struct RobotState {
    gc: DVector<f64>,
    gv: DVector<f64>,
    n_joints: usize,
    /// Base rotation, body to world.
    pub base_rot: Matrix3<f64>,
    /// Base linear velocity in the body frame.
    pub body_lin_vel: Vector3<f64>,
    /// Base angular velocity in the body frame.
    pub body_ang_vel: Vector3<f64>,
    pub joint_velocity: DVector<f64>,
    /// End-effector position, world frame.
    pub ee_pos_w: Vector3<f64>,
    /// End-effector linear velocity, world frame.
    pub ee_vel_w: Vector3<f64>,
}

impl RobotState {
    /// Allocate for a floating-base robot with the given generalized
    /// dimensions. `gc_dim` must be `gv_dim + 1` (quaternion base) and the
    /// base itself accounts for 6 velocity coordinates.
    pub fn new(gc_dim: usize, gv_dim: usize) -> Result<Self, ConfigError> {
        if gv_dim <= 6 {
            return Err(ConfigError::DimensionMismatch {
                what: "generalized velocity".into(),
                expected: 7,
                got: gv_dim,
            });
        }
        if gc_dim != gv_dim + 1 {
            return Err(ConfigError::DimensionMismatch {
                what: "generalized coordinate".into(),
                expected: gv_dim + 1,
                got: gc_dim,
            });
        }
        let n_joints = gv_dim - 6;
        Ok(Self {
            gc: DVector::zeros(gc_dim),
            gv: DVector::zeros(gv_dim),
            n_joints,
            base_rot: Matrix3::identity(),
            body_lin_vel: Vector3::zeros(),
            body_ang_vel: Vector3::zeros(),
            joint_velocity: DVector::zeros(n_joints),
            ee_pos_w: Vector3::zeros(),
            ee_vel_w: Vector3::zeros(),
        })
    }

    /// Refresh every derived quantity from the articulated body.
    pub fn refresh(
        &mut self,
        robot: &dyn ArticulatedBody,
        ee_frame: &str,
    ) -> Result<(), WorldError> {
        robot.state(&mut self.gc, &mut self.gv);

        self.base_rot = quat_to_rot(self.gc[3], self.gc[4], self.gc[5], self.gc[6]);
        let lin_w = Vector3::new(self.gv[0], self.gv[1], self.gv[2]);
        let ang_w = Vector3::new(self.gv[3], self.gv[4], self.gv[5]);
        self.body_lin_vel = self.base_rot.transpose() * lin_w;
        self.body_ang_vel = self.base_rot.transpose() * ang_w;
        self.joint_velocity.copy_from(&self.gv.rows(6, self.n_joints));

        self.ee_pos_w = robot
            .frame_position(ee_frame)
            .ok_or_else(|| WorldError::FrameNotFound(ee_frame.into()))?;
        self.ee_vel_w = robot
            .frame_velocity(ee_frame)
            .ok_or_else(|| WorldError::FrameNotFound(ee_frame.into()))?;
        Ok(())
    }

    /// World z-axis expressed in the body frame.
    #[must_use]
    pub fn gravity_axis(&self) -> Vector3<f64> {
        self.base_rot.row(2).transpose()
    }

    /// Body x-axis projected onto the world horizontal plane.
    #[must_use]
    pub fn heading(&self) -> Vector3<f64> {
        Vector3::new(self.base_rot[(0, 0)], self.base_rot[(1, 0)], 0.0)
    }

    /// One proprioceptive sample: gravity axis + body-frame velocities.
    #[must_use]
    pub fn proprioceptive(&self) -> DVector<f64> {
        let mut sample = DVector::zeros(9);
        sample.rows_mut(0, 3).copy_from(&self.gravity_axis());
        sample.rows_mut(3, 3).copy_from(&self.body_lin_vel);
        sample.rows_mut(6, 3).copy_from(&self.body_ang_vel);
        sample
    }

    #[must_use]
    pub fn gc(&self) -> &DVector<f64> {
        &self.gc
    }

    #[must_use]
    pub fn gv(&self) -> &DVector<f64> {
        &self.gv
    }

    #[must_use]
    pub const fn n_joints(&self) -> usize {
        self.n_joints
    }
}

// ---------------------------------------------------------------------------
// ObjectInfo
// ---------------------------------------------------------------------------

/// Exteroceptive feature block describing the tracked object relative to
/// the robot. Computed fresh each sub-step; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub ee_to_object: PlanarFeature,
    pub object_to_target: PlanarFeature,
    pub ee_to_target: PlanarFeature,
    /// Object linear velocity, body frame.
    pub object_lin_vel_b: Vector3<f64>,
    /// Object angular velocity, body frame.
    pub object_ang_vel_b: Vector3<f64>,
    pub mass: f64,
    pub com: Vector3<f64>,
    /// Body-frame inertia tensor.
    pub inertia: Matrix3<f64>,
    /// Gravity row of the object orientation matrix.
    pub orientation_row: Vector3<f64>,
    pub class_one_hot: Vector4<f64>,
    pub geometry: Vector3<f64>,
}

impl ObjectInfo {
    /// Flattened feature length.
    pub const DIM: usize = 38;

    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            ee_to_object: PlanarFeature::zeroed(),
            object_to_target: PlanarFeature::zeroed(),
            ee_to_target: PlanarFeature::zeroed(),
            object_lin_vel_b: Vector3::zeros(),
            object_ang_vel_b: Vector3::zeros(),
            mass: 0.0,
            com: Vector3::zeros(),
            inertia: Matrix3::zeros(),
            orientation_row: Vector3::zeros(),
            class_one_hot: Vector4::zeros(),
            geometry: Vector3::zeros(),
        }
    }

    /// Derive the feature block from the latest robot state and the
    /// object's reported pose, velocities, and inertial properties.
    #[must_use]
    pub fn compute(
        state: &RobotState,
        object: &dyn RigidObject,
        target_pos: &Vector3<f64>,
        class_one_hot: &Vector4<f64>,
        geometry: &Vector3<f64>,
    ) -> Self {
        let object_pos = object.position();
        let rot_t = state.base_rot.transpose();

        Self {
            ee_to_object: PlanarFeature::from_world_delta(object_pos - state.ee_pos_w, &state.base_rot),
            object_to_target: PlanarFeature::from_world_delta(target_pos - object_pos, &state.base_rot),
            ee_to_target: PlanarFeature::from_world_delta(target_pos - state.ee_pos_w, &state.base_rot),
            object_lin_vel_b: rot_t * object.linear_velocity(),
            object_ang_vel_b: rot_t * object.angular_velocity(),
            mass: object.mass(),
            com: object.com(),
            inertia: object.inertia_body(),
            orientation_row: object.orientation().row(2).transpose(),
            class_one_hot: *class_one_hot,
            geometry: *geometry,
        }
    }

    /// Flatten into the fixed 38-element channel order: the three planar
    /// features (direction, distance), body-frame velocities, mass, COM,
    /// row-major inertia, orientation row, one-hot class, geometry.
    #[must_use]
    pub fn to_vector(&self) -> DVector<f64> {
        let mut v = DVector::zeros(Self::DIM);
        for (offset, feature) in [
            (0, &self.ee_to_object),
            (3, &self.object_to_target),
            (6, &self.ee_to_target),
        ] {
            v[offset] = feature.direction.x;
            v[offset + 1] = feature.direction.y;
            v[offset + 2] = feature.distance;
        }
        v.rows_mut(9, 3).copy_from(&self.object_lin_vel_b);
        v.rows_mut(12, 3).copy_from(&self.object_ang_vel_b);
        v[15] = self.mass;
        v.rows_mut(16, 3).copy_from(&self.com);
        for row in 0..3 {
            v.rows_mut(19 + 3 * row, 3)
                .copy_from(&self.inertia.row(row).transpose());
        }
        v.rows_mut(28, 3).copy_from(&self.orientation_row);
        v.rows_mut(31, 4).copy_from(&self.class_one_hot);
        v.rows_mut(35, 3).copy_from(&self.geometry);
        v
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
