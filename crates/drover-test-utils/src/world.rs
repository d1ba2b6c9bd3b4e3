//! Settable mock implementations of the world-seam traits.
//!
//! The mock world integrates kinematically (positions advance by velocity
//! times `sim_dt`), which is enough motion for environment-loop tests
//! without a physics engine.

use std::collections::HashMap;

use nalgebra::{DVector, Matrix3, Vector3};

use drover_core::error::WorldError;
use drover_core::traits::{ArticulatedBody, RigidObject, SimWorld, WorldControl};
use drover_core::types::Contact;

// ---------------------------------------------------------------------------
// MockRobot
// ---------------------------------------------------------------------------

/// A floating-base quadruped stub with settable state.
#[derive(Debug, Clone)]
pub struct MockRobot {
    pub gc: DVector<f64>,
    pub gv: DVector<f64>,
    pub generalized_force: DVector<f64>,
    bodies: HashMap<String, usize>,
    frames: HashMap<String, (Vector3<f64>, Vector3<f64>)>,
    contacts: Vec<Contact>,
}

impl MockRobot {
    /// End-effector frame registered by [`MockRobot::quadruped`].
    pub const EE_FRAME: &'static str = "ee_mount";

    /// Foot links registered by [`MockRobot::quadruped`], as body indices
    /// 3, 6, 9, 12.
    pub const FOOT_LINKS: [&'static str; 4] = ["lf_shank", "rf_shank", "lh_shank", "rh_shank"];

    /// A 12-joint quadruped at the origin: gc = 19 (base pose 7 + joints),
    /// gv = 18 (base twist 6 + joints), identity orientation, at rest, with
    /// the end-effector frame 0.4 m ahead of the base.
    #[must_use]
    pub fn quadruped() -> Self {
        let mut gc = DVector::zeros(19);
        gc[3] = 1.0; // unit quaternion w
        let mut bodies = HashMap::new();
        bodies.insert("trunk".to_string(), 0);
        for (i, link) in Self::FOOT_LINKS.iter().enumerate() {
            bodies.insert((*link).to_string(), 3 * (i + 1));
        }
        let mut frames = HashMap::new();
        frames.insert(
            Self::EE_FRAME.to_string(),
            (Vector3::new(0.4, 0.0, 0.35), Vector3::zeros()),
        );
        Self {
            gc,
            gv: DVector::zeros(18),
            generalized_force: DVector::zeros(18),
            bodies,
            frames,
            contacts: Vec::new(),
        }
    }

    pub fn set_base_position(&mut self, position: Vector3<f64>) {
        self.gc.rows_mut(0, 3).copy_from(&position);
    }

    /// Set the base quaternion (w, x, y, z).
    pub fn set_base_orientation(&mut self, w: f64, x: f64, y: f64, z: f64) {
        self.gc[3] = w;
        self.gc[4] = x;
        self.gc[5] = y;
        self.gc[6] = z;
    }

    pub fn set_base_velocity(&mut self, linear: Vector3<f64>, angular: Vector3<f64>) {
        self.gv.rows_mut(0, 3).copy_from(&linear);
        self.gv.rows_mut(3, 3).copy_from(&angular);
    }

    /// Register or move a named frame.
    pub fn set_frame(&mut self, name: &str, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.frames.insert(name.to_string(), (position, velocity));
    }

    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
    }

    pub fn set_generalized_force(&mut self, force: DVector<f64>) {
        self.generalized_force = force;
    }

    /// Advance base and frame positions by their velocities.
    pub fn integrate(&mut self, dt: f64) {
        let lin = Vector3::new(self.gv[0], self.gv[1], self.gv[2]);
        let base = Vector3::new(self.gc[0], self.gc[1], self.gc[2]) + lin * dt;
        self.gc.rows_mut(0, 3).copy_from(&base);
        for (pos, vel) in self.frames.values_mut() {
            *pos += *vel * dt;
        }
    }
}

impl ArticulatedBody for MockRobot {
    fn gc_dim(&self) -> usize {
        self.gc.len()
    }

    fn gv_dim(&self) -> usize {
        self.gv.len()
    }

    fn state(&self, gc: &mut DVector<f64>, gv: &mut DVector<f64>) {
        gc.copy_from(&self.gc);
        gv.copy_from(&self.gv);
    }

    fn generalized_force(&self) -> DVector<f64> {
        self.generalized_force.clone()
    }

    fn body_index(&self, link_name: &str) -> Option<usize> {
        self.bodies.get(link_name).copied()
    }

    fn frame_position(&self, frame_name: &str) -> Option<Vector3<f64>> {
        self.frames.get(frame_name).map(|(pos, _)| *pos)
    }

    fn frame_velocity(&self, frame_name: &str) -> Option<Vector3<f64>> {
        self.frames.get(frame_name).map(|(_, vel)| *vel)
    }

    fn contacts(&self) -> Vec<Contact> {
        self.contacts.clone()
    }
}

// ---------------------------------------------------------------------------
// MockObject
// ---------------------------------------------------------------------------

/// A rigid object with directly settable state.
#[derive(Debug, Clone)]
pub struct MockObject {
    pub position: Vector3<f64>,
    pub linear_velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub mass: f64,
    pub com: Vector3<f64>,
    pub inertia: Matrix3<f64>,
    pub orientation: Matrix3<f64>,
}

impl MockObject {
    /// A 1 kg unit box at the origin.
    #[must_use]
    pub fn unit_box() -> Self {
        Self {
            position: Vector3::zeros(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass: 1.0,
            com: Vector3::zeros(),
            inertia: Matrix3::identity(),
            orientation: Matrix3::identity(),
        }
    }

    pub fn integrate(&mut self, dt: f64) {
        self.position += self.linear_velocity * dt;
    }
}

impl RigidObject for MockObject {
    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn com(&self) -> Vector3<f64> {
        self.com
    }

    fn inertia_body(&self) -> Matrix3<f64> {
        self.inertia
    }

    fn orientation(&self) -> Matrix3<f64> {
        self.orientation
    }
}

// ---------------------------------------------------------------------------
// MockWorld
// ---------------------------------------------------------------------------

/// A world with one robot and one tracked object.
#[derive(Debug, Clone)]
pub struct MockWorld {
    pub robot: MockRobot,
    pub object: MockObject,
    sim_dt: f64,
}

impl MockWorld {
    /// Name the robot is registered under.
    pub const ROBOT: &'static str = "robot";

    /// Name the tracked object is registered under.
    pub const OBJECT: &'static str = "object";

    /// Quadruped + unit box, with the given physics sub-step.
    #[must_use]
    pub fn quadruped_scene(sim_dt: f64) -> Self {
        let mut object = MockObject::unit_box();
        object.position = Vector3::new(2.0, 0.0, 0.35);
        Self {
            robot: MockRobot::quadruped(),
            object,
            sim_dt,
        }
    }
}

impl SimWorld for MockWorld {
    fn articulated(&self, name: &str) -> Result<&dyn ArticulatedBody, WorldError> {
        if name == Self::ROBOT {
            Ok(&self.robot)
        } else if name == Self::OBJECT {
            Err(WorldError::WrongKind {
                name: name.to_string(),
                expected: "articulated body".to_string(),
            })
        } else {
            Err(WorldError::ObjectNotFound(name.to_string()))
        }
    }

    fn rigid(&self, name: &str) -> Result<&dyn RigidObject, WorldError> {
        if name == Self::OBJECT {
            Ok(&self.object)
        } else if name == Self::ROBOT {
            Err(WorldError::WrongKind {
                name: name.to_string(),
                expected: "rigid object".to_string(),
            })
        } else {
            Err(WorldError::ObjectNotFound(name.to_string()))
        }
    }

    fn sim_dt(&self) -> f64 {
        self.sim_dt
    }

    fn integrate(&mut self) {
        self.robot.integrate(self.sim_dt);
        self.object.integrate(self.sim_dt);
    }
}

impl WorldControl for MockWorld {
    fn set_rigid_pose(
        &mut self,
        name: &str,
        position: Vector3<f64>,
        orientation: Matrix3<f64>,
    ) -> Result<(), WorldError> {
        if name != Self::OBJECT {
            return Err(WorldError::ObjectNotFound(name.to_string()));
        }
        self.object.position = position;
        self.object.orientation = orientation;
        self.object.linear_velocity = Vector3::zeros();
        self.object.angular_velocity = Vector3::zeros();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
