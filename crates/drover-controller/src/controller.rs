//! The controller facade: wires the estimator, histories, observation
//! assembler, reward accumulator, and contact guard into the surface the
//! environment drives once per sub-step / control step.

use nalgebra::{DVector, Vector3, Vector4};
use rand::Rng;

use drover_core::config::{ControllerConfig, DimensionConfig};
use drover_core::error::{ConfigError, DroverError, WorldError};
use drover_core::traits::{ArticulatedBody, RigidObject, SimWorld};
use drover_core::types::{Action, Observation};

use crate::estimator::{ObjectInfo, RobotState};
use crate::history::HistoryBuffer;
use crate::observation::ObservationAssembler;
use crate::rewards::{RewardAccumulator, RewardInputs};
use crate::termination::ContactGuard;

/// Frame tracked as the end-effector.
pub const EE_FRAME: &str = "ee_mount";

/// The only bodies allowed to touch the world.
pub const FOOT_LINKS: [&str; 4] = ["lf_shank", "rf_shank", "lh_shank", "rh_shank"];

/// Per-channel action scaling: command = action / std + mean.
const ACTION_MEAN: f64 = 0.0;
const ACTION_STD: f64 = 0.5;

/// Scale of the Gaussian noise the histories are refilled with at reset.
const HISTORY_NOISE_SCALE: f64 = 0.1;

/// Tolerance when comparing the world's sub-step against the configured one.
const DT_TOLERANCE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DroverController
// ---------------------------------------------------------------------------

/// Per-environment perception and reward-shaping core.
///
/// One instance per simulated environment; instances share nothing mutable.
/// The simulation world is borrowed per call and never stored.
#[derive(Debug)]
pub struct DroverController {
    dims: DimensionConfig,
    sim_dt: f64,
    control_dt: f64,

    state: RobotState,
    object_info: ObjectInfo,
    object_pos_w: Vector3<f64>,
    object_vel_w: Vector3<f64>,

    proprio_history: HistoryBuffer,
    extero_history: HistoryBuffer,
    action_history: HistoryBuffer,

    assembler: ObservationAssembler,
    rewards: RewardAccumulator,
    guard: ContactGuard,

    command: Vector3<f64>,
    target_pos: Vector3<f64>,
    object_geometry: Vector3<f64>,
    object_class: Vector4<f64>,
}

impl DroverController {
    /// Build a controller for the named robot in `world`.
    ///
    /// Fails fast on: a name registered under the wrong kind, a world
    /// sub-step that differs from the configured one, unresolvable foot or
    /// end-effector frames, and any dimension inconsistency.
    pub fn create(
        config: &ControllerConfig,
        world: &dyn SimWorld,
        robot_name: &str,
    ) -> Result<Self, DroverError> {
        config.validate().map_err(DroverError::Config)?;
        if config.dimension.action_dim < 2 {
            return Err(ConfigError::InvalidValue {
                field: "dimension.action_dim".into(),
                message: "command parsing needs at least 2 action channels".into(),
            }
            .into());
        }

        let robot = world.articulated(robot_name)?;

        let world_dt = world.sim_dt();
        if (world_dt - config.simulation.sim_dt).abs() > DT_TOLERANCE {
            return Err(ConfigError::TimestepMismatch {
                expected: config.simulation.sim_dt,
                got: world_dt,
            }
            .into());
        }

        let state = RobotState::new(robot.gc_dim(), robot.gv_dim()).map_err(DroverError::Config)?;
        robot
            .frame_position(EE_FRAME)
            .ok_or_else(|| WorldError::FrameNotFound(EE_FRAME.into()))?;

        let guard = ContactGuard::new(robot, &FOOT_LINKS, config.reward.terminal)?;
        let assembler =
            ObservationAssembler::new(&config.dimension).map_err(DroverError::Config)?;

        let dims = config.dimension.clone();
        Ok(Self {
            proprio_history: HistoryBuffer::new(dims.history_num, dims.proprioceptive_dim),
            extero_history: HistoryBuffer::new(dims.history_num, dims.exteroceptive_dim),
            action_history: HistoryBuffer::new(dims.action_history_num, dims.action_dim),
            sim_dt: config.simulation.sim_dt,
            control_dt: config.simulation.control_dt,
            state,
            object_info: ObjectInfo::zeroed(),
            object_pos_w: Vector3::zeros(),
            object_vel_w: Vector3::zeros(),
            assembler,
            rewards: RewardAccumulator::new(config.reward.clone(), config.simulation.sim_dt),
            guard,
            command: Vector3::zeros(),
            target_pos: Vector3::zeros(),
            object_geometry: Vector3::zeros(),
            object_class: Vector4::new(1.0, 0.0, 0.0, 0.0),
            dims,
        })
    }

    /// Start a new episode: store the goal and object geometry, refill every
    /// history with small Gaussian noise.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        target_pos: Vector3<f64>,
        object_geometry: Vector3<f64>,
    ) {
        self.target_pos = target_pos;
        self.object_geometry = object_geometry;
        self.proprio_history
            .reset_with_noise(rng, HISTORY_NOISE_SCALE);
        self.extero_history
            .reset_with_noise(rng, HISTORY_NOISE_SCALE);
        self.action_history
            .reset_with_noise(rng, HISTORY_NOISE_SCALE);
        self.command = Vector3::zeros();
    }

    /// Refresh the kinematic snapshot and the object feature block.
    /// Call once per physics sub-step, before reward accumulation.
    pub fn update_state_variables(
        &mut self,
        robot: &dyn ArticulatedBody,
        object: &dyn RigidObject,
    ) -> Result<(), WorldError> {
        self.state.refresh(robot, EE_FRAME)?;
        self.object_pos_w = object.position();
        self.object_vel_w = object.linear_velocity();
        self.object_info = ObjectInfo::compute(
            &self.state,
            object,
            &self.target_pos,
            &self.object_class,
            &self.object_geometry,
        );
        Ok(())
    }

    /// Rotate the proprioceptive and exteroceptive histories, capturing the
    /// latest samples. Call once per control step.
    pub fn update_history(&mut self) {
        self.proprio_history.push(&self.state.proprioceptive());
        self.extero_history.push(&self.object_info.to_vector());
    }

    /// Record the raw action and parse it into a planar command.
    pub fn advance(&mut self, action: &Action) -> Result<Vector3<f64>, ConfigError> {
        if action.dim() != self.dims.action_dim {
            return Err(ConfigError::DimensionMismatch {
                what: "action".into(),
                expected: self.dims.action_dim,
                got: action.dim(),
            });
        }
        self.action_history
            .push(&DVector::from_column_slice(action.as_slice()));
        self.command = Vector3::new(
            action[0] / ACTION_STD + ACTION_MEAN,
            action[1] / ACTION_STD + ACTION_MEAN,
            0.0,
        );
        Ok(self.command)
    }

    /// Integrate one sub-step of reward shaping.
    pub fn accumulate_rewards(
        &mut self,
        curriculum_factor: f64,
        command: &Vector3<f64>,
        robot: &dyn ArticulatedBody,
    ) {
        let input = RewardInputs {
            ee_pos: self.state.ee_pos_w,
            ee_vel: self.state.ee_vel_w,
            object_pos: self.object_pos_w,
            object_vel: self.object_vel_w,
            heading: self.state.heading(),
            target_pos: self.target_pos,
            command: *command,
            generalized_force_norm: robot.generalized_force().norm(),
        };
        self.rewards.accumulate(curriculum_factor, &input);
    }

    /// Read out and clear the accumulated reward. Call exactly once per
    /// control step or reward mass is lost or double-counted.
    pub fn reward_sum(&mut self) -> f64 {
        self.rewards.sum_and_reset()
    }

    /// Check the current contact set for illegal contacts.
    #[must_use]
    pub fn is_terminal(&self, robot: &dyn ArticulatedBody) -> (bool, f64) {
        self.guard.check(&robot.contacts())
    }

    /// Raw (unnormalized) observation for the current histories and state.
    #[must_use]
    pub fn raw_observation(&self) -> DVector<f64> {
        self.assembler.assemble(
            &self.proprio_history,
            &self.extero_history,
            &self.action_history,
            &self.state.proprioceptive(),
            &self.object_info.to_vector(),
        )
    }

    /// Normalized observation handed to the policy.
    #[must_use]
    pub fn observation(&self) -> Observation {
        self.assembler.normalize(&self.raw_observation())
    }

    /// Per-term reward breakdown captured at the last `reward_sum`.
    #[must_use]
    pub const fn step_data(&self) -> &[f64; 7] {
        self.rewards.step_data()
    }

    #[must_use]
    pub const fn step_data_tags() -> &'static [&'static str; 7] {
        RewardAccumulator::tags()
    }

    /// Swap the object class one-hot (the tracked object changed kind).
    pub fn set_object_class(&mut self, one_hot: Vector4<f64>) {
        self.object_class = one_hot;
    }

    // ---- fixed accessors ----

    #[must_use]
    pub fn ob_dim(&self) -> usize {
        self.assembler.ob_dim()
    }

    #[must_use]
    pub const fn action_dim(&self) -> usize {
        self.dims.action_dim
    }

    #[must_use]
    pub const fn sim_dt(&self) -> f64 {
        self.sim_dt
    }

    #[must_use]
    pub const fn control_dt(&self) -> f64 {
        self.control_dt
    }

    #[must_use]
    pub const fn state(&self) -> &RobotState {
        &self.state
    }

    #[must_use]
    pub const fn object_info(&self) -> &ObjectInfo {
        &self.object_info
    }

    #[must_use]
    pub const fn command(&self) -> &Vector3<f64> {
        &self.command
    }

    #[must_use]
    pub const fn target_position(&self) -> &Vector3<f64> {
        &self.target_pos
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use drover_core::config::{RewardCoeffConfig, SimulationConfig};
    use drover_test_utils::MockWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> ControllerConfig {
        ControllerConfig {
            simulation: SimulationConfig {
                sim_dt: 0.001,
                control_dt: 0.25,
                ..SimulationConfig::default()
            },
            dimension: DimensionConfig::default(),
            reward: RewardCoeffConfig {
                toward_object: 1.0,
                stay_object: 0.5,
                stay_object_heading: 0.4,
                toward_target: 1.5,
                stay_target: 0.8,
                command: -0.01,
                torque: -2e-5,
                terminal: -5.0,
            },
            curriculum: Default::default(),
        }
    }

    fn world() -> MockWorld {
        MockWorld::quadruped_scene(0.001)
    }

    fn controller(world: &MockWorld) -> DroverController {
        DroverController::create(&test_config(), world, MockWorld::ROBOT).unwrap()
    }

    // ---- create ----

    #[test]
    fn create_succeeds_for_reference_scene() {
        let w = world();
        let c = controller(&w);
        assert_eq!(c.ob_dim(), 245);
        assert_eq!(c.action_dim(), 2);
        assert!((c.sim_dt() - 0.001).abs() < f64::EPSILON);
        assert!((c.control_dt() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn create_rejects_wrong_kind() {
        let w = world();
        let err = DroverController::create(&test_config(), &w, MockWorld::OBJECT).unwrap_err();
        assert!(matches!(err, DroverError::World(WorldError::WrongKind { .. })));
    }

    #[test]
    fn create_rejects_unknown_name() {
        let w = world();
        let err = DroverController::create(&test_config(), &w, "ghost").unwrap_err();
        assert!(matches!(
            err,
            DroverError::World(WorldError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn create_rejects_dt_mismatch() {
        let w = MockWorld::quadruped_scene(0.002);
        let err = DroverController::create(&test_config(), &w, MockWorld::ROBOT).unwrap_err();
        assert!(matches!(
            err,
            DroverError::Config(ConfigError::TimestepMismatch { .. })
        ));
    }

    // ---- advance ----

    #[test]
    fn advance_parses_planar_command() {
        let w = world();
        let mut c = controller(&w);
        let command = c.advance(&Action::new(vec![0.5, -0.25])).unwrap();
        assert!((command - Vector3::new(1.0, -0.5, 0.0)).norm() < 1e-12);
        assert!((c.command() - &command).norm() < 1e-12);
    }

    #[test]
    fn advance_rejects_wrong_action_dim() {
        let w = world();
        let mut c = controller(&w);
        assert!(c.advance(&Action::new(vec![0.5])).is_err());
    }

    // ---- reset / observation ----

    #[test]
    fn reset_noisifies_histories() {
        let w = world();
        let mut c = controller(&w);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        c.reset(&mut rng, Vector3::new(1.0, 1.0, 0.35), Vector3::new(0.4, 0.4, 0.3));

        let raw = c.raw_observation();
        // history channels are noise-filled, so the raw vector is not all zero
        assert!(raw.iter().any(|v| v.abs() > 1e-6));
    }

    #[test]
    fn observation_shape_is_stable_across_steps() {
        let w = world();
        let mut c = controller(&w);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        c.reset(&mut rng, Vector3::new(1.0, 0.0, 0.35), Vector3::new(0.4, 0.4, 0.3));

        for _ in 0..3 {
            c.update_state_variables(&w.robot, &w.object).unwrap();
            c.update_history();
            assert_eq!(c.observation().len(), 245);
        }
    }

    #[test]
    fn observation_is_finite_for_reference_scene() {
        let w = world();
        let mut c = controller(&w);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        c.reset(&mut rng, Vector3::new(1.0, 0.0, 0.35), Vector3::new(0.4, 0.4, 0.3));
        c.update_state_variables(&w.robot, &w.object).unwrap();
        assert!(c.observation().is_finite());
    }

    // ---- rewards ----

    #[test]
    fn reward_sum_reads_once_then_zero() {
        let w = world();
        let mut c = controller(&w);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        c.reset(&mut rng, Vector3::new(1.0, 0.0, 0.35), Vector3::new(0.4, 0.4, 0.3));
        c.update_state_variables(&w.robot, &w.object).unwrap();

        let command = c.advance(&Action::new(vec![0.1, 0.0])).unwrap();
        c.accumulate_rewards(0.5, &command, &w.robot);
        let first = c.reward_sum();
        assert!(first.abs() > 0.0);
        let second = c.reward_sum();
        assert!(second.abs() < f64::EPSILON);
    }

    #[test]
    fn step_data_tags_align_with_breakdown() {
        let w = world();
        let mut c = controller(&w);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        c.reset(&mut rng, Vector3::new(1.0, 0.0, 0.35), Vector3::new(0.4, 0.4, 0.3));
        c.update_state_variables(&w.robot, &w.object).unwrap();
        let command = c.advance(&Action::new(vec![0.1, 0.0])).unwrap();
        c.accumulate_rewards(1.0, &command, &w.robot);
        let sum = c.reward_sum();

        assert_eq!(DroverController::step_data_tags().len(), c.step_data().len());
        let breakdown: f64 = c.step_data().iter().sum();
        assert!((sum - breakdown).abs() < 1e-12);
    }

    // ---- termination ----

    #[test]
    fn terminal_on_non_foot_contact() {
        let mut w = world();
        w.robot
            .set_contacts(vec![drover_core::types::Contact::new(0, false)]);
        let c = controller(&w);
        let (terminal, reward) = c.is_terminal(&w.robot);
        assert!(terminal);
        assert!((reward - (-5.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn running_on_foot_contacts_only() {
        let mut w = world();
        w.robot.set_contacts(vec![
            drover_core::types::Contact::new(3, false),
            drover_core::types::Contact::new(6, false),
        ]);
        let c = controller(&w);
        let (terminal, reward) = c.is_terminal(&w.robot);
        assert!(!terminal);
        assert!(reward.abs() < f64::EPSILON);
    }
}
