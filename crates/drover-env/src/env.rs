//! The control-step loop tying controller and world together.
//!
//! One `Environment` per parallel rollout. Each control step runs many
//! physics sub-steps: integrate, refresh the kinematic state, accumulate
//! rewards, and bail out early on an illegal contact. The reward sum is
//! read exactly once per control step.

use nalgebra::{DVector, Matrix3, Vector3};
use rand::Rng;
use tracing::{debug, warn};

use drover_controller::controller::DroverController;
use drover_core::config::ControllerConfig;
use drover_core::error::DroverError;
use drover_core::traits::{SimWorld, WorldControl};
use drover_core::types::{Action, Observation};

use crate::curriculum::Curriculum;
use crate::episode::{Episode, EpisodeState};

/// Objects spawn on a circle of this radius around the robot base.
const OBJECT_SPAWN_RADIUS: f64 = 2.0;

/// Targets are sampled at this distance from the object.
const TARGET_OFFSET: f64 = std::f64::consts::SQRT_2;

/// Spawn height for the object and target.
const SPAWN_HEIGHT: f64 = 0.35;

// ---------------------------------------------------------------------------
// StepReport
// ---------------------------------------------------------------------------

/// Result of one control step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub observation: Observation,
    pub reward: f64,
    /// Episode ended by an illegal contact or a non-finite observation.
    pub terminated: bool,
    /// Episode ended by the step limit.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Drives one controller against one world.
#[derive(Debug)]
pub struct Environment<W> {
    world: W,
    controller: DroverController,
    episode: Episode,
    curriculum: Curriculum,
    robot_name: String,
    object_name: String,
    object_geometry: Vector3<f64>,
    substeps: usize,
}

impl<W: SimWorld + WorldControl> Environment<W> {
    /// Build an environment around `world`. Both names are capability
    /// checked up front.
    pub fn new(
        world: W,
        config: &ControllerConfig,
        robot_name: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Result<Self, DroverError> {
        let robot_name = robot_name.into();
        let object_name = object_name.into();
        let controller = DroverController::create(config, &world, &robot_name)?;
        world.rigid(&object_name)?;
        Ok(Self {
            world,
            controller,
            episode: Episode::new(config.simulation.max_episode_steps),
            curriculum: Curriculum::new(&config.curriculum),
            robot_name,
            object_name,
            object_geometry: Vector3::new(0.4, 0.4, 0.3),
            substeps: config.simulation.substeps(),
        })
    }

    /// Geometry descriptor forwarded into the controller's object features.
    pub fn set_object_geometry(&mut self, geometry: Vector3<f64>) {
        self.object_geometry = geometry;
    }

    /// Start a new episode: place the object on a circle around the robot,
    /// sample the goal near the object, and noisify the controller's
    /// histories.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Observation, DroverError> {
        let (base_x, base_y) = {
            let robot = self.world.articulated(&self.robot_name)?;
            let mut gc = DVector::zeros(robot.gc_dim());
            let mut gv = DVector::zeros(robot.gv_dim());
            robot.state(&mut gc, &mut gv);
            (gc[0], gc[1])
        };

        let phi = rng.gen::<f64>() * std::f64::consts::TAU;
        let object_pos = Vector3::new(
            base_x + OBJECT_SPAWN_RADIUS * phi.cos(),
            base_y + OBJECT_SPAWN_RADIUS * phi.sin(),
            SPAWN_HEIGHT,
        );
        let psi = rng.gen::<f64>() * std::f64::consts::TAU;
        let target_pos = Vector3::new(
            object_pos.x + TARGET_OFFSET * psi.cos(),
            object_pos.y + TARGET_OFFSET * psi.sin(),
            SPAWN_HEIGHT,
        );

        self.world
            .set_rigid_pose(&self.object_name, object_pos, Matrix3::identity())?;
        self.controller.reset(rng, target_pos, self.object_geometry);

        let robot = self.world.articulated(&self.robot_name)?;
        let object = self.world.rigid(&self.object_name)?;
        self.controller.update_state_variables(robot, object)?;

        self.episode.reset();
        debug!(?object_pos, ?target_pos, "episode reset");
        Ok(self.controller.observation())
    }

    /// Run one control step: parse the action into a command, integrate
    /// `substeps` physics sub-steps with reward accumulation, rotate the
    /// histories, and read out the reward.
    pub fn step(&mut self, action: &Action) -> Result<StepReport, DroverError> {
        if !self.episode.is_running() {
            return Err(DroverError::EpisodeNotRunning);
        }

        let command = self.controller.advance(action).map_err(DroverError::Config)?;
        let curriculum_factor = self.curriculum.factor();

        let mut terminated = false;
        let mut terminal_reward = 0.0;
        for _ in 0..self.substeps {
            self.world.integrate();
            let robot = self.world.articulated(&self.robot_name)?;
            let object = self.world.rigid(&self.object_name)?;
            self.controller.update_state_variables(robot, object)?;
            self.controller
                .accumulate_rewards(curriculum_factor, &command, robot);

            let (is_terminal, reward) = self.controller.is_terminal(robot);
            if is_terminal {
                terminated = true;
                terminal_reward = reward;
                break;
            }
        }

        self.controller.update_history();
        let reward = self.controller.reward_sum() + terminal_reward;

        self.episode.record_step(reward);
        if terminated {
            self.episode.finish();
        }

        let observation = self.controller.observation();
        if !observation.is_finite() {
            warn!("non-finite observation; forcing episode termination");
            self.episode.finish();
            terminated = true;
        }

        Ok(StepReport {
            observation,
            reward,
            terminated,
            truncated: self.episode.state() == EpisodeState::Truncated,
        })
    }

    /// Assemble and normalize the current observation without stepping.
    #[must_use]
    pub fn observe(&self) -> Observation {
        self.controller.observation()
    }

    /// Advance the curriculum one training iteration.
    pub fn curriculum_update(&mut self) {
        self.curriculum.advance();
    }

    // ---- accessors ----

    #[must_use]
    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    #[must_use]
    pub const fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    #[must_use]
    pub const fn controller(&self) -> &DroverController {
        &self.controller
    }

    #[must_use]
    pub const fn world(&self) -> &W {
        &self.world
    }

    #[must_use]
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    #[must_use]
    pub const fn substeps(&self) -> usize {
        self.substeps
    }
}
