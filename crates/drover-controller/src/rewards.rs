//! Shaped reward accumulation.
//!
//! Seven terms are integrated every physics sub-step, each scaled by the
//! curriculum factor, its coefficient, and the sub-step duration. Reading
//! the sum is the only way to clear the accumulators, so the caller must
//! read exactly once per control step.

use nalgebra::Vector3;

use drover_core::config::RewardCoeffConfig;

/// Added to unit-vector denominators so alignment terms stay finite.
const UNIT_EPS: f64 = 1e-8;

/// Names of the exported per-term breakdown, in export order.
pub const STEP_DATA_TAGS: [&str; 7] = [
    "toward_object",
    "stay_object",
    "toward_target",
    "stay_target",
    "command",
    "torque",
    "stay_object_heading",
];

fn unit(v: &Vector3<f64>) -> Vector3<f64> {
    v / (v.norm() + UNIT_EPS)
}

// ---------------------------------------------------------------------------
// RewardInputs
// ---------------------------------------------------------------------------

/// World-frame quantities one sub-step of reward shaping reads.
#[derive(Debug, Clone)]
pub struct RewardInputs {
    pub ee_pos: Vector3<f64>,
    pub ee_vel: Vector3<f64>,
    pub object_pos: Vector3<f64>,
    pub object_vel: Vector3<f64>,
    /// Body x-axis projected on the horizontal plane.
    pub heading: Vector3<f64>,
    pub target_pos: Vector3<f64>,
    pub command: Vector3<f64>,
    pub generalized_force_norm: f64,
}

// ---------------------------------------------------------------------------
// RewardAccumulator
// ---------------------------------------------------------------------------

/// Seven named accumulators, cleared only by [`RewardAccumulator::sum_and_reset`].
#[derive(Debug, Clone)]
pub struct RewardAccumulator {
    coeffs: RewardCoeffConfig,
    sim_dt: f64,
    toward_object: f64,
    stay_object: f64,
    stay_object_heading: f64,
    toward_target: f64,
    stay_target: f64,
    command: f64,
    torque: f64,
    step_data: [f64; 7],
}

impl RewardAccumulator {
    #[must_use]
    pub const fn new(coeffs: RewardCoeffConfig, sim_dt: f64) -> Self {
        Self {
            coeffs,
            sim_dt,
            toward_object: 0.0,
            stay_object: 0.0,
            stay_object_heading: 0.0,
            toward_target: 0.0,
            stay_target: 0.0,
            command: 0.0,
            torque: 0.0,
            step_data: [0.0; 7],
        }
    }

    /// Integrate one sub-step of all seven terms.
    ///
    /// Relative positions are planar (vertical component dropped); the
    /// object velocity is planar-projected for the terms that use it.
    pub fn accumulate(&mut self, curriculum_factor: f64, input: &RewardInputs) {
        let scale = curriculum_factor * self.sim_dt;

        let mut ee_to_obj = input.object_pos - input.ee_pos;
        ee_to_obj.z = 0.0;
        let mut obj_to_target = input.target_pos - input.object_pos;
        obj_to_target.z = 0.0;
        let mut obj_vel = input.object_vel;
        obj_vel.z = 0.0;

        // approach the object: alignment of ee velocity with the ee->object
        // direction, penalized only when moving away
        let toward_o = unit(&ee_to_obj).dot(&unit(&input.ee_vel)) - 1.0;
        self.toward_object +=
            scale * self.coeffs.toward_object * (-toward_o.min(0.0).powi(2)).exp();

        // stay close to the object
        let stay_o = ee_to_obj.norm();
        self.stay_object += scale * self.coeffs.stay_object * (-stay_o).exp();

        // keep the object moving along the robot heading
        let stay_o_heading = obj_vel.dot(&input.heading)
            / (input.heading.norm() * obj_vel.norm() + UNIT_EPS)
            - 1.0;
        self.stay_object_heading +=
            scale * self.coeffs.stay_object_heading * stay_o_heading.exp();

        // move the object toward the target
        let toward_t = unit(&obj_to_target).dot(&unit(&obj_vel)) - 1.0;
        self.toward_target +=
            scale * self.coeffs.toward_target * (-toward_t.min(0.0).powi(2)).exp();

        // keep the object close to the target
        let stay_t = obj_to_target.norm();
        self.stay_target += scale * self.coeffs.stay_target * (-stay_t).exp();

        // floor-clamped command magnitude
        self.command += scale * self.coeffs.command * input.command.norm().max(5.0);

        // actuation effort
        self.torque += scale * self.coeffs.torque * input.generalized_force_norm;
    }

    /// Snapshot the per-term breakdown, zero every accumulator, and return
    /// the scalar sum. The only clearing path.
    pub fn sum_and_reset(&mut self) -> f64 {
        self.step_data = [
            self.toward_object,
            self.stay_object,
            self.toward_target,
            self.stay_target,
            self.command,
            self.torque,
            self.stay_object_heading,
        ];

        self.toward_object = 0.0;
        self.stay_object = 0.0;
        self.stay_object_heading = 0.0;
        self.toward_target = 0.0;
        self.stay_target = 0.0;
        self.command = 0.0;
        self.torque = 0.0;

        self.step_data.iter().sum()
    }

    /// Per-term breakdown captured at the last `sum_and_reset`, ordered as
    /// [`STEP_DATA_TAGS`].
    #[must_use]
    pub const fn step_data(&self) -> &[f64; 7] {
        &self.step_data
    }

    #[must_use]
    pub const fn tags() -> &'static [&'static str; 7] {
        &STEP_DATA_TAGS
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
