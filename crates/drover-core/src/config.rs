//! Typed configuration for the controller stack, loaded once from TOML.
//!
//! Dimension sizes and the seven reward coefficients are required keys —
//! a missing key is a parse-time fatal. Timesteps carry defaults matching
//! the reference controller rates and are re-validated against the world
//! at construction.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_sim_dt() -> f64 {
    0.001
}
const fn default_control_dt() -> f64 {
    0.25
}
const fn default_max_episode_steps() -> u32 {
    1000
}
const fn default_action_dim() -> usize {
    2
}
const fn default_initial_factor() -> f64 {
    0.3
}
const fn default_decay_factor() -> f64 {
    0.997
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Timestep and episode-length parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Physics sub-step duration in seconds (default: 0.001 = 1000 Hz).
    #[serde(default = "default_sim_dt")]
    pub sim_dt: f64,

    /// Control step duration in seconds (default: 0.25 = 4 Hz).
    /// Must be >= `sim_dt`; the ratio gives the sub-step count.
    #[serde(default = "default_control_dt")]
    pub control_dt: f64,

    /// Maximum control steps per episode before truncation.
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Master random seed.
    #[serde(default)]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_dt: default_sim_dt(),
            control_dt: default_control_dt(),
            max_episode_steps: default_max_episode_steps(),
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Validate timestep values. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sim_dt.is_finite() || self.sim_dt <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.sim_dt".into(),
                message: format!("must be finite and > 0, got {}", self.sim_dt),
            });
        }
        if !self.control_dt.is_finite() || self.control_dt < self.sim_dt {
            return Err(ConfigError::InvalidValue {
                field: "simulation.control_dt".into(),
                message: format!(
                    "must be finite and >= sim_dt ({}), got {}",
                    self.sim_dt, self.control_dt
                ),
            });
        }
        Ok(())
    }

    /// Number of physics sub-steps per control step.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn substeps(&self) -> usize {
        (self.control_dt / self.sim_dt).round() as usize
    }
}

// ---------------------------------------------------------------------------
// DimensionConfig
// ---------------------------------------------------------------------------

/// Signal-stream dimensions. All history lengths count control steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Length of one proprioceptive sample (gravity axis + body velocities).
    pub proprioceptive_dim: usize,
    /// Length of one exteroceptive (object-info) sample.
    pub exteroceptive_dim: usize,
    /// Number of retained history slots for proprio/extero streams.
    pub history_num: usize,
    /// Number of retained action slots. Must equal `history_num + 1`: the
    /// newest slot is the current action, the rest feed the history window.
    pub action_history_num: usize,
    /// Action vector length (default: 2).
    #[serde(default = "default_action_dim")]
    pub action_dim: usize,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            proprioceptive_dim: 9,
            exteroceptive_dim: 38,
            history_num: 4,
            action_history_num: 5,
            action_dim: 2,
        }
    }
}

impl DimensionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("dimension.proprioceptive_dim", self.proprioceptive_dim),
            ("dimension.exteroceptive_dim", self.exteroceptive_dim),
            ("dimension.history_num", self.history_num),
            ("dimension.action_history_num", self.action_history_num),
            ("dimension.action_dim", self.action_dim),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    message: "must be > 0".into(),
                });
            }
        }
        if self.action_history_num != self.history_num + 1 {
            return Err(ConfigError::InvalidValue {
                field: "dimension.action_history_num".into(),
                message: format!(
                    "must equal history_num + 1 ({}), got {}",
                    self.history_num + 1,
                    self.action_history_num
                ),
            });
        }
        Ok(())
    }

    /// Length of one observation slot (proprio + extero + action).
    #[must_use]
    pub const fn slot_dim(&self) -> usize {
        self.proprioceptive_dim + self.exteroceptive_dim + self.action_dim
    }

    /// Total observation dimension: one slot per history step plus the
    /// current step.
    #[must_use]
    pub const fn ob_dim(&self) -> usize {
        self.slot_dim() * (self.history_num + 1)
    }
}

// ---------------------------------------------------------------------------
// RewardCoeffConfig
// ---------------------------------------------------------------------------

/// Coefficients for the seven shaped reward terms, plus the terminal
/// contact penalty. The seven term coefficients are required keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCoeffConfig {
    pub toward_object: f64,
    pub stay_object: f64,
    pub stay_object_heading: f64,
    pub toward_target: f64,
    pub stay_target: f64,
    pub command: f64,
    pub torque: f64,
    /// Reward emitted on illegal-contact termination (typically negative).
    #[serde(default)]
    pub terminal: f64,
}

impl Default for RewardCoeffConfig {
    fn default() -> Self {
        Self {
            toward_object: 0.0,
            stay_object: 0.0,
            stay_object_heading: 0.0,
            toward_target: 0.0,
            stay_target: 0.0,
            command: 0.0,
            torque: 0.0,
            terminal: 0.0,
        }
    }
}

impl RewardCoeffConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("reward.toward_object", self.toward_object),
            ("reward.stay_object", self.stay_object),
            ("reward.stay_object_heading", self.stay_object_heading),
            ("reward.toward_target", self.toward_target),
            ("reward.stay_target", self.stay_target),
            ("reward.command", self.command),
            ("reward.torque", self.torque),
            ("reward.terminal", self.terminal),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    message: format!("must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CurriculumConfig
// ---------------------------------------------------------------------------

/// Curriculum schedule: the factor starts at `initial_factor` and is raised
/// to `decay_factor` after every training iteration, drifting toward 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumConfig {
    #[serde(default = "default_initial_factor")]
    pub initial_factor: f64,
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            initial_factor: default_initial_factor(),
            decay_factor: default_decay_factor(),
        }
    }
}

impl CurriculumConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_factor > 0.0 && self.initial_factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "curriculum.initial_factor".into(),
                message: format!("must be in (0, 1], got {}", self.initial_factor),
            });
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "curriculum.decay_factor".into(),
                message: format!("must be in (0, 1], got {}", self.decay_factor),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Complete controller configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub dimension: DimensionConfig,
    pub reward: RewardCoeffConfig,
    #[serde(default)]
    pub curriculum: CurriculumConfig,
}

impl ControllerConfig {
    /// Validate every section. Returns the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.dimension.validate()?;
        self.reward.validate()?;
        self.curriculum.validate()?;
        Ok(())
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
