use thiserror::Error;

/// Top-level error type for the drover workspace.
#[derive(Debug, Error)]
pub enum DroverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Episode is not running; call reset() first")]
    EpisodeNotRunning,
}

/// Configuration errors. All of these are fatal at startup; there is no
/// retry path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Simulation timestep mismatch: controller built for {expected} s, world runs at {got} s")]
    TimestepMismatch { expected: f64, got: f64 },

    #[error("Dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },
}

/// Errors raised by the simulation-world seam.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Object not found in world: {0}")]
    ObjectNotFound(String),

    #[error("Object '{name}' is not of the expected kind ({expected})")]
    WrongKind { name: String, expected: String },

    #[error("Frame not found on articulated body: {0}")]
    FrameNotFound(String),

    #[error("Body not found on articulated body: {0}")]
    BodyNotFound(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::TimestepMismatch {
            expected: 0.001,
            got: 0.002,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.001"));
        assert!(msg.contains("0.002"));
    }

    #[test]
    fn dimension_mismatch_display() {
        let err = ConfigError::DimensionMismatch {
            what: "observation".into(),
            expected: 245,
            got: 240,
        };
        assert!(err.to_string().contains("observation"));
        assert!(err.to_string().contains("245"));
    }

    #[test]
    fn world_error_wraps_into_drover_error() {
        let err: DroverError = WorldError::ObjectNotFound("robot".into()).into();
        assert!(matches!(err, DroverError::World(_)));
    }

    #[test]
    fn config_error_wraps_into_drover_error() {
        let err: DroverError = ConfigError::InvalidValue {
            field: "sim_dt".into(),
            message: "must be > 0".into(),
        }
        .into();
        assert!(matches!(err, DroverError::Config(_)));
    }
}
