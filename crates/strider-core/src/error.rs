use thiserror::Error;

/// Top-level error type for strider-core.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

/// Motion-parameter and interpolation configuration errors.
///
/// All of these are rejected at construction time and are fatal: a gait
/// generator is never built from an invalid parameter record.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid gait period: {0} (must be > 0)")]
    InvalidGaitPeriod(f64),

    #[error("Invalid gait dt: {0} (must be > 0 and <= gait period)")]
    InvalidGaitDt(f64),

    #[error("Invalid gait horizon: {0} (must be > 0)")]
    InvalidGaitHorizon(f64),

    #[error("Invalid stance fraction for leg {leg}: {value} (must be in (0, 1])")]
    InvalidStanceFraction { leg: usize, value: f64 },

    #[error("Invalid phase offset for leg {leg}: {value} (must be in [0, 1))")]
    InvalidPhaseOffset { leg: usize, value: f64 },

    #[error("Per-leg vector length mismatch: stance_fraction has {stance}, phase_offset has {offset}")]
    LegCountMismatch { stance: usize, offset: usize },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Failure reported by an external solver collaborator.
///
/// Copy + static payloads for cheap propagation out of the planning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("solver did not converge within {iterations} iterations")]
    NotConverged { iterations: u32 },

    #[error("solver returned {got} knots, expected {expected}")]
    KnotCountMismatch { expected: usize, got: usize },
}

/// A re-plan cycle failure, tagged with the stage that failed.
///
/// Solver non-convergence is never masked: substituting a default trajectory
/// on a physical robot is unsafe, so the owning control loop decides whether
/// to retry, hold the last command, or halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("centroidal dynamics solve failed: {0}")]
    Dynamics(#[source] SolveError),

    #[error("whole-body kinematics solve failed: {0}")]
    Kinematics(#[source] SolveError),
}

/// Interpolated-stream consumption errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The consumer advanced past the last interpolated sample before the
    /// next planning cycle completed. The planning-clock/control-rate ratio
    /// must be chosen so this cannot happen; hitting it is a configuration
    /// fault, not a runtime-recoverable condition.
    #[error("interpolated stream exhausted at index {index} (length {len})")]
    Exhausted { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strider_error_from_config_error() {
        let err = ConfigError::InvalidGaitPeriod(-0.5);
        let top: StriderError = err.into();
        assert!(matches!(top, StriderError::Config(_)));
        assert!(top.to_string().contains("-0.5"));
    }

    #[test]
    fn strider_error_from_plan_error() {
        let err = PlanError::Dynamics(SolveError::NotConverged { iterations: 85 });
        let top: StriderError = err.into();
        assert!(matches!(top, StriderError::Plan(_)));
        assert!(top.to_string().contains("85"));
    }

    #[test]
    fn strider_error_from_stream_error() {
        let err = StreamError::Exhausted { index: 50, len: 50 };
        let top: StriderError = err.into();
        assert!(matches!(top, StriderError::Stream(_)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such gait file");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn solve_error_is_copy() {
        let err = SolveError::NotConverged { iterations: 10 };
        let err2 = err; // Copy
        assert_eq!(err, err2);
    }

    #[test]
    fn plan_error_display_names_stage() {
        assert_eq!(
            PlanError::Dynamics(SolveError::NotConverged { iterations: 3 }).to_string(),
            "centroidal dynamics solve failed: solver did not converge within 3 iterations"
        );
        assert_eq!(
            PlanError::Kinematics(SolveError::KnotCountMismatch {
                expected: 11,
                got: 10
            })
            .to_string(),
            "whole-body kinematics solve failed: solver returned 10 knots, expected 11"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidStanceFraction { leg: 2, value: 0.0 }.to_string(),
            "Invalid stance fraction for leg 2: 0 (must be in (0, 1])"
        );
        assert_eq!(
            ConfigError::LegCountMismatch {
                stance: 4,
                offset: 3
            }
            .to_string(),
            "Per-leg vector length mismatch: stance_fraction has 4, phase_offset has 3"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "kp",
                message: "must be non-negative".into()
            }
            .to_string(),
            "Invalid value for kp: must be non-negative"
        );
    }

    #[test]
    fn stream_error_display() {
        assert_eq!(
            StreamError::Exhausted { index: 250, len: 250 }.to_string(),
            "interpolated stream exhausted at index 250 (length 250)"
        );
    }
}
