//! Per-gait motion parameters.
//!
//! A [`MotionParams`] record is pure configuration data: created once per
//! gait style, validated at construction, read-only afterwards, and replaced
//! wholesale when the gait changes. The quadruped presets carry tuned numbers
//! in code the same way the solver configs of comparable controllers do.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable per-gait tuning record for the receding-horizon gait generator.
///
/// Weight-vector conventions:
/// - `state_weight` / `state_reference` span the kinematic optimizer's
///   tangent-space state `[base pos(3), base ori(3), joints(n), base lin
///   vel(3), base ang vel(3), joint rates(n)]`, length `2 * (6 + n)`.
/// - `control_weight` spans the generalized-effort vector, length `6 + n`.
/// - `dynamic_weight` / `dynamic_terminal_weight` span the 9-dim centroidal
///   state `[com, h_lin/m, h_ang]`.
/// - `force_weight` is per axis, replicated across legs by the cost builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Gait style name (for logs and recordings).
    pub name: String,

    /// Gait cycle period in seconds.
    pub gait_period: f64,
    /// Per-leg fraction of the cycle spent in stance, in (0, 1].
    pub stance_fraction: Vec<f64>,
    /// Per-leg phase offset in cycle fractions, in [0, 1).
    pub phase_offset: Vec<f64>,
    /// Knot spacing of the discretized horizon in seconds.
    pub gait_dt: f64,
    /// Horizon length in gait periods.
    pub gait_horizon: f64,

    /// Swing-foot cost weights [stance tracking, via point].
    pub swing_weight: [f64; 2],
    /// Centroidal tracking weights [com, momentum] fed to the kinematics
    /// stage after the dynamics solve.
    pub centroidal_weight: [f64; 2],
    /// Regularization scales [state, control].
    pub regularization_weight: [f64; 2],
    /// Per-coordinate state regularization weights (tangent space).
    pub state_weight: Vec<f64>,
    /// Per-coordinate control regularization weights.
    pub control_weight: Vec<f64>,
    /// Tangent-space posture the state regularization pulls toward.
    pub state_reference: Vec<f64>,

    /// Running centroidal state cost weights (W_X).
    pub dynamic_weight: [f64; 9],
    /// Terminal centroidal state cost weights (W_X_ter).
    pub dynamic_terminal_weight: [f64; 9],
    /// Per-axis contact force cost weights (W_F).
    pub force_weight: [f64; 3],
    /// Penalty on dynamic constraint violation (rho).
    pub constraint_penalty: f64,

    /// Nominal body height above ground in meters.
    pub nominal_height: f64,
    /// Peak swing-foot height in meters.
    pub step_height: f64,
    /// Per-axis gains converting orientation error into a desired angular
    /// momentum.
    pub orientation_gain: [f64; 3],

    /// Joint-space proportional gain for the downstream torque controller.
    pub kp: f64,
    /// Joint-space derivative gain for the downstream torque controller.
    pub kd: f64,
}

impl MotionParams {
    /// Validate the record. Returns Err on the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gait_period <= 0.0 {
            return Err(ConfigError::InvalidGaitPeriod(self.gait_period));
        }
        if self.gait_dt <= 0.0 || self.gait_dt > self.gait_period {
            return Err(ConfigError::InvalidGaitDt(self.gait_dt));
        }
        if self.gait_horizon <= 0.0 {
            return Err(ConfigError::InvalidGaitHorizon(self.gait_horizon));
        }
        if self.stance_fraction.len() != self.phase_offset.len() {
            return Err(ConfigError::LegCountMismatch {
                stance: self.stance_fraction.len(),
                offset: self.phase_offset.len(),
            });
        }
        if self.stance_fraction.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "stance_fraction",
                message: "at least one leg is required".into(),
            });
        }
        for (leg, &fraction) in self.stance_fraction.iter().enumerate() {
            // A fraction of 0 would mean the leg is never planted.
            if fraction <= 0.0 || fraction > 1.0 {
                return Err(ConfigError::InvalidStanceFraction {
                    leg,
                    value: fraction,
                });
            }
        }
        for (leg, &offset) in self.phase_offset.iter().enumerate() {
            if !(0.0..1.0).contains(&offset) {
                return Err(ConfigError::InvalidPhaseOffset { leg, value: offset });
            }
        }
        if self.state_weight.len() != self.state_reference.len() {
            return Err(ConfigError::InvalidValue {
                field: "state_reference",
                message: format!(
                    "length {} does not match state_weight length {}",
                    self.state_reference.len(),
                    self.state_weight.len()
                ),
            });
        }
        if self.state_weight.is_empty() || self.control_weight.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "state_weight",
                message: "regularization weight vectors must be non-empty".into(),
            });
        }
        if self.nominal_height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "nominal_height",
                message: format!("{} must be > 0", self.nominal_height),
            });
        }
        if self.kp < 0.0 || self.kd < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "kp",
                message: "PD gains must be non-negative".into(),
            });
        }
        if self.horizon_steps() == 0 {
            return Err(ConfigError::InvalidGaitHorizon(self.gait_horizon));
        }
        Ok(())
    }

    /// Load and validate a record from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let params: Self = toml::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    /// Number of legs this record configures.
    #[must_use]
    pub fn n_legs(&self) -> usize {
        self.stance_fraction.len()
    }

    /// Horizon duration in seconds.
    #[must_use]
    pub fn horizon_duration(&self) -> f64 {
        self.gait_horizon * self.gait_period
    }

    /// Number of discretized steps in the dynamics horizon.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn horizon_steps(&self) -> usize {
        (self.horizon_duration() / self.gait_dt).round() as usize
    }

    /// Number of discretized steps in the kinematics horizon.
    ///
    /// The kinematics stage tracks a truncated prefix of the dynamics
    /// solution; its horizon is half the dynamics horizon to bound its cost.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn kinematic_horizon_steps(&self) -> usize {
        (0.5 * self.horizon_duration() / self.gait_dt).round() as usize
    }

    /// Symmetric quadruped trot: diagonal pairs alternate.
    #[must_use]
    pub fn trot(n_joints: usize) -> Self {
        Self {
            name: "trot".into(),
            gait_period: 0.4,
            stance_fraction: vec![0.65; 4],
            phase_offset: vec![0.0, 0.5, 0.5, 0.0],
            gait_dt: 0.05,
            gait_horizon: 2.0,
            swing_weight: [1e5, 1e4],
            centroidal_weight: [5e5, 5e2],
            regularization_weight: [5e-4, 9e-6],
            state_weight: state_weights(&[0.0, 0.0, 100.0], 10.0, 10.0, 0.01, 500.0, n_joints),
            control_weight: control_weights(&[0.0, 0.0, 1000.0], 5e2, 1.0, n_joints),
            state_reference: vec![0.0; 2 * (6 + n_joints)],
            dynamic_weight: [1e5, 1e5, 1e6, 1e1, 1e1, 2e3, 1e5, 1e5, 1e4],
            dynamic_terminal_weight: [1e6, 1e6, 1e7, 1e2, 1e2, 2e4, 1e6, 1e6, 1e6],
            force_weight: [1e-1, 1e-1, 1e-1],
            constraint_penalty: 5e4,
            nominal_height: 0.30,
            step_height: 0.10,
            orientation_gain: [0.6, 0.6, 0.4],
            kp: 8.0,
            kd: 0.3,
        }
    }

    /// Quadruped walk: one foot in swing at a time.
    #[must_use]
    pub fn walk(n_joints: usize) -> Self {
        Self {
            name: "walk".into(),
            gait_period: 0.6,
            stance_fraction: vec![0.8; 4],
            phase_offset: vec![0.6, 0.0, 0.2, 0.8],
            gait_dt: 0.05,
            gait_horizon: 1.0,
            swing_weight: [1e4, 1e4],
            centroidal_weight: [5e1, 5e2],
            regularization_weight: [5e-3, 7e-3],
            state_weight: state_weights(&[0.0, 0.0, 1000.0], 1e3, 0.5, 50.0, 1e-2, n_joints),
            control_weight: control_weights(&[1.0, 1.0, 10.0], 10.0, 5e-3, n_joints),
            state_reference: vec![0.0; 2 * (6 + n_joints)],
            dynamic_weight: [1e-5, 1e-5, 1e5, 1e2, 1e2, 1e2, 5e3, 5e3, 5e3],
            dynamic_terminal_weight: [1e-4, 1e-4, 1e6, 1e3, 1e3, 1e3, 1e4, 1e4, 1e4],
            force_weight: [1e1, 1e1, 1e1],
            constraint_penalty: 5e4,
            nominal_height: 0.24,
            step_height: 0.05,
            orientation_gain: [0.2, 0.4, 0.5],
            kp: 3.5,
            kd: 0.15,
        }
    }

    /// Quadruped bound: front and hind pairs alternate.
    #[must_use]
    pub fn bound(n_joints: usize) -> Self {
        Self {
            name: "bound".into(),
            gait_period: 0.5,
            stance_fraction: vec![0.7; 4],
            phase_offset: vec![0.0, 0.0, 0.5, 0.5],
            gait_dt: 0.05,
            gait_horizon: 2.0,
            swing_weight: [1e5, 1e4],
            centroidal_weight: [5e2, 5e4],
            regularization_weight: [5e-4, 9e-4],
            state_weight: state_weights(&[0.0, 0.0, 1000.0], 10.0, 10.0, 0.01, 500.0, n_joints),
            control_weight: control_weights(&[0.0, 0.0, 0.0], 1.0, 1.0, n_joints),
            state_reference: vec![0.0; 2 * (6 + n_joints)],
            dynamic_weight: [1e3, 1e3, 1e6, 1e1, 1e1, 2e3, 1e4, 1e6, 1e4],
            dynamic_terminal_weight: [1e6, 1e6, 1e7, 1e2, 1e2, 2e4, 1e6, 1e7, 1e6],
            force_weight: [1e0, 1e0, 1e0],
            constraint_penalty: 5e4,
            nominal_height: 0.28,
            step_height: 0.07,
            orientation_gain: [0.6, 0.8, 0.8],
            kp: 9.0,
            kd: 0.4,
        }
    }

    /// Stand still: every leg in stance for the whole cycle.
    #[must_use]
    pub fn stand(n_joints: usize) -> Self {
        Self {
            name: "stand".into(),
            gait_period: 0.5,
            stance_fraction: vec![1.0; 4],
            phase_offset: vec![0.0, 0.4, 0.4, 0.0],
            gait_dt: 0.05,
            gait_horizon: 2.0,
            swing_weight: [1e4, 1e4],
            centroidal_weight: [5e5, 5e4],
            regularization_weight: [5e-4, 9e-6],
            state_weight: state_weights(&[0.0, 0.0, 0.0], 10.0, 50.0, 0.01, 100.0, n_joints),
            control_weight: control_weights(&[0.0, 0.0, 0.0], 0.0, 0.0, n_joints),
            state_reference: vec![0.0; 2 * (6 + n_joints)],
            dynamic_weight: [1e3, 1e3, 1e6, 1e1, 1e1, 2e3, 1e4, 1e4, 1e4],
            dynamic_terminal_weight: [1e4, 1e4, 1e7, 1e2, 1e2, 2e4, 1e6, 1e6, 1e6],
            force_weight: [1e0, 1e0, 1e0],
            constraint_penalty: 5e4,
            nominal_height: 0.30,
            step_height: 0.02,
            orientation_gain: [0.4, 0.5, 0.4],
            kp: 7.0,
            kd: 0.4,
        }
    }
}

/// Assemble a tangent-space state weight vector:
/// `[base_pos(3), base_ori, joints, base_lin_vel(3), base_ang_vel, joint rates]`.
fn state_weights(
    base_pos: &[f64; 3],
    base_ori: f64,
    joints: f64,
    base_vel_ang: f64,
    joint_vel: f64,
    n_joints: usize,
) -> Vec<f64> {
    let mut w = Vec::with_capacity(2 * (6 + n_joints));
    w.extend_from_slice(base_pos);
    w.extend(std::iter::repeat(base_ori).take(3));
    w.extend(std::iter::repeat(joints).take(n_joints));
    w.extend(std::iter::repeat(0.0).take(3));
    w.extend(std::iter::repeat(base_vel_ang).take(3));
    w.extend(std::iter::repeat(joint_vel).take(n_joints));
    w
}

/// Assemble a control weight vector `[base wrench(6), joint efforts]`.
fn control_weights(base_lin: &[f64; 3], base_ang: f64, joints: f64, n_joints: usize) -> Vec<f64> {
    let mut w = Vec::with_capacity(6 + n_joints);
    w.extend_from_slice(base_lin);
    w.extend(std::iter::repeat(base_ang).take(3));
    w.extend(std::iter::repeat(joints).take(n_joints));
    w
}
