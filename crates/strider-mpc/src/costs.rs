//! Cost construction for the coupled dynamics/kinematics solve.
//!
//! Turns motion parameters, the measured state, and the contact plan into
//! the two cost bundles consumed by the external solvers. No optimization
//! happens here; this module only populates data structures.
//!
//! Cost bundles are immutable values built fresh each cycle. Running and
//! terminal contributions go through two explicit builder methods
//! ([`KinematicCostBuilder::add_running`] /
//! [`KinematicCostBuilder::add_terminal`]); the state and control
//! regularization is intentionally registered through both so the solver
//! sees an explicit terminal penalty in addition to the running one.

use nalgebra::{DVector, UnitQuaternion, Vector3, Vector6};

use strider_core::{DynamicsModel, MotionParams, RobotState, CENTROIDAL_DIM};

use crate::contact::ContactPlan;

/// Symmetric box bound on CoM deviation from the nominal reference, per
/// axis, in meters. Engineering constant, not a tunable.
pub const COM_DEVIATION_BOUND: [f64; 3] = [0.45, 0.45, 1.0];

/// Symmetric per-axis force-magnitude bound per leg, in newtons.
/// Engineering constant, not a tunable.
pub const FORCE_BOUND: [f64; 3] = [16.5, 16.5, 75.0];

// ---------------------------------------------------------------------------
// Kinematic tasks
// ---------------------------------------------------------------------------

/// Pin one leg's end-effector to a target at one knot.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionTrackingTask {
    /// Leg index.
    pub leg: usize,
    /// Knot index within the kinematics horizon.
    pub knot: usize,
    /// World-frame target position.
    pub target: Vector3<f64>,
    /// Task weight.
    pub weight: f64,
}

/// Pull the whole trajectory toward a reference with per-coordinate weights.
#[derive(Clone, Debug, PartialEq)]
pub struct RegularizationTask {
    /// Per-coordinate weights.
    pub weights: DVector<f64>,
    /// Reference the trajectory is pulled toward.
    pub reference: DVector<f64>,
    /// Overall task scale.
    pub scale: f64,
}

/// Track a per-knot CoM trajectory produced by the dynamics stage.
#[derive(Clone, Debug, PartialEq)]
pub struct ComTrackingTask {
    /// One target per knot (a single entry for the terminal variant).
    pub targets: Vec<Vector3<f64>>,
    /// Task weight.
    pub weight: f64,
}

/// Track a per-knot momentum trajectory produced by the dynamics stage.
#[derive(Clone, Debug, PartialEq)]
pub struct MomentumTrackingTask {
    /// One 6-dim `[h_lin/m; h_ang]` target per knot.
    pub targets: Vec<Vector6<f64>>,
    /// Task weight.
    pub weight: f64,
}

/// One kinematic cost contribution.
#[derive(Clone, Debug)]
pub enum KinematicTask {
    PositionTracking(PositionTrackingTask),
    StateRegularization(RegularizationTask),
    ControlRegularization(RegularizationTask),
    ComTracking(ComTrackingTask),
    MomentumTracking(MomentumTrackingTask),
}

/// Tasks of one cost phase (running or terminal), grouped by kind.
#[derive(Clone, Debug, Default)]
pub struct KinematicTaskSet {
    pub position_tracking: Vec<PositionTrackingTask>,
    pub state_regularization: Vec<RegularizationTask>,
    pub control_regularization: Vec<RegularizationTask>,
    pub com_tracking: Vec<ComTrackingTask>,
    pub momentum_tracking: Vec<MomentumTrackingTask>,
}

impl KinematicTaskSet {
    fn push(&mut self, task: KinematicTask) {
        match task {
            KinematicTask::PositionTracking(t) => self.position_tracking.push(t),
            KinematicTask::StateRegularization(t) => self.state_regularization.push(t),
            KinematicTask::ControlRegularization(t) => self.control_regularization.push(t),
            KinematicTask::ComTracking(t) => self.com_tracking.push(t),
            KinematicTask::MomentumTracking(t) => self.momentum_tracking.push(t),
        }
    }
}

/// Accumulates kinematic tasks, then freezes them into [`KinematicCosts`].
#[derive(Clone, Debug)]
pub struct KinematicCostBuilder {
    horizon_steps: usize,
    dt: f64,
    running: KinematicTaskSet,
    terminal: KinematicTaskSet,
}

impl KinematicCostBuilder {
    /// Start an empty bundle for a kinematics horizon of `horizon_steps`
    /// knots spaced `dt` seconds apart.
    #[must_use]
    pub fn new(horizon_steps: usize, dt: f64) -> Self {
        Self {
            horizon_steps,
            dt,
            running: KinematicTaskSet::default(),
            terminal: KinematicTaskSet::default(),
        }
    }

    /// Add a running cost contribution.
    pub fn add_running(&mut self, task: KinematicTask) {
        self.running.push(task);
    }

    /// Add a terminal cost contribution.
    pub fn add_terminal(&mut self, task: KinematicTask) {
        self.terminal.push(task);
    }

    /// Freeze into an immutable bundle.
    #[must_use]
    pub fn build(self) -> KinematicCosts {
        KinematicCosts {
            horizon_steps: self.horizon_steps,
            dt: self.dt,
            running: self.running,
            terminal: self.terminal,
        }
    }
}

/// Immutable kinematic cost bundle for one solve.
#[derive(Clone, Debug)]
pub struct KinematicCosts {
    /// Number of knots in the kinematics horizon.
    pub horizon_steps: usize,
    /// Knot spacing in seconds.
    pub dt: f64,
    /// Running tasks.
    pub running: KinematicTaskSet,
    /// Terminal tasks.
    pub terminal: KinematicTaskSet,
}

impl KinematicCosts {
    /// Append CoM and momentum tracking built from the dynamics solution.
    ///
    /// The running tasks track the truncated prefix covering this bundle's
    /// horizon; the terminal tasks pin the knot one past the prefix.
    /// `weight` is `[com, momentum]`.
    #[must_use]
    pub fn with_centroidal_tracking(
        self,
        com: &[Vector3<f64>],
        momentum: &[Vector6<f64>],
        weight: [f64; 2],
    ) -> Self {
        let prefix = self.horizon_steps.min(com.len());
        let terminal_knot = self.horizon_steps.min(com.len().saturating_sub(1));

        let mut builder = KinematicCostBuilder {
            horizon_steps: self.horizon_steps,
            dt: self.dt,
            running: self.running,
            terminal: self.terminal,
        };

        builder.add_running(KinematicTask::ComTracking(ComTrackingTask {
            targets: com[..prefix].to_vec(),
            weight: weight[0],
        }));
        builder.add_terminal(KinematicTask::ComTracking(ComTrackingTask {
            targets: vec![com[terminal_knot]],
            weight: weight[0],
        }));

        let mom_prefix = self.horizon_steps.min(momentum.len());
        let mom_terminal = self.horizon_steps.min(momentum.len().saturating_sub(1));
        builder.add_running(KinematicTask::MomentumTracking(MomentumTrackingTask {
            targets: momentum[..mom_prefix].to_vec(),
            weight: weight[1],
        }));
        builder.add_terminal(KinematicTask::MomentumTracking(MomentumTrackingTask {
            targets: vec![momentum[mom_terminal]],
            weight: weight[1],
        }));

        builder.build()
    }
}

// ---------------------------------------------------------------------------
// Dynamic costs
// ---------------------------------------------------------------------------

/// Box constraints for the centroidal solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentroidalBounds {
    /// Symmetric allowed CoM deviation from the nominal reference, per axis.
    pub com_deviation: Vector3<f64>,
    /// Symmetric per-axis force bound per leg.
    pub force_max: Vector3<f64>,
}

impl Default for CentroidalBounds {
    fn default() -> Self {
        Self {
            com_deviation: Vector3::from_column_slice(&COM_DEVIATION_BOUND),
            force_max: Vector3::from_column_slice(&FORCE_BOUND),
        }
    }
}

/// Immutable dynamic cost bundle for one centroidal solve.
#[derive(Clone, Debug)]
pub struct DynamicCosts {
    /// Running 9-dim centroidal state weights.
    pub running_weight: DVector<f64>,
    /// Terminal 9-dim centroidal state weights.
    pub terminal_weight: DVector<f64>,
    /// Force weights, 3 per leg.
    pub force_weight: DVector<f64>,
    /// Nominal centroidal reference trajectory, `9 * horizon` stacked.
    pub nominal: DVector<f64>,
    /// Terminal centroidal reference.
    pub terminal: DVector<f64>,
    /// Box constraints.
    pub bounds: CentroidalBounds,
    /// Penalty on dynamic constraint violation (rho).
    pub constraint_penalty: f64,
}

impl DynamicCosts {
    /// Number of horizon steps covered by the nominal reference.
    #[must_use]
    pub fn horizon_steps(&self) -> usize {
        self.nominal.len() / CENTROIDAL_DIM
    }

    /// The 9-dim nominal reference at one horizon step.
    #[must_use]
    pub fn nominal_at(&self, step: usize) -> DVector<f64> {
        self.nominal
            .rows(step * CENTROIDAL_DIM, CENTROIDAL_DIM)
            .into_owned()
    }
}

/// The two cost bundles consumed by one re-plan cycle.
#[derive(Clone, Debug)]
pub struct CostSpec {
    pub kinematics: KinematicCosts,
    pub dynamics: DynamicCosts,
}

// ---------------------------------------------------------------------------
// CostBuilder
// ---------------------------------------------------------------------------

/// Builds a [`CostSpec`] from the measured state and the contact plan.
#[derive(Clone, Copy, Debug)]
pub struct CostBuilder<'a> {
    params: &'a MotionParams,
}

impl<'a> CostBuilder<'a> {
    /// Create a builder over one gait's motion parameters.
    #[must_use]
    pub const fn new(params: &'a MotionParams) -> Self {
        Self { params }
    }

    /// Build both cost bundles for the current cycle.
    #[must_use]
    pub fn build(
        &self,
        model: &dyn DynamicsModel,
        state: &RobotState,
        desired_velocity: &Vector3<f64>,
        plan: &ContactPlan,
    ) -> CostSpec {
        CostSpec {
            kinematics: self.build_kinematics(plan),
            dynamics: self.build_dynamics(model, state, desired_velocity, plan),
        }
    }

    fn build_kinematics(&self, plan: &ContactPlan) -> KinematicCosts {
        let params = self.params;
        let ik_steps = params.kinematic_horizon_steps().min(plan.n_steps());
        let mut builder = KinematicCostBuilder::new(ik_steps, params.gait_dt);

        // Stance tracking: pin every planned contact inside the kinematics
        // horizon to its frozen target.
        for (knot, step) in plan.iter().take(ik_steps).enumerate() {
            for (leg, point) in step.iter().enumerate() {
                if point.in_contact {
                    builder.add_running(KinematicTask::PositionTracking(PositionTrackingTask {
                        leg,
                        knot,
                        target: point.position,
                        weight: params.swing_weight[0],
                    }));
                }
            }
        }

        let state_reg = RegularizationTask {
            weights: DVector::from_vec(params.state_weight.clone()),
            reference: DVector::from_vec(params.state_reference.clone()),
            scale: params.regularization_weight[0],
        };
        let ctrl_reg = RegularizationTask {
            weights: DVector::from_vec(params.control_weight.clone()),
            reference: DVector::zeros(params.control_weight.len()),
            scale: params.regularization_weight[1],
        };

        // Registered twice on purpose: once running, once terminal.
        builder.add_running(KinematicTask::StateRegularization(state_reg.clone()));
        builder.add_terminal(KinematicTask::StateRegularization(state_reg));
        builder.add_running(KinematicTask::ControlRegularization(ctrl_reg.clone()));
        builder.add_terminal(KinematicTask::ControlRegularization(ctrl_reg));

        builder.build()
    }

    fn build_dynamics(
        &self,
        model: &dyn DynamicsModel,
        state: &RobotState,
        desired_velocity: &Vector3<f64>,
        plan: &ContactPlan,
    ) -> DynamicCosts {
        let params = self.params;
        let horizon = plan.n_steps();
        let com = model.com_position(state);

        let correction = orientation_correction(
            &model.base_orientation(state),
            &UnitQuaternion::identity(),
        );
        let gained = Vector3::new(
            correction.x * params.orientation_gain[0],
            correction.y * params.orientation_gain[1],
            correction.z * params.orientation_gain[2],
        );

        // Nominal trajectory: horizontal position integrates the desired
        // velocity from the measured CoM, height pinned to the nominal.
        let mut nominal = DVector::zeros(CENTROIDAL_DIM * horizon);
        for i in 0..horizon {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 * params.gait_dt;
            let offset = i * CENTROIDAL_DIM;
            nominal[offset] = com.x + desired_velocity.x * t;
            nominal[offset + 1] = com.y + desired_velocity.y * t;
            nominal[offset + 2] = params.nominal_height;
            nominal[offset + 3] = desired_velocity.x;
            nominal[offset + 4] = desired_velocity.y;
            nominal[offset + 5] = desired_velocity.z;
            nominal[offset + 6] = gained.x;
            nominal[offset + 7] = gained.y;
            nominal[offset + 8] = gained.z;
        }

        // Terminal reference: nominal extrapolated over the full horizon.
        let duration = params.horizon_duration();
        let mut terminal = DVector::zeros(CENTROIDAL_DIM);
        terminal[0] = com.x + desired_velocity.x * duration;
        terminal[1] = com.y + desired_velocity.y * duration;
        terminal[2] = params.nominal_height;
        terminal[3] = desired_velocity.x;
        terminal[4] = desired_velocity.y;
        terminal[5] = desired_velocity.z;
        terminal[6] = correction.x;
        terminal[7] = correction.y;
        terminal[8] = correction.z;

        let n_legs = plan.n_legs();
        let mut force_weight = DVector::zeros(3 * n_legs);
        for leg in 0..n_legs {
            for axis in 0..3 {
                force_weight[3 * leg + axis] = params.force_weight[axis];
            }
        }

        DynamicCosts {
            running_weight: DVector::from_column_slice(&params.dynamic_weight),
            terminal_weight: DVector::from_column_slice(&params.dynamic_terminal_weight),
            force_weight,
            nominal,
            terminal,
            bounds: CentroidalBounds::default(),
            constraint_penalty: params.constraint_penalty,
        }
    }
}

/// Minimal rotation, as an exponential-coordinates vector, that takes
/// `current` onto `desired`.
///
/// Scaled per axis by the orientation-correction gains, this becomes the
/// angular-momentum reference a subsequent stance phase should realize.
#[must_use]
pub fn orientation_correction(
    current: &UnitQuaternion<f64>,
    desired: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    (desired * current.inverse()).scaled_axis()
}
