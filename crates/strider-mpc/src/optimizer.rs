//! Re-plan cycle orchestration.
//!
//! One call to [`HorizonOptimizer::optimize`] runs the full pipeline
//! synchronously: build the contact plan, build the cost bundles, solve the
//! centroidal dynamics over the full horizon, feed its solution into the
//! kinematics stage as tracking tasks over a truncated prefix, solve the
//! kinematics, and collect the result. The owning control loop decides when
//! a new cycle starts; between cycles the previously collected trajectory is
//! consumed index by index.

use std::time::Instant;

use log::debug;
use nalgebra::{DVector, Vector3, Vector6};

use strider_core::{
    CentroidalState, ConfigError, DynamicsModel, MotionParams, PlanError, RobotState, SolveError,
};

use crate::contact::ContactPlanBuilder;
use crate::costs::CostBuilder;
use crate::solvers::{
    CentroidalSolution, CentroidalSolver, KinematicsSolution, KinematicsSolver, WarmStart,
};

/// Stage of the re-plan cycle.
///
/// The two-stage solver coupling (dynamics first, kinematics tracking its
/// truncated output) is encoded here explicitly rather than inferred from
/// call order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStage {
    Idle,
    BuildContactPlan,
    BuildCosts,
    SolveDynamics,
    SolveKinematics,
    Collect,
}

/// Coarse-rate output of one re-plan cycle.
///
/// All sequences share the same knot count (`states.len()`); the trajectory
/// covers the kinematics horizon. Owned by the caller for the lifetime of
/// one planning cycle and superseded, not merged, by the next cycle's
/// output.
#[derive(Clone, Debug)]
pub struct OptimizedTrajectory {
    /// Generalized position/velocity knots.
    pub states: Vec<RobotState>,
    /// Feed-forward generalized effort knots.
    pub efforts: Vec<DVector<f64>>,
    /// Per-knot per-leg contact forces.
    pub forces: Vec<Vec<Vector3<f64>>>,
    /// Center-of-mass knots.
    pub com: Vec<Vector3<f64>>,
    /// Mass-normalized momentum knots.
    pub momentum: Vec<Vector6<f64>>,
    /// Per-knot per-leg stance flags from the contact plan.
    pub stance: Vec<Vec<bool>>,
    /// Wall-clock duration of the full cycle in microseconds.
    pub solve_time_us: u64,
}

impl OptimizedTrajectory {
    /// Number of coarse knots.
    #[must_use]
    pub fn n_knots(&self) -> usize {
        self.states.len()
    }
}

/// Receding-horizon gait generator.
///
/// Owns its collaborators exclusively: the dynamics model and both solver
/// sessions are fields, invoked through `&mut`, so no hidden cross-call
/// state exists outside this value. No concurrent re-plan may be in flight
/// for one instance; a cycle, once started, runs to completion or fails.
pub struct HorizonOptimizer<M, C, K>
where
    M: DynamicsModel,
    C: CentroidalSolver,
    K: KinematicsSolver,
{
    params: MotionParams,
    model: M,
    dynamics: C,
    kinematics: K,
    contact_builder: ContactPlanBuilder,
    warm_start: Option<WarmStart>,
    stage: PlanStage,
}

impl<M, C, K> HorizonOptimizer<M, C, K>
where
    M: DynamicsModel,
    C: CentroidalSolver,
    K: KinematicsSolver,
{
    /// Create a gait generator for one gait style.
    ///
    /// `nominal_state` is the stance pose used once to derive the contact
    /// placement offsets. Fails on an invalid parameter record or a leg
    /// count that disagrees with the dynamics model.
    pub fn new(
        params: MotionParams,
        model: M,
        dynamics: C,
        kinematics: K,
        nominal_state: &RobotState,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        if params.n_legs() != model.n_legs() {
            return Err(ConfigError::InvalidValue {
                field: "stance_fraction",
                message: format!(
                    "{} legs configured but the dynamics model has {}",
                    params.n_legs(),
                    model.n_legs()
                ),
            });
        }
        let contact_builder = ContactPlanBuilder::new(&params, &model, nominal_state);
        Ok(Self {
            params,
            model,
            dynamics,
            kinematics,
            contact_builder,
            warm_start: None,
            stage: PlanStage::Idle,
        })
    }

    /// Replace the motion parameters wholesale (gait change).
    ///
    /// Rebuilds the placement offsets from `nominal_state` and drops the
    /// warm start, which belonged to the previous gait's horizon.
    pub fn set_motion_params(
        &mut self,
        params: MotionParams,
        nominal_state: &RobotState,
    ) -> Result<(), ConfigError> {
        params.validate()?;
        if params.n_legs() != self.model.n_legs() {
            return Err(ConfigError::InvalidValue {
                field: "stance_fraction",
                message: format!(
                    "{} legs configured but the dynamics model has {}",
                    params.n_legs(),
                    self.model.n_legs()
                ),
            });
        }
        self.contact_builder = ContactPlanBuilder::new(&params, &self.model, nominal_state);
        self.params = params;
        self.warm_start = None;
        Ok(())
    }

    /// Current pipeline stage ([`PlanStage::Idle`] between cycles).
    #[must_use]
    pub const fn stage(&self) -> PlanStage {
        self.stage
    }

    /// Active motion parameters.
    #[must_use]
    pub const fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Whether a warm start from a previous cycle is available.
    #[must_use]
    pub const fn has_warm_start(&self) -> bool {
        self.warm_start.is_some()
    }

    /// Run one full re-plan cycle.
    ///
    /// Solver non-convergence is surfaced as a [`PlanError`]; no default
    /// trajectory is substituted.
    pub fn optimize(
        &mut self,
        state: &RobotState,
        t: f64,
        desired_velocity: &Vector3<f64>,
    ) -> Result<OptimizedTrajectory, PlanError> {
        let result = self.run_cycle(state, t, desired_velocity);
        self.stage = PlanStage::Idle;
        result
    }

    fn run_cycle(
        &mut self,
        state: &RobotState,
        t: f64,
        desired_velocity: &Vector3<f64>,
    ) -> Result<OptimizedTrajectory, PlanError> {
        let cycle_start = Instant::now();

        self.stage = PlanStage::BuildContactPlan;
        let plan = self
            .contact_builder
            .build(&self.model, state, t, desired_velocity);

        self.stage = PlanStage::BuildCosts;
        let spec = CostBuilder::new(&self.params).build(&self.model, state, desired_velocity, &plan);
        let cost_elapsed = cycle_start.elapsed();

        self.stage = PlanStage::SolveDynamics;
        let dynamics_start = Instant::now();
        let x_init: CentroidalState = self.model.centroidal_state(state);
        let dyn_sol = self
            .dynamics
            .solve(&plan, &spec.dynamics, &x_init, self.warm_start.as_ref())
            .map_err(PlanError::Dynamics)?;
        validate_centroidal(&dyn_sol, plan.n_steps()).map_err(PlanError::Dynamics)?;
        let dynamics_elapsed = dynamics_start.elapsed();

        self.stage = PlanStage::SolveKinematics;
        let kinematics_start = Instant::now();
        let kin_costs = spec.kinematics.with_centroidal_tracking(
            &dyn_sol.com,
            &dyn_sol.momentum,
            self.params.centroidal_weight,
        );
        let kin_sol = self
            .kinematics
            .solve(&kin_costs, state)
            .map_err(PlanError::Kinematics)?;
        validate_kinematics(&kin_sol, self.params.kinematic_horizon_steps())
            .map_err(PlanError::Kinematics)?;
        let kinematics_elapsed = kinematics_start.elapsed();

        self.stage = PlanStage::Collect;
        self.warm_start = Some(WarmStart::shifted(&dyn_sol));

        let n = kin_sol.states.len();
        let trajectory = OptimizedTrajectory {
            forces: dyn_sol.forces[..n.min(dyn_sol.forces.len())].to_vec(),
            com: dyn_sol.com[..n].to_vec(),
            momentum: dyn_sol.momentum[..n].to_vec(),
            stance: (0..n.min(plan.n_steps())).map(|i| plan.stance_flags(i)).collect(),
            states: kin_sol.states,
            efforts: kin_sol.efforts,
            solve_time_us: as_micros(cycle_start.elapsed()),
        };

        debug!(
            "re-plan cycle [{}]: costs {}us, dynamics {}us ({} iters), kinematics {}us, total {}us",
            self.params.name,
            as_micros(cost_elapsed),
            as_micros(dynamics_elapsed),
            dyn_sol.iterations,
            as_micros(kinematics_elapsed),
            trajectory.solve_time_us,
        );

        Ok(trajectory)
    }
}

fn as_micros(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

fn validate_centroidal(solution: &CentroidalSolution, horizon: usize) -> Result<(), SolveError> {
    if solution.com.len() != horizon + 1 || solution.momentum.len() != horizon + 1 {
        return Err(SolveError::KnotCountMismatch {
            expected: horizon + 1,
            got: solution.com.len(),
        });
    }
    if solution.forces.len() != horizon {
        return Err(SolveError::KnotCountMismatch {
            expected: horizon,
            got: solution.forces.len(),
        });
    }
    Ok(())
}

fn validate_kinematics(solution: &KinematicsSolution, horizon: usize) -> Result<(), SolveError> {
    if solution.states.len() != horizon + 1 {
        return Err(SolveError::KnotCountMismatch {
            expected: horizon + 1,
            got: solution.states.len(),
        });
    }
    if solution.efforts.len() != solution.states.len() {
        return Err(SolveError::KnotCountMismatch {
            expected: solution.states.len(),
            got: solution.efforts.len(),
        });
    }
    Ok(())
}
