//! Mock implementations of the planner's collaborator traits.
//!
//! Provides a fixed-geometry dynamics model and deterministic solver stubs
//! that can be used in any crate's test suite without pulling in a dynamics
//! engine or an optimization backend.

use nalgebra::{DVector, UnitQuaternion, Vector3, Vector6};

use strider_core::{CentroidalState, DynamicsModel, RobotState, SolveError, CENTROIDAL_DIM};
use strider_mpc::contact::ContactPlan;
use strider_mpc::costs::{DynamicCosts, KinematicCosts};
use strider_mpc::solvers::{
    CentroidalSolution, CentroidalSolver, KinematicsSolution, KinematicsSolver, WarmStart,
};

// ---------------------------------------------------------------------------
// PointMassModel
// ---------------------------------------------------------------------------

/// Fixed-terrain point-mass stand-in for a rigid-body dynamics engine.
///
/// The CoM tracks the base position in `q`, momentum tracks the base
/// velocity in `v`, and the feet and hips sit at constant world positions.
#[derive(Clone, Debug)]
pub struct PointMassModel {
    /// Total mass in kilograms.
    pub mass: f64,
    /// Number of actuated joints.
    pub n_joints: usize,
    /// World-frame foot positions.
    pub feet: Vec<Vector3<f64>>,
    /// World-frame hip positions.
    pub hips: Vec<Vector3<f64>>,
}

impl PointMassModel {
    /// A small quadruped standing at the origin.
    #[must_use]
    pub fn quadruped() -> Self {
        let feet = vec![
            Vector3::new(0.15, 0.08, 0.0),
            Vector3::new(0.15, -0.08, 0.0),
            Vector3::new(-0.15, 0.08, 0.0),
            Vector3::new(-0.15, -0.08, 0.0),
        ];
        let hips = feet
            .iter()
            .map(|f| Vector3::new(f.x, f.y, 0.3))
            .collect();
        Self {
            mass: 9.0,
            n_joints: 12,
            feet,
            hips,
        }
    }

    /// A standing state compatible with this model's dimensions: base at
    /// `(0, 0, height)` with the identity orientation, joints at zero.
    #[must_use]
    pub fn standing_state(&self, height: f64) -> RobotState {
        let mut q = DVector::zeros(7 + self.n_joints);
        q[2] = height;
        q[6] = 1.0; // identity quaternion (xyzw)
        RobotState::new(q, DVector::zeros(6 + self.n_joints))
    }
}

impl DynamicsModel for PointMassModel {
    fn total_mass(&self) -> f64 {
        self.mass
    }

    fn n_legs(&self) -> usize {
        self.feet.len()
    }

    fn nv(&self) -> usize {
        6 + self.n_joints
    }

    fn com_position(&self, state: &RobotState) -> Vector3<f64> {
        Vector3::new(state.q[0], state.q[1], state.q[2])
    }

    fn centroidal_state(&self, state: &RobotState) -> CentroidalState {
        CentroidalState {
            com: self.com_position(state),
            lin_momentum: Vector3::new(state.v[0], state.v[1], state.v[2]),
            ang_momentum: Vector3::new(state.v[3], state.v[4], state.v[5]),
        }
    }

    fn base_orientation(&self, state: &RobotState) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
            state.q[6],
            state.q[3],
            state.q[4],
            state.q[5],
        ))
    }

    fn foot_positions(&self, _state: &RobotState) -> Vec<Vector3<f64>> {
        self.feet.clone()
    }

    fn hip_positions(&self, _state: &RobotState) -> Vec<Vector3<f64>> {
        self.hips.clone()
    }
}

// ---------------------------------------------------------------------------
// TrackingCentroidalSolver
// ---------------------------------------------------------------------------

/// Centroidal solver stub that returns the nominal reference as the
/// solution and distributes the robot's weight over the stance legs.
///
/// Always converges; useful for exercising the pipeline without a real
/// optimizer.
#[derive(Clone, Debug)]
pub struct TrackingCentroidalSolver {
    /// Total mass used for the gravity-balancing forces.
    pub mass: f64,
    /// Gravitational acceleration magnitude.
    pub gravity: f64,
}

impl TrackingCentroidalSolver {
    /// Solver for a robot of the given mass under standard gravity.
    #[must_use]
    pub const fn new(mass: f64) -> Self {
        Self {
            mass,
            gravity: 9.81,
        }
    }
}

impl CentroidalSolver for TrackingCentroidalSolver {
    fn solve(
        &mut self,
        plan: &ContactPlan,
        costs: &DynamicCosts,
        initial: &CentroidalState,
        _warm_start: Option<&WarmStart>,
    ) -> Result<CentroidalSolution, SolveError> {
        let horizon = plan.n_steps();
        debug_assert_eq!(costs.nominal.len(), CENTROIDAL_DIM * horizon);

        let mut com = Vec::with_capacity(horizon + 1);
        let mut momentum = Vec::with_capacity(horizon + 1);
        com.push(initial.com);
        momentum.push(initial.momentum());

        for step in 0..horizon {
            let x = costs.nominal_at(step);
            com.push(Vector3::new(x[0], x[1], x[2]));
            momentum.push(Vector6::new(x[3], x[4], x[5], x[6], x[7], x[8]));
        }

        let weight = self.mass * self.gravity;
        let forces = (0..horizon)
            .map(|step| {
                let stance = plan.stance_flags(step);
                let n_stance = stance.iter().filter(|&&s| s).count().max(1);
                #[allow(clippy::cast_precision_loss)]
                let fz = weight / n_stance as f64;
                stance
                    .iter()
                    .map(|&s| {
                        if s {
                            Vector3::new(0.0, 0.0, fz)
                        } else {
                            Vector3::zeros()
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(CentroidalSolution {
            com,
            momentum,
            forces,
            iterations: 1,
        })
    }
}

// ---------------------------------------------------------------------------
// HoldKinematicsSolver
// ---------------------------------------------------------------------------

/// Kinematics solver stub that holds the initial state across its horizon
/// and returns zero feed-forward effort.
#[derive(Clone, Copy, Debug, Default)]
pub struct HoldKinematicsSolver;

impl KinematicsSolver for HoldKinematicsSolver {
    fn solve(
        &mut self,
        costs: &KinematicCosts,
        initial: &RobotState,
    ) -> Result<KinematicsSolution, SolveError> {
        let knots = costs.horizon_steps + 1;
        let states = vec![initial.clone(); knots];
        let efforts = vec![DVector::zeros(initial.nv()); knots];
        Ok(KinematicsSolution { states, efforts })
    }
}

// ---------------------------------------------------------------------------
// Failing solvers
// ---------------------------------------------------------------------------

/// Centroidal solver stub that never converges.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingCentroidalSolver;

impl CentroidalSolver for FailingCentroidalSolver {
    fn solve(
        &mut self,
        _plan: &ContactPlan,
        _costs: &DynamicCosts,
        _initial: &CentroidalState,
        _warm_start: Option<&WarmStart>,
    ) -> Result<CentroidalSolution, SolveError> {
        Err(SolveError::NotConverged { iterations: 85 })
    }
}

/// Kinematics solver stub that never converges.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingKinematicsSolver;

impl KinematicsSolver for FailingKinematicsSolver {
    fn solve(
        &mut self,
        _costs: &KinematicCosts,
        _initial: &RobotState,
    ) -> Result<KinematicsSolution, SolveError> {
        Err(SolveError::NotConverged { iterations: 100 })
    }
}
