//! External solver collaborator interfaces.
//!
//! The centroidal dynamics solver and the whole-body kinematics solver are
//! opaque to this crate: the pipeline constructs their inputs and reads
//! their outputs, nothing more. Both carry mutable internal state reused
//! across calls, so each is a solver-session value owned exclusively by the
//! horizon optimizer and invoked through `&mut`.

use nalgebra::{DVector, Vector3, Vector6};

use strider_core::{CentroidalState, RobotState, SolveError};

use crate::contact::ContactPlan;
use crate::costs::{DynamicCosts, KinematicCosts};

/// Output of the centroidal dynamics solve.
///
/// `com` and `momentum` have `horizon + 1` knots (the initial state plus one
/// per step); `forces` has `horizon` knots, one force per leg each.
#[derive(Clone, Debug)]
pub struct CentroidalSolution {
    /// Center-of-mass trajectory.
    pub com: Vec<Vector3<f64>>,
    /// Mass-normalized momentum trajectory `[h_lin/m; h_ang]`.
    pub momentum: Vec<Vector6<f64>>,
    /// Per-step per-leg contact forces.
    pub forces: Vec<Vec<Vector3<f64>>>,
    /// Iterations spent by the solver.
    pub iterations: u32,
}

/// Output of the whole-body kinematics solve.
///
/// `states` has `horizon + 1` knots; `efforts` matches `states` knot for
/// knot (the last effort is held through the final interval).
#[derive(Clone, Debug)]
pub struct KinematicsSolution {
    /// Joint-state trajectory.
    pub states: Vec<RobotState>,
    /// Feed-forward generalized effort trajectory.
    pub efforts: Vec<DVector<f64>>,
}

/// Warm start for the centroidal solver, seeded from the previous cycle's
/// solution shifted by one knot.
#[derive(Clone, Debug)]
pub struct WarmStart {
    /// Shifted CoM trajectory.
    pub com: Vec<Vector3<f64>>,
    /// Shifted momentum trajectory.
    pub momentum: Vec<Vector6<f64>>,
    /// Shifted force trajectory.
    pub forces: Vec<Vec<Vector3<f64>>>,
}

impl WarmStart {
    /// Shift a solution by one knot, duplicating the last entry so the
    /// horizon length is preserved.
    #[must_use]
    pub fn shifted(solution: &CentroidalSolution) -> Self {
        Self {
            com: shift_one(&solution.com),
            momentum: shift_one(&solution.momentum),
            forces: shift_one(&solution.forces),
        }
    }
}

fn shift_one<T: Clone>(knots: &[T]) -> Vec<T> {
    if knots.len() < 2 {
        return knots.to_vec();
    }
    let mut shifted = knots[1..].to_vec();
    shifted.push(knots[knots.len() - 1].clone());
    shifted
}

/// Centroidal (force/momentum) dynamics solver session.
pub trait CentroidalSolver: Send {
    /// Solve for com/force/momentum trajectories over the contact plan's
    /// horizon. May fail to converge; the failure is propagated, never
    /// replaced with a default trajectory.
    fn solve(
        &mut self,
        plan: &ContactPlan,
        costs: &DynamicCosts,
        initial: &CentroidalState,
        warm_start: Option<&WarmStart>,
    ) -> Result<CentroidalSolution, SolveError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Whole-body inverse-kinematics solver session.
pub trait KinematicsSolver: Send {
    /// Solve for a joint-state and feed-forward effort trajectory over the
    /// cost bundle's (shorter) horizon, starting from `initial`.
    fn solve(
        &mut self,
        costs: &KinematicCosts,
        initial: &RobotState,
    ) -> Result<KinematicsSolution, SolveError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solution() -> CentroidalSolution {
        CentroidalSolution {
            com: vec![
                Vector3::new(0.0, 0.0, 0.3),
                Vector3::new(0.01, 0.0, 0.3),
                Vector3::new(0.02, 0.0, 0.3),
            ],
            momentum: vec![Vector6::zeros(); 3],
            forces: vec![vec![Vector3::new(0.0, 0.0, 22.0); 4]; 2],
            iterations: 10,
        }
    }

    #[test]
    fn warm_start_shifts_by_one_knot() {
        let ws = WarmStart::shifted(&solution());
        assert_eq!(ws.com.len(), 3);
        assert_relative_eq!(ws.com[0].x, 0.01);
        assert_relative_eq!(ws.com[1].x, 0.02);
        // Last knot duplicated.
        assert_relative_eq!(ws.com[2].x, 0.02);
        assert_eq!(ws.forces.len(), 2);
    }

    #[test]
    fn warm_start_single_knot_unchanged() {
        let mut sol = solution();
        sol.com.truncate(1);
        let ws = WarmStart::shifted(&sol);
        assert_eq!(ws.com.len(), 1);
        assert_relative_eq!(ws.com[0].x, 0.0);
    }
}
