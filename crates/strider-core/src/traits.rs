//! Collaborator traits at the seams of the planning pipeline.

use nalgebra::{UnitQuaternion, Vector3};

use crate::types::{CentroidalState, RobotState};

/// Rigid-body dynamics engine surface consumed by the gait generator.
///
/// Forward kinematics, center-of-mass and centroidal-momentum computation,
/// and frame transforms live behind this trait; the planner only reads the
/// quantities it needs to build contact plans and cost references.
///
/// All positions are expressed in world coordinates. Leg ordering is fixed by
/// the implementer and must match the per-leg vectors of the motion
/// parameters.
pub trait DynamicsModel: Send + Sync {
    /// Total system mass in kilograms.
    fn total_mass(&self) -> f64;

    /// Number of contact-bearing end-effectors (legs).
    fn n_legs(&self) -> usize;

    /// Dimension of the generalized velocity vector.
    fn nv(&self) -> usize;

    /// Center-of-mass position for the given state.
    fn com_position(&self, state: &RobotState) -> Vector3<f64>;

    /// Centroidal state (CoM, mass-normalized momentum) for the given state.
    fn centroidal_state(&self, state: &RobotState) -> CentroidalState;

    /// Orientation of the floating base.
    fn base_orientation(&self, state: &RobotState) -> UnitQuaternion<f64>;

    /// End-effector (foot) positions, one per leg.
    fn foot_positions(&self, state: &RobotState) -> Vec<Vector3<f64>>;

    /// Hip-frame positions, one per leg. Read once at initialization to
    /// derive the stance-placement offsets.
    fn hip_positions(&self, state: &RobotState) -> Vec<Vector3<f64>>;
}
