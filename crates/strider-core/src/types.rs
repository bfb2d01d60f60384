//! Core state types shared across the planning pipeline.

use nalgebra::{DVector, Vector3, Vector6};

/// Number of centroidal states: [c(3), h_lin/m(3), h_ang(3)] = 9.
pub const CENTROIDAL_DIM: usize = 9;

/// Generalized robot state: floating-base configuration plus joint values.
///
/// `q` follows the usual floating-base layout
/// `[base position(3), base quaternion(4, xyzw), joints(n)]`, `v` the matching
/// tangent layout `[base linear(3), base angular(3), joint rates(n)]`. The
/// planner itself never indexes into leg joints; it passes these through to
/// the kinematics solver and the dynamics-model collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotState {
    /// Generalized position.
    pub q: DVector<f64>,
    /// Generalized velocity.
    pub v: DVector<f64>,
}

impl RobotState {
    /// Create a state from generalized position and velocity.
    #[must_use]
    pub const fn new(q: DVector<f64>, v: DVector<f64>) -> Self {
        Self { q, v }
    }

    /// Stack position and velocity into a single vector `[q; v]`.
    #[must_use]
    pub fn stacked(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.q.len() + self.v.len());
        x.rows_mut(0, self.q.len()).copy_from(&self.q);
        x.rows_mut(self.q.len(), self.v.len()).copy_from(&self.v);
        x
    }

    /// Dimension of the generalized velocity (the control dimension).
    #[must_use]
    pub fn nv(&self) -> usize {
        self.v.len()
    }
}

/// Centroidal state: center of mass, mass-normalized linear momentum, and
/// angular momentum.
///
/// The linear part is normalized by total mass, so it reads as the CoM
/// velocity; references built from a desired body velocity can be compared
/// against it directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentroidalState {
    /// Center-of-mass position in world frame.
    pub com: Vector3<f64>,
    /// Linear momentum divided by total mass (CoM velocity).
    pub lin_momentum: Vector3<f64>,
    /// Angular momentum about the CoM.
    pub ang_momentum: Vector3<f64>,
}

impl CentroidalState {
    /// Pack into the 9-element centroidal vector `[c, h_lin/m, h_ang]`.
    #[must_use]
    pub fn to_vector(&self) -> DVector<f64> {
        let mut x = DVector::zeros(CENTROIDAL_DIM);
        x.fixed_rows_mut::<3>(0).copy_from(&self.com);
        x.fixed_rows_mut::<3>(3).copy_from(&self.lin_momentum);
        x.fixed_rows_mut::<3>(6).copy_from(&self.ang_momentum);
        x
    }

    /// Unpack from a 9-element centroidal vector.
    #[must_use]
    pub fn from_vector(x: &DVector<f64>) -> Self {
        Self {
            com: x.fixed_rows::<3>(0).into(),
            lin_momentum: x.fixed_rows::<3>(3).into(),
            ang_momentum: x.fixed_rows::<3>(6).into(),
        }
    }

    /// Stack the momentum halves into a 6-vector `[h_lin/m; h_ang]`.
    #[must_use]
    pub fn momentum(&self) -> Vector6<f64> {
        let mut m = Vector6::zeros();
        m.fixed_rows_mut::<3>(0).copy_from(&self.lin_momentum);
        m.fixed_rows_mut::<3>(3).copy_from(&self.ang_momentum);
        m
    }
}
