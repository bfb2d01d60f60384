//! Mock collaborators for strider test suites.
//!
//! Lightweight stand-ins for the rigid-body dynamics engine and the two
//! external solvers, usable from any crate's tests.

pub mod mocks;

pub use mocks::{
    FailingCentroidalSolver, FailingKinematicsSolver, HoldKinematicsSolver, PointMassModel,
    TrackingCentroidalSolver,
};
