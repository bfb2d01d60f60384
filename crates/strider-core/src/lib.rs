//! Shared foundation for the strider locomotion planner.
//!
//! Provides the per-gait configuration record ([`config::MotionParams`]),
//! the state types exchanged with collaborators ([`types::RobotState`],
//! [`types::CentroidalState`]), the dynamics-model collaborator trait
//! ([`traits::DynamicsModel`]), and the error taxonomy shared by the
//! planning crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::MotionParams;
pub use error::{ConfigError, PlanError, SolveError, StreamError, StriderError};
pub use traits::DynamicsModel;
pub use types::{CentroidalState, RobotState, CENTROIDAL_DIM};
