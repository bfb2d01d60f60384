//! Receding-horizon kino-dynamic gait generation for legged robots.
//!
//! Repeatedly solves a short-horizon trajectory optimization pair and
//! resamples the result for a torque-level joint controller:
//!
//! 1. **Gait phase schedule** — pure function of time answering "is leg `j`
//!    in stance at time `t`?"
//! 2. **Contact plan** — rolling-horizon stance/swing schedule with frozen
//!    per-run foot targets
//! 3. **Cost construction** — centroidal references and kinematic task
//!    bundles for the two external solvers
//! 4. **Horizon optimizer** — the re-plan cycle: dynamics solve at full
//!    horizon, kinematics solve tracking its truncated prefix
//! 5. **Interpolation** — fine-rate stream for the torque controller
//!
//! The solvers and the rigid-body dynamics engine are collaborators behind
//! traits; this crate constructs their inputs and reads their outputs. One
//! gait generator instance plans synchronously on a single thread; the
//! produced [`interp::InterpolatedStream`] is an immutable value that a
//! higher-rate consumer reads while the next cycle is being planned.

pub mod contact;
pub mod costs;
pub mod gait;
pub mod interp;
pub mod optimizer;
pub mod solvers;

pub use contact::{ContactPlan, ContactPlanBuilder, ContactPoint, FOOT_RADIUS};
pub use costs::{
    CentroidalBounds, CostBuilder, CostSpec, DynamicCosts, KinematicCostBuilder, KinematicCosts,
    KinematicTask, COM_DEVIATION_BOUND, FORCE_BOUND,
};
pub use gait::{GaitPhase, GaitSchedule};
pub use interp::{resample, InterpolatedStream, StreamCursor, StreamSample};
pub use optimizer::{HorizonOptimizer, OptimizedTrajectory, PlanStage};
pub use solvers::{
    CentroidalSolution, CentroidalSolver, KinematicsSolution, KinematicsSolver, WarmStart,
};
