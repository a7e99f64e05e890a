//! lateral_planner - lateral trajectory planning for lane keeping
//!
//! This crate turns a perception model's predicted path and lane lines into
//! a short-horizon curvature plan, switching between lane-line and laneless
//! guidance and guarding the optimizer output before it is published.

// Core modules
pub mod common;
pub mod utils;
pub mod config;
pub mod messages;

// Planning
pub mod lateral_planning;

// Re-export common types for convenience
pub use common::{BlendMode, CostWeights, LateralState, Point3D, PredictedPath};
pub use common::{LateralSolver, SolverParams, TrajectorySolution};
pub use common::{PlannerError, PlannerResult};
pub use config::PlannerConfig;
pub use messages::{CycleInputs, PlanMessages, ServiceHealth};
pub use lateral_planning::{GaussNewtonLateralSolver, LateralPlanner};
