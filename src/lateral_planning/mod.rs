// Lateral planning module

pub mod path_resampler;
pub mod lane_blend;
pub mod cost_shaper;
pub mod gauss_newton_solver;
pub mod lateral_mpc;
pub mod watchdog;
pub mod output;
pub mod lane_planner;
pub mod desire_helper;
pub mod planner;

#[cfg(test)]
pub(crate) mod testing;

pub use path_resampler::*;
pub use lane_blend::*;
pub use cost_shaper::*;
pub use gauss_newton_solver::*;
pub use lateral_mpc::*;
pub use watchdog::*;
pub use output::*;
pub use lane_planner::*;
pub use desire_helper::*;
pub use planner::*;
