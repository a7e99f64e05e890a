//! Utility modules for lateral_planner

pub mod interp;
pub mod filter;

pub use interp::*;
pub use filter::FirstOrderFilter;
