//! Common types, traits, constants and error definitions for lateral_planner
//!
//! This module provides the building blocks shared by the planner stages
//! and the solver.

pub mod constants;
pub mod types;
pub mod traits;
pub mod error;

pub use constants::*;
pub use types::*;
pub use traits::*;
pub use error::*;
