//! Common traits defining the solver boundary of the planner

use crate::common::types::{CostWeights, LateralState, STATE_CURVATURE};

/// Runtime parameters of the solver's vehicle model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Vehicle speed [m/s]
    pub v_ego: f64,
    /// Rotation radius of the vehicle model [m]
    pub rotation_radius: f64,
}

impl SolverParams {
    pub fn new(v_ego: f64, rotation_radius: f64) -> Self {
        Self { v_ego, rotation_radius }
    }
}

/// Output of one solve, replaced wholesale every cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySolution {
    /// One state per grid point (horizon + 1 rows)
    pub x_sol: Vec<LateralState>,
    /// One curvature rate per interval (horizon rows)
    pub u_sol: Vec<f64>,
    pub cost: f64,
    /// Wall-clock solve time [s]
    pub solve_time: f64,
    /// 0 on success, solver specific otherwise
    pub status: i32,
}

impl TrajectorySolution {
    /// All-zero solution sized for `horizon` intervals
    pub fn zeros(horizon: usize) -> Self {
        Self {
            x_sol: vec![LateralState::zeros(); horizon + 1],
            u_sol: vec![0.0; horizon],
            cost: 0.0,
            solve_time: 0.0,
            status: 0,
        }
    }

    /// Curvature column of the state solution
    pub fn curvatures(&self) -> Vec<f64> {
        self.x_sol.iter().map(|x| x[STATE_CURVATURE]).collect()
    }

    pub fn has_nan_curvature(&self) -> bool {
        self.x_sol.iter().any(|x| !x[STATE_CURVATURE].is_finite())
    }
}

/// Nonlinear lateral trajectory solver.
///
/// The planner calls `set_weights` and `solve` once per cycle and `reset`
/// whenever the warm start must be discarded.
pub trait LateralSolver {
    /// Drop any warm start and restart from `x0`
    fn reset(&mut self, x0: &LateralState);

    /// Set path, heading and curvature-rate weights for the next solves
    fn set_weights(&mut self, weights: CostWeights);

    /// Solve over the horizon toward the lateral and heading references
    fn solve(
        &mut self,
        x0: &LateralState,
        params: &SolverParams,
        y_ref: &[f64],
        heading_ref: &[f64],
    ) -> &TrajectorySolution;

    /// Most recent solution
    fn solution(&self) -> &TrajectorySolution;
}
