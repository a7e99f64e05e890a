//! Deterministic solver stand-in for planner tests

use crate::common::{
    t_idxs, CostWeights, LateralSolver, LateralState, SolverParams, TrajectorySolution, LAT_MPC_N,
};

/// Echoes the references back as the solution and reports whatever
/// status and cost the test scripts.
pub struct StubSolver {
    pub status: i32,
    pub cost: f64,
    pub nan_curvature: bool,
    /// Curvature of each solution row as a function of grid time
    pub curvature_fn: Option<fn(f64) -> f64>,
    pub reset_count: usize,
    pub solve_count: usize,
    pub last_reset: LateralState,
    pub last_x0: LateralState,
    pub last_weights: Option<CostWeights>,
    pub last_params: Option<SolverParams>,
    pub last_y_ref: Vec<f64>,
    solution: TrajectorySolution,
}

impl StubSolver {
    pub fn new() -> Self {
        StubSolver {
            status: 0,
            cost: 1.0,
            nan_curvature: false,
            curvature_fn: None,
            reset_count: 0,
            solve_count: 0,
            last_reset: LateralState::zeros(),
            last_x0: LateralState::zeros(),
            last_weights: None,
            last_params: None,
            last_y_ref: Vec::new(),
            solution: TrajectorySolution::zeros(LAT_MPC_N),
        }
    }
}

impl LateralSolver for StubSolver {
    fn reset(&mut self, x0: &LateralState) {
        self.reset_count += 1;
        self.last_reset = *x0;
    }

    fn set_weights(&mut self, weights: CostWeights) {
        self.last_weights = Some(weights);
    }

    fn solve(
        &mut self,
        x0: &LateralState,
        params: &SolverParams,
        y_ref: &[f64],
        heading_ref: &[f64],
    ) -> &TrajectorySolution {
        self.solve_count += 1;
        self.last_x0 = *x0;
        self.last_params = Some(*params);
        self.last_y_ref = y_ref.to_vec();

        let t = t_idxs();
        let x_sol = (0..=LAT_MPC_N)
            .map(|k| {
                let curvature = if self.nan_curvature {
                    f64::NAN
                } else {
                    self.curvature_fn.map_or(0.0, |f| f(t[k]))
                };
                LateralState::new(0.0, y_ref[k], heading_ref[k], curvature)
            })
            .collect();
        let u_sol = (0..LAT_MPC_N).map(|k| 0.001 * (k + 1) as f64).collect();

        self.solution = TrajectorySolution {
            x_sol,
            u_sol,
            cost: self.cost,
            solve_time: 0.002,
            status: self.status,
        };
        &self.solution
    }

    fn solution(&self) -> &TrajectorySolution {
        &self.solution
    }
}
