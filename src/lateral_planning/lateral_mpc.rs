//! Owns the solver and its warm-start state
//!
//! The initial condition `x0` persists across cycles. After every solve its
//! curvature is advanced to the solution's curvature one nominal cycle
//! ahead, so the next solve starts where the vehicle should be by then.

use crate::common::{
    CostWeights, LateralSolver, LateralState, SolverParams, TrajectorySolution, DT_MDL, STATE_CURVATURE,
};
use crate::utils::interp;

pub struct LateralMpc<S: LateralSolver> {
    solver: S,
    x0: LateralState,
}

impl<S: LateralSolver> LateralMpc<S> {
    /// Wrap `solver`, starting from the zero state
    pub fn new(solver: S) -> Self {
        let mut mpc = LateralMpc {
            solver,
            x0: LateralState::zeros(),
        };
        mpc.reset(LateralState::zeros());
        mpc
    }

    /// Discard the warm start and restart from `x0`
    pub fn reset(&mut self, x0: LateralState) {
        self.x0 = x0;
        self.solver.reset(&self.x0);
    }

    pub fn set_weights(&mut self, weights: CostWeights) {
        self.solver.set_weights(weights);
    }

    /// Solve once from the stored initial condition.
    ///
    /// `t_grid` holds the grid times of the solution rows and is used to
    /// read the solution's curvature [`DT_MDL`] seconds ahead.
    pub fn run(&mut self, params: &SolverParams, y_pts: &[f64], heading_pts: &[f64], t_grid: &[f64]) -> &TrajectorySolution {
        let curvatures = self.solver.solve(&self.x0, params, y_pts, heading_pts).curvatures();
        self.x0[STATE_CURVATURE] = interp(DT_MDL, t_grid, &curvatures);
        self.solver.solution()
    }

    /// Overwrite the curvature the next solve starts from
    pub fn set_curvature(&mut self, curvature: f64) {
        self.x0[STATE_CURVATURE] = curvature;
    }

    pub fn x0(&self) -> &LateralState {
        &self.x0
    }

    pub fn solution(&self) -> &TrajectorySolution {
        self.solver.solution()
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }
}
