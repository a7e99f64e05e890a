// Damped Gauss-Newton solver for the lateral trajectory problem
// author: Ryohei Sasaki (@rsasaki0109)
//
//! Kinematic lateral model with state `[x, y, psi, curvature]` and control
//! `u` = curvature rate:
//!
//! ```text
//! x'         = v cos(psi) - r sin(psi) u
//! y'         = v sin(psi) + r cos(psi) u
//! psi'       = v curvature
//! curvature' = u
//! ```
//!
//! Euler-discretized on a fixed, non-uniform time grid. The cost is the
//! weighted sum of squared lateral and heading errors at every grid point
//! plus the weighted squared curvature rate of every interval.

use std::time::Instant;

use nalgebra::{DMatrix, DVector, Matrix4, Matrix4xX, Vector4};
use tracing::trace;

use crate::common::{
    t_idxs, CostWeights, LateralSolver, LateralState, SolverParams, TrajectorySolution, LAT_MPC_N,
    MpcCostLat,
};

/// Solve finished with a finite solution
pub const STATUS_SUCCESS: i32 = 0;
/// States or cost became non-finite
pub const STATUS_NON_FINITE: i32 = 1;
/// References do not match the horizon
pub const STATUS_INVALID_INPUT: i32 = 2;

/// Configuration for the Gauss-Newton lateral solver
#[derive(Debug, Clone)]
pub struct GaussNewtonConfig {
    /// Number of control intervals
    pub horizon: usize,
    /// Grid times [s], `horizon + 1` entries
    pub t_grid: Vec<f64>,
    pub max_iter: usize,
    /// Initial Levenberg damping
    pub damping: f64,
    /// Stop once the gradient infinity norm drops below this
    pub gradient_tolerance: f64,
}

impl Default for GaussNewtonConfig {
    fn default() -> Self {
        Self {
            horizon: LAT_MPC_N,
            t_grid: t_idxs()[..=LAT_MPC_N].to_vec(),
            max_iter: 20,
            damping: 1e-4,
            gradient_tolerance: 1e-9,
        }
    }
}

/// Continuous-time lateral dynamics
fn dynamics(x: &LateralState, u: f64, p: &SolverParams) -> LateralState {
    let (sin_psi, cos_psi) = x[2].sin_cos();
    Vector4::new(
        p.v_ego * cos_psi - p.rotation_radius * sin_psi * u,
        p.v_ego * sin_psi + p.rotation_radius * cos_psi * u,
        p.v_ego * x[3],
        u,
    )
}

/// Jacobians of [`dynamics`] with respect to state and control
fn dynamics_jacobian(x: &LateralState, u: f64, p: &SolverParams) -> (Matrix4<f64>, Vector4<f64>) {
    let (sin_psi, cos_psi) = x[2].sin_cos();
    let r = p.rotation_radius;
    let fx = Matrix4::new(
        0.0, 0.0, -p.v_ego * sin_psi - r * cos_psi * u, 0.0,
        0.0, 0.0, p.v_ego * cos_psi - r * sin_psi * u, 0.0,
        0.0, 0.0, 0.0, p.v_ego,
        0.0, 0.0, 0.0, 0.0,
    );
    let fu = Vector4::new(-r * sin_psi, r * cos_psi, 0.0, 1.0);
    (fx, fu)
}

/// Lateral solver warm-started from its previous controls
pub struct GaussNewtonLateralSolver {
    config: GaussNewtonConfig,
    weights: CostWeights,
    u_warm: Vec<f64>,
    solution: TrajectorySolution,
}

impl GaussNewtonLateralSolver {
    pub fn new(config: GaussNewtonConfig) -> Self {
        debug_assert_eq!(config.t_grid.len(), config.horizon + 1);
        let horizon = config.horizon;
        GaussNewtonLateralSolver {
            config,
            weights: CostWeights::new(MpcCostLat::PATH, MpcCostLat::HEADING, MpcCostLat::STEER_RATE),
            u_warm: vec![0.0; horizon],
            solution: TrajectorySolution::zeros(horizon),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GaussNewtonConfig::default())
    }

    fn rollout(&self, x0: &LateralState, u: &[f64], p: &SolverParams) -> Vec<LateralState> {
        let mut xs = Vec::with_capacity(u.len() + 1);
        xs.push(*x0);
        for (k, &uk) in u.iter().enumerate() {
            let dt = self.config.t_grid[k + 1] - self.config.t_grid[k];
            let xk = xs[k];
            xs.push(xk + dynamics(&xk, uk, p) * dt);
        }
        xs
    }

    /// Weighted residual vector: lateral and heading error per grid point,
    /// then one curvature-rate term per interval
    fn residuals(&self, xs: &[LateralState], u: &[f64], y_ref: &[f64], heading_ref: &[f64]) -> DVector<f64> {
        let n = self.config.horizon;
        let sw_path = self.weights.path.sqrt();
        let sw_heading = self.weights.heading.sqrt();
        let sw_rate = self.weights.steer_rate.sqrt();

        let mut r = DVector::<f64>::zeros(2 * (n + 1) + n);
        for k in 0..=n {
            r[2 * k] = sw_path * (xs[k][1] - y_ref[k]);
            r[2 * k + 1] = sw_heading * (xs[k][2] - heading_ref[k]);
        }
        for k in 0..n {
            r[2 * (n + 1) + k] = sw_rate * u[k];
        }
        r
    }

    /// Jacobian of [`Self::residuals`] with respect to the controls
    fn residual_jacobian(&self, xs: &[LateralState], u: &[f64], p: &SolverParams) -> DMatrix<f64> {
        let n = self.config.horizon;
        let sw_path = self.weights.path.sqrt();
        let sw_heading = self.weights.heading.sqrt();
        let sw_rate = self.weights.steer_rate.sqrt();

        let mut jac = DMatrix::<f64>::zeros(2 * (n + 1) + n, n);
        // sensitivity of the current state to every control
        let mut s = Matrix4xX::<f64>::zeros(n);
        for k in 0..=n {
            for j in 0..k {
                jac[(2 * k, j)] = sw_path * s[(1, j)];
                jac[(2 * k + 1, j)] = sw_heading * s[(2, j)];
            }
            if k == n {
                break;
            }
            let dt = self.config.t_grid[k + 1] - self.config.t_grid[k];
            let (fx, fu) = dynamics_jacobian(&xs[k], u[k], p);
            let a = Matrix4::identity() + fx * dt;
            s = a * s;
            s.set_column(k, &(fu * dt));
        }
        for k in 0..n {
            jac[(2 * (n + 1) + k, k)] = sw_rate;
        }
        jac
    }

    fn finish(&mut self, xs: Vec<LateralState>, u: Vec<f64>, cost: f64, status: i32, started: Instant) {
        if status == STATUS_SUCCESS {
            self.u_warm = u.clone();
        } else {
            self.u_warm = vec![0.0; self.config.horizon];
        }
        self.solution = TrajectorySolution {
            x_sol: xs,
            u_sol: u,
            cost,
            solve_time: started.elapsed().as_secs_f64(),
            status,
        };
    }
}

impl LateralSolver for GaussNewtonLateralSolver {
    fn reset(&mut self, x0: &LateralState) {
        let n = self.config.horizon;
        self.u_warm = vec![0.0; n];
        self.solution = TrajectorySolution {
            x_sol: vec![*x0; n + 1],
            ..TrajectorySolution::zeros(n)
        };
    }

    fn set_weights(&mut self, weights: CostWeights) {
        self.weights = weights;
    }

    fn solve(
        &mut self,
        x0: &LateralState,
        params: &SolverParams,
        y_ref: &[f64],
        heading_ref: &[f64],
    ) -> &TrajectorySolution {
        let started = Instant::now();
        let n = self.config.horizon;
        debug_assert_eq!(y_ref.len(), n + 1);
        debug_assert_eq!(heading_ref.len(), n + 1);
        if y_ref.len() != n + 1 || heading_ref.len() != n + 1 {
            let xs = vec![*x0; n + 1];
            self.finish(xs, vec![0.0; n], f64::NAN, STATUS_INVALID_INPUT, started);
            return &self.solution;
        }

        let mut u = self.u_warm.clone();
        let mut xs = self.rollout(x0, &u, params);
        let mut cost = self.residuals(&xs, &u, y_ref, heading_ref).norm_squared();
        let mut damping = self.config.damping;
        let mut iterations = 0;

        while cost.is_finite() && iterations < self.config.max_iter {
            iterations += 1;
            let r = self.residuals(&xs, &u, y_ref, heading_ref);
            let jac = self.residual_jacobian(&xs, &u, params);
            let g = jac.transpose() * &r;
            if g.amax() < self.config.gradient_tolerance {
                break;
            }
            let h = jac.transpose() * &jac;

            // Raise damping until the step lowers the cost
            let mut improved = false;
            while damping < 1e8 {
                let mut h_damped = h.clone();
                for i in 0..n {
                    h_damped[(i, i)] += damping;
                }
                let step = match h_damped.cholesky() {
                    Some(chol) => chol.solve(&(-&g)),
                    None => {
                        damping *= 10.0;
                        continue;
                    }
                };
                let u_new: Vec<f64> = u.iter().zip(step.iter()).map(|(a, b)| a + b).collect();
                let xs_new = self.rollout(x0, &u_new, params);
                let cost_new = self.residuals(&xs_new, &u_new, y_ref, heading_ref).norm_squared();
                if cost_new.is_finite() && cost_new <= cost {
                    u = u_new;
                    xs = xs_new;
                    cost = cost_new;
                    damping = (damping * 0.1).max(1e-12);
                    improved = true;
                    break;
                }
                damping *= 10.0;
            }
            if !improved {
                break;
            }
        }

        let finite = cost.is_finite() && xs.iter().all(|x| x.iter().all(|v| v.is_finite()));
        let status = if finite { STATUS_SUCCESS } else { STATUS_NON_FINITE };
        trace!(iterations, cost, status, "lateral solve finished");
        self.finish(xs, u, cost, status, started);
        &self.solution
    }

    fn solution(&self) -> &TrajectorySolution {
        &self.solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CAR_ROTATION_RADIUS, STATE_CURVATURE};

    fn params(v: f64) -> SolverParams {
        SolverParams::new(v, CAR_ROTATION_RADIUS)
    }

    #[test]
    fn test_zero_problem_stays_zero() {
        let mut solver = GaussNewtonLateralSolver::with_defaults();
        let zeros = vec![0.0; LAT_MPC_N + 1];
        let sol = solver.solve(&LateralState::zeros(), &params(20.0), &zeros, &zeros);
        assert_eq!(sol.status, STATUS_SUCCESS);
        assert_eq!(sol.cost, 0.0);
        assert_eq!(sol.x_sol.len(), LAT_MPC_N + 1);
        assert_eq!(sol.u_sol.len(), LAT_MPC_N);
        assert!(sol.x_sol.iter().all(|x| x.norm() == 0.0));
        assert!(sol.u_sol.iter().all(|&u| u == 0.0));
    }

    #[test]
    fn test_tracks_lateral_offset() {
        let mut solver = GaussNewtonLateralSolver::with_defaults();
        solver.set_weights(CostWeights::new(1.0, 0.0, 0.1));
        let t = t_idxs();
        // gentle left curve, y = k s^2 / 2 with s = v t
        let v = 15.0;
        let k = 0.002;
        let y_ref: Vec<f64> = t[..=LAT_MPC_N].iter().map(|ti| 0.5 * k * (v * ti).powi(2)).collect();
        let h_ref = vec![0.0; LAT_MPC_N + 1];

        let p = params(v);
        let x0 = LateralState::zeros();
        let zero_cost = solver.residuals(&solver.rollout(&x0, &vec![0.0; LAT_MPC_N], &p), &vec![0.0; LAT_MPC_N], &y_ref, &h_ref)
            .norm_squared();
        let sol = solver.solve(&x0, &p, &y_ref, &h_ref).clone();
        assert_eq!(sol.status, STATUS_SUCCESS);
        assert!(sol.cost < 0.1 * zero_cost);
        // the plan turns left
        assert!(sol.x_sol[LAT_MPC_N][1] > 0.0);
        assert!(sol.x_sol.iter().any(|x| x[STATE_CURVATURE] > 0.0));
    }

    #[test]
    fn test_non_finite_reference_reports_failure() {
        let mut solver = GaussNewtonLateralSolver::with_defaults();
        let mut y_ref = vec![0.0; LAT_MPC_N + 1];
        y_ref[5] = f64::NAN;
        let h_ref = vec![0.0; LAT_MPC_N + 1];
        let sol = solver.solve(&LateralState::zeros(), &params(10.0), &y_ref, &h_ref);
        assert_eq!(sol.status, STATUS_NON_FINITE);
    }

    #[test]
    fn test_reset_clears_warm_start() {
        let mut solver = GaussNewtonLateralSolver::with_defaults();
        let y_ref = vec![1.0; LAT_MPC_N + 1];
        let h_ref = vec![0.0; LAT_MPC_N + 1];
        solver.solve(&LateralState::zeros(), &params(10.0), &y_ref, &h_ref);
        assert!(solver.u_warm.iter().any(|&u| u != 0.0));

        let x0 = Vector4::new(0.0, 0.0, 0.0, 0.01);
        solver.reset(&x0);
        assert!(solver.u_warm.iter().all(|&u| u == 0.0));
        assert_eq!(solver.solution().x_sol[0], x0);
        assert_eq!(solver.solution().status, STATUS_SUCCESS);
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let mut solver = GaussNewtonLateralSolver::with_defaults();
        solver.set_weights(CostWeights::new(1.0, 1.0, 1.0));
        let p = SolverParams::new(12.0, 0.5);
        let x0 = Vector4::new(0.0, 0.1, 0.02, 0.001);
        let u: Vec<f64> = (0..LAT_MPC_N).map(|k| 0.001 * k as f64).collect();
        let y_ref = vec![0.3; LAT_MPC_N + 1];
        let h_ref = vec![0.01; LAT_MPC_N + 1];

        let xs = solver.rollout(&x0, &u, &p);
        let jac = solver.residual_jacobian(&xs, &u, &p);
        let r0 = solver.residuals(&xs, &u, &y_ref, &h_ref);
        let eps = 1e-7;
        for j in [0, 7, LAT_MPC_N - 1] {
            let mut up = u.clone();
            up[j] += eps;
            let rp = solver.residuals(&solver.rollout(&x0, &up, &p), &up, &y_ref, &h_ref);
            let fd = (rp - &r0) / eps;
            for i in 0..fd.len() {
                assert!((fd[i] - jac[(i, j)]).abs() < 1e-4 * (1.0 + jac[(i, j)].abs()));
            }
        }
    }
}
