//! Packs one cycle's results into the outbound messages

use crate::common::{
    Desire, LaneChangeDirection, LaneChangeState, Point3D, TrajectorySolution, CONTROL_N, STATE_CURVATURE,
    STATE_PSI,
};
use crate::messages::{LateralPlan, LateralPlanExt, PlanMessages};

/// Lane-change tags copied onto the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneChangeTags {
    pub desire: Desire,
    pub state: LaneChangeState,
    pub direction: LaneChangeDirection,
}

/// Read-only view of everything published for one cycle
#[derive(Debug, Clone, Copy)]
pub struct PlanOutputs<'a> {
    /// Upstream services were all valid
    pub inputs_valid: bool,
    pub y_pts: &'a [f64],
    pub solution: &'a TrajectorySolution,
    pub solution_valid: bool,
    pub lane_change: LaneChangeTags,
    pub use_lane_lines: bool,
    pub d_path: &'a [Point3D],
}

/// Build the plan and the diagnostic path messages.
///
/// State sequences are cut to [`CONTROL_N`] points; curvature rates carry
/// one fewer value and are padded with a trailing zero.
pub fn assemble(out: &PlanOutputs<'_>) -> PlanMessages {
    let published = out.solution.x_sol.iter().take(CONTROL_N);
    let psis = published.clone().map(|x| x[STATE_PSI]).collect();
    let curvatures = published.map(|x| x[STATE_CURVATURE]).collect();
    let mut curvature_rates: Vec<f64> = out.solution.u_sol.iter().take(CONTROL_N - 1).copied().collect();
    curvature_rates.push(0.0);

    let lateral_plan = LateralPlan {
        valid: out.inputs_valid,
        d_path_points: out.y_pts.to_vec(),
        psis,
        curvatures,
        curvature_rates,
        mpc_solution_valid: out.solution_valid,
        solver_execution_time: out.solution.solve_time,
        desire: out.lane_change.desire,
        use_lane_lines: out.use_lane_lines,
        lane_change_state: out.lane_change.state,
        lane_change_direction: out.lane_change.direction,
    };

    let lateral_plan_ext = LateralPlanExt {
        d_path_w_lines_x: out.d_path.iter().map(|p| p.x).collect(),
        d_path_w_lines_y: out.d_path.iter().map(|p| p.y).collect(),
    };

    PlanMessages {
        lateral_plan,
        lateral_plan_ext,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{LateralState, LAT_MPC_N};

    #[test]
    fn test_assemble_lengths_and_padding() {
        let mut solution = TrajectorySolution::zeros(LAT_MPC_N);
        for (k, x) in solution.x_sol.iter_mut().enumerate() {
            *x = LateralState::new(0.0, 0.0, 0.01 * k as f64, 0.001 * k as f64);
        }
        solution.u_sol = (0..LAT_MPC_N).map(|k| k as f64).collect();
        solution.solve_time = 0.003;

        let y_pts = vec![0.1; LAT_MPC_N + 1];
        let d_path = vec![Point3D::new(1.0, 2.0, 3.0); 33];
        let msgs = assemble(&PlanOutputs {
            inputs_valid: true,
            y_pts: &y_pts,
            solution: &solution,
            solution_valid: false,
            lane_change: LaneChangeTags {
                desire: Desire::LaneChangeRight,
                state: LaneChangeState::LaneChangeStarting,
                direction: LaneChangeDirection::Right,
            },
            use_lane_lines: true,
            d_path: &d_path,
        });

        let plan = &msgs.lateral_plan;
        assert_eq!(plan.psis.len(), CONTROL_N);
        assert_eq!(plan.curvatures.len(), CONTROL_N);
        assert_eq!(plan.curvature_rates.len(), CONTROL_N);
        assert_eq!(plan.curvature_rates[CONTROL_N - 1], 0.0);
        assert_eq!(plan.curvature_rates[3], 3.0);
        assert!((plan.curvatures[5] - 0.005).abs() < 1e-12);
        assert_eq!(plan.d_path_points, y_pts);
        assert!(!plan.mpc_solution_valid);
        assert!(plan.valid);
        assert!(plan.use_lane_lines);
        assert_eq!(plan.solver_execution_time, 0.003);
        assert_eq!(plan.desire, Desire::LaneChangeRight);

        assert_eq!(msgs.lateral_plan_ext.d_path_w_lines_x, vec![1.0; 33]);
        assert_eq!(msgs.lateral_plan_ext.d_path_w_lines_y, vec![2.0; 33]);
    }
}
