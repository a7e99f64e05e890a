//! Lateral planner
//!
//! Runs one planning cycle per `update` call:
//!
//! 1. cache the model path (stale values are kept on malformed input)
//! 2. advance the lane-change state machine and attenuate lane lines
//! 3. pick laneline or laneless mode and the matching cost weights
//! 4. resample the driving path onto the solver grid and solve
//! 5. let the watchdog repair the solver state and update plan trust
//!
//! `publish` then packs the results without touching planner state.

use tracing::trace;

use crate::common::{
    BlendMode, CostWeights, LateralSolver, LateralState, PlannerResult, Point3D, PredictedPath,
    SolverParams, CAR_ROTATION_RADIUS, LAT_MPC_N, TRAJECTORY_SIZE,
};
use crate::config::PlannerConfig;
use crate::lateral_planning::cost_shaper::CostShaper;
use crate::lateral_planning::desire_helper::DesireHelper;
use crate::lateral_planning::gauss_newton_solver::GaussNewtonLateralSolver;
use crate::lateral_planning::lane_blend::{attenuate_lane_probs, LaneBlendPolicy};
use crate::lateral_planning::lane_planner::LanePlanner;
use crate::lateral_planning::lateral_mpc::LateralMpc;
use crate::lateral_planning::output::{assemble, LaneChangeTags, PlanOutputs};
use crate::lateral_planning::path_resampler::resample_path;
use crate::lateral_planning::watchdog::{SolutionWatchdog, WatchdogVerdict};
use crate::messages::{CycleInputs, ModelOutput, PlanMessages};

pub struct LateralPlanner<S: LateralSolver> {
    lane_planner: LanePlanner,
    desire_helper: DesireHelper,
    blend: LaneBlendPolicy,
    cost_shaper: CostShaper,
    mpc: LateralMpc<S>,
    watchdog: SolutionWatchdog,
    path: PredictedPath,
    y_pts: Vec<f64>,
    d_path: Vec<Point3D>,
    weights: CostWeights,
    inputs_valid: bool,
    last_verdict: Option<WatchdogVerdict>,
}

impl LateralPlanner<GaussNewtonLateralSolver> {
    /// Planner backed by the built-in Gauss-Newton solver
    pub fn with_default_solver(config: &PlannerConfig) -> PlannerResult<Self> {
        Self::new(config, GaussNewtonLateralSolver::with_defaults())
    }
}

impl<S: LateralSolver> LateralPlanner<S> {
    /// Build a planner from a validated `config`
    pub fn new(config: &PlannerConfig, solver: S) -> PlannerResult<Self> {
        config.validate()?;
        let cost_shaper = CostShaper::new(config.costs, &config.car_name);
        let weights = CostWeights::new(config.costs.path, config.costs.heading, cost_shaper.steer_rate());
        let path = PredictedPath::new();
        let d_path = path.points.clone();
        Ok(LateralPlanner {
            lane_planner: LanePlanner::new(&config.lane),
            desire_helper: DesireHelper::new(),
            blend: LaneBlendPolicy::new(config.lane_priority_mode, config.hysteresis),
            cost_shaper,
            mpc: LateralMpc::new(solver),
            watchdog: SolutionWatchdog::new(&config.watchdog),
            path,
            y_pts: vec![0.0; TRAJECTORY_SIZE],
            d_path,
            weights,
            inputs_valid: false,
            last_verdict: None,
        })
    }

    /// Run one planning cycle
    pub fn update(&mut self, inputs: &CycleInputs) {
        let v_ego = inputs.car_state.v_ego;
        let measured_curvature = inputs.controls_state.curvature;
        self.inputs_valid = inputs.health.all_checks();

        let md = &inputs.model;
        self.lane_planner.parse_model(md);
        self.ingest_path(md);

        self.desire_helper.update(
            &inputs.car_state,
            inputs.car_control.lat_active,
            self.lane_planner.lane_change_prob(),
        );

        // Turn off lanes during lane change
        let (l_prob, r_prob) = self.lane_planner.lane_probs();
        let (l_prob, r_prob) = attenuate_lane_probs(
            l_prob,
            r_prob,
            self.desire_helper.desire(),
            self.desire_helper.lane_change_ll_prob(),
        );
        self.lane_planner.set_lane_probs(l_prob, r_prob);

        let decision = self.blend.update(l_prob, r_prob);
        if decision.reset_required {
            self.mpc.reset(LateralState::zeros());
        }

        self.weights = self
            .cost_shaper
            .weights(decision.mode, v_ego, &self.path.points[0], &self.path.stds[0]);
        self.mpc.set_weights(self.weights);

        self.d_path = match decision.mode {
            BlendMode::Laneline => self.lane_planner.get_d_path(v_ego, &self.path.t, &self.path.points),
            BlendMode::Laneless => self.path.points.clone(),
        };

        let targets = resample_path(
            &self.d_path,
            &self.path.points,
            &self.path.yaw,
            &self.path.t,
            v_ego,
            LAT_MPC_N,
        );

        let params = SolverParams::new(v_ego, CAR_ROTATION_RADIUS);
        let solution = self.mpc.run(
            &params,
            &targets.y_pts,
            &targets.heading_pts,
            &self.path.t[..=LAT_MPC_N],
        );
        trace!(
            cost = solution.cost,
            solve_time = solution.solve_time,
            status = solution.status,
            path_weight = self.weights.path,
            heading_weight = self.weights.heading,
            laneline = decision.mode.is_laneline(),
            "lateral plan solved"
        );
        self.y_pts = targets.y_pts;

        let verdict = self.watchdog.check(&mut self.mpc, measured_curvature, inputs.mono_time);
        self.last_verdict = Some(verdict);
    }

    /// Messages for the cycle last run by [`Self::update`]
    pub fn publish(&self) -> PlanMessages {
        assemble(&PlanOutputs {
            inputs_valid: self.inputs_valid,
            y_pts: &self.y_pts,
            solution: self.mpc.solution(),
            solution_valid: self.watchdog.solution_valid(),
            lane_change: LaneChangeTags {
                desire: self.desire_helper.desire(),
                state: self.desire_helper.lane_change_state(),
                direction: self.desire_helper.lane_change_direction(),
            },
            use_lane_lines: self.blend.use_lane_lines(),
            d_path: &self.d_path,
        })
    }

    /// Replace the cached path only with complete model arrays
    fn ingest_path(&mut self, md: &ModelOutput) {
        let pos = &md.position;
        let full = |v: &Vec<f64>| v.len() == TRAJECTORY_SIZE;
        if full(&pos.x) && full(&pos.y) && full(&pos.z) && full(&pos.t) && full(&md.orientation.z) {
            self.path.points = (0..TRAJECTORY_SIZE)
                .map(|i| Point3D::new(pos.x[i], pos.y[i], pos.z[i]))
                .collect();
            self.path.t = pos.t.clone();
            self.path.yaw = md.orientation.z.clone();
        }
        if full(&pos.x_std) && full(&pos.y_std) && full(&pos.z_std) {
            self.path.stds = (0..TRAJECTORY_SIZE)
                .map(|i| Point3D::new(pos.x_std[i], pos.y_std[i], pos.z_std[i]))
                .collect();
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend.mode()
    }

    pub fn weights(&self) -> CostWeights {
        self.weights
    }

    pub fn path(&self) -> &PredictedPath {
        &self.path
    }

    pub fn y_pts(&self) -> &[f64] {
        &self.y_pts
    }

    pub fn x0(&self) -> &LateralState {
        self.mpc.x0()
    }

    pub fn solution_valid(&self) -> bool {
        self.watchdog.solution_valid()
    }

    pub fn last_verdict(&self) -> Option<WatchdogVerdict> {
        self.last_verdict
    }

    pub fn desire_helper(&self) -> &DesireHelper {
        &self.desire_helper
    }

    pub fn solver(&self) -> &S {
        self.mpc.solver()
    }

    pub fn solver_mut(&mut self) -> &mut S {
        self.mpc.solver_mut()
    }
}
