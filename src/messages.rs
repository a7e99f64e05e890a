//! Messages consumed and produced by the planner each cycle
//!
//! Inbound messages mirror the fields the planner reads from the car,
//! controls and model services. Outbound messages are plain serializable
//! records; transport belongs to the caller.

use serde::Serialize;

use crate::common::{Desire, LaneChangeDirection, LaneChangeState};

/// Vehicle state reported by the car interface
#[derive(Debug, Clone, Default)]
pub struct CarState {
    /// Speed [m/s]
    pub v_ego: f64,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub steering_pressed: bool,
    /// Driver torque, positive to the left
    pub steering_torque: f64,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
}

/// Controls loop state
#[derive(Debug, Clone, Default)]
pub struct ControlsState {
    /// Measured path curvature [1/m]
    pub curvature: f64,
}

/// Controls loop commands
#[derive(Debug, Clone, Default)]
pub struct CarControl {
    /// Lateral control engaged
    pub lat_active: bool,
}

/// Sampled trajectory with per-axis standard deviations
#[derive(Debug, Clone, Default)]
pub struct XYZTData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub t: Vec<f64>,
    pub x_std: Vec<f64>,
    pub y_std: Vec<f64>,
    pub z_std: Vec<f64>,
}

/// Perception model output
#[derive(Debug, Clone, Default)]
pub struct ModelOutput {
    pub position: XYZTData,
    /// Orientation as roll/pitch/yaw in x/y/z
    pub orientation: XYZTData,
    /// Left-far, left-ego, right-ego, right-far
    pub lane_lines: Vec<XYZTData>,
    pub lane_line_probs: Vec<f64>,
    pub lane_line_stds: Vec<f64>,
    /// Probability per [`Desire`] variant, indexed by [`Desire::index`]
    pub desire_state: Vec<f64>,
}

/// Liveness and validity of the subscribed services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHealth {
    pub car_state: bool,
    pub controls_state: bool,
    pub model: bool,
}

impl ServiceHealth {
    pub fn all_valid() -> Self {
        Self {
            car_state: true,
            controls_state: true,
            model: true,
        }
    }

    /// True when every service the plan depends on is alive and valid
    pub fn all_checks(&self) -> bool {
        self.car_state && self.controls_state && self.model
    }
}

impl Default for ServiceHealth {
    fn default() -> Self {
        Self::all_valid()
    }
}

/// Everything one planning cycle reads
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    /// Monotonic time of this cycle [s]
    pub mono_time: f64,
    pub car_state: CarState,
    pub controls_state: ControlsState,
    pub car_control: CarControl,
    pub model: ModelOutput,
    pub health: ServiceHealth,
}

/// Primary plan consumed by the lateral controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LateralPlan {
    /// Upstream inputs were complete this cycle
    pub valid: bool,
    pub d_path_points: Vec<f64>,
    pub psis: Vec<f64>,
    pub curvatures: Vec<f64>,
    pub curvature_rates: Vec<f64>,
    pub mpc_solution_valid: bool,
    pub solver_execution_time: f64,
    pub desire: Desire,
    pub use_lane_lines: bool,
    pub lane_change_state: LaneChangeState,
    pub lane_change_direction: LaneChangeDirection,
}

/// Driving path used this cycle, for visualization and turn-speed tooling
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LateralPlanExt {
    pub d_path_w_lines_x: Vec<f64>,
    pub d_path_w_lines_y: Vec<f64>,
}

/// Both messages emitted by one publish call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMessages {
    pub lateral_plan: LateralPlan,
    pub lateral_plan_ext: LateralPlanExt,
}
