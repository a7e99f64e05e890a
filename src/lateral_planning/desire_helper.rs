//! Lane change state machine
//!
//! A single blinker above the minimum speed arms a lane change; driver
//! torque toward the blinker side (with no vehicle in the blind spot) starts
//! it. Lane lines fade out while the change starts and fade back in once the
//! model no longer predicts a lane change.

use tracing::debug;

use crate::common::{Desire, LaneChangeDirection, LaneChangeState, DT_MDL};
use crate::messages::CarState;

/// Lane changes are not offered below this speed [m/s] (20 mph)
pub const LANE_CHANGE_SPEED_MIN: f64 = 20.0 * 0.44704;
/// A lane change that has not finished after this long is abandoned [s]
pub const LANE_CHANGE_TIME_MAX: f64 = 10.0;

/// Desire published for a given direction and state
pub fn desire_for(direction: LaneChangeDirection, state: LaneChangeState) -> Desire {
    match (direction, state) {
        (LaneChangeDirection::Left, LaneChangeState::LaneChangeStarting)
        | (LaneChangeDirection::Left, LaneChangeState::LaneChangeFinishing) => Desire::LaneChangeLeft,
        (LaneChangeDirection::Right, LaneChangeState::LaneChangeStarting)
        | (LaneChangeDirection::Right, LaneChangeState::LaneChangeFinishing) => Desire::LaneChangeRight,
        _ => Desire::None,
    }
}

#[derive(Debug, Clone)]
pub struct DesireHelper {
    lane_change_state: LaneChangeState,
    lane_change_direction: LaneChangeDirection,
    lane_change_timer: f64,
    lane_change_ll_prob: f64,
    prev_one_blinker: bool,
    desire: Desire,
}

impl DesireHelper {
    pub fn new() -> Self {
        DesireHelper {
            lane_change_state: LaneChangeState::Off,
            lane_change_direction: LaneChangeDirection::None,
            lane_change_timer: 0.0,
            lane_change_ll_prob: 1.0,
            prev_one_blinker: false,
            desire: Desire::None,
        }
    }

    /// Advance one cycle.
    ///
    /// `lane_change_prob` is the model's combined left/right lane-change
    /// probability.
    pub fn update(&mut self, car_state: &CarState, lateral_active: bool, lane_change_prob: f64) {
        let prev_state = self.lane_change_state;
        let one_blinker = car_state.left_blinker != car_state.right_blinker;
        let below_lane_change_speed = car_state.v_ego < LANE_CHANGE_SPEED_MIN;

        if !lateral_active || self.lane_change_timer > LANE_CHANGE_TIME_MAX {
            self.lane_change_state = LaneChangeState::Off;
            self.lane_change_direction = LaneChangeDirection::None;
        } else {
            match self.lane_change_state {
                LaneChangeState::Off => {
                    if one_blinker && !self.prev_one_blinker && !below_lane_change_speed {
                        self.lane_change_state = LaneChangeState::PreLaneChange;
                        self.lane_change_ll_prob = 1.0;
                    }
                }
                LaneChangeState::PreLaneChange => {
                    self.lane_change_direction = if car_state.left_blinker {
                        LaneChangeDirection::Left
                    } else {
                        LaneChangeDirection::Right
                    };

                    let torque_applied = car_state.steering_pressed
                        && ((car_state.steering_torque > 0.0
                            && self.lane_change_direction == LaneChangeDirection::Left)
                            || (car_state.steering_torque < 0.0
                                && self.lane_change_direction == LaneChangeDirection::Right));

                    let blindspot_detected = (car_state.left_blindspot
                        && self.lane_change_direction == LaneChangeDirection::Left)
                        || (car_state.right_blindspot
                            && self.lane_change_direction == LaneChangeDirection::Right);

                    if !one_blinker || below_lane_change_speed {
                        self.lane_change_state = LaneChangeState::Off;
                        self.lane_change_direction = LaneChangeDirection::None;
                    } else if torque_applied && !blindspot_detected {
                        self.lane_change_state = LaneChangeState::LaneChangeStarting;
                    }
                }
                LaneChangeState::LaneChangeStarting => {
                    // fade out lane lines over 0.5 s
                    self.lane_change_ll_prob = (self.lane_change_ll_prob - 2.0 * DT_MDL).max(0.0);

                    if lane_change_prob < 0.02 && self.lane_change_ll_prob < 0.01 {
                        self.lane_change_state = LaneChangeState::LaneChangeFinishing;
                    }
                }
                LaneChangeState::LaneChangeFinishing => {
                    // fade lane lines back in over 1 s
                    self.lane_change_ll_prob = (self.lane_change_ll_prob + DT_MDL).min(1.0);

                    if self.lane_change_ll_prob > 0.99 {
                        self.lane_change_direction = LaneChangeDirection::None;
                        self.lane_change_state = if one_blinker {
                            LaneChangeState::PreLaneChange
                        } else {
                            LaneChangeState::Off
                        };
                    }
                }
            }
        }

        match self.lane_change_state {
            LaneChangeState::Off | LaneChangeState::PreLaneChange => self.lane_change_timer = 0.0,
            _ => self.lane_change_timer += DT_MDL,
        }

        self.prev_one_blinker = one_blinker;
        self.desire = desire_for(self.lane_change_direction, self.lane_change_state);

        if self.lane_change_state != prev_state {
            debug!(
                from = ?prev_state,
                to = ?self.lane_change_state,
                direction = ?self.lane_change_direction,
                "lane change state changed"
            );
        }
    }

    pub fn desire(&self) -> Desire {
        self.desire
    }

    pub fn lane_change_state(&self) -> LaneChangeState {
        self.lane_change_state
    }

    pub fn lane_change_direction(&self) -> LaneChangeDirection {
        self.lane_change_direction
    }

    /// Lane-line confidence multiplier for the current lane change
    pub fn lane_change_ll_prob(&self) -> f64 {
        self.lane_change_ll_prob
    }
}

impl Default for DesireHelper {
    fn default() -> Self {
        Self::new()
    }
}
