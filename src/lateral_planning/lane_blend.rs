//! Laneline / laneless mode selection
//!
//! Laneline mode is only ever considered when lane priority is enabled.
//! The mean of left and right lane-line confidence has to rise above the
//! enter threshold to engage it and drop below the exit threshold to leave
//! it; in between the previous mode holds.

use tracing::debug;

use crate::common::{BlendMode, Desire};
use crate::config::HysteresisConfig;

/// Outcome of one blend-policy update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendDecision {
    pub mode: BlendMode,
    /// Active mode flipped this cycle; the solver warm start is stale
    pub reset_required: bool,
}

/// Next laneline-active flag for a given mean confidence
pub fn next_laneline_active(active: bool, mean_prob: f64, hysteresis: &HysteresisConfig) -> bool {
    if mean_prob < hysteresis.exit_laneline {
        false
    } else if mean_prob > hysteresis.enter_laneline {
        true
    } else {
        active
    }
}

/// Scale lane-line confidences down while a lane change is under way
pub fn attenuate_lane_probs(l_prob: f64, r_prob: f64, desire: Desire, ll_prob_decay: f64) -> (f64, f64) {
    if desire.is_lane_change() {
        (l_prob * ll_prob_decay, r_prob * ll_prob_decay)
    } else {
        (l_prob, r_prob)
    }
}

/// Sticky laneline/laneless selector
#[derive(Debug, Clone)]
pub struct LaneBlendPolicy {
    enabled: bool,
    hysteresis: HysteresisConfig,
    active: bool,
    active_prev: bool,
}

impl LaneBlendPolicy {
    pub fn new(enabled: bool, hysteresis: HysteresisConfig) -> Self {
        LaneBlendPolicy {
            enabled,
            hysteresis,
            active: false,
            active_prev: false,
        }
    }

    /// Update with this cycle's (already attenuated) lane-line confidences
    pub fn update(&mut self, l_prob: f64, r_prob: f64) -> BlendDecision {
        if !self.enabled {
            return BlendDecision {
                mode: BlendMode::Laneless,
                reset_required: false,
            };
        }

        let mean = (l_prob + r_prob) / 2.0;
        self.active = next_laneline_active(self.active, mean, &self.hysteresis);

        let reset_required = self.active != self.active_prev;
        if reset_required {
            debug!(laneline = self.active, mean_prob = mean, "lateral blend mode changed");
        }
        self.active_prev = self.active;

        BlendDecision {
            mode: self.mode(),
            reset_required,
        }
    }

    pub fn mode(&self) -> BlendMode {
        if self.use_lane_lines() {
            BlendMode::Laneline
        } else {
            BlendMode::Laneless
        }
    }

    pub fn use_lane_lines(&self) -> bool {
        self.enabled && self.active
    }
}
