//! Planner configuration
//!
//! Every field has a default matching the tuned planner, so an empty TOML
//! document yields [`PlannerConfig::default`]. Parameters are read once at
//! construction; nothing here changes while the planner runs.
//!
//! ```toml
//! car_name = "honda"
//! lane_priority_mode = true
//!
//! [hysteresis]
//! enter_laneline = 0.5
//! exit_laneline = 0.3
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{MpcCostLat, PlannerError, PlannerResult};

/// Lane-line confidence thresholds for switching the blend mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Enter laneline mode above this mean confidence
    pub enter_laneline: f64,
    /// Leave laneline mode below this mean confidence
    pub exit_laneline: f64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            enter_laneline: 0.5,
            exit_laneline: 0.3,
        }
    }
}

/// Path and heading cost tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub path: f64,
    pub heading: f64,
    /// Speeds [m/s] at which the laneless heading weight is full and zero
    pub heading_speed_breakpoints: [f64; 2],
    /// Bounds on the laneless path weight scale
    pub path_scale_clip: [f64; 2],
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            path: MpcCostLat::PATH,
            heading: MpcCostLat::HEADING,
            heading_speed_breakpoints: [5.0, 10.0],
            path_scale_clip: [0.5, 1.5],
        }
    }
}

/// Solution watchdog tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Solutions costlier than this count as invalid
    pub cost_ceiling: f64,
    /// Plan is untrusted once this many consecutive invalid solutions occur
    pub invalid_threshold: u32,
    /// Minimum time between fault warnings [s]
    pub warning_interval: f64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            cost_ceiling: 20000.0,
            invalid_threshold: 2,
            warning_interval: 5.0,
        }
    }
}

/// Lane-line geometry tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Lateral offset added to lane lines [m]
    pub camera_offset: f64,
    /// Lateral offset added to the blended path [m]
    pub path_offset: f64,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            camera_offset: 0.04,
            path_offset: 0.0,
        }
    }
}

/// Configuration for the lateral planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Vehicle brand, selects the steer-rate cost
    pub car_name: String,
    /// Allow laneline mode when lane lines are confident
    pub lane_priority_mode: bool,
    pub hysteresis: HysteresisConfig,
    pub costs: CostConfig,
    pub watchdog: WatchdogConfig,
    pub lane: LaneConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            car_name: String::new(),
            lane_priority_mode: false,
            hysteresis: HysteresisConfig::default(),
            costs: CostConfig::default(),
            watchdog: WatchdogConfig::default(),
            lane: LaneConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        let h = &self.hysteresis;
        if !(0.0..=1.0).contains(&h.enter_laneline) {
            return Err(PlannerError::invalid(
                "hysteresis.enter_laneline",
                "must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&h.exit_laneline) {
            return Err(PlannerError::invalid(
                "hysteresis.exit_laneline",
                "must be within [0, 1]",
            ));
        }
        if h.exit_laneline >= h.enter_laneline {
            return Err(PlannerError::invalid(
                "hysteresis",
                format!(
                    "exit_laneline ({}) must be below enter_laneline ({})",
                    h.exit_laneline, h.enter_laneline
                ),
            ));
        }

        let c = &self.costs;
        if !(c.path.is_finite() && c.path >= 0.0) {
            return Err(PlannerError::invalid("costs.path", "must be finite and non-negative"));
        }
        if !(c.heading.is_finite() && c.heading >= 0.0) {
            return Err(PlannerError::invalid("costs.heading", "must be finite and non-negative"));
        }
        let [v_lo, v_hi] = c.heading_speed_breakpoints;
        if !(v_lo < v_hi) {
            return Err(PlannerError::invalid(
                "costs.heading_speed_breakpoints",
                "breakpoints must be strictly increasing",
            ));
        }
        let [s_lo, s_hi] = c.path_scale_clip;
        if !(s_lo > 0.0 && s_lo <= s_hi) {
            return Err(PlannerError::invalid(
                "costs.path_scale_clip",
                "bounds must be positive and ordered",
            ));
        }

        let w = &self.watchdog;
        if !(w.cost_ceiling > 0.0) {
            return Err(PlannerError::invalid("watchdog.cost_ceiling", "must be positive"));
        }
        if w.invalid_threshold == 0 {
            return Err(PlannerError::invalid("watchdog.invalid_threshold", "must be at least 1"));
        }
        if !(w.warning_interval >= 0.0) {
            return Err(PlannerError::invalid("watchdog.warning_interval", "must be non-negative"));
        }
        Ok(())
    }
}
