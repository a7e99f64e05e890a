//! Solver cost weights per cycle
//!
//! The curvature-rate weight is fixed per vehicle brand. Path and heading
//! weights are fixed in laneline mode; in laneless mode they follow the
//! model's immediate lateral error and the vehicle speed.

use crate::common::{BlendMode, CostWeights, Point3D};
use crate::config::CostConfig;
use crate::utils::interp;

/// Curvature-rate cost per vehicle brand
pub const STEER_RATE_COST: &[(&str, f64)] = &[
    ("chrysler", 0.7),
    ("ford", 1.0),
    ("gm", 1.0),
    ("honda", 0.5),
    ("hyundai", 0.5),
    ("mazda", 1.0),
    ("nissan", 0.5),
    ("subaru", 0.7),
    ("tesla", 0.5),
    ("toyota", 1.0),
    ("volkswagen", 1.0),
];

/// Steer-rate cost for `car_name`, 0 for brands not in the table
pub fn steer_rate_cost(car_name: &str) -> f64 {
    STEER_RATE_COST
        .iter()
        .find(|(brand, _)| *brand == car_name)
        .map(|&(_, cost)| cost)
        .unwrap_or(0.0)
}

/// Computes the cost weights for each cycle
#[derive(Debug, Clone)]
pub struct CostShaper {
    costs: CostConfig,
    steer_rate: f64,
}

impl CostShaper {
    pub fn new(costs: CostConfig, car_name: &str) -> Self {
        CostShaper {
            costs,
            steer_rate: steer_rate_cost(car_name),
        }
    }

    pub fn steer_rate(&self) -> f64 {
        self.steer_rate
    }

    /// Weights for this cycle.
    ///
    /// `first_point` and `first_std` are the first model path point and its
    /// standard deviation; they are ignored in laneline mode.
    pub fn weights(&self, mode: BlendMode, v_ego: f64, first_point: &Point3D, first_std: &Point3D) -> CostWeights {
        match mode {
            BlendMode::Laneline => CostWeights::new(self.costs.path, self.costs.heading, self.steer_rate),
            BlendMode::Laneless => {
                let [lo, hi] = self.costs.path_scale_clip;
                let scale = (first_point.y / first_std.y).abs();
                // NaN ratio (0/0) falls back to the lower bound
                let scale = if scale.is_nan() { lo } else { scale.max(lo).min(hi) };
                let path = scale * self.costs.path;

                // Heading only matters at low speed, where the end of the
                // plan can otherwise point off the road
                let heading = interp(
                    v_ego,
                    &self.costs.heading_speed_breakpoints,
                    &[self.costs.heading, 0.0],
                );
                CostWeights::new(path, heading, self.steer_rate)
            }
        }
    }
}
