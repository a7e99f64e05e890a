//! Pipeline-wide constants shared by the model, the planner and the solver

/// Number of points in every model trajectory
pub const TRAJECTORY_SIZE: usize = 33;

/// Solver horizon (number of control intervals)
pub const LAT_MPC_N: usize = 16;

/// Number of plan points published to the controller
pub const CONTROL_N: usize = 17;

/// Nominal model/planner cycle period [s]
pub const DT_MDL: f64 = 0.05;

/// Distance from the rear axle to the rotation point used by the solver [m]
pub const CAR_ROTATION_RADIUS: f64 = 0.0;

/// Base lateral MPC cost weights
pub struct MpcCostLat;

impl MpcCostLat {
    pub const PATH: f64 = 1.0;
    pub const HEADING: f64 = 1.0;
    pub const STEER_RATE: f64 = 1.0;
}

/// Model time offsets: quadratic spacing over 10 s
pub fn t_idxs() -> [f64; TRAJECTORY_SIZE] {
    let mut t = [0.0; TRAJECTORY_SIZE];
    let last = (TRAJECTORY_SIZE - 1) as f64;
    for (i, ti) in t.iter_mut().enumerate() {
        *ti = 10.0 * (i as f64 / last).powi(2);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_idxs_shape() {
        let t = t_idxs();
        assert_eq!(t[0], 0.0);
        assert!((t[TRAJECTORY_SIZE - 1] - 10.0).abs() < 1e-12);
        assert!(t.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_horizons_fit_trajectory() {
        assert!(LAT_MPC_N + 1 <= TRAJECTORY_SIZE);
        assert!(CONTROL_N <= LAT_MPC_N + 1);
    }
}
