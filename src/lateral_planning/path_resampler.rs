//! Projects the model path onto the solver time grid
//!
//! The model samples its path at non-uniform time offsets while the solver
//! works on a fixed grid. Each grid time is turned into the arclength the
//! vehicle covers at its current speed, and the path's lateral offset and
//! heading are read off at that arclength.

use crate::common::Point3D;
use crate::utils::{cumulative_arclength, interp_many};

/// Lateral and heading references on the solver grid
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledTargets {
    pub y_pts: Vec<f64>,
    pub heading_pts: Vec<f64>,
}

/// Resample onto the first `horizon + 1` entries of `t_idxs`.
///
/// `d_path` supplies the lateral offsets, `model_path` and `plan_yaw` the
/// headings. Arclengths past the end of a path clamp to its final value.
pub fn resample_path(
    d_path: &[Point3D],
    model_path: &[Point3D],
    plan_yaw: &[f64],
    t_idxs: &[f64],
    v_ego: f64,
    horizon: usize,
) -> ResampledTargets {
    let grid_len = (horizon + 1).min(t_idxs.len());
    let expected_s: Vec<f64> = t_idxs[..grid_len].iter().map(|t| v_ego * t).collect();

    let d_path_s = cumulative_arclength(d_path);
    let d_path_y: Vec<f64> = d_path.iter().map(|p| p.y).collect();
    let y_pts = interp_many(&expected_s, &d_path_s, &d_path_y);

    let model_s = cumulative_arclength(model_path);
    let heading_pts = interp_many(&expected_s, &model_s, plan_yaw);

    debug_assert_eq!(y_pts.len(), horizon + 1);
    debug_assert_eq!(heading_pts.len(), horizon + 1);

    ResampledTargets { y_pts, heading_pts }
}
