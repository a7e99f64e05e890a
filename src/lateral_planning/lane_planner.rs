//! Lane-line geometry
//!
//! Parses the ego lane lines out of the model output and blends the model
//! path toward the lane centre in proportion to lane-line confidence.

use tracing::warn;

use crate::common::{Desire, Point3D, DT_MDL, TRAJECTORY_SIZE};
use crate::config::LaneConfig;
use crate::messages::ModelOutput;
use crate::utils::{interp, interp_many, FirstOrderFilter};

/// Lane widths above this are not trusted [m]
const MAX_LANE_WIDTH: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct LanePlanner {
    ll_t: Vec<f64>,
    ll_x: Vec<f64>,
    lll_y: Vec<f64>,
    rll_y: Vec<f64>,
    lll_prob: f64,
    rll_prob: f64,
    lll_std: f64,
    rll_std: f64,
    d_prob: f64,
    l_lane_change_prob: f64,
    r_lane_change_prob: f64,
    lane_width: f64,
    lane_width_estimate: FirstOrderFilter,
    lane_width_certainty: FirstOrderFilter,
    camera_offset: f64,
    path_offset: f64,
}

impl LanePlanner {
    pub fn new(config: &LaneConfig) -> Self {
        LanePlanner {
            ll_t: vec![0.0; TRAJECTORY_SIZE],
            ll_x: vec![0.0; TRAJECTORY_SIZE],
            lll_y: vec![0.0; TRAJECTORY_SIZE],
            rll_y: vec![0.0; TRAJECTORY_SIZE],
            lll_prob: 0.0,
            rll_prob: 0.0,
            lll_std: 0.0,
            rll_std: 0.0,
            d_prob: 0.0,
            l_lane_change_prob: 0.0,
            r_lane_change_prob: 0.0,
            lane_width: 3.7,
            lane_width_estimate: FirstOrderFilter::new(3.7, 9.95, DT_MDL),
            lane_width_certainty: FirstOrderFilter::new(1.0, 0.95, DT_MDL),
            camera_offset: config.camera_offset,
            path_offset: config.path_offset,
        }
    }

    /// Read lane lines and lane-change probabilities from the model.
    ///
    /// Lane lines are kept from the previous cycle unless all four are
    /// present with full-length samples.
    pub fn parse_model(&mut self, md: &ModelOutput) {
        let lines = &md.lane_lines;
        let full_length = lines.len() == 4
            && lines.iter().all(|l| {
                l.t.len() == TRAJECTORY_SIZE && l.x.len() == TRAJECTORY_SIZE && l.y.len() == TRAJECTORY_SIZE
            });
        if full_length && md.lane_line_probs.len() == 4 && md.lane_line_stds.len() == 4 {
            let (left, right) = (&lines[1], &lines[2]);
            self.ll_t = left.t.iter().zip(&right.t).map(|(a, b)| (a + b) / 2.0).collect();
            // left and right lane lines share x samples
            self.ll_x = left.x.clone();
            self.lll_y = left.y.iter().map(|y| y + self.camera_offset).collect();
            self.rll_y = right.y.iter().map(|y| y + self.camera_offset).collect();
            self.lll_prob = md.lane_line_probs[1];
            self.rll_prob = md.lane_line_probs[2];
            self.lll_std = md.lane_line_stds[1];
            self.rll_std = md.lane_line_stds[2];
        }

        let ds = &md.desire_state;
        if ds.len() > Desire::LaneChangeRight.index() {
            self.l_lane_change_prob = ds[Desire::LaneChangeLeft.index()];
            self.r_lane_change_prob = ds[Desire::LaneChangeRight.index()];
        }
    }

    /// Model path blended toward the lane centre.
    ///
    /// Returns a new path; `path` is left untouched.
    pub fn get_d_path(&mut self, v_ego: f64, path_t: &[f64], path: &[Point3D]) -> Vec<Point3D> {
        let mut d_path: Vec<Point3D> = path
            .iter()
            .map(|p| Point3D::new(p.x, p.y + self.path_offset, p.z))
            .collect();

        let mut l_prob = self.lll_prob;
        let mut r_prob = self.rll_prob;

        // Reduce reliance on lane lines that are, or soon will be, too far apart
        let width_pts: Vec<f64> = self.rll_y.iter().zip(&self.lll_y).map(|(r, l)| r - l).collect();
        let width_mod = [0.0, 1.5, 3.0]
            .iter()
            .map(|t_check| {
                let width_at_t = interp(t_check * (v_ego + 7.0), &self.ll_x, &width_pts);
                interp(width_at_t, &[4.0, 5.0], &[1.0, 0.0])
            })
            .fold(1.0, f64::min);
        l_prob *= width_mod;
        r_prob *= width_mod;

        // Reduce reliance on uncertain lane lines
        l_prob *= interp(self.lll_std, &[0.15, 0.3], &[1.0, 0.0]);
        r_prob *= interp(self.rll_std, &[0.15, 0.3], &[1.0, 0.0]);

        // Current lane width, falling back to a speed-based prior
        self.lane_width_certainty.update(l_prob * r_prob);
        let current_lane_width = (self.rll_y[0] - self.lll_y[0]).abs();
        self.lane_width_estimate.update(current_lane_width);
        let speed_lane_width = interp(v_ego, &[0.0, 31.0], &[2.8, 3.5]);
        let certainty = self.lane_width_certainty.x();
        self.lane_width = certainty * self.lane_width_estimate.x() + (1.0 - certainty) * speed_lane_width;

        let half_width = self.lane_width.min(MAX_LANE_WIDTH) / 2.0;
        self.d_prob = l_prob + r_prob - l_prob * r_prob;
        let lane_path_y: Vec<f64> = self
            .lll_y
            .iter()
            .zip(&self.rll_y)
            .map(|(l, r)| (l_prob * (l + half_width) + r_prob * (r - half_width)) / (l_prob + r_prob + 0.0001))
            .collect();

        let (safe_t, safe_y): (Vec<f64>, Vec<f64>) = self
            .ll_t
            .iter()
            .zip(&lane_path_y)
            .filter(|(t, _)| t.is_finite())
            .map(|(t, y)| (*t, *y))
            .unzip();

        if self.ll_t.first().map_or(false, |t| t.is_finite()) {
            let lane_y = interp_many(path_t, &safe_t, &safe_y);
            for (p, ly) in d_path.iter_mut().zip(lane_y) {
                p.y = self.d_prob * ly + (1.0 - self.d_prob) * p.y;
            }
        } else {
            warn!("lateral mpc - NaNs in laneline times, ignoring");
        }
        d_path
    }

    pub fn lane_probs(&self) -> (f64, f64) {
        (self.lll_prob, self.rll_prob)
    }

    /// Overwrite lane-line confidences, e.g. after lane-change attenuation
    pub fn set_lane_probs(&mut self, l_prob: f64, r_prob: f64) {
        self.lll_prob = l_prob;
        self.rll_prob = r_prob;
    }

    /// Combined model probability of a lane change in either direction
    pub fn lane_change_prob(&self) -> f64 {
        self.l_lane_change_prob + self.r_lane_change_prob
    }

    /// Probability that the blended path follows the lanes
    pub fn d_prob(&self) -> f64 {
        self.d_prob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::t_idxs;
    use crate::messages::XYZTData;

    fn lane_line(offset: f64) -> XYZTData {
        let t = t_idxs();
        XYZTData {
            x: t.iter().map(|ti| 20.0 * ti).collect(),
            y: vec![offset; TRAJECTORY_SIZE],
            z: vec![0.0; TRAJECTORY_SIZE],
            t: t.to_vec(),
            ..XYZTData::default()
        }
    }

    fn model_with_lanes(left: f64, right: f64, prob: f64) -> ModelOutput {
        ModelOutput {
            lane_lines: vec![lane_line(left - 3.5), lane_line(left), lane_line(right), lane_line(right + 3.5)],
            lane_line_probs: vec![0.1, prob, prob, 0.1],
            lane_line_stds: vec![0.1; 4],
            desire_state: vec![0.9, 0.0, 0.0, 0.02, 0.03, 0.0, 0.0],
            ..ModelOutput::default()
        }
    }

    fn no_offset() -> LaneConfig {
        LaneConfig {
            camera_offset: 0.0,
            path_offset: 0.0,
        }
    }

    #[test]
    fn test_parse_model_reads_ego_lines() {
        let mut lp = LanePlanner::new(&LaneConfig::default());
        lp.parse_model(&model_with_lanes(-1.8, 1.8, 0.9));
        assert_eq!(lp.lane_probs(), (0.9, 0.9));
        assert!((lp.lll_y[0] - (-1.8 + 0.04)).abs() < 1e-12);
        assert!((lp.lane_change_prob() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_parse_model_ignores_short_lines() {
        let mut lp = LanePlanner::new(&no_offset());
        let mut md = model_with_lanes(-1.8, 1.8, 0.9);
        md.lane_lines[2].y.pop();
        lp.parse_model(&md);
        assert_eq!(lp.lane_probs(), (0.0, 0.0));
    }

    #[test]
    fn test_d_path_pulls_toward_lane_centre() {
        let mut lp = LanePlanner::new(&no_offset());
        // lanes centred 0.5 m to the left
        lp.parse_model(&model_with_lanes(-1.3, 2.3, 1.0));
        let t = t_idxs();
        let path: Vec<Point3D> = t.iter().map(|ti| Point3D::new(20.0 * ti, 0.0, 0.0)).collect();
        let d_path = lp.get_d_path(20.0, &t, &path);

        assert!((lp.d_prob() - 1.0).abs() < 1e-12);
        for p in &d_path {
            assert!((p.y - 0.5).abs() < 0.01);
        }
        // input path untouched
        assert!(path.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn test_no_lanes_keeps_model_path() {
        let mut lp = LanePlanner::new(&no_offset());
        lp.parse_model(&model_with_lanes(-1.8, 1.8, 0.0));
        let t = t_idxs();
        let path: Vec<Point3D> = t.iter().map(|ti| Point3D::new(20.0 * ti, 0.3, 0.0)).collect();
        let d_path = lp.get_d_path(20.0, &t, &path);
        assert_eq!(lp.d_prob(), 0.0);
        assert!(d_path.iter().all(|p| (p.y - 0.3).abs() < 1e-12));
    }

    #[test]
    fn test_nan_lane_distances_do_not_abort() {
        let mut lp = LanePlanner::new(&no_offset());
        let mut md = model_with_lanes(-1.3, 2.3, 1.0);
        md.lane_lines[1].x = vec![f64::NAN; TRAJECTORY_SIZE];
        lp.parse_model(&md);
        let t = t_idxs();
        let path: Vec<Point3D> = t.iter().map(|ti| Point3D::new(20.0 * ti, 0.0, 0.0)).collect();
        let d_path = lp.get_d_path(20.0, &t, &path);
        assert_eq!(d_path.len(), TRAJECTORY_SIZE);
        assert!(d_path.iter().all(|p| p.y.is_finite()));
    }

    #[test]
    fn test_nan_lane_times_are_ignored() {
        let mut lp = LanePlanner::new(&no_offset());
        let mut md = model_with_lanes(-1.3, 2.3, 1.0);
        md.lane_lines[1].t[0] = f64::NAN;
        lp.parse_model(&md);
        let t = t_idxs();
        let path: Vec<Point3D> = t.iter().map(|ti| Point3D::new(20.0 * ti, 0.0, 0.0)).collect();
        let d_path = lp.get_d_path(20.0, &t, &path);
        assert!(d_path.iter().all(|p| p.y == 0.0));
    }
}
