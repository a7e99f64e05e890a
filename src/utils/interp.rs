//! Piecewise-linear interpolation on monotone sample points
//!
//! Queries outside the sample range clamp to the first or last value.

use itertools::Itertools;

use crate::common::Point3D;

/// Interpolate `fp(xp)` at `x`.
///
/// `xp` must be non-decreasing and the same length as `fp`. Values of `x`
/// below `xp[0]` return `fp[0]`, values above the last sample return the
/// last value. Repeated sample points resolve to the rightmost one.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() || xp[0].is_nan() || xp[n - 1].is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // xp[hi - 1] <= x < xp[hi]; interior NaNs can break the ordering
    let hi = xp[..n].partition_point(|&v| v <= x).max(1).min(n - 1);
    let lo = hi - 1;
    let ratio = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + ratio * (fp[hi] - fp[lo])
}

/// Interpolate at every query point
pub fn interp_many(xs: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| interp(x, xp, fp)).collect()
}

/// Cumulative distance travelled along `points`, measured from the origin.
///
/// The first entry is the distance from the origin to the first point, so
/// a path starting at the vehicle yields an arclength starting at zero.
pub fn cumulative_arclength(points: &[Point3D]) -> Vec<f64> {
    let first = match points.first() {
        Some(p) => p.norm(),
        None => return Vec::new(),
    };
    let mut s = Vec::with_capacity(points.len());
    s.push(first);
    for (a, b) in points.iter().tuple_windows() {
        let prev = s[s.len() - 1];
        s.push(prev + a.distance(b));
    }
    s
}
