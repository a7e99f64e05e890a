//! Common types used throughout lateral_planner

use nalgebra::{Vector3, Vector4};
use serde::Serialize;

use crate::common::constants::TRAJECTORY_SIZE;

/// 3D point representation (also used for per-axis standard deviations)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Euclidean distance from the origin
    pub fn norm(&self) -> f64 {
        self.to_vector().norm()
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Lateral solver state `[x, y, psi, curvature]`
pub type LateralState = Vector4<f64>;

/// Index of the heading component of [`LateralState`]
pub const STATE_PSI: usize = 2;
/// Index of the curvature component of [`LateralState`]
pub const STATE_CURVATURE: usize = 3;

/// Model predicted path cached across cycles.
///
/// All four sequences always hold [`TRAJECTORY_SIZE`] entries; an incoming
/// model message with mismatched lengths leaves the cached values untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedPath {
    pub points: Vec<Point3D>,
    pub stds: Vec<Point3D>,
    pub t: Vec<f64>,
    pub yaw: Vec<f64>,
}

impl PredictedPath {
    /// Path through the origin with unit uncertainty and integer time steps
    pub fn new() -> Self {
        Self {
            points: vec![Point3D::origin(); TRAJECTORY_SIZE],
            stds: vec![Point3D::new(1.0, 1.0, 1.0); TRAJECTORY_SIZE],
            t: (0..TRAJECTORY_SIZE).map(|i| i as f64).collect(),
            yaw: vec![0.0; TRAJECTORY_SIZE],
        }
    }
}

impl Default for PredictedPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Cost weights handed to the solver each cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostWeights {
    pub path: f64,
    pub heading: f64,
    pub steer_rate: f64,
}

impl CostWeights {
    pub fn new(path: f64, heading: f64, steer_rate: f64) -> Self {
        Self { path, heading, steer_rate }
    }
}

/// Which path source drives the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlendMode {
    /// Raw model path, independent of lane markings
    Laneless,
    /// Path blended toward detected lane lines
    Laneline,
}

impl BlendMode {
    pub fn is_laneline(self) -> bool {
        self == BlendMode::Laneline
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Laneless
    }
}

/// Driver intent tagged on the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Desire {
    None,
    TurnLeft,
    TurnRight,
    LaneChangeLeft,
    LaneChangeRight,
    KeepLeft,
    KeepRight,
}

impl Desire {
    /// Index of this desire in the model's desire-state vector
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_lane_change(self) -> bool {
        matches!(self, Desire::LaneChangeLeft | Desire::LaneChangeRight)
    }
}

impl Default for Desire {
    fn default() -> Self {
        Desire::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeState {
    Off,
    PreLaneChange,
    LaneChangeStarting,
    LaneChangeFinishing,
}

impl Default for LaneChangeState {
    fn default() -> Self {
        LaneChangeState::Off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeDirection {
    None,
    Left,
    Right,
}

impl Default for LaneChangeDirection {
    fn default() -> Self {
        LaneChangeDirection::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point3d_norm() {
        let p = Point3D::new(2.0, 3.0, 6.0);
        assert!((p.norm() - 7.0).abs() < 1e-10);
        assert!((p.distance(&Point3D::origin()) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_predicted_path_default_lengths() {
        let path = PredictedPath::default();
        assert_eq!(path.points.len(), TRAJECTORY_SIZE);
        assert_eq!(path.stds.len(), TRAJECTORY_SIZE);
        assert_eq!(path.t.len(), TRAJECTORY_SIZE);
        assert_eq!(path.yaw.len(), TRAJECTORY_SIZE);
        assert_eq!(path.stds[0].y, 1.0);
    }

    #[test]
    fn test_desire_index_matches_model_layout() {
        assert_eq!(Desire::None.index(), 0);
        assert_eq!(Desire::LaneChangeLeft.index(), 3);
        assert_eq!(Desire::LaneChangeRight.index(), 4);
        assert!(Desire::LaneChangeLeft.is_lane_change());
        assert!(!Desire::KeepLeft.is_lane_change());
    }
}
