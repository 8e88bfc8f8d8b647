//! Landmark and frame data model
//!
//! Shared between the live pose feed and the reference motion store. Joint
//! ids follow the pose model's fixed numbering, so the same id refers to the
//! same joint in live and reference data.

use serde::{Deserialize, Serialize};

/// Joint ids consulted by the similarity scorer: shoulders (11, 12),
/// hips (23, 24) and knees (25, 26). All other joints are ignored.
pub const IMPORTANT_JOINTS: [u32; 6] = [11, 12, 23, 24, 25, 26];

/// A single tracked body-joint coordinate in normalised image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Stable joint identifier.
    pub id: u32,
    pub x: f64,
    pub y: f64,
    /// Depth estimate; absent in some payloads, defaulting to 0.
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(id: u32, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// 3-D Euclidean distance to another landmark.
    pub fn distance(&self, other: &LandmarkPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Whether this joint participates in similarity scoring.
    pub fn is_important(&self) -> bool {
        IMPORTANT_JOINTS.contains(&self.id)
    }
}

/// An ordered set of landmarks captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub landmarks: Vec<LandmarkPoint>,
}

impl Frame {
    pub fn new(landmarks: Vec<LandmarkPoint>) -> Self {
        Self { landmarks }
    }

    /// Looks up a landmark by joint id.
    pub fn landmark(&self, id: u32) -> Option<&LandmarkPoint> {
        self.landmarks.iter().find(|pt| pt.id == id)
    }
}
