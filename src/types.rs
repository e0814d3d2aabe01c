use serde::{Deserialize, Serialize};

/// Keypoint indices in the 21-point hand convention used by the landmark helper.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
    pub const COUNT: usize = 21;
}

/// A 2D point in pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Which fingers are extended, thumb first.
pub type FingerState = [bool; 5];

/// One detected hand for the current frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandPose {
    pub keypoints: Vec<Point>,
    pub fingers_up: FingerState,
    pub centroid: Point,
}

impl HandPose {
    pub fn keypoint(&self, index: usize) -> Option<Point> {
        self.keypoints.get(index).copied()
    }

    pub fn index_tip(&self) -> Option<Point> {
        self.keypoint(landmark::INDEX_TIP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Next,
    Previous,
    Draw,
    Pointer,
    Erase,
    /// Thumb + ring pinch in the control strip.
    ToggleSpotlight,
    None,
}

/// A single freehand annotation polyline.
pub type Stroke = Vec<Point>;
