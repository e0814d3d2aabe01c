use serde::{Deserialize, Serialize};

use crate::types::{landmark, FingerState, Gesture, HandPose};

const DRAW_POSE: FingerState = [false, true, false, false, false];
const POINTER_POSE: FingerState = [false, true, true, false, false];
const ERASE_POSE: FingerState = [false, true, true, true, false];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Hand centroids at or above this camera row are in the control strip.
    pub zone_threshold_y: f32,
    /// Fingertips closer than this (pixels) count as a pinch.
    pub pinch_threshold: f32,
    /// Recognise thumb + ring as the spotlight toggle.
    pub spotlight_pinch: bool,
    /// Ticks to ignore gestures after a discrete action.
    pub debounce_ticks: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            zone_threshold_y: 300.0,
            pinch_threshold: 40.0,
            spotlight_pinch: true,
            debounce_ticks: 20,
        }
    }
}

pub fn pinch(hand: &HandPose, a: usize, b: usize, threshold: f32) -> bool {
    match (hand.keypoint(a), hand.keypoint(b)) {
        (Some(p), Some(q)) => p.distance(&q) < threshold,
        _ => false,
    }
}

/// Classify a single hand pose. First match wins.
///
/// In the control strip only pinches count: thumb+index goes back, thumb+middle
/// goes forward, thumb+ring toggles the spotlight. Below the strip only finger
/// poses count. The two zones never produce each other's gestures.
pub fn classify(hand: &HandPose, cfg: &GestureConfig) -> Gesture {
    if hand.centroid.y <= cfg.zone_threshold_y {
        let t = cfg.pinch_threshold;
        if pinch(hand, landmark::THUMB_TIP, landmark::INDEX_TIP, t) {
            Gesture::Previous
        } else if pinch(hand, landmark::THUMB_TIP, landmark::MIDDLE_TIP, t) {
            Gesture::Next
        } else if cfg.spotlight_pinch && pinch(hand, landmark::THUMB_TIP, landmark::RING_TIP, t) {
            Gesture::ToggleSpotlight
        } else {
            Gesture::None
        }
    } else {
        match hand.fingers_up {
            DRAW_POSE => Gesture::Draw,
            POINTER_POSE => Gesture::Pointer,
            ERASE_POSE => Gesture::Erase,
            _ => Gesture::None,
        }
    }
}

/// Only the first hand drives the presentation; no hand means no gesture.
pub fn classify_frame(hands: &[HandPose], cfg: &GestureConfig) -> Gesture {
    hands
        .first()
        .map(|hand| classify(hand, cfg))
        .unwrap_or(Gesture::None)
}
