//! Hand landmark detection lives outside this crate.
//!
//! [`LandmarkServer`] talks to a helper process over JSON lines: each request
//! names a frame image on disk, each response lists at most one hand.
//!
//! ```text
//! -> {"image_path": "/tmp/gesture_deck_frame.jpg", "max_hands": 1}
//! <- {"status": "success", "hands": [{"keypoints": [[x, y], ...21],
//!                                     "fingers_up": [0, 1, 0, 0, 0],
//!                                     "center": [cx, cy]}]}
//! ```
//! `center` is optional; the keypoint bounding-box centre is used without it.

use anyhow::{bail, Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use crate::types::{landmark, FingerState, HandPose, Point};

pub trait HandTracker {
    fn name(&self) -> String;
    /// Hands found in `frame`, at most one, in frame pixel coordinates.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandPose>>;
}

#[derive(Serialize)]
struct LandmarkRequest<'a> {
    image_path: &'a str,
    max_hands: usize,
}

#[derive(Deserialize, Debug)]
struct LandmarkResponse {
    status: String,
    #[serde(default)]
    hands: Vec<WireHand>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct WireHand {
    keypoints: Vec<[f32; 2]>,
    fingers_up: [u8; 5],
    center: Option<[f32; 2]>,
}

impl WireHand {
    fn into_pose(self) -> HandPose {
        let keypoints: Vec<Point> = self.keypoints.iter().map(|[x, y]| Point::new(*x, *y)).collect();
        let fingers_up: FingerState = self.fingers_up.map(|f| f != 0);
        let centroid = match self.center {
            Some([x, y]) => Point::new(x, y),
            None => bounding_box_center(&keypoints),
        };
        HandPose { keypoints, fingers_up, centroid }
    }
}

fn bounding_box_center(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

/// Hand landmark helper running as a child process.
pub struct LandmarkServer {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    frame_path: PathBuf,
    command: String,
}

impl LandmarkServer {
    /// `command_line` is split on whitespace: program first, then arguments.
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().context("Empty landmark helper command")?;
        info!(command = command_line, "launching hand landmark helper");

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // helper logs go straight to the terminal
            .spawn()
            .with_context(|| format!("Failed to spawn landmark helper `{}`", command_line))?;

        let stdin = child.stdin.take().context("Failed to open stdin to landmark helper")?;
        let stdout = child.stdout.take().context("Failed to open stdout from landmark helper")?;

        Ok(Self {
            process: child,
            stdin,
            stdout: BufReader::new(stdout),
            frame_path: std::env::temp_dir().join("gesture_deck_frame.jpg"),
            command: command_line.to_string(),
        })
    }
}

impl HandTracker for LandmarkServer {
    fn name(&self) -> String {
        format!("Landmark helper ({})", self.command)
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandPose>> {
        frame.save(&self.frame_path).context("Failed to save frame for landmark helper")?;

        let image_path = self.frame_path.to_string_lossy();
        let request = LandmarkRequest { image_path: &image_path, max_hands: 1 };
        writeln!(self.stdin, "{}", serde_json::to_string(&request)?)
            .context("Failed to write to landmark helper stdin")?;
        self.stdin.flush()?;

        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).context("Failed to read from landmark helper stdout")?;
        if read == 0 {
            bail!("Landmark helper exited");
        }

        parse_response(&line)
    }
}

impl Drop for LandmarkServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
        debug!("landmark helper stopped");
    }
}

fn parse_response(line: &str) -> Result<Vec<HandPose>> {
    let response: LandmarkResponse =
        serde_json::from_str(line).context("Failed to parse landmark helper response")?;
    if response.status != "success" {
        // The helper keeps serving after a bad frame; treat it as no hand.
        warn!(error = response.error.as_deref().unwrap_or("unknown"), "landmark helper rejected frame");
        return Ok(Vec::new());
    }
    Ok(response.hands.into_iter().take(1).map(WireHand::into_pose).collect())
}

/// Scripted hand for running without a landmark helper.
///
/// Cycles through drawing a circle, pointing, lowering the hand out of view
/// and a pinch in the control strip, so every path of the presentation loop
/// gets exercised.
pub struct SimulatedTracker {
    frame_count: u32,
}

impl SimulatedTracker {
    const PHASE_FRAMES: u32 = 90;

    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for SimulatedTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A plausible 21-point hand whose index fingertip sits at `index_tip`.
pub fn scripted_pose(centroid: Point, index_tip: Point, fingers_up: FingerState) -> HandPose {
    let mut keypoints: Vec<Point> = (0..landmark::COUNT)
        .map(|i| {
            let finger = (i.saturating_sub(1) / 4) as f32;
            let joint = ((i + 3) % 4) as f32;
            Point::new(centroid.x - 60.0 + finger * 30.0, centroid.y + 40.0 - joint * 25.0)
        })
        .collect();
    keypoints[landmark::INDEX_TIP] = index_tip;
    HandPose { keypoints, fingers_up, centroid }
}

impl HandTracker for SimulatedTracker {
    fn name(&self) -> String {
        "Simulated hand".to_string()
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandPose>> {
        self.frame_count += 1;
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let phase = (self.frame_count / Self::PHASE_FRAMES) % 4;
        let t = (self.frame_count % Self::PHASE_FRAMES) as f32 / Self::PHASE_FRAMES as f32;
        let angle = t * std::f32::consts::TAU;

        let tip = Point::new(w * 0.75 + angle.cos() * w * 0.1, h * 0.5 + angle.sin() * h * 0.12);
        let low = Point::new(tip.x, h * 0.75);

        let pose = match phase {
            0 => scripted_pose(low, tip, [false, true, false, false, false]),
            1 => scripted_pose(low, tip, [false, true, true, false, false]),
            2 => return Ok(Vec::new()),
            _ => {
                // Thumb meets middle finger above the zone line: next slide.
                let high = Point::new(w * 0.75, h * 0.2);
                let mut pose = scripted_pose(high, Point::new(high.x + 120.0, high.y - 80.0), [true; 5]);
                let thumb = pose.keypoints[landmark::THUMB_TIP];
                pose.keypoints[landmark::MIDDLE_TIP] = Point::new(thumb.x + 5.0, thumb.y);
                pose
            }
        };
        Ok(vec![pose])
    }
}
