use image::{imageops, imageops::FilterType, Rgb, RgbImage};

use crate::config::{parse_hex, UiConfig};
use crate::draw::{draw_disc, draw_hline, draw_line};
use crate::font;
use crate::types::{HandPose, Point, Stroke};

pub const ZONE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const STATUS_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const HAND_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const BONE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const POINTER_RADIUS: i32 = 10;
const CURSOR_RADIUS: i32 = 5;
const ZONE_THICKNESS: u32 = 5;

/// Keypoint pairs joined when drawing the hand skeleton on the camera view.
const BONES: [(usize, usize); 20] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
];

/// Draws annotations, markers and the webcam inset onto slide frames.
#[derive(Debug, Clone)]
pub struct Compositor {
    stroke_color: Rgb<u8>,
    stroke_thickness: u32,
    pointer_color: Rgb<u8>,
    thumbnail: (u32, u32),
    status_scale: u32,
}

impl Compositor {
    pub fn new(ui: &UiConfig) -> Self {
        let (r, g, b) = parse_hex(&ui.stroke_color_hex);
        let (pr, pg, pb) = parse_hex(&ui.pointer_color_hex);
        Self {
            stroke_color: Rgb([r, g, b]),
            stroke_thickness: ui.stroke_thickness.max(1),
            pointer_color: Rgb([pr, pg, pb]),
            thumbnail: (ui.thumbnail_width, ui.thumbnail_height),
            status_scale: ui.status_scale.max(1),
        }
    }

    pub fn stroke_color(&self) -> Rgb<u8> {
        self.stroke_color
    }

    pub fn draw_strokes(&self, slide: &mut RgbImage, strokes: &[Stroke]) {
        for stroke in strokes {
            for segment in stroke.windows(2) {
                draw_line(slide, segment[0], segment[1], self.stroke_thickness, self.stroke_color);
            }
        }
    }

    pub fn draw_pointer(&self, slide: &mut RgbImage, at: Point) {
        draw_disc(slide, at.x.round() as i32, at.y.round() as i32, POINTER_RADIUS, self.pointer_color);
    }

    /// Small dot under the fingertip while a stroke is being drawn.
    pub fn draw_cursor(&self, slide: &mut RgbImage, at: Point) {
        draw_disc(slide, at.x.round() as i32, at.y.round() as i32, CURSOR_RADIUS, self.stroke_color);
    }

    pub fn draw_status(&self, slide: &mut RgbImage, text: &str) {
        font::draw_text(slide, 10, 10, text, STATUS_COLOR, self.status_scale);
    }

    /// Pastes a scaled copy of the camera view into the top-right corner.
    pub fn inset_thumbnail(&self, slide: &mut RgbImage, camera: &RgbImage) {
        let (tw, th) = self.thumbnail;
        if tw == 0 || th == 0 || tw > slide.width() || th > slide.height() {
            return;
        }
        let small = imageops::resize(camera, tw, th, FilterType::Triangle);
        let x = (slide.width() - tw) as i64;
        imageops::replace(slide, &small, x, 0);
    }
}

/// Marks the control-strip boundary on the camera view.
pub fn draw_zone_line(camera: &mut RgbImage, y: f32) {
    draw_hline(camera, y.round() as i32, ZONE_THICKNESS, ZONE_COLOR);
}

/// Hand skeleton and keypoints on the camera view.
pub fn draw_hand(camera: &mut RgbImage, hand: &HandPose) {
    for (a, b) in BONES {
        if let (Some(p), Some(q)) = (hand.keypoint(a), hand.keypoint(b)) {
            draw_line(camera, p, q, 2, BONE_COLOR);
        }
    }
    for p in &hand.keypoints {
        draw_disc(camera, p.x.round() as i32, p.y.round() as i32, 4, HAND_COLOR);
    }
}
