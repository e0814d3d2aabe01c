use crate::types::{Gesture, Point, Stroke};

/// Row range of the camera frame that maps onto the full slide height.
const POINTER_Y_MARGIN: f32 = 150.0;

/// What a tick's gesture did to the presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Idle,
    SlideChanged(usize),
    StrokeExtended,
    StrokeRemoved,
    Pointer(Point),
    ToggleSpotlight,
}

impl Effect {
    /// Discrete effects hold the debounce gate so a held pinch fires once.
    pub fn arms_gate(&self) -> bool {
        matches!(
            self,
            Effect::SlideChanged(_) | Effect::StrokeRemoved | Effect::ToggleSpotlight
        )
    }
}

/// Slide position and the annotations drawn during the current visit.
#[derive(Debug, Clone)]
pub struct PresentationState {
    slide_index: usize,
    slide_count: usize,
    strokes: Vec<Stroke>,
    active_stroke: usize,
    is_drawing: bool,
}

impl PresentationState {
    pub fn new(slide_count: usize) -> Self {
        Self {
            slide_index: 0,
            slide_count: slide_count.max(1),
            strokes: vec![Vec::new()],
            active_stroke: 0,
            is_drawing: false,
        }
    }

    pub fn slide_index(&self) -> usize {
        self.slide_index
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active_stroke(&self) -> usize {
        self.active_stroke
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn apply(&mut self, gesture: Gesture, pointer: Point) -> Effect {
        match gesture {
            Gesture::Next => {
                if self.slide_index + 1 < self.slide_count {
                    self.go_to(self.slide_index + 1)
                } else {
                    Effect::Idle
                }
            }
            Gesture::Previous => {
                if self.slide_index > 0 {
                    self.go_to(self.slide_index - 1)
                } else {
                    Effect::Idle
                }
            }
            Gesture::Draw => {
                if !self.is_drawing {
                    self.is_drawing = true;
                    self.strokes.push(Vec::new());
                    self.active_stroke = self.strokes.len() - 1;
                }
                self.strokes[self.active_stroke].push(pointer);
                Effect::StrokeExtended
            }
            Gesture::Pointer => {
                self.is_drawing = false;
                Effect::Pointer(pointer)
            }
            Gesture::Erase => {
                self.is_drawing = false;
                // The first stroke is the permanent empty tail and is never erased.
                if self.strokes.len() > 1 {
                    self.strokes.pop();
                    self.active_stroke = self.active_stroke.saturating_sub(1).min(self.strokes.len() - 1);
                    Effect::StrokeRemoved
                } else {
                    Effect::Idle
                }
            }
            Gesture::ToggleSpotlight => {
                self.is_drawing = false;
                Effect::ToggleSpotlight
            }
            Gesture::None => {
                self.is_drawing = false;
                Effect::Idle
            }
        }
    }

    /// Like [`apply`](Self::apply), but freehand drawing is frozen while the
    /// spotlight is on. A frozen DRAW leaves an in-progress stroke open.
    pub fn apply_with_spotlight(&mut self, gesture: Gesture, pointer: Point, spotlight_active: bool) -> Effect {
        if spotlight_active && gesture == Gesture::Draw {
            return Effect::Idle;
        }
        self.apply(gesture, pointer)
    }

    /// Stop tracking the current stroke, e.g. when the hand leaves the frame.
    pub fn release(&mut self) {
        self.is_drawing = false;
    }

    fn go_to(&mut self, index: usize) -> Effect {
        self.slide_index = index;
        self.clear_annotations();
        Effect::SlideChanged(index)
    }

    fn clear_annotations(&mut self) {
        self.strokes = vec![Vec::new()];
        self.active_stroke = 0;
        self.is_drawing = false;
    }
}

fn interp_clamped(value: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    let span = from.1 - from.0;
    if span <= 0.0 {
        return to.0;
    }
    let t = ((value - from.0) / span).clamp(0.0, 1.0);
    to.0 + t * (to.1 - to.0)
}

/// Maps a fingertip in camera pixels onto the slide canvas.
///
/// The right half of the frame spans the slide width and rows
/// `150..height-150` span its height; anything outside is clamped to the edge.
pub fn map_pointer(raw: Point, frame_size: (u32, u32), slide_size: (u32, u32)) -> Point {
    let (fw, fh) = (frame_size.0 as f32, frame_size.1 as f32);
    let (sw, sh) = (slide_size.0 as f32, slide_size.1 as f32);
    Point::new(
        interp_clamped(raw.x, (fw / 2.0, fw), (0.0, sw)),
        interp_clamped(raw.y, (POINTER_Y_MARGIN, fh - POINTER_Y_MARGIN), (0.0, sh)),
    )
}
