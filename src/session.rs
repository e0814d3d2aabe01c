use anyhow::Result;
use image::RgbImage;
use std::ops::ControlFlow;
use tracing::{debug, info};

use crate::compositor::{draw_hand, draw_zone_line, Compositor};
use crate::config::AppConfig;
use crate::controls::Command;
use crate::debounce::DebounceGate;
use crate::deck::SlideDeck;
use crate::gesture::{classify_frame, GestureConfig};
use crate::presentation::{map_pointer, Effect, PresentationState};
use crate::spotlight::{BrightnessControl, SpotlightEngine};
use crate::types::{Gesture, HandPose, Point};

const SPOTLIGHT_STATUS: &str = "SPOTLIGHT MODE";

/// Outcome of one tick, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// `None` when the debounce gate skipped classification.
    pub gesture: Option<Gesture>,
    pub effect: Effect,
}

/// Everything the presenter loop mutates, advanced one camera frame at a time.
pub struct Session {
    deck: SlideDeck,
    state: PresentationState,
    gate: DebounceGate,
    spotlight: SpotlightEngine,
    compositor: Compositor,
    gestures: GestureConfig,
    slide_size: (u32, u32),
    slide_cache: Option<(usize, RgbImage)>,
    spotlight_center: Option<Point>,
    last_report: TickReport,
}

impl Session {
    pub fn new(config: &AppConfig, deck: SlideDeck, brightness: Box<dyn BrightnessControl>) -> Self {
        let state = PresentationState::new(deck.len());
        Self {
            deck,
            state,
            gate: DebounceGate::new(config.gestures.debounce_ticks),
            spotlight: SpotlightEngine::new(&config.spotlight, brightness),
            compositor: Compositor::new(&config.ui),
            gestures: config.gestures.clone(),
            slide_size: (config.slides.width, config.slides.height),
            slide_cache: None,
            spotlight_center: None,
            last_report: TickReport { gesture: None, effect: Effect::Idle },
        }
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    pub fn spotlight(&self) -> &SpotlightEngine {
        &self.spotlight
    }

    pub fn gate(&self) -> &DebounceGate {
        &self.gate
    }

    pub fn last_report(&self) -> TickReport {
        self.last_report
    }

    /// Runs one frame: classify the hand, update the presentation and render
    /// the slide. `camera` gets the hand skeleton and zone line drawn on it.
    pub fn tick(&mut self, camera: &mut RgbImage, hands: &[HandPose]) -> Result<RgbImage> {
        let frame_size = camera.dimensions();
        let pointer = hands
            .first()
            .and_then(HandPose::index_tip)
            .map(|tip| map_pointer(tip, frame_size, self.slide_size));

        if let Some(p) = pointer {
            self.spotlight_center = Some(p);
        }

        let report = if self.gate.is_pending() {
            TickReport { gesture: None, effect: Effect::Idle }
        } else {
            let gesture = classify_frame(hands, &self.gestures);
            let effect = match pointer {
                Some(p) => self.state.apply_with_spotlight(gesture, p, self.spotlight.is_active()),
                None => {
                    self.state.release();
                    Effect::Idle
                }
            };
            self.dispatch(effect);
            TickReport { gesture: Some(gesture), effect }
        };
        self.gate.tick();
        self.last_report = report;

        if let Some(hand) = hands.first() {
            draw_hand(camera, hand);
        }
        draw_zone_line(camera, self.gestures.zone_threshold_y);

        let mut slide = self.slide_frame()?;
        match report.effect {
            Effect::Pointer(p) if !self.spotlight.is_active() => self.compositor.draw_pointer(&mut slide, p),
            Effect::StrokeExtended => {
                if let Some(p) = pointer {
                    self.compositor.draw_cursor(&mut slide, p);
                }
            }
            _ => {}
        }
        self.compositor.draw_strokes(&mut slide, self.state.strokes());

        if self.spotlight.is_active() {
            if let Some(center) = self.spotlight_center {
                let (cx, cy) = self.spotlight.constrain_center(center.x, center.y, slide.width(), slide.height());
                slide = self.spotlight.compute_overlay(&slide, cx, cy);
            }
            self.compositor.draw_status(&mut slide, SPOTLIGHT_STATUS);
        }

        self.compositor.inset_thumbnail(&mut slide, camera);
        Ok(slide)
    }

    /// Applies a keyboard command. `Break` means the presenter asked to quit.
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        debug!(?command, "keyboard command");
        match command {
            Command::Quit => return ControlFlow::Break(()),
            Command::ToggleSpotlight => {
                self.spotlight.toggle();
            }
            Command::ToggleHardwareDim => {
                self.spotlight.toggle_hardware();
            }
            Command::RadiusUp => {
                self.spotlight.increase_radius();
            }
            Command::RadiusDown => {
                self.spotlight.decrease_radius();
            }
            Command::DimUp => {
                self.spotlight.increase_dim();
            }
            Command::DimDown => {
                self.spotlight.decrease_dim();
            }
        }
        ControlFlow::Continue(())
    }

    /// Restores anything the session changed on the host.
    pub fn finish(&mut self) {
        self.spotlight.cleanup();
    }

    fn dispatch(&mut self, effect: Effect) {
        if effect.arms_gate() {
            self.gate.arm();
        }
        match effect {
            Effect::SlideChanged(index) => {
                info!(slide = index + 1, of = self.deck.len(), "slide changed");
            }
            Effect::StrokeRemoved => {
                debug!(strokes = self.state.strokes().len(), "stroke erased");
            }
            Effect::ToggleSpotlight => {
                self.spotlight.toggle();
            }
            _ => {}
        }
    }

    fn slide_frame(&mut self) -> Result<RgbImage> {
        let index = self.state.slide_index();
        if let Some((cached, img)) = &self.slide_cache {
            if *cached == index {
                return Ok(img.clone());
            }
        }
        let (w, h) = self.slide_size;
        let img = self.deck.image(index, w, h)?;
        self.slide_cache = Some((index, img.clone()));
        Ok(img)
    }
}
