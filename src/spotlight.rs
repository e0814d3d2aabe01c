use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::draw::draw_disc;

pub const MIN_RADIUS: u32 = 50;
pub const MAX_RADIUS: u32 = 400;
pub const RADIUS_STEP: u32 = 20;
pub const MIN_DIM: f32 = 0.3;
pub const MAX_DIM: f32 = 0.95;
pub const DIM_STEP: f32 = 0.1;

/// Gaussian sigma matching a 51x51 kernel with automatic sigma.
const MASK_BLUR_SIGMA: f32 = 8.0;
const MARKER_RADIUS: i32 = 5;
const MARKER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightSettings {
    pub radius: u32,
    pub dim_opacity: f32,
    pub hardware_dim: bool,
    /// Display brightness requested while the spotlight is on, 0..1.
    pub dimmed_brightness: f32,
    pub brightness_command: String,
}

impl Default for SpotlightSettings {
    fn default() -> Self {
        Self {
            radius: 150,
            dim_opacity: 0.7,
            hardware_dim: true,
            dimmed_brightness: 0.3,
            brightness_command: "brightness".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BrightnessError {
    #[error("hardware brightness control is not available on this platform")]
    Unavailable,
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: ExitStatus },
    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("could not find a brightness level in the output of `{0}`")]
    Parse(String),
}

/// Host display brightness, 0..1.
pub trait BrightnessControl {
    fn read(&mut self) -> Result<f32, BrightnessError>;
    fn write(&mut self, level: f32) -> Result<(), BrightnessError>;
}

/// Used where the host exposes no brightness control.
#[derive(Debug, Default)]
pub struct NoBrightness;

impl BrightnessControl for NoBrightness {
    fn read(&mut self) -> Result<f32, BrightnessError> {
        Err(BrightnessError::Unavailable)
    }

    fn write(&mut self, _level: f32) -> Result<(), BrightnessError> {
        Err(BrightnessError::Unavailable)
    }
}

/// Drives the macOS `brightness` command line tool.
pub struct BrightnessCli {
    program: String,
}

impl BrightnessCli {
    pub fn new(program: &str) -> Self {
        Self { program: program.to_string() }
    }

    /// The control available on this host, or [`NoBrightness`].
    pub fn for_host(program: &str) -> Box<dyn BrightnessControl> {
        if cfg!(target_os = "macos") {
            Box::new(Self::new(program))
        } else {
            Box::new(NoBrightness)
        }
    }

    fn run(&self, args: &[&str], timeout: Duration) -> Result<String, BrightnessError> {
        let command = format!("{} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BrightnessError::Spawn { command: command.clone(), source })?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BrightnessError::Timeout { command, timeout });
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                Err(source) => return Err(BrightnessError::Spawn { command, source }),
            }
        };

        if !status.success() {
            return Err(BrightnessError::Failed { command, status });
        }

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout
                .read_to_string(&mut output)
                .map_err(|source| BrightnessError::Spawn { command, source })?;
        }
        Ok(output)
    }
}

impl BrightnessControl for BrightnessCli {
    fn read(&mut self) -> Result<f32, BrightnessError> {
        let listing = self.run(&["-l"], READ_TIMEOUT)?;
        parse_brightness_listing(&listing).ok_or_else(|| BrightnessError::Parse(format!("{} -l", self.program)))
    }

    fn write(&mut self, level: f32) -> Result<(), BrightnessError> {
        let level = format!("{:.2}", level.clamp(0.0, 1.0));
        self.run(&[&level], WRITE_TIMEOUT).map(|_| ())
    }
}

/// Pulls the first `brightness <level>` value out of `brightness -l` output.
pub fn parse_brightness_listing(listing: &str) -> Option<f32> {
    listing.lines().find_map(|line| {
        let rest = line.split("brightness").nth(1)?;
        let level: f32 = rest.split_whitespace().next()?.parse().ok()?;
        Some(level.clamp(0.0, 1.0))
    })
}

/// Soft-edged disc mask: 255 inside the spotlight, falling off to 0 outside.
pub fn spotlight_mask(width: u32, height: u32, cx: i32, cy: i32, radius: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_disc(&mut mask, cx, cy, radius as i32, Luma([255]));
    imageops::blur(&mask, MASK_BLUR_SIGMA)
}

/// Dims everything outside a movable circle, optionally dimming the display too.
///
/// Every hardware brightness call is best-effort. The first failure switches
/// the hardware channel off for the rest of the session; the on-screen overlay
/// never depends on it.
pub struct SpotlightEngine {
    active: bool,
    radius: u32,
    dim_opacity: f32,
    hardware_dim: bool,
    dimmed_brightness: f32,
    saved_brightness: f32,
    control: Box<dyn BrightnessControl>,
}

impl SpotlightEngine {
    pub fn new(settings: &SpotlightSettings, control: Box<dyn BrightnessControl>) -> Self {
        let mut engine = Self {
            active: false,
            radius: settings.radius.clamp(MIN_RADIUS, MAX_RADIUS),
            dim_opacity: settings.dim_opacity.clamp(MIN_DIM, MAX_DIM),
            hardware_dim: settings.hardware_dim,
            dimmed_brightness: settings.dimmed_brightness.clamp(0.0, 1.0),
            saved_brightness: 1.0,
            control,
        };
        if let Some(level) = engine.hardware(|c| c.read()) {
            engine.saved_brightness = level;
            info!(brightness = level, "hardware brightness control available");
        }
        engine
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn dim_opacity(&self) -> f32 {
        self.dim_opacity
    }

    pub fn hardware_dim(&self) -> bool {
        self.hardware_dim
    }

    pub fn saved_brightness(&self) -> f32 {
        self.saved_brightness
    }

    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if self.active {
            info!("spotlight on");
            self.dim_display();
        } else {
            info!("spotlight off");
            self.restore_display();
        }
        self.active
    }

    pub fn toggle_hardware(&mut self) -> bool {
        if self.hardware_dim {
            if self.active {
                self.restore_display();
            }
            self.hardware_dim = false;
        } else {
            self.hardware_dim = true;
            if self.active {
                self.dim_display();
            }
        }
        info!(enabled = self.hardware_dim, "hardware brightness toggled");
        self.hardware_dim
    }

    pub fn increase_radius(&mut self) -> u32 {
        self.set_radius(self.radius.saturating_add(RADIUS_STEP))
    }

    pub fn decrease_radius(&mut self) -> u32 {
        self.set_radius(self.radius.saturating_sub(RADIUS_STEP))
    }

    pub fn set_radius(&mut self, radius: u32) -> u32 {
        self.radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
        info!(radius = self.radius, "spotlight radius");
        self.radius
    }

    /// Darker background.
    pub fn increase_dim(&mut self) -> f32 {
        self.set_dim_opacity(self.dim_opacity + DIM_STEP)
    }

    /// Lighter background.
    pub fn decrease_dim(&mut self) -> f32 {
        self.set_dim_opacity(self.dim_opacity - DIM_STEP)
    }

    pub fn set_dim_opacity(&mut self, opacity: f32) -> f32 {
        self.dim_opacity = opacity.clamp(MIN_DIM, MAX_DIM);
        info!("spotlight dim opacity {:.1}", self.dim_opacity);
        self.dim_opacity
    }

    /// Keeps the whole disc on a `width` x `height` canvas.
    pub fn constrain_center(&self, x: f32, y: f32, width: u32, height: u32) -> (i32, i32) {
        let clamp_axis = |v: f32, extent: u32| -> i32 {
            let r = self.radius as i32;
            let extent = extent as i32;
            if extent < 2 * r {
                extent / 2
            } else {
                (v.round() as i32).clamp(r, extent - r)
            }
        };
        (clamp_axis(x, width), clamp_axis(y, height))
    }

    /// Returns `image` dimmed outside the spotlight, or an untouched copy when off.
    pub fn compute_overlay(&self, image: &RgbImage, cx: i32, cy: i32) -> RgbImage {
        if !self.active {
            return image.clone();
        }

        let mask = spotlight_mask(image.width(), image.height(), cx, cy, self.radius);
        let keep = 1.0 - self.dim_opacity;
        let mut result = image.clone();
        for (pixel, m) in result.pixels_mut().zip(mask.pixels()) {
            let m = m[0] as f32 / 255.0;
            for channel in pixel.0.iter_mut() {
                let v = *channel as f32;
                // Black contributes nothing, so only the kept fraction of v remains outside.
                let out = v * m + v * (1.0 - m) * keep;
                *channel = out.round().clamp(0.0, 255.0) as u8;
            }
        }

        draw_disc(&mut result, cx, cy, MARKER_RADIUS, MARKER_COLOR);
        result
    }

    /// Puts the display back if the session ends with the spotlight on.
    pub fn cleanup(&mut self) {
        if self.active {
            self.restore_display();
            self.active = false;
            if self.hardware_dim {
                info!("brightness restored");
            }
        }
    }

    fn dim_display(&mut self) {
        if let Some(level) = self.hardware(|c| c.read()) {
            self.saved_brightness = level;
            let dimmed = self.dimmed_brightness;
            self.hardware(|c| c.write(dimmed));
        }
    }

    fn restore_display(&mut self) {
        let saved = self.saved_brightness;
        self.hardware(|c| c.write(saved));
    }

    fn hardware<T>(&mut self, op: impl FnOnce(&mut dyn BrightnessControl) -> Result<T, BrightnessError>) -> Option<T> {
        if !self.hardware_dim {
            return None;
        }
        match op(self.control.as_mut()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "hardware brightness disabled for this session");
                self.hardware_dim = false;
                None
            }
        }
    }
}

impl Drop for SpotlightEngine {
    fn drop(&mut self) {
        debug!("spotlight engine dropped");
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every level written; reads return the current level.
    #[derive(Clone)]
    struct FakeDisplay {
        level: Rc<RefCell<f32>>,
        writes: Rc<RefCell<Vec<f32>>>,
        fail_writes: bool,
    }

    impl FakeDisplay {
        fn new(level: f32) -> Self {
            Self {
                level: Rc::new(RefCell::new(level)),
                writes: Rc::new(RefCell::new(Vec::new())),
                fail_writes: false,
            }
        }
    }

    impl BrightnessControl for FakeDisplay {
        fn read(&mut self) -> Result<f32, BrightnessError> {
            Ok(*self.level.borrow())
        }

        fn write(&mut self, level: f32) -> Result<(), BrightnessError> {
            if self.fail_writes {
                return Err(BrightnessError::Unavailable);
            }
            *self.level.borrow_mut() = level;
            self.writes.borrow_mut().push(level);
            Ok(())
        }
    }

    fn engine_with(display: &FakeDisplay) -> SpotlightEngine {
        SpotlightEngine::new(&SpotlightSettings::default(), Box::new(display.clone()))
    }

    fn gray_slide() -> RgbImage {
        RgbImage::from_pixel(960, 540, Rgb([200, 100, 50]))
    }

    #[test]
    fn test_inactive_overlay_is_identity() {
        let engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(NoBrightness));
        let slide = gray_slide();
        assert_eq!(engine.compute_overlay(&slide, 480, 270), slide);
    }

    #[test]
    fn test_active_overlay_dims_outside_only() {
        let mut engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(NoBrightness));
        engine.toggle();
        let slide = gray_slide();
        let out = engine.compute_overlay(&slide, 480, 270);

        // Inside the disc, away from the marker and the soft edge.
        let inside = out.get_pixel(480 + 40, 270);
        for (o, i) in inside.0.iter().zip(slide.get_pixel(480 + 40, 270).0.iter()) {
            assert!((*o as i32 - *i as i32).abs() <= 2, "inside pixel changed: {:?}", inside);
        }

        // Far outside: only 30% of the input survives.
        let far = out.get_pixel(5, 5);
        assert!((far[0] as i32 - 60).abs() <= 2, "far pixel {:?}", far);
        assert!((far[1] as i32 - 30).abs() <= 2, "far pixel {:?}", far);
        assert!((far[2] as i32 - 15).abs() <= 2, "far pixel {:?}", far);

        assert_eq!(*out.get_pixel(480, 270), MARKER_COLOR);
    }

    #[test]
    fn test_mask_is_soft_at_edge() {
        let mask = spotlight_mask(400, 400, 200, 200, 100);
        assert!(mask.get_pixel(200, 200)[0] >= 253);
        assert!(mask.get_pixel(2, 2)[0] <= 2);
        let edge = mask.get_pixel(300, 200)[0];
        assert!(edge > 40 && edge < 215, "edge value {}", edge);
    }

    #[test]
    fn test_radius_and_dim_bounds() {
        let mut engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(NoBrightness));
        for _ in 0..50 {
            engine.increase_radius();
            engine.increase_dim();
            assert!(engine.radius() <= MAX_RADIUS);
            assert!(engine.dim_opacity() <= MAX_DIM);
        }
        assert_eq!(engine.radius(), MAX_RADIUS);
        for _ in 0..50 {
            engine.decrease_radius();
            engine.decrease_dim();
            assert!(engine.radius() >= MIN_RADIUS);
            assert!(engine.dim_opacity() >= MIN_DIM);
        }
        assert_eq!(engine.radius(), MIN_RADIUS);
    }

    #[test]
    fn test_settings_are_clamped() {
        let settings = SpotlightSettings { radius: 5, dim_opacity: 2.0, ..SpotlightSettings::default() };
        let engine = SpotlightEngine::new(&settings, Box::new(NoBrightness));
        assert_eq!(engine.radius(), MIN_RADIUS);
        assert_eq!(engine.dim_opacity(), MAX_DIM);
    }

    #[test]
    fn test_unavailable_hardware_is_disabled() {
        let mut engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(NoBrightness));
        assert!(!engine.hardware_dim());
        assert!(engine.toggle());
        assert!(engine.is_active());
    }

    #[test]
    fn test_toggle_dims_and_restores() {
        let display = FakeDisplay::new(0.8);
        let mut engine = engine_with(&display);
        assert!(engine.hardware_dim());

        engine.toggle();
        assert_eq!(*display.level.borrow(), 0.3);
        assert_eq!(engine.saved_brightness(), 0.8);

        engine.toggle();
        assert_eq!(*display.level.borrow(), 0.8);
        assert_eq!(*display.writes.borrow(), vec![0.3, 0.8]);
    }

    #[test]
    fn test_cleanup_restores_when_active() {
        let display = FakeDisplay::new(0.6);
        let mut engine = engine_with(&display);
        engine.toggle();
        engine.cleanup();
        assert!(!engine.is_active());
        assert_eq!(*display.level.borrow(), 0.6);

        drop(engine);
        assert_eq!(display.writes.borrow().len(), 2);
    }

    #[test]
    fn test_drop_restores_brightness() {
        let display = FakeDisplay::new(0.9);
        {
            let mut engine = engine_with(&display);
            engine.toggle();
        }
        assert_eq!(*display.level.borrow(), 0.9);
    }

    #[test]
    fn test_disabling_hardware_while_active_restores() {
        let display = FakeDisplay::new(0.7);
        let mut engine = engine_with(&display);
        engine.toggle();
        assert!(!engine.toggle_hardware());
        assert_eq!(*display.level.borrow(), 0.7);
        engine.toggle();
        assert_eq!(display.writes.borrow().len(), 2);
    }

    #[test]
    fn test_write_failure_disables_hardware() {
        let mut display = FakeDisplay::new(0.7);
        display.fail_writes = true;
        let mut engine = engine_with(&display);
        assert!(engine.hardware_dim());
        engine.toggle();
        assert!(engine.is_active());
        assert!(!engine.hardware_dim());
    }

    #[test]
    fn test_constrain_center() {
        let engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(NoBrightness));
        assert_eq!(engine.constrain_center(0.0, 0.0, 960, 540), (150, 150));
        assert_eq!(engine.constrain_center(960.0, 540.0, 960, 540), (810, 390));
        assert_eq!(engine.constrain_center(500.0, 300.0, 960, 540), (500, 300));
        assert_eq!(engine.constrain_center(10.0, 10.0, 200, 200), (100, 100));
    }

    #[test]
    fn test_parse_brightness_listing() {
        let listing = "display 0: main, active, awake, online, built-in, ID 0x4280a80\n\
                       display 0: brightness 0.562500\n";
        assert_eq!(parse_brightness_listing(listing), Some(0.5625));
        assert_eq!(parse_brightness_listing("no displays"), None);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut cli = BrightnessCli::new("definitely-not-a-brightness-tool");
        assert!(matches!(cli.read(), Err(BrightnessError::Spawn { .. })));
    }

    #[cfg(unix)]
    fn brightness_script(name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = std::env::temp_dir().join(format!("gesture_deck_{}_{}.sh", name, std::process::id()));
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_read_times_out_and_disables_hardware() {
        let script = brightness_script("hang", "exec sleep 10");
        let program = script.to_string_lossy().into_owned();

        let started = Instant::now();
        let result = BrightnessCli::new(&program).read();
        let elapsed = started.elapsed();
        assert!(
            matches!(result, Err(BrightnessError::Timeout { timeout, .. }) if timeout == READ_TIMEOUT),
            "{:?}",
            result
        );
        assert!(elapsed >= READ_TIMEOUT && elapsed < READ_TIMEOUT + Duration::from_secs(3), "{:?}", elapsed);

        let mut engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(BrightnessCli::new(&program)));
        assert!(!engine.hardware_dim());
        assert!(engine.toggle());
        assert!(engine.is_active());
        let _ = std::fs::remove_file(&script);
    }

    #[cfg(unix)]
    #[test]
    fn test_hanging_write_disables_hardware_but_spotlight_stays_on() {
        let script = brightness_script(
            "slow_write",
            r#"if [ "$1" = "-l" ]; then echo "display 0: brightness 0.500000"; else exec sleep 10; fi"#,
        );
        let program = script.to_string_lossy().into_owned();

        let mut engine = SpotlightEngine::new(&SpotlightSettings::default(), Box::new(BrightnessCli::new(&program)));
        assert!(engine.hardware_dim());
        assert_eq!(engine.saved_brightness(), 0.5);

        let started = Instant::now();
        assert!(engine.toggle());
        assert!(started.elapsed() < WRITE_TIMEOUT + Duration::from_secs(3));
        assert!(engine.is_active());
        assert!(!engine.hardware_dim());
        let _ = std::fs::remove_file(&script);
    }
}
