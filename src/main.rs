use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::ops::ControlFlow;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod args;

use args::Args;
use gesture_deck::camera::{list_cameras, CameraSource, FrameSource};
use gesture_deck::config::AppConfig;
use gesture_deck::controls::HELP;
use gesture_deck::deck::SlideDeck;
use gesture_deck::output::WindowOutput;
use gesture_deck::session::Session;
use gesture_deck::spotlight::BrightnessCli;
use gesture_deck::tracker::{HandTracker, LandmarkServer, SimulatedTracker};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.list {
        return list_cameras();
    }

    // 0. Load Config
    let mut config = AppConfig::load(&args.config)?;
    if let Some(dir) = &args.slides {
        config.slides.dir = dir.to_string_lossy().into_owned();
    }
    let mirror = config.capture.mirror && !args.no_mirror;

    // 1. Slides: nothing to present without them
    let deck = SlideDeck::load(std::path::Path::new(&config.slides.dir))
        .with_context(|| format!("Cannot load slides from {}", config.slides.dir))?;

    // 2. Setup Camera
    let mut camera = CameraSource::new(args.cam_index, config.capture.width, config.capture.height)?;

    // 3. Setup Hand Tracking
    let mut tracker: Box<dyn HandTracker> = if args.simulate {
        Box::new(SimulatedTracker::new())
    } else {
        Box::new(LandmarkServer::new(&args.tracker)?)
    };
    info!(tracker = %tracker.name(), "hand tracking ready");

    // 4. Setup Output
    let mut slides_window = WindowOutput::new("Slides", config.slides.width as usize, config.slides.height as usize)?;
    let mut camera_window = WindowOutput::new("Image", camera.width() as usize, camera.height() as usize)?;

    let brightness = BrightnessCli::for_host(&config.spotlight.brightness_command);
    let mut session = Session::new(&config, deck, brightness);

    print_controls();

    let result = run(&mut session, &mut camera, tracker.as_mut(), &mut slides_window, &mut camera_window, mirror);
    session.finish();
    result
}

fn run(
    session: &mut Session,
    camera: &mut dyn FrameSource,
    tracker: &mut dyn HandTracker,
    slides_window: &mut WindowOutput,
    camera_window: &mut WindowOutput,
    mirror: bool,
) -> Result<()> {
    while slides_window.is_open() && camera_window.is_open() {
        let Some(mut frame) = camera.read() else {
            warn!("no frame from camera, ending presentation");
            break;
        };
        if mirror {
            image::imageops::flip_horizontal_in_place(&mut frame);
        }

        let hands = tracker.detect(&frame)?;
        let slide = session.tick(&mut frame, &hands)?;

        slides_window.show(&slide)?;
        camera_window.show(&frame)?;

        let commands = slides_window
            .pressed_commands()
            .into_iter()
            .chain(camera_window.pressed_commands());
        for command in commands {
            if let ControlFlow::Break(()) = session.handle(command) {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn print_controls() {
    println!();
    println!("{}", "=== PRESENTER CONTROLS ===".bold());
    for (input, action) in HELP {
        println!("  {:<26} {}", input.cyan(), action);
    }
    println!("{}", "==========================".bold());
    println!();
}
