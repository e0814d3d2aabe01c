//! Renders one slide to a PNG, optionally under the spotlight overlay, for
//! tuning radius and opacity without a camera.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use gesture_deck::compositor::Compositor;
use gesture_deck::config::AppConfig;
use gesture_deck::deck::SlideDeck;
use gesture_deck::spotlight::{NoBrightness, SpotlightEngine, SpotlightSettings};

#[derive(Parser, Debug)]
#[command(about = "Render a slide with the spotlight overlay")]
struct Args {
    /// Slide number in deck order, starting at 1
    #[arg(long, default_value_t = 1)]
    slide: usize,

    /// Spotlight centre on the slide canvas, e.g. 480,270
    #[arg(long, value_parser = parse_center)]
    spotlight: Option<(f32, f32)>,

    #[arg(long)]
    radius: Option<u32>,

    #[arg(long)]
    dim: Option<f32>,

    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[arg(long, default_value = "slide_preview.png")]
    out: PathBuf,
}

fn parse_center(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    let deck = SlideDeck::load(std::path::Path::new(&config.slides.dir))?;
    let index = args.slide.checked_sub(1).context("Slides are numbered from 1")?;
    let mut slide = deck.image(index, config.slides.width, config.slides.height)?;

    if let Some((x, y)) = args.spotlight {
        let settings = SpotlightSettings {
            radius: args.radius.unwrap_or(config.spotlight.radius),
            dim_opacity: args.dim.unwrap_or(config.spotlight.dim_opacity),
            hardware_dim: false,
            ..config.spotlight.clone()
        };
        let mut engine = SpotlightEngine::new(&settings, Box::new(NoBrightness));
        engine.toggle();
        let (cx, cy) = engine.constrain_center(x, y, slide.width(), slide.height());
        slide = engine.compute_overlay(&slide, cx, cy);
        Compositor::new(&config.ui).draw_status(&mut slide, "SPOTLIGHT MODE");
        println!("Spotlight at ({}, {}) radius {} dim {:.2}", cx, cy, engine.radius(), engine.dim_opacity());
    }

    slide.save(&args.out).with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Saved {}", args.out.display());
    Ok(())
}
