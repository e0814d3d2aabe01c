use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// Directory of slide1.png, slide2.png, ... (overrides config)
    #[arg(long)]
    pub slides: Option<PathBuf>,

    /// Configuration file, created with defaults if missing
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Hand landmark helper command line
    #[arg(long, default_value = "python3 scripts/hand_server.py")]
    pub tracker: String,

    /// Drive the presentation with a scripted hand instead of the helper
    #[arg(long)]
    pub simulate: bool,

    /// Do not mirror the camera image
    #[arg(long, default_value_t = false)]
    pub no_mirror: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}
