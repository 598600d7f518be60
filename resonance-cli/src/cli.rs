//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "resonance", version)]
#[command(about = "Generative ambient soundscape player and terrain inspector", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List output devices on the default host
    Devices,
    /// Play through an output device. Type a layer number + Enter to toggle it, `q` to quit
    Play(PlayArgs),
    /// Render to a 32-bit float WAV file
    Render(RenderArgs),
    /// Animate the terrain headless and report mesh statistics
    Terrain(TerrainArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Layers active at start (0 drone, 1 pad, 2 arp, 3 wind, 4 chime), comma separated
    #[arg(long, value_delimiter = ',', value_name = "INDEX")]
    pub layers: Vec<usize>,

    /// Master gain before the compressor
    #[arg(long, value_name = "GAIN", default_value_t = 0.7)]
    pub gain: f32,

    /// Seed for every random source in the graph
    #[arg(long, default_value_t = 77)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output device name (see `devices`)
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    #[arg(long)]
    pub channels: Option<u16>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output WAV path
    #[arg(short, long, default_value = "resonance.wav")]
    pub out: PathBuf,

    #[arg(long, value_name = "SECONDS", default_value_t = 30.0)]
    pub seconds: f32,

    #[arg(long, value_name = "HZ", default_value_t = 48_000)]
    pub sample_rate: u32,
}

#[derive(Args, Debug)]
pub struct TerrainArgs {
    #[arg(long, default_value_t = 77)]
    pub seed: u32,

    /// Grid subdivisions per side
    #[arg(long, default_value_t = 128)]
    pub segments: u32,

    /// Side length in world units
    #[arg(long, default_value_t = 40.0)]
    pub size: f64,

    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Simulated frame rate
    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,
}
