//! Resonance CLI: realtime player, offline WAV renderer and terrain inspector.

mod cli;

use std::io::BufRead;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use resonance_core::dsp::{lin_to_db, Rms};
use resonance_engine::{list_output_devices, AudioEngine, EngineConfig, OutputOptions};
use resonance_terrain::prelude::{TerrainGrid, TerrainParams};

use cli::{Cli, Command, EngineArgs, PlayArgs, RenderArgs, TerrainArgs};

const RENDER_BLOCK: usize = 1024;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Devices => devices(),
        Command::Play(args) => play(args),
        Command::Render(args) => render(args),
        Command::Terrain(args) => terrain(args),
    }
}

fn engine_config(args: &EngineArgs, sample_rate: f32) -> EngineConfig {
    EngineConfig { sample_rate, master_gain: args.gain, seed: args.seed, ..EngineConfig::default() }
}

fn start_layers(engine: &AudioEngine, layers: &[usize]) -> Result<()> {
    for &i in layers {
        engine.start_layer(i).with_context(|| format!("cannot start layer {i}"))?;
    }
    Ok(())
}

fn describe_layers(engine: &AudioEngine) -> String {
    let names: Vec<&str> = engine.snapshots().iter().filter(|s| s.active).map(|s| s.label).collect();
    if names.is_empty() { "-".into() } else { names.join(", ") }
}

fn devices() -> Result<()> {
    let names = list_output_devices().context("cannot enumerate output devices")?;
    println!("Available output devices:");
    for n in names {
        println!("- {n}");
    }
    Ok(())
}

fn play(args: PlayArgs) -> Result<()> {
    let requested_sr = args.sample_rate.map_or(48_000.0, |sr| sr as f32);
    let mut engine = AudioEngine::new(engine_config(&args.engine, requested_sr))
        .context("engine initialization failed")?;
    let opts = OutputOptions { device: args.device.clone(), sample_rate: args.sample_rate, channels: args.channels };
    let meter = engine.open_output(&opts).context("cannot open audio output")?;
    start_layers(&engine, &args.engine.layers)?;
    engine.resume().context("cannot start audio output")?;

    info!("playing: {}", describe_layers(&engine));
    println!("Type 0-{} + Enter to toggle a layer, `q` to quit.", engine.layer_count() - 1);

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() { break; }
        }
    });

    let started = Instant::now();
    let deadline = args.duration.map(|d| started + Duration::from_secs_f32(d.max(0.0)));
    let mut last_meter = Instant::now();

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) { break; }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                let cmd = line.trim();
                if cmd.eq_ignore_ascii_case("q") { break; }
                match cmd.parse::<usize>() {
                    Ok(i) => match engine.toggle_layer(i) {
                        Ok(active) => info!("layer {i} -> {}", if active { "on" } else { "off" }),
                        Err(e) => warn!("{e}"),
                    },
                    Err(_) if cmd.is_empty() => {}
                    Err(_) => warn!("unknown command `{cmd}`"),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            // stdin closed; keep playing until the deadline or Ctrl+C.
            Err(mpsc::RecvTimeoutError::Disconnected) => std::thread::sleep(Duration::from_millis(100)),
        }

        if last_meter.elapsed() >= Duration::from_secs(1) {
            last_meter = Instant::now();
            let peak = meter.take();
            info!("[meter] peak {:.3} ({:.1} dBFS) | {}", peak, lin_to_db(peak), describe_layers(&engine));
        }
    }

    engine.dispose();
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("render length must be positive, got {}", args.seconds);
    }
    let mut engine = AudioEngine::new(engine_config(&args.engine, args.sample_rate as f32))
        .context("engine initialization failed")?;
    start_layers(&engine, &args.engine.layers)?;
    engine.resume()?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.out, spec)
        .with_context(|| format!("cannot create {}", args.out.display()))?;

    let total = (args.seconds * args.sample_rate as f32).round() as usize;
    let mut buf = vec![0.0f32; RENDER_BLOCK * 2];
    let mut rms = Rms::new(1.0 / args.sample_rate as f32);
    let mut peak = 0.0f32;
    let mut done = 0usize;

    info!("rendering {:.1} s of [{}] to {}", args.seconds, describe_layers(&engine), args.out.display());
    while done < total {
        let frames = (total - done).min(RENDER_BLOCK);
        let block = &mut buf[..frames * 2];
        engine.render_interleaved(block, 2)?;
        for frame in block.chunks_exact(2) {
            let mid = 0.5 * (frame[0] + frame[1]);
            rms.tick(mid);
            peak = peak.max(frame[0].abs()).max(frame[1].abs());
            writer.write_sample(frame[0])?;
            writer.write_sample(frame[1])?;
        }
        done += frames;
    }
    writer.finalize().context("cannot finalize WAV file")?;
    engine.dispose();

    info!(
        "wrote {} frames | peak {:.1} dBFS | rms {:.1} dBFS",
        total,
        lin_to_db(peak),
        lin_to_db(rms.value())
    );
    Ok(())
}

fn terrain(args: TerrainArgs) -> Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        bail!("fps must be positive, got {}", args.fps);
    }
    let params = TerrainParams { seed: args.seed, segments: args.segments, size: args.size, ..TerrainParams::default() };
    let mut grid = TerrainGrid::new(params);
    info!(
        "terrain: {} vertices, {} triangles, seed {}",
        grid.vertex_count(),
        grid.triangle_count(),
        args.seed
    );

    let delta = 1.0 / args.fps;
    let started = Instant::now();
    for _ in 0..args.frames {
        grid.tick(delta);
        grid.mark_uploaded();
    }
    let elapsed = started.elapsed();

    let (lo, hi) = grid.height_range();
    let per_frame_ms = if args.frames > 0 { elapsed.as_secs_f64() * 1e3 / f64::from(args.frames) } else { 0.0 };
    info!(
        "terrain: {} frames in {:.2?} ({:.3} ms/frame) | t={:.4} | height {:.3}..{:.3} (mesh y {:+.1}) | revision {}",
        args.frames,
        elapsed,
        per_frame_ms,
        grid.time(),
        lo,
        hi,
        grid.translation()[1],
        grid.revision()
    );
    Ok(())
}
