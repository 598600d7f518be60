//! cpal output driver: device selection, config negotiation, and the stream callback
//! that pulls frames from the shared graph.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info};

use crate::error::{EngineError, Result};
use crate::session::{OutputDriver, SharedGraph};

/// Device request; every field falls back to the host default.
#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Peak level written by the audio thread, drained by whoever logs it.
#[derive(Debug, Default)]
pub struct PeakMeter(AtomicU32);

impl PeakMeter {
    #[inline]
    fn push(&self, peak: f32) {
        let _ = self.0.fetch_max(peak.to_bits(), Ordering::Relaxed);
    }

    /// Highest absolute sample since the last call.
    pub fn take(&self) -> f32 {
        f32::from_bits(self.0.swap(0, Ordering::Relaxed))
    }
}

pub type MeterHandle = Arc<PeakMeter>;

/// Names of every output device on the default host.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(cfg_err)?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = name {
        let devices = host.output_devices().map_err(cfg_err)?;
        for d in devices {
            if d.name().map(|n| n == name).unwrap_or(false) { return Ok(d); }
        }
        return Err(EngineError::DeviceNotFound(name.to_string()));
    }
    host.default_output_device().ok_or(EngineError::NoOutputDevice)
}

fn cfg_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::DeviceConfig(e.to_string())
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig> {
    if req_sr.is_none() && req_ch.is_none() {
        return device.default_output_config().map_err(cfg_err);
    }

    // Score ranges: sample-rate distance dominates channel distance.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs().map_err(cfg_err)? {
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;
        let ch_pen = req_ch.map_or(0, |c| u64::from(range.channels().abs_diff(c)));
        let sr_pen = match req_sr {
            Some(sr) if (sr_min..=sr_max).contains(&sr) => 0,
            Some(sr) => u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))),
            None => 0,
        };
        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| EngineError::DeviceConfig("no supported output configs".into()))?;
    let sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };
    Ok(range.with_sample_rate(sr))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    graph: SharedGraph,
    meter: MeterHandle,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels.max(1));
    let mut scratch: Vec<f32> = Vec::with_capacity(4096 * channels);

    device
        .build_output_stream(
            cfg,
            move |output: &mut [T], _| {
                scratch.resize(output.len(), 0.0);
                graph
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .render_interleaved(&mut scratch, channels);

                let mut peak = 0.0f32;
                for (dst, &s) in output.iter_mut().zip(scratch.iter()) {
                    peak = peak.max(s.abs());
                    *dst = T::from_sample(s);
                }
                meter.push(peak);
            },
            |e| error!("output: stream error: {e}"),
            None,
        )
        .map_err(|e| EngineError::BuildStream(e.to_string()))
}

/// A live cpal stream pulling from the shared graph.
pub struct CpalOutput {
    stream: cpal::Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
    meter: MeterHandle,
}

impl CpalOutput {
    /// Open the device and build a paused stream. The graph is switched to the device
    /// rate before the first callback.
    pub fn open(graph: SharedGraph, opts: &OutputOptions) -> Result<Self> {
        let device = pick_device(opts.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let supported = choose_config(&device, opts.sample_rate, opts.channels)?;
        let format = supported.sample_format();
        let mut cfg = supported.config();
        if let Some(ch) = opts.channels { cfg.channels = ch; }

        graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_sample_rate(cfg.sample_rate.0 as f32);

        let meter = MeterHandle::default();
        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, graph, meter.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, graph, meter.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, graph, meter.clone())?,
            other => return Err(EngineError::UnsupportedFormat(format!("{other:?}"))),
        };
        // Some hosts start streams on creation.
        if let Err(e) = stream.pause() { debug!("output: initial pause not supported: {e}"); }

        info!("output: {device_name} @ {} Hz x{} ({format:?})", cfg.sample_rate.0, cfg.channels);
        Ok(Self { stream, device_name, sample_rate: cfg.sample_rate.0, channels: cfg.channels, meter })
    }

    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }
    #[inline] pub fn channels(&self) -> u16 { self.channels }
    #[inline] pub fn device_name(&self) -> &str { &self.device_name }
    pub fn meter(&self) -> MeterHandle { Arc::clone(&self.meter) }
}

impl OutputDriver for CpalOutput {
    fn play(&mut self) -> Result<()> {
        self.stream.play().map_err(|e| EngineError::PlayStream(e.to_string()))
    }

    fn pause(&mut self) -> Result<()> {
        self.stream.pause().map_err(|e| EngineError::PlayStream(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("{} @ {} Hz x{}", self.device_name, self.sample_rate, self.channels)
    }
}
