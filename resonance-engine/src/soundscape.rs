//! The soundscape: five layers over a fixed bus graph.
//!
//! ```text
//! layer ─ volume ─ auto-pan ─┬─ dry send ──────────────► dry bus ─┐
//!                            └─ fx send ─► fx bus ─┬─ reverb ─ ×return ─┤
//!                                                  └─ delay  ─ ×return ─┤
//!                                       master gain ◄───────────────────┘
//!                                            └─ DC block ─ compressor ─ limiter ─► out
//! ```
//!
//! The graph is wired once in [`Soundscape::new`]; afterwards only per-layer state
//! changes. Implements [`Generator`] so it can sit inside an [`Engine`](crate::graph::Engine).

use log::{debug, info};
use resonance_core::envelopes::TargetRamp;
use resonance_core::filters::DcBlock;

use crate::config::EngineConfig;
use crate::delay::StereoDelay;
use crate::dynamics::{Compressor, Limiter};
use crate::error::{EngineError, Result};
use crate::graph::Generator;
use crate::layers::{default_layers, Layer, LayerSnapshot};
use crate::nodes::Mix2;
use crate::reverb::Reverb;

/// Master gain ramp time constant (s).
const MASTER_TAU_S: f32 = 0.05;
const DC_CUT_HZ: f32 = 15.0;
const LIMITER_RELEASE_MS: f32 = 80.0;

pub struct Soundscape {
    sr: f32,
    layers: Vec<Layer>,
    reverb: Reverb,
    delay: StereoDelay,
    fx_return: Mix2,
    master: TargetRamp,
    dc_l: DcBlock,
    dc_r: DcBlock,
    comp: Compressor,
    limiter: Limiter,
}

impl core::fmt::Debug for Soundscape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Soundscape")
            .field("sr", &self.sr)
            .field("layers", &self.layers)
            .field("master", &self.master.value())
            .finish()
    }
}

impl Soundscape {
    /// Build the default five-layer graph from a validated config.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let sr = config.sample_rate;
        let layers = default_layers(sr, config.seed);
        info!("soundscape: {} layers at {} Hz", layers.len(), sr);
        Ok(Self::with_layers(config, layers))
    }

    /// Build the graph around an explicit layer list.
    pub fn with_layers(config: &EngineConfig, layers: Vec<Layer>) -> Self {
        let sr = config.sample_rate.max(1.0);
        Self {
            sr,
            layers,
            reverb: Reverb::new(config.reverb, sr),
            delay: StereoDelay::new(config.delay, sr),
            fx_return: Mix2::new(config.reverb.return_gain, config.delay.return_gain),
            master: TargetRamp::new(config.master_gain, sr),
            dc_l: DcBlock::new(DC_CUT_HZ, sr),
            dc_r: DcBlock::new(DC_CUT_HZ, sr),
            comp: Compressor::new(config.compressor, sr),
            limiter: Limiter::new(config.limiter_ceiling, LIMITER_RELEASE_MS, sr),
        }
    }

    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }
    #[inline] pub fn layer_count(&self) -> usize { self.layers.len() }
    #[inline] pub fn layers(&self) -> &[Layer] { &self.layers }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let count = self.layers.len();
        self.layers.get_mut(index).ok_or(EngineError::LayerOutOfRange { index, count })
    }

    /// Flip layer `index`; returns its new `active` flag.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let layer = self.layer_mut(index)?;
        let active = layer.toggle();
        debug!("soundscape: layer {index} ({}) -> {}", layer.kind(), if active { "on" } else { "off" });
        Ok(active)
    }

    /// Returns `false` if the layer was already active.
    pub fn start_layer(&mut self, index: usize) -> Result<bool> {
        Ok(self.layer_mut(index)?.start())
    }

    /// Returns `false` if the layer was already inactive.
    pub fn stop_layer(&mut self, index: usize) -> Result<bool> {
        Ok(self.layer_mut(index)?.stop())
    }

    pub fn snapshots(&self) -> Vec<LayerSnapshot> {
        self.layers.iter().map(Layer::snapshot).collect()
    }

    pub fn active_flags(&self) -> Vec<bool> {
        self.layers.iter().map(Layer::is_active).collect()
    }

    /// Ramp the master gain (linear) over a short time constant.
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master.set_target(gain.clamp(0.0, 2.0), MASTER_TAU_S);
    }

    #[inline] pub fn master_gain(&self) -> f32 { self.master.target() }

    /// Current compressor gain reduction (dB, ≤ 0).
    #[inline] pub fn reduction_db(&self) -> f32 { self.comp.reduction_db() }

    /// Gracefully stop every active layer; returns how many were stopped.
    pub fn begin_shutdown(&mut self) -> usize {
        self.layers.iter_mut().filter(|l| l.is_active()).map(|l| l.stop()).filter(|&s| s).count()
    }

    /// Free every voice, cancel every scheduled event and clear the effect tails.
    pub fn release_all(&mut self) {
        for l in &mut self.layers { l.shutdown(); }
        self.reverb.reset(self.sr);
        self.delay.clear();
        self.dc_l.reset();
        self.dc_r.reset();
        self.comp.reset();
        self.limiter.reset();
    }

    /// Events still armed across all layers (sequencer ticks, deferred releases, echoes).
    pub fn scheduled_events(&self) -> usize {
        self.layers.iter().map(Layer::scheduled_events).sum()
    }

    /// Voices currently allocated across all layers.
    pub fn voices(&self) -> usize {
        self.layers.iter().map(Layer::voices).sum()
    }
}

impl Generator for Soundscape {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        for l in &mut self.layers { l.reset(self.sr); }
        self.reverb.reset(self.sr);
        self.delay.reset(self.sr);
        self.master.set_sr(self.sr);
        self.dc_l.set_sample_rate(self.sr);
        self.dc_r.set_sample_rate(self.sr);
        self.comp.set_sr(self.sr);
        self.limiter.set_sr(self.sr);
    }

    #[inline]
    fn next(&mut self) -> (f32, f32) {
        let (mut dry_l, mut dry_r, mut fx_l, mut fx_r) = (0.0, 0.0, 0.0, 0.0);
        for layer in &mut self.layers {
            let (l, r) = layer.process();
            let s = layer.spec();
            dry_l += l * s.dry_send;
            dry_r += r * s.dry_send;
            fx_l += l * s.fx_send;
            fx_r += r * s.fx_send;
        }

        let (rv_l, rv_r) = self.reverb.process(fx_l, fx_r);
        let (dl_l, dl_r) = self.delay.process(fx_l, fx_r);

        let g = self.master.next();
        let l = g * (dry_l + self.fx_return.run(rv_l, dl_l));
        let r = g * (dry_r + self.fx_return.run(rv_r, dl_r));

        let (l, r) = self.comp.process(self.dc_l.process(l), self.dc_r.process(r));
        self.limiter.process(l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonance_core::dsp::Rms;

    fn scape() -> Soundscape {
        Soundscape::new(&EngineConfig { sample_rate: 16_000.0, ..EngineConfig::default() }).unwrap()
    }

    fn render(s: &mut Soundscape, secs: f32) -> (f32, f32) {
        let mut rms = Rms::new(0.001);
        let mut peak = 0.0f32;
        for _ in 0..(secs * s.sample_rate()) as usize {
            let (l, r) = s.next();
            assert!(l.is_finite() && r.is_finite());
            peak = peak.max(l.abs()).max(r.abs());
            rms.tick(0.5 * (l + r));
        }
        (peak, rms.value())
    }

    #[test]
    fn silent_when_nothing_is_active() {
        let mut s = scape();
        let (peak, _) = render(&mut s, 0.5);
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn every_layer_sounds_and_stays_under_the_ceiling() {
        for i in 0..5 {
            let mut s = scape();
            assert!(s.toggle(i).unwrap());
            let (peak, rms) = render(&mut s, 4.0);
            assert!(peak <= 0.98 + 1e-6, "layer {i} peak={peak}");
            assert!(rms > 1e-4, "layer {i} is silent");
        }
    }

    #[test]
    fn all_layers_together_are_limited() {
        let mut s = scape();
        for i in 0..5 { s.toggle(i).unwrap(); }
        let (peak, _) = render(&mut s, 5.0);
        assert!(peak <= 0.98 + 1e-6, "peak={peak}");
    }

    #[test]
    fn toggle_reports_bad_index() {
        let mut s = scape();
        assert!(matches!(s.toggle(5), Err(EngineError::LayerOutOfRange { index: 5, count: 5 })));
        assert_eq!(s.active_flags(), vec![false; 5]);
    }

    #[test]
    fn shutdown_fades_then_release_clears() {
        let mut s = scape();
        s.toggle(2).unwrap();
        s.toggle(4).unwrap();
        render(&mut s, 1.0);
        assert_eq!(s.begin_shutdown(), 2);
        assert!(s.active_flags().iter().all(|a| !a));
        assert!(s.scheduled_events() > 0);
        s.release_all();
        assert_eq!(s.scheduled_events(), 0);
        assert_eq!(s.voices(), 0);
        let (peak, _) = render(&mut s, 0.5);
        assert_eq!(peak, 0.0);
    }

    #[test]
    fn snapshots_mirror_state() {
        let mut s = scape();
        s.toggle(1).unwrap();
        let snaps = s.snapshots();
        assert_eq!(snaps.len(), 5);
        assert!(snaps[1].active);
        assert_eq!(snaps[1].label, "Resonance");
        assert_eq!(snaps[1].color, "#60a0ff");
        assert!(snaps.iter().enumerate().all(|(i, s)| s.active == (i == 1)));
    }
}
