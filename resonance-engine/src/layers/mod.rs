//! Soundscape layers.
//!
//! A [`Layer`] wraps one [`Instrument`] (the sound recipe) with the lifecycle every
//! layer shares:
//!
//! ```text
//!            start(): bump generation, cancel pending release,
//!                     trigger instrument, ramp volume → level
//!   inactive ───────────────────────────────────────────────► active
//!            ◄───────────────────────────────────────────────
//!            stop():  ramp volume → 0, halt sequencing,
//!                     schedule release(token) after the fade
//! ```
//!
//! Both transitions are idempotent. The deferred release only frees voices if its token
//! is still current, so a layer restarted mid-fade is never torn down underneath itself.

mod arp;
mod chime;
mod drone;
mod pad;
mod wind;

pub use arp::Arp;
pub use chime::Chime;
pub use drone::Drone;
pub use pad::Pad;
pub use wind::Wind;

use log::debug;
use resonance_core::envelopes::TargetRamp;

use crate::nodes::AutoPanner;
use crate::scheduler::{Deferred, Generation};

/// Layer archetype.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Drone,
    Pad,
    Arp,
    Wind,
    Chime,
}

impl LayerKind {
    /// Canonical order of the soundscape's layers.
    pub const ALL: [LayerKind; 5] = [Self::Drone, Self::Pad, Self::Arp, Self::Wind, Self::Chime];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drone => "drone",
            Self::Pad => "pad",
            Self::Arp => "arp",
            Self::Wind => "wind",
            Self::Chime => "chime",
        }
    }

    /// Default label, color, levels and timings for this archetype.
    pub fn default_spec(self) -> LayerSpec {
        let (label, color) = match self {
            Self::Drone => ("Sub Current", "#40e0d0"),
            Self::Pad => ("Resonance", "#60a0ff"),
            Self::Arp => ("Pulse Sequence", "#e0a040"),
            Self::Wind => ("Atmosphere", "#e060a0"),
            Self::Chime => ("Shimmer", "#90e870"),
        };
        // level, attack τ, fade τ, release after, dry, fx, pan rate, pan depth
        let (level, attack_s, fade_s, release_after_s, dry_send, fx_send, pan_rate_hz, pan_depth) = match self {
            Self::Drone => (0.35, 1.5, 0.8, 2.0, 1.0, 0.7, 0.013, 0.25),
            Self::Pad => (0.30, 2.0, 1.0, 2.5, 1.0, 1.0, 0.021, 0.5),
            Self::Arp => (0.25, 0.5, 0.4, 1.0, 1.0, 0.9, 0.05, 0.6),
            Self::Wind => (0.12, 2.0, 1.0, 2.5, 1.0, 0.6, 0.031, 0.7),
            Self::Chime => (0.20, 0.8, 0.6, 2.5, 0.9, 1.0, 0.043, 0.8),
        };
        LayerSpec {
            kind: self, label, color, level, attack_s, fade_s, release_after_s,
            dry_send, fx_send, pan_rate_hz, pan_depth,
        }
    }

    /// Build this archetype's instrument.
    pub fn instrument(self, sr: f32, seed: u64) -> Box<dyn Instrument> {
        match self {
            Self::Drone => Box::new(Drone::new(sr, seed)),
            Self::Pad => Box::new(Pad::new(sr)),
            Self::Arp => Box::new(Arp::new(sr)),
            Self::Wind => Box::new(Wind::new(sr, seed)),
            Self::Chime => Box::new(Chime::new(sr, seed)),
        }
    }
}

impl core::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayerSpec {
    pub kind: LayerKind,
    pub label: &'static str,
    /// `#rrggbb`, for the visual layer.
    pub color: &'static str,
    /// Volume reached after `start()`.
    pub level: f32,
    /// Fade-in time constant (s).
    pub attack_s: f32,
    /// Fade-out time constant (s).
    pub fade_s: f32,
    /// Delay between `stop()` and freeing the voices (s).
    pub release_after_s: f32,
    pub dry_send: f32,
    pub fx_send: f32,
    pub pan_rate_hz: f32,
    pub pan_depth: f32,
}

/// Sound recipe driven by a [`Layer`].
pub trait Instrument: Send {
    fn reset(&mut self, sr: f32);
    /// (Re)build voices if needed and arm the sequencer. Notes restart from the top.
    fn trigger(&mut self);
    /// Stop scheduling new events; sounding voices ring on.
    fn halt(&mut self);
    /// Free every voice.
    fn release(&mut self);
    /// Voices currently allocated.
    fn voices(&self) -> usize;
    /// Events armed for the future (sequencer ticks, delayed notes).
    fn scheduled(&self) -> usize;
    /// Next mono sample.
    fn next(&mut self) -> f32;
}

/// Read-only view for a UI.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayerSnapshot {
    pub kind: LayerKind,
    pub label: &'static str,
    pub color: &'static str,
    pub active: bool,
    /// Current smoothed volume.
    pub level: f32,
}

pub struct Layer {
    spec: LayerSpec,
    inst: Box<dyn Instrument>,
    volume: TargetRamp,
    panner: AutoPanner,
    active: bool,
    generation: Generation,
    cleanup: Deferred,
    sr: f32,
}

impl core::fmt::Debug for Layer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &self.spec.kind)
            .field("active", &self.active)
            .field("level", &self.volume.value())
            .field("generation", &self.generation.current())
            .finish()
    }
}

impl Layer {
    /// `pan_phase` offsets the auto-pan sweep in `[0, 1)`.
    pub fn new(spec: LayerSpec, inst: Box<dyn Instrument>, pan_phase: f32, sr: f32) -> Self {
        let sr = sr.max(1.0);
        Self {
            panner: AutoPanner::new(spec.pan_rate_hz, spec.pan_depth, pan_phase),
            spec,
            inst,
            volume: TargetRamp::new(0.0, sr),
            active: false,
            generation: Generation::default(),
            cleanup: Deferred::new(sr),
            sr,
        }
    }

    pub fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.volume.set_sr(self.sr);
        self.cleanup.set_sr(self.sr);
        self.inst.reset(self.sr);
    }

    #[inline] pub fn spec(&self) -> &LayerSpec { &self.spec }
    #[inline] pub fn kind(&self) -> LayerKind { self.spec.kind }
    #[inline] pub fn is_active(&self) -> bool { self.active }
    #[inline] pub fn level(&self) -> f32 { self.volume.value() }
    #[inline] pub fn voices(&self) -> usize { self.inst.voices() }

    /// Future events this layer will still act on (deferred release included).
    pub fn scheduled_events(&self) -> usize {
        usize::from(self.cleanup.is_pending()) + self.inst.scheduled()
    }

    /// Returns `false` if the layer was already active.
    pub fn start(&mut self) -> bool {
        if self.active { return false; }
        self.generation.bump();
        self.cleanup.cancel();
        self.inst.trigger();
        self.volume.set_target(self.spec.level, self.spec.attack_s);
        self.active = true;
        debug!("layer {}: start (gen {})", self.spec.kind, self.generation.current());
        true
    }

    /// Returns `false` if the layer was already inactive.
    pub fn stop(&mut self) -> bool {
        if !self.active { return false; }
        self.volume.set_target(0.0, self.spec.fade_s);
        self.inst.halt();
        let token = self.generation.bump();
        let delay = self.spec.release_after_s.max(self.spec.fade_s);
        self.cleanup.schedule(delay, token);
        self.active = false;
        debug!("layer {}: stop, release in {delay:.2} s (gen {token})", self.spec.kind);
        true
    }

    /// Flip state; returns the new `active` flag.
    pub fn toggle(&mut self) -> bool {
        if self.active { self.stop(); } else { self.start(); }
        self.active
    }

    /// Hard teardown: cancel everything scheduled and free every voice now.
    pub fn shutdown(&mut self) {
        self.generation.bump();
        self.cleanup.cancel();
        self.inst.halt();
        self.inst.release();
        self.volume.jump(0.0);
        self.active = false;
    }

    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            kind: self.spec.kind,
            label: self.spec.label,
            color: self.spec.color,
            active: self.active,
            level: self.volume.value(),
        }
    }

    /// Next panned `(left, right)` frame, pre-send.
    #[inline]
    pub fn process(&mut self) -> (f32, f32) {
        if let Some(token) = self.cleanup.tick() {
            if self.generation.is_current(token) {
                self.inst.release();
                debug!("layer {}: voices released", self.spec.kind);
            }
        }
        let g = self.volume.next();
        if g == 0.0 && self.inst.voices() == 0 {
            return (0.0, 0.0);
        }
        let x = self.inst.next() * g;
        self.panner.process(x, self.sr)
    }
}

/// Build the five default layers at `sr`.
pub fn default_layers(sr: f32, seed: u64) -> Vec<Layer> {
    LayerKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            let phase = i as f32 / LayerKind::ALL.len() as f32;
            Layer::new(kind.default_spec(), kind.instrument(sr, seed.wrapping_add(i as u64)), phase, sr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1_000.0;

    fn run(layer: &mut Layer, secs: f32) -> f32 {
        let mut peak = 0.0f32;
        for _ in 0..(secs * SR) as usize {
            let (l, r) = layer.process();
            peak = peak.max(l.abs()).max(r.abs());
        }
        peak
    }

    fn drone() -> Layer {
        Layer::new(LayerKind::Drone.default_spec(), LayerKind::Drone.instrument(SR, 1), 0.0, SR)
    }

    #[test]
    fn start_is_idempotent() {
        let mut l = drone();
        assert!(l.start());
        let g = l.generation.current();
        assert!(!l.start());
        assert_eq!(l.generation.current(), g);
        assert!(l.is_active());
    }

    #[test]
    fn stop_on_inactive_is_a_noop() {
        let mut l = drone();
        assert!(!l.stop());
        assert_eq!(l.scheduled_events(), 0);
    }

    #[test]
    fn stop_schedules_then_releases_voices() {
        let mut l = drone();
        l.start();
        run(&mut l, 0.5);
        assert!(l.voices() > 0);
        l.stop();
        assert_eq!(l.scheduled_events(), 1);
        run(&mut l, 2.1);
        assert_eq!(l.voices(), 0);
        assert_eq!(l.scheduled_events(), 0);
    }

    #[test]
    fn release_waits_for_a_fade_longer_than_the_delay() {
        let spec = LayerSpec { fade_s: 3.0, release_after_s: 1.0, ..LayerKind::Drone.default_spec() };
        let mut l = Layer::new(spec, LayerKind::Drone.instrument(SR, 1), 0.0, SR);
        l.start();
        run(&mut l, 0.5);
        l.stop();
        run(&mut l, 2.5);
        assert_eq!(l.scheduled_events(), 1, "released before the fade finished");
        assert!(l.voices() > 0);
        run(&mut l, 0.6);
        assert_eq!(l.scheduled_events(), 0);
        assert_eq!(l.voices(), 0);
    }

    #[test]
    fn restart_mid_fade_cancels_the_release() {
        let mut l = drone();
        l.start();
        run(&mut l, 0.5);
        l.stop();
        run(&mut l, 0.5);
        l.start();
        assert_eq!(l.scheduled_events(), 0);
        run(&mut l, 3.0);
        assert!(l.is_active());
        assert!(l.voices() > 0, "restarted layer lost its voices");
    }

    #[test]
    fn volume_ramps_rather_than_jumps() {
        let mut l = drone();
        l.start();
        l.process();
        assert!(l.level() > 0.0 && l.level() < 0.01);
        run(&mut l, 10.0);
        assert!((l.level() - 0.35).abs() < 1e-3);
    }

    #[test]
    fn shutdown_clears_everything() {
        let mut l = Layer::new(LayerKind::Arp.default_spec(), LayerKind::Arp.instrument(SR, 1), 0.0, SR);
        l.start();
        run(&mut l, 1.0);
        l.stop();
        l.shutdown();
        assert_eq!(l.scheduled_events(), 0);
        assert_eq!(l.voices(), 0);
        assert_eq!(l.level(), 0.0);
        assert_eq!(run(&mut l, 1.0), 0.0);
    }

    #[test]
    fn default_layers_are_in_canonical_order() {
        let layers = default_layers(48_000.0, 77);
        let kinds: Vec<_> = layers.iter().map(Layer::kind).collect();
        assert_eq!(kinds, LayerKind::ALL.to_vec());
        assert!(layers.iter().all(|l| !l.is_active()));
        assert_eq!(layers[0].snapshot().label, "Sub Current");
    }
}
