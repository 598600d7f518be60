//! Session lifecycle: the audio engine a host UI talks to.
//!
//! ```text
//!   new() ──► Suspended ──resume()──► Running
//!                 ▲                      │
//!                 └──────suspend()───────┘
//!   dispose() from any state ──► Closed (idempotent)
//! ```
//!
//! The graph lives behind `Arc<Mutex<_>>` so a realtime output callback and the control
//! thread can share it. Control calls only touch per-layer state, so they hold the lock
//! for a few instructions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::Engine;
use crate::layers::LayerSnapshot;
use crate::soundscape::Soundscape;

/// Graph handle shared with an output callback.
pub type SharedGraph = Arc<Mutex<Engine<Soundscape>>>;

/// A sink that pulls audio from the shared graph on its own clock.
pub trait OutputDriver {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    Suspended,
    Running,
    Closed,
}

pub struct AudioEngine {
    config: EngineConfig,
    graph: SharedGraph,
    layer_count: usize,
    output: Option<Box<dyn OutputDriver>>,
    state: EngineState,
}

impl core::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("state", &self.state)
            .field("layers", &self.layer_count)
            .field("output", &self.output.as_ref().map(|o| o.describe()))
            .finish()
    }
}

#[inline]
fn lock(graph: &SharedGraph) -> MutexGuard<'_, Engine<Soundscape>> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioEngine {
    /// Build the graph. Construction errors are fatal for the session.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let scape = Soundscape::new(&config)?;
        let layer_count = scape.layer_count();
        let graph = Arc::new(Mutex::new(Engine::new(scape, config.sample_rate)));
        info!("engine: created ({} layers, {} Hz)", layer_count, config.sample_rate);
        Ok(Self { config, graph, layer_count, output: None, state: EngineState::Suspended })
    }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }
    #[inline] pub fn state(&self) -> EngineState { self.state }
    #[inline] pub fn is_running(&self) -> bool { self.state == EngineState::Running }
    #[inline] pub fn layer_count(&self) -> usize { self.layer_count }

    /// Clone of the graph handle for an output driver.
    pub fn graph(&self) -> SharedGraph { Arc::clone(&self.graph) }

    fn ensure_open(&self) -> Result<()> {
        if self.state == EngineState::Closed { Err(EngineError::Closed) } else { Ok(()) }
    }

    /// Attach a realtime sink. If the engine is already running the sink starts at once.
    pub fn attach_output(&mut self, mut driver: Box<dyn OutputDriver>) -> Result<()> {
        self.ensure_open()?;
        if let Some(mut old) = self.output.take() {
            if let Err(e) = old.pause() { warn!("engine: pausing replaced output failed: {e}"); }
        }
        if self.is_running() { driver.play()?; }
        info!("engine: output attached: {}", driver.describe());
        self.output = Some(driver);
        Ok(())
    }

    /// Open the default (or named) device through cpal and attach it.
    #[cfg(feature = "realtime")]
    pub fn open_output(&mut self, opts: &crate::output::OutputOptions) -> Result<crate::output::MeterHandle> {
        self.ensure_open()?;
        let out = crate::output::CpalOutput::open(self.graph(), opts)?;
        let meter = out.meter();
        self.attach_output(Box::new(out))?;
        Ok(meter)
    }

    /// Activate audio. Idempotent while running.
    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            EngineState::Closed => Err(EngineError::Closed),
            EngineState::Running => Ok(()),
            EngineState::Suspended => {
                if let Some(out) = self.output.as_mut() { out.play()?; }
                self.state = EngineState::Running;
                info!("engine: running");
                Ok(())
            }
        }
    }

    /// Pause output without touching layer state.
    pub fn suspend(&mut self) -> Result<()> {
        match self.state {
            EngineState::Closed => Err(EngineError::Closed),
            EngineState::Suspended => Ok(()),
            EngineState::Running => {
                if let Some(out) = self.output.as_mut() { out.pause()?; }
                self.state = EngineState::Suspended;
                info!("engine: suspended");
                Ok(())
            }
        }
    }

    /// Flip layer `index`; returns its new `active` flag.
    pub fn toggle_layer(&self, index: usize) -> Result<bool> {
        self.ensure_open()?;
        lock(&self.graph).generator_mut().toggle(index)
    }

    pub fn start_layer(&self, index: usize) -> Result<bool> {
        self.ensure_open()?;
        lock(&self.graph).generator_mut().start_layer(index)
    }

    pub fn stop_layer(&self, index: usize) -> Result<bool> {
        self.ensure_open()?;
        lock(&self.graph).generator_mut().stop_layer(index)
    }

    pub fn set_master_gain(&self, gain: f32) -> Result<()> {
        self.ensure_open()?;
        lock(&self.graph).generator_mut().set_master_gain(gain);
        Ok(())
    }

    pub fn snapshots(&self) -> Vec<LayerSnapshot> {
        lock(&self.graph).generator().snapshots()
    }

    pub fn layer_states(&self) -> Vec<bool> {
        lock(&self.graph).generator().active_flags()
    }

    pub fn scheduled_events(&self) -> usize {
        lock(&self.graph).generator().scheduled_events()
    }

    pub fn voices(&self) -> usize {
        lock(&self.graph).generator().voices()
    }

    /// Stream time of the graph clock (s).
    pub fn time(&self) -> f64 {
        lock(&self.graph).time()
    }

    /// Pull-render interleaved frames. While suspended the buffer is silent and the
    /// clock does not advance.
    pub fn render_interleaved(&self, out: &mut [f32], channels: usize) -> Result<()> {
        self.ensure_open()?;
        if self.is_running() {
            lock(&self.graph).render_interleaved(out, channels);
        } else {
            out.iter_mut().for_each(|s| *s = 0.0);
        }
        Ok(())
    }

    /// Fade out every active layer, stop the output, then free every voice and cancel
    /// every scheduled event. Safe to call repeatedly and before `resume`.
    ///
    /// A running engine with audible layers blocks the caller for
    /// `dispose_grace_s` so the fade reaches the device. Dropping the engine skips
    /// that wait and cuts the output immediately.
    pub fn dispose(&mut self) { self.shutdown(true); }

    fn shutdown(&mut self, graceful: bool) {
        if self.state == EngineState::Closed { return; }
        let stopped = lock(&self.graph).generator_mut().begin_shutdown();

        if let Some(mut out) = self.output.take() {
            if graceful && self.is_running() && stopped > 0 && self.config.dispose_grace_s > 0.0 {
                debug!("engine: letting {stopped} layer(s) fade for {:.2} s", self.config.dispose_grace_s);
                std::thread::sleep(Duration::from_secs_f32(self.config.dispose_grace_s));
            }
            if let Err(e) = out.pause() { warn!("engine: pausing output on dispose failed: {e}"); }
        }

        lock(&self.graph).generator_mut().release_all();
        self.state = EngineState::Closed;
        info!("engine: disposed{}", if graceful { "" } else { " without fade" });
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) { self.shutdown(false); }
}

/// Per-session holder: `init` creates the engine once; control calls before `init`
/// are no-ops. Dropping a session drops its engine without the fade; call
/// [`Session::dispose`] to let it ring out.
#[derive(Debug, Default)]
pub struct Session {
    engine: Option<AudioEngine>,
    config: EngineConfig,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self { Self { engine: None, config } }

    /// Create and resume the engine on first call; later calls return the same engine.
    pub fn init(&mut self) -> Result<&mut AudioEngine> {
        let engine = match self.engine.take() {
            Some(e) => e,
            None => {
                let mut e = AudioEngine::new(self.config.clone())?;
                e.resume()?;
                e
            }
        };
        Ok(self.engine.insert(engine))
    }

    #[inline] pub fn is_started(&self) -> bool { self.engine.is_some() }
    #[inline] pub fn engine(&self) -> Option<&AudioEngine> { self.engine.as_ref() }
    #[inline] pub fn engine_mut(&mut self) -> Option<&mut AudioEngine> { self.engine.as_mut() }

    /// Flip a layer. `Ok(None)` before `init`.
    pub fn toggle_layer(&mut self, index: usize) -> Result<Option<bool>> {
        match self.engine.as_ref() {
            Some(e) => e.toggle_layer(index).map(Some),
            None => Ok(None),
        }
    }

    /// Active flag per layer; empty before `init`.
    pub fn layer_states(&self) -> Vec<bool> {
        self.engine.as_ref().map(AudioEngine::layer_states).unwrap_or_default()
    }

    pub fn dispose(&mut self) {
        if let Some(mut e) = self.engine.take() { e.dispose(); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct Calls { play: AtomicUsize, pause: AtomicUsize }

    struct FakeOut(Arc<Calls>);
    impl OutputDriver for FakeOut {
        fn play(&mut self) -> Result<()> { self.0.play.fetch_add(1, Ordering::SeqCst); Ok(()) }
        fn pause(&mut self) -> Result<()> { self.0.pause.fetch_add(1, Ordering::SeqCst); Ok(()) }
        fn describe(&self) -> String { "fake".into() }
    }

    fn quick() -> EngineConfig {
        EngineConfig { sample_rate: 8_000.0, dispose_grace_s: 0.0, ..EngineConfig::default() }
    }

    #[test]
    fn resume_is_idempotent_and_drives_output() {
        let calls = Arc::new(Calls::default());
        let mut e = AudioEngine::new(quick()).unwrap();
        e.attach_output(Box::new(FakeOut(calls.clone()))).unwrap();
        e.resume().unwrap();
        e.resume().unwrap();
        assert_eq!(calls.play.load(Ordering::SeqCst), 1);
        e.dispose();
        assert_eq!(calls.pause.load(Ordering::SeqCst), 1);
        assert_eq!(e.state(), EngineState::Closed);
    }

    #[test]
    fn suspended_engine_renders_silence_without_advancing() {
        let e = AudioEngine::new(quick()).unwrap();
        e.toggle_layer(0).unwrap();
        let mut buf = [1.0f32; 64];
        e.render_interleaved(&mut buf, 2).unwrap();
        assert!(buf.iter().all(|&s| s == 0.0));
        assert_eq!(e.time(), 0.0);
    }

    #[test]
    fn closed_engine_rejects_control() {
        let mut e = AudioEngine::new(quick()).unwrap();
        e.dispose();
        e.dispose();
        assert!(matches!(e.toggle_layer(0), Err(EngineError::Closed)));
        assert!(matches!(e.resume(), Err(EngineError::Closed)));
    }

    #[test]
    fn drop_skips_the_fade_wait() {
        let calls = Arc::new(Calls::default());
        let mut e = AudioEngine::new(EngineConfig { dispose_grace_s: 30.0, ..quick() }).unwrap();
        e.attach_output(Box::new(FakeOut(calls.clone()))).unwrap();
        e.resume().unwrap();
        e.toggle_layer(1).unwrap();
        let started = Instant::now();
        drop(e);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(calls.pause.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_guards_calls_before_init() {
        let mut s = Session::new(quick());
        assert_eq!(s.toggle_layer(2).unwrap(), None);
        assert!(s.layer_states().is_empty());
        s.dispose();
        assert!(!s.is_started());
    }

    #[test]
    fn session_init_returns_the_same_engine() {
        let mut s = Session::new(quick());
        s.init().unwrap().toggle_layer(3).unwrap();
        let again = s.init().unwrap();
        assert!(again.is_running());
        assert_eq!(again.layer_states(), vec![false, false, false, true, false]);
    }
}
