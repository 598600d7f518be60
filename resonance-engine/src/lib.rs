//! Resonance Engine: a five-layer generative soundscape on a stereo effects bus.
//!
//! Crate layout:
//! - [`graph`]      : `Generator` trait and the `Engine<G>` sample-clock wrapper
//! - [`nodes`]      : oscillators, modulators, noise sources, panners
//! - [`scheduler`]  : sample-countdown pulses and generation tokens
//! - [`voice`]      : fixed-capacity pool of short enveloped notes
//! - [`layers`]     : drone, pad, arpeggio, wind, chimes and the shared `Layer` lifecycle
//! - [`reverb`], [`delay`], [`dynamics`] : the effects and master chain
//! - [`soundscape`] : the mixed layer graph (implements `Generator`)
//! - [`session`]    : `AudioEngine` / `Session` lifecycle used by hosts
//! - `output`       : cpal driver (feature `realtime`)
//!
//! Nothing in the per-sample path allocates once a layer has been constructed.

pub mod config;
pub mod delay;
pub mod dynamics;
pub mod error;
pub mod graph;
pub mod layers;
pub mod nodes;
pub mod reverb;
pub mod scheduler;
pub mod session;
pub mod soundscape;
pub mod voice;

#[cfg(feature = "realtime")]
pub mod output;

pub use config::{CompressorParams, DelayParams, EngineConfig, ReverbParams};
pub use error::{EngineError, Result};
pub use graph::{Engine, Generator};
pub use layers::{LayerKind, LayerSnapshot, LayerSpec};
pub use session::{AudioEngine, EngineState, OutputDriver, Session, SharedGraph};
pub use soundscape::Soundscape;

#[cfg(feature = "realtime")]
pub use output::{list_output_devices, CpalOutput, MeterHandle, OutputOptions};
