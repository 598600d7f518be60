#![cfg_attr(not(feature = "std"), no_std)]
//! Resonance Core: no_std-ready DSP primitives with optional fast-math hooks.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use `libm`/`micromath` math backends
//! - `fast-math`: enable approximations (polys/rationals) for tanh/trig, etc.
//!
//! Modules
//! - [`dsp`]       : math backend, utils (db/lin, time constants, fast trig, meters)
//! - [`envelopes`] : target ramps, exponential ADSR, attack/hold/release note envelopes
//! - [`filters`]   : one-pole LP/HP/DC blocker, TPT SVF
//!
//! Design
//! - No heap allocations; pure sample-by-sample primitives
//! - Clear separation between math helpers and filter/envelope building blocks

pub mod dsp;
pub mod envelopes;
pub mod filters;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        cents_to_ratio, clamp, db_to_lin, finite_or, kill_denormals, lerp, lin_to_db,
        one_pole_coeff_hz, one_pole_coeff_ms, secs_to_samples, tau_coeff, tpt_g,
        Rms, SILENCE, TAU,
    };
    pub use crate::envelopes::{AdsrExp, AhrExp, TargetRamp};
    pub use crate::filters::{DcBlock, OnePoleHP, OnePoleLP, SvfMode, SvfTpt};
}
