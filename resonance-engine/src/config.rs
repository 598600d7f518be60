//! Engine configuration.
//!
//! Every struct carries documented units and defaults; `validate()` rejects values
//! that would put NaN or runaway feedback into the graph.

use crate::error::{EngineError, Result};

/// Reverb on the shared effects bus.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReverbParams {
    /// Time for the tail to fall by 60 dB (s).
    pub decay_s: f32,
    /// Low-pass cutoff inside the comb loops (Hz).
    pub damp_hz: f32,
    /// Linear gain of the reverb return into the master stage.
    pub return_gain: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self { decay_s: 3.0, damp_hz: 6_000.0, return_gain: 0.3 }
    }
}

/// Stereo feedback delay on the shared effects bus.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DelayParams {
    pub time_left_s: f32,
    pub time_right_s: f32,
    /// Loop gain, `[0, 0.95]`.
    pub feedback: f32,
    /// Low-pass cutoff inside the loop (Hz).
    pub damp_hz: f32,
    pub return_gain: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self { time_left_s: 0.45, time_right_s: 0.6, feedback: 0.35, damp_hz: 3_000.0, return_gain: 0.18 }
    }
}

/// Master bus compressor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub makeup_db: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self { threshold_db: -24.0, knee_db: 12.0, ratio: 4.0, attack_ms: 3.0, release_ms: 250.0, makeup_db: 0.0 }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Rate the graph is built at; a realtime device may override it.
    pub sample_rate: f32,
    /// Linear master gain.
    pub master_gain: f32,
    /// Seed for every random source (noise, chime timing).
    pub seed: u64,
    /// How long `dispose` lets fades ring out when a live output is attached (s).
    pub dispose_grace_s: f32,
    /// Output ceiling of the final limiter (linear).
    pub limiter_ceiling: f32,
    pub reverb: ReverbParams,
    pub delay: DelayParams,
    pub compressor: CompressorParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            master_gain: 0.7,
            seed: 77,
            dispose_grace_s: 1.0,
            limiter_ceiling: 0.98,
            reverb: ReverbParams::default(),
            delay: DelayParams::default(),
            compressor: CompressorParams::default(),
        }
    }
}

fn check(ok: bool, what: impl FnOnce() -> String) -> Result<()> {
    if ok { Ok(()) } else { Err(EngineError::InvalidConfig(what())) }
}

impl ReverbParams {
    pub fn validate(&self) -> Result<()> {
        check(self.decay_s.is_finite() && self.decay_s > 0.0 && self.decay_s <= 30.0,
            || format!("reverb decay {} s must be in (0, 30]", self.decay_s))?;
        check(self.damp_hz.is_finite() && self.damp_hz > 0.0,
            || format!("reverb damping {} Hz must be positive", self.damp_hz))?;
        check(self.return_gain.is_finite() && self.return_gain >= 0.0,
            || format!("reverb return {} must be >= 0", self.return_gain))
    }
}

impl DelayParams {
    pub fn validate(&self) -> Result<()> {
        for t in [self.time_left_s, self.time_right_s] {
            check(t.is_finite() && t > 0.0 && t <= 5.0, || format!("delay time {t} s must be in (0, 5]"))?;
        }
        check(self.feedback.is_finite() && (0.0..=0.95).contains(&self.feedback),
            || format!("delay feedback {} must be in [0, 0.95]", self.feedback))?;
        check(self.damp_hz.is_finite() && self.damp_hz > 0.0,
            || format!("delay damping {} Hz must be positive", self.damp_hz))?;
        check(self.return_gain.is_finite() && self.return_gain >= 0.0,
            || format!("delay return {} must be >= 0", self.return_gain))
    }
}

impl CompressorParams {
    pub fn validate(&self) -> Result<()> {
        check(self.threshold_db.is_finite() && self.threshold_db <= 0.0,
            || format!("threshold {} dB must be <= 0", self.threshold_db))?;
        check(self.knee_db.is_finite() && self.knee_db >= 0.0,
            || format!("knee {} dB must be >= 0", self.knee_db))?;
        check(self.ratio.is_finite() && self.ratio >= 1.0,
            || format!("ratio {} must be >= 1", self.ratio))?;
        check(self.attack_ms.is_finite() && self.attack_ms >= 0.0 && self.release_ms.is_finite() && self.release_ms >= 0.0,
            || "attack/release must be >= 0 ms".to_string())?;
        check(self.makeup_db.is_finite(), || "makeup gain must be finite".to_string())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        check(self.sample_rate.is_finite() && (8_000.0..=384_000.0).contains(&self.sample_rate),
            || format!("sample rate {} Hz out of range", self.sample_rate))?;
        check(self.master_gain.is_finite() && (0.0..=2.0).contains(&self.master_gain),
            || format!("master gain {} must be in [0, 2]", self.master_gain))?;
        check(self.dispose_grace_s.is_finite() && self.dispose_grace_s >= 0.0,
            || format!("dispose grace {} s must be >= 0", self.dispose_grace_s))?;
        check(self.limiter_ceiling.is_finite() && self.limiter_ceiling > 0.0 && self.limiter_ceiling <= 1.0,
            || format!("limiter ceiling {} must be in (0, 1]", self.limiter_ceiling))?;
        self.reverb.validate()?;
        self.delay.validate()?;
        self.compressor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_runaway_feedback_and_nan() {
        let mut c = EngineConfig::default();
        c.delay.feedback = 1.2;
        assert!(matches!(c.validate(), Err(EngineError::InvalidConfig(_))));

        let mut c = EngineConfig::default();
        c.master_gain = f32::NAN;
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.sample_rate = 0.0;
        assert!(c.validate().is_err());
    }
}
