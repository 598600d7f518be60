//! Stereo reverb for the shared effects bus (realtime-safe after construction).
//!
//! Design
//! - Simple “Schroeder-ish” structure: 2 short all-passes → 4 LP-combs per side in
//!   parallel → 2 all-passes per side.
//! - The right tank uses slightly longer lines than the left for stereo width.
//! - Comb feedback is derived from the requested decay time (RT60), so the tail length
//!   stays the same at any sample rate.
//! - Delay lines live on the heap and are sized in `reset`; `process` never allocates.
//!
//! Output is **wet only**; the soundscape applies the return gain.

use resonance_core::dsp::kill_denormals;
use resonance_core::filters::OnePoleLP;

use crate::config::ReverbParams;
use crate::delay::DelayLine;

/// Line lengths at 48 kHz.
const PRE_AP: [f32; 2] = [641.0, 997.0];
const COMBS: [f32; 4] = [7789.0, 8513.0, 9449.0, 10867.0];
const POST_AP: [f32; 2] = [579.0, 773.0];
/// Extra samples (at 48 kHz) on every right-channel line.
const STEREO_SPREAD: f32 = 37.0;

/// Canonical “feedforward + feedback” all-pass with a single delay.
#[derive(Clone, Debug)]
struct Allpass {
    d: DelayLine,
    g: f32,
}
impl Allpass {
    fn new(g: f32) -> Self { Self { d: DelayLine::new(1), g: g.clamp(-0.999, 0.999) } }
    fn set_len(&mut self, len: usize) { self.d.set_len(len); }
    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let z = self.d.read();
        let y = z - self.g * x;
        self.d.write_advance(x + self.g * y);
        kill_denormals(y)
    }
}

/// Feedback comb with an LP filter inside the feedback path (HF damping).
#[derive(Clone, Debug)]
struct CombLp {
    d: DelayLine,
    fb: f32,
    lp: OnePoleLP,
}
impl CombLp {
    fn new(sr: f32) -> Self { Self { d: DelayLine::new(1), fb: 0.7, lp: OnePoleLP::new(6000.0, sr) } }
    fn configure(&mut self, len: usize, fb: f32, damp_hz: f32, sr: f32) {
        self.d.set_len(len);
        self.fb = fb.clamp(0.0, 0.98);
        self.lp.set_sample_rate(sr);
        self.lp.set_cutoff_hz(damp_hz);
        self.lp.reset();
    }
    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let z = self.d.read();
        let z_damped = self.lp.process(z);
        self.d.write_advance(kill_denormals(x + self.fb * z_damped));
        z
    }
}

#[derive(Clone, Debug)]
struct Tank {
    combs: [CombLp; 4],
    post: [Allpass; 2],
}

impl Tank {
    fn new(sr: f32) -> Self {
        Self {
            combs: [CombLp::new(sr), CombLp::new(sr), CombLp::new(sr), CombLp::new(sr)],
            post: [Allpass::new(0.65), Allpass::new(0.61)],
        }
    }

    fn configure(&mut self, spread: f32, params: &ReverbParams, sr: f32) {
        let scale = sr / 48_000.0;
        for (c, &len) in self.combs.iter_mut().zip(COMBS.iter()) {
            let n = ((len + spread) * scale).max(1.0);
            c.configure(n as usize, rt60_feedback(n / sr, params.decay_s), params.damp_hz, sr);
        }
        for (a, &len) in self.post.iter_mut().zip(POST_AP.iter()) {
            a.set_len(((len + spread) * scale).max(1.0) as usize);
        }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let sum = 0.25 * self.combs.iter_mut().map(|c| c.process(x)).sum::<f32>();
        let a = self.post[0].process(sum);
        self.post[1].process(a)
    }
}

/// Feedback gain giving a 60 dB decay after `rt60_s` for a loop of `loop_s` seconds.
#[inline]
fn rt60_feedback(loop_s: f32, rt60_s: f32) -> f32 {
    if !(rt60_s > 0.0) { return 0.0; }
    // 10^(-3 * loop / rt60)
    (-6.907_755 * loop_s / rt60_s).exp()
}

/// Stereo wet-only reverb.
#[derive(Clone, Debug)]
pub struct Reverb {
    sr: f32,
    params: ReverbParams,
    pre: [Allpass; 2],
    left: Tank,
    right: Tank,
}

impl Reverb {
    pub fn new(params: ReverbParams, sr: f32) -> Self {
        let mut s = Self {
            sr,
            params,
            pre: [Allpass::new(0.72), Allpass::new(0.70)],
            left: Tank::new(sr),
            right: Tank::new(sr),
        };
        s.reset(sr);
        s
    }

    /// Re-size every line for `sr` and clear the tail.
    pub fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        let scale = self.sr / 48_000.0;
        for (a, &len) in self.pre.iter_mut().zip(PRE_AP.iter()) {
            a.set_len((len * scale).max(1.0) as usize);
        }
        self.left.configure(0.0, &self.params, self.sr);
        self.right.configure(STEREO_SPREAD, &self.params, self.sr);
    }

    #[inline] pub fn params(&self) -> &ReverbParams { &self.params }

    /// Process one stereo frame; returns the wet `(left, right)` signal.
    #[inline]
    pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
        let x = 0.5 * (l + r);
        let a = self.pre[0].process(x);
        let diffused = self.pre[1].process(a);
        (self.left.process(diffused), self.right.process(diffused))
    }
}
