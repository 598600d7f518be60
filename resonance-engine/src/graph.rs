//! Realtime synthesis graph core.
//!
//! This module defines the minimal `Generator` trait and a lightweight `Engine<G>`
//! wrapper that owns a generator (the soundscape), tracks sample rate and the sample
//! clock, and produces one **stereo** frame at a time with zero heap work per sample.
//!
//! Design goals
//! - No dynamic allocations in the audio thread
//! - SR changes handled lazily (if the host reconfigures), with cheap branching
//! - Generic over the generator type, so graphs can be swapped without trait objects

/// Anything that can generate one stereo frame at a time.
pub trait Generator {
    /// Called when the engine is (re)initialized or when the sample rate changes.
    fn reset(&mut self, sr: f32);

    /// Generate the next `(left, right)` frame. Implementations should assume the
    /// sample rate has been communicated via `reset`.
    fn next(&mut self) -> (f32, f32);
}

/// Lightweight realtime engine that owns a generator.
///
/// The audio callback should call `next(sr)` for every output frame. If the
/// `sr` reported by the host changes, the engine will call `reset(sr)` on the
/// inner generator once and continue.
pub struct Engine<G: Generator> {
    sr: f32,
    frames: u64,
    gen: G,
}

impl<G: Generator> Engine<G> {
    /// Construct with an already-configured generator. We immediately `reset`
    /// the generator to communicate the sample rate.
    #[inline]
    pub fn new(mut gen: G, sr: f32) -> Self {
        let sr = if sr.is_finite() && sr >= 1.0 { sr } else { 48_000.0 };
        gen.reset(sr);
        Self { sr, frames: 0, gen }
    }

    /// Produce **one** stereo frame at the given sample rate.
    #[inline]
    pub fn next(&mut self, sr: f32) -> (f32, f32) {
        if sr != self.sr && sr >= 1.0 {
            self.sr = sr;
            self.gen.reset(sr);
        }
        self.frames = self.frames.wrapping_add(1);
        self.gen.next()
    }

    /// Reset the generator for `sr` now, outside the audio callback.
    pub fn set_sample_rate(&mut self, sr: f32) {
        if sr >= 1.0 && sr != self.sr {
            self.sr = sr;
            self.gen.reset(sr);
        }
    }

    /// Fill an interleaved buffer with `channels` channels.
    ///
    /// Channel 0/1 get left/right; extra channels get the mid signal. A mono target
    /// receives the mid signal only.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let ch = channels.max(1);
        let sr = self.sr;
        for frame in out.chunks_mut(ch) {
            let (l, r) = self.next(sr);
            let mid = 0.5 * (l + r);
            match frame.len() {
                1 => frame[0] = mid,
                _ => {
                    frame[0] = l;
                    frame[1] = r;
                    for s in frame.iter_mut().skip(2) { *s = mid; }
                }
            }
        }
    }

    /// Return the engine’s current sample rate.
    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }

    /// Frames produced since this engine was created.
    #[inline] pub fn frames(&self) -> u64 { self.frames }

    /// Elapsed stream time in seconds.
    #[inline] pub fn time(&self) -> f64 { self.frames as f64 / f64::from(self.sr) }

    #[inline] pub fn generator(&self) -> &G { &self.gen }

    /// Get a mutable reference to the inner generator for live control.
    #[inline] pub fn generator_mut(&mut self) -> &mut G { &mut self.gen }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp { sr: f32, resets: u32, n: f32 }
    impl Generator for Ramp {
        fn reset(&mut self, sr: f32) { self.sr = sr; self.resets += 1; }
        fn next(&mut self) -> (f32, f32) { self.n += 1.0; (self.n, -self.n) }
    }

    #[test]
    fn resets_once_per_rate_change() {
        let mut e = Engine::new(Ramp { sr: 0.0, resets: 0, n: 0.0 }, 48_000.0);
        assert_eq!(e.generator().resets, 1);
        e.next(48_000.0);
        e.next(44_100.0);
        e.next(44_100.0);
        assert_eq!(e.generator().resets, 2);
        assert_eq!(e.generator().sr, 44_100.0);
        assert_eq!(e.frames(), 3);
    }

    #[test]
    fn interleaves_stereo_and_mono() {
        let mut e = Engine::new(Ramp { sr: 0.0, resets: 0, n: 0.0 }, 48_000.0);
        let mut st = [0.0f32; 6];
        e.render_interleaved(&mut st, 2);
        assert_eq!(st, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);

        let mut quad = [9.0f32; 4];
        e.render_interleaved(&mut quad, 4);
        assert_eq!(quad, [4.0, -4.0, 0.0, 0.0]);

        let mut mono = [9.0f32; 2];
        e.render_interleaved(&mut mono, 1);
        assert_eq!(mono, [0.0, 0.0]);
    }

    #[test]
    fn bad_rate_falls_back() {
        let e = Engine::new(Ramp { sr: 0.0, resets: 0, n: 0.0 }, f32::NAN);
        assert_eq!(e.sample_rate(), 48_000.0);
    }
}
