//! Delay lines and the stereo feedback delay on the effects bus.
//!
//! - `DelayLine`    : heap-backed circular buffer, sized once per sample rate
//! - `StereoDelay`  : two independent feedback lines (left/right times differ) with a
//!                    low-pass in each loop so repeats darken as they decay
//!
//! Output of `StereoDelay` is **wet only**; the soundscape mixes it with the reverb
//! return.

use resonance_core::dsp::{kill_denormals, secs_to_samples};
use resonance_core::filters::OnePoleLP;

use crate::config::DelayParams;

/// Circular delay buffer with a fixed length (in samples).
#[derive(Clone, Debug)]
pub struct DelayLine {
    buf: Vec<f32>,
    i: usize,
}

impl DelayLine {
    pub fn new(len: usize) -> Self { Self { buf: vec![0.0; len.max(1)], i: 0 } }

    /// Resize (and clear) the line. Only reallocates when growing.
    pub fn set_len(&mut self, len: usize) {
        let len = len.max(1);
        self.buf.clear();
        self.buf.resize(len, 0.0);
        self.i = 0;
    }

    #[inline] pub fn len(&self) -> usize { self.buf.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// The sample written `len` samples ago.
    #[inline] pub fn read(&self) -> f32 { self.buf[self.i] }

    #[inline]
    pub fn write_advance(&mut self, x: f32) {
        self.buf[self.i] = x;
        self.i += 1;
        if self.i >= self.buf.len() { self.i = 0; }
    }

    pub fn clear(&mut self) {
        self.buf.iter_mut().for_each(|s| *s = 0.0);
    }
}

#[derive(Clone, Debug)]
struct FeedbackLine {
    line: DelayLine,
    damp: OnePoleLP,
}

impl FeedbackLine {
    fn new(time_s: f32, damp_hz: f32, sr: f32) -> Self {
        Self {
            line: DelayLine::new(secs_to_samples(time_s, sr) as usize),
            damp: OnePoleLP::new(damp_hz, sr),
        }
    }

    fn reset(&mut self, time_s: f32, sr: f32) {
        self.line.set_len(secs_to_samples(time_s, sr) as usize);
        self.damp.set_sample_rate(sr);
        self.damp.reset();
    }

    #[inline]
    fn process(&mut self, x: f32, fb: f32) -> f32 {
        let y = self.line.read();
        let back = self.damp.process(y);
        self.line.write_advance(kill_denormals(x + fb * back));
        y
    }
}

/// Stereo feedback delay (wet only).
#[derive(Clone, Debug)]
pub struct StereoDelay {
    params: DelayParams,
    left: FeedbackLine,
    right: FeedbackLine,
}

impl StereoDelay {
    pub fn new(params: DelayParams, sr: f32) -> Self {
        let sr = sr.max(1.0);
        Self {
            left: FeedbackLine::new(params.time_left_s, params.damp_hz, sr),
            right: FeedbackLine::new(params.time_right_s, params.damp_hz, sr),
            params,
        }
    }

    pub fn reset(&mut self, sr: f32) {
        let sr = sr.max(1.0);
        self.left.reset(self.params.time_left_s, sr);
        self.right.reset(self.params.time_right_s, sr);
    }

    pub fn clear(&mut self) {
        self.left.line.clear();
        self.right.line.clear();
        self.left.damp.reset();
        self.right.damp.reset();
    }

    #[inline]
    pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
        let fb = self.params.feedback;
        (self.left.process(l, fb), self.right.process(r, fb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_line_delays_by_its_length() {
        let mut d = DelayLine::new(3);
        let out: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .map(|&x| { let y = d.read(); d.write_advance(x); y })
            .collect();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn impulse_echoes_decay() {
        let sr = 1000.0;
        let p = DelayParams { time_left_s: 0.1, time_right_s: 0.15, feedback: 0.5, damp_hz: 400.0, ..DelayParams::default() };
        let mut d = StereoDelay::new(p, sr);
        let mut l = Vec::new();
        for n in 0..1000 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            l.push(d.process(x, x).0);
        }
        assert_eq!(l[100], 1.0);
        assert!(l[200].abs() < 0.5 && l[200].abs() > 0.0);
        assert!(l[900].abs() < l[200].abs());
    }
}
