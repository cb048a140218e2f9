//! Noise synthesis — filtered white noise under shaping envelopes.
//!
//! Percussive and ambient effects are drawn from a seeded PRNG and shaped
//! with one-pole filters. For a fixed seed the output is reproducible;
//! hosts that seed from entropy get run-to-run texture variation, which is
//! accepted — it changes timbre, never structure.

use std::f32::consts::{PI, TAU};

use oorandom::Rand64;

/// One-pole lowpass. Smoothing coefficient derived from the cutoff.
#[derive(Debug, Clone)]
pub struct OnePole {
    coeff: f32,
    state: f32,
}

impl OnePole {
    pub fn new(sample_rate: u32, cutoff_hz: f32) -> Self {
        let coeff = 1.0 - (-TAU * cutoff_hz / sample_rate as f32).exp();
        OnePole {
            coeff: coeff.clamp(0.0, 1.0),
            state: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.coeff * (input - self.state);
        self.state
    }
}

/// Next white-noise sample in [-1, 1].
#[inline]
fn white(rng: &mut Rand64) -> f32 {
    (rng.rand_float() as f32) * 2.0 - 1.0
}

/// Percussive noise burst: lowpassed white noise under an exponential
/// decay. Footsteps, knocks, thuds.
pub fn render_burst(
    sample_rate: u32,
    duration: f32,
    cutoff_hz: f32,
    decay: f32,
    rng: &mut Rand64,
) -> Vec<f32> {
    let frames = (duration * sample_rate as f32) as usize;
    let mut lp = OnePole::new(sample_rate, cutoff_hz);
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let attack = (t / 0.002).min(1.0);
        let env = attack * (-t * decay).exp();
        out.push((lp.process(white(rng)) * env * 2.0).clamp(-1.0, 1.0));
    }
    out
}

/// Band-limited noise wash with a slow amplitude ripple and raised-cosine
/// edges so looping playback stays click-free. Wind, streams.
///
/// The band is the difference of two lowpasses (`high_cut` minus `low_cut`).
pub fn render_wash(
    sample_rate: u32,
    duration: f32,
    low_cut_hz: f32,
    high_cut_hz: f32,
    ripple_hz: f32,
    rng: &mut Rand64,
) -> Vec<f32> {
    let frames = (duration * sample_rate as f32) as usize;
    let mut lp_high = OnePole::new(sample_rate, high_cut_hz);
    let mut lp_low = OnePole::new(sample_rate, low_cut_hz);
    let edge = (0.05 * sample_rate as f32) as usize;
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let n = white(rng);
        let band = lp_high.process(n) - lp_low.process(n);
        let ripple = 0.75 + 0.25 * (TAU * ripple_hz * t).sin();
        let fade = edge_fade(i, frames, edge);
        out.push((band * ripple * fade * 3.0).clamp(-1.0, 1.0));
    }
    out
}

/// Noise swells under repeating sin² humps. Ocean waves.
pub fn render_swell(
    sample_rate: u32,
    duration: f32,
    cutoff_hz: f32,
    swells: u32,
    rng: &mut Rand64,
) -> Vec<f32> {
    let frames = (duration * sample_rate as f32) as usize;
    let mut lp = OnePole::new(sample_rate, cutoff_hz);
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t_norm = i as f32 / frames.max(1) as f32;
        let hump = (PI * t_norm * swells as f32).sin();
        out.push((lp.process(white(rng)) * hump * hump * 2.5).clamp(-1.0, 1.0));
    }
    out
}

/// Raised-cosine fade at both ends of a buffer.
#[inline]
fn edge_fade(i: usize, frames: usize, edge: usize) -> f32 {
    if edge == 0 {
        return 1.0;
    }
    let ramp = |k: usize| 0.5 - 0.5 * (PI * k as f32 / edge as f32).cos();
    if i < edge {
        ramp(i)
    } else if i + edge >= frames {
        ramp(frames - 1 - i)
    } else {
        1.0
    }
}
