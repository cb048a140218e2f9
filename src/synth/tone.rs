//! Tonal synthesis — harmonic partial sums under exponential envelopes.
//!
//! Every tonal effect in the library is computed from a closed-form
//! formula: a sum of sine partials shaped by an exponential decay, with a
//! short linear attack to avoid onset clicks.

use std::f32::consts::TAU;

/// Attack ramp applied to every generator, in seconds.
const ATTACK: f32 = 0.005;

/// One partial of a harmonic sound: frequency in Hz and linear amplitude.
#[derive(Debug, Clone, Copy)]
pub struct Partial {
    pub frequency: f32,
    pub amplitude: f32,
}

impl Partial {
    pub fn new(frequency: f32, amplitude: f32) -> Self {
        Partial { frequency, amplitude }
    }
}

/// Linear attack ramp times exponential decay. `decay` is the decay rate in
/// 1/seconds; higher decays faster.
#[inline]
pub fn decay_envelope(t: f32, decay: f32) -> f32 {
    let attack = (t / ATTACK).min(1.0);
    attack * (-t * decay).exp()
}

/// Render a sum of partials under a shared decay envelope. Output is
/// normalized by the summed partial amplitudes so it stays within [-1, 1].
pub fn render_partials(sample_rate: u32, duration: f32, partials: &[Partial], decay: f32) -> Vec<f32> {
    let frames = (duration * sample_rate as f32) as usize;
    let norm = partials.iter().map(|p| p.amplitude).sum::<f32>().max(1e-6);
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let mut sample = 0.0;
        for p in partials {
            sample += p.amplitude * (TAU * p.frequency * t).sin();
        }
        out.push(sample / norm * decay_envelope(t, decay));
    }
    out
}

/// Render an exponential frequency sweep from `start_hz` to `end_hz`.
/// The phase is accumulated per sample so the glide is continuous.
pub fn render_sweep(
    sample_rate: u32,
    duration: f32,
    start_hz: f32,
    end_hz: f32,
    decay: f32,
) -> Vec<f32> {
    let frames = (duration * sample_rate as f32) as usize;
    let ratio = end_hz / start_hz;
    let mut out = Vec::with_capacity(frames);
    let mut phase = 0.0f32;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let freq = start_hz * ratio.powf(t / duration);
        phase += freq / sample_rate as f32;
        out.push((TAU * phase).sin() * decay_envelope(t, decay));
    }
    out
}

/// Render a sequence of short tones back to back, each with its own
/// fundamental. Used for chimes and fanfares.
pub fn render_tone_run(
    sample_rate: u32,
    note_duration: f32,
    fundamentals: &[f32],
    decay: f32,
) -> Vec<f32> {
    let mut out = Vec::new();
    for &f in fundamentals {
        let partials = [
            Partial::new(f, 1.0),
            Partial::new(f * 2.0, 0.4),
            Partial::new(f * 3.0, 0.15),
        ];
        out.extend(render_partials(sample_rate, note_duration, &partials, decay));
    }
    out
}
