//! Dynamics compressor — the fixed output stage of the environmental
//! effects chain.
//!
//! Feed-forward design with a soft knee, parameterized like the WebAudio
//! DynamicsCompressorNode. The engine runs it at one operating point
//! (−24 dB threshold, 30 dB knee, 12:1 ratio, 3 ms attack, 250 ms
//! release) to keep the summed mix predictable for headphone listeners.

/// A stereo dynamics compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f32,

    /// Threshold in dB.
    pub threshold: f32,
    /// Compression ratio.
    pub ratio: f32,
    /// Knee width in dB.
    pub knee: f32,
    /// Attack time in seconds.
    pub attack: f32,
    /// Release time in seconds.
    pub release: f32,

    envelope: f32,
}

impl Compressor {
    /// The engine's fixed operating point.
    pub fn new(sample_rate: u32) -> Self {
        Compressor {
            sample_rate: sample_rate as f32,
            threshold: -24.0,
            knee: 30.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
            envelope: 0.0,
        }
    }

    /// A compressor with explicit parameters, clamped into sane ranges.
    pub fn with_params(
        sample_rate: u32,
        threshold: f32,
        knee: f32,
        ratio: f32,
        attack: f32,
        release: f32,
    ) -> Self {
        let mut c = Self::new(sample_rate);
        c.threshold = threshold.clamp(-100.0, 0.0);
        c.knee = knee.clamp(0.0, 40.0);
        c.ratio = ratio.clamp(1.0, 20.0);
        c.attack = attack.clamp(0.0001, 1.0);
        c.release = release.clamp(0.001, 5.0);
        c
    }

    #[inline]
    fn linear_to_db(linear: f32) -> f32 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    #[inline]
    fn db_to_linear(db: f32) -> f32 {
        10.0f32.powf(db / 20.0)
    }

    /// Gain reduction in dB for the given input level in dB.
    #[inline]
    fn compute_gain(&self, input_db: f32) -> f32 {
        let slope = 1.0 - 1.0 / self.ratio;
        if self.knee <= 0.0 {
            if input_db <= self.threshold {
                0.0
            } else {
                (self.threshold - input_db) * slope
            }
        } else {
            let half_knee = self.knee / 2.0;
            let knee_start = self.threshold - half_knee;
            let knee_end = self.threshold + half_knee;
            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (self.threshold - input_db) * slope
            } else {
                // Quadratic interpolation across the knee.
                let x = input_db - knee_start;
                -(x / self.knee) * (x / self.knee) * slope * half_knee
            }
        }
    }

    /// Process one stereo sample pair.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input_level = left.abs().max(right.abs());

        let attack_coef = (-1.0 / (self.attack * self.sample_rate)).exp();
        let release_coef = (-1.0 / (self.release * self.sample_rate)).exp();
        if input_level > self.envelope {
            self.envelope = attack_coef * self.envelope + (1.0 - attack_coef) * input_level;
        } else {
            self.envelope = release_coef * self.envelope + (1.0 - release_coef) * input_level;
        }

        let gain = Self::db_to_linear(self.compute_gain(Self::linear_to_db(self.envelope)));
        (left * gain, right * gain)
    }

    /// Process a block of stereo audio in place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for i in 0..left.len().min(right.len()) {
            let (l, r) = self.process(left[i], right[i]);
            left[i] = l;
            right[i] = r;
        }
    }

    /// Reset the envelope follower.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
