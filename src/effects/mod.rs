//! Environmental effects — per-level acoustics shaping the final mix.
//!
//! Each level maps to an `EnvironmentProfile`; the processor splits the
//! bus into a dry path and a convolution-reverb wet path, sums them, and
//! runs the result through a fixed dynamics compressor.

pub mod compressor;
pub mod convolver;

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use compressor::Compressor;
use convolver::Convolver;
use crate::synth::noise::OnePole;

/// Acoustic room size of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomSize {
    Small,
    Medium,
    Large,
}

/// Dominant reflecting material of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Soft,
    Hard,
    Mixed,
}

/// Per-level acoustic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentProfile {
    /// Wet/dry balance of the reverb [0, 1].
    pub reverb_level: f32,
    /// High-frequency absorption [0, 1].
    pub dampening: f32,
    pub room_size: RoomSize,
    pub material_type: MaterialType,
}

/// The profile used for any level name outside the known set: moderate
/// reverb, mixed material, medium room.
pub const DEFAULT_ENVIRONMENT: EnvironmentProfile = EnvironmentProfile {
    reverb_level: 0.3,
    dampening: 0.5,
    room_size: RoomSize::Medium,
    material_type: MaterialType::Mixed,
};

/// Acoustics for a level, by name. Unknown names get the default profile
/// rather than an error — a content typo must never mute a level.
pub fn environment_for_level(name: &str) -> EnvironmentProfile {
    let p = |reverb_level, dampening, room_size, material_type| EnvironmentProfile {
        reverb_level,
        dampening,
        room_size,
        material_type,
    };
    match name {
        "Forest Clearing" => p(0.25, 0.6, RoomSize::Medium, MaterialType::Soft),
        "Ocean Shore" => p(0.5, 0.3, RoomSize::Large, MaterialType::Hard),
        "Mountain Cave" => p(0.7, 0.2, RoomSize::Large, MaterialType::Hard),
        "Meadow" => p(0.15, 0.7, RoomSize::Small, MaterialType::Soft),
        "Ancient Ruins" => p(0.6, 0.35, RoomSize::Large, MaterialType::Mixed),
        "Whispering Grove" => p(0.35, 0.5, RoomSize::Medium, MaterialType::Soft),
        other => {
            log::debug!("no environment profile for level {other:?}, using default");
            DEFAULT_ENVIRONMENT
        }
    }
}

/// Length of the shared reverb impulse response, in seconds.
pub const IMPULSE_SECONDS: f32 = 2.0;

/// Build one channel of the shared impulse response: lowpass-filtered
/// noise under a `(1 − t/len)²` decay.
fn impulse_channel(sample_rate: u32, rng: &mut Rand64) -> Vec<f32> {
    let frames = (IMPULSE_SECONDS * sample_rate as f32) as usize;
    let mut lp = OnePole::new(sample_rate, 3500.0);
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f32 / frames as f32;
        let envelope = (1.0 - t) * (1.0 - t);
        let n = (rng.rand_float() as f32) * 2.0 - 1.0;
        out.push(lp.process(n) * envelope);
    }
    out
}

/// Dry/wet reverb split plus the fixed compressor output stage.
///
/// The stereo impulse response is built once at construction and shared
/// for the whole session; `apply` only retunes the dry/wet balance.
pub struct EnvironmentalProcessor {
    environment: EnvironmentProfile,
    convolver_left: Option<Convolver>,
    convolver_right: Option<Convolver>,
    compressor: Compressor,
    wet_left: Vec<f32>,
    wet_right: Vec<f32>,
}

impl EnvironmentalProcessor {
    pub fn new(sample_rate: u32, noise_seed: u64) -> Self {
        let mut rng = Rand64::new(noise_seed as u128);
        let ir_left = impulse_channel(sample_rate, &mut rng);
        let ir_right = impulse_channel(sample_rate, &mut rng);

        let convolver_left = Convolver::new(&ir_left);
        let convolver_right = Convolver::new(&ir_right);
        if convolver_left.is_none() || convolver_right.is_none() {
            log::warn!("reverb convolver unavailable, environments will play dry");
        }

        EnvironmentalProcessor {
            environment: DEFAULT_ENVIRONMENT,
            convolver_left,
            convolver_right,
            compressor: Compressor::new(sample_rate),
            wet_left: Vec::new(),
            wet_right: Vec::new(),
        }
    }

    /// Switch to a level's acoustics. Takes effect on the next block.
    pub fn apply(&mut self, environment: EnvironmentProfile) {
        self.environment = environment;
    }

    pub fn environment(&self) -> &EnvironmentProfile {
        &self.environment
    }

    /// Shape one block in place: dry gain `1 − reverb`, wet gain `reverb`
    /// through the shared convolver, then the compressor. When the reverb
    /// path is skipped — zero level or no convolver — the dry signal
    /// passes at full gain so the output is never silent.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let reverb = self.environment.reverb_level.clamp(0.0, 1.0);

        if reverb > 0.0 {
            if let (Some(conv_l), Some(conv_r)) =
                (self.convolver_left.as_mut(), self.convolver_right.as_mut())
            {
                let frames = left.len().min(right.len());
                self.wet_left.clear();
                self.wet_left.resize(frames, 0.0);
                self.wet_right.clear();
                self.wet_right.resize(frames, 0.0);

                conv_l.process(&left[..frames], &mut self.wet_left);
                conv_r.process(&right[..frames], &mut self.wet_right);

                let dry = 1.0 - reverb;
                for i in 0..frames {
                    left[i] = left[i] * dry + self.wet_left[i] * reverb;
                    right[i] = right[i] * dry + self.wet_right[i] * reverb;
                }
            }
        }

        self.compressor.process_block(left, right);
    }

    /// Drop reverberant tails and the compressor envelope.
    pub fn clear(&mut self) {
        if let Some(c) = self.convolver_left.as_mut() {
            c.clear();
        }
        if let Some(c) = self.convolver_right.as_mut() {
            c.clear();
        }
        self.compressor.reset();
    }
}
