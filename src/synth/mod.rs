//! Sample synthesizer — builds the named, read-only buffer registry.
//!
//! Every effect the game plays is computed here at startup from a
//! closed-form recipe; there are no audio assets. The registry maps sound
//! id to an immutable buffer and is never mutated afterward. Several ids
//! intentionally alias the same buffer (content reuse).

pub mod noise;
pub mod tone;

use std::collections::HashMap;
use std::sync::Arc;

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use noise::{render_burst, render_swell, render_wash};
use tone::{Partial, render_partials, render_sweep, render_tone_run};

/// Content category of a sound, used for settings gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Nature,
    Magical,
    Environmental,
    Action,
    Ui,
}

/// An immutable mono PCM waveform.
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    pub category: SoundCategory,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

// Duration per sound family, in seconds.
const FOOTSTEP_SECS: f32 = 0.18;
const BUMP_SECS: f32 = 0.25;
const CHIME_SECS: f32 = 1.2;
const PORTAL_SECS: f32 = 1.5;
const CHIRP_SECS: f32 = 0.12;
const STREAM_SECS: f32 = 2.2;
const WIND_SECS: f32 = 3.0;
const WAVES_SECS: f32 = 3.0;
const DOOR_SECS: f32 = 0.5;
const NOTE_SECS: f32 = 0.12;
const BLIP_SECS: f32 = 0.07;

const ALL_DURATIONS: &[f32] = &[
    FOOTSTEP_SECS,
    BUMP_SECS,
    CHIME_SECS,
    PORTAL_SECS,
    CHIRP_SECS,
    STREAM_SECS,
    WIND_SECS,
    WAVES_SECS,
    DOOR_SECS,
    NOTE_SECS,
    BLIP_SECS,
];

/// The registry of synthesized sound buffers, keyed by sound id.
pub struct SampleLibrary {
    buffers: HashMap<String, Arc<SoundBuffer>>,
    sample_rate: u32,
}

impl SampleLibrary {
    /// Synthesize every buffer. Fails fast on a zero/negative duration or
    /// sample rate — buffers are precomputed, so a bad parameter here is a
    /// startup programming error, and nothing validates per call later.
    pub fn build(sample_rate: u32, noise_seed: u64) -> Result<Self, EngineError> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidParameter {
                name: "sample_rate",
                value: sample_rate as f64,
            });
        }
        for &secs in ALL_DURATIONS {
            if secs <= 0.0 {
                return Err(EngineError::InvalidParameter {
                    name: "duration",
                    value: secs as f64,
                });
            }
        }

        let sr = sample_rate;
        let mut rng = Rand64::new(noise_seed as u128);
        let mut buffers: HashMap<String, Arc<SoundBuffer>> = HashMap::new();
        let mut put = |map: &mut HashMap<String, Arc<SoundBuffer>>,
                       id: &str,
                       category: SoundCategory,
                       samples: Vec<f32>| {
            map.insert(
                id.to_string(),
                Arc::new(SoundBuffer {
                    category,
                    sample_rate: sr,
                    samples,
                }),
            );
        };

        // Action
        put(
            &mut buffers,
            "footstep",
            SoundCategory::Action,
            render_burst(sr, FOOTSTEP_SECS, 700.0, 22.0, &mut rng),
        );
        put(
            &mut buffers,
            "bump",
            SoundCategory::Action,
            render_partials(
                sr,
                BUMP_SECS,
                &[Partial::new(90.0, 1.0), Partial::new(180.0, 0.35)],
                14.0,
            ),
        );

        // Magical
        put(
            &mut buffers,
            "chime",
            SoundCategory::Magical,
            render_partials(
                sr,
                CHIME_SECS,
                &[
                    Partial::new(880.0, 1.0),
                    Partial::new(1760.0, 0.5),
                    Partial::new(2637.0, 0.25),
                ],
                3.0,
            ),
        );
        put(
            &mut buffers,
            "portal",
            SoundCategory::Magical,
            render_sweep(sr, PORTAL_SECS, 180.0, 1440.0, 1.2),
        );

        // Nature
        put(&mut buffers, "bird", SoundCategory::Nature, birdsong(sr));
        put(
            &mut buffers,
            "stream",
            SoundCategory::Nature,
            render_wash(sr, STREAM_SECS, 300.0, 2400.0, 1.3, &mut rng),
        );

        // Environmental
        put(
            &mut buffers,
            "wind",
            SoundCategory::Environmental,
            render_wash(sr, WIND_SECS, 40.0, 400.0, 0.25, &mut rng),
        );
        put(
            &mut buffers,
            "waves",
            SoundCategory::Environmental,
            render_swell(sr, WAVES_SECS, 500.0, 2, &mut rng),
        );
        put(
            &mut buffers,
            "door",
            SoundCategory::Environmental,
            render_burst(sr, DOOR_SECS, 250.0, 9.0, &mut rng),
        );

        // UI
        put(
            &mut buffers,
            "success",
            SoundCategory::Ui,
            render_tone_run(sr, NOTE_SECS, &[523.25, 659.25, 783.99, 1046.5], 6.0),
        );
        put(
            &mut buffers,
            "menu_move",
            SoundCategory::Ui,
            render_partials(sr, BLIP_SECS, &[Partial::new(660.0, 1.0)], 30.0),
        );

        // Aliases — distinct ids, shared buffers.
        for (alias, target) in [
            ("pickup", "chime"),
            ("water", "stream"),
            ("menu_back", "menu_move"),
        ] {
            let shared = Arc::clone(&buffers[target]);
            buffers.insert(alias.to_string(), shared);
        }

        Ok(SampleLibrary {
            buffers,
            sample_rate,
        })
    }

    /// Look up a buffer by id. Unknown ids return `None`; callers treat
    /// that as a silent no-op, not an error.
    pub fn get(&self, id: &str) -> Option<Arc<SoundBuffer>> {
        self.buffers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buffers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Two quick descending chirps with a short gap.
fn birdsong(sample_rate: u32) -> Vec<f32> {
    let mut out = render_sweep(sample_rate, CHIRP_SECS, 2200.0, 1400.0, 6.0);
    let gap = (0.08 * sample_rate as f32) as usize;
    out.resize(out.len() + gap, 0.0);
    out.extend(render_sweep(sample_rate, CHIRP_SECS, 1900.0, 1150.0, 6.0));
    out
}
