//! Voice profiles and backend voice negotiation.
//!
//! Character archetypes map to fixed `VoiceProfile`s; the abstract
//! `VoiceType` of a profile is then resolved to a concrete backend voice
//! through an ordered preference list, with a mandatory default fallback.
//! Resolution never inspects backend-specific naming beyond the agreed
//! voice ids.

use serde::{Deserialize, Serialize};

/// Valid pitch range for synthetic speech.
pub const PITCH_MIN: f32 = 0.5;
pub const PITCH_MAX: f32 = 2.0;

/// Abstract speaking-voice category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceType {
    Narrator,
    Guide,
    Character,
    Mystical,
    Nature,
}

/// Pitch/rate/volume bundle describing one synthetic speaking voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    /// Pitch multiplier, 1.0 = neutral.
    pub pitch: f32,
    /// Speaking rate multiplier, 1.0 = neutral.
    pub rate: f32,
    /// Voice volume [0, 1], scaled by master volume when spoken.
    pub volume: f32,
    pub voice_type: VoiceType,
    /// Optional emotional-tone tag, carried for the host UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

fn profile(pitch: f32, rate: f32, volume: f32, voice_type: VoiceType, tone: &str) -> VoiceProfile {
    VoiceProfile {
        pitch,
        rate,
        volume,
        voice_type,
        tone: Some(tone.to_string()),
    }
}

/// The narrator profile, also the fallback for unknown archetypes.
pub fn narrator_voice() -> VoiceProfile {
    profile(1.0, 0.95, 1.0, VoiceType::Narrator, "warm")
}

/// Fixed registry: character archetype → voice profile. Unknown archetypes
/// fall back to the narrator so a content typo never silences a line.
pub fn character_voice(archetype: &str) -> VoiceProfile {
    match archetype {
        "narrator" => narrator_voice(),
        "guide" => profile(1.05, 1.0, 0.95, VoiceType::Guide, "encouraging"),
        "hermit" => profile(0.8, 0.85, 0.9, VoiceType::Character, "gravelly"),
        "gatekeeper" => profile(0.75, 0.9, 1.0, VoiceType::Character, "stern"),
        "sprite" => profile(1.5, 1.15, 0.85, VoiceType::Mystical, "playful"),
        "river_spirit" => profile(1.25, 0.9, 0.9, VoiceType::Mystical, "serene"),
        "owl" => profile(0.9, 0.8, 0.9, VoiceType::Nature, "solemn"),
        "wren" => profile(1.4, 1.2, 0.85, VoiceType::Nature, "bright"),
        other => {
            log::debug!("unknown archetype {other:?}, using narrator voice");
            narrator_voice()
        }
    }
}

/// Parameters of one speech request handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub text: String,
    /// Resolved concrete backend voice id.
    pub voice_id: String,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

/// The opaque speech sink. Speaking begins immediately and completes
/// asynchronously; the host reports completion back to the engine.
pub trait SpeechBackend {
    /// Concrete voice ids this backend can speak with.
    fn voices(&self) -> &[String];
    /// Begin speaking. An error here is treated like an immediately
    /// completed utterance, never surfaced to the caller.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), String>;
    /// Cancel the utterance in progress, if any.
    fn cancel(&mut self);
}

/// Ordered concrete voices acceptable for each abstract type. First match
/// against the backend's advertised list wins.
const VOICE_PREFERENCES: &[(VoiceType, &[&str])] = &[
    (VoiceType::Narrator, &["aldera", "clearbrook", "standard"]),
    (VoiceType::Guide, &["clearbrook", "aldera", "standard"]),
    (VoiceType::Character, &["tamsin", "aldera", "standard"]),
    (VoiceType::Mystical, &["sylph", "tamsin", "standard"]),
    (VoiceType::Nature, &["reed", "sylph", "standard"]),
];

/// The documented default when no preferred voice is available.
pub const DEFAULT_VOICE_ID: &str = "standard";

/// Resolve an abstract voice type to a concrete backend voice id.
pub fn resolve_backend_voice(voice_type: VoiceType, available: &[String]) -> String {
    let preferences = VOICE_PREFERENCES
        .iter()
        .find(|(t, _)| *t == voice_type)
        .map(|(_, p)| *p)
        .unwrap_or(&[]);

    for &pref in preferences {
        if available.iter().any(|v| v == pref) {
            return pref.to_string();
        }
    }
    log::debug!("no preferred voice for {voice_type:?} available, using default");
    DEFAULT_VOICE_ID.to_string()
}
