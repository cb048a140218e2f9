pub mod director;
pub mod effects;
pub mod error;
pub mod narration;
pub mod settings;
pub mod spatial;
pub mod synth;
pub mod wav;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::director::{AudioDirector, EngineConfig};
use crate::narration::SequenceItem;
use crate::narration::voices::{SpeechBackend, Utterance, character_voice};
use crate::settings::AudioSettings;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the echogrove-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: acoustics for a level name, as a JS object.
#[wasm_bindgen]
pub fn environment_for_level(name: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&effects::environment_for_level(name))
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: voice profile for a character archetype, as a JS object.
#[wasm_bindgen]
pub fn voice_for_archetype(archetype: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&character_voice(archetype))
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// Speech directives for the JS host, drained each frame. The host feeds
/// `speak` commands into its platform speech synthesis and reports back
/// through `narration_finished`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SpeechCommand {
    Speak(Utterance),
    Cancel,
}

/// Speech sink that bridges to the JS host through a drained command
/// queue.
struct BridgeBackend {
    voice_ids: Vec<String>,
    commands: Rc<RefCell<Vec<SpeechCommand>>>,
}

impl SpeechBackend for BridgeBackend {
    fn voices(&self) -> &[String] {
        &self.voice_ids
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), String> {
        self.commands
            .borrow_mut()
            .push(SpeechCommand::Speak(utterance.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.commands.borrow_mut().push(SpeechCommand::Cancel);
    }
}

/// The engine session handed to the JS game. Rendered audio is pulled as
/// interleaved stereo blocks for an AudioWorklet; speech goes out through
/// the command queue.
#[wasm_bindgen]
pub struct AdventureAudio {
    director: AudioDirector,
    commands: Rc<RefCell<Vec<SpeechCommand>>>,
}

#[wasm_bindgen]
impl AdventureAudio {
    /// Build a session. `voice_ids` lists the concrete speech voices the
    /// host can synthesize; `output_available` reports whether an audio
    /// output exists. Fails only on invalid startup parameters.
    #[wasm_bindgen(constructor)]
    pub fn new(
        sample_rate: u32,
        voice_ids: Vec<String>,
        speech_available: bool,
        output_available: bool,
    ) -> Result<AdventureAudio, JsValue> {
        let commands = Rc::new(RefCell::new(Vec::new()));
        let backend: Option<Box<dyn SpeechBackend>> = if speech_available {
            Some(Box::new(BridgeBackend {
                voice_ids,
                commands: Rc::clone(&commands),
            }))
        } else {
            None
        };
        let config = EngineConfig {
            sample_rate,
            ..EngineConfig::default()
        };
        let director = AudioDirector::new(config, backend, output_available)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(AdventureAudio { director, commands })
    }

    pub fn update_listener_position(&mut self, x: f32, y: f32) {
        self.director.update_listener_position(x, y);
    }

    pub fn play_positional_sound(&mut self, id: &str, x: f32, y: f32, looping: bool, volume: f32) {
        self.director.play_positional_sound(id, x, y, looping, volume);
    }

    pub fn stop_sound(&mut self, id: &str) {
        self.director.stop_sound(id);
    }

    /// Replace the audio settings from a JS settings object.
    pub fn update_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: AudioSettings = serde_wasm_bindgen::from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.director.update_settings(settings);
        Ok(())
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.director.settings())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn speak(&mut self, text: &str, archetype: &str) {
        self.director.speak_as(text, archetype, None, None);
    }

    pub fn speak_at(&mut self, text: &str, archetype: &str, x: f32, y: f32) {
        self.director.speak_as(text, archetype, Some((x, y)), None);
    }

    pub fn speak_auto(&mut self, text: &str, archetype: &str) {
        self.director.speak_auto(text, archetype, None);
    }

    pub fn stop_narration(&mut self) {
        self.director.stop_narration();
    }

    pub fn is_narrating(&self) -> bool {
        self.director.is_narrating()
    }

    /// Queue a narration sequence from a JS array of
    /// `{text, archetype, delay, position}` items.
    pub fn queue_narration_sequence(&mut self, items: JsValue) -> Result<(), JsValue> {
        let items: Vec<SequenceItem> = serde_wasm_bindgen::from_value(items)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.director.queue_narration_sequence(items);
        Ok(())
    }

    /// Queue a narration sequence from a JSON string, for hosts that ship
    /// story scripts as JSON.
    pub fn queue_narration_sequence_json(&mut self, json: &str) -> Result<(), JsValue> {
        let items: Vec<SequenceItem> =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.director.queue_narration_sequence(items);
        Ok(())
    }

    /// The host reports that its current utterance finished.
    pub fn narration_finished(&mut self) {
        self.director.utterance_finished();
    }

    /// Take the pending speech directives, oldest first.
    pub fn drain_speech_commands(&mut self) -> Result<JsValue, JsValue> {
        let commands: Vec<SpeechCommand> = self.commands.borrow_mut().drain(..).collect();
        serde_wasm_bindgen::to_value(&commands).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn set_level(&mut self, name: &str) {
        self.director.set_level(name);
    }

    /// Render `frames` frames of interleaved stereo audio for the
    /// AudioWorklet. Always advances the engine clock.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        self.director.render(&mut out);
        out
    }

    /// Render a registered effect to WAV bytes for preview; unknown ids
    /// return undefined.
    pub fn render_effect_wav(&self, id: &str) -> Option<Vec<u8>> {
        self.director.render_effect_wav(id)
    }

    pub fn cleanup(&mut self) {
        self.director.cleanup();
        self.commands.borrow_mut().clear();
    }
}
