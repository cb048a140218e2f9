//! AudioDirector — the engine object the host game drives.
//!
//! One director owns the whole audio session: settings, listener,
//! synthesized buffer registry, spatial mixer, narration engine, and
//! environmental processor. Every public operation returns immediately;
//! long-running playback completes inside `render` and speech completion
//! is reported back by the host. Construction is explicit and so is
//! teardown — there is no ambient global engine.

use crate::effects::{EnvironmentalProcessor, environment_for_level};
use crate::error::EngineError;
use crate::narration::voices::{SpeechBackend, VoiceProfile, character_voice};
use crate::narration::{CompletionCallback, NarrationEngine, NarrationRequest, SequenceItem};
use crate::settings::{AudioSettings, ListenerState, grid_to_world};
use crate::spatial::SpatialMixer;
use crate::synth::{SampleLibrary, SoundCategory};
use crate::wav::encode_wav;

/// Startup parameters. The noise seed feeds both the effect synthesizer
/// and the reverb impulse response; pass entropy for per-run texture
/// variation, or keep the default for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub noise_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44100,
            noise_seed: 0x5eed_ec40,
        }
    }
}

/// The spatial audio and narration engine.
pub struct AudioDirector {
    settings: AudioSettings,
    listener: ListenerState,
    library: SampleLibrary,
    spatial: SpatialMixer,
    narration: NarrationEngine,
    environment: EnvironmentalProcessor,
    /// Logical clock in samples, advanced by `render`.
    clock: u64,
    /// False when no output device exists; positional operations no-op.
    output_available: bool,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl AudioDirector {
    /// Build the engine: synthesizes the effect registry and the reverb
    /// impulse response. `speech` is the platform speech sink, or `None`
    /// where speech synthesis is unavailable; `output_available` reports
    /// whether an audio output device exists. With neither, the engine
    /// degrades to a fully silent no-op implementation — never an error.
    pub fn new(
        config: EngineConfig,
        speech: Option<Box<dyn SpeechBackend>>,
        output_available: bool,
    ) -> Result<Self, EngineError> {
        let library = SampleLibrary::build(config.sample_rate, config.noise_seed)?;
        Ok(AudioDirector {
            settings: AudioSettings::default(),
            listener: ListenerState::new(),
            library,
            spatial: SpatialMixer::new(),
            narration: NarrationEngine::new(config.sample_rate, speech),
            environment: EnvironmentalProcessor::new(config.sample_rate, config.noise_seed),
            clock: 0,
            output_available,
            scratch_left: Vec::new(),
            scratch_right: Vec::new(),
        })
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn sample_rate(&self) -> u32 {
        self.library.sample_rate()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Replace the settings and retune every active source to the new
    /// master volume before returning. Playback is not interrupted.
    pub fn update_settings(&mut self, settings: AudioSettings) {
        let settings = settings.sanitized();
        self.spatial.retune(settings.master_volume);
        self.settings = settings;
    }

    /// Move the listener to a grid position. No-op without an output
    /// device.
    pub fn update_listener_position(&mut self, x: f32, y: f32) {
        if !self.output_available {
            return;
        }
        self.listener.set_grid(x, y);
    }

    /// Start the positional effect `id` at a grid position. Silently
    /// ignored when spatial audio is off, the id is unknown, or the id's
    /// category is gated off; an existing source for `id` is stopped
    /// first.
    pub fn play_positional_sound(&mut self, id: &str, x: f32, y: f32, looping: bool, volume: f32) {
        if !self.output_available || !self.settings.spatial_audio {
            return;
        }
        let Some(buffer) = self.library.get(id) else {
            log::debug!("unknown sound id {id:?}, nothing to play");
            return;
        };
        if matches!(
            buffer.category,
            SoundCategory::Nature | SoundCategory::Environmental
        ) && !self.settings.environmental_sounds
        {
            return;
        }
        self.spatial.play(
            id,
            buffer,
            grid_to_world(x, y),
            looping,
            volume,
            self.settings.master_volume,
        );
    }

    /// Stop the source for `id`. Idempotent, also after natural
    /// completion.
    pub fn stop_sound(&mut self, id: &str) {
        self.spatial.stop(id);
    }

    pub fn sound_is_active(&self, id: &str) -> bool {
        self.spatial.active(id).is_some()
    }

    pub fn active_sound_count(&self) -> usize {
        self.spatial.active_count()
    }

    /// Direct access to the mixer's view of a source, for hosts that
    /// display playback state.
    pub fn spatial(&self) -> &SpatialMixer {
        &self.spatial
    }

    /// Speak a line with an explicit voice profile. Queued FIFO behind the
    /// current utterance; `callback` fires when this line finishes.
    pub fn speak(
        &mut self,
        text: &str,
        voice: VoiceProfile,
        position: Option<(f32, f32)>,
        callback: Option<CompletionCallback>,
    ) {
        let request = NarrationRequest {
            text: text.to_string(),
            voice,
            position,
            callback,
        };
        self.narration.speak(request, &self.settings, self.clock);
    }

    /// Speak a line as a character archetype.
    pub fn speak_as(
        &mut self,
        text: &str,
        archetype: &str,
        position: Option<(f32, f32)>,
        callback: Option<CompletionCallback>,
    ) {
        self.speak(text, character_voice(archetype), position, callback);
    }

    /// Automatic narration (movement descriptions). Additionally gated on
    /// the auto-narration toggle.
    pub fn speak_auto(&mut self, text: &str, archetype: &str, position: Option<(f32, f32)>) {
        if !self.settings.auto_narration {
            return;
        }
        self.speak_as(text, archetype, position, None);
    }

    /// Schedule a narration sequence on the logical clock.
    pub fn queue_narration_sequence(&mut self, items: Vec<SequenceItem>) {
        self.narration.queue_sequence(items, self.clock);
    }

    /// Cancel current and pending narration.
    pub fn stop_narration(&mut self) {
        self.narration.stop();
    }

    pub fn is_narrating(&self) -> bool {
        self.narration.is_speaking()
    }

    /// The host reports that the current utterance finished. Advances the
    /// FIFO queue (after the inter-utterance pause on later renders).
    pub fn utterance_finished(&mut self) {
        self.narration.utterance_finished(self.clock);
        self.narration.tick(self.clock, &self.settings);
    }

    /// Switch the environmental acoustics to a level.
    pub fn set_level(&mut self, name: &str) {
        self.environment.apply(environment_for_level(name));
    }

    /// The acoustics currently shaping the mix.
    pub fn environment(&self) -> &crate::effects::EnvironmentProfile {
        self.environment.environment()
    }

    /// Render one interleaved stereo block and advance the logical clock.
    /// Always advances time so scheduled narration runs even when every
    /// source is silent.
    pub fn render(&mut self, out: &mut [f32]) {
        let frames = out.len() / 2;
        self.scratch_left.clear();
        self.scratch_left.resize(frames, 0.0);
        self.scratch_right.clear();
        self.scratch_right.resize(frames, 0.0);

        if self.output_available {
            self.spatial
                .render(&self.listener, &mut self.scratch_left, &mut self.scratch_right);
            self.environment
                .process_block(&mut self.scratch_left, &mut self.scratch_right);
        }

        for frame in 0..frames {
            out[frame * 2] = self.scratch_left[frame];
            out[frame * 2 + 1] = self.scratch_right[frame];
        }

        self.clock += frames as u64;
        self.narration.tick(self.clock, &self.settings);
    }

    /// Render a registered effect to WAV bytes for preview. Unknown ids
    /// return `None`.
    pub fn render_effect_wav(&self, id: &str) -> Option<Vec<u8>> {
        let buffer = self.library.get(id)?;
        Some(encode_wav(&buffer.samples, buffer.sample_rate))
    }

    /// Teardown: force-stop all sources and narration, drop effect tails.
    /// Safe to call redundantly; already-finished sources are not errors.
    pub fn cleanup(&mut self) {
        self.spatial.clear();
        self.narration.stop();
        self.environment.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::voices::Utterance;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingBackend {
        voice_ids: Vec<String>,
        spoken: Rc<RefCell<Vec<Utterance>>>,
    }

    impl SpeechBackend for RecordingBackend {
        fn voices(&self) -> &[String] {
            &self.voice_ids
        }

        fn speak(&mut self, utterance: &Utterance) -> Result<(), String> {
            self.spoken.borrow_mut().push(utterance.clone());
            Ok(())
        }

        fn cancel(&mut self) {}
    }

    fn director() -> (AudioDirector, Rc<RefCell<Vec<Utterance>>>) {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let backend = RecordingBackend {
            voice_ids: vec!["aldera".to_string(), "standard".to_string()],
            spoken: Rc::clone(&spoken),
        };
        let d = AudioDirector::new(EngineConfig::default(), Some(Box::new(backend)), true)
            .expect("engine should build");
        (d, spoken)
    }

    fn render_peak(d: &mut AudioDirector, frames: usize) -> f32 {
        let mut out = vec![0.0f32; frames * 2];
        d.render(&mut out);
        out.iter().fold(0.0f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn unknown_sound_id_leaves_no_source_and_no_error() {
        let (mut d, _) = director();
        d.play_positional_sound("no-such-sound", 2.0, 2.0, false, 1.0);
        assert_eq!(d.active_sound_count(), 0);
    }

    #[test]
    fn restart_leaves_one_source_at_the_new_position() {
        let (mut d, _) = director();
        d.play_positional_sound("chime", 1.0, 1.0, false, 1.0);
        d.play_positional_sound("chime", 3.0, 2.0, false, 1.0);

        assert_eq!(d.active_sound_count(), 1);
        let src = d.spatial().active("chime").unwrap();
        assert_eq!(src.position(), grid_to_world(3.0, 2.0));
    }

    #[test]
    fn double_stop_is_harmless() {
        let (mut d, _) = director();
        d.play_positional_sound("chime", 2.0, 2.0, false, 1.0);
        d.stop_sound("chime");
        d.stop_sound("chime");
        assert!(!d.sound_is_active("chime"));
    }

    #[test]
    fn colocated_play_is_louder_than_corner_play() {
        let (mut d, _) = director();
        d.update_listener_position(2.0, 2.0);
        d.play_positional_sound("wind", 2.0, 2.0, true, 1.0);
        let near = render_peak(&mut d, 2048);

        d.cleanup();
        d.play_positional_sound("wind", 0.0, 0.0, true, 1.0);
        let far = render_peak(&mut d, 2048);

        assert!(near > far, "near={near} should exceed far={far}");
        assert!(far > 0.0, "corner source stays audible above the floor");
    }

    #[test]
    fn spatial_audio_toggle_gates_playback() {
        let (mut d, _) = director();
        d.update_settings(AudioSettings {
            spatial_audio: false,
            ..AudioSettings::default()
        });
        d.play_positional_sound("chime", 2.0, 2.0, false, 1.0);
        assert_eq!(d.active_sound_count(), 0);
    }

    #[test]
    fn environmental_toggle_gates_ambient_categories_only() {
        let (mut d, _) = director();
        d.update_settings(AudioSettings {
            environmental_sounds: false,
            ..AudioSettings::default()
        });

        d.play_positional_sound("wind", 2.0, 2.0, true, 1.0); // environmental
        d.play_positional_sound("bird", 2.0, 2.0, false, 1.0); // nature
        d.play_positional_sound("chime", 2.0, 2.0, false, 1.0); // magical
        d.play_positional_sound("footstep", 2.0, 2.0, false, 1.0); // action

        assert!(!d.sound_is_active("wind"));
        assert!(!d.sound_is_active("bird"));
        assert!(d.sound_is_active("chime"));
        assert!(d.sound_is_active("footstep"));
    }

    #[test]
    fn disabling_a_toggle_does_not_stop_running_sources() {
        let (mut d, spoken) = director();
        d.play_positional_sound("wind", 2.0, 2.0, true, 1.0);
        d.speak_as("still speaking", "narrator", None, None);

        // Turning narration off must not stop the unrelated looping source.
        d.update_settings(AudioSettings {
            voice_narration: false,
            ..AudioSettings::default()
        });
        assert!(d.sound_is_active("wind"));
        assert_eq!(spoken.borrow().len(), 1);

        // And new narration is silently ignored.
        d.speak_as("dropped", "narrator", None, None);
        d.utterance_finished();
        let mut out = vec![0.0f32; 44100];
        d.render(&mut out);
        assert_eq!(spoken.borrow().len(), 1);
    }

    #[test]
    fn master_volume_change_retunes_live_source() {
        let (mut d, _) = director();
        d.play_positional_sound("wind", 2.0, 2.0, true, 1.0);
        let mut out = vec![0.0f32; 1024];
        d.render(&mut out);
        let cursor_before = d.spatial().active("wind").unwrap().cursor();

        d.update_settings(AudioSettings {
            master_volume: 0.2,
            ..AudioSettings::default()
        });

        let src = d.spatial().active("wind").unwrap();
        assert!((src.gain() - 0.2).abs() < 1e-6, "gain should follow master");
        assert_eq!(
            src.cursor(),
            cursor_before,
            "volume change must not restart the source"
        );
    }

    #[test]
    fn narration_completes_in_submission_order() {
        let (mut d, spoken) = director();
        d.speak_as("one", "narrator", None, None);
        d.speak_as("two", "guide", None, None);
        d.speak_as("three", "sprite", None, None);
        assert_eq!(spoken.borrow().len(), 1, "one utterance at a time");

        for _ in 0..2 {
            d.utterance_finished();
            // A quarter second of rendering passes the inter-utterance gap.
            let mut out = vec![0.0f32; 22050];
            d.render(&mut out);
        }

        let texts: Vec<String> = spoken.borrow().iter().map(|u| u.text.clone()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
    }

    #[test]
    fn speak_auto_respects_the_auto_toggle() {
        let (mut d, spoken) = director();
        d.update_settings(AudioSettings {
            auto_narration: false,
            ..AudioSettings::default()
        });
        d.speak_auto("you step north", "narrator", None);
        assert_eq!(spoken.borrow().len(), 0);

        // Explicit narration still works.
        d.speak_as("examine the door", "narrator", None, None);
        assert_eq!(spoken.borrow().len(), 1);
    }

    #[test]
    fn sequence_plays_through_the_clock() {
        let (mut d, spoken) = director();
        d.queue_narration_sequence(vec![
            SequenceItem {
                text: "dawn breaks".to_string(),
                archetype: "narrator".to_string(),
                delay: 0.0,
                position: None,
            },
            SequenceItem {
                text: "follow the path".to_string(),
                archetype: "guide".to_string(),
                delay: 0.2,
                position: None,
            },
        ]);
        assert_eq!(spoken.borrow().len(), 0, "nothing fires before the clock moves");

        let mut out = vec![0.0f32; 44100]; // half a second
        d.render(&mut out);
        assert_eq!(spoken.borrow().len(), 1);
        assert_eq!(spoken.borrow()[0].text, "dawn breaks");

        d.utterance_finished();
        d.render(&mut out);
        assert_eq!(spoken.borrow().len(), 2);
        assert_eq!(spoken.borrow()[1].text, "follow the path");
    }

    #[test]
    fn render_produces_audio_and_advances_the_clock() {
        let (mut d, _) = director();
        d.play_positional_sound("chime", 2.0, 2.0, false, 1.0);
        assert_eq!(d.clock(), 0);
        let peak = render_peak(&mut d, 4096);
        assert!(peak > 0.001, "active source should be audible, peak={peak}");
        assert_eq!(d.clock(), 4096);
    }

    #[test]
    fn backend_unavailable_engine_is_fully_silent_but_alive() {
        let mut d = AudioDirector::new(EngineConfig::default(), None, false)
            .expect("silent engine should still build");

        d.update_listener_position(1.0, 1.0);
        d.play_positional_sound("chime", 2.0, 2.0, false, 1.0);
        d.speak_as("hello", "narrator", None, None);
        assert_eq!(d.active_sound_count(), 0);
        assert!(!d.is_narrating());

        let mut out = vec![0.0f32; 512];
        d.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0), "silent engine renders silence");
        d.cleanup();
    }

    #[test]
    fn invalid_sample_rate_fails_at_construction() {
        let config = EngineConfig {
            sample_rate: 0,
            ..EngineConfig::default()
        };
        assert!(AudioDirector::new(config, None, true).is_err());
    }

    #[test]
    fn cleanup_stops_everything_and_stays_safe() {
        let (mut d, _) = director();
        d.play_positional_sound("wind", 2.0, 2.0, true, 1.0);
        d.speak_as("line", "narrator", None, None);

        d.cleanup();
        assert_eq!(d.active_sound_count(), 0);
        assert!(!d.is_narrating());
        d.cleanup(); // redundant teardown is a no-op
    }

    #[test]
    fn effect_wav_export_round_trips_the_header() {
        let (d, _) = director();
        let wav = d.render_effect_wav("footstep").expect("known id");
        assert_eq!(&wav[0..4], b"RIFF");
        assert!(d.render_effect_wav("no-such").is_none());
    }

    #[test]
    fn level_switch_changes_the_environment() {
        use crate::effects::{DEFAULT_ENVIRONMENT, RoomSize};

        let (mut d, _) = director();
        d.set_level("Ocean Shore");
        assert_eq!(d.environment().reverb_level, 0.5);
        assert_eq!(d.environment().room_size, RoomSize::Large);

        d.set_level("Somewhere Entirely Unknown");
        assert_eq!(*d.environment(), DEFAULT_ENVIRONMENT);

        let mut out = vec![0.0f32; 1024];
        d.render(&mut out);
    }
}
