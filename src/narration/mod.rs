//! Narration engine — serialized synthetic speech from character voices.
//!
//! State machine: Idle → Speaking → Idle. While a request is speaking,
//! new requests wait in a FIFO queue; the queue is consumed only when the
//! engine returns to Idle, after a short inter-utterance pause. Sequences
//! are scheduled on an explicit timeline of (clock offset, request) pairs
//! driven by the director's sample clock, independent of the FIFO
//! serialization — scheduled items that fire while another line is
//! speaking pile into the queue, so realized timing can drift from the
//! nominal delays.

pub mod voices;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::settings::{AudioSettings, GRID_CENTER};
use voices::{
    PITCH_MAX, PITCH_MIN, SpeechBackend, Utterance, VoiceProfile, character_voice,
    resolve_backend_voice,
};

/// Pause between one utterance ending and the next starting, in seconds.
pub const INTER_UTTERANCE_PAUSE: f32 = 0.15;

/// Extra stagger added per item when scheduling a sequence, in seconds.
pub const SEQUENCE_STAGGER: f32 = 0.1;

/// Grid distance from the center over which positioned speech fades.
const SPEECH_FALLOFF_DISTANCE: f32 = 3.0;

/// Positioned speech never drops below this share of its volume.
const SPEECH_VOLUME_FLOOR: f32 = 0.1;

/// Pitch shift per grid cell of horizontal displacement from center.
const PITCH_SHIFT_PER_CELL: f32 = 0.04;

/// Invoked once when the request finishes speaking (or errors out).
pub type CompletionCallback = Box<dyn FnOnce()>;

/// One line of speech waiting to be spoken.
pub struct NarrationRequest {
    pub text: String,
    pub voice: VoiceProfile,
    /// Grid position of the speaker, if the line is positioned.
    pub position: Option<(f32, f32)>,
    pub callback: Option<CompletionCallback>,
}

/// One item of a narration sequence, as supplied by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceItem {
    pub text: String,
    pub archetype: String,
    /// Nominal delay from the time of scheduling, in seconds.
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub position: Option<(f32, f32)>,
}

struct CurrentUtterance {
    callback: Option<CompletionCallback>,
}

struct ScheduledRequest {
    due: u64,
    request: NarrationRequest,
}

/// Serializes speech through an optional backend. With no backend every
/// operation is a silent no-op.
pub struct NarrationEngine {
    backend: Option<Box<dyn SpeechBackend>>,
    current: Option<CurrentUtterance>,
    queue: VecDeque<NarrationRequest>,
    timeline: Vec<ScheduledRequest>,
    /// Sample clock value before which the queue must not advance.
    resume_at: u64,
    sample_rate: u32,
}

impl NarrationEngine {
    pub fn new(sample_rate: u32, backend: Option<Box<dyn SpeechBackend>>) -> Self {
        NarrationEngine {
            backend,
            current: None,
            queue: VecDeque::new(),
            timeline: Vec::new(),
            resume_at: 0,
            sample_rate,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn scheduled(&self) -> usize {
        self.timeline.len()
    }

    /// Speak a line, or enqueue it if another line is already speaking.
    /// No-op when narration is disabled or there is no backend.
    pub fn speak(&mut self, request: NarrationRequest, settings: &AudioSettings, clock: u64) {
        if !settings.voice_narration || self.backend.is_none() {
            return;
        }
        if self.current.is_some() {
            self.queue.push_back(request);
            return;
        }
        self.start(request, settings, clock);
    }

    /// Schedule each item independently at `delay + index × stagger` from
    /// now. Items that fire while another line is speaking join the FIFO
    /// queue in arrival order; their realized timing drifts from the
    /// nominal delays.
    pub fn queue_sequence(&mut self, items: Vec<SequenceItem>, clock: u64) {
        for (index, item) in items.into_iter().enumerate() {
            let offset = item.delay + index as f32 * SEQUENCE_STAGGER;
            let due = clock + self.secs_to_samples(offset);
            let request = NarrationRequest {
                text: item.text,
                voice: character_voice(&item.archetype),
                position: item.position,
                callback: None,
            };
            // Stable insert: equal due times keep submission order.
            let at = self
                .timeline
                .iter()
                .position(|s| s.due > due)
                .unwrap_or(self.timeline.len());
            self.timeline.insert(at, ScheduledRequest { due, request });
        }
    }

    /// The host reports that the current utterance finished (or failed).
    /// Fires the completion callback and opens the inter-utterance pause;
    /// the next queued request starts on a later `tick`.
    pub fn utterance_finished(&mut self, clock: u64) {
        if let Some(current) = self.current.take() {
            if let Some(callback) = current.callback {
                callback();
            }
            self.resume_at = clock + self.secs_to_samples(INTER_UTTERANCE_PAUSE);
        }
    }

    /// Advance the logical clock: fire due scheduled requests and, once
    /// idle past the pause, dequeue the next waiting request.
    pub fn tick(&mut self, clock: u64, settings: &AudioSettings) {
        while self
            .timeline
            .first()
            .is_some_and(|s| s.due <= clock)
        {
            let scheduled = self.timeline.remove(0);
            self.speak(scheduled.request, settings, clock);
        }

        if self.current.is_none() && clock >= self.resume_at {
            if let Some(request) = self.queue.pop_front() {
                self.speak(request, settings, clock);
            }
        }
    }

    /// Cancel the current utterance, drop the queue and any scheduled
    /// sequence items, and return to Idle. Safe to call redundantly.
    pub fn stop(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.cancel();
        }
        self.current = None;
        self.queue.clear();
        self.timeline.clear();
        self.resume_at = 0;
    }

    fn start(&mut self, request: NarrationRequest, settings: &AudioSettings, clock: u64) {
        let NarrationRequest {
            text,
            voice,
            position,
            callback,
        } = request;

        let mut pitch = voice.pitch;
        let mut volume = voice.volume * settings.master_volume;
        if let Some((x, y)) = position {
            if settings.spatial_audio {
                let (gain, shift) = positional_adjustment(x, y);
                volume *= gain;
                pitch += shift;
            }
        }
        pitch = pitch.clamp(PITCH_MIN, PITCH_MAX);

        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let utterance = Utterance {
            text,
            voice_id: resolve_backend_voice(voice.voice_type, backend.voices()),
            pitch,
            rate: voice.rate,
            volume,
        };

        match backend.speak(&utterance) {
            Ok(()) => {
                self.current = Some(CurrentUtterance { callback });
            }
            Err(err) => {
                // Backend errors behave like an instant completion; the
                // queue advances on the next tick.
                log::warn!("speech backend rejected utterance: {err}");
                if let Some(callback) = callback {
                    callback();
                }
                self.resume_at = clock + self.secs_to_samples(INTER_UTTERANCE_PAUSE);
            }
        }
    }

    fn secs_to_samples(&self, secs: f32) -> u64 {
        (secs * self.sample_rate as f32).round() as u64
    }
}

/// Linear fade with distance from the grid center, plus a pitch shift
/// proportional to horizontal displacement.
fn positional_adjustment(x: f32, y: f32) -> (f32, f32) {
    let dx = x - GRID_CENTER;
    let dy = y - GRID_CENTER;
    let distance = (dx * dx + dy * dy).sqrt();
    let gain = (1.0 - distance / SPEECH_FALLOFF_DISTANCE).max(SPEECH_VOLUME_FLOOR);
    (gain, dx * PITCH_SHIFT_PER_CELL)
}
