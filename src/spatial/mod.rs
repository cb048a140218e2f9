//! Spatial playback — positioned, looping sound sources against a listener.
//!
//! The mixer owns every active source, keyed by sound id. At most one
//! source exists per id: a new start for an id that is already playing
//! destroys the old source first (last start wins). Non-looping sources
//! self-release when their cursor passes the buffer end.

pub mod panner;

use std::collections::HashMap;
use std::sync::Arc;

use crate::settings::ListenerState;
use crate::synth::SoundBuffer;

/// An active playback instance of one registered buffer.
pub struct SoundSource {
    buffer: Arc<SoundBuffer>,
    position: [f32; 3],
    looping: bool,
    /// Volume from the play request, kept so master changes can retune.
    volume: f32,
    /// Effective gain: `volume × master`, updated live on settings changes.
    gain: f32,
    cursor: usize,
}

impl SoundSource {
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn finished(&self) -> bool {
        !self.looping && self.cursor >= self.buffer.samples.len()
    }
}

/// Renders all active sources into a stereo bus with distance attenuation
/// and equal-power panning.
pub struct SpatialMixer {
    sources: HashMap<String, SoundSource>,
}

impl SpatialMixer {
    pub fn new() -> Self {
        SpatialMixer {
            sources: HashMap::new(),
        }
    }

    /// Start a source for `id`, replacing any existing source for the same
    /// id. `volume` is the per-request level; `master` the current master
    /// volume.
    pub fn play(
        &mut self,
        id: &str,
        buffer: Arc<SoundBuffer>,
        position: [f32; 3],
        looping: bool,
        volume: f32,
        master: f32,
    ) {
        let volume = volume.clamp(0.0, 1.0);
        self.sources.insert(
            id.to_string(),
            SoundSource {
                buffer,
                position,
                looping,
                volume,
                gain: volume * master,
                cursor: 0,
            },
        );
    }

    /// Stop and release the source for `id`. Idempotent: a missing id —
    /// never started, already stopped, or naturally finished — is a no-op.
    pub fn stop(&mut self, id: &str) {
        self.sources.remove(id);
    }

    /// Retune every active source to a new master volume without
    /// interrupting playback.
    pub fn retune(&mut self, master: f32) {
        for source in self.sources.values_mut() {
            source.gain = source.volume * master;
        }
    }

    /// Force-stop everything.
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn active(&self, id: &str) -> Option<&SoundSource> {
        self.sources.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.sources.len()
    }

    /// Render one block of all active sources into `left`/`right`,
    /// accumulating on top of whatever is already there. Finished
    /// non-looping sources are released afterwards.
    pub fn render(&mut self, listener: &ListenerState, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let ear = listener.world();

        for source in self.sources.values_mut() {
            // Sources are stationary; listener moves between blocks, so
            // spatial gains are constant within one block.
            let dist = panner::distance_gain(ear, source.position);
            let (pan_l, pan_r) = panner::pan_gains(ear, source.position);
            let samples = &source.buffer.samples;
            if samples.is_empty() {
                source.cursor = samples.len();
                continue;
            }

            for frame in 0..frames {
                if source.looping {
                    if source.cursor >= samples.len() {
                        source.cursor = 0;
                    }
                } else if source.cursor >= samples.len() {
                    break;
                }
                let s = samples[source.cursor] * source.gain * dist;
                left[frame] += s * pan_l;
                right[frame] += s * pan_r;
                source.cursor += 1;
            }
        }

        self.sources.retain(|_, s| !s.finished());

        for frame in 0..frames {
            left[frame] = soft_clip(left[frame]);
            right[frame] = soft_clip(right[frame]);
        }
    }
}

impl Default for SpatialMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft clipper keeping the summed bus inside [-1, 1].
#[inline]
fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SoundCategory;

    fn buffer_of(samples: Vec<f32>) -> Arc<SoundBuffer> {
        Arc::new(SoundBuffer {
            category: SoundCategory::Action,
            sample_rate: 44100,
            samples,
        })
    }

    fn ones(n: usize) -> Arc<SoundBuffer> {
        buffer_of(vec![1.0; n])
    }

    fn render_peak(mixer: &mut SpatialMixer, listener: &ListenerState, frames: usize) -> f32 {
        let mut l = vec![0.0; frames];
        let mut r = vec![0.0; frames];
        mixer.render(listener, &mut l, &mut r);
        l.iter()
            .chain(r.iter())
            .fold(0.0f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn one_source_per_id_last_start_wins() {
        let mut mixer = SpatialMixer::new();
        mixer.play("a", ones(1000), [0.0, 0.0, 0.0], false, 1.0, 1.0);
        mixer.play("a", ones(1000), [4.0, 0.0, 4.0], false, 1.0, 1.0);

        assert_eq!(mixer.active_count(), 1, "restarting an id must replace, not add");
        let src = mixer.active("a").unwrap();
        assert_eq!(src.position(), [4.0, 0.0, 4.0], "the second start's position wins");
        assert_eq!(src.cursor(), 0, "replacement restarts from the beginning");
    }

    #[test]
    fn stop_is_idempotent() {
        let mut mixer = SpatialMixer::new();
        mixer.play("a", ones(100), [0.0; 3], false, 1.0, 1.0);
        mixer.stop("a");
        mixer.stop("a");
        mixer.stop("never-started");
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn non_looping_source_self_releases() {
        let mut mixer = SpatialMixer::new();
        mixer.play("a", ones(100), [0.0; 3], false, 1.0, 1.0);

        let listener = ListenerState::new();
        let mut l = vec![0.0; 256];
        let mut r = vec![0.0; 256];
        mixer.render(&listener, &mut l, &mut r);

        assert_eq!(mixer.active_count(), 0, "finished source should leave the map");
        assert!(l[0].abs() > 0.1, "source should have been audible first");
        assert_eq!(l[200], 0.0, "nothing should play past the buffer end");
    }

    #[test]
    fn looping_source_wraps_and_persists() {
        let mut mixer = SpatialMixer::new();
        mixer.play("loop", ones(100), [0.0; 3], true, 1.0, 1.0);

        let listener = ListenerState::new();
        let peak = render_peak(&mut mixer, &listener, 1024);
        assert_eq!(mixer.active_count(), 1, "looping source must persist");
        assert!(peak > 0.1, "looping source should stay audible, peak={peak}");
    }

    #[test]
    fn retune_changes_gain_without_restart() {
        let mut mixer = SpatialMixer::new();
        mixer.play("loop", ones(100), [0.0; 3], true, 1.0, 1.0);

        let listener = ListenerState::new();
        let mut l = vec![0.0; 64];
        let mut r = vec![0.0; 64];
        mixer.render(&listener, &mut l, &mut r);
        let cursor_before = mixer.active("loop").unwrap().cursor();

        mixer.retune(0.25);
        let src = mixer.active("loop").unwrap();
        assert!((src.gain() - 0.25).abs() < 1e-6, "gain should follow master");
        assert_eq!(src.cursor(), cursor_before, "retune must not restart playback");
    }

    #[test]
    fn colocated_source_is_louder_than_distant() {
        let listener = ListenerState::new();

        let mut near = SpatialMixer::new();
        near.play("s", buffer_of(vec![0.5; 512]), [0.0; 3], false, 1.0, 1.0);
        let near_peak = render_peak(&mut near, &listener, 256);

        let mut far = SpatialMixer::new();
        far.play("s", buffer_of(vec![0.5; 512]), [-4.0, 0.0, -4.0], false, 1.0, 1.0);
        let far_peak = render_peak(&mut far, &listener, 256);

        assert!(
            near_peak > far_peak * 2.0,
            "near={near_peak} should clearly exceed far={far_peak}"
        );
        assert!(far_peak > 0.0, "distant source must stay audible");
    }

    #[test]
    fn render_accumulates_multiple_sources() {
        let mut mixer = SpatialMixer::new();
        mixer.play("a", buffer_of(vec![0.2; 64]), [0.0; 3], false, 1.0, 1.0);
        mixer.play("b", buffer_of(vec![0.2; 64]), [0.0; 3], false, 1.0, 1.0);

        let listener = ListenerState::new();
        let mut l = vec![0.0; 64];
        let mut r = vec![0.0; 64];
        mixer.render(&listener, &mut l, &mut r);

        let expected = soft_clip(2.0 * 0.2 * std::f32::consts::FRAC_1_SQRT_2);
        assert!(
            (l[0] - expected).abs() < 1e-4,
            "two sources should sum: got {}, expected {expected}",
            l[0]
        );
    }

    #[test]
    fn bus_output_stays_bounded() {
        let mut mixer = SpatialMixer::new();
        for i in 0..8 {
            mixer.play(&format!("s{i}"), ones(256), [0.0; 3], false, 1.0, 1.0);
        }
        let listener = ListenerState::new();
        let peak = render_peak(&mut mixer, &listener, 256);
        assert!(peak <= 1.0, "soft clip should bound the bus, peak={peak}");
    }
}
