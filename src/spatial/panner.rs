//! Distance attenuation and stereo panning for positioned sources.

use std::f32::consts::FRAC_PI_4;

/// Distance at which a source plays at full volume.
pub const REFERENCE_DISTANCE: f32 = 1.0;
/// Distance beyond which attenuation stops increasing.
pub const MAX_DISTANCE: f32 = 10.0;
/// Linear rolloff factor of the inverse-distance model.
pub const ROLLOFF_FACTOR: f32 = 1.0;

#[inline]
fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Inverse-distance gain, clamped between the reference and maximum
/// distance. Full volume inside the reference distance; the floor at
/// `MAX_DISTANCE` is `REFERENCE_DISTANCE / MAX_DISTANCE` = 0.1, so distant
/// sources stay audible as orientation cues.
pub fn distance_gain(listener: [f32; 3], source: [f32; 3]) -> f32 {
    let d = distance(listener, source).clamp(REFERENCE_DISTANCE, MAX_DISTANCE);
    REFERENCE_DISTANCE / (REFERENCE_DISTANCE + ROLLOFF_FACTOR * (d - REFERENCE_DISTANCE))
}

/// Equal-power stereo gains from the horizontal offset between source and
/// listener. Sources to the listener's left weight the left channel and
/// vice versa; the summed power stays constant across the arc.
pub fn pan_gains(listener: [f32; 3], source: [f32; 3]) -> (f32, f32) {
    let pan = ((source[0] - listener[0]) / MAX_DISTANCE).clamp(-1.0, 1.0);
    let angle = (pan + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}
