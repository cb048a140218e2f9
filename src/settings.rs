//! Shared engine configuration — audio settings and listener state.
//!
//! `AudioSettings` is the one piece of configuration every component reads
//! on each operation; the director owns the current value and components
//! receive a reference per call rather than caching a copy.

use serde::{Deserialize, Serialize};

/// Grid coordinate of the playfield center (5×5 grid, origin top-left).
pub const GRID_CENTER: f32 = 2.0;

/// World units per grid cell.
pub const WORLD_SCALE: f32 = 2.0;

/// Master volume plus per-category feature toggles.
///
/// Field names serialize in camelCase to match the host's settings panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    /// Master volume [0, 1], applied on top of per-request volume.
    pub master_volume: f32,
    /// Positional sound effects.
    pub spatial_audio: bool,
    /// Ambient nature/environmental effects.
    pub environmental_sounds: bool,
    /// Spoken narration.
    pub voice_narration: bool,
    /// Automatic narration on player movement (consumed by `speak_auto`).
    pub auto_narration: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        AudioSettings {
            master_volume: 0.8,
            spatial_audio: true,
            environmental_sounds: true,
            voice_narration: true,
            auto_narration: true,
        }
    }
}

impl AudioSettings {
    /// Clamp host-supplied values into range. Out-of-range master volume is
    /// UI input, not a programming error.
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self
    }
}

/// Transform grid coordinates to world coordinates: the grid center maps to
/// the world origin, one cell is `WORLD_SCALE` world units. The Y world axis
/// is unused (the playfield is flat); grid Y maps to world Z.
pub fn grid_to_world(x: f32, y: f32) -> [f32; 3] {
    [
        (x - GRID_CENTER) * WORLD_SCALE,
        0.0,
        (y - GRID_CENTER) * WORLD_SCALE,
    ]
}

/// The listener's position, tracked in grid coordinates and mirrored into
/// world space. Mutated whenever the game reports player movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    grid: (f32, f32),
    world: [f32; 3],
}

impl ListenerState {
    /// A listener standing at the grid center.
    pub fn new() -> Self {
        ListenerState {
            grid: (GRID_CENTER, GRID_CENTER),
            world: grid_to_world(GRID_CENTER, GRID_CENTER),
        }
    }

    pub fn set_grid(&mut self, x: f32, y: f32) {
        self.grid = (x, y);
        self.world = grid_to_world(x, y);
    }

    pub fn grid(&self) -> (f32, f32) {
        self.grid
    }

    pub fn world(&self) -> [f32; 3] {
        self.world
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        Self::new()
    }
}
