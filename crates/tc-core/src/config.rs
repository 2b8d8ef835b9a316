//! Canvas tuning knobs.

use crate::layout::CrossLayout;
use crate::model::Size;
use crate::zindex::{MAX_Z, ZIndexAllocator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration shared by the engine and the CLI.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Delay after the last prompt edit before regenerating. Default: **500 ms**.
    pub quiet_period_ms: u64,

    /// Longest a continuous stream of edits can postpone a regeneration.
    /// Default: **2000 ms**.
    pub max_wait_ms: u64,

    /// Z-index ceiling that triggers renormalization. Default: **999**.
    pub max_z: u32,

    /// Gap between an expanded tile and its siblings. Default: **24**.
    pub cross_gap: f32,

    /// Fraction of a tile's size an above/left sibling may sit in negative
    /// space before it flips sides. Default: **0.3**.
    pub edge_threshold: f32,

    /// Size of tiles created without an explicit size. Default: **256×256**.
    pub default_tile_size: Size,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 500,
            max_wait_ms: 2000,
            max_z: MAX_Z,
            cross_gap: 24.0,
            edge_threshold: 0.3,
            default_tile_size: Size::default(),
        }
    }
}

impl CanvasConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn allocator(&self) -> ZIndexAllocator {
        ZIndexAllocator::new(self.max_z)
    }

    pub fn cross_layout(&self) -> CrossLayout {
        CrossLayout {
            gap: self.cross_gap,
            edge_threshold: self.edge_threshold,
        }
    }
}
