//! Tile data model.
//!
//! A canvas is a flat, ordered list of `CanvasTile`s. Each tile is an image
//! placeholder whose pixels come from an asynchronous generation call; the
//! `DisplayState` tracks where that call is in its lifecycle. Geometry is
//! plain canvas-space `f32`; layout and drag math live outside the core.

use crate::id::TileId;
use serde::{Deserialize, Serialize};

// ─── Geometry ────────────────────────────────────────────────────────────

/// Top-left corner of a tile in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(256.0, 256.0)
    }
}

// ─── Display state ───────────────────────────────────────────────────────

/// Lifecycle of a tile's image.
///
/// ```text
/// created ──▶ Loading ──▶ Ready | Failed
/// Ready | Failed ──(regenerate)──▶ Updating ──▶ Ready | Failed
/// ```
///
/// `Updating` differs from `Loading` only in that the tile keeps its
/// last-good `src` visible while the new image is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    #[default]
    Loading,
    Updating,
    Ready,
    Failed,
}

impl DisplayState {
    /// True once a generation attempt has reached a terminal state.
    pub fn is_settled(self) -> bool {
        matches!(self, DisplayState::Ready | DisplayState::Failed)
    }

    /// The state a tile enters when a new generation starts.
    pub fn on_regenerate(self) -> Self {
        match self {
            DisplayState::Ready | DisplayState::Failed => DisplayState::Updating,
            other => other,
        }
    }
}

// ─── Tile ────────────────────────────────────────────────────────────────

/// One image placeholder/result on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasTile {
    pub id: TileId,
    pub position: Position,
    pub size: Size,
    pub prompt: Option<String>,
    pub display_state: DisplayState,
    /// Resolved image URL. Empty until a generation completes.
    pub src: String,
    pub selected: bool,
    pub z_index: u32,
}

impl CanvasTile {
    pub fn new(id: TileId, position: Position, size: Size, z_index: u32) -> Self {
        Self {
            id,
            position,
            size,
            prompt: None,
            display_state: DisplayState::Loading,
            src: String::new(),
            selected: false,
            z_index,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// The prompt, trimmed, if it has any content.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: TilePatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(state) = patch.display_state {
            self.display_state = state;
        }
        if let Some(src) = patch.src {
            self.src = src;
        }
        if let Some(z) = patch.z_index {
            self.z_index = z;
        }
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// A partial-field update for `TileStore::update`.
///
/// `None` leaves a field untouched. `prompt` is doubly optional so a patch
/// can clear it. Selection is not patchable; it goes through
/// `TileStore::select` to keep the single-selection invariant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePatch {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub prompt: Option<Option<String>>,
    pub display_state: Option<DisplayState>,
    pub src: Option<String>,
    pub z_index: Option<u32>,
}

impl TilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(Some(prompt.into()));
        self
    }

    pub fn clear_prompt(mut self) -> Self {
        self.prompt = Some(None);
        self
    }

    pub fn display_state(mut self, state: DisplayState) -> Self {
        self.display_state = Some(state);
        self
    }

    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn z_index(mut self, z: u32) -> Self {
        self.z_index = Some(z);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
