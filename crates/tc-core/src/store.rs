//! In-memory tile collection.
//!
//! `TileStore` is the single source of truth for what is on the canvas.
//! Every other component reads from it and writes back through `add`,
//! `update`, and `delete`. Nothing holds a tile reference across a
//! suspension point.

use crate::id::TileId;
use crate::model::{CanvasTile, TilePatch};

/// Ordered collection of tiles. Insertion order is preserved and is the
/// tie-breaker for z-index renormalization.
#[derive(Debug, Clone, Default)]
pub struct TileStore {
    tiles: Vec<CanvasTile>,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing collection, enforcing the
    /// single-selection invariant (first selected tile wins).
    pub fn from_tiles(tiles: Vec<CanvasTile>) -> Self {
        let mut store = Self { tiles };
        let first = store.tiles.iter().find(|t| t.selected).map(|t| t.id);
        store.select(first);
        store
    }

    /// Append a tile. Id uniqueness is the caller's responsibility.
    pub fn add(&mut self, tile: CanvasTile) {
        log::debug!("store: add {} (z {})", tile.id, tile.z_index);
        self.tiles.push(tile);
    }

    /// Apply a partial update. Returns `false` (and does nothing) when the
    /// tile no longer exists, so late async callbacks for deleted tiles land
    /// here harmlessly.
    pub fn update(&mut self, id: TileId, patch: TilePatch) -> bool {
        match self.get_mut(id) {
            Some(tile) => {
                tile.apply(patch);
                true
            }
            None => {
                log::trace!("store: update for missing {id} ignored");
                false
            }
        }
    }

    /// Remove a tile. Selection clears with it, since the tile carried it.
    pub fn delete(&mut self, id: TileId) -> Option<CanvasTile> {
        let pos = self.tiles.iter().position(|t| t.id == id)?;
        log::debug!("store: delete {id}");
        Some(self.tiles.remove(pos))
    }

    /// Select exactly one tile, or none.
    pub fn select(&mut self, id: Option<TileId>) {
        for tile in &mut self.tiles {
            tile.selected = Some(tile.id) == id;
        }
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn get(&self, id: TileId) -> Option<&CanvasTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut CanvasTile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    /// Tiles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CanvasTile> {
        self.tiles.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CanvasTile> {
        self.tiles.iter_mut()
    }

    pub fn ids(&self) -> Vec<TileId> {
        self.tiles.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn selected(&self) -> Option<&CanvasTile> {
        self.tiles.iter().find(|t| t.selected)
    }

    /// Highest z-index in use, 0 for an empty store.
    pub fn max_z(&self) -> u32 {
        self.tiles.iter().map(|t| t.z_index).max().unwrap_or(0)
    }
}
