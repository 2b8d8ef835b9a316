//! Z-index allocation with bounded range.
//!
//! Bringing a tile to front hands out `max + 1`. Left alone that grows
//! without bound, so once the ceiling is reached every tile is renumbered
//! `1..N` in its current stacking order before the new value is handed out.
//! Renormalization is O(N log N) and happens at most once per
//! `ceiling - N` front-bring calls.

use crate::id::TileId;
use crate::model::TilePatch;
use crate::store::TileStore;

/// Highest z-index the allocator hands out under normal operation.
pub const MAX_Z: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZIndexAllocator {
    ceiling: u32,
}

impl Default for ZIndexAllocator {
    fn default() -> Self {
        Self::new(MAX_Z)
    }
}

impl ZIndexAllocator {
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling: ceiling.max(1),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Raise a tile above every other tile. Returns its resulting z-index,
    /// or `None` if the tile does not exist.
    ///
    /// Re-raising the topmost tile is a no-op and returns its current value.
    pub fn bring_to_front(&self, store: &mut TileStore, id: TileId) -> Option<u32> {
        let current = store.get(id)?.z_index;
        let max = store.max_z();
        if max > 0 && current == max {
            return Some(current);
        }
        let z = self.reserve(store, 1);
        store.update(id, TilePatch::new().z_index(z));
        Some(z)
    }

    /// Reserve `count` contiguous values above every current tile and return
    /// the first. Renormalizes first when the block would pass the ceiling.
    pub fn reserve(&self, store: &mut TileStore, count: u32) -> u32 {
        let max = store.max_z();
        if max.checked_add(count).is_some_and(|end| end <= self.ceiling) {
            return max + 1;
        }
        let top = self.renormalize(store);
        if top.saturating_add(count) > self.ceiling {
            log::warn!(
                "z-index: {} tiles exceed ceiling {}, allocating past it",
                store.len(),
                self.ceiling
            );
        }
        top + 1
    }

    /// True when every tile sits in `1..=ceiling` with no two sharing a
    /// value.
    pub fn is_compact(&self, store: &TileStore) -> bool {
        let mut zs: Vec<u32> = store.iter().map(|t| t.z_index).collect();
        zs.sort_unstable();
        let distinct = zs.windows(2).all(|w| w[0] != w[1]);
        let in_range = zs.first().is_none_or(|&z| z >= 1)
            && zs.last().is_none_or(|&z| z <= self.ceiling);
        distinct && in_range
    }

    /// Renumber every tile `1..N` by ascending z-index, ties broken by
    /// insertion order. Returns `N`.
    pub fn renormalize(&self, store: &mut TileStore) -> u32 {
        let mut order: Vec<(u32, usize)> = store
            .iter()
            .enumerate()
            .map(|(i, t)| (t.z_index, i))
            .collect();
        order.sort_unstable();

        let mut ranks = vec![0u32; order.len()];
        for (rank, &(_, index)) in order.iter().enumerate() {
            ranks[index] = rank as u32 + 1;
        }
        for (tile, rank) in store.iter_mut().zip(ranks) {
            tile.z_index = rank;
        }
        log::debug!("z-index: renormalized {} tiles", order.len());
        order.len() as u32
    }
}
