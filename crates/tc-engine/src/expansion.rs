//! Tile expansion: one tile in, four variation tiles out.
//!
//! 1. Lay out four slots in a cross around the source.
//! 2. Add four `Loading` placeholders stacked above every tile, then raise
//!    the source above them.
//! 3. Ask the variation service for four prompt rewrites. Any failure
//!    removes all placeholders; there is no partial commit.
//! 4. Generate all four concurrently and wait for every one to settle.
//! 5. Report how many ended `Failed`, keeping the ones that succeeded.

use crate::error::{CanvasError, ErrorChannel};
use crate::generation::{GenerationCoordinator, SharedStore};
use crate::service::{GenerationService, ImagePreloader, VariationService};
use futures::future::join_all;
use tc_core::{CanvasTile, CrossLayout, DisplayState, TileId, TilePatch, ZIndexAllocator};

/// Number of sibling tiles an expansion creates.
pub const VARIATION_COUNT: usize = 4;

/// Prompt shown on a placeholder until its variation arrives.
pub const PLACEHOLDER_PROMPT: &str = "(generating variation...)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    /// The source tile is missing or has no prompt.
    Skipped,
    /// Variations could not be fetched; placeholders were removed.
    VariationsFailed,
    /// All four generations settled. `failed` of them ended `Failed`.
    Completed {
        tiles: [TileId; VARIATION_COUNT],
        failed: usize,
    },
}

pub struct ExpansionOrchestrator<V> {
    variations: V,
    layout: CrossLayout,
    allocator: ZIndexAllocator,
}

impl<V: VariationService> ExpansionOrchestrator<V> {
    pub fn new(variations: V, layout: CrossLayout, allocator: ZIndexAllocator) -> Self {
        Self {
            variations,
            layout,
            allocator,
        }
    }

    pub async fn expand<G, P>(
        &self,
        store: &SharedStore,
        errors: &ErrorChannel,
        coordinator: &GenerationCoordinator<G, P>,
        source: TileId,
    ) -> ExpansionOutcome
    where
        G: GenerationService,
        P: ImagePreloader,
    {
        let Some((prompt, tiles)) = self.place_siblings(store, source) else {
            log::debug!("expand: {source} has no prompt, skipping");
            return ExpansionOutcome::Skipped;
        };
        log::debug!("expand: {source} → {tiles:?}");

        let variations = match self.variations.variations(&prompt, VARIATION_COUNT).await {
            Ok(v) if v.len() >= VARIATION_COUNT => v,
            Ok(v) => {
                self.remove_siblings(store, &tiles);
                errors.report(CanvasError::Variations(format!(
                    "expected {VARIATION_COUNT} variations, got {}",
                    v.len()
                )));
                return ExpansionOutcome::VariationsFailed;
            }
            Err(e) => {
                self.remove_siblings(store, &tiles);
                errors.report(CanvasError::Variations(e.to_string()));
                return ExpansionOutcome::VariationsFailed;
            }
        };

        let generations = tiles.iter().zip(variations).map(|(&id, text)| async move {
            store
                .borrow_mut()
                .update(id, TilePatch::new().prompt(text.clone()));
            coordinator.generate(id, &text).await
        });
        join_all(generations).await;

        let failed = {
            let store = store.borrow();
            tiles
                .iter()
                .filter(|&&id| {
                    store
                        .get(id)
                        .is_some_and(|t| t.display_state == DisplayState::Failed)
                })
                .count()
        };
        if failed > 0 {
            errors.report(CanvasError::ExpansionPartial {
                failed,
                total: VARIATION_COUNT,
            });
        }
        ExpansionOutcome::Completed { tiles, failed }
    }

    /// Steps 1–2: compute the cross and add the placeholders. Returns the
    /// source prompt and the placeholder ids.
    fn place_siblings(
        &self,
        store: &SharedStore,
        source: TileId,
    ) -> Option<(String, [TileId; VARIATION_COUNT])> {
        let mut store = store.borrow_mut();
        let tile = store.get(source)?;
        let prompt = tile.prompt_text()?.to_string();
        let (origin, size) = (tile.position, tile.size);

        let slots = self.layout.placements(origin, size);
        let first_z = self
            .allocator
            .reserve(&mut store, VARIATION_COUNT as u32 + 1);

        let tiles = std::array::from_fn(|i| {
            let id = TileId::generate();
            store.add(
                CanvasTile::new(id, slots[i].position, size, first_z + i as u32)
                    .with_prompt(PLACEHOLDER_PROMPT),
            );
            id
        });
        store.update(
            source,
            TilePatch::new().z_index(first_z + VARIATION_COUNT as u32),
        );
        Some((prompt, tiles))
    }

    fn remove_siblings(&self, store: &SharedStore, tiles: &[TileId]) {
        let mut store = store.borrow_mut();
        for &id in tiles {
            store.delete(id);
        }
    }
}
