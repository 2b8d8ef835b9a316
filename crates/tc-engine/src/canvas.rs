//! The canvas facade: the surface the UI layer binds to.
//!
//! `Canvas` owns the store and wires the z-index allocator, the per-tile
//! debounce gates, the generation coordinator, and the expansion
//! orchestrator together. All methods take `&self`; async operations may
//! be in flight while the UI keeps calling in.
//!
//! A `Canvas` is single-threaded. Debounced edits spawn local tasks, so it
//! must be driven from inside a `tokio::task::LocalSet`.

use crate::debounce::DebounceGate;
use crate::error::ErrorChannel;
use crate::expansion::{ExpansionOrchestrator, ExpansionOutcome};
use crate::generation::{GenerationCoordinator, GenerationOutcome, SharedStore};
use crate::service::{GenerationService, ImagePreloader, VariationService};
use futures::future::join_all;
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tc_core::{
    CanvasConfig, CanvasTile, Document, Position, Size, TileId, TilePatch, TileStore,
    ZIndexAllocator,
};

pub struct Canvas<G, V, P> {
    config: CanvasConfig,
    store: SharedStore,
    errors: ErrorChannel,
    allocator: ZIndexAllocator,
    coordinator: Rc<GenerationCoordinator<G, P>>,
    expansion: ExpansionOrchestrator<V>,
    gates: RefCell<HashMap<TileId, DebounceGate<String>>>,
}

impl<G, V, P> Canvas<G, V, P>
where
    G: GenerationService + 'static,
    V: VariationService,
    P: ImagePreloader + 'static,
{
    pub fn new(config: CanvasConfig, generator: G, variations: V, preloader: P) -> Self {
        let store: SharedStore = Rc::new(RefCell::new(TileStore::new()));
        let errors = ErrorChannel::new();
        let allocator = config.allocator();
        let coordinator = Rc::new(GenerationCoordinator::new(
            Rc::clone(&store),
            errors.clone(),
            generator,
            preloader,
        ));
        let expansion = ExpansionOrchestrator::new(variations, config.cross_layout(), allocator);
        Self {
            config,
            store,
            errors,
            allocator,
            coordinator,
            expansion,
            gates: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// Borrow the store. Do not hold the guard across an `.await`.
    pub fn store(&self) -> Ref<'_, TileStore> {
        self.store.borrow()
    }

    pub fn tile(&self, id: TileId) -> Option<CanvasTile> {
        self.store.borrow().get(id).cloned()
    }

    pub fn tiles(&self) -> Vec<CanvasTile> {
        self.store.borrow().iter().cloned().collect()
    }

    pub fn is_generating(&self, id: TileId) -> bool {
        self.coordinator.is_pending(id)
    }

    // ─── Error channel ───────────────────────────────────────────────────

    pub fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.message()
    }

    pub fn dismiss_error(&self) {
        self.errors.dismiss();
    }

    // ─── Store operations ────────────────────────────────────────────────

    pub fn add_tile(&self, tile: CanvasTile) {
        self.store.borrow_mut().add(tile);
    }

    /// Create a tile with a fresh id on top of the stack.
    pub fn create_tile(
        &self,
        position: Position,
        size: Option<Size>,
        prompt: Option<String>,
    ) -> TileId {
        let id = TileId::generate();
        let mut store = self.store.borrow_mut();
        let z = self.allocator.reserve(&mut store, 1);
        let mut tile = CanvasTile::new(
            id,
            position,
            size.unwrap_or(self.config.default_tile_size),
            z,
        );
        tile.prompt = prompt;
        store.add(tile);
        id
    }

    pub fn update_tile(&self, id: TileId, patch: TilePatch) -> bool {
        self.store.borrow_mut().update(id, patch)
    }

    /// Delete a tile, aborting its in-flight generation and any pending
    /// debounced edit.
    pub fn delete_tile(&self, id: TileId) -> bool {
        self.coordinator.cancel(id);
        self.gates.borrow_mut().remove(&id);
        self.store.borrow_mut().delete(id).is_some()
    }

    /// Select a tile (or none). A selected tile is raised to the front.
    pub fn select_tile(&self, id: Option<TileId>) {
        let mut store = self.store.borrow_mut();
        store.select(id);
        if let Some(id) = id {
            self.allocator.bring_to_front(&mut store, id);
        }
    }

    pub fn bring_to_front(&self, id: TileId) -> Option<u32> {
        self.allocator
            .bring_to_front(&mut self.store.borrow_mut(), id)
    }

    /// Remove every tile, aborting all generations and pending edits.
    pub fn clear(&self) {
        self.coordinator.cleanup();
        self.gates.borrow_mut().clear();
        self.store.borrow_mut().clear();
    }

    // ─── Generation ──────────────────────────────────────────────────────

    pub async fn generate_for_tile(&self, id: TileId, prompt: &str) -> GenerationOutcome {
        self.coordinator.generate(id, prompt).await
    }

    /// Record a live prompt edit. The tile's prompt updates immediately;
    /// regeneration is debounced per tile.
    pub fn edit_prompt(&self, id: TileId, text: &str) {
        if !self.update_tile(id, TilePatch::new().prompt(text)) {
            return;
        }
        let mut gates = self.gates.borrow_mut();
        let gate = gates.entry(id).or_insert_with(|| self.spawn_gate(id));
        gate.push(text.to_string());
    }

    /// Fire any pending debounced edit for `id` right away.
    pub fn flush_prompt(&self, id: TileId) {
        if let Some(gate) = self.gates.borrow().get(&id) {
            gate.flush();
        }
    }

    fn spawn_gate(&self, id: TileId) -> DebounceGate<String> {
        let coordinator = Rc::clone(&self.coordinator);
        DebounceGate::spawn(
            self.config.quiet_period(),
            self.config.max_wait(),
            move |prompt: String| {
                if prompt.trim().is_empty() {
                    return;
                }
                let coordinator = Rc::clone(&coordinator);
                tokio::task::spawn_local(async move {
                    coordinator.generate(id, &prompt).await;
                });
            },
        )
    }

    pub async fn expand_tile(&self, id: TileId) -> ExpansionOutcome {
        self.expansion
            .expand(&self.store, &self.errors, &*self.coordinator, id)
            .await
    }

    // ─── Documents ───────────────────────────────────────────────────────

    pub fn to_document(&self) -> Document {
        Document::from_store(&self.store.borrow())
    }

    /// Replace the canvas with a loaded document, then bring every tile
    /// back to life: stored images are re-preloaded, tiles with only a
    /// prompt are regenerated. Resolves once all of them settle.
    pub async fn load_document(&self, document: Document) {
        self.clear();
        let store = document.into_store_with(&self.allocator);
        let pending: Vec<(TileId, Option<String>, Option<String>)> = store
            .iter()
            .map(|t| {
                let src = (!t.src.is_empty()).then(|| t.src.clone());
                (t.id, src, t.prompt_text().map(str::to_string))
            })
            .collect();
        *self.store.borrow_mut() = store;

        let coordinator = &self.coordinator;
        let revivals = pending.into_iter().map(|(id, src, prompt)| async move {
            match (src, prompt) {
                (Some(url), _) => {
                    coordinator.restore(id, &url).await;
                }
                (None, Some(prompt)) => {
                    coordinator.generate(id, &prompt).await;
                }
                (None, None) => {}
            }
        });
        join_all(revivals).await;
    }
}

impl<G, V, P> Drop for Canvas<G, V, P> {
    fn drop(&mut self) {
        self.gates.get_mut().clear();
        self.coordinator.cleanup();
    }
}
