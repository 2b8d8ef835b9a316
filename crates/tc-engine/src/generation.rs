//! Per-tile generation lifecycle.
//!
//! The coordinator guarantees at most one live request per tile. Starting
//! a request cancels the previous one and bumps the tile's epoch; every
//! suspension point is followed by a check that the request's epoch is
//! still the active one, so a superseded call can never commit state even
//! if its result arrives.
//!
//! A request runs in two phases: fetch an image URL from the generation
//! service, then preload that URL. Only a URL that preloaded is committed
//! as the tile's `src`.

use crate::error::{CanvasError, ErrorChannel};
use crate::service::{GenerationService, ImagePreloader, ServiceError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tc_core::{DisplayState, TileId, TilePatch, TileStore};
use tokio_util::sync::CancellationToken;

/// Shared handle to the canvas store.
pub type SharedStore = Rc<RefCell<TileStore>>;

/// How a `generate` or `restore` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Image committed, tile is `Ready`.
    Ready,
    /// Tile is `Failed`; the reason is on the error channel.
    Failed,
    /// A newer request or a cancellation took over. Nothing was committed.
    Superseded,
    /// The prompt was empty. No request was made.
    Rejected,
    /// The tile does not exist.
    Missing,
}

struct ActiveRequest {
    epoch: u64,
    token: CancellationToken,
}

/// A live request's identity, handed through the phases of one call.
struct Ticket {
    id: TileId,
    epoch: u64,
    token: CancellationToken,
}

pub struct GenerationCoordinator<G, P> {
    store: SharedStore,
    errors: ErrorChannel,
    generator: G,
    preloader: P,
    active: RefCell<HashMap<TileId, ActiveRequest>>,
    next_epoch: Cell<u64>,
}

impl<G, P> GenerationCoordinator<G, P> {
    /// Abort the tile's live request, if any.
    pub fn cancel(&self, id: TileId) -> bool {
        match self.active.borrow_mut().remove(&id) {
            Some(request) => {
                log::debug!("generate: cancel {id} epoch {}", request.epoch);
                request.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Abort every live request.
    pub fn cleanup(&self) {
        let drained: Vec<_> = self.active.borrow_mut().drain().collect();
        if !drained.is_empty() {
            log::debug!("generate: cleanup aborting {} requests", drained.len());
        }
        for (_, request) in drained {
            request.token.cancel();
        }
    }

    pub fn is_pending(&self, id: TileId) -> bool {
        self.active.borrow().contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.active.borrow().len()
    }
}

impl<G: GenerationService, P: ImagePreloader> GenerationCoordinator<G, P> {
    pub fn new(store: SharedStore, errors: ErrorChannel, generator: G, preloader: P) -> Self {
        Self {
            store,
            errors,
            generator,
            preloader,
            active: RefCell::new(HashMap::new()),
            next_epoch: Cell::new(1),
        }
    }

    /// Generate an image for `id` from `prompt` and commit the result.
    ///
    /// Any request already running for the tile is cancelled first; the
    /// last call for a tile always wins.
    pub async fn generate(&self, id: TileId, prompt: &str) -> GenerationOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.errors.report(CanvasError::EmptyPrompt);
            return GenerationOutcome::Rejected;
        }
        let Some(ticket) = self.begin(id) else {
            return GenerationOutcome::Missing;
        };
        log::debug!("generate: {id} epoch {} \"{prompt}\"", ticket.epoch);

        let result = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => Err(ServiceError::Cancelled),
            result = self.generator.generate(prompt, ticket.token.clone()) => result,
        };
        if !self.is_current(&ticket) {
            log::debug!("generate: {id} epoch {} superseded", ticket.epoch);
            return GenerationOutcome::Superseded;
        }

        match result {
            Ok(url) => self.preload_and_commit(ticket, url).await,
            Err(ServiceError::Cancelled) => {
                self.finish(&ticket);
                GenerationOutcome::Superseded
            }
            Err(ServiceError::Failed(message)) => {
                self.fail(&ticket, CanvasError::Generation(message));
                GenerationOutcome::Failed
            }
        }
    }

    /// Re-verify a stored image URL (after loading a document) and commit
    /// it. Shares the per-tile token rules with `generate`.
    pub async fn restore(&self, id: TileId, url: &str) -> GenerationOutcome {
        let Some(ticket) = self.begin(id) else {
            return GenerationOutcome::Missing;
        };
        log::debug!("restore: {id} epoch {}", ticket.epoch);
        self.preload_and_commit(ticket, url.to_string()).await
    }

    // ─── Phases ──────────────────────────────────────────────────────────

    /// Register a new request for `id`, cancelling the previous one, and
    /// move the tile into its in-flight state.
    fn begin(&self, id: TileId) -> Option<Ticket> {
        let state = self.store.borrow().get(id)?.display_state;

        let epoch = self.next_epoch.get();
        self.next_epoch.set(epoch + 1);
        let token = CancellationToken::new();

        let previous = self.active.borrow_mut().insert(
            id,
            ActiveRequest {
                epoch,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            log::debug!("generate: {id} epoch {} superseded by {epoch}", previous.epoch);
            previous.token.cancel();
        }

        let next = state.on_regenerate();
        if next != state {
            self.store
                .borrow_mut()
                .update(id, TilePatch::new().display_state(next));
        }
        Some(Ticket { id, epoch, token })
    }

    async fn preload_and_commit(&self, ticket: Ticket, url: String) -> GenerationOutcome {
        let loaded = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => Err(ServiceError::Cancelled),
            result = self.preloader.preload(&url) => result,
        };
        if !self.is_current(&ticket) {
            return GenerationOutcome::Superseded;
        }

        match loaded {
            Ok(()) => {
                self.finish(&ticket);
                log::debug!("generate: {} ready", ticket.id);
                self.store.borrow_mut().update(
                    ticket.id,
                    TilePatch::new().src(url).display_state(DisplayState::Ready),
                );
                GenerationOutcome::Ready
            }
            Err(ServiceError::Cancelled) => {
                self.finish(&ticket);
                GenerationOutcome::Superseded
            }
            Err(ServiceError::Failed(message)) => {
                self.fail(&ticket, CanvasError::Preload(message));
                GenerationOutcome::Failed
            }
        }
    }

    fn fail(&self, ticket: &Ticket, error: CanvasError) {
        self.finish(ticket);
        let committed = self
            .store
            .borrow_mut()
            .update(ticket.id, TilePatch::new().display_state(DisplayState::Failed));
        if committed {
            self.errors.report(error);
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.active
            .borrow()
            .get(&ticket.id)
            .is_some_and(|active| active.epoch == ticket.epoch)
    }

    /// Release the tile's slot if this ticket still holds it.
    fn finish(&self, ticket: &Ticket) {
        let mut active = self.active.borrow_mut();
        if active
            .get(&ticket.id)
            .is_some_and(|a| a.epoch == ticket.epoch)
        {
            active.remove(&ticket.id);
        }
    }
}

impl<G, P> Drop for GenerationCoordinator<G, P> {
    fn drop(&mut self) {
        for (_, request) in self.active.get_mut().drain() {
            request.token.cancel();
        }
    }
}
