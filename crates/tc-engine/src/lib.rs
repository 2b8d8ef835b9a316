pub mod canvas;
pub mod debounce;
pub mod error;
pub mod expansion;
pub mod generation;
pub mod service;

pub use canvas::Canvas;
pub use debounce::{DebounceGate, Debouncer};
pub use error::{CanvasError, ErrorChannel};
pub use expansion::{ExpansionOrchestrator, ExpansionOutcome, PLACEHOLDER_PROMPT, VARIATION_COUNT};
pub use generation::{GenerationCoordinator, GenerationOutcome, SharedStore};
pub use service::{GenerationService, ImagePreloader, ServiceError, VariationService, Variations};

// Re-export so hosts implementing the service traits don't need a direct
// tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
