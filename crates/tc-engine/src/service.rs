//! Contracts for the external collaborators.
//!
//! The engine never talks HTTP itself. Image generation, prompt variation,
//! and image preloading are consumed through these traits so a host can
//! plug in real clients and tests can plug in scripted ones.
//!
//! Futures returned by these traits run on the canvas's single thread and
//! need not be `Send`.

use smallvec::SmallVec;
use tokio_util::sync::CancellationToken;

/// Prompt variations for one expansion.
pub type Variations = SmallVec<[String; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request was aborted through its cancellation token. Expected
    /// supersession, never surfaced to the user.
    #[error("request cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    pub fn failed(message: impl Into<String>) -> Self {
        ServiceError::Failed(message.into())
    }
}

/// Turns a prompt into an image URL.
#[allow(async_fn_in_trait)]
pub trait GenerationService {
    /// Implementations should watch `cancel` and return
    /// `ServiceError::Cancelled` promptly once it fires.
    async fn generate(&self, prompt: &str, cancel: CancellationToken)
    -> Result<String, ServiceError>;
}

/// Produces creative rewrites of a prompt.
#[allow(async_fn_in_trait)]
pub trait VariationService {
    async fn variations(&self, prompt: &str, count: usize) -> Result<Variations, ServiceError>;
}

/// Fully loads an image so it is known to be displayable before commit.
#[allow(async_fn_in_trait)]
pub trait ImagePreloader {
    async fn preload(&self, url: &str) -> Result<(), ServiceError>;
}

impl<T: GenerationService> GenerationService for std::rc::Rc<T> {
    async fn generate(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, ServiceError> {
        (**self).generate(prompt, cancel).await
    }
}

impl<T: VariationService> VariationService for std::rc::Rc<T> {
    async fn variations(&self, prompt: &str, count: usize) -> Result<Variations, ServiceError> {
        (**self).variations(prompt, count).await
    }
}

impl<T: ImagePreloader> ImagePreloader for std::rc::Rc<T> {
    async fn preload(&self, url: &str) -> Result<(), ServiceError> {
        (**self).preload(url).await
    }
}
