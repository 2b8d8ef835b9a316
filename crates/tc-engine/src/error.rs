//! Error taxonomy and the UI-facing error channel.
//!
//! Nothing in the engine returns these errors to its caller. Failures are
//! turned into tile state (`Failed`) plus one message on the channel; the
//! channel keeps only the most recent message until it is dismissed.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("image failed to load: {0}")]
    Preload(String),
    #[error("could not get prompt variations: {0}")]
    Variations(String),
    #[error("failed to generate {failed} of {total} variations")]
    ExpansionPartial { failed: usize, total: usize },
}

/// Shared "last error" slot. Clones observe the same slot.
#[derive(Debug, Clone, Default)]
pub struct ErrorChannel {
    last: Rc<RefCell<Option<CanvasError>>>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, error: CanvasError) {
        log::warn!("canvas error: {error}");
        *self.last.borrow_mut() = Some(error);
    }

    pub fn last(&self) -> Option<CanvasError> {
        self.last.borrow().clone()
    }

    /// The last error, formatted for display.
    pub fn message(&self) -> Option<String> {
        self.last.borrow().as_ref().map(ToString::to_string)
    }

    pub fn dismiss(&self) {
        self.last.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_report_wins_until_dismissed() {
        let channel = ErrorChannel::new();
        let observer = channel.clone();
        channel.report(CanvasError::EmptyPrompt);
        channel.report(CanvasError::ExpansionPartial {
            failed: 2,
            total: 4,
        });
        assert_eq!(
            observer.message().as_deref(),
            Some("failed to generate 2 of 4 variations")
        );
        observer.dismiss();
        assert_eq!(channel.last(), None);
    }
}
