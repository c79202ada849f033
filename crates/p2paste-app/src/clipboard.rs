//! Copying the room link with fallbacks.
//!
//! Clipboard access is platform-specific and frequently denied. [`CopyLink`]
//! walks an ordered list of backends and stops at the first that accepts the
//! text. It never returns an error; the caller gets a [`CopyOutcome`] to show.

use std::sync::{Arc, Mutex};

use crate::error::ClipboardError;

/// One mechanism for putting text on the user's clipboard.
pub trait Clipboard: Send {
    /// Short name for logs and status messages.
    fn name(&self) -> &'static str;

    /// Put `text` on the clipboard.
    ///
    /// # Errors
    ///
    /// Returns `ClipboardError` if this mechanism cannot take the text.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Result of a copy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Copied using the named backend.
    Copied {
        /// Backend that succeeded.
        via: &'static str,
    },
    /// Every backend failed; show the link for manual copying.
    ShowManually,
}

/// Ordered clipboard fallback chain.
#[derive(Default)]
pub struct CopyLink {
    backends: Vec<Box<dyn Clipboard>>,
}

impl CopyLink {
    /// Empty chain. Every copy ends in [`CopyOutcome::ShowManually`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend, tried after those already added.
    #[must_use]
    pub fn with(mut self, backend: impl Clipboard + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Number of backends in the chain.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the chain has no backends.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Copy `link`, falling through backends until one succeeds.
    pub fn copy(&mut self, link: &str) -> CopyOutcome {
        for backend in &mut self.backends {
            match backend.write_text(link) {
                Ok(()) => {
                    tracing::debug!(via = backend.name(), "link copied");
                    return CopyOutcome::Copied { via: backend.name() };
                },
                Err(error) => {
                    tracing::warn!(via = backend.name(), %error, "clipboard backend failed");
                },
            }
        }
        CopyOutcome::ShowManually
    }
}

/// In-process clipboard. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    /// Empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|e| ClipboardError::Failed { reason: e.to_string() })?;
        *guard = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken(ClipboardError);

    impl Clipboard for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err(self.0.clone())
        }
    }

    #[test]
    fn first_working_backend_wins() {
        let memory = MemoryClipboard::new();
        let mut chain = CopyLink::new()
            .with(Broken(ClipboardError::Unavailable))
            .with(memory.clone())
            .with(Broken(ClipboardError::Unavailable));

        assert_eq!(chain.copy("/blue-otter-degk"), CopyOutcome::Copied { via: "memory" });
        assert_eq!(memory.contents().as_deref(), Some("/blue-otter-degk"));
    }

    #[test]
    fn exhausted_chain_falls_back_to_manual() {
        let mut chain = CopyLink::new()
            .with(Broken(ClipboardError::Unavailable))
            .with(Broken(ClipboardError::Failed { reason: "denied".to_string() }));

        assert_eq!(chain.copy("link"), CopyOutcome::ShowManually);
        assert_eq!(CopyLink::new().copy("link"), CopyOutcome::ShowManually);
    }
}
