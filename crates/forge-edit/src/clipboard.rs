//! Clipboard collaborator boundary.
//!
//! The editor never talks to the platform clipboard directly; the host
//! supplies an implementation. Access happens only on the UI thread, so
//! the trait takes `&mut self` and needs no synchronization.

/// System clipboard plus the X11-style primary selection.
pub trait Clipboard {
    /// Current clipboard text, empty when unset.
    fn get(&mut self) -> String;

    /// Replace the clipboard text.
    fn set(&mut self, text: &str);

    /// Replace the primary selection. Defaults to a no-op on platforms
    /// without one.
    fn set_primary(&mut self, _text: &str) {}

    /// Current primary-selection text. Platforms without one fall back
    /// to the clipboard.
    fn get_primary(&mut self) -> String {
        self.get()
    }
}

/// Process-local clipboard used headless and in tests.
#[derive(Debug, Default)]
pub struct InMemoryClipboard {
    text: String,
    primary: String,
}

impl InMemoryClipboard {
    /// Empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary-selection text.
    pub fn primary(&self) -> &str {
        &self.primary
    }
}

impl Clipboard for InMemoryClipboard {
    fn get(&mut self) -> String {
        self.text.clone()
    }

    fn set(&mut self, text: &str) {
        self.text = text.to_owned();
    }

    fn set_primary(&mut self, text: &str) {
        self.primary = text.to_owned();
    }

    fn get_primary(&mut self) -> String {
        self.primary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_independent_of_clipboard() {
        let mut clip = InMemoryClipboard::new();
        clip.set("copied");
        clip.set_primary("selected");
        assert_eq!(clip.get(), "copied");
        assert_eq!(clip.primary(), "selected");
        assert_eq!(clip.get_primary(), "selected");
    }
}
