//! Indent-based code folding over the line store's hidden flags.
//!
//! Folding line `L` hides every following line whose indent strictly
//! exceeds `L`'s indent, skipping blank and comment-only lines, until a
//! line at lesser-or-equal indent. A line is "folded" when it is visible
//! but its successor is hidden.

use tracing::trace;

use crate::line_store::LineStore;

/// Fold configuration and operations.
#[derive(Debug, Clone)]
pub struct FoldModel {
    hiding_enabled: bool,
    comment_prefixes: Vec<String>,
}

impl FoldModel {
    /// Folding disabled, comment prefixes `#` and `//`.
    pub fn new() -> Self {
        Self {
            hiding_enabled: false,
            comment_prefixes: vec!["#".to_owned(), "//".to_owned()],
        }
    }

    /// Enable or disable hiding. Disabling unhides every line.
    pub fn set_hiding_enabled(&mut self, store: &mut LineStore, enabled: bool) {
        self.hiding_enabled = enabled;
        if !enabled {
            store.unhide_all();
        }
    }

    /// Whether hiding is enabled.
    pub fn hiding_enabled(&self) -> bool {
        self.hiding_enabled
    }

    /// Replace the comment prefixes that fold scanning skips over.
    pub fn set_comment_prefixes(&mut self, prefixes: Vec<String>) {
        self.comment_prefixes = prefixes;
    }

    fn is_blank(store: &LineStore, line: usize) -> bool {
        store.get(line).trim().is_empty()
    }

    fn is_comment(&self, store: &LineStore, line: usize) -> bool {
        let trimmed = store.get(line).trim_start();
        self.comment_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }

    /// Whether `line` is a visible fold anchor with hidden lines below.
    pub fn is_folded(&self, store: &LineStore, line: usize) -> bool {
        line + 1 < store.line_count() && !store.is_hidden(line) && store.is_hidden(line + 1)
    }

    /// Whether `line` can be folded.
    pub fn can_fold(&self, store: &LineStore, line: usize) -> bool {
        if !self.hiding_enabled
            || line + 1 >= store.line_count()
            || Self::is_blank(store, line)
            || self.is_folded(store, line)
            || store.is_hidden(line)
            || self.is_comment(store, line)
        {
            return false;
        }
        let start_indent = store.indent_level(line);
        for next in line + 1..store.line_count() {
            if Self::is_blank(store, next) || self.is_comment(store, next) {
                continue;
            }
            return store.indent_level(next) > start_indent;
        }
        false
    }

    /// Fold `line`, returning the hidden range `(first, last)`.
    ///
    /// Returns `None` when the line cannot be folded; the store is
    /// unchanged in that case.
    pub fn fold_line(&self, store: &mut LineStore, line: usize) -> Option<(usize, usize)> {
        if !self.can_fold(store, line) {
            return None;
        }
        let start_indent = store.indent_level(line);
        let mut last = line;
        for next in line + 1..store.line_count() {
            if Self::is_blank(store, next) || self.is_comment(store, next) {
                continue;
            }
            if store.indent_level(next) > start_indent {
                last = next;
            } else {
                break;
            }
        }
        for hidden in line + 1..=last {
            store.set_hidden(hidden, true);
        }
        trace!(target: "forge_edit::folding", line, first = line + 1, last, "fold");
        Some((line + 1, last))
    }

    /// Unfold at `line`: works from the fold anchor or any hidden line
    /// inside the fold. No-op otherwise.
    pub fn unfold_line(&self, store: &mut LineStore, line: usize) {
        if !self.is_folded(store, line) && !store.is_hidden(line) {
            return;
        }
        let mut anchor = line;
        while anchor > 0 && !self.is_folded(store, anchor) {
            anchor -= 1;
        }
        if !self.is_folded(store, anchor) {
            anchor = line;
        }
        for next in anchor + 1..store.line_count() {
            if store.is_hidden(next) {
                store.set_hidden(next, false);
            } else {
                break;
            }
        }
        trace!(target: "forge_edit::folding", line = anchor, "unfold");
    }

    /// Fold or unfold `line` depending on its current state.
    pub fn toggle_fold(&self, store: &mut LineStore, line: usize) -> Option<(usize, usize)> {
        if self.is_folded(store, line) {
            self.unfold_line(store, line);
            None
        } else {
            self.fold_line(store, line)
        }
    }

    /// Fold every foldable line in the document.
    pub fn fold_all(&self, store: &mut LineStore) {
        for line in 0..store.line_count() {
            self.fold_line(store, line);
        }
    }
}

impl Default for FoldModel {
    fn default() -> Self {
        Self::new()
    }
}
