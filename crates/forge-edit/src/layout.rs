//! Soft-wrap layout: mapping a logical line to visual wrap rows.
//!
//! A line is laid out at most `wrap_at` pixels wide. Breaks prefer a
//! space boundary and fall back to mid-word when a single word exceeds
//! the width. Continuation rows are drawn indented to the line's indent
//! level unless that indent itself exceeds the wrap width.

use crate::line_store::LineStore;

/// Soft-wrap configuration and row queries.
#[derive(Debug, Clone, Copy)]
pub struct WrapModel {
    enabled: bool,
    wrap_at: i32,
}

impl WrapModel {
    /// Wrapping disabled.
    pub fn new() -> Self {
        Self {
            enabled: false,
            wrap_at: 0,
        }
    }

    /// Enable or disable wrapping. Drops cached row counts on change.
    pub fn set_enabled(&mut self, store: &mut LineStore, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            store.clear_wrap_cache();
        }
    }

    /// Whether wrapping is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Set the wrap width in pixels. Drops cached row counts on change.
    pub fn set_wrap_at(&mut self, store: &mut LineStore, wrap_at: i32) {
        if self.wrap_at != wrap_at {
            self.wrap_at = wrap_at;
            store.clear_wrap_cache();
        }
    }

    /// Wrap width in pixels, 0 when unset.
    pub fn wrap_at(&self) -> i32 {
        self.wrap_at
    }

    /// Whether `line` produces more than one visual row.
    pub fn line_wraps(&self, store: &mut LineStore, line: usize) -> bool {
        self.enabled && self.wrap_at > 0 && store.line_width(line) > self.wrap_at
    }

    /// Number of extra rows `line` wraps into (0 = fits on one row).
    pub fn line_wrap_count(&self, store: &mut LineStore, line: usize) -> usize {
        if !self.line_wraps(store, line) {
            return 0;
        }
        if let Some(cached) = store.wrap_amount_cache(line) {
            return cached;
        }
        let amount = self.wrap_rows(store, line).len() - 1;
        store.set_wrap_amount_cache(line, amount);
        amount
    }

    /// The visual rows of `line`. Concatenating them yields the line text.
    pub fn wrap_rows(&self, store: &mut LineStore, line: usize) -> Vec<String> {
        let text = store.get(line).to_owned();
        if !self.line_wraps(store, line) {
            return vec![text];
        }

        let metrics = store.metrics();
        let indent_size = store.indent_size();
        let wrap_at = self.wrap_at;

        // Continuation rows reserve the line's indent unless that alone
        // overflows the wrap width.
        let mut indent_px = store.indent_level(line) as i32 * metrics.space_width;
        if indent_px >= wrap_at {
            indent_px = 0;
        }

        let chars: Vec<char> = text.chars().collect();
        let mut rows: Vec<String> = Vec::new();
        let mut row = String::new();
        let mut word = String::new();
        let mut px = 0i32;
        let mut word_px = 0i32;
        let mut wrap_index = 0usize;

        for (col, &c) in chars.iter().enumerate() {
            let next = chars.get(col + 1).copied().unwrap_or('\0');
            let w = metrics.char_advance(c, next, px + word_px, indent_size);
            let indent_ofs = if wrap_index != 0 { indent_px } else { 0 };

            if indent_ofs + word_px + w > wrap_at {
                // The word alone exceeds the width; break mid-word.
                row.push_str(&word);
                rows.push(std::mem::take(&mut row));
                wrap_index += 1;
                px = 0;
                word.clear();
                word.push(c);
                word_px = w;
            } else {
                word.push(c);
                word_px += w;
                if c == ' ' {
                    row.push_str(&word);
                    px += word_px;
                    word.clear();
                    word_px = 0;
                }
                if indent_ofs + px + word_px > wrap_at {
                    // The pending word would run past the edge; break at
                    // the last space.
                    rows.push(std::mem::take(&mut row));
                    wrap_index += 1;
                    px = 0;
                }
            }
        }
        row.push_str(&word);
        rows.push(row);
        rows
    }

    /// Which wrap row of `line` contains `column`.
    pub fn wrap_index_at_column(&self, store: &mut LineStore, line: usize, column: usize) -> usize {
        if !self.line_wraps(store, line) {
            return 0;
        }
        let mut consumed = 0usize;
        let rows = self.wrap_rows(store, line);
        for (index, row) in rows.iter().enumerate() {
            consumed += row.chars().count();
            if column < consumed {
                return index;
            }
        }
        rows.len() - 1
    }

    /// Column of the first character on wrap row `wrap_index` of `line`.
    pub fn column_at_wrap_start(
        &self,
        store: &mut LineStore,
        line: usize,
        wrap_index: usize,
    ) -> usize {
        if !self.line_wraps(store, line) {
            return 0;
        }
        self.wrap_rows(store, line)
            .iter()
            .take(wrap_index)
            .map(|row| row.chars().count())
            .sum()
    }
}

impl Default for WrapModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FontMetrics;
    use pretty_assertions::assert_eq;

    fn wrapped(wrap_at: i32, text: &str) -> (WrapModel, LineStore) {
        let mut store = LineStore::new();
        store.set_metrics(FontMetrics::new(10, 20));
        store.set(0, text);
        let mut model = WrapModel::new();
        model.set_enabled(&mut store, true);
        model.set_wrap_at(&mut store, wrap_at);
        (model, store)
    }

    #[test]
    fn break_prefers_space_boundary() {
        let (model, mut store) = wrapped(65, "aa bb cc dd");
        let rows = model.wrap_rows(&mut store, 0);
        assert_eq!(rows, vec!["aa bb ".to_owned(), "cc dd".to_owned()]);
        assert_eq!(model.line_wrap_count(&mut store, 0), 1);
    }

    #[test]
    fn rows_concatenate_to_line_text() {
        for text in ["aa bb cc dd", "abcdefghijklmno", "a  b   c    d", "wordwrap here"] {
            let (model, mut store) = wrapped(45, text);
            let rows = model.wrap_rows(&mut store, 0);
            assert_eq!(rows.concat(), text, "text: {text:?}");
        }
    }

    #[test]
    fn long_word_breaks_mid_word() {
        let (model, mut store) = wrapped(40, "abcdefghij");
        let rows = model.wrap_rows(&mut store, 0);
        assert_eq!(rows, vec!["abcd".to_owned(), "efgh".to_owned(), "ij".to_owned()]);
    }

    #[test]
    fn short_line_does_not_wrap() {
        let (model, mut store) = wrapped(65, "short");
        assert!(!model.line_wraps(&mut store, 0));
        assert_eq!(model.wrap_rows(&mut store, 0), vec!["short".to_owned()]);
        assert_eq!(model.line_wrap_count(&mut store, 0), 0);
    }

    #[test]
    fn wrap_index_maps_columns_to_rows() {
        let (model, mut store) = wrapped(65, "aa bb cc dd");
        // Rows: "aa bb " (cols 0..6), "cc dd" (cols 6..11).
        assert_eq!(model.wrap_index_at_column(&mut store, 0, 0), 0);
        assert_eq!(model.wrap_index_at_column(&mut store, 0, 5), 0);
        assert_eq!(model.wrap_index_at_column(&mut store, 0, 6), 1);
        assert_eq!(model.wrap_index_at_column(&mut store, 0, 11), 1);
        assert_eq!(model.column_at_wrap_start(&mut store, 0, 0), 0);
        assert_eq!(model.column_at_wrap_start(&mut store, 0, 1), 6);
    }

    #[test]
    fn wrap_count_cache_follows_width_changes() {
        let (mut model, mut store) = wrapped(65, "aa bb cc dd");
        assert_eq!(model.line_wrap_count(&mut store, 0), 1);
        model.set_wrap_at(&mut store, 200);
        assert_eq!(model.line_wrap_count(&mut store, 0), 0);
    }
}
