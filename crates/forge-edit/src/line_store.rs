//! Document storage: an ordered sequence of [`Line`] records.
//!
//! Each line carries its text, gutter flags, and memoized metrics. The
//! store guarantees at least one line at all times; an empty document is
//! one empty line. Columns are counted in Unicode scalar values, not
//! bytes.

use bitflags::bitflags;
use forge_object::{Ref, Resource};

use crate::metrics::FontMetrics;

/// A `(line, column)` position in the document, column in scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct TextPos {
    /// Line index.
    pub line: usize,
    /// Column, `0..=line_length`.
    pub column: usize,
}

impl TextPos {
    /// Position at `(line, column)`.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

bitflags! {
    /// Per-line gutter and layout flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LineFlags: u8 {
        /// Marked (e.g. search result or lint marker).
        const MARKED = 1 << 0;
        /// Breakpoint set on this line.
        const BREAKPOINT = 1 << 1;
        /// Bookmark set on this line.
        const BOOKMARK = 1 << 2;
        /// Hidden by folding; contributes no visual row.
        const HIDDEN = 1 << 3;
        /// Verified safe by external analysis.
        const SAFE = 1 << 4;
        /// An info icon is attached.
        const HAS_INFO = 1 << 5;
    }
}

/// One logical text line plus flags and cached metrics.
#[derive(Debug, Default)]
pub struct Line {
    text: String,
    flags: LineFlags,
    // -1 = dirty, recomputed on demand.
    width_cache: i32,
    wrap_amount_cache: i32,
    info_icon: Option<Ref<dyn Resource>>,
    info_text: String,
}

impl Line {
    fn new(text: String) -> Self {
        Self {
            text,
            width_cache: -1,
            wrap_amount_cache: -1,
            ..Default::default()
        }
    }

    /// The line's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The line's flags.
    pub fn flags(&self) -> LineFlags {
        self.flags
    }

    /// Length in scalar values.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the line is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Ordered line storage with lazy width metrics.
pub struct LineStore {
    lines: Vec<Line>,
    metrics: FontMetrics,
    indent_size: usize,
}

impl LineStore {
    /// A store holding a single empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![Line::new(String::new())],
            metrics: FontMetrics::default(),
            indent_size: 4,
        }
    }

    /// Replace the font metrics and drop all cached widths.
    pub fn set_metrics(&mut self, metrics: FontMetrics) {
        self.metrics = metrics;
        for line in &mut self.lines {
            line.width_cache = -1;
            line.wrap_amount_cache = -1;
        }
    }

    /// Current font metrics.
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Set the tab stop width in spaces and drop all cached widths.
    pub fn set_indent_size(&mut self, size: usize) {
        self.indent_size = size.max(1);
        for line in &mut self.lines {
            line.width_cache = -1;
            line.wrap_amount_cache = -1;
        }
    }

    /// Tab stop width in spaces.
    pub fn indent_size(&self) -> usize {
        self.indent_size
    }

    /// Number of lines, always ≥ 1.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line record at `index`.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Text of line `index`, empty when out of range.
    pub fn get(&self, index: usize) -> &str {
        self.lines.get(index).map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Length of line `index` in scalar values.
    pub fn line_len(&self, index: usize) -> usize {
        self.lines.get(index).map(|l| l.len()).unwrap_or(0)
    }

    /// Replace the text of line `index`. No-op when out of range.
    pub fn set(&mut self, index: usize, text: impl Into<String>) {
        if let Some(line) = self.lines.get_mut(index) {
            line.text = text.into();
            line.width_cache = -1;
            line.wrap_amount_cache = -1;
        }
    }

    /// Insert a new line with `text` before `index`.
    pub fn insert_line(&mut self, index: usize, text: impl Into<String>) {
        let index = index.min(self.lines.len());
        self.lines.insert(index, Line::new(text.into()));
    }

    /// Remove line `index`. Refuses to drop the last remaining line.
    pub fn remove_line(&mut self, index: usize) {
        if self.lines.len() > 1 && index < self.lines.len() {
            self.lines.remove(index);
        }
    }

    /// Reset the store to a single empty line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.push(Line::new(String::new()));
    }

    /// Whole document as one string with `\n` separators.
    pub fn as_string(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.text);
        }
        out
    }

    // Flag accessors. All are no-ops on out-of-range lines.

    /// Flags of line `index`.
    pub fn line_flags(&self, index: usize) -> LineFlags {
        self.lines.get(index).map(|l| l.flags).unwrap_or_default()
    }

    /// Set or clear one flag on line `index`.
    pub fn set_line_flag(&mut self, index: usize, flag: LineFlags, value: bool) {
        if let Some(line) = self.lines.get_mut(index) {
            line.flags.set(flag, value);
        }
    }

    /// Whether line `index` is hidden by folding.
    pub fn is_hidden(&self, index: usize) -> bool {
        self.line_flags(index).contains(LineFlags::HIDDEN)
    }

    /// Hide or unhide line `index`.
    pub fn set_hidden(&mut self, index: usize, hidden: bool) {
        self.set_line_flag(index, LineFlags::HIDDEN, hidden);
    }

    /// Whether any line in the document is hidden.
    pub fn has_hidden_lines(&self) -> bool {
        self.lines.iter().any(|l| l.flags.contains(LineFlags::HIDDEN))
    }

    /// Clear the hidden flag on every line.
    pub fn unhide_all(&mut self) {
        for line in &mut self.lines {
            line.flags.remove(LineFlags::HIDDEN);
        }
    }

    /// Attach or detach an info icon on line `index`.
    ///
    /// The icon is a refcounted resource held by the store; `HAS_INFO`
    /// tracks attachment.
    pub fn set_line_info(
        &mut self,
        index: usize,
        icon: Option<Ref<dyn Resource>>,
        text: impl Into<String>,
    ) {
        if let Some(line) = self.lines.get_mut(index) {
            line.flags.set(LineFlags::HAS_INFO, icon.is_some());
            line.info_icon = icon;
            line.info_text = text.into();
        }
    }

    /// Info icon attached to line `index`.
    pub fn line_info(&self, index: usize) -> Option<(&Ref<dyn Resource>, &str)> {
        let line = self.lines.get(index)?;
        line.info_icon
            .as_ref()
            .map(|icon| (icon, line.info_text.as_str()))
    }

    // Width metrics.

    /// Pixel width of line `index`, memoized until the line edits.
    pub fn line_width(&mut self, index: usize) -> i32 {
        let (metrics, indent) = (self.metrics, self.indent_size);
        let Some(line) = self.lines.get_mut(index) else {
            return 0;
        };
        if line.width_cache < 0 {
            line.width_cache = metrics.str_width(&line.text, indent);
        }
        line.width_cache
    }

    /// Widest line in pixels, optionally skipping hidden lines.
    pub fn max_width(&mut self, exclude_hidden: bool) -> i32 {
        let mut max = 0;
        for index in 0..self.lines.len() {
            if exclude_hidden && self.is_hidden(index) {
                continue;
            }
            max = max.max(self.line_width(index));
        }
        max
    }

    /// Cached wrap-row count for line `index`, `None` when dirty.
    pub fn wrap_amount_cache(&self, index: usize) -> Option<usize> {
        let cached = self.lines.get(index)?.wrap_amount_cache;
        (cached >= 0).then_some(cached as usize)
    }

    /// Memoize the wrap-row count for line `index`.
    pub fn set_wrap_amount_cache(&mut self, index: usize, amount: usize) {
        if let Some(line) = self.lines.get_mut(index) {
            line.wrap_amount_cache = amount as i32;
        }
    }

    /// Drop every cached wrap-row count (wrap width changed).
    pub fn clear_wrap_cache(&mut self) {
        for line in &mut self.lines {
            line.wrap_amount_cache = -1;
        }
    }

    /// Indent level of line `index` in spaces, tabs counting as one stop.
    pub fn indent_level(&self, index: usize) -> usize {
        let mut level = 0;
        for c in self.get(index).chars() {
            match c {
                '\t' => level += self.indent_size,
                ' ' => level += 1,
                _ => break,
            }
        }
        level
    }

    /// First non-whitespace column of line `index`.
    pub fn first_non_whitespace_column(&self, index: usize) -> usize {
        self.get(index)
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count()
    }

    // Text-range primitives used by the editor facade.

    /// Byte offset of scalar-value `column` in `text`.
    pub(crate) fn byte_of_column(text: &str, column: usize) -> usize {
        text.char_indices()
            .nth(column)
            .map(|(b, _)| b)
            .unwrap_or(text.len())
    }

    /// Insert `text` (may contain `\n`) at `at`; returns the end position.
    ///
    /// `at` must be in range; out-of-range positions leave the store
    /// unchanged and return `at`.
    pub fn insert_text(&mut self, at: TextPos, text: &str) -> TextPos {
        if at.line >= self.lines.len() || at.column > self.line_len(at.line) {
            return at;
        }
        let line_text = self.get(at.line).to_owned();
        let split = Self::byte_of_column(&line_text, at.column);
        let (head, tail) = line_text.split_at(split);

        let mut segments = text.split('\n');
        let first = segments.next().unwrap_or("");
        let rest: Vec<&str> = segments.collect();

        if rest.is_empty() {
            self.set(at.line, format!("{head}{first}{tail}"));
            return TextPos::new(at.line, at.column + first.chars().count());
        }

        self.set(at.line, format!("{head}{first}"));
        let mut line = at.line;
        for (i, segment) in rest.iter().enumerate() {
            line += 1;
            if i + 1 == rest.len() {
                self.insert_line(line, format!("{segment}{tail}"));
            } else {
                self.insert_line(line, (*segment).to_owned());
            }
        }
        TextPos::new(line, rest.last().map(|s| s.chars().count()).unwrap_or(0))
    }

    /// Remove the range `from..to`, returning the removed text.
    ///
    /// Positions must be in range with `from ≤ to`; otherwise the store
    /// is unchanged and the result is empty.
    pub fn remove_text(&mut self, from: TextPos, to: TextPos) -> String {
        if from > to
            || to.line >= self.lines.len()
            || from.column > self.line_len(from.line)
            || to.column > self.line_len(to.line)
        {
            return String::new();
        }
        if from.line == to.line {
            let text = self.get(from.line).to_owned();
            let b0 = Self::byte_of_column(&text, from.column);
            let b1 = Self::byte_of_column(&text, to.column);
            let removed = text[b0..b1].to_owned();
            self.set(from.line, format!("{}{}", &text[..b0], &text[b1..]));
            return removed;
        }

        let first = self.get(from.line).to_owned();
        let last = self.get(to.line).to_owned();
        let b0 = Self::byte_of_column(&first, from.column);
        let b1 = Self::byte_of_column(&last, to.column);

        let mut removed = first[b0..].to_owned();
        for mid in from.line + 1..to.line {
            removed.push('\n');
            removed.push_str(self.get(mid));
        }
        removed.push('\n');
        removed.push_str(&last[..b1]);

        self.set(from.line, format!("{}{}", &first[..b0], &last[b1..]));
        for _ in from.line + 1..=to.line {
            self.lines.remove(from.line + 1);
        }
        removed
    }
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}
