//! The editor facade: one `TextEdit` owns the document, cursor,
//! selection, undo log, viewport, and completion state, and is the only
//! write path into the line store.
//!
//! Hosts drive it with input events (see [`crate::input`]), call
//! [`TextEdit::step`] once per frame, and drain the returned signals.
//! `text_changed` and `cursor_changed` are debounced: any number of
//! edits in one frame emits each at most once.

use bitflags::bitflags;
use forge_object::RefPtr;
use tracing::{debug, trace};

use crate::clipboard::{Clipboard, InMemoryClipboard};
use crate::colorizer::RegionColorizer;
use crate::completion::{CompletionEngine, CompletionKind, CompletionOption};
use crate::cursor::{Cursor, Selection};
use crate::events::Point;
use crate::folding::FoldModel;
use crate::highlight::{HighlightCache, HighlighterFn, LineColorMap};
use crate::layout::WrapModel;
use crate::line_store::{LineFlags, LineStore, TextPos};
use crate::undo::{OpKind, TextOperation, UndoLog};
use crate::viewport::ViewportScroller;

/// Capabilities the editor needs from its host shell.
pub trait EditorHost {
    /// Queue a redraw of the editor's viewport.
    fn schedule_redraw(&mut self) {}

    /// Claim keyboard focus for the editor.
    fn grab_focus(&mut self) {}

    /// Show a popup (completion, context menu) at a viewport position.
    fn show_popup_at(&mut self, _position: Point) {}

    /// Resolve a theme resource (font, icon) by name.
    fn theme_resource(&mut self, _name: &str) -> RefPtr {
        RefPtr::default()
    }
}

/// Host that ignores everything; used headless and in tests.
#[derive(Debug, Default)]
pub struct NullHost;

impl EditorHost for NullHost {}

/// Notifications the editor emits, drained from [`TextEdit::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The caret moved. Debounced per frame.
    CursorChanged,
    /// The document changed. Debounced per frame.
    TextChanged,
    /// The host should gather completion candidates.
    RequestCompletion,
    /// A breakpoint was toggled on this line.
    BreakpointToggled(usize),
    /// The user asked to look up a symbol.
    SymbolLookup {
        /// The symbol text.
        symbol: String,
        /// Line of the symbol.
        row: usize,
        /// Column of the symbol.
        column: usize,
    },
    /// The info icon of a line was clicked.
    InfoClicked {
        /// The line.
        row: usize,
        /// The attached info text.
        info: String,
    },
}

bitflags! {
    /// Options for [`TextEdit::search`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SearchFlags: u8 {
        /// Case-sensitive comparison.
        const MATCH_CASE = 1 << 0;
        /// Match only whole words.
        const WHOLE_WORDS = 1 << 1;
        /// Search toward the document start.
        const BACKWARDS = 1 << 2;
    }
}

/// Interactive text-editor core.
pub struct TextEdit {
    pub(crate) store: LineStore,
    pub(crate) colorizer: RegionColorizer,
    pub(crate) highlight_cache: HighlightCache,
    pub(crate) highlighter: Option<HighlighterFn>,
    pub(crate) wrap: WrapModel,
    pub(crate) fold: FoldModel,
    pub(crate) cursor: Cursor,
    pub(crate) selection: Selection,
    pub(crate) undo_log: UndoLog,
    pub(crate) viewport: ViewportScroller,
    pub(crate) completion: CompletionEngine,
    pub(crate) clipboard: Box<dyn Clipboard>,
    pub(crate) host: Box<dyn EditorHost>,

    pub(crate) readonly: bool,
    pub(crate) auto_brace: bool,
    pub(crate) auto_indent: bool,
    pub(crate) overwrite_mode: bool,
    pub(crate) executing_line: Option<usize>,

    pub(crate) focused: bool,
    pub(crate) caret_blink_enabled: bool,
    pub(crate) caret_blink_period: f64,
    pub(crate) caret_blink_timer: f64,
    pub(crate) caret_visible: bool,

    pub(crate) text_changed_dirty: bool,
    pub(crate) cursor_changed_dirty: bool,
    pub(crate) pending_signals: Vec<Signal>,

    pub(crate) drag_caret: Option<TextPos>,
}

impl TextEdit {
    /// An empty editor with an in-memory clipboard and a null host.
    pub fn new() -> Self {
        Self {
            store: LineStore::new(),
            colorizer: RegionColorizer::new(),
            highlight_cache: HighlightCache::new(),
            highlighter: None,
            wrap: WrapModel::new(),
            fold: FoldModel::new(),
            cursor: Cursor::default(),
            selection: Selection::default(),
            undo_log: UndoLog::new(),
            viewport: ViewportScroller::new(),
            completion: CompletionEngine::new(),
            clipboard: Box::new(InMemoryClipboard::new()),
            host: Box::new(NullHost),
            readonly: false,
            auto_brace: false,
            auto_indent: false,
            overwrite_mode: false,
            executing_line: None,
            focused: true,
            caret_blink_enabled: false,
            caret_blink_period: 0.65,
            caret_blink_timer: 0.0,
            caret_visible: true,
            text_changed_dirty: false,
            cursor_changed_dirty: false,
            pending_signals: Vec::new(),
            drag_caret: None,
        }
    }

    /// Replace the clipboard implementation.
    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Replace the host shell.
    pub fn set_host(&mut self, host: Box<dyn EditorHost>) {
        self.host = host;
    }

    // Configuration.

    /// Forbid all mutating operations.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Whether the editor is read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Auto-insert closing pair characters while typing.
    pub fn set_auto_brace(&mut self, enabled: bool) {
        self.auto_brace = enabled;
    }

    /// Copy the previous line's leading whitespace on newline.
    pub fn set_auto_indent(&mut self, enabled: bool) {
        self.auto_indent = enabled;
    }

    /// Toggle insert/overwrite typing.
    pub fn set_overwrite_mode(&mut self, enabled: bool) {
        self.overwrite_mode = enabled;
    }

    /// Mark the line the debugger is paused on, if any.
    pub fn set_executing_line(&mut self, line: Option<usize>) {
        self.executing_line = line.filter(|l| *l < self.store.line_count());
        self.host.schedule_redraw();
    }

    /// The line the debugger is paused on.
    pub fn executing_line(&self) -> Option<usize> {
        self.executing_line
    }

    /// Replace the font metrics used for layout.
    pub fn set_font_metrics(&mut self, metrics: crate::metrics::FontMetrics) {
        self.store.set_metrics(metrics);
        self.host.schedule_redraw();
    }

    /// Tab stop width in spaces.
    pub fn set_indent_size(&mut self, size: usize) {
        self.store.set_indent_size(size);
    }

    /// Enable soft wrapping.
    pub fn set_wrap_enabled(&mut self, enabled: bool) {
        self.wrap.set_enabled(&mut self.store, enabled);
        self.host.schedule_redraw();
    }

    /// Wrap width in pixels.
    pub fn set_wrap_at(&mut self, wrap_at: i32) {
        self.wrap.set_wrap_at(&mut self.store, wrap_at);
        self.host.schedule_redraw();
    }

    /// The visual rows of `line` under the current wrap settings.
    pub fn wrap_rows(&mut self, line: usize) -> Vec<String> {
        self.wrap.wrap_rows(&mut self.store, line)
    }

    /// Allow folding (and line hiding in general).
    pub fn set_hiding_enabled(&mut self, enabled: bool) {
        self.fold.set_hiding_enabled(&mut self.store, enabled);
    }

    /// Whether `line` is hidden by folding.
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.store.is_hidden(line)
    }

    /// Whether `line` is a fold anchor.
    pub fn is_folded(&self, line: usize) -> bool {
        self.fold.is_folded(&self.store, line)
    }

    /// Register a syntax color region on the built-in colorizer.
    pub fn add_color_region(
        &mut self,
        begin_key: &str,
        end_key: &str,
        color: crate::highlight::Color,
        line_only: bool,
    ) -> Result<(), crate::colorizer::RegionError> {
        let result = self.colorizer.add_region(begin_key, end_key, color, line_only);
        self.highlight_cache.invalidate_all();
        result
    }

    /// Register a keyword color on the built-in colorizer.
    pub fn add_keyword_color(&mut self, word: &str, color: crate::highlight::Color) {
        self.colorizer.add_keyword(word, color);
        self.highlight_cache.invalidate_all();
    }

    /// The built-in colorizer, for theme configuration.
    pub fn colorizer(&mut self) -> &mut RegionColorizer {
        &mut self.colorizer
    }

    /// The viewport scroller.
    pub fn viewport(&mut self) -> &mut ViewportScroller {
        &mut self.viewport
    }

    /// Scroll state and row math, with store access for wrap counts.
    pub fn scroll_to_row(&mut self, row: f64) {
        self.viewport.scroll_to(&mut self.store, &self.wrap, row);
    }

    /// Scroll so the caret line sits in the middle of the viewport.
    pub fn center_on_cursor(&mut self) {
        let (line, wrap_index) = (self.cursor.line, self.cursor.wrap_index);
        self.viewport
            .center_visible(&mut self.store, &self.wrap, line, wrap_index);
    }

    /// Whether the completion popup is showing.
    pub fn completion_active(&self) -> bool {
        self.completion.is_active()
    }

    /// The highlighted completion candidate.
    pub fn completion_current(&self) -> Option<&CompletionOption> {
        self.completion.current()
    }

    /// The completion engine, for trigger and hint configuration.
    pub fn completion(&mut self) -> &mut CompletionEngine {
        &mut self.completion
    }

    /// The active selection as `(from, to)`, `None` when inactive.
    pub fn selection_range(&self) -> Option<(TextPos, TextPos)> {
        self.selection
            .active
            .then_some((self.selection.from, self.selection.to))
    }

    /// Attach an info icon and text to `line`.
    pub fn set_line_info(
        &mut self,
        line: usize,
        icon: Option<forge_object::Ref<dyn forge_object::Resource>>,
        info: &str,
    ) {
        self.store.set_line_info(line, icon, info);
        self.host.schedule_redraw();
    }

    // Document access.

    /// Whole document text.
    pub fn text(&self) -> String {
        self.store.as_string()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.store.line_count()
    }

    /// Text of one line.
    pub fn line(&self, index: usize) -> &str {
        self.store.get(index)
    }

    /// Replace the whole document as one undo step; caret moves to the
    /// start.
    pub fn set_text(&mut self, text: &str) {
        if self.readonly {
            return;
        }
        self.begin_complex_operation();
        let last = self.store.line_count() - 1;
        let end = TextPos::new(last, self.store.line_len(last));
        if end != TextPos::default() {
            self.base_remove(TextPos::default(), end);
        }
        self.base_insert(TextPos::default(), text);
        self.end_complex_operation();
        self.selection.clear();
        self.set_cursor(TextPos::default());
    }

    /// Current document version; increases with every edit.
    pub fn version(&self) -> u64 {
        self.undo_log.version()
    }

    /// Mark the current version as saved.
    pub fn tag_saved_version(&mut self) {
        self.undo_log.tag_saved_version();
    }

    /// Whether edits exist since the last saved tag.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.undo_log.is_saved()
    }

    /// Drop all undo/redo history. Versions keep advancing.
    pub fn clear_undo_history(&mut self) {
        self.undo_log.clear_history();
    }

    // Cursor and selection.

    /// Caret position.
    pub fn cursor(&self) -> TextPos {
        self.cursor.pos()
    }

    /// Move the caret, clamping to the document and leaving hidden
    /// lines for the nearest visible one above.
    pub fn set_cursor(&mut self, pos: TextPos) {
        let mut line = pos.line.min(self.store.line_count() - 1);
        while line > 0 && self.store.is_hidden(line) {
            line -= 1;
        }
        let column = pos.column.min(self.store.line_len(line));
        let moved = line != self.cursor.line || column != self.cursor.column;
        self.cursor.line = line;
        self.cursor.column = column;
        self.cursor.wrap_index = self.wrap.wrap_index_at_column(&mut self.store, line, column);
        if moved {
            self.cursor_changed_dirty = true;
            self.reset_caret_blink();
            self.viewport
                .ensure_visible(&mut self.store, &self.wrap, line, self.cursor.wrap_index);
        }
    }

    /// Whether a selection is active.
    pub fn has_selection(&self) -> bool {
        self.selection.active
    }

    /// Select `a..b` in either order.
    pub fn select(&mut self, a: TextPos, b: TextPos) {
        let a = self.clamp_pos(a);
        let b = self.clamp_pos(b);
        self.selection.select(a, b);
        let text = self.selected_text();
        self.clipboard.set_primary(&text);
        self.host.schedule_redraw();
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let last = self.store.line_count() - 1;
        let end = TextPos::new(last, self.store.line_len(last));
        self.select(TextPos::default(), end);
        self.set_cursor(end);
    }

    /// Drop the selection.
    pub fn deselect(&mut self) {
        self.selection.clear();
        self.host.schedule_redraw();
    }

    /// The selected text, empty without a selection.
    pub fn selected_text(&self) -> String {
        if !self.selection.active {
            return String::new();
        }
        self.text_in_range(self.selection.from, self.selection.to)
    }

    /// Text covered by `from..to`.
    pub fn text_in_range(&self, from: TextPos, to: TextPos) -> String {
        if from > to || to.line >= self.store.line_count() {
            return String::new();
        }
        if from.line == to.line {
            let text = self.store.get(from.line);
            let b0 = LineStore::byte_of_column(text, from.column);
            let b1 = LineStore::byte_of_column(text, to.column);
            return text[b0..b1].to_owned();
        }
        let mut out = String::new();
        let first = self.store.get(from.line);
        out.push_str(&first[LineStore::byte_of_column(first, from.column)..]);
        for line in from.line + 1..to.line {
            out.push('\n');
            out.push_str(self.store.get(line));
        }
        out.push('\n');
        let last = self.store.get(to.line);
        out.push_str(&last[..LineStore::byte_of_column(last, to.column)]);
        out
    }

    fn clamp_pos(&self, pos: TextPos) -> TextPos {
        let line = pos.line.min(self.store.line_count() - 1);
        TextPos::new(line, pos.column.min(self.store.line_len(line)))
    }

    // Editing.

    /// Bracket edits so they undo and redo as one step.
    pub fn begin_complex_operation(&mut self) {
        self.undo_log.begin_complex_operation();
    }

    /// Close the bracket opened by [`TextEdit::begin_complex_operation`].
    pub fn end_complex_operation(&mut self) {
        self.undo_log.end_complex_operation();
    }

    /// Insert `text` at the caret, replacing the selection if any.
    pub fn insert_text_at_cursor(&mut self, text: &str) {
        if self.readonly {
            return;
        }
        if self.selection.active {
            self.begin_complex_operation();
            self.remove_selection();
            let end = self.base_insert(self.cursor.pos(), text);
            self.end_complex_operation();
            self.set_cursor(end);
        } else {
            let end = self.base_insert(self.cursor.pos(), text);
            self.set_cursor(end);
        }
    }

    /// Remove the selected range and collapse the caret onto it.
    pub fn remove_selection(&mut self) {
        if self.readonly || !self.selection.active {
            return;
        }
        let (from, to) = (self.selection.from, self.selection.to);
        self.base_remove(from, to);
        self.selection.clear();
        self.set_cursor(from);
    }

    /// Delete one character (or the selection) before the caret.
    pub fn backspace(&mut self) {
        if self.readonly {
            return;
        }
        if self.selection.active {
            self.remove_selection();
            return;
        }
        let pos = self.cursor.pos();
        if pos == TextPos::default() {
            return;
        }
        let from = if pos.column > 0 {
            TextPos::new(pos.line, pos.column - 1)
        } else {
            let prev = pos.line - 1;
            TextPos::new(prev, self.store.line_len(prev))
        };
        self.base_remove(from, pos);
        self.set_cursor(from);
    }

    /// Delete one character (or the selection) after the caret.
    pub fn delete_char(&mut self) {
        if self.readonly {
            return;
        }
        if self.selection.active {
            self.remove_selection();
            return;
        }
        let pos = self.cursor.pos();
        let to = if pos.column < self.store.line_len(pos.line) {
            TextPos::new(pos.line, pos.column + 1)
        } else if pos.line + 1 < self.store.line_count() {
            TextPos::new(pos.line + 1, 0)
        } else {
            return;
        };
        self.base_remove(pos, to);
    }

    /// Swap lines `a` and `b` as one undo step.
    pub fn swap_lines(&mut self, a: usize, b: usize) {
        if self.readonly
            || a == b
            || a >= self.store.line_count()
            || b >= self.store.line_count()
        {
            return;
        }
        let text_a = self.store.get(a).to_owned();
        let text_b = self.store.get(b).to_owned();
        self.begin_complex_operation();
        self.replace_line(a, &text_b);
        self.replace_line(b, &text_a);
        self.end_complex_operation();
    }

    fn replace_line(&mut self, line: usize, text: &str) {
        let end = TextPos::new(line, self.store.line_len(line));
        let start = TextPos::new(line, 0);
        if start != end {
            self.base_remove(start, end);
        }
        if !text.is_empty() {
            self.base_insert(start, text);
        }
    }

    /// Indent the selected lines (or the caret line) one level.
    pub fn indent_right(&mut self) {
        if self.readonly {
            return;
        }
        let (first, last) = self.edit_line_range();
        self.begin_complex_operation();
        for line in first..=last {
            self.base_insert(TextPos::new(line, 0), "\t");
        }
        self.end_complex_operation();
        if self.selection.active {
            let (from, to) = (self.selection.from, self.selection.to);
            self.select(
                TextPos::new(from.line, from.column + 1),
                TextPos::new(to.line, to.column + 1),
            );
        }
        let pos = self.cursor.pos();
        self.set_cursor(TextPos::new(pos.line, pos.column + 1));
    }

    /// Unindent the selected lines (or the caret line) one level.
    pub fn indent_left(&mut self) {
        if self.readonly {
            return;
        }
        let (first, last) = self.edit_line_range();
        let indent_size = self.store.indent_size();
        self.begin_complex_operation();
        let mut removed_any = false;
        for line in first..=last {
            let text = self.store.get(line);
            let drop = if text.starts_with('\t') {
                1
            } else {
                text.chars().take(indent_size).take_while(|c| *c == ' ').count()
            };
            if drop > 0 {
                self.base_remove(TextPos::new(line, 0), TextPos::new(line, drop));
                removed_any = true;
            }
        }
        self.end_complex_operation();
        if removed_any {
            let pos = self.cursor.pos();
            self.set_cursor(TextPos::new(pos.line, pos.column.saturating_sub(1)));
        }
    }

    fn edit_line_range(&self) -> (usize, usize) {
        if self.selection.active {
            (self.selection.from.line, self.selection.to.line)
        } else {
            (self.cursor.line, self.cursor.line)
        }
    }

    // Clipboard.

    /// Copy the selection, or the caret line when nothing is selected.
    pub fn copy(&mut self) {
        if self.selection.active {
            let text = self.selected_text();
            self.clipboard.set(&text);
        } else {
            let mut line = self.store.get(self.cursor.line).to_owned();
            line.push('\n');
            self.clipboard.set(&line);
        }
    }

    /// Copy then remove the selection (or the caret line).
    pub fn cut(&mut self) {
        if self.readonly {
            return;
        }
        self.copy();
        if self.selection.active {
            self.remove_selection();
        } else {
            let line = self.cursor.line;
            let (from, to) = if line + 1 < self.store.line_count() {
                (TextPos::new(line, 0), TextPos::new(line + 1, 0))
            } else {
                (TextPos::new(line, 0), TextPos::new(line, self.store.line_len(line)))
            };
            self.base_remove(from, to);
            self.set_cursor(TextPos::new(from.line.min(self.store.line_count() - 1), 0));
        }
    }

    /// Insert the clipboard contents at the caret.
    pub fn paste(&mut self) {
        if self.readonly {
            return;
        }
        let text = self.clipboard.get();
        if !text.is_empty() {
            self.insert_text_at_cursor(&text);
        }
    }

    // Undo and redo.

    /// Undo one step. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        let Some(steps) = self.undo_log.undo() else {
            return false;
        };
        self.selection.clear();
        for op in &steps {
            self.apply_op(op, true);
        }
        if let Some(op) = steps.last().cloned() {
            match op.kind {
                OpKind::Remove => self.set_cursor(op.to),
                OpKind::Insert => self.set_cursor(op.from),
            }
            // Undoing a plain multi-character remove re-inserts its text;
            // leave that text selected. Single-character ops keep the
            // selection untouched elsewhere.
            if steps.len() == 1
                && op.kind == OpKind::Remove
                && (op.from.line != op.to.line || op.to.column > op.from.column + 1)
            {
                self.select(op.from, op.to);
            }
        }
        debug!(target: "forge_edit::editor", version = self.version(), "undo");
        true
    }

    /// Redo one step. Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        let Some(steps) = self.undo_log.redo() else {
            return false;
        };
        self.selection.clear();
        for op in &steps {
            self.apply_op(op, false);
        }
        if let Some(op) = steps.last() {
            self.set_cursor(op.to);
        }
        debug!(target: "forge_edit::editor", version = self.version(), "redo");
        true
    }

    // Applies a recorded op without re-recording it.
    fn apply_op(&mut self, op: &TextOperation, invert: bool) {
        let insert = (op.kind == OpKind::Insert) != invert;
        if insert {
            self.store.insert_text(op.from, &op.text);
        } else {
            self.store.remove_text(op.from, op.to);
        }
        self.after_edit(op.from.line);
    }

    // The two recording write paths.

    pub(crate) fn base_insert(&mut self, at: TextPos, text: &str) -> TextPos {
        if text.is_empty() {
            return at;
        }
        let end = self.store.insert_text(at, text);
        if end == at {
            return at;
        }
        self.undo_log.record_insert(at, end, text);
        self.after_edit(at.line);
        end
    }

    pub(crate) fn base_remove(&mut self, from: TextPos, to: TextPos) -> String {
        let removed = self.store.remove_text(from, to);
        if removed.is_empty() {
            return removed;
        }
        self.undo_log.record_remove(from, to, removed.clone());
        self.after_edit(from.line);
        removed
    }

    fn after_edit(&mut self, line: usize) {
        self.colorizer.invalidate_from(line);
        self.highlight_cache.invalidate_from(line);
        self.text_changed_dirty = true;
        self.host.schedule_redraw();
        trace!(target: "forge_edit::editor", line, version = self.undo_log.version(), "edit");
    }

    // Search.

    /// Find `key` starting from `from`, wrapping around the document.
    pub fn search(&self, key: &str, flags: SearchFlags, from: TextPos) -> Option<TextPos> {
        if key.is_empty() {
            return None;
        }
        let key_chars: Vec<char> = if flags.contains(SearchFlags::MATCH_CASE) {
            key.chars().collect()
        } else {
            key.to_lowercase().chars().collect()
        };
        let count = self.store.line_count();
        let backwards = flags.contains(SearchFlags::BACKWARDS);
        for offset in 0..=count {
            let line = if backwards {
                (from.line + count - (offset % count)) % count
            } else {
                (from.line + offset) % count
            };
            let chars: Vec<char> = if flags.contains(SearchFlags::MATCH_CASE) {
                self.store.get(line).chars().collect()
            } else {
                self.store.get(line).to_lowercase().chars().collect()
            };
            let starts: Vec<usize> = if chars.len() >= key_chars.len() {
                (0..=chars.len() - key_chars.len())
                    .filter(|&s| {
                        chars[s..s + key_chars.len()] == key_chars[..]
                            && (!flags.contains(SearchFlags::WHOLE_WORDS)
                                || Self::word_bounded(&chars, s, s + key_chars.len()))
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let found = if backwards {
                let limit = if offset == 0 { from.column } else { chars.len() + 1 };
                starts.into_iter().rev().find(|&s| s < limit)
            } else {
                let start_col = if offset == 0 { from.column } else { 0 };
                starts.into_iter().find(|&s| s >= start_col)
            };
            if let Some(column) = found {
                return Some(TextPos::new(line, column));
            }
        }
        None
    }

    fn word_bounded(chars: &[char], start: usize, end: usize) -> bool {
        let word = |c: char| c.is_alphanumeric() || c == '_';
        (start == 0 || !word(chars[start - 1])) && (end >= chars.len() || !word(chars[end]))
    }

    // Folding with cursor and selection edge policies.

    /// Whether `line` can fold.
    pub fn can_fold(&self, line: usize) -> bool {
        self.fold.can_fold(&self.store, line)
    }

    /// Fold `line`, clipping the selection and pulling the caret out of
    /// the hidden range.
    pub fn fold_line(&mut self, line: usize) {
        let Some((first, last)) = self.fold.fold_line(&mut self.store, line) else {
            return;
        };
        let anchor = TextPos::new(line, self.store.line_len(line));
        if (first..=last).contains(&self.cursor.line) {
            self.set_cursor(anchor);
        }
        if self.selection.active {
            let from_hidden = (first..=last).contains(&self.selection.from.line);
            let to_hidden = (first..=last).contains(&self.selection.to.line);
            if from_hidden && to_hidden {
                self.selection.clear();
            } else if from_hidden {
                let to = self.selection.to;
                self.select(anchor, to);
            } else if to_hidden {
                let from = self.selection.from;
                self.select(from, anchor);
            }
        }
        self.host.schedule_redraw();
    }

    /// Unfold at `line`.
    pub fn unfold_line(&mut self, line: usize) {
        self.fold.unfold_line(&mut self.store, line);
        self.host.schedule_redraw();
    }

    /// Fold or unfold `line`.
    pub fn toggle_fold(&mut self, line: usize) {
        if self.fold.is_folded(&self.store, line) {
            self.unfold_line(line);
        } else {
            self.fold_line(line);
        }
    }

    /// Unhide every line.
    pub fn unhide_all(&mut self) {
        self.store.unhide_all();
        self.host.schedule_redraw();
    }

    // Gutter flags.

    /// Toggle a breakpoint on `line` and emit `BreakpointToggled`.
    pub fn toggle_breakpoint(&mut self, line: usize) {
        if line >= self.store.line_count() {
            return;
        }
        let set = !self.store.line_flags(line).contains(LineFlags::BREAKPOINT);
        self.store.set_line_flag(line, LineFlags::BREAKPOINT, set);
        self.pending_signals.push(Signal::BreakpointToggled(line));
        self.host.schedule_redraw();
    }

    /// Lines with a breakpoint set.
    pub fn breakpoints(&self) -> Vec<usize> {
        (0..self.store.line_count())
            .filter(|&l| self.store.line_flags(l).contains(LineFlags::BREAKPOINT))
            .collect()
    }

    /// Toggle a bookmark on `line`.
    pub fn toggle_bookmark(&mut self, line: usize) {
        if line >= self.store.line_count() {
            return;
        }
        let set = !self.store.line_flags(line).contains(LineFlags::BOOKMARK);
        self.store.set_line_flag(line, LineFlags::BOOKMARK, set);
        self.host.schedule_redraw();
    }

    /// Lines with a bookmark set.
    pub fn bookmarks(&self) -> Vec<usize> {
        (0..self.store.line_count())
            .filter(|&l| self.store.line_flags(l).contains(LineFlags::BOOKMARK))
            .collect()
    }

    /// Emit `InfoClicked` for the info icon on `line`, if present.
    pub fn click_line_info(&mut self, line: usize) {
        if let Some((_, info)) = self.store.line_info(line) {
            let info = info.to_owned();
            self.pending_signals.push(Signal::InfoClicked { row: line, info });
        }
    }

    /// Emit `SymbolLookup` for the word under `pos`.
    pub fn lookup_symbol_at(&mut self, pos: TextPos) {
        let pos = self.clamp_pos(pos);
        let text = self.store.get(pos.line);
        let (begin, end) = crate::cursor::word_range_at(text, pos.column);
        if begin == end {
            return;
        }
        let symbol: String = text.chars().skip(begin).take(end - begin).collect();
        self.pending_signals.push(Signal::SymbolLookup {
            symbol,
            row: pos.line,
            column: begin,
        });
    }

    // Syntax highlighting.

    /// Install a custom per-line color provider, or `None` to use the
    /// built-in region colorizer.
    pub fn set_highlighter(&mut self, highlighter: Option<HighlighterFn>) {
        self.highlighter = highlighter;
        self.highlight_cache.invalidate_all();
    }

    /// The color map for `line`, cached until the line edits.
    pub fn line_colors(&mut self, line: usize) -> LineColorMap {
        if let Some(cached) = self.highlight_cache.get(line) {
            return cached.clone();
        }
        let map = match &mut self.highlighter {
            Some(hook) => hook(line, self.store.get(line)),
            None => self.colorizer.colorize(&self.store, line),
        };
        self.highlight_cache.put(line, map.clone());
        map
    }

    // Completion.

    /// Ask the host for candidates (emits `RequestCompletion`).
    pub fn request_completion(&mut self) {
        self.pending_signals.push(Signal::RequestCompletion);
    }

    /// The word fragment before the caret used as the completion base.
    pub fn completion_base(&self) -> String {
        let text = self.store.get(self.cursor.line);
        let chars: Vec<char> = text.chars().collect();
        let mut begin = self.cursor.column.min(chars.len());
        while begin > 0 {
            let c = chars[begin - 1];
            if c.is_alphanumeric() || c == '_' {
                begin -= 1;
            } else {
                break;
            }
        }
        chars[begin..self.cursor.column.min(chars.len())].iter().collect()
    }

    /// Open the completion popup over `sources`.
    pub fn begin_completion(&mut self, sources: Vec<CompletionOption>) {
        let base = self.completion_base();
        if self.completion.begin(sources, &base) {
            self.host.show_popup_at(Point::default());
        }
    }

    /// Insert the highlighted candidate with pair-aware fixups.
    pub fn confirm_completion(&mut self) {
        if self.readonly {
            return;
        }
        let Some(option) = self.completion.current().cloned() else {
            return;
        };
        let base_len = self.completion.base().chars().count();
        self.begin_complex_operation();
        let caret = self.cursor.pos();
        let from = TextPos::new(caret.line, caret.column - base_len.min(caret.column));
        self.base_remove(from, caret);
        let mut end = self.base_insert(from, &option.insert_text);

        if let Some(last) = option.insert_text.chars().last() {
            let line_text = self.store.get(end.line).to_owned();
            let next = line_text.chars().nth(end.column);
            if matches!(last, '"' | '\'') && next == Some(last) {
                // The closing quote already exists; drop the duplicate.
                self.base_remove(end, TextPos::new(end.line, end.column + 1));
            } else if last == '(' && next == Some('(') {
                self.base_remove(end, TextPos::new(end.line, end.column + 1));
            } else if option.kind == CompletionKind::Function && next != Some('(') {
                let with_parens = if self.auto_brace { "()" } else { "(" };
                end = self.base_insert(end, with_parens);
                if self.auto_brace {
                    // Land between the parens.
                    end = TextPos::new(end.line, end.column - 1);
                }
            }
        }
        self.end_complex_operation();
        self.set_cursor(end);
        self.completion.cancel();
    }

    /// Close the popup without inserting.
    pub fn cancel_completion(&mut self) {
        self.completion.cancel();
        self.host.schedule_redraw();
    }

    // Frame step.

    /// Focus change: caret blink stops unfocused, completion cancels.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.completion.cancel();
            self.caret_visible = false;
        } else {
            self.reset_caret_blink();
        }
        self.host.schedule_redraw();
    }

    /// Blink the caret at `period` seconds, or disable with `None`.
    pub fn set_caret_blink(&mut self, period: Option<f64>) {
        match period {
            Some(p) => {
                self.caret_blink_enabled = true;
                self.caret_blink_period = p.max(0.01);
            }
            None => {
                self.caret_blink_enabled = false;
                self.caret_visible = true;
            }
        }
    }

    /// Whether the caret is currently drawn.
    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    pub(crate) fn reset_caret_blink(&mut self) {
        self.caret_blink_timer = 0.0;
        self.caret_visible = true;
    }

    /// Advance timers and drain this frame's signals.
    ///
    /// Debounced `TextChanged`/`CursorChanged` are emitted here at most
    /// once each, after any immediate signals queued by the frame's
    /// input.
    pub fn step(&mut self, dt: f64) -> Vec<Signal> {
        if self.caret_blink_enabled && self.focused {
            self.caret_blink_timer += dt;
            if self.caret_blink_timer >= self.caret_blink_period {
                self.caret_blink_timer = 0.0;
                self.caret_visible = !self.caret_visible;
                self.host.schedule_redraw();
            }
        }
        if !self.viewport.smooth_scroll_step(dt) {
            self.host.schedule_redraw();
        }

        let mut signals = std::mem::take(&mut self.pending_signals);
        if self.text_changed_dirty {
            self.text_changed_dirty = false;
            signals.push(Signal::TextChanged);
        }
        if self.cursor_changed_dirty {
            self.cursor_changed_dirty = false;
            signals.push(Signal::CursorChanged);
        }
        signals
    }
}

impl Default for TextEdit {
    fn default() -> Self {
        Self::new()
    }
}
