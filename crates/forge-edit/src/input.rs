//! Key, mouse, and gesture routing into the editor.
//!
//! Precedence per key press: completion popup keys, then shortcuts,
//! then navigation, then character insertion. Unhandled events return
//! `false` so the host can propagate them to its parent control.

use crate::cursor::{next_word_column, prev_word_column, word_range_at, SelectionMode};
use crate::editor::TextEdit;
use crate::events::{
    ButtonMask, InputEvent, KeyEvent, Keycode, Modifiers, MouseButton, MouseButtonEvent,
    MouseMotionEvent, PanEvent, Point,
};
use crate::line_store::TextPos;

// Rows moved per wheel notch.
const WHEEL_SCROLL_ROWS: f64 = 3.0;
// Candidates skipped by PageUp/PageDown in the completion popup.
const COMPLETION_PAGE: isize = 10;

impl TextEdit {
    /// Route any input event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key(ev) => self.handle_key(ev),
            InputEvent::MouseButton(ev) => self.handle_mouse_button(ev),
            InputEvent::MouseMotion(ev) => self.handle_mouse_motion(ev),
            InputEvent::Pan(ev) => self.handle_pan(ev),
        }
    }

    /// Route a key event.
    pub fn handle_key(&mut self, ev: KeyEvent) -> bool {
        if !ev.pressed {
            return false;
        }
        let consumed = if self.completion.is_active() && self.handle_completion_key(&ev) {
            true
        } else if self.handle_shortcut(&ev) {
            true
        } else if self.handle_navigation(&ev) {
            true
        } else {
            self.handle_insertion(&ev)
        };
        if consumed {
            self.reset_caret_blink();
        }
        consumed
    }

    // Popup keys while completion is showing.
    fn handle_completion_key(&mut self, ev: &KeyEvent) -> bool {
        match ev.keycode {
            Keycode::Up => self.completion.move_index(-1),
            Keycode::Down => self.completion.move_index(1),
            Keycode::PageUp => self.completion.move_index(-COMPLETION_PAGE),
            Keycode::PageDown => self.completion.move_index(COMPLETION_PAGE),
            Keycode::Home => self.completion.move_index_to_end(true),
            Keycode::End => self.completion.move_index_to_end(false),
            Keycode::Enter | Keycode::Tab => self.confirm_completion(),
            Keycode::Escape => self.cancel_completion(),
            Keycode::Backspace => {
                self.backspace();
                let base = self.completion_base();
                self.completion.update_base(&base);
            }
            _ => return false,
        }
        true
    }

    fn handle_shortcut(&mut self, ev: &KeyEvent) -> bool {
        if !ev.command() {
            return false;
        }
        let shift = ev.modifiers.contains(Modifiers::SHIFT);
        match ev.keycode {
            Keycode::Char('x') => self.cut(),
            Keycode::Char('c') => self.copy(),
            Keycode::Char('v') => self.paste(),
            Keycode::Char('z') if shift => {
                self.redo();
            }
            Keycode::Char('z') => {
                self.undo();
            }
            Keycode::Char('y') => {
                self.redo();
            }
            Keycode::Char('a') => self.select_all(),
            Keycode::Char(' ') => self.request_completion(),
            _ => return false,
        }
        true
    }

    fn handle_navigation(&mut self, ev: &KeyEvent) -> bool {
        let shift = ev.modifiers.contains(Modifiers::SHIFT);
        let word = ev.command();
        let before = self.cursor.pos();

        match ev.keycode {
            Keycode::Left => self.cursor_left(shift, word),
            Keycode::Right => self.cursor_right(shift, word),
            Keycode::Up => self.cursor_vertical(-1),
            Keycode::Down => self.cursor_vertical(1),
            Keycode::PageUp => self.cursor_page(-1),
            Keycode::PageDown => self.cursor_page(1),
            Keycode::Home if word => self.set_cursor(TextPos::default()),
            Keycode::Home => self.cursor_home(),
            Keycode::End if word => {
                let last = self.store.line_count() - 1;
                let end = TextPos::new(last, self.store.line_len(last));
                self.set_cursor(end);
            }
            Keycode::End => {
                let line = self.cursor.line;
                self.set_cursor(TextPos::new(line, self.store.line_len(line)));
            }
            Keycode::Escape => {
                if self.has_selection() {
                    self.deselect();
                    self.selection.mode = SelectionMode::None;
                } else {
                    return false;
                }
            }
            _ => return false,
        }

        if matches!(
            ev.keycode,
            Keycode::Left
                | Keycode::Right
                | Keycode::Up
                | Keycode::Down
                | Keycode::PageUp
                | Keycode::PageDown
                | Keycode::Home
                | Keycode::End
        ) {
            self.extend_or_drop_selection(shift, before);
        }
        true
    }

    // Shift extends the selection across the move; a bare move drops it.
    fn extend_or_drop_selection(&mut self, shift: bool, before: TextPos) {
        if shift {
            let anchor = if self.selection.active {
                self.selection.anchor
            } else {
                before
            };
            self.select(anchor, self.cursor.pos());
            self.selection.mode = SelectionMode::Shift;
        } else if self.selection.active {
            self.deselect();
            self.selection.mode = SelectionMode::None;
        }
    }

    fn cursor_left(&mut self, shift: bool, word: bool) {
        if self.selection.active && !shift && !word {
            let from = self.selection.from;
            self.set_cursor(from);
            return;
        }
        let pos = self.cursor.pos();
        let target = if pos.column > 0 {
            let column = if word {
                prev_word_column(self.store.get(pos.line), pos.column)
            } else {
                pos.column - 1
            };
            TextPos::new(pos.line, column)
        } else if let Some(prev) = self.prev_visible_line(pos.line) {
            TextPos::new(prev, self.store.line_len(prev))
        } else {
            return;
        };
        self.set_cursor(target);
        self.cursor.last_fit_x = self.caret_x();
    }

    fn cursor_right(&mut self, shift: bool, word: bool) {
        if self.selection.active && !shift && !word {
            let to = self.selection.to;
            self.set_cursor(to);
            return;
        }
        let pos = self.cursor.pos();
        let len = self.store.line_len(pos.line);
        let target = if pos.column < len {
            let column = if word {
                next_word_column(self.store.get(pos.line), pos.column)
            } else {
                pos.column + 1
            };
            TextPos::new(pos.line, column)
        } else if let Some(next) = self.next_visible_line(pos.line) {
            TextPos::new(next, 0)
        } else {
            return;
        };
        self.set_cursor(target);
        self.cursor.last_fit_x = self.caret_x();
    }

    // Up/Down moves by wrap row first, then by visible line, landing on
    // the column nearest the remembered x.
    fn cursor_vertical(&mut self, dir: isize) {
        if self.cursor.last_fit_x == 0 {
            self.cursor.last_fit_x = self.caret_x();
        }
        let fit_x = self.cursor.last_fit_x;
        let line = self.cursor.line;
        let wrap_index = self.cursor.wrap_index;

        let target = if dir < 0 {
            if wrap_index > 0 {
                Some((line, wrap_index - 1))
            } else {
                self.prev_visible_line(line)
                    .map(|prev| (prev, self.wrap.line_wrap_count(&mut self.store, prev)))
            }
        } else if wrap_index < self.wrap.line_wrap_count(&mut self.store, line) {
            Some((line, wrap_index + 1))
        } else {
            self.next_visible_line(line).map(|next| (next, 0))
        };
        let Some((target_line, target_wrap)) = target else {
            return;
        };
        let column = self.column_at_x(target_line, target_wrap, fit_x);
        self.set_cursor(TextPos::new(target_line, column));
        self.cursor.wrap_index = target_wrap;
        self.cursor.last_fit_x = fit_x;
    }

    fn cursor_page(&mut self, dir: isize) {
        let rows = self.viewport.visible_rows() as isize;
        if self.cursor.last_fit_x == 0 {
            self.cursor.last_fit_x = self.caret_x();
        }
        let fit_x = self.cursor.last_fit_x;
        let (line, wrap_index) = (self.cursor.line, self.cursor.wrap_index);
        let (traversed, target_wrap) = self.viewport.num_lines_from_rows(
            &mut self.store,
            &self.wrap,
            line,
            wrap_index,
            dir * rows,
        );
        let target_line = if dir > 0 {
            (line + traversed.saturating_sub(1)).min(self.store.line_count() - 1)
        } else {
            line.saturating_sub(traversed.saturating_sub(1))
        };
        let column = self.column_at_x(target_line, target_wrap, fit_x);
        self.set_cursor(TextPos::new(target_line, column));
        self.cursor.last_fit_x = fit_x;
    }

    // Home toggles between the first non-whitespace column and column 0.
    fn cursor_home(&mut self) {
        let line = self.cursor.line;
        let first = self.store.first_non_whitespace_column(line);
        let column = if self.cursor.column == first { 0 } else { first };
        self.set_cursor(TextPos::new(line, column));
        self.cursor.last_fit_x = self.caret_x();
    }

    fn handle_insertion(&mut self, ev: &KeyEvent) -> bool {
        match ev.keycode {
            Keycode::Backspace => {
                if ev.command() && !self.has_selection() {
                    let pos = self.cursor.pos();
                    if pos.column > 0 {
                        let start = prev_word_column(self.store.get(pos.line), pos.column);
                        self.base_remove(TextPos::new(pos.line, start), pos);
                        self.set_cursor(TextPos::new(pos.line, start));
                        return true;
                    }
                }
                self.backspace();
                true
            }
            Keycode::Delete => {
                self.delete_char();
                true
            }
            Keycode::Enter => {
                self.insert_newline();
                true
            }
            Keycode::Tab => {
                if self.has_selection() {
                    if ev.modifiers.contains(Modifiers::SHIFT) {
                        self.indent_left();
                    } else {
                        self.indent_right();
                    }
                } else if ev.modifiers.contains(Modifiers::SHIFT) {
                    self.indent_left();
                } else {
                    self.insert_char('\t');
                }
                true
            }
            Keycode::Insert => {
                let overwrite = !self.overwrite_mode;
                self.set_overwrite_mode(overwrite);
                true
            }
            _ => {
                if let Some(c) = ev.unicode
                    && !ev.command()
                    && !c.is_control()
                {
                    self.insert_char(c);
                    return true;
                }
                false
            }
        }
    }

    fn insert_newline(&mut self) {
        if self.readonly {
            return;
        }
        let mut text = "\n".to_owned();
        if self.auto_indent {
            let line = self.store.get(self.cursor.line);
            let lead: String = line
                .chars()
                .take(self.cursor.column)
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            text.push_str(&lead);
        }
        self.insert_text_at_cursor(&text);
    }

    /// Type one character at the caret, honoring overwrite and
    /// auto-brace modes.
    pub fn insert_char(&mut self, c: char) {
        if self.readonly {
            return;
        }
        let pos = self.cursor.pos();
        let next = self.store.get(pos.line).chars().nth(pos.column);

        if self.auto_brace && !self.has_selection() {
            // Typing the closing half over an identical pending one just
            // steps across it.
            if matches!(c, ')' | ']' | '}' | '"' | '\'') && next == Some(c) {
                self.set_cursor(TextPos::new(pos.line, pos.column + 1));
                return;
            }
            if let Some(close) = match c {
                '(' => Some(')'),
                '[' => Some(']'),
                '{' => Some('}'),
                '"' => Some('"'),
                '\'' => Some('\''),
                _ => None,
            } {
                let mut pair = String::new();
                pair.push(c);
                pair.push(close);
                self.insert_text_at_cursor(&pair);
                let after = self.cursor.pos();
                self.set_cursor(TextPos::new(after.line, after.column - 1));
                self.after_typing(c);
                return;
            }
        }

        if self.overwrite_mode && !self.has_selection() && next.is_some() {
            self.begin_complex_operation();
            self.base_remove(pos, TextPos::new(pos.line, pos.column + 1));
            let end = self.base_insert(pos, &c.to_string());
            self.end_complex_operation();
            self.set_cursor(end);
        } else {
            self.insert_text_at_cursor(&c.to_string());
        }
        self.after_typing(c);
    }

    fn after_typing(&mut self, _c: char) {
        if self.completion.is_active() {
            let base = self.completion_base();
            self.completion.update_base(&base);
        } else {
            let pos = self.cursor.pos();
            let text = self.store.get(pos.line);
            let head: String = text.chars().take(pos.column).collect();
            if self.completion.is_trigger(&head) {
                self.request_completion();
            }
        }
    }

    // Mouse.

    fn handle_mouse_button(&mut self, ev: MouseButtonEvent) -> bool {
        match ev.button {
            MouseButton::WheelUp | MouseButton::WheelDown => {
                let dir = if ev.button == MouseButton::WheelUp { -1.0 } else { 1.0 };
                let target =
                    self.viewport.v_scroll() + dir * WHEEL_SCROLL_ROWS * ev.factor as f64;
                self.viewport.scroll_to(&mut self.store, &self.wrap, target);
                true
            }
            MouseButton::Left if ev.pressed => {
                self.host.grab_focus();
                let pos = self.position_at_pixel(ev.position);
                match ev.clicks {
                    2 => self.begin_word_selection(pos),
                    n if n >= 3 => self.begin_line_selection(pos),
                    _ => self.begin_pointer_selection(pos, ev.modifiers),
                }
                true
            }
            MouseButton::Left => {
                self.finish_drag_and_drop(ev);
                true
            }
            MouseButton::Middle if ev.pressed => {
                let pos = self.position_at_pixel(ev.position);
                self.set_cursor(pos);
                self.deselect();
                let text = self.clipboard.get_primary();
                if !text.is_empty() {
                    self.insert_text_at_cursor(&text);
                }
                true
            }
            MouseButton::Right if ev.pressed => {
                let pos = self.position_at_pixel(ev.position);
                if !self.selection.contains(pos) {
                    self.set_cursor(pos);
                    self.deselect();
                }
                self.host.show_popup_at(ev.position);
                true
            }
            _ => false,
        }
    }

    fn begin_pointer_selection(&mut self, pos: TextPos, modifiers: Modifiers) {
        if modifiers.contains(Modifiers::SHIFT) {
            let anchor = if self.selection.active {
                self.selection.anchor
            } else {
                self.cursor.pos()
            };
            self.set_cursor(pos);
            self.select(anchor, pos);
            self.selection.mode = SelectionMode::Shift;
            return;
        }
        if self.selection.contains(pos) {
            // A drag from inside the selection starts drag-and-drop; the
            // click resolves on release if no drag happens.
            self.drag_caret = Some(pos);
            return;
        }
        self.set_cursor(pos);
        self.deselect();
        self.selection.mode = SelectionMode::Pointer;
        self.selection.anchor = pos;
    }

    fn begin_word_selection(&mut self, pos: TextPos) {
        let (begin, end) = word_range_at(self.store.get(pos.line), pos.column);
        self.selection.word_begin = begin;
        self.selection.word_end = end;
        self.selection.word_origin_line = pos.line;
        self.select(TextPos::new(pos.line, begin), TextPos::new(pos.line, end));
        self.selection.mode = SelectionMode::Word;
        self.set_cursor(TextPos::new(pos.line, end));
    }

    fn begin_line_selection(&mut self, pos: TextPos) {
        let end = self.line_selection_end(pos.line);
        self.select(TextPos::new(pos.line, 0), end);
        self.selection.mode = SelectionMode::Line;
        self.set_cursor(end);
    }

    fn line_selection_end(&self, line: usize) -> TextPos {
        if line + 1 < self.store.line_count() {
            TextPos::new(line + 1, 0)
        } else {
            TextPos::new(line, self.store.line_len(line))
        }
    }

    fn handle_mouse_motion(&mut self, ev: MouseMotionEvent) -> bool {
        if !ev.mask.contains(ButtonMask::LEFT) {
            return false;
        }
        let pos = self.position_at_pixel(ev.position);
        if self.drag_caret.is_some() {
            // Dragging the selection: move the drop preview caret.
            self.drag_caret = Some(pos);
            self.host.schedule_redraw();
            return true;
        }
        match self.selection.mode {
            SelectionMode::Pointer | SelectionMode::Shift => {
                let anchor = self.selection.anchor;
                self.set_cursor(pos);
                self.select(anchor, pos);
                self.selection.mode = SelectionMode::Pointer;
            }
            SelectionMode::Word => {
                let origin_line = self.selection.word_origin_line;
                let (word_begin, word_end) =
                    (self.selection.word_begin, self.selection.word_end);
                let (begin, end) = word_range_at(self.store.get(pos.line), pos.column);
                let origin_start = TextPos::new(origin_line, word_begin);
                let origin_end = TextPos::new(origin_line, word_end);
                if pos < origin_start {
                    self.select(TextPos::new(pos.line, begin), origin_end);
                    self.set_cursor(TextPos::new(pos.line, begin));
                } else {
                    self.select(origin_start, TextPos::new(pos.line, end));
                    self.set_cursor(TextPos::new(pos.line, end));
                }
                self.selection.mode = SelectionMode::Word;
            }
            SelectionMode::Line => {
                let anchor_line = self.selection.anchor.line;
                if pos.line < anchor_line {
                    let end = self.line_selection_end(anchor_line);
                    self.select(TextPos::new(pos.line, 0), end);
                    self.set_cursor(TextPos::new(pos.line, 0));
                } else {
                    let end = self.line_selection_end(pos.line);
                    self.select(TextPos::new(anchor_line, 0), end);
                    self.set_cursor(end);
                }
                self.selection.mode = SelectionMode::Line;
            }
            SelectionMode::None => return false,
        }
        true
    }

    // Drop the dragged selection at the release point; Ctrl copies
    // instead of moving.
    fn finish_drag_and_drop(&mut self, ev: MouseButtonEvent) {
        let Some(drop_at) = self.drag_caret.take() else {
            return;
        };
        let release = self.position_at_pixel(ev.position);
        if !self.selection.active || self.selection.contains(release) {
            // Never left the selection: treat as a plain click.
            self.set_cursor(release);
            self.deselect();
            return;
        }
        let text = self.selected_text();
        let copy = ev.modifiers.contains(Modifiers::CTRL);
        let (from, to) = (self.selection.from, self.selection.to);
        self.begin_complex_operation();
        let mut target = drop_at;
        if !copy {
            self.base_remove(from, to);
            self.selection.clear();
            // Removing text before the drop point shifts it.
            if target > from {
                if target.line == to.line {
                    let shifted = target.column - to.column + from.column;
                    target = TextPos::new(from.line, shifted);
                } else if target.line > to.line {
                    target.line -= to.line - from.line;
                }
            }
        }
        let end = self.base_insert(target, &text);
        self.end_complex_operation();
        self.select(target, end);
        self.set_cursor(end);
    }

    fn handle_pan(&mut self, ev: PanEvent) -> bool {
        let row_height = self.store.metrics().row_height as f64;
        let target = self.viewport.v_scroll() + ev.delta.y as f64 / row_height;
        self.viewport
            .scroll_to_exact(&mut self.store, &self.wrap, target);
        true
    }

    // Nearest visible neighbors, skipping folded lines.

    fn prev_visible_line(&self, line: usize) -> Option<usize> {
        (0..line).rev().find(|&l| !self.store.is_hidden(l))
    }

    fn next_visible_line(&self, line: usize) -> Option<usize> {
        (line + 1..self.store.line_count()).find(|&l| !self.store.is_hidden(l))
    }

    // Pixel geometry.

    /// The text position under a viewport pixel.
    pub fn position_at_pixel(&mut self, p: Point) -> TextPos {
        let row_height = self.store.metrics().row_height as f64;
        let row = (self.viewport.v_scroll() + (p.y as f64 / row_height).floor()).max(0.0);
        let (line, wrap_index) =
            self.viewport
                .row_to_position(&mut self.store, &self.wrap, row as usize);
        let x = p.x as i32 + self.cursor.x_ofs;
        let column = self.column_at_x(line, wrap_index, x);
        TextPos::new(line, column)
    }

    // Pixel x of the caret within its wrap row.
    pub(crate) fn caret_x(&mut self) -> i32 {
        let (line, column) = (self.cursor.line, self.cursor.column);
        let start =
            self.wrap
                .column_at_wrap_start(&mut self.store, line, self.cursor.wrap_index);
        let metrics = self.store.metrics();
        let indent = self.store.indent_size();
        let chars: Vec<char> = self.store.get(line).chars().collect();
        let mut x = 0;
        for col in start..column.min(chars.len()) {
            let next = chars.get(col + 1).copied().unwrap_or('\0');
            x += metrics.char_advance(chars[col], next, x, indent);
        }
        x
    }

    // Column within a wrap row closest to pixel x.
    pub(crate) fn column_at_x(&mut self, line: usize, wrap_index: usize, x: i32) -> usize {
        let start = self
            .wrap
            .column_at_wrap_start(&mut self.store, line, wrap_index);
        let rows = self.wrap.wrap_rows(&mut self.store, line);
        let row_text = rows
            .get(wrap_index)
            .cloned()
            .unwrap_or_else(|| self.store.get(line).to_owned());
        let metrics = self.store.metrics();
        let indent = self.store.indent_size();
        let chars: Vec<char> = row_text.chars().collect();
        let mut px = 0;
        for (i, &c) in chars.iter().enumerate() {
            let next = chars.get(i + 1).copied().unwrap_or('\0');
            let w = metrics.char_advance(c, next, px, indent);
            if px + w / 2 >= x {
                return start + i;
            }
            px += w;
        }
        start + chars.len()
    }
}
