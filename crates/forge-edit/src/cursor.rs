//! Cursor and selection state.
//!
//! The cursor tracks its wrap row and a desired-x anchor so vertical
//! motion lands on the visually nearest column. The selection is a small
//! state machine over the drag modes (pointer, word, line, shift).

use unicode_segmentation::UnicodeSegmentation;

use crate::line_store::TextPos;

/// Caret state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Line index.
    pub line: usize,
    /// Column within the line, in scalar values.
    pub column: usize,
    /// Wrap row within the line the caret sits on.
    pub wrap_index: usize,
    /// Desired x in pixels, preserved across vertical motion.
    pub last_fit_x: i32,
    /// First visible line (vertical scroll position).
    pub line_ofs: usize,
    /// Wrap row offset within the first visible line.
    pub wrap_ofs: usize,
    /// Horizontal scroll in pixels.
    pub x_ofs: i32,
}

impl Cursor {
    /// The caret's `(line, column)` position.
    pub fn pos(&self) -> TextPos {
        TextPos::new(self.line, self.column)
    }
}

/// How the active selection is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No drag in progress.
    #[default]
    None,
    /// Extended with Shift + movement.
    Shift,
    /// Mouse drag by character.
    Pointer,
    /// Double-click drag by word.
    Word,
    /// Triple-click drag by line.
    Line,
}

/// Selection range plus drag bookkeeping.
///
/// `from ≤ to` holds after every mutation; `shiftclick_left` records
/// which end the anchor is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    /// Whether a selection is active.
    pub active: bool,
    /// Current drag mode.
    pub mode: SelectionMode,
    /// Normalized start.
    pub from: TextPos,
    /// Normalized end.
    pub to: TextPos,
    /// Position where the drag began.
    pub anchor: TextPos,
    /// The anchor is the left (`from`) end.
    pub shiftclick_left: bool,
    /// Word-mode: column where the original word begins.
    pub word_begin: usize,
    /// Word-mode: column where the original word ends.
    pub word_end: usize,
    /// Word-mode: line of the original word.
    pub word_origin_line: usize,
}

impl Selection {
    /// Activate with the range `a..b` in either order.
    pub fn select(&mut self, a: TextPos, b: TextPos) {
        self.active = a != b;
        self.anchor = a;
        if a <= b {
            self.from = a;
            self.to = b;
            self.shiftclick_left = true;
        } else {
            self.from = b;
            self.to = a;
            self.shiftclick_left = false;
        }
    }

    /// Deactivate and leave drag mode.
    pub fn clear(&mut self) {
        self.active = false;
        self.mode = SelectionMode::None;
    }

    /// Whether `pos` falls inside the active range.
    pub fn contains(&self, pos: TextPos) -> bool {
        self.active && self.from <= pos && pos < self.to
    }
}

// Character classes used for Ctrl+arrow word hops: a boundary is any
// class transition.
#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Whitespace,
    Text,
    Symbol,
}

fn class_of(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Text
    } else {
        CharClass::Symbol
    }
}

/// Column of the previous word boundary before `column`.
pub fn prev_word_column(text: &str, column: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut col = column.min(chars.len());
    if col == 0 {
        return 0;
    }
    col -= 1;
    while col > 0 && class_of(chars[col]) == CharClass::Whitespace {
        col -= 1;
    }
    let class = class_of(chars[col]);
    while col > 0 && class_of(chars[col - 1]) == class {
        col -= 1;
    }
    col
}

/// Column of the next word boundary after `column`.
pub fn next_word_column(text: &str, column: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut col = column;
    if col >= chars.len() {
        return chars.len();
    }
    let class = class_of(chars[col]);
    while col < chars.len() && class_of(chars[col]) == class {
        col += 1;
    }
    while col < chars.len() && class_of(chars[col]) == CharClass::Whitespace {
        col += 1;
    }
    col
}

/// The word's `(begin, end)` columns around `column`, per UAX #29.
///
/// Falls back to a single-character span on punctuation or whitespace.
pub fn word_range_at(text: &str, column: usize) -> (usize, usize) {
    let total = text.chars().count();
    if total == 0 {
        return (0, 0);
    }
    let column = column.min(total.saturating_sub(1));
    let mut char_col = 0usize;
    for (_, word) in text.split_word_bound_indices() {
        let len = word.chars().count();
        if column < char_col + len {
            return (char_col, char_col + len);
        }
        char_col += len;
    }
    (total.saturating_sub(1), total)
}
