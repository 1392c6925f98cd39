//! Font metrics for a monospace cell model.
//!
//! Character advances are computed from UAX #11 cell widths scaled by the
//! font's space width; a tab advances to the next multiple of
//! `indent_size × space_width`.

use unicode_width::UnicodeWidthChar;

/// Pixel metrics of the editor font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Advance of `' '` in pixels.
    pub space_width: i32,
    /// Height of one text row in pixels.
    pub row_height: i32,
}

impl FontMetrics {
    /// Metrics for a given space advance and row height.
    pub fn new(space_width: i32, row_height: i32) -> Self {
        Self {
            space_width: space_width.max(1),
            row_height: row_height.max(1),
        }
    }

    /// Pixel advance of `c` drawn at pixel offset `x` within the line.
    ///
    /// `next` exists for font backends with pair kerning; the monospace
    /// model ignores it. Tabs advance to the next tab stop, where a tab
    /// stop is every `indent_size` spaces.
    pub fn char_advance(&self, c: char, _next: char, x: i32, indent_size: usize) -> i32 {
        if c == '\t' {
            let tab_px = (indent_size.max(1) as i32) * self.space_width;
            tab_px - (x % tab_px)
        } else {
            let cells = UnicodeWidthChar::width(c).unwrap_or(1) as i32;
            cells * self.space_width
        }
    }

    /// Pixel width of `s` starting at pixel offset 0.
    pub fn str_width(&self, s: &str, indent_size: usize) -> i32 {
        let mut x = 0i32;
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied().unwrap_or('\0');
            x += self.char_advance(c, next, x, indent_size);
        }
        x
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_advance_is_one_space() {
        let m = FontMetrics::new(10, 20);
        assert_eq!(m.char_advance('a', 'b', 0, 4), 10);
        assert_eq!(m.str_width("hello", 4), 50);
    }

    #[test]
    fn wide_chars_take_two_cells() {
        let m = FontMetrics::new(10, 20);
        assert_eq!(m.char_advance('你', '好', 0, 4), 20);
        assert_eq!(m.str_width("你好", 4), 40);
    }

    #[test]
    fn tab_advances_to_next_stop() {
        let m = FontMetrics::new(10, 20);
        // Tab stops every 4 spaces = 40 px.
        assert_eq!(m.char_advance('\t', '\0', 0, 4), 40);
        assert_eq!(m.char_advance('\t', '\0', 10, 4), 30);
        assert_eq!(m.char_advance('\t', '\0', 39, 4), 1);
        assert_eq!(m.char_advance('\t', '\0', 40, 4), 40);
        assert_eq!(m.str_width("ab\t", 4), 40);
        assert_eq!(m.str_width("abcd\t", 4), 80);
    }
}
