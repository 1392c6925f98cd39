//! Visible-row arithmetic, smooth scrolling, and the minimap mapping.
//!
//! All row math counts wrapped sub-rows and skips hidden lines: one
//! visual row is one wrap row of one non-hidden line. The scroll value
//! is a fractional visual-row index.

use crate::layout::WrapModel;
use crate::line_store::LineStore;

/// Scroll state and row arithmetic for one viewport.
#[derive(Debug, Clone)]
pub struct ViewportScroller {
    smooth_enabled: bool,
    scrolling: bool,
    v_scroll: f64,
    target_v_scroll: f64,
    v_scroll_speed: f64,
    scroll_past_end: bool,
    visible_rows: usize,
}

impl ViewportScroller {
    /// Scroller at the top with a default speed.
    pub fn new() -> Self {
        Self {
            smooth_enabled: false,
            scrolling: false,
            v_scroll: 0.0,
            target_v_scroll: 0.0,
            v_scroll_speed: 8.0,
            scroll_past_end: false,
            visible_rows: 1,
        }
    }

    /// Rows that fit in the viewport.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
    }

    /// Rows that fit in the viewport.
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Enable animated scrolling.
    pub fn set_smooth_enabled(&mut self, enabled: bool) {
        self.smooth_enabled = enabled;
    }

    /// Interpolation speed for smooth scrolling, per second.
    pub fn set_scroll_speed(&mut self, speed: f64) {
        self.v_scroll_speed = speed.max(0.1);
    }

    /// Allow scrolling until the last line is the first visible row.
    pub fn set_scroll_past_end(&mut self, enabled: bool) {
        self.scroll_past_end = enabled;
    }

    /// Current scroll position in visual rows.
    pub fn v_scroll(&self) -> f64 {
        self.v_scroll
    }

    /// Whether a smooth-scroll animation is in flight.
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Total visual rows in the document.
    pub fn total_visible_rows(&self, store: &mut LineStore, wrap: &WrapModel) -> usize {
        let mut rows = 0;
        for line in 0..store.line_count() {
            if store.is_hidden(line) {
                continue;
            }
            rows += 1 + wrap.line_wrap_count(store, line);
        }
        rows
    }

    /// Largest allowed scroll value.
    pub fn max_v_scroll(&self, store: &mut LineStore, wrap: &WrapModel) -> f64 {
        let total = self.total_visible_rows(store, wrap);
        let slack = if self.scroll_past_end {
            self.visible_rows - 1
        } else {
            0
        };
        (total + slack).saturating_sub(self.visible_rows) as f64
    }

    /// Jump or animate to `row`, clamped to the scroll range.
    pub fn scroll_to(&mut self, store: &mut LineStore, wrap: &WrapModel, row: f64) {
        let row = row.clamp(0.0, self.max_v_scroll(store, wrap));
        if self.smooth_enabled {
            self.target_v_scroll = row;
            self.scrolling = true;
        } else {
            self.v_scroll = row;
            self.scrolling = false;
        }
    }

    /// Jump immediately, cancelling any animation.
    pub fn scroll_to_exact(&mut self, store: &mut LineStore, wrap: &WrapModel, row: f64) {
        self.v_scroll = row.clamp(0.0, self.max_v_scroll(store, wrap));
        self.scrolling = false;
    }

    /// Advance the smooth-scroll animation by `dt` seconds.
    ///
    /// The step is proportional to the remaining distance; the animation
    /// converges when the distance falls under one row. Returns `true`
    /// when no animation remains.
    pub fn smooth_scroll_step(&mut self, dt: f64) -> bool {
        if !self.scrolling {
            return true;
        }
        let dist = self.target_v_scroll - self.v_scroll;
        if dist.abs() < 1.0 {
            self.v_scroll = self.target_v_scroll;
            self.scrolling = false;
            return true;
        }
        self.v_scroll += dist * (self.v_scroll_speed * dt).min(1.0);
        false
    }

    /// Consume `delta.abs()` visual rows starting at `(from_line,
    /// from_wrap)`, that row included.
    ///
    /// Returns the number of lines traversed and the wrap row landed on.
    /// Positive `delta` walks forward, negative backward; hidden lines
    /// are skipped, each visible line contributing `1 + wrap_count` rows.
    /// Callers stepping the cursor one row down pass the next line with
    /// `delta = 1`.
    pub fn num_lines_from_rows(
        &self,
        store: &mut LineStore,
        wrap: &WrapModel,
        from_line: usize,
        from_wrap: usize,
        delta: isize,
    ) -> (usize, usize) {
        if delta == 0 {
            return (0, from_wrap);
        }
        if delta > 0 {
            let target = delta as i64;
            let mut visible: i64 = -(from_wrap as i64);
            let mut traversed = 0usize;
            let mut line = from_line;
            while line < store.line_count() {
                traversed += 1;
                if !store.is_hidden(line) {
                    visible += 1 + wrap.line_wrap_count(store, line) as i64;
                }
                if visible >= target {
                    let wrap_index =
                        wrap.line_wrap_count(store, line) as i64 - (visible - target);
                    return (traversed, wrap_index.max(0) as usize);
                }
                line += 1;
            }
            let last = store.line_count() - 1;
            (traversed, wrap.line_wrap_count(store, last))
        } else {
            let target = (-delta) as i64;
            let mut visible: i64 =
                -(wrap.line_wrap_count(store, from_line) as i64 - from_wrap as i64);
            let mut traversed = 0usize;
            let mut line = from_line as i64;
            while line >= 0 {
                traversed += 1;
                if !store.is_hidden(line as usize) {
                    visible += 1 + wrap.line_wrap_count(store, line as usize) as i64;
                }
                if visible >= target {
                    return (traversed, (visible - target).max(0) as usize);
                }
                line -= 1;
            }
            (traversed, 0)
        }
    }

    /// Line and wrap row at absolute visual row `row`.
    pub fn row_to_position(
        &self,
        store: &mut LineStore,
        wrap: &WrapModel,
        row: usize,
    ) -> (usize, usize) {
        let mut remaining = row;
        for line in 0..store.line_count() {
            if store.is_hidden(line) {
                continue;
            }
            let rows_here = 1 + wrap.line_wrap_count(store, line);
            if remaining < rows_here {
                return (line, remaining);
            }
            remaining -= rows_here;
        }
        let last = store.line_count() - 1;
        (last, wrap.line_wrap_count(store, last))
    }

    /// Absolute visual row of `(line, wrap_index)`.
    ///
    /// Hidden lines map to the row of the nearest visible line above.
    pub fn position_to_row(
        &self,
        store: &mut LineStore,
        wrap: &WrapModel,
        line: usize,
        wrap_index: usize,
    ) -> usize {
        let mut row = 0;
        for l in 0..line.min(store.line_count()) {
            if store.is_hidden(l) {
                continue;
            }
            row += 1 + wrap.line_wrap_count(store, l);
        }
        if store.is_hidden(line) {
            row.saturating_sub(1)
        } else {
            row + wrap_index
        }
    }

    /// First visible `(line, wrap_index)` at the current scroll.
    pub fn first_visible(&self, store: &mut LineStore, wrap: &WrapModel) -> (usize, usize) {
        self.row_to_position(store, wrap, self.v_scroll as usize)
    }

    /// Last `(line, wrap_index)` inside the viewport.
    pub fn last_visible(&self, store: &mut LineStore, wrap: &WrapModel) -> (usize, usize) {
        let last_row = self.v_scroll as usize + self.visible_rows - 1;
        let total = self.total_visible_rows(store, wrap);
        self.row_to_position(store, wrap, last_row.min(total.saturating_sub(1)))
    }

    /// Scroll so that `(line, wrap_index)` is inside the viewport.
    pub fn ensure_visible(
        &mut self,
        store: &mut LineStore,
        wrap: &WrapModel,
        line: usize,
        wrap_index: usize,
    ) {
        let row = self.position_to_row(store, wrap, line, wrap_index);
        let first = self.v_scroll as usize;
        if row < first {
            self.scroll_to_exact(store, wrap, row as f64);
        } else if row >= first + self.visible_rows {
            self.scroll_to_exact(store, wrap, (row + 1 - self.visible_rows) as f64);
        }
    }

    /// Scroll so that `(line, wrap_index)` sits in the middle row.
    pub fn center_visible(
        &mut self,
        store: &mut LineStore,
        wrap: &WrapModel,
        line: usize,
        wrap_index: usize,
    ) {
        let row = self.position_to_row(store, wrap, line, wrap_index);
        let target = row.saturating_sub(self.visible_rows / 2);
        self.scroll_to_exact(store, wrap, target as f64);
    }

    /// Apply a minimap drag of `dy` pixels.
    ///
    /// The drag maps the minimap's pixel height onto the whole scroll
    /// range, so a full-height drag traverses the whole document.
    pub fn minimap_drag(
        &mut self,
        store: &mut LineStore,
        wrap: &WrapModel,
        dy: f64,
        minimap_height_px: f64,
    ) {
        if minimap_height_px <= 0.0 {
            return;
        }
        let range = self.max_v_scroll(store, wrap);
        let delta = dy / minimap_height_px * range;
        self.scroll_to_exact(store, wrap, self.v_scroll + delta);
    }

    /// Visual row under a click at `ratio` (0..1) of the minimap height.
    pub fn minimap_row_at(
        &self,
        store: &mut LineStore,
        wrap: &WrapModel,
        ratio: f64,
    ) -> usize {
        let total = self.total_visible_rows(store, wrap);
        ((ratio.clamp(0.0, 1.0) * total as f64) as usize).min(total.saturating_sub(1))
    }
}

impl Default for ViewportScroller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FontMetrics;
    use pretty_assertions::assert_eq;

    fn fixture(lines: &[&str]) -> (ViewportScroller, LineStore, WrapModel) {
        let mut store = LineStore::new();
        store.set_metrics(FontMetrics::new(10, 20));
        store.set(0, lines[0]);
        for (i, line) in lines.iter().enumerate().skip(1) {
            store.insert_line(i, *line);
        }
        (ViewportScroller::new(), store, WrapModel::new())
    }

    #[test]
    fn total_rows_counts_wraps_and_skips_hidden() {
        let (vp, mut store, mut wrap) = fixture(&["aa bb cc dd", "x", "y"]);
        wrap.set_enabled(&mut store, true);
        wrap.set_wrap_at(&mut store, 65);
        assert_eq!(vp.total_visible_rows(&mut store, &wrap), 4);
        store.set_hidden(1, true);
        assert_eq!(vp.total_visible_rows(&mut store, &wrap), 3);
    }

    #[test]
    fn walk_forward_skips_hidden_lines() {
        let (vp, mut store, wrap) = fixture(&["a", "b", "c", "d"]);
        store.set_hidden(1, true);
        store.set_hidden(2, true);
        // Cursor-down from line 0 walks from the next line; it traverses
        // the two hidden lines and lands on line 0 + 3 = 3.
        let (lines, wrap_index) = vp.num_lines_from_rows(&mut store, &wrap, 1, 0, 1);
        assert_eq!((lines, wrap_index), (3, 0));
    }

    #[test]
    fn walk_counts_wrap_rows() {
        let (vp, mut store, mut wrap) = fixture(&["aa bb cc dd", "x"]);
        wrap.set_enabled(&mut store, true);
        wrap.set_wrap_at(&mut store, 65);
        // Two rows from the top (inclusive) end on line 0's second wrap
        // row: one line traversed.
        let (lines, wrap_index) = vp.num_lines_from_rows(&mut store, &wrap, 0, 0, 2);
        assert_eq!((lines, wrap_index), (1, 1));
        // Three rows from the top end on line 1.
        let (lines, wrap_index) = vp.num_lines_from_rows(&mut store, &wrap, 0, 0, 3);
        assert_eq!((lines, wrap_index), (2, 0));
        // Two rows up from line 1 (inclusive) end on line 0's second
        // wrap row.
        let (lines, wrap_index) = vp.num_lines_from_rows(&mut store, &wrap, 1, 0, -2);
        assert_eq!((lines, wrap_index), (2, 1));
    }

    #[test]
    fn row_position_round_trip() {
        let (vp, mut store, mut wrap) = fixture(&["aa bb cc dd", "x", "y"]);
        wrap.set_enabled(&mut store, true);
        wrap.set_wrap_at(&mut store, 65);
        store.set_hidden(1, true);
        // Rows: line0/w0, line0/w1, line2/w0.
        assert_eq!(vp.row_to_position(&mut store, &wrap, 0), (0, 0));
        assert_eq!(vp.row_to_position(&mut store, &wrap, 1), (0, 1));
        assert_eq!(vp.row_to_position(&mut store, &wrap, 2), (2, 0));
        assert_eq!(vp.position_to_row(&mut store, &wrap, 2, 0), 2);
        assert_eq!(vp.position_to_row(&mut store, &wrap, 1, 0), 1);
    }

    #[test]
    fn smooth_scroll_converges_under_one_row() {
        let (mut vp, mut store, wrap) = fixture(&["a"; 100]);
        vp.set_visible_rows(10);
        vp.set_smooth_enabled(true);
        vp.scroll_to(&mut store, &wrap, 50.0);
        assert!(vp.is_scrolling());
        let mut steps = 0;
        while !vp.smooth_scroll_step(1.0 / 60.0) {
            steps += 1;
            assert!(steps < 10_000, "animation failed to converge");
        }
        assert_eq!(vp.v_scroll(), 50.0);
        assert!(!vp.is_scrolling());
    }

    #[test]
    fn direct_scroll_cancels_animation() {
        let (mut vp, mut store, wrap) = fixture(&["a"; 100]);
        vp.set_visible_rows(10);
        vp.set_smooth_enabled(true);
        vp.scroll_to(&mut store, &wrap, 50.0);
        vp.scroll_to_exact(&mut store, &wrap, 3.0);
        assert!(!vp.is_scrolling());
        assert_eq!(vp.v_scroll(), 3.0);
    }

    #[test]
    fn scroll_clamps_to_range() {
        let (mut vp, mut store, wrap) = fixture(&["a", "b", "c", "d", "e"]);
        vp.set_visible_rows(3);
        vp.scroll_to(&mut store, &wrap, 100.0);
        assert_eq!(vp.v_scroll(), 2.0);
        vp.set_scroll_past_end(true);
        vp.scroll_to(&mut store, &wrap, 100.0);
        assert_eq!(vp.v_scroll(), 4.0);
    }

    #[test]
    fn ensure_visible_scrolls_minimally() {
        let (mut vp, mut store, wrap) = fixture(&["a"; 20]);
        vp.set_visible_rows(5);
        vp.ensure_visible(&mut store, &wrap, 10, 0);
        assert_eq!(vp.v_scroll(), 6.0);
        vp.ensure_visible(&mut store, &wrap, 8, 0);
        assert_eq!(vp.v_scroll(), 6.0);
        vp.ensure_visible(&mut store, &wrap, 2, 0);
        assert_eq!(vp.v_scroll(), 2.0);
    }

    #[test]
    fn minimap_drag_is_proportional() {
        let (mut vp, mut store, wrap) = fixture(&["a"; 110]);
        vp.set_visible_rows(10);
        // Range is 100 rows; half the minimap height moves half the range.
        vp.minimap_drag(&mut store, &wrap, 50.0, 100.0);
        assert_eq!(vp.v_scroll(), 50.0);
        assert_eq!(vp.minimap_row_at(&mut store, &wrap, 0.5), 55);
    }
}
