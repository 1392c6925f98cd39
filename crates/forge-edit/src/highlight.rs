//! Pluggable per-line syntax highlighting.
//!
//! The editor does not know how colors are produced: a host installs a
//! [`HighlighterFn`] and the editor caches one color map per line until
//! that line edits. The built-in [`crate::colorizer::RegionColorizer`] is
//! the fallback provider.

use std::collections::BTreeMap;

/// RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// White.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Color assigned from a column onward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlighterInfo {
    /// The color to draw with from this column until the next entry.
    pub color: Color,
}

/// Per-line color map: sorted `column → color-from-here`.
pub type LineColorMap = BTreeMap<usize, HighlighterInfo>;

/// A per-line color provider: `(line index, line text) → color map`.
pub type HighlighterFn = Box<dyn FnMut(usize, &str) -> LineColorMap>;

/// Cache of per-line highlight results with from-line invalidation.
///
/// The generation token lets a host drop the whole cache (theme change,
/// provider swap) without touching each line.
pub struct HighlightCache {
    lines: Vec<Option<LineColorMap>>,
    generation: u64,
}

impl HighlightCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            generation: 0,
        }
    }

    /// Current invalidation token.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cached entry for `line`, if still valid.
    pub fn get(&self, line: usize) -> Option<&LineColorMap> {
        self.lines.get(line).and_then(|slot| slot.as_ref())
    }

    /// Store the result for `line`.
    pub fn put(&mut self, line: usize, map: LineColorMap) {
        if line >= self.lines.len() {
            self.lines.resize_with(line + 1, || None);
        }
        self.lines[line] = Some(map);
    }

    /// Drop cached entries for `line` and everything after it.
    pub fn invalidate_from(&mut self, line: usize) {
        if line < self.lines.len() {
            self.lines.truncate(line);
        }
    }

    /// Drop everything and advance the generation token.
    pub fn invalidate_all(&mut self) {
        self.lines.clear();
        self.generation += 1;
    }
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(col: usize) -> LineColorMap {
        let mut m = LineColorMap::new();
        m.insert(col, HighlighterInfo { color: Color::rgb(1.0, 0.0, 0.0) });
        m
    }

    #[test]
    fn invalidation_is_suffix_based() {
        let mut cache = HighlightCache::new();
        cache.put(0, map_with(0));
        cache.put(1, map_with(1));
        cache.put(2, map_with(2));
        cache.invalidate_from(1);
        assert!(cache.get(0).is_some());
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn generation_advances_on_full_invalidation() {
        let mut cache = HighlightCache::new();
        cache.put(0, map_with(0));
        let g = cache.generation();
        cache.invalidate_all();
        assert!(cache.get(0).is_none());
        assert!(cache.generation() > g);
    }
}
