//! Stateful line-by-line syntax coloring from begin/end key regions and
//! keyword tables.
//!
//! Region membership carries across lines (block comments, multi-line
//! strings) unless a region is `line_only`. The colorizer caches which
//! region is in effect at the start of each line; editing line `L` drops
//! that cache for every line after `L`.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::highlight::{Color, HighlighterInfo, LineColorMap};
use crate::line_store::LineStore;

/// A colorized span delimited by a begin/end key pair.
#[derive(Debug, Clone)]
pub struct ColorRegion {
    /// Opening delimiter, e.g. `/*` or `"`.
    pub begin_key: String,
    /// Closing delimiter. Equal to `begin_key` for quote-style regions.
    pub end_key: String,
    /// Color applied to the span including both delimiters.
    pub color: Color,
    /// The region closes at end-of-line regardless of `end_key`.
    pub line_only: bool,
}

impl ColorRegion {
    /// Whether begin and end delimiters are the same key.
    pub fn eq_delimiters(&self) -> bool {
        self.begin_key == self.end_key
    }
}

/// Errors from region registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    /// The begin delimiter was empty.
    #[error("region delimiter keys must not be empty")]
    EmptyKey,
    /// A region with the same begin delimiter already exists.
    #[error("a region beginning with `{0}` is already registered")]
    DuplicateBegin(String),
}

/// Line-by-line colorizer over regions and keyword tables.
pub struct RegionColorizer {
    regions: Vec<ColorRegion>,
    keywords: HashMap<String, Color>,
    member_keywords: HashMap<String, Color>,
    /// Default text color.
    pub font_color: Color,
    /// Color for digits and numeric literals.
    pub number_color: Color,
    /// Color for punctuation runs.
    pub symbol_color: Color,
    /// Color for identifiers followed by `(`.
    pub function_color: Color,
    // start_region[l] = region in effect at the start of line l.
    // Valid only for the current prefix; suffix dropped on edits.
    start_region: Vec<Option<usize>>,
}

impl RegionColorizer {
    /// A colorizer with no regions or keywords and default colors.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            keywords: HashMap::new(),
            member_keywords: HashMap::new(),
            font_color: Color::WHITE,
            number_color: Color::rgb(0.6, 0.8, 1.0),
            symbol_color: Color::rgb(0.8, 0.8, 0.8),
            function_color: Color::rgb(0.4, 0.6, 1.0),
            start_region: vec![None],
        }
    }

    /// Register a color region.
    pub fn add_region(
        &mut self,
        begin_key: impl Into<String>,
        end_key: impl Into<String>,
        color: Color,
        line_only: bool,
    ) -> Result<(), RegionError> {
        let begin_key = begin_key.into();
        let end_key = end_key.into();
        if begin_key.is_empty() {
            return Err(RegionError::EmptyKey);
        }
        if self.regions.iter().any(|r| r.begin_key == begin_key) {
            return Err(RegionError::DuplicateBegin(begin_key));
        }
        self.regions.push(ColorRegion {
            begin_key,
            end_key,
            color,
            line_only,
        });
        self.invalidate_from(0);
        Ok(())
    }

    /// Drop every registered region.
    pub fn clear_regions(&mut self) {
        self.regions.clear();
        self.invalidate_from(0);
    }

    /// Map `word` to `color` when it appears as a whole word.
    pub fn add_keyword(&mut self, word: impl Into<String>, color: Color) {
        self.keywords.insert(word.into(), color);
    }

    /// Map `word` to `color` when it appears after a `.` accessor.
    pub fn add_member_keyword(&mut self, word: impl Into<String>, color: Color) {
        self.member_keywords.insert(word.into(), color);
    }

    /// Drop all keyword and member-keyword entries.
    pub fn clear_keywords(&mut self) {
        self.keywords.clear();
        self.member_keywords.clear();
    }

    /// Drop region start-state for every line after `line`.
    ///
    /// The state at the start of `line` depends only on earlier lines, so
    /// it stays.
    pub fn invalidate_from(&mut self, line: usize) {
        let keep = (line + 1).min(self.start_region.len());
        if keep < self.start_region.len() {
            trace!(target: "forge_edit::colorizer", from = line, "region_cache_invalidated");
            self.start_region.truncate(keep);
        }
    }

    /// Region in effect at the start of `line`, filling the cache forward.
    pub fn start_region_for(&mut self, store: &LineStore, line: usize) -> Option<usize> {
        while self.start_region.len() <= line {
            let prev = self.start_region.len() - 1;
            let state = self.region_state_after(store.get(prev), self.start_region[prev]);
            self.start_region.push(state);
        }
        self.start_region[line]
    }

    /// Color map for `line`: sorted `column → color-from-here`.
    pub fn colorize(&mut self, store: &LineStore, line: usize) -> LineColorMap {
        let start = self.start_region_for(store, line);
        let chars: Vec<char> = store.get(line).chars().collect();

        let mut map = LineColorMap::new();
        let mut current = match start {
            Some(r) => self.regions[r].color,
            None => self.font_color,
        };
        map.insert(0, HighlighterInfo { color: current });
        let mut emit = |map: &mut LineColorMap, col: usize, color: Color| {
            if color != current {
                map.insert(col, HighlighterInfo { color });
                current = color;
            }
        };

        let mut in_region = start;
        let mut i = 0usize;
        while i < chars.len() {
            let c = chars[i];

            // Backslash escapes the next character, inside or outside a
            // region.
            if c == '\\' {
                i += 2;
                continue;
            }

            if let Some(r) = in_region {
                let end_len = self.regions[r].end_key.chars().count();
                if Self::match_key(&chars, i, &self.regions[r].end_key) {
                    i += end_len;
                    in_region = None;
                    emit(&mut map, i, self.font_color);
                } else {
                    i += 1;
                }
                continue;
            }

            if let Some((r, key_len)) = self.match_region_begin(&chars, i) {
                emit(&mut map, i, self.regions[r].color);
                i += key_len;
                in_region = Some(r);
                continue;
            }

            if Self::is_word_start(c) {
                let start_col = i;
                while i < chars.len() && Self::is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start_col..i].iter().collect();
                let after_dot = Self::prev_non_blank(&chars, start_col) == Some('.');
                let color = if !after_dot && let Some(&kw) = self.keywords.get(&word) {
                    Some(kw)
                } else if after_dot && let Some(&mk) = self.member_keywords.get(&word) {
                    Some(mk)
                } else if Self::next_non_blank(&chars, i) == Some('(') {
                    Some(self.function_color)
                } else {
                    None
                };
                if let Some(color) = color {
                    emit(&mut map, start_col, color);
                    emit(&mut map, i, self.font_color);
                }
                continue;
            }

            if c.is_ascii_digit() {
                let start_col = i;
                i = Self::consume_number(&chars, i);
                emit(&mut map, start_col, self.number_color);
                emit(&mut map, i, self.font_color);
                continue;
            }

            if Self::is_symbol(c) {
                let start_col = i;
                while i < chars.len() && Self::is_symbol(chars[i]) && chars[i] != '\\' {
                    // Stop before a region delimiter so it is colored by
                    // its region on the next pass.
                    if i > start_col && self.match_region_begin(&chars, i).is_some() {
                        break;
                    }
                    i += 1;
                }
                emit(&mut map, start_col, self.symbol_color);
                emit(&mut map, i, self.font_color);
                continue;
            }

            i += 1;
        }
        map
    }

    // Region transitions only, used to fill the start-state cache.
    fn region_state_after(&self, text: &str, start: Option<usize>) -> Option<usize> {
        let chars: Vec<char> = text.chars().collect();
        let mut state = start;
        let mut i = 0usize;
        while i < chars.len() {
            if chars[i] == '\\' {
                i += 2;
                continue;
            }
            match state {
                Some(r) => {
                    if Self::match_key(&chars, i, &self.regions[r].end_key) {
                        i += self.regions[r].end_key.chars().count();
                        state = None;
                    } else {
                        i += 1;
                    }
                }
                None => {
                    if let Some((r, key_len)) = self.match_region_begin(&chars, i) {
                        i += key_len;
                        state = Some(r);
                    } else {
                        i += 1;
                    }
                }
            }
        }
        // Line-scoped regions never carry over.
        match state {
            Some(r) if self.regions[r].line_only => None,
            other => other,
        }
    }

    // Longest begin key matching at position i.
    fn match_region_begin(&self, chars: &[char], i: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (r, region) in self.regions.iter().enumerate() {
            let len = region.begin_key.chars().count();
            if Self::match_key(chars, i, &region.begin_key)
                && best.map(|(_, l)| len > l).unwrap_or(true)
            {
                best = Some((r, len));
            }
        }
        best
    }

    fn match_key(chars: &[char], i: usize, key: &str) -> bool {
        let mut pos = i;
        for k in key.chars() {
            if chars.get(pos) != Some(&k) {
                return false;
            }
            pos += 1;
        }
        !key.is_empty()
    }

    fn is_word_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn is_symbol(c: char) -> bool {
        !c.is_alphanumeric() && c != '_' && !c.is_whitespace()
    }

    fn prev_non_blank(chars: &[char], i: usize) -> Option<char> {
        chars[..i].iter().rev().find(|c| !c.is_whitespace()).copied()
    }

    fn next_non_blank(chars: &[char], i: usize) -> Option<char> {
        chars[i..].iter().find(|c| !c.is_whitespace()).copied()
    }

    // Numeric literal: decimal with `.`/`_`, hex after `0x`, scientific
    // exponent with optional sign.
    fn consume_number(chars: &[char], mut i: usize) -> usize {
        let start = i;
        let is_hex = chars.get(start) == Some(&'0')
            && matches!(chars.get(start + 1), Some('x') | Some('X'));
        if is_hex {
            i = start + 2;
            while i < chars.len() && (chars[i].is_ascii_hexdigit() || chars[i] == '_') {
                i += 1;
            }
            return i;
        }
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() || c == '_' || c == '.' {
                i += 1;
            } else if matches!(c, 'e' | 'E') {
                let mut j = i + 1;
                if matches!(chars.get(j), Some('+') | Some('-')) {
                    j += 1;
                }
                if chars.get(j).map(|d| d.is_ascii_digit()).unwrap_or(false) {
                    i = j + 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        i
    }
}

impl Default for RegionColorizer {
    fn default() -> Self {
        Self::new()
    }
}
