//! Code-completion candidate state: sources, layered filtering, and the
//! call-hint overlay.
//!
//! Filtering is layered so better matches sort first: exact prefix,
//! case-insensitive prefix, subsequence, case-insensitive subsequence.
//! A single surviving candidate equal to the typed base cancels the
//! popup.

use tracing::trace;

/// What a completion candidate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// A class or type name.
    Class,
    /// A callable; confirmation may auto-pair parens.
    Function,
    /// A signal name.
    Signal,
    /// A local or global variable.
    Variable,
    /// An object member.
    Member,
    /// An enum name.
    Enum,
    /// A constant.
    Constant,
    /// Free-form text.
    PlainText,
    /// A file path, usually quoted.
    FilePath,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOption {
    /// Candidate kind.
    pub kind: CompletionKind,
    /// Text shown in the popup.
    pub display: String,
    /// Text inserted on confirmation.
    pub insert_text: String,
}

impl CompletionOption {
    /// Candidate whose display and insert text are the same.
    pub fn new(kind: CompletionKind, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind,
            insert_text: text.clone(),
            display: text,
        }
    }
}

/// Completion popup and hint state.
#[derive(Debug, Default)]
pub struct CompletionEngine {
    active: bool,
    sources: Vec<CompletionOption>,
    filtered: Vec<CompletionOption>,
    index: usize,
    base: String,
    trigger_prefixes: Vec<String>,
    hint: String,
    hint_offset: i32,
}

impl CompletionEngine {
    /// Inactive engine with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix strings (e.g. `.`, `$`) that open the popup while typing.
    pub fn set_trigger_prefixes(&mut self, prefixes: Vec<String>) {
        self.trigger_prefixes = prefixes;
    }

    /// Whether `text` ends in a trigger prefix.
    pub fn is_trigger(&self, text: &str) -> bool {
        self.trigger_prefixes.iter().any(|p| text.ends_with(p.as_str()))
    }

    /// Whether the popup is showing.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The base the candidates were filtered against.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Candidates surviving the current filter, best matches first.
    pub fn filtered(&self) -> &[CompletionOption] {
        &self.filtered
    }

    /// The highlighted candidate.
    pub fn current(&self) -> Option<&CompletionOption> {
        self.filtered.get(self.index)
    }

    /// Open the popup over `sources`, filtered by `base`.
    ///
    /// Returns whether the popup is active afterwards.
    pub fn begin(&mut self, sources: Vec<CompletionOption>, base: &str) -> bool {
        self.sources = sources;
        self.active = true;
        self.update_base(base)
    }

    /// Re-filter after the typed base changed.
    ///
    /// Cancels (returning `false`) when nothing matches or the only
    /// match is exactly the base.
    pub fn update_base(&mut self, base: &str) -> bool {
        if !self.active {
            return false;
        }
        self.base = base.to_owned();

        let mut exact = Vec::new();
        let mut prefix_ci = Vec::new();
        let mut subseq = Vec::new();
        let mut subseq_ci = Vec::new();
        for option in &self.sources {
            if option.display.is_empty() {
                continue;
            }
            if base.is_empty() {
                exact.push(option.clone());
            } else if option.display.starts_with(base) {
                exact.push(option.clone());
            } else if option
                .display
                .to_lowercase()
                .starts_with(&base.to_lowercase())
            {
                prefix_ci.push(option.clone());
            } else if is_subsequence(base, &option.display) {
                subseq.push(option.clone());
            } else if is_subsequence(&base.to_lowercase(), &option.display.to_lowercase()) {
                subseq_ci.push(option.clone());
            }
        }
        exact.extend(prefix_ci);
        exact.extend(subseq);
        exact.extend(subseq_ci);
        self.filtered = exact;
        self.index = 0;

        if self.filtered.is_empty()
            || (self.filtered.len() == 1 && self.filtered[0].display == self.base)
        {
            self.cancel();
            return false;
        }
        trace!(target: "forge_edit::completion", base = %self.base, candidates = self.filtered.len(), "filtered");
        true
    }

    /// Move the highlight by `delta`, clamped to the candidate list.
    pub fn move_index(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.index = (self.index as isize + delta).clamp(0, last) as usize;
    }

    /// Move the highlight to the first or last candidate.
    pub fn move_index_to_end(&mut self, first: bool) {
        if !self.filtered.is_empty() {
            self.index = if first { 0 } else { self.filtered.len() - 1 };
        }
    }

    /// Close the popup and drop candidates. The hint survives.
    pub fn cancel(&mut self) {
        self.active = false;
        self.sources.clear();
        self.filtered.clear();
        self.index = 0;
        self.base.clear();
    }

    /// Show a call hint anchored `offset` pixels from the caret.
    pub fn set_hint(&mut self, hint: impl Into<String>, offset: i32) {
        self.hint = hint.into();
        self.hint_offset = offset;
    }

    /// The call hint, empty when hidden.
    pub fn hint(&self) -> &str {
        &self.hint
    }

    /// Pixel offset of the hint anchor.
    pub fn hint_offset(&self) -> i32 {
        self.hint_offset
    }

    /// Hide the call hint.
    pub fn clear_hint(&mut self) {
        self.hint.clear();
        self.hint_offset = 0;
    }
}

// Every char of `needle` appears in `haystack` in order.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|n| hay.any(|h| h == n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(names: &[&str]) -> Vec<CompletionOption> {
        names
            .iter()
            .map(|n| CompletionOption::new(CompletionKind::Variable, *n))
            .collect()
    }

    fn displays(engine: &CompletionEngine) -> Vec<&str> {
        engine.filtered().iter().map(|o| o.display.as_str()).collect()
    }

    #[test]
    fn filter_layers_order_best_matches_first() {
        let mut engine = CompletionEngine::new();
        let active = engine.begin(
            options(&["position", "Position2D", "set_position", "SET_POS", "rotation"]),
            "pos",
        );
        assert!(active);
        // Exact prefix, then case-insensitive prefix, then subsequence,
        // then case-insensitive subsequence.
        assert_eq!(
            displays(&engine),
            vec!["position", "Position2D", "set_position", "SET_POS"]
        );
    }

    #[test]
    fn empty_base_keeps_every_candidate() {
        let mut engine = CompletionEngine::new();
        engine.begin(options(&["alpha", "beta"]), "");
        assert_eq!(displays(&engine).len(), 2);
    }

    #[test]
    fn no_match_cancels() {
        let mut engine = CompletionEngine::new();
        let active = engine.begin(options(&["alpha", "beta"]), "zzz");
        assert!(!active);
        assert!(!engine.is_active());
    }

    #[test]
    fn single_exact_match_cancels() {
        let mut engine = CompletionEngine::new();
        let active = engine.begin(options(&["alpha", "beta"]), "alpha");
        assert!(!active);
    }

    #[test]
    fn narrowing_the_base_refilters() {
        let mut engine = CompletionEngine::new();
        engine.begin(options(&["abc", "abd", "xyz"]), "a");
        assert_eq!(displays(&engine), vec!["abc", "abd"]);
        assert!(engine.update_base("ab"));
        assert_eq!(displays(&engine), vec!["abc", "abd"]);
        // A base that matches nothing cancels the popup.
        assert!(!engine.update_base("aq"));
        assert!(!engine.is_active());
    }

    #[test]
    fn index_moves_clamp_to_bounds() {
        let mut engine = CompletionEngine::new();
        engine.begin(options(&["aa", "ab", "ac"]), "a");
        engine.move_index(1);
        assert_eq!(engine.current().unwrap().display, "ab");
        engine.move_index(10);
        assert_eq!(engine.current().unwrap().display, "ac");
        engine.move_index(-10);
        assert_eq!(engine.current().unwrap().display, "aa");
        engine.move_index_to_end(false);
        assert_eq!(engine.current().unwrap().display, "ac");
    }

    #[test]
    fn trigger_prefix_matches_line_tail() {
        let mut engine = CompletionEngine::new();
        engine.set_trigger_prefixes(vec![".".into(), "$".into()]);
        assert!(engine.is_trigger("node."));
        assert!(engine.is_trigger("$"));
        assert!(!engine.is_trigger("node"));
    }

    #[test]
    fn hint_survives_cancel() {
        let mut engine = CompletionEngine::new();
        engine.begin(options(&["aa", "ab"]), "a");
        engine.set_hint("fn aa(x: int)", 12);
        engine.cancel();
        assert_eq!(engine.hint(), "fn aa(x: int)");
        assert_eq!(engine.hint_offset(), 12);
        engine.clear_hint();
        assert_eq!(engine.hint(), "");
    }
}
