#![warn(missing_docs)]
//! `forge-lang` - script-language registry collaborator.
//!
//! This crate intentionally stays lightweight and does **not** depend on
//! any scripting runtime. It describes what each registered language can
//! do (named classes, built-in mode, templates, inherit-from-file) and can
//! render a source template for a new `(class_name, base_name)` pair. The
//! editor core consumes only this contract.

/// Capabilities a script language advertises to its hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LanguageCapabilities {
    /// Scripts declare a class name of their own.
    pub has_named_classes: bool,
    /// The language can run in built-in (embedded) mode.
    pub supports_builtin_mode: bool,
    /// The language ships new-script templates.
    pub has_templates: bool,
    /// A script may inherit from another script file by path.
    pub can_inherit_from_file: bool,
}

/// One registered script language.
pub trait ScriptLanguage {
    /// Display name, e.g. `"GDScript"`.
    fn name(&self) -> &str;

    /// Source file extension without the dot, e.g. `"gd"`.
    fn extension(&self) -> &str;

    /// What this language can do.
    fn capabilities(&self) -> LanguageCapabilities;

    /// Render a new-script template for the given class and base names.
    ///
    /// Returns `None` when the language has no templates.
    fn make_template(&self, class_name: &str, base_name: &str) -> Option<String>;

    /// Validate a proposed class name. Default: non-empty identifier.
    fn is_valid_class_name(&self, name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .enumerate()
                .all(|(i, c)| c == '_' || if i == 0 { c.is_alphabetic() } else { c.is_alphanumeric() })
    }
}

/// Ordered registry of script languages.
///
/// Order matters: per-object binding slots in the object core are indexed
/// by registration order.
#[derive(Default)]
pub struct ScriptLanguageRegistry {
    languages: Vec<Box<dyn ScriptLanguage>>,
}

impl ScriptLanguageRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a language, returning its slot index.
    pub fn register(&mut self, language: Box<dyn ScriptLanguage>) -> usize {
        self.languages.push(language);
        self.languages.len() - 1
    }

    /// Number of registered languages.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Whether no languages are registered.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Language at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn ScriptLanguage> {
        self.languages.get(index).map(|l| l.as_ref())
    }

    /// Find a language by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&dyn ScriptLanguage> {
        self.languages
            .iter()
            .map(|l| l.as_ref())
            .find(|l| l.name() == name)
    }

    /// Find a language by file extension.
    pub fn find_by_extension(&self, extension: &str) -> Option<&dyn ScriptLanguage> {
        self.languages
            .iter()
            .map(|l| l.as_ref())
            .find(|l| l.extension().eq_ignore_ascii_case(extension))
    }

    /// Iterate all registered languages in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ScriptLanguage> {
        self.languages.iter().map(|l| l.as_ref())
    }
}
