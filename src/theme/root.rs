use std::collections::BTreeSet;

use super::{ResolvedTheme, SUPPRESS_TRANSITIONS_CLASS};

/// The document root as seen by the theme manager: the `data-theme`
/// attribute plus the class list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThemeRoot {
    theme_attr: Option<String>,
    classes: BTreeSet<String>,
}

impl ThemeRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A root whose `data-theme` was rendered by the server.
    pub fn with_server_theme(value: impl Into<String>) -> Self {
        Self {
            theme_attr: Some(value.into()),
            classes: BTreeSet::new(),
        }
    }

    /// Raw attribute value, as written by the server or by us.
    pub fn theme_attr(&self) -> Option<&str> {
        self.theme_attr.as_deref()
    }

    /// The attribute interpreted as a resolved theme, if valid.
    pub fn resolved(&self) -> Option<ResolvedTheme> {
        self.theme_attr.as_deref().and_then(ResolvedTheme::parse)
    }

    pub fn set_theme(&mut self, theme: ResolvedTheme) {
        self.theme_attr = Some(theme.as_str().to_string());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Add a class. Returns `false` if it was already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        self.classes.insert(class.to_string())
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        self.classes.remove(class)
    }

    pub fn transitions_suppressed(&self) -> bool {
        self.has_class(SUPPRESS_TRANSITIONS_CLASS)
    }
}
