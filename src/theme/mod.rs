//! Light/dark/auto theme management.
//!
//! - [`Preference`] is what the user picked and what gets persisted.
//! - [`ResolvedTheme`] is what is actually rendered; it is never `auto`.
//! - [`ThemeManager`] owns the stores, the color-scheme signal and the
//!   root attribute, and is passed explicitly to whoever needs it.

mod manager;
mod root;
pub mod scheme;
pub mod store;
pub mod sync;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::events::NamedEvent;

pub use manager::{ThemeManager, ThemeManagerBuilder, ToggleButton};
pub use root::ThemeRoot;

/// Key under which the preference is stored in every store.
pub const THEME_KEY: &str = "user-theme-preference";

/// Root attribute reflecting the resolved theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Marker attribute for elements that cycle the theme when activated.
pub const TOGGLE_MARKER: &str = "data-toggle-theme";

/// Root class present while transitions are suppressed during start-up.
pub const SUPPRESS_TRANSITIONS_CLASS: &str = "theme-init-suppressed";

/// User-chosen theme setting.
#[derive(
    clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme preference `{0}` (expected light, dark or auto)")]
pub struct ParsePreferenceError(pub String);

impl Preference {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::Auto];

    /// Parse a stored value; anything outside the three known values is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    /// Parse leniently: unknown values fall back to `auto`.
    pub fn parse_or_auto(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Auto)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    /// Next preference in the toggle rotation: light, dark, auto, light.
    pub const fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Auto,
            Self::Auto => Self::Light,
        }
    }

    /// Resolve against the current system signal.
    pub const fn resolve(self, system_dark: bool) -> ResolvedTheme {
        match self {
            Self::Light => ResolvedTheme::Light,
            Self::Dark => ResolvedTheme::Dark,
            Self::Auto => ResolvedTheme::from_dark(system_dark),
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::Auto => "Auto",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Light => "\u{2600}\u{fe0f}",
            Self::Dark => "\u{1f319}",
            Self::Auto => "\u{1f504}",
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preference {
    type Err = ParsePreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParsePreferenceError(s.to_string()))
    }
}

impl From<ResolvedTheme> for Preference {
    fn from(theme: ResolvedTheme) -> Self {
        match theme {
            ResolvedTheme::Light => Self::Light,
            ResolvedTheme::Dark => Self::Dark,
        }
    }
}

/// Concrete theme actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub const fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    /// Parse a root attribute value. `auto` is not a resolved theme.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the `theme-changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeChanged {
    pub theme: Preference,
    pub actual_theme: ResolvedTheme,
}

impl ThemeChanged {
    pub const NAME: &'static str = "theme-changed";
}

impl NamedEvent for ThemeChanged {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(Preference::parse("dark"), Some(Preference::Dark));
        assert_eq!(Preference::parse("Dark"), None);
        assert_eq!(Preference::parse(""), None);
        assert_eq!(Preference::parse_or_auto("sepia"), Preference::Auto);
    }

    #[test]
    fn test_cycle_three_times_returns_to_start() {
        for start in Preference::ALL {
            assert_eq!(start.next().next().next(), start);
        }
    }

    #[test]
    fn test_cycle_order() {
        assert_eq!(Preference::Light.next(), Preference::Dark);
        assert_eq!(Preference::Dark.next(), Preference::Auto);
        assert_eq!(Preference::Auto.next(), Preference::Light);
    }

    #[test]
    fn test_auto_resolves_dark_iff_system_dark() {
        assert_eq!(Preference::Auto.resolve(true), ResolvedTheme::Dark);
        assert_eq!(Preference::Auto.resolve(false), ResolvedTheme::Light);
        assert_eq!(Preference::Light.resolve(true), ResolvedTheme::Light);
        assert_eq!(Preference::Dark.resolve(false), ResolvedTheme::Dark);
    }

    #[test]
    fn test_resolved_theme_never_parses_auto() {
        assert_eq!(ResolvedTheme::parse("auto"), None);
        assert_eq!(ResolvedTheme::parse("light"), Some(ResolvedTheme::Light));
    }

    #[test]
    fn test_theme_changed_serializes_with_camel_case() {
        let event = ThemeChanged {
            theme: Preference::Auto,
            actual_theme: ResolvedTheme::Dark,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"theme":"auto","actualTheme":"dark"}"#);
    }

    #[test]
    fn test_from_str_reports_bad_value() {
        let err = "blue".parse::<Preference>().unwrap_err();
        assert!(err.to_string().contains("blue"));
    }
}
