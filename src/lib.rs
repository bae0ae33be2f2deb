// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. theme::ThemeManager)
    clippy::module_name_repetitions
)]

//! # Inkshade
//!
//! Light/dark theme management and a markdown editing toolkit.
//!
//! Inkshade provides:
//! - A theme preference (light, dark or auto) persisted to a key-value
//!   store and a cookie, resolved against the system color scheme and
//!   synced to a server
//! - A markdown editor buffer with a formatting toolbar, Tab indentation
//!   and a live HTML preview
//! - Discovery of editor markup, including markup inserted later
//! - File watching for live preview and cross-instance theme sync
//!
//! ## Architecture
//!
//! There is no global state. A [`theme::ThemeManager`] and an
//! [`editor::EditorRegistry`] are created by the host and passed around
//! explicitly. Both publish named events through an [`events::EventBus`].
//! Host capabilities (stores, color-scheme signal, server sync, markdown
//! conversion) are injected as trait objects.
//!
//! ## Modules
//!
//! - [`theme`]: Theme preference resolution, persistence and sync
//! - [`editor`]: Editor buffer, toolbar, preview and discovery
//! - [`events`]: Named event dispatch
//! - [`config`]: Flag-file configuration
//! - [`watcher`]: File watching

pub mod config;
pub mod editor;
pub mod events;
pub mod theme;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{
        ComrakConverter, EditorContainer, EditorRegistry, MarkdownConverter, ToolbarAction,
    };
    pub use crate::events::{EventBus, NamedEvent};
    pub use crate::theme::{Preference, ResolvedTheme, ThemeChanged, ThemeManager};
}
