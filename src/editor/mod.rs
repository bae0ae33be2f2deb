//! Markdown editor enhancement.
//!
//! Provides a rope-backed buffer with selection editing, the formatting
//! toolbar, the live preview and discovery of editor markup.

mod buffer;
mod container;
pub mod preview;
mod registry;
pub mod toolbar;

pub use buffer::{EditorBuffer, Selection};
pub use container::{EditorContainer, EditorEvent, EditorMarkup, TextArea, TextColor};
pub use preview::{ComrakConverter, MarkdownConverter, PreviewPane, RenderError};
pub use registry::{EDITOR_CONTAINER_CLASS, EditorRegistry, MarkupNode, REPLY_FORM_CLASS};
pub use toolbar::{ToolButton, ToolbarAction};
