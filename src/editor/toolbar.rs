//! Toolbar action identifiers and the markup each one inserts.

use std::fmt;
use std::str::FromStr;

/// What a toolbar button does, keyed by its `data-action` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Heading1,
    Heading2,
    BulletList,
    OrderedList,
    Quote,
    CodeBlock,
    Link,
    Image,
    PreviewToggle,
}

impl ToolbarAction {
    pub const ALL: [Self; 11] = [
        Self::Bold,
        Self::Italic,
        Self::Heading1,
        Self::Heading2,
        Self::BulletList,
        Self::OrderedList,
        Self::Quote,
        Self::CodeBlock,
        Self::Link,
        Self::Image,
        Self::PreviewToggle,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "h1" => Self::Heading1,
            "h2" => Self::Heading2,
            "ul" => Self::BulletList,
            "ol" => Self::OrderedList,
            "quote" => Self::Quote,
            "code" => Self::CodeBlock,
            "link" => Self::Link,
            "image" => Self::Image,
            "preview-toggle" => Self::PreviewToggle,
            _ => return None,
        })
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Heading1 => "h1",
            Self::Heading2 => "h2",
            Self::BulletList => "ul",
            Self::OrderedList => "ol",
            Self::Quote => "quote",
            Self::CodeBlock => "code",
            Self::Link => "link",
            Self::Image => "image",
            Self::PreviewToggle => "preview-toggle",
        }
    }

    /// Text inserted before and after the selection, or `None` for actions
    /// that don't edit text.
    pub const fn markup(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Bold => Some(("**", "**")),
            Self::Italic => Some(("*", "*")),
            Self::Heading1 => Some(("# ", "")),
            Self::Heading2 => Some(("## ", "")),
            Self::BulletList => Some(("- ", "")),
            Self::OrderedList => Some(("1. ", "")),
            Self::Quote => Some(("> ", "")),
            Self::CodeBlock => Some(("```\n", "\n```")),
            Self::Link => Some(("[", "](http://)")),
            Self::Image => Some(("![](", "")),
            Self::PreviewToggle => None,
        }
    }
}

impl fmt::Display for ToolbarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown toolbar action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for ToolbarAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// A `.tool` button as found in the markup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolButton {
    /// Raw `data-action` value, if present.
    pub action: Option<String>,
    /// `data-bound` marker; a bound button is never wired twice.
    pub bound: bool,
    pub active: bool,
    pub preview_active: bool,
    pub aria_pressed: bool,
}

impl ToolButton {
    pub fn new(action: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            ..Self::default()
        }
    }

    /// The parsed action; unknown ids are ignored.
    pub fn parsed_action(&self) -> Option<ToolbarAction> {
        self.action.as_deref().and_then(ToolbarAction::from_id)
    }

    pub(crate) fn set_pressed(&mut self, pressed: bool) {
        self.active = pressed;
        self.preview_active = pressed;
        self.aria_pressed = pressed;
    }
}
