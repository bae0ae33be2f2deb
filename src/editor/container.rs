use std::rc::Rc;

use crate::events::{EventBus, NamedEvent, SubscriptionId};

use super::buffer::{EditorBuffer, Selection};
use super::preview::{MarkdownConverter, PreviewPane};
use super::toolbar::{ToolButton, ToolbarAction};

/// Markup found inside an editor container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorMarkup {
    pub textarea: Option<TextArea>,
    /// `.editor-toolbar` with its `.tool` buttons, if present.
    pub toolbar: Option<Vec<ToolButton>>,
    pub preview: Option<PreviewPane>,
}

/// The editor's textarea.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextArea {
    pub value: String,
    /// `data-editor-inited` marker.
    pub inited: bool,
}

impl TextArea {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            inited: false,
        }
    }
}

/// Color of the source text. Transparent while the preview overlays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextColor {
    #[default]
    Inherit,
    Transparent,
}

/// Notifications published by an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The text changed; carries the new content.
    Input(String),
    PreviewToggled { visible: bool },
}

impl EditorEvent {
    pub const INPUT: &'static str = "input";
    pub const PREVIEW_TOGGLED: &'static str = "preview-toggled";
}

impl NamedEvent for EditorEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Input(_) => Self::INPUT,
            Self::PreviewToggled { .. } => Self::PREVIEW_TOGGLED,
        }
    }
}

/// One initialised editor: textarea buffer, toolbar and preview.
pub struct EditorContainer {
    id: String,
    buffer: EditorBuffer,
    toolbar: Vec<ToolButton>,
    /// Which toolbar buttons this editor wired up.
    wired: Vec<bool>,
    preview: Option<PreviewPane>,
    converter: Rc<dyn MarkdownConverter>,
    text_color: TextColor,
    preview_active: bool,
    scroll_top: usize,
    events: EventBus<EditorEvent>,
}

impl EditorContainer {
    /// Wire up an editor from its markup. Returns `None` without a textarea.
    ///
    /// Buttons already carrying the bound marker are left alone. The markup
    /// is updated with the markers this call sets.
    pub fn attach(
        id: impl Into<String>,
        markup: &mut EditorMarkup,
        converter: Rc<dyn MarkdownConverter>,
    ) -> Option<Self> {
        let textarea = markup.textarea.as_mut()?;
        textarea.inited = true;
        let buffer = EditorBuffer::from_text(&textarea.value);

        let mut toolbar = markup.toolbar.clone().unwrap_or_default();
        let wired = toolbar.iter().map(|b| !b.bound).collect::<Vec<_>>();
        for button in &mut toolbar {
            button.bound = true;
        }
        if let Some(buttons) = markup.toolbar.as_mut() {
            for button in buttons {
                button.bound = true;
            }
        }

        let mut editor = Self {
            id: id.into(),
            buffer,
            toolbar,
            wired,
            preview: markup.preview.clone(),
            converter,
            text_color: TextColor::Inherit,
            preview_active: false,
            scroll_top: 0,
            events: EventBus::new(),
        };
        editor.render();
        let visible = editor.preview.as_ref().is_some_and(|p| p.visible);
        editor.sync_preview_state(visible);
        tracing::debug!(id = %editor.id, buttons = editor.toolbar.len(), "editor attached");
        Some(editor)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub const fn selection(&self) -> Selection {
        self.buffer.selection()
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.buffer.set_selection(start, end);
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn toolbar(&self) -> &[ToolButton] {
        &self.toolbar
    }

    pub const fn preview(&self) -> Option<&PreviewPane> {
        self.preview.as_ref()
    }

    pub const fn text_color(&self) -> TextColor {
        self.text_color
    }

    /// Container-level `preview-active` class.
    pub const fn is_preview_active(&self) -> bool {
        self.preview_active
    }

    pub fn subscribe(
        &mut self,
        name: &'static str,
        handler: impl FnMut(&EditorEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(name, handler)
    }

    /// The user typed: replace the content and re-render.
    pub fn input(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.notify_input();
    }

    /// The source scrolled; the preview follows.
    pub fn scroll(&mut self, top: usize) {
        self.scroll_top = top;
        if let Some(preview) = self.preview.as_mut() {
            preview.scroll_top = top;
        }
    }

    /// A toolbar button was clicked. Returns `true` if anything happened.
    pub fn click(&mut self, button: usize) -> bool {
        if !self.wired.get(button).copied().unwrap_or(false) {
            return false;
        }
        let Some(action) = self.toolbar[button].parsed_action() else {
            return false;
        };
        self.apply(action)
    }

    /// Run a toolbar action directly.
    pub fn apply(&mut self, action: ToolbarAction) -> bool {
        match action.markup() {
            Some((before, after)) => {
                self.wrap_selection(before, after);
                true
            }
            None => self.toggle_preview(),
        }
    }

    /// Wrap the selection and fire `input`.
    pub fn wrap_selection(&mut self, before: &str, after: &str) -> Selection {
        let selection = self.buffer.wrap_selection(before, after);
        self.notify_input();
        selection
    }

    /// Tab / Shift+Tab in the textarea.
    pub fn keydown_tab(&mut self, shift: bool) -> bool {
        let changed = self.buffer.handle_tab(shift);
        if changed {
            self.notify_input();
        }
        changed
    }

    /// Show or hide the preview overlay. Returns `false` without a preview.
    pub fn toggle_preview(&mut self) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        let visible = !preview.visible;
        preview.visible = visible;
        self.text_color = if visible {
            TextColor::Transparent
        } else {
            TextColor::Inherit
        };
        if visible {
            self.render();
        }
        self.sync_preview_state(visible);
        self.events.emit(&EditorEvent::PreviewToggled { visible });
        true
    }

    fn notify_input(&mut self) {
        self.render();
        let text = self.buffer.text();
        self.events.emit(&EditorEvent::Input(text));
    }

    fn render(&mut self) {
        let text = self.buffer.text();
        if let Some(preview) = self.preview.as_mut() {
            preview.render(self.converter.as_ref(), &text);
            preview.scroll_top = self.scroll_top;
        }
    }

    /// Button and container state. The text color is left to the toggle.
    fn sync_preview_state(&mut self, visible: bool) {
        self.preview_active = visible;
        for button in &mut self.toolbar {
            if button.parsed_action() == Some(ToolbarAction::PreviewToggle) {
                button.set_pressed(visible);
            }
        }
    }
}

impl std::fmt::Debug for EditorContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContainer")
            .field("id", &self.id)
            .field("buffer", &self.buffer)
            .field("toolbar", &self.toolbar)
            .field("preview", &self.preview)
            .field("text_color", &self.text_color)
            .finish_non_exhaustive()
    }
}
