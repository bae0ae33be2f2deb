use std::rc::Rc;

use super::container::{EditorContainer, EditorMarkup};
use super::preview::MarkdownConverter;

/// Class of a regular editor wrapper.
pub const EDITOR_CONTAINER_CLASS: &str = "markdown-editor-container";

/// Class of dynamically inserted reply forms, which may lack the wrapper.
pub const REPLY_FORM_CLASS: &str = "reply-form-local";

/// A node of the page markup, reduced to what editor discovery needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupNode {
    pub id: String,
    pub classes: Vec<String>,
    pub editor: Option<EditorMarkup>,
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    #[must_use]
    pub fn with_editor(mut self, editor: EditorMarkup) -> Self {
        self.editor = Some(editor);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn is_editor_root(&self) -> bool {
        self.has_class(EDITOR_CONTAINER_CLASS) || self.has_class(REPLY_FORM_CLASS)
    }

    fn contains_editor_container(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.has_class(EDITOR_CONTAINER_CLASS) || c.contains_editor_container())
    }
}

/// Finds editor markup and keeps the initialised editors.
///
/// Each element is initialised at most once, however many times discovery
/// runs over it.
pub struct EditorRegistry {
    converter: Rc<dyn MarkdownConverter>,
    editors: Vec<EditorContainer>,
}

impl EditorRegistry {
    pub fn new(converter: Rc<dyn MarkdownConverter>) -> Self {
        Self {
            converter,
            editors: Vec::new(),
        }
    }

    /// Initialise every editor under `root`, including `root` itself.
    /// Returns how many new editors were attached.
    pub fn init_all(&mut self, root: &mut MarkupNode) -> usize {
        let mut attached = 0;
        if root.is_editor_root() && self.init_node(root) {
            attached += 1;
        }
        for child in &mut root.children {
            attached += self.init_all(child);
        }
        attached
    }

    /// Handle markup inserted after the initial scan.
    pub fn observe_added(&mut self, nodes: &mut [MarkupNode]) -> usize {
        let mut attached = 0;
        for node in nodes {
            if node.has_class(REPLY_FORM_CLASS) {
                attached += usize::from(self.init_node(node));
            } else if node.contains_editor_container() {
                attached += self.init_all(node);
            }
        }
        attached
    }

    /// Attach one editor. `false` if there is no textarea or it was already
    /// initialised.
    pub fn init_node(&mut self, node: &mut MarkupNode) -> bool {
        let Some(markup) = node.editor.as_mut() else {
            return false;
        };
        if markup.textarea.as_ref().is_none_or(|t| t.inited) {
            return false;
        }
        let Some(editor) = EditorContainer::attach(&node.id, markup, Rc::clone(&self.converter))
        else {
            return false;
        };
        self.editors.push(editor);
        true
    }

    pub fn get(&self, id: &str) -> Option<&EditorContainer> {
        self.editors.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut EditorContainer> {
        self.editors.iter_mut().find(|e| e.id() == id)
    }

    pub fn editors(&self) -> &[EditorContainer] {
        &self.editors
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}

impl std::fmt::Debug for EditorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorRegistry")
            .field("editors", &self.editors)
            .finish_non_exhaustive()
    }
}
