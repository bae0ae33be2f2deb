//! Live markdown preview.
//!
//! The converter is injected; [`ComrakConverter`] is the default.

use comrak::Options;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("markdown conversion failed: {0}")]
    Conversion(String),
}

/// Converts markdown source to an HTML fragment.
pub trait MarkdownConverter {
    fn markdown_to_html(&self, text: &str) -> Result<String, RenderError>;
}

impl<F> MarkdownConverter for F
where
    F: Fn(&str) -> Result<String, RenderError>,
{
    fn markdown_to_html(&self, text: &str) -> Result<String, RenderError> {
        self(text)
    }
}

/// GitHub-flavoured conversion via comrak. Raw HTML in the source is escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComrakConverter;

impl ComrakConverter {
    fn options() -> Options {
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.shortcodes = true;
        options.render.escape = true;
        options
    }
}

impl MarkdownConverter for ComrakConverter {
    fn markdown_to_html(&self, text: &str) -> Result<String, RenderError> {
        Ok(comrak::markdown_to_html(text, &Self::options()))
    }
}

/// State of the `.markdown-preview` pane and its `.preview-content`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewPane {
    pub visible: bool,
    /// Whether a `.preview-content` element exists to render into.
    pub has_content: bool,
    pub html: String,
    pub scroll_top: usize,
}

impl PreviewPane {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            has_content: true,
            ..Self::default()
        }
    }

    /// Render `text` into the pane. A failed conversion keeps the previous
    /// HTML. Returns `true` if the content was replaced.
    pub fn render(&mut self, converter: &dyn MarkdownConverter, text: &str) -> bool {
        if !self.has_content {
            return false;
        }
        match converter.markdown_to_html(text) {
            Ok(html) => {
                self.html = html;
                true
            }
            Err(err) => {
                tracing::debug!(%err, "preview left stale");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comrak_renders_basic_markdown() {
        let html = ComrakConverter.markdown_to_html("# Title\n\n**bold**").unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_comrak_escapes_raw_html() {
        let html = ComrakConverter
            .markdown_to_html("<script>alert(1)</script>")
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_comrak_gfm_table() {
        let html = ComrakConverter
            .markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .unwrap();
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_failed_conversion_keeps_previous_html() {
        let mut pane = PreviewPane::new(true);
        assert!(pane.render(&ComrakConverter, "first"));
        let before = pane.html.clone();

        let failing = |_: &str| -> Result<String, RenderError> {
            Err(RenderError::Conversion("boom".into()))
        };
        assert!(!pane.render(&failing, "second"));
        assert_eq!(pane.html, before);
    }

    #[test]
    fn test_pane_without_content_element_ignores_render() {
        let mut pane = PreviewPane {
            has_content: false,
            ..PreviewPane::default()
        };
        assert!(!pane.render(&ComrakConverter, "text"));
        assert!(pane.html.is_empty());
    }
}
