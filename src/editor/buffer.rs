use std::sync::LazyLock;

use regex::Regex;
use ropey::Rope;

/// One unit of leading indentation: a tab, else up to four spaces, else a
/// single other whitespace character.
static OUTDENT_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\t| {1,4}|\s)").unwrap_or_else(|err| panic!("invalid outdent regex: {err}"))
});

/// A selection over the buffer in character offsets, `start <= end`.
///
/// An empty selection is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Selection between two offsets in either order.
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub const fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }
}

/// A text buffer backed by a rope, with a selection.
///
/// All offsets are character indices, matching how a textarea reports
/// its selection.
pub struct EditorBuffer {
    rope: Rope,
    selection: Selection,
}

impl EditorBuffer {
    /// Create a new buffer from a string, caret at the start.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selection: Selection::default(),
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content, as when a host writes the textarea value.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.selection = self.clamp(self.selection);
    }

    /// Number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Select `[start, end)`, clamped to the buffer.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection = self.clamp(Selection::new(start, end));
    }

    pub fn selected_text(&self) -> String {
        self.rope
            .slice(self.selection.start..self.selection.end)
            .to_string()
    }

    /// Replace the selection with `text` and leave the caret after it.
    pub fn insert_str(&mut self, text: &str) {
        let Selection { start, end } = self.selection;
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.selection = Selection::caret(start + text.chars().count());
    }

    /// Surround the selection with `before` and `after`, then re-select the
    /// originally selected text inside the new markup.
    ///
    /// With an empty selection the markup is inserted at the caret and the
    /// caret lands between `before` and `after`.
    pub fn wrap_selection(&mut self, before: &str, after: &str) -> Selection {
        let Selection { start, end } = self.selection;
        let selected_len = end - start;
        self.rope.insert(end, after);
        self.rope.insert(start, before);
        let new_start = start + before.chars().count();
        self.selection = Selection {
            start: new_start,
            end: new_start + selected_len,
        };
        self.selection
    }

    /// Whether the selection spans more than one line.
    pub fn selection_is_multiline(&self) -> bool {
        let Selection { start, end } = self.selection;
        self.rope.slice(start..end).chars().any(|c| c == '\n')
    }

    /// Tab key handling.
    ///
    /// Multi-line selections are indented (or outdented with `shift`) line by
    /// line and the whole block stays selected. Otherwise both Tab and
    /// Shift+Tab replace the selection with a single tab.
    /// Returns `true` if the text changed.
    pub fn handle_tab(&mut self, shift: bool) -> bool {
        if self.selection_is_multiline() {
            let (first, last) = self.selected_line_span();
            let changed = if shift {
                self.outdent_lines(first, last)
            } else {
                self.indent_lines(first, last)
            };
            let block_start = self.rope.line_to_char(first);
            let block_end = self.rope.line_to_char(last) + self.line_len_chars(last);
            self.selection = Selection::new(block_start, block_end);
            return changed;
        }

        self.insert_str("\t");
        true
    }

    /// Prefix each line in `first..=last` with a tab.
    pub fn indent_lines(&mut self, first: usize, last: usize) -> bool {
        let last = last.min(self.line_count().saturating_sub(1));
        for line in (first..=last).rev() {
            let at = self.rope.line_to_char(line);
            self.rope.insert_char(at, '\t');
        }
        true
    }

    /// Remove one indent unit from each line in `first..=last`.
    pub fn outdent_lines(&mut self, first: usize, last: usize) -> bool {
        let last = last.min(self.line_count().saturating_sub(1));
        let mut changed = false;
        for line in (first..=last).rev() {
            changed |= self.outdent_line(line) > 0;
        }
        changed
    }

    // --- Private helpers ---

    /// Remove one indent unit from `line`, returning the chars removed.
    fn outdent_line(&mut self, line: usize) -> usize {
        let Some(text) = self.line_at(line) else {
            return 0;
        };
        let Some(found) = OUTDENT_UNIT.find(&text) else {
            return 0;
        };
        let removed = found.as_str().chars().count();
        if removed > 0 {
            let at = self.rope.line_to_char(line);
            self.rope.remove(at..at + removed);
        }
        removed
    }

    /// Lines touched by the selection. A selection ending at the very start
    /// of a line does not include that line.
    fn selected_line_span(&self) -> (usize, usize) {
        let Selection { start, end } = self.selection;
        let first = self.rope.char_to_line(start);
        let mut last = self.rope.char_to_line(end);
        if last > first && self.rope.line_to_char(last) == end {
            last -= 1;
        }
        (first, last)
    }

    fn line_len_chars(&self, line: usize) -> usize {
        self.line_at(line).map_or(0, |s| s.chars().count())
    }

    fn clamp(&self, selection: Selection) -> Selection {
        let max = self.rope.len_chars();
        Selection::new(selection.start.min(max), selection.end.min(max))
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("selection", &self.selection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(text: &str, start: usize, end: usize) -> EditorBuffer {
        let mut buf = EditorBuffer::from_text(text);
        buf.set_selection(start, end);
        buf
    }

    // --- Construction and basic queries ---

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
    }

    #[test]
    fn test_from_text_trailing_newline() {
        let buf = EditorBuffer::from_text("hello\n");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line_at(0), Some("hello".to_string()));
        assert_eq!(buf.line_at(1), Some(String::new()));
    }

    #[test]
    fn test_set_selection_normalizes_and_clamps() {
        let mut buf = EditorBuffer::from_text("abc");
        buf.set_selection(5, 1);
        assert_eq!(buf.selection(), Selection { start: 1, end: 3 });
        assert_eq!(buf.selected_text(), "bc");
    }

    // --- Wrapping ---

    #[test]
    fn test_wrap_bold_reselects_inner_text() {
        let mut buf = buffer_with("hello", 0, 5);
        let sel = buf.wrap_selection("**", "**");
        assert_eq!(buf.text(), "**hello**");
        assert_eq!(sel, Selection { start: 2, end: 7 });
        assert_eq!(buf.selected_text(), "hello");
    }

    #[test]
    fn test_wrap_empty_selection_places_caret_between() {
        let mut buf = buffer_with("ab", 1, 1);
        let sel = buf.wrap_selection("[", "](http://)");
        assert_eq!(buf.text(), "a[](http://)b");
        assert_eq!(sel, Selection::caret(2));
    }

    #[test]
    fn test_wrap_prefix_only() {
        let mut buf = buffer_with("title", 0, 5);
        buf.wrap_selection("# ", "");
        assert_eq!(buf.text(), "# title");
        assert_eq!(buf.selection(), Selection { start: 2, end: 7 });
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        let mut buf = buffer_with("日本語", 1, 2);
        let sel = buf.wrap_selection("«", "»");
        assert_eq!(buf.text(), "日«本»語");
        assert_eq!(sel, Selection { start: 2, end: 3 });
    }

    // --- Tab handling ---

    #[test]
    fn test_tab_on_caret_inserts_one_tab() {
        let mut buf = buffer_with("ab", 1, 1);
        assert!(buf.handle_tab(false));
        assert_eq!(buf.text(), "a\tb");
        assert_eq!(buf.selection(), Selection::caret(2));
    }

    #[test]
    fn test_tab_on_single_line_selection_replaces_it() {
        let mut buf = buffer_with("abcd", 1, 3);
        buf.handle_tab(false);
        assert_eq!(buf.text(), "a\td");
        assert_eq!(buf.selection(), Selection::caret(2));
    }

    #[test]
    fn test_tab_indents_every_selected_line() {
        let mut buf = buffer_with("one\ntwo\nthree", 1, 6);
        assert!(buf.handle_tab(false));
        assert_eq!(buf.text(), "\tone\n\ttwo\nthree");
        assert_eq!(buf.selected_text(), "\tone\n\ttwo");
    }

    #[test]
    fn test_selection_ending_at_line_start_excludes_that_line() {
        let mut buf = buffer_with("one\ntwo\nthree", 0, 8);
        buf.handle_tab(false);
        assert_eq!(buf.text(), "\tone\n\ttwo\nthree");
    }

    #[test]
    fn test_shift_tab_removes_one_tab_per_line() {
        let mut buf = buffer_with("\t\tone\n\ttwo", 0, 10);
        assert!(buf.handle_tab(true));
        assert_eq!(buf.text(), "\tone\ntwo");
        assert_eq!(buf.selected_text(), "\tone\ntwo");
    }

    #[test]
    fn test_shift_tab_removes_up_to_four_spaces() {
        let mut buf = buffer_with("      six\n  two\nnone", 0, 20);
        buf.handle_tab(true);
        assert_eq!(buf.text(), "  six\ntwo\nnone");
    }

    #[test]
    fn test_shift_tab_removes_one_other_whitespace_char() {
        let mut buf = buffer_with("\u{3000}\u{3000}wide\nx", 0, 8);
        buf.handle_tab(true);
        assert_eq!(buf.text(), "\u{3000}wide\nx");
    }

    #[test]
    fn test_shift_tab_without_indent_is_noop() {
        let mut buf = buffer_with("plain\ntext", 0, 10);
        assert!(!buf.handle_tab(true));
        assert_eq!(buf.text(), "plain\ntext");
    }

    #[test]
    fn test_shift_tab_on_caret_inserts_one_tab() {
        let mut buf = buffer_with("ab", 1, 1);
        assert!(buf.handle_tab(true));
        assert_eq!(buf.text(), "a\tb");
        assert_eq!(buf.selection(), Selection::caret(2));
    }

    #[test]
    fn test_shift_tab_on_indented_single_line_selection_replaces_it() {
        let mut buf = buffer_with("\tkeep", 1, 3);
        assert!(buf.handle_tab(true));
        assert_eq!(buf.text(), "\t\tep");
        assert_eq!(buf.selection(), Selection::caret(2));
    }

    #[test]
    fn test_set_text_clamps_selection() {
        let mut buf = buffer_with("long text", 4, 9);
        buf.set_text("ab");
        assert_eq!(buf.selection(), Selection { start: 2, end: 2 });
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrap_preserves_selected_text(
                text in "[a-z \n]{0,40}",
                a in 0..40usize,
                b in 0..40usize,
                before in "[*#>\\[]{0,3}",
                after in "[*\\]()]{0,3}",
            ) {
                let mut buf = EditorBuffer::from_text(&text);
                buf.set_selection(a, b);
                let original = buf.selected_text();
                buf.wrap_selection(&before, &after);
                prop_assert_eq!(buf.selected_text(), original.clone());
                let expected_len = text.chars().count()
                    + before.chars().count()
                    + after.chars().count();
                prop_assert_eq!(buf.len_chars(), expected_len);
            }

            #[test]
            fn indent_then_outdent_restores_text(
                lines in prop::collection::vec("[a-z]{0,8}", 2..6),
            ) {
                let text = lines.join("\n");
                let mut buf = EditorBuffer::from_text(&text);
                buf.set_selection(0, text.chars().count());
                buf.handle_tab(false);
                buf.handle_tab(true);
                prop_assert_eq!(buf.text(), text);
            }
        }
    }
}
