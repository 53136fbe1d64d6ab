//! The DOM seam.
//!
//! Everything the locator needs from a page goes through [`Document`]. The live
//! browser implementation lives in `web` (wasm32 only); [`crate::fixture`]
//! provides an in-memory document parsed from HTML markup.

use std::fmt;

use pastefocus_core::Result;

use crate::patterns::CandidatePattern;

/// Layout and form-control facts about one element, read in a single call so
/// the visibility filter can stay a pure function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    /// The element has a layout parent box (the browser's `offsetParent`).
    pub rendered: bool,
    pub disabled: bool,
    pub read_only: bool,
    /// Inline `style` value for `display`, lowercased.
    pub inline_display: Option<String>,
    /// Inline `style` value for `visibility`, lowercased.
    pub inline_visibility: Option<String>,
}

/// How the caret is placed inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// `contenteditable="true"` region, driven through Selection/Range.
    RichText,
    /// `textarea` or `input`, driven through `setSelectionRange`.
    TextField,
    Other,
}

/// Summary of one mutation-observer callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub records: usize,
    pub added: usize,
    pub removed: usize,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

pub trait Document {
    /// Non-owning handle to a live element. Only valid until the next mutation.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Current `location.href`.
    fn location(&self) -> String;

    /// All elements matching `pattern`, in document order.
    fn query_all(&self, pattern: &CandidatePattern) -> Vec<Self::Element>;

    fn state(&self, element: &Self::Element) -> ElementState;

    /// Lowercase tag name.
    fn tag_name(&self, element: &Self::Element) -> String;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// The element's own `contentEditable` is `"true"` (not inherited).
    fn is_content_editable(&self, element: &Self::Element) -> bool;

    fn active_element(&self) -> Option<Self::Element>;

    fn focus(&self, element: &Self::Element) -> Result<()>;

    fn child_count(&self, element: &Self::Element) -> usize;

    fn append_empty_text(&self, element: &Self::Element) -> Result<()>;

    /// Select the element's full contents, collapse to the end and make that
    /// the document's only selection range.
    fn collapse_selection_to_end(&self, element: &Self::Element) -> Result<()>;

    /// Length of a text field's value in UTF-16 code units.
    fn value_len(&self, element: &Self::Element) -> Option<usize>;

    fn set_selection_range(&self, element: &Self::Element, start: usize, end: usize)
        -> Result<()>;

    fn edit_kind(&self, element: &Self::Element) -> EditKind {
        if self.is_content_editable(element) {
            return EditKind::RichText;
        }
        match self.tag_name(element).as_str() {
            "textarea" | "input" => EditKind::TextField,
            _ => EditKind::Other,
        }
    }

    /// Short label such as `textarea#prompt-textarea` for logs.
    fn describe(&self, element: &Self::Element) -> String {
        let tag = self.tag_name(element);
        match self.attribute(element, "id") {
            Some(id) if !id.is_empty() => format!("{}#{}", tag, id),
            _ => match self.attribute(element, "data-testid") {
                Some(test_id) => format!("{}[data-testid=\"{}\"]", tag, test_id),
                None => tag,
            },
        }
    }
}

/// Value of `property` in an inline `style` attribute, lowercased and without
/// `!important`. Later declarations win, as in CSS.
pub fn inline_style_value(style: &str, property: &str) -> Option<String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| {
            let value = value.trim().to_ascii_lowercase();
            value.trim_end_matches("!important").trim().to_string()
        })
        .last()
}
