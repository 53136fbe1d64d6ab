use tracing::debug;

use pastefocus_core::{Error, Result};

use crate::dom::{Document, EditKind};

/// Where the caret ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPlacement {
    /// Collapsed document selection at the end of a rich-text region.
    RichTextEnd { inserted_text_node: bool },
    /// `selectionStart == selectionEnd == offset` in a text field.
    TextFieldEnd { offset: usize },
    /// Focused, but the element holds no text to place a caret in.
    FocusOnly,
}

/// Focus `element` and put the caret after its last character.
///
/// A rich-text region with no children gets an empty text node first; some
/// engines cannot host a collapsed range in an empty element.
pub fn place_caret<D: Document>(
    document: &D,
    element: Option<&D::Element>,
) -> Result<CaretPlacement> {
    let element = element.ok_or(Error::NoElement)?;
    document.focus(element)?;

    match document.edit_kind(element) {
        EditKind::RichText => {
            let inserted_text_node = document.child_count(element) == 0;
            if inserted_text_node {
                document.append_empty_text(element)?;
            }
            document.collapse_selection_to_end(element)?;
            debug!(
                element = %document.describe(element),
                inserted_text_node,
                "Caret at end of rich text"
            );
            Ok(CaretPlacement::RichTextEnd { inserted_text_node })
        }
        EditKind::TextField => {
            let offset = document.value_len(element).unwrap_or(0);
            document.set_selection_range(element, offset, offset)?;
            debug!(element = %document.describe(element), offset, "Caret at end of text field");
            Ok(CaretPlacement::TextFieldEnd { offset })
        }
        EditKind::Other => Ok(CaretPlacement::FocusOnly),
    }
}
