use crate::dom::{Document, ElementState};

/// True only for an element a user could type into right now. Anything the
/// backend cannot confirm counts as unusable.
pub fn is_usable(state: &ElementState) -> bool {
    state.rendered
        && !state.disabled
        && !state.read_only
        && state.inline_display.as_deref() != Some("none")
        && state.inline_visibility.as_deref() != Some("hidden")
}

pub fn is_usable_element<D: Document>(document: &D, element: &D::Element) -> bool {
    is_usable(&document.state(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureDocument;

    fn visible() -> ElementState {
        ElementState {
            rendered: true,
            ..ElementState::default()
        }
    }

    #[test]
    fn test_plain_visible_field_is_usable() {
        assert!(is_usable(&visible()));
    }

    #[test]
    fn test_each_blocker_rejects() {
        let cases = [
            ElementState { rendered: false, ..visible() },
            ElementState { disabled: true, ..visible() },
            ElementState { read_only: true, ..visible() },
            ElementState { inline_display: Some("none".into()), ..visible() },
            ElementState { inline_visibility: Some("hidden".into()), ..visible() },
        ];
        for state in cases {
            assert!(!is_usable(&state), "{:?} should be rejected", state);
        }
    }

    #[test]
    fn test_other_inline_values_pass() {
        let state = ElementState {
            inline_display: Some("block".into()),
            inline_visibility: Some("visible".into()),
            ..visible()
        };
        assert!(is_usable(&state));
    }

    #[test]
    fn test_fixture_elements() {
        let doc = FixtureDocument::parse(
            "https://example.org/",
            r#"<body>
                <textarea id="ok"></textarea>
                <textarea id="none" style="display:none"></textarea>
                <textarea id="hidden" style="visibility: hidden"></textarea>
                <textarea id="disabled" disabled></textarea>
                <textarea id="readonly" readonly></textarea>
                <div style="display:none"><textarea id="nested"></textarea></div>
                <section hidden><textarea id="hidden-attr"></textarea></section>
                <input type="hidden" id="hidden-input" value="token">
            </body>"#,
        )
        .unwrap();

        let usable = |id: &str| is_usable_element(&doc, &doc.element_by_id(id).unwrap());
        assert!(usable("ok"));
        assert!(!usable("none"));
        assert!(!usable("hidden"));
        assert!(!usable("disabled"));
        assert!(!usable("readonly"));
        assert!(!usable("nested"));
        assert!(!usable("hidden-attr"));
        assert!(!usable("hidden-input"));
    }
}
