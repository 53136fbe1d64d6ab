use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use pastefocus_core::Platform;

use crate::dom::Document;
use crate::patterns::{CandidatePattern, CANDIDATE_PATTERNS, RICH_TEXT_PROBE, TEXTAREA_PROBE};
use crate::visibility;

/// A usable element and the pattern that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery<E> {
    pub element: E,
    /// Position of the winning pattern in the search order.
    pub pattern_index: usize,
    pub pattern: &'static CandidatePattern,
}

/// Raw candidate counts, regardless of visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inventory {
    pub textareas: usize,
    pub rich_text: usize,
}

/// Ordered search over the candidate patterns.
///
/// Nothing is cached: every call re-queries the live document.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    patterns: &'static [CandidatePattern],
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_patterns(&CANDIDATE_PATTERNS)
    }

    pub fn with_patterns(patterns: &'static [CandidatePattern]) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &'static [CandidatePattern] {
        self.patterns
    }

    /// First usable element of the first pattern that has one.
    pub fn find<D: Document>(&self, document: &D) -> Option<Discovery<D::Element>> {
        let patterns: &'static [CandidatePattern] = self.patterns;
        patterns.iter().enumerate().find_map(|(pattern_index, pattern)| {
            let element = document
                .query_all(pattern)
                .into_iter()
                .find(|element| visibility::is_usable_element(document, element))?;
            debug!(pattern = %pattern, index = pattern_index, "Candidate accepted");
            Some(Discovery { element, pattern_index, pattern })
        })
    }

    pub fn inventory<D: Document>(&self, document: &D) -> Inventory {
        Inventory {
            textareas: document.query_all(&TEXTAREA_PROBE).len(),
            rich_text: document.query_all(&RICH_TEXT_PROBE).len(),
        }
    }

    /// Run the search for diagnostics only and record what it saw.
    pub fn diagnostic_scan<D: Document>(&self, document: &D, reason: ScanReason) -> ScanReport {
        let inventory = self.inventory(document);
        let found = self.find(document).map(|discovery| ScanHit {
            element: document.describe(&discovery.element),
            pattern: discovery.pattern.selector(),
            pattern_index: discovery.pattern_index,
        });
        let report = ScanReport {
            reason,
            url: document.location(),
            inventory,
            found,
        };
        let platform = Platform::from_url(&report.url);
        match &report.found {
            Some(hit) => info!(
                %platform,
                reason = ?reason,
                element = %hit.element,
                pattern = %hit.pattern,
                textareas = inventory.textareas,
                rich_text = inventory.rich_text,
                "Input detected"
            ),
            None => info!(
                %platform,
                reason = ?reason,
                textareas = inventory.textareas,
                rich_text = inventory.rich_text,
                "No input found"
            ),
        }
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanReason {
    Startup,
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub element: String,
    pub pattern: String,
    pub pattern_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub reason: ScanReason,
    pub url: String,
    pub inventory: Inventory,
    pub found: Option<ScanHit>,
}

/// Shared record of diagnostic scans, written from timer callbacks.
#[derive(Debug, Default)]
pub struct ScanLog {
    pub count: usize,
    pub last: Option<ScanReport>,
}

pub type SharedScanLog = Rc<RefCell<ScanLog>>;

impl ScanLog {
    pub fn record(&mut self, report: ScanReport) {
        self.count += 1;
        self.last = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureDocument;

    fn page(url: &str, body: &str) -> FixtureDocument {
        FixtureDocument::parse(url, &format!("<html><body>{}</body></html>", body)).unwrap()
    }

    fn found_id(doc: &FixtureDocument) -> Option<String> {
        let discovery = Pipeline::new().find(doc)?;
        doc.attribute(&discovery.element, "id")
    }

    #[test]
    fn test_platform_fixtures() {
        let cases = [
            (
                "https://chatgpt.com/",
                r#"<form>
                     <textarea id="prompt-textarea" placeholder="Ask anything"></textarea>
                   </form>"#,
                "prompt-textarea",
            ),
            (
                "https://claude.ai/new",
                r#"<div id="sidebar" contenteditable="true" style="display:none"></div>
                   <div id="composer" contenteditable="true" data-testid="composer-input"></div>"#,
                "composer",
            ),
            (
                "https://gemini.google.com/app",
                r#"<textarea id="g" aria-label="Enter a prompt here"></textarea>"#,
                "g",
            ),
            (
                "https://www.perplexity.ai/",
                r#"<textarea id="p" placeholder="Ask anything..."></textarea>"#,
                "p",
            ),
            (
                "https://grok.com/",
                r#"<textarea id="x" placeholder="Ask Grok anything"></textarea>"#,
                "x",
            ),
            (
                "https://chat.deepseek.com/",
                r#"<textarea id="d" placeholder="Send a message to DeepSeek"></textarea>"#,
                "d",
            ),
            (
                "https://copilot.microsoft.com/",
                r#"<textarea id="c" placeholder="Ask me anything..."></textarea>"#,
                "c",
            ),
            (
                "https://example.org/",
                r#"<textarea id="other" aria-hidden="true"></textarea>
                   <textarea id="generic" placeholder="Start a chat"></textarea>"#,
                "generic",
            ),
        ];

        for (url, body, expected) in cases {
            let doc = page(url, body);
            assert_eq!(found_id(&doc).as_deref(), Some(expected), "page {}", url);
        }
    }

    #[test]
    fn test_earlier_pattern_beats_document_order() {
        let doc = page(
            "https://chatgpt.com/",
            r#"<textarea id="plain"></textarea>
               <textarea id="root" data-id="root"></textarea>"#,
        );
        let discovery = Pipeline::new().find(&doc).unwrap();
        assert_eq!(doc.attribute(&discovery.element, "id").as_deref(), Some("root"));
        assert_eq!(discovery.pattern_index, 1);
        assert_eq!(discovery.pattern.selector(), r#"textarea[data-id="root"]"#);
    }

    #[test]
    fn test_visible_candidate_wins_regardless_of_order() {
        for body in [
            r#"<textarea id="hidden" style="display:none"></textarea>
               <textarea id="shown"></textarea>"#,
            r#"<textarea id="shown"></textarea>
               <textarea id="hidden" style="display:none"></textarea>"#,
        ] {
            let doc = page("https://example.org/", body);
            assert_eq!(found_id(&doc).as_deref(), Some("shown"));
        }
    }

    #[test]
    fn test_never_returns_unusable() {
        let doc = page(
            "https://example.org/",
            r#"<textarea disabled placeholder="Message"></textarea>
               <textarea readonly></textarea>
               <div hidden><textarea></textarea></div>
               <div contenteditable="true" style="visibility:hidden"></div>"#,
        );
        assert!(Pipeline::new().find(&doc).is_none());
    }

    #[test]
    fn test_hidden_input_with_matching_id_is_skipped() {
        let doc = page(
            "https://chatgpt.com/",
            r#"<input type="hidden" id="prompt-textarea" value="x">
               <textarea id="visible" placeholder="Message"></textarea>"#,
        );
        assert_eq!(found_id(&doc).as_deref(), Some("visible"));

        let only_hidden = page(
            "https://chatgpt.com/",
            r#"<input type="hidden" id="prompt-textarea" value="x">"#,
        );
        assert!(Pipeline::new().find(&only_hidden).is_none());
    }

    #[test]
    fn test_idempotent_on_unchanged_dom() {
        let doc = page(
            "https://claude.ai/",
            r#"<div contenteditable="true" id="a"></div><textarea id="b"></textarea>"#,
        );
        let pipeline = Pipeline::new();
        let first = pipeline.find(&doc).unwrap();
        let second = pipeline.find(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_page_is_none_not_error() {
        let doc = page("https://example.org/", "<p>nothing to type into</p>");
        assert!(Pipeline::new().find(&doc).is_none());
    }

    #[test]
    fn test_diagnostic_scan_report() {
        let doc = page(
            "https://claude.ai/chat",
            r#"<textarea style="display:none"></textarea>
               <div contenteditable="true" data-testid="composer-input"></div>"#,
        );
        let report = Pipeline::new().diagnostic_scan(&doc, ScanReason::Startup);
        assert_eq!(report.url, "https://claude.ai/chat");
        assert_eq!(report.inventory, Inventory { textareas: 1, rich_text: 1 });
        let hit = report.found.unwrap();
        assert_eq!(hit.element, r#"div[data-testid="composer-input"]"#);
        assert_eq!(hit.pattern_index, 3);

        let mut log = ScanLog::default();
        log.record(Pipeline::new().diagnostic_scan(&doc, ScanReason::Navigation));
        assert_eq!(log.count, 1);
        assert_eq!(log.last.unwrap().reason, ScanReason::Navigation);
    }
}
