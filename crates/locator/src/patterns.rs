//! Ordered candidate patterns for chat input elements.
//!
//! Each pattern is a tag-and-attribute rule that renders to a CSS selector for
//! `querySelectorAll` and can also be evaluated directly against an element.
//! The list is tried top to bottom: platform-specific rules first, generic
//! fallbacks last. Groups overlap; an element may match several rules.

use std::fmt;

use pastefocus_core::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[name="value"]`
    Equals,
    /// `[name*="value"]`
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrRule {
    pub name: &'static str,
    pub op: AttrOp,
    pub value: &'static str,
    /// CSS `i` flag: compare values ASCII case-insensitively.
    pub ignore_case: bool,
}

impl AttrRule {
    pub const fn equals(name: &'static str, value: &'static str) -> Self {
        Self { name, op: AttrOp::Equals, value, ignore_case: false }
    }

    pub const fn contains(name: &'static str, value: &'static str) -> Self {
        Self { name, op: AttrOp::Contains, value, ignore_case: false }
    }

    pub const fn contains_ignore_case(name: &'static str, value: &'static str) -> Self {
        Self { name, op: AttrOp::Contains, value, ignore_case: true }
    }

    pub fn matches(&self, attrs: &[(String, String)]) -> bool {
        let Some((_, actual)) = attrs.iter().find(|(n, _)| n.eq_ignore_ascii_case(self.name))
        else {
            return false;
        };
        let (actual, expected) = if self.ignore_case {
            (actual.to_ascii_lowercase(), self.value.to_ascii_lowercase())
        } else {
            (actual.clone(), self.value.to_string())
        };
        match self.op {
            AttrOp::Equals => actual == expected,
            // An empty substring never matches in CSS.
            AttrOp::Contains => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

impl fmt::Display for AttrRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            AttrOp::Equals => "=",
            AttrOp::Contains => "*=",
        };
        write!(f, "[{}{}\"{}\"", self.name, op, self.value)?;
        if self.ignore_case {
            f.write_str(" i")?;
        }
        f.write_str("]")
    }
}

/// Which site a pattern was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternGroup {
    Platform(Platform),
    Generic,
}

impl fmt::Display for PatternGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternGroup::Platform(platform) => write!(f, "{}", platform),
            PatternGroup::Generic => f.write_str("generic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePattern {
    pub group: PatternGroup,
    /// Lowercase tag name; `None` matches any tag.
    pub tag: Option<&'static str>,
    pub id: Option<&'static str>,
    pub attrs: &'static [AttrRule],
    /// Rules wrapped in `:not(..)`.
    pub excluded: &'static [AttrRule],
}

impl CandidatePattern {
    const fn new(group: PatternGroup, tag: &'static str, attrs: &'static [AttrRule]) -> Self {
        Self { group, tag: Some(tag), id: None, attrs, excluded: &[] }
    }

    const fn by_id(group: PatternGroup, id: &'static str) -> Self {
        Self { group, tag: None, id: Some(id), attrs: &[], excluded: &[] }
    }

    const fn excluding(self, excluded: &'static [AttrRule]) -> Self {
        Self { excluded, ..self }
    }

    /// Evaluate the rule against an element's tag and attributes.
    pub fn matches(&self, tag: &str, attrs: &[(String, String)]) -> bool {
        if let Some(expected) = self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(id) = self.id {
            if !attrs.iter().any(|(n, v)| n.eq_ignore_ascii_case("id") && v == id) {
                return false;
            }
        }
        self.attrs.iter().all(|rule| rule.matches(attrs))
            && !self.excluded.iter().any(|rule| rule.matches(attrs))
    }

    /// CSS selector equivalent of this pattern.
    pub fn selector(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CandidatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tag, self.id) {
            (Some(tag), _) => f.write_str(tag)?,
            (None, None) => f.write_str("*")?,
            (None, Some(_)) => {}
        }
        if let Some(id) = self.id {
            write!(f, "#{}", id)?;
        }
        for rule in self.attrs {
            write!(f, "{}", rule)?;
        }
        for rule in self.excluded {
            write!(f, ":not({})", rule)?;
        }
        Ok(())
    }
}

const CHATGPT: PatternGroup = PatternGroup::Platform(Platform::ChatGpt);
const CLAUDE: PatternGroup = PatternGroup::Platform(Platform::Claude);
const GEMINI: PatternGroup = PatternGroup::Platform(Platform::Gemini);
const PERPLEXITY: PatternGroup = PatternGroup::Platform(Platform::Perplexity);
const GROK: PatternGroup = PatternGroup::Platform(Platform::Grok);
const DEEPSEEK: PatternGroup = PatternGroup::Platform(Platform::DeepSeek);
const COPILOT: PatternGroup = PatternGroup::Platform(Platform::Copilot);
const GENERIC: PatternGroup = PatternGroup::Generic;

const EDITABLE: AttrRule = AttrRule::equals("contenteditable", "true");
const ARIA_HIDDEN: AttrRule = AttrRule::equals("aria-hidden", "true");

/// The fixed search order. Never reordered at runtime.
pub static CANDIDATE_PATTERNS: [CandidatePattern; 25] = [
    // ChatGPT
    CandidatePattern::by_id(CHATGPT, "prompt-textarea"),
    CandidatePattern::new(CHATGPT, "textarea", &[AttrRule::equals("data-id", "root")]),
    CandidatePattern::new(CHATGPT, "textarea", &[AttrRule::contains("placeholder", "Message")]),
    // Claude
    CandidatePattern::new(
        CLAUDE,
        "div",
        &[EDITABLE, AttrRule::equals("data-testid", "composer-input")],
    ),
    CandidatePattern::new(CLAUDE, "div", &[EDITABLE]),
    CandidatePattern::new(
        CLAUDE,
        "textarea",
        &[AttrRule::contains("placeholder", "Talk to Claude")],
    ),
    // Gemini
    CandidatePattern::new(
        GEMINI,
        "textarea",
        &[AttrRule::contains("placeholder", "Enter a prompt")],
    ),
    CandidatePattern::new(
        GEMINI,
        "textarea",
        &[AttrRule::contains("aria-label", "Enter a prompt")],
    ),
    CandidatePattern::new(GEMINI, "div", &[EDITABLE, AttrRule::contains("aria-label", "Message")]),
    // Perplexity
    CandidatePattern::new(
        PERPLEXITY,
        "textarea",
        &[AttrRule::contains("placeholder", "Ask anything")],
    ),
    CandidatePattern::new(
        PERPLEXITY,
        "textarea",
        &[AttrRule::contains("placeholder", "Follow up")],
    ),
    CandidatePattern::new(
        PERPLEXITY,
        "div",
        &[EDITABLE, AttrRule::equals("data-testid", "search-input")],
    ),
    // Grok
    CandidatePattern::new(GROK, "textarea", &[AttrRule::contains("placeholder", "Ask Grok")]),
    CandidatePattern::new(
        GROK,
        "div",
        &[EDITABLE, AttrRule::equals("data-testid", "tweetTextarea")],
    ),
    // DeepSeek
    CandidatePattern::new(
        DEEPSEEK,
        "textarea",
        &[AttrRule::contains("placeholder", "Send a message")],
    ),
    CandidatePattern::new(
        DEEPSEEK,
        "div",
        &[EDITABLE, AttrRule::contains("placeholder", "Type a message")],
    ),
    // Microsoft Copilot
    CandidatePattern::new(
        COPILOT,
        "textarea",
        &[AttrRule::contains("placeholder", "Ask me anything")],
    ),
    CandidatePattern::new(COPILOT, "div", &[EDITABLE, AttrRule::equals("role", "textbox")]),
    // Generic fallbacks
    CandidatePattern::new(
        GENERIC,
        "textarea",
        &[AttrRule::contains_ignore_case("placeholder", "message")],
    ),
    CandidatePattern::new(
        GENERIC,
        "textarea",
        &[AttrRule::contains_ignore_case("placeholder", "chat")],
    ),
    CandidatePattern::new(
        GENERIC,
        "textarea",
        &[AttrRule::contains_ignore_case("placeholder", "ask")],
    ),
    CandidatePattern::new(
        GENERIC,
        "textarea",
        &[AttrRule::contains_ignore_case("placeholder", "prompt")],
    ),
    CandidatePattern::new(GENERIC, "div", &[EDITABLE]).excluding(&[ARIA_HIDDEN]),
    CandidatePattern::new(GENERIC, "textarea", &[]).excluding(&[ARIA_HIDDEN]),
    CandidatePattern::new(GENERIC, "textarea", &[]),
];

/// Every `textarea`, for the startup inventory.
pub static TEXTAREA_PROBE: CandidatePattern = CandidatePattern::new(GENERIC, "textarea", &[]);

/// Every `[contenteditable="true"]` element, for the startup inventory.
pub static RICH_TEXT_PROBE: CandidatePattern = CandidatePattern {
    group: GENERIC,
    tag: None,
    id: None,
    attrs: &[EDITABLE],
    excluded: &[],
};
