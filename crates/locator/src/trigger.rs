//! Paste-shortcut handling.
//!
//! The browser listener is registered in the capture phase so it sees the
//! key-down before the page's own handlers can consume it. The event is never
//! cancelled: the native paste lands in whatever element ends up focused.

use tracing::{debug, info, warn};

use pastefocus_core::{Config, Platform};

use crate::caret::{place_caret, CaretPlacement};
use crate::dom::Document;
use crate::pipeline::Pipeline;

/// A key-down event, reduced to what the trigger looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyStroke {
    pub fn plain(key: &str) -> Self {
        Self { key: key.to_string(), ..Self::default() }
    }

    pub fn ctrl(key: &str) -> Self {
        Self { ctrl: true, ..Self::plain(key) }
    }

    pub fn meta(key: &str) -> Self {
        Self { meta: true, ..Self::plain(key) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Handling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    NotShortcut,
    /// Focus was already in an input; left alone.
    AlreadyEditing,
    NothingFound,
    Focused(CaretPlacement),
    /// Placement failed part way; the handler gave up quietly.
    Failed(String),
}

pub struct FocusTrigger {
    shortcut_key: String,
    platform: Platform,
    state: TriggerState,
}

impl FocusTrigger {
    pub fn new(shortcut_key: &str) -> Self {
        Self {
            shortcut_key: shortcut_key.to_string(),
            platform: Platform::Unknown,
            state: TriggerState::Idle,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.shortcut_key)
    }

    /// Label log events with the site the page belongs to.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Ctrl or Meta plus the shortcut key. Other modifiers are ignored.
    pub fn is_shortcut(&self, key: &KeyStroke) -> bool {
        (key.ctrl || key.meta) && key.key == self.shortcut_key
    }

    pub fn handle_key_down<D: Document>(
        &mut self,
        document: &D,
        pipeline: &Pipeline,
        key: &KeyStroke,
    ) -> TriggerOutcome {
        if !self.is_shortcut(key) {
            return TriggerOutcome::NotShortcut;
        }

        self.state = TriggerState::Handling;
        let outcome = self.request_focus(document, pipeline);
        self.state = TriggerState::Idle;
        outcome
    }

    fn request_focus<D: Document>(&self, document: &D, pipeline: &Pipeline) -> TriggerOutcome {
        if let Some(active) = document.active_element() {
            if is_input_capable(document, &active) {
                debug!(
                    platform = %self.platform,
                    active = %document.describe(&active),
                    "Already in an input field"
                );
                return TriggerOutcome::AlreadyEditing;
            }
        }

        let Some(discovery) = pipeline.find(document) else {
            info!(platform = %self.platform, url = %document.location(), "No input found");
            return TriggerOutcome::NothingFound;
        };

        match place_caret(document, Some(&discovery.element)) {
            Ok(placement) => {
                info!(
                    platform = %self.platform,
                    element = %document.describe(&discovery.element),
                    group = %discovery.pattern.group,
                    "Focused input"
                );
                TriggerOutcome::Focused(placement)
            }
            Err(e) => {
                warn!(platform = %self.platform, error = %e, "Caret placement failed");
                TriggerOutcome::Failed(e.to_string())
            }
        }
    }
}

/// `input`, `textarea`, a rich-text region, or anything with `role="textbox"`.
pub fn is_input_capable<D: Document>(document: &D, element: &D::Element) -> bool {
    matches!(document.tag_name(element).as_str(), "input" | "textarea")
        || document.is_content_editable(element)
        || document.attribute(element, "role").as_deref() == Some("textbox")
}
