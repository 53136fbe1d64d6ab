//! Chat input discovery and paste-focus engine.
//!
//! - `patterns` / `pipeline`: ordered search for the most plausible input
//! - `visibility`: usable-element filter
//! - `caret`: focus and caret placement
//! - `trigger`: paste shortcut handling
//! - `watcher`: client-side navigation detection
//! - `assistant`: wires the above to one document

pub mod assistant;
pub mod caret;
pub mod dom;
pub mod fixture;
pub mod patterns;
pub mod pipeline;
pub mod timer;
pub mod trigger;
pub mod visibility;
pub mod watcher;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use assistant::Assistant;
pub use caret::{place_caret, CaretPlacement};
pub use dom::{Document, EditKind, ElementState, MutationBatch};
pub use fixture::FixtureDocument;
pub use patterns::{CandidatePattern, PatternGroup, CANDIDATE_PATTERNS};
pub use pipeline::{Discovery, Pipeline, ScanReason, ScanReport};
pub use timer::{ManualScheduler, Scheduler, TimerHandle};
pub use trigger::{FocusTrigger, KeyStroke, TriggerOutcome};
pub use watcher::NavigationWatcher;
