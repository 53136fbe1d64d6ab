use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use pastefocus_core::{Config, Platform, Result};

use crate::dom::{Document, MutationBatch};
use crate::pipeline::{Pipeline, ScanLog, ScanReason, SharedScanLog};
use crate::timer::{Scheduler, TimerHandle};
use crate::trigger::{FocusTrigger, KeyStroke, TriggerOutcome};
use crate::watcher::NavigationWatcher;

/// Everything the page script runs, wired to one document.
///
/// The host feeds it key-downs and mutation batches; it owns the only copy of
/// the navigation state.
pub struct Assistant<D: Document + 'static> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    pipeline: Pipeline,
    trigger: FocusTrigger,
    watcher: NavigationWatcher,
    platform: Platform,
    startup_delay: std::time::Duration,
    scans: SharedScanLog,
}

impl<D: Document + 'static> Assistant<D> {
    pub fn new(document: Rc<D>, scheduler: Rc<dyn Scheduler>, config: &Config) -> Self {
        let url = document.location();
        let platform = Platform::from_url(&url);
        let scans: SharedScanLog = Rc::new(RefCell::new(ScanLog::default()));
        info!(%platform, "Paste focus assistant loaded");

        Self {
            watcher: NavigationWatcher::new(&url, config, Rc::clone(&scans)),
            trigger: FocusTrigger::from_config(config).with_platform(platform),
            pipeline: Pipeline::new(),
            startup_delay: config.startup_scan_delay(),
            document,
            scheduler,
            platform,
            scans,
        }
    }

    /// Schedule the one-off startup scan.
    pub fn start(&self) -> Result<TimerHandle> {
        let document = Rc::clone(&self.document);
        let scans = Rc::clone(&self.scans);
        let pipeline = self.pipeline;
        self.scheduler.schedule(
            self.startup_delay,
            Box::new(move || {
                let report = pipeline.diagnostic_scan(&*document, ScanReason::Startup);
                scans.borrow_mut().record(report);
            }),
        )
    }

    pub fn on_key_down(&mut self, key: &KeyStroke) -> TriggerOutcome {
        self.trigger.handle_key_down(&*self.document, &self.pipeline, key)
    }

    pub fn on_mutations(&mut self, batch: MutationBatch) -> Option<TimerHandle> {
        self.watcher.on_mutations(&self.document, self.pipeline, &*self.scheduler, batch)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn document(&self) -> &Rc<D> {
        &self.document
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn watcher(&self) -> &NavigationWatcher {
        &self.watcher
    }

    pub fn scans(&self) -> SharedScanLog {
        Rc::clone(&self.scans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::CaretPlacement;
    use crate::fixture::FixtureDocument;
    use crate::timer::ManualScheduler;
    use std::time::Duration;

    fn assistant(url: &str, markup: &str) -> (Assistant<FixtureDocument>, Rc<ManualScheduler>) {
        let doc = Rc::new(FixtureDocument::parse(url, markup).unwrap());
        let scheduler = Rc::new(ManualScheduler::new());
        let assistant = Assistant::new(doc, scheduler.clone(), &Config::default());
        (assistant, scheduler)
    }

    #[test]
    fn test_platform_from_location() {
        let (a, _) = assistant("https://gemini.google.com/app", "<body></body>");
        assert_eq!(a.platform(), Platform::Gemini);
        assert_eq!(a.watcher().platform(), Platform::Gemini);
        assert_eq!(a.watcher().last_known_url(), "https://gemini.google.com/app");
    }

    #[test]
    fn test_startup_scan_after_delay() {
        let (a, scheduler) = assistant(
            "https://www.perplexity.ai/",
            r#"<body><textarea id=q placeholder="Ask anything..."></textarea></body>"#,
        );
        a.start().unwrap();
        scheduler.advance(Duration::from_millis(1999));
        assert_eq!(a.scans().borrow().count, 0);
        scheduler.advance(Duration::from_millis(1));

        let scans = a.scans();
        let scans = scans.borrow();
        let report = scans.last.as_ref().unwrap();
        assert_eq!(report.reason, ScanReason::Startup);
        assert_eq!(report.inventory.textareas, 1);
        assert_eq!(report.found.as_ref().unwrap().element, "textarea#q");
    }

    #[test]
    fn test_navigation_then_paste_resolves_fresh() {
        let (mut a, scheduler) = assistant(
            "https://claude.ai/",
            r#"<body><div id=old contenteditable="true">hi</div></body>"#,
        );
        let doc = Rc::clone(a.document());

        doc.push_state("https://claude.ai/chat/7");
        let next = r#"<body><textarea id=new placeholder="Talk to Claude"></textarea></body>"#;
        doc.replace_body(next).unwrap();
        assert!(a.on_mutations(doc.take_mutations()).is_some());
        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(a.watcher().last_known_url(), "https://claude.ai/chat/7");
        assert_eq!(a.scans().borrow().count, 1);

        let outcome = a.on_key_down(&KeyStroke::ctrl("v"));
        assert_eq!(outcome, TriggerOutcome::Focused(CaretPlacement::TextFieldEnd { offset: 0 }));
        assert_eq!(doc.active_element(), doc.element_by_id("new"));
    }
}
