//! Client-side navigation detection.
//!
//! Single-page apps swap URL and content without a reload. Every mutation
//! batch compares `location.href` with the last URL seen; on a change a
//! delayed rescan re-runs the pipeline once the new content has rendered.
//! The rescan is diagnostic only and never moves focus.

use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};

use pastefocus_core::{Config, Platform};

use crate::dom::{Document, MutationBatch};
use crate::pipeline::{Pipeline, ScanReason, SharedScanLog};
use crate::timer::{Scheduler, TimerHandle};

pub struct NavigationWatcher {
    last_known_url: String,
    platform: Platform,
    rescan_delay: Duration,
    coalesce: bool,
    pending: Option<TimerHandle>,
    scans: SharedScanLog,
}

impl NavigationWatcher {
    pub fn new(initial_url: &str, config: &Config, scans: SharedScanLog) -> Self {
        Self {
            last_known_url: initial_url.to_string(),
            platform: Platform::from_url(initial_url),
            rescan_delay: config.rescan_delay(),
            coalesce: config.coalesce_rescans,
            pending: None,
            scans,
        }
    }

    pub fn last_known_url(&self) -> &str {
        &self.last_known_url
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Handle one mutation-observer callback. Returns the rescan timer when a
    /// navigation was detected.
    pub fn on_mutations<D: Document + 'static>(
        &mut self,
        document: &Rc<D>,
        pipeline: Pipeline,
        scheduler: &dyn Scheduler,
        batch: MutationBatch,
    ) -> Option<TimerHandle> {
        let current = document.location();
        if current == self.last_known_url {
            return None;
        }

        info!(
            platform = %self.platform,
            from = %self.last_known_url,
            to = %current,
            records = batch.records,
            added = batch.added,
            removed = batch.removed,
            "Navigation detected"
        );
        self.last_known_url = current;

        if self.coalesce {
            if let Some(previous) = self.pending.take() {
                debug!(
                    platform = %self.platform,
                    timer = previous.0,
                    "Superseded rescan cancelled"
                );
                scheduler.cancel(previous);
            }
        }

        let document = Rc::clone(document);
        let scans = Rc::clone(&self.scans);
        let task = Box::new(move || {
            let report = pipeline.diagnostic_scan(&*document, ScanReason::Navigation);
            scans.borrow_mut().record(report);
        });

        match scheduler.schedule(self.rescan_delay, task) {
            Ok(handle) => {
                self.pending = Some(handle);
                Some(handle)
            }
            Err(e) => {
                warn!(platform = %self.platform, error = %e, "Could not schedule rescan");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureDocument;
    use crate::pipeline::ScanLog;
    use crate::timer::ManualScheduler;
    use std::cell::RefCell;

    struct Harness {
        doc: Rc<FixtureDocument>,
        scheduler: ManualScheduler,
        scans: SharedScanLog,
        watcher: NavigationWatcher,
    }

    fn harness(config: Config) -> Harness {
        let doc = Rc::new(
            FixtureDocument::parse(
                "https://chatgpt.com/",
                "<body><textarea id=home></textarea></body>",
            )
            .unwrap(),
        );
        let scans = Rc::new(RefCell::new(ScanLog::default()));
        let watcher = NavigationWatcher::new(&doc.location(), &config, scans.clone());
        Harness { doc, scheduler: ManualScheduler::new(), scans, watcher }
    }

    impl Harness {
        fn navigate(&mut self, url: &str, body: &str) -> Option<TimerHandle> {
            self.doc.push_state(url);
            self.doc.replace_body(body).unwrap();
            let batch = self.doc.take_mutations();
            self.watcher
                .on_mutations(&self.doc, Pipeline::new(), &self.scheduler, batch)
        }
    }

    #[test]
    fn test_url_change_updates_state_and_rescans() {
        let mut h = harness(Config::default());
        let handle = h.navigate(
            "https://chatgpt.com/c/42",
            "<body><textarea id=prompt-textarea></textarea></body>",
        );
        assert!(handle.is_some());
        assert_eq!(h.watcher.platform(), Platform::ChatGpt);
        assert_eq!(h.watcher.last_known_url(), "https://chatgpt.com/c/42");
        assert_eq!(h.scans.borrow().count, 0);

        h.scheduler.advance(Duration::from_millis(999));
        assert_eq!(h.scans.borrow().count, 0);
        h.scheduler.advance(Duration::from_millis(1));

        let scans = h.scans.borrow();
        assert_eq!(scans.count, 1);
        let report = scans.last.as_ref().unwrap();
        assert_eq!(report.reason, ScanReason::Navigation);
        assert_eq!(report.url, "https://chatgpt.com/c/42");
        assert_eq!(report.found.as_ref().unwrap().element, "textarea#prompt-textarea");
    }

    #[test]
    fn test_same_url_mutations_are_ignored() {
        let mut h = harness(Config::default());
        h.doc.replace_body("<body><p>streaming reply</p></body>").unwrap();
        let batch = h.doc.take_mutations();
        assert!(h
            .watcher
            .on_mutations(&h.doc, Pipeline::new(), &h.scheduler, batch)
            .is_none());
        assert_eq!(h.scheduler.pending_count(), 0);
        assert_eq!(h.watcher.last_known_url(), "https://chatgpt.com/");
    }

    #[test]
    fn test_rescan_does_not_move_focus() {
        let mut h = harness(Config::default());
        h.navigate("https://chatgpt.com/c/1", "<body><textarea></textarea></body>");
        h.scheduler.advance(Duration::from_secs(2));
        assert_eq!(h.doc.active_element(), Some(h.doc.body()));
    }

    #[test]
    fn test_quick_navigations_coalesce() {
        let mut h = harness(Config::default());
        h.navigate("https://chatgpt.com/c/1", "<body><textarea></textarea></body>");
        h.scheduler.advance(Duration::from_millis(500));
        h.navigate("https://chatgpt.com/c/2", "<body><textarea></textarea></body>");
        assert_eq!(h.scheduler.pending_count(), 1);

        h.scheduler.advance(Duration::from_secs(2));
        let scans = h.scans.borrow();
        assert_eq!(scans.count, 1);
        assert_eq!(scans.last.as_ref().unwrap().url, "https://chatgpt.com/c/2");
    }

    #[test]
    fn test_independent_rescans_without_coalescing() {
        let config = Config { coalesce_rescans: false, ..Config::default() };
        let mut h = harness(config);
        h.navigate("https://chatgpt.com/c/1", "<body></body>");
        h.navigate("https://chatgpt.com/c/2", "<body></body>");
        assert_eq!(h.scheduler.pending_count(), 2);
        h.scheduler.advance(Duration::from_secs(1));
        assert_eq!(h.scans.borrow().count, 2);
        assert!(h.scans.borrow().last.as_ref().unwrap().found.is_none());
    }
}
