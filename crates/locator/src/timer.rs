//! One-shot deferred tasks.
//!
//! The page script only ever needs "run this once, later". [`ManualScheduler`]
//! runs on a virtual clock that only moves when told to.

use std::cell::RefCell;
use std::time::Duration;

use pastefocus_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerHandle>;

    /// Cancelling a handle that already fired or was never issued is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

struct Pending {
    handle: TimerHandle,
    due: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

#[derive(Default)]
pub struct ManualScheduler {
    inner: RefCell<ManualInner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Move the clock forward, running every task that comes due, earliest
    /// first. Tasks may schedule further tasks. Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let due_index = inner
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.handle.0))
                    .map(|(index, _)| index);
                due_index.map(|index| {
                    let pending = inner.pending.remove(index);
                    inner.now = pending.due;
                    pending.task
                })
            };
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        self.inner.borrow_mut().now = target;
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerHandle> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let handle = TimerHandle(inner.next_id);
        let due = inner.now + delay;
        inner.pending.push(Pending { handle, due, task });
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.inner.borrow_mut().pending.retain(|p| p.handle != handle);
    }
}
