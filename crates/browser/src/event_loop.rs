//! Task queue, timers and outstanding fetches of a page.
//!
//! Invariants:
//! - Tasks run in FIFO order, one at a time.
//! - Timers become tasks once due, ordered by deadline and then by the order
//!   they were scheduled in.
//! - Every registered fetch callback is taken exactly once.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::{Duration, Instant};

use core_types::{RequestId, TimerId};
use net::{NetError, Response};

use crate::Page;

pub(crate) type Task = Box<dyn FnOnce(&Page)>;
pub(crate) type FetchCallback = Box<dyn FnOnce(&Page, Result<Response, NetError>)>;

struct Timer {
    deadline: Instant,
    seq: u64,
    id: TimerId,
    callback: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // reversed: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
pub(crate) struct EventLoop {
    tasks: VecDeque<Task>,
    timers: BinaryHeap<Timer>,
    next_timer: TimerId,
    timer_seq: u64,
    next_request: RequestId,
    pending: HashMap<RequestId, FetchCallback>,
}

impl EventLoop {
    pub(crate) fn push_task(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    pub(crate) fn pop_task(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub(crate) fn push_timer(&mut self, now: Instant, delay: Duration, callback: Task) -> TimerId {
        self.next_timer += 1;
        self.timer_seq += 1;
        let id = self.next_timer;
        self.timers.push(Timer {
            deadline: now + delay,
            seq: self.timer_seq,
            id,
            callback,
        });
        id
    }

    /// Moves every timer due at `now` onto the task queue. Returns how many
    /// were moved.
    pub(crate) fn promote_due_timers(&mut self, now: Instant) -> usize {
        let mut moved = 0;
        while self.timers.peek().is_some_and(|t| t.deadline <= now) {
            if let Some(timer) = self.timers.pop() {
                log::trace!(target: "browser.event_loop", "timer {} due", timer.id);
                self.tasks.push_back(timer.callback);
                moved += 1;
            }
        }
        moved
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.timers.peek().map(|t| t.deadline)
    }

    pub(crate) fn register_fetch(&mut self, callback: FetchCallback) -> RequestId {
        self.next_request += 1;
        self.pending.insert(self.next_request, callback);
        self.next_request
    }

    pub(crate) fn take_fetch(&mut self, request_id: RequestId) -> Option<FetchCallback> {
        self.pending.remove(&request_id)
    }

    pub(crate) fn has_pending_fetches(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Task {
        let log = Rc::clone(log);
        Box::new(move |_| log.borrow_mut().push(name))
    }

    #[test]
    fn timers_promote_by_deadline_then_insertion() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut ev = EventLoop::default();
        let now = Instant::now();
        ev.push_timer(now, Duration::from_millis(20), recorder(&log, "late"));
        ev.push_timer(now, Duration::from_millis(5), recorder(&log, "first"));
        ev.push_timer(now, Duration::from_millis(5), recorder(&log, "second"));

        assert_eq!(ev.next_deadline(), Some(now + Duration::from_millis(5)));
        assert_eq!(ev.promote_due_timers(now), 0);
        assert_eq!(ev.promote_due_timers(now + Duration::from_millis(10)), 2);
        assert!(ev.has_tasks());

        let page = Page::new(crate::PageConfig::default());
        while let Some(task) = ev.pop_task() {
            task(&page);
        }
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(ev.promote_due_timers(now + Duration::from_millis(20)), 1);
    }

    #[test]
    fn fetch_callbacks_are_taken_once() {
        let mut ev = EventLoop::default();
        let a = ev.register_fetch(Box::new(|_, _| {}));
        let b = ev.register_fetch(Box::new(|_, _| {}));
        assert_ne!(a, b);
        assert!(ev.has_pending_fetches());
        assert!(ev.take_fetch(a).is_some());
        assert!(ev.take_fetch(a).is_none());
        assert!(ev.take_fetch(b).is_some());
        assert!(!ev.has_pending_fetches());
    }
}
