use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use core_types::ListenerId;
use html::Id;

use crate::Page;

pub type ListenerCallback = Rc<dyn Fn(&Page, &Event)>;

/// An event travelling from its target up to the document.
#[derive(Debug)]
pub struct Event {
    pub kind: String,
    pub target: Id,
    current_target: Cell<Id>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub(crate) fn new(kind: &str, target: Id) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// The node whose listener is running.
    pub fn current_target(&self) -> Id {
        self.current_target.get()
    }

    /// Listeners on later nodes of the path are skipped; the remaining
    /// listeners of the current node still run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_current_target(&self, id: Id) {
        self.current_target.set(id);
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

struct Listener {
    id: ListenerId,
    kind: String,
    once: bool,
    callback: ListenerCallback,
}

/// Registered listeners keyed by target node, in registration order.
#[derive(Default)]
pub(crate) struct ListenerStore {
    next_id: ListenerId,
    by_target: HashMap<Id, Vec<Listener>>,
}

impl ListenerStore {
    pub(crate) fn add(
        &mut self,
        target: Id,
        kind: &str,
        once: bool,
        callback: ListenerCallback,
    ) -> ListenerId {
        self.next_id += 1;
        let id = self.next_id;
        self.by_target.entry(target).or_default().push(Listener {
            id,
            kind: kind.to_string(),
            once,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        for list in self.by_target.values_mut() {
            if let Some(pos) = list.iter().position(|l| l.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.by_target
            .values()
            .any(|list| list.iter().any(|l| l.id == id))
    }

    /// Listeners currently registered for `kind` on `target`, with their
    /// `once` flag.
    pub(crate) fn snapshot(
        &self,
        target: Id,
        kind: &str,
    ) -> Vec<(ListenerId, bool, ListenerCallback)> {
        self.by_target
            .get(&target)
            .map(|list| {
                list.iter()
                    .filter(|l| l.kind == kind)
                    .map(|l| (l.id, l.once, Rc::clone(&l.callback)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, target: Id, kind: &str) -> usize {
        self.by_target
            .get(&target)
            .map_or(0, |list| list.iter().filter(|l| l.kind == kind).count())
    }

    pub(crate) fn clear(&mut self) {
        self.by_target.clear();
    }
}
