use std::cell::{Cell, Ref, RefCell, RefMut};
use std::future::Future;
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bus::{Bus, CoreCommand, CoreEvent};
use core_types::{ListenerId, ReadyState, RequestId, TimerId};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use html::{Document, Id};
use net::{Client, HttpConfig, NetError, Request, Response};
use runtime_net::start_net_runtime;
use url::Url;

use crate::event_loop::EventLoop;
use crate::events::{Event, ListenerStore};

#[derive(Clone, Debug, Default)]
pub struct PageConfig {
    /// Relative URLs passed to `fetch` users are resolved against this.
    pub base_url: Option<Url>,
    pub http: HttpConfig,
}

struct NetHandle {
    bus: Bus,
    _runtime: JoinHandle<()>,
}

impl Drop for NetHandle {
    fn drop(&mut self) {
        let _ = self.bus.cmd_tx.send(CoreCommand::Shutdown);
    }
}

struct Inner {
    config: PageConfig,
    document: RefCell<Document>,
    ready_state: Cell<ReadyState>,
    listeners: RefCell<ListenerStore>,
    event_loop: RefCell<EventLoop>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    net: RefCell<Option<NetHandle>>,
}

/// Handle to a page: its document, listeners and event loop.
///
/// Clones share the same page. Everything runs on the thread that owns the
/// page; callbacks receive the page by reference, and no page state is
/// borrowed while they run.
#[derive(Clone)]
pub struct Page {
    inner: Rc<Inner>,
}

impl Page {
    /// An empty page whose document has already finished loading.
    pub fn new(config: PageConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(Inner {
                config,
                document: RefCell::new(Document::new()),
                ready_state: Cell::new(ReadyState::Complete),
                listeners: RefCell::new(ListenerStore::default()),
                event_loop: RefCell::new(EventLoop::default()),
                pool: RefCell::new(pool),
                spawner,
                net: RefCell::new(None),
            }),
        }
    }

    pub fn from_html(html: &str, config: PageConfig) -> Self {
        let page = Self::new(config);
        page.load_html(html);
        page
    }

    /// Replaces the document with `html` and drops every listener. The page
    /// stays `Loading` until the event loop runs the task that dispatches
    /// `DOMContentLoaded` and `load`.
    pub fn load_html(&self, html: &str) {
        *self.inner.document.borrow_mut() = Document::parse(html);
        self.inner.listeners.borrow_mut().clear();
        self.inner.ready_state.set(ReadyState::Loading);
        log::debug!(target: "browser.page", "loaded {} bytes of markup", html.len());
        self.queue_task(Page::finish_loading);
    }

    fn finish_loading(&self) {
        let root = self.document().root();
        self.inner.ready_state.set(ReadyState::Interactive);
        self.dispatch_event(root, "DOMContentLoaded");
        self.inner.ready_state.set(ReadyState::Complete);
        self.dispatch_event(root, "load");
    }

    pub fn config(&self) -> &PageConfig {
        &self.inner.config
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.ready_state.get()
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    /// Mutable access to the document. Do not hold it across calls that
    /// run callbacks (`dispatch_event`, `run_until_idle`, `block_on`).
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    /// Resolves `input` against the configured base URL; without one it
    /// must be absolute.
    pub fn resolve_url(&self, input: &str) -> Result<Url, url::ParseError> {
        match &self.inner.config.base_url {
            Some(base) => base.join(input),
            None => Url::parse(input),
        }
    }

    // --- events ---

    pub fn add_event_listener(
        &self,
        target: Id,
        kind: &str,
        callback: impl Fn(&Page, &Event) + 'static,
    ) -> ListenerId {
        self.inner
            .listeners
            .borrow_mut()
            .add(target, kind, false, Rc::new(callback))
    }

    /// Like `add_event_listener`, but the listener is removed right before
    /// its first invocation.
    pub fn add_event_listener_once(
        &self,
        target: Id,
        kind: &str,
        callback: impl Fn(&Page, &Event) + 'static,
    ) -> ListenerId {
        self.inner
            .listeners
            .borrow_mut()
            .add(target, kind, true, Rc::new(callback))
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    pub fn listener_count(&self, target: Id, kind: &str) -> usize {
        self.inner.listeners.borrow().count(target, kind)
    }

    /// Dispatches `kind` at `target`, bubbling through its ancestors.
    /// Returns `false` when a listener called `prevent_default`.
    pub fn dispatch_event(&self, target: Id, kind: &str) -> bool {
        let path: Vec<Id> = {
            let doc = self.document();
            if !doc.contains(target) {
                log::debug!(target: "browser.events", "{kind} at unknown node {target}");
                return true;
            }
            std::iter::once(target).chain(doc.ancestors(target)).collect()
        };

        let event = Event::new(kind, target);
        for node in path {
            let listeners = self.inner.listeners.borrow().snapshot(node, kind);
            event.set_current_target(node);
            for (id, once, callback) in listeners {
                // removed by an earlier listener of this dispatch
                if !self.inner.listeners.borrow().contains(id) {
                    continue;
                }
                if once {
                    self.inner.listeners.borrow_mut().remove(id);
                }
                callback(self, &event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        !event.default_prevented()
    }

    // --- scheduling ---

    pub fn queue_task(&self, task: impl FnOnce(&Page) + 'static) {
        self.inner.event_loop.borrow_mut().push_task(Box::new(task));
    }

    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce(&Page) + 'static) -> TimerId {
        let id = self.inner.event_loop.borrow_mut().push_timer(
            Instant::now(),
            delay,
            Box::new(callback),
        );
        log::debug!(target: "browser.event_loop", "timer {id} set for {delay:?}");
        id
    }

    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.inner.spawner.spawn_local(future) {
            log::warn!(target: "browser.event_loop", "could not spawn future: {err}");
        }
    }

    /// Sends `request` to the network runtime, starting it on first use.
    /// `callback` runs exactly once as a task, with the response or the
    /// error.
    pub fn fetch(
        &self,
        request: Request,
        callback: impl FnOnce(&Page, Result<Response, NetError>) + 'static,
    ) -> RequestId {
        let request_id = self
            .inner
            .event_loop
            .borrow_mut()
            .register_fetch(Box::new(callback));
        log::debug!(
            target: "browser.net",
            "fetch #{request_id} {} {}",
            request.method,
            request.url
        );
        if let Err(error) = self.send_fetch(request_id, request) {
            self.deliver(request_id, Err(error));
        }
        request_id
    }

    fn send_fetch(&self, request_id: RequestId, request: Request) -> Result<(), NetError> {
        let mut net = self.inner.net.borrow_mut();
        if net.is_none() {
            let client = Client::new(&self.inner.config.http)?;
            let (bus, cmd_rx) = Bus::new();
            let runtime = start_net_runtime(cmd_rx, bus.evt_tx.clone(), client);
            log::debug!(target: "browser.net", "net runtime started");
            *net = Some(NetHandle {
                bus,
                _runtime: runtime,
            });
        }
        let Some(handle) = net.as_ref() else {
            return Err(NetError::Client("net runtime unavailable".to_string()));
        };
        handle
            .bus
            .cmd_tx
            .send(CoreCommand::Fetch {
                request_id,
                request,
            })
            .map_err(|_| NetError::Client("net runtime stopped".to_string()))
    }

    fn deliver(&self, request_id: RequestId, result: Result<Response, NetError>) {
        let callback = self.inner.event_loop.borrow_mut().take_fetch(request_id);
        match callback {
            Some(callback) => self.queue_task(move |page| callback(page, result)),
            None => {
                log::debug!(target: "browser.net", "no callback for fetch #{request_id}");
            }
        }
    }

    fn on_core_event(&self, evt: CoreEvent) {
        match evt {
            CoreEvent::NetworkDone {
                request_id,
                response,
            } => {
                log::debug!(
                    target: "browser.net",
                    "fetch #{request_id} done: {} {}",
                    response.status,
                    response.url
                );
                self.deliver(request_id, Ok(response));
            }
            CoreEvent::NetworkError {
                request_id,
                url: _,
                error,
            } => {
                log::debug!(target: "browser.net", "fetch #{request_id} failed: {error}");
                self.deliver(request_id, Err(error));
            }
        }
    }

    // --- running ---

    /// Runs tasks, timers, futures and fetch completions until none are left.
    pub fn run_until_idle(&self) {
        self.run_until(|| false);
    }

    /// Drives the event loop until `future` completes. `None` when the page
    /// goes idle first.
    pub fn block_on<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let slot = Rc::new(RefCell::new(None));
        let out = Rc::clone(&slot);
        self.spawn_local(async move {
            let value = future.await;
            *out.borrow_mut() = Some(value);
        });
        self.run_until(|| slot.borrow().is_some());
        slot.borrow_mut().take()
    }

    /// Returns `true` once `done` holds, `false` when the page went idle.
    fn run_until(&self, done: impl Fn() -> bool) -> bool {
        loop {
            self.run_futures();
            if done() {
                return true;
            }
            self.drain_net_events();

            let now = Instant::now();
            let task = {
                let mut ev = self.inner.event_loop.borrow_mut();
                ev.promote_due_timers(now);
                ev.pop_task()
            };
            if let Some(task) = task {
                task(self);
                continue;
            }

            let (deadline, waiting_for_net) = {
                let ev = self.inner.event_loop.borrow();
                (ev.next_deadline(), ev.has_pending_fetches())
            };
            let timeout = deadline.map(|d| d.saturating_duration_since(now));
            match (timeout, waiting_for_net) {
                (None, false) => return false,
                (Some(t), false) => thread::sleep(t),
                (t, true) => self.wait_for_net(t),
            }
        }
    }

    fn run_futures(&self) {
        // already running further up the stack
        if let Ok(mut pool) = self.inner.pool.try_borrow_mut() {
            pool.run_until_stalled();
        }
    }

    fn drain_net_events(&self) {
        let events: Vec<CoreEvent> = match self.inner.net.borrow().as_ref() {
            Some(handle) => handle.bus.evt_rx.try_iter().collect(),
            None => return,
        };
        for evt in events {
            self.on_core_event(evt);
        }
    }

    fn wait_for_net(&self, timeout: Option<Duration>) {
        let evt = {
            let net = self.inner.net.borrow();
            let Some(handle) = net.as_ref() else {
                if let Some(t) = timeout {
                    thread::sleep(t);
                }
                return;
            };
            match timeout {
                Some(t) => handle.bus.evt_rx.recv_timeout(t).ok(),
                None => handle.bus.evt_rx.recv().ok(),
            }
        };
        if let Some(evt) = evt {
            self.on_core_event(evt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn page(html: &str) -> Page {
        Page::from_html(html, PageConfig::default())
    }

    fn node(page: &Page, selector: &str) -> Id {
        let doc = page.document();
        doc.query_selector(doc.root(), selector).unwrap().unwrap()
    }

    #[test]
    fn load_moves_through_ready_states() {
        let page = page("<p>hi</p>");
        assert_eq!(page.ready_state(), ReadyState::Loading);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let root = page.document().root();
        for kind in ["DOMContentLoaded", "load"] {
            let seen = Rc::clone(&seen);
            page.add_event_listener(root, kind, move |page, evt| {
                seen.borrow_mut().push((evt.kind.clone(), page.ready_state()));
            });
        }

        page.run_until_idle();
        assert_eq!(page.ready_state(), ReadyState::Complete);
        assert_eq!(
            *seen.borrow(),
            vec![
                ("DOMContentLoaded".to_string(), ReadyState::Interactive),
                ("load".to_string(), ReadyState::Complete),
            ]
        );
    }

    #[test]
    fn events_bubble_from_target_to_document() {
        let page = page(r#"<div id="outer"><button id="b">go</button></div>"#);
        let button = node(&page, "#b");
        let outer = node(&page, "#outer");
        let root = page.document().root();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [root, outer, button] {
            let seen = Rc::clone(&seen);
            page.add_event_listener(id, "click", move |_, evt| {
                seen.borrow_mut().push((evt.current_target(), evt.target));
            });
        }

        assert!(page.dispatch_event(button, "click"));
        assert_eq!(
            *seen.borrow(),
            vec![(button, button), (outer, button), (root, button)]
        );
    }

    #[test]
    fn stop_propagation_and_prevent_default() {
        let page = page(r#"<div id="outer"><a id="a">x</a></div>"#);
        let a = node(&page, "#a");
        let outer = node(&page, "#outer");

        let outer_hits = Rc::new(Cell::new(0));
        let hits = Rc::clone(&outer_hits);
        page.add_event_listener(outer, "click", move |_, _| hits.set(hits.get() + 1));
        page.add_event_listener(a, "click", |_, evt| {
            evt.stop_propagation();
            evt.prevent_default();
        });

        assert!(!page.dispatch_event(a, "click"));
        assert_eq!(outer_hits.get(), 0);
    }

    #[test]
    fn listeners_can_be_removed_and_run_once() {
        let page = page("<p></p>");
        let p = node(&page, "p");
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        let id = page.add_event_listener(p, "click", move |_, _| c.set(c.get() + 1));
        let c = Rc::clone(&count);
        page.add_event_listener_once(p, "click", move |_, _| c.set(c.get() + 10));

        page.dispatch_event(p, "click");
        page.dispatch_event(p, "click");
        assert_eq!(count.get(), 12);

        assert!(page.remove_event_listener(id));
        page.dispatch_event(p, "click");
        assert_eq!(count.get(), 12);
        assert_eq!(page.listener_count(p, "click"), 0);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_one() {
        let page = page("<p></p>");
        let p = node(&page, "p");
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        page.add_event_listener(p, "click", move |page, _| {
            let c = Rc::clone(&c);
            page.add_event_listener(p, "click", move |_, _| c.set(c.get() + 1));
        });

        page.dispatch_event(p, "click");
        assert_eq!(count.get(), 0);
        page.dispatch_event(p, "click");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn callbacks_may_mutate_the_document() {
        let page = page(r#"<p id="t">old</p>"#);
        let p = node(&page, "#t");
        page.add_event_listener(p, "click", move |page, _| {
            page.document_mut().set_text_content(p, "new").unwrap();
        });
        page.dispatch_event(p, "click");
        assert_eq!(page.document().text_content(p), "new");
    }

    #[test]
    fn timers_run_in_deadline_order_and_not_early() {
        let page = Page::new(PageConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let start = Instant::now();

        let l = Rc::clone(&log);
        page.set_timeout(Duration::from_millis(30), move |_| {
            l.borrow_mut().push(("slow", start.elapsed()));
        });
        let l = Rc::clone(&log);
        page.set_timeout(Duration::from_millis(10), move |_| {
            l.borrow_mut().push(("fast", start.elapsed()));
        });
        let l = Rc::clone(&log);
        page.queue_task(move |_| l.borrow_mut().push(("task", start.elapsed())));

        page.run_until_idle();
        let log = log.borrow();
        let names: Vec<_> = log.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["task", "fast", "slow"]);
        assert!(log[1].1 >= Duration::from_millis(10));
        assert!(log[2].1 >= Duration::from_millis(30));
    }

    #[test]
    fn block_on_drives_timers_for_futures() {
        let page = Page::new(PageConfig::default());
        let (tx, rx) = futures::channel::oneshot::channel();
        page.set_timeout(Duration::from_millis(5), move |_| {
            let _ = tx.send(42);
        });
        assert_eq!(page.block_on(rx), Some(Ok(42)));
    }

    #[test]
    fn block_on_returns_none_when_idle() {
        let page = Page::new(PageConfig::default());
        let (_tx, rx) = futures::channel::oneshot::channel::<()>();
        assert_eq!(page.block_on(rx), None);
    }

    #[test]
    fn resolve_url_uses_base() {
        let config = PageConfig {
            base_url: Some(Url::parse("http://example.test/app/").unwrap()),
            ..PageConfig::default()
        };
        let page = Page::new(config);
        assert_eq!(
            page.resolve_url("api/items").unwrap().as_str(),
            "http://example.test/app/api/items"
        );
        assert!(Page::new(PageConfig::default()).resolve_url("api").is_err());
    }

    #[test]
    fn fetch_with_bad_url_reports_once_through_a_task() {
        let page = Page::new(PageConfig::default());
        let results = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&results);
        page.fetch(Request::get("not a url"), move |_, result| {
            r.borrow_mut().push(result.is_err());
        });
        assert!(results.borrow().is_empty());
        page.run_until_idle();
        assert_eq!(*results.borrow(), vec![true]);
    }
}
