//! Single-threaded page host: a document, event listeners with bubbling,
//! a task queue with timers, a local future executor, and fetches served by
//! the network runtime.

mod event_loop;
mod events;
mod page;

pub use core_types::{ListenerId, ReadyState, RequestId, TimerId};
pub use events::Event;
pub use page::{Page, PageConfig};
