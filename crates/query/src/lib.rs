//! Chainable DOM helpers over a [`browser::Page`].
//!
//! ```no_run
//! use browser::{Page, PageConfig};
//! use query::Query;
//!
//! let q = Query::new(Page::from_html(
//!     r#"<button id="go">Go</button>"#,
//!     PageConfig::default(),
//! ));
//! q.document().ready(|q| {
//!     if let Ok(button) = q.select("#go") {
//!         button.add(["ready"]).click(|this, _| {
//!             this.toggle_class("pressed");
//!         });
//!     }
//! });
//! q.page().run_until_idle();
//! ```

mod ajax;
mod error;
mod query;
mod selector;
mod wrapper;

pub use ajax::{AjaxOptions, Transport};
pub use error::QueryError;
pub use query::{Query, Wait};
pub use selector::Selector;
pub use wrapper::{DocumentWrapper, ElementWrapper, Wrapper};
