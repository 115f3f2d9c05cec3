use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use browser::{Page, PageConfig};
use net::{HttpConfig, NetError, Request};
use url::Url;

static INIT: Once = Once::new();

fn page_for(server: &mockito::Server) -> Page {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    let config = PageConfig {
        base_url: Some(Url::parse(&format!("{}/", server.url())).unwrap()),
        http: HttpConfig {
            native_roots: false,
            ..HttpConfig::default()
        },
    };
    Page::from_html("<main></main>", config)
}

#[test]
fn fetch_completes_on_the_event_loop() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/data")
        .with_status(200)
        .with_body("payload")
        .expect(1)
        .create();

    let page = page_for(&server);
    let url = page.resolve_url("data").unwrap();
    let bodies = Rc::new(RefCell::new(Vec::new()));
    let b = Rc::clone(&bodies);
    page.fetch(Request::get(url.as_str()), move |page, result| {
        let resp = result.unwrap();
        let main = {
            let doc = page.document();
            doc.query_selector(doc.root(), "main").unwrap().unwrap()
        };
        page.document_mut().set_text_content(main, &resp.body).unwrap();
        b.borrow_mut().push(resp.body);
    });

    assert!(bodies.borrow().is_empty());
    page.run_until_idle();

    assert_eq!(*bodies.borrow(), vec!["payload".to_string()]);
    let doc = page.document();
    assert_eq!(doc.text_content(doc.root()), "payload");
    mock.assert();
}

#[test]
fn concurrent_fetches_each_complete_once() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/a").with_body("a").create();
    server.mock("GET", "/b").with_status(500).with_body("b").create();

    let page = page_for(&server);
    let seen = Rc::new(RefCell::new(Vec::new()));
    for path in ["a", "b"] {
        let url = page.resolve_url(path).unwrap();
        let s = Rc::clone(&seen);
        page.fetch(Request::get(url.as_str()), move |_, result| {
            let resp = result.unwrap();
            s.borrow_mut().push((resp.body, resp.status));
        });
    }
    page.run_until_idle();

    let mut seen = seen.borrow().clone();
    seen.sort();
    assert_eq!(seen, vec![("a".to_string(), 200), ("b".to_string(), 500)]);
}

#[test]
fn refused_connection_reaches_the_callback() {
    let url = {
        let server = mockito::Server::new();
        format!("{}/gone", server.url())
    };
    let page = Page::new(PageConfig {
        base_url: None,
        http: HttpConfig {
            native_roots: false,
            ..HttpConfig::default()
        },
    });
    let errors = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&errors);
    page.fetch(Request::get(url), move |_, result| {
        e.borrow_mut().push(result.unwrap_err());
    });
    page.run_until_idle();

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], NetError::Transport { .. }));
}
