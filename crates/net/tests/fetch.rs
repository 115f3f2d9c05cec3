use std::sync::{Arc, Once, mpsc};
use std::time::Duration;

use net::{Client, HttpConfig, NetError, Request, fetch_async};

static INIT: Once = Once::new();

fn client(max_body_bytes: usize) -> Client {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    let config = HttpConfig {
        max_body_bytes,
        native_roots: false,
        ..HttpConfig::default()
    };
    Client::new(&config).unwrap()
}

#[test]
fn get_returns_body_status_and_content_type() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/hello")
        .match_header("user-agent", "myquery/0.1")
        .with_status(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body("ok")
        .expect(1)
        .create();

    let url = format!("{}/hello", server.url());
    let resp = client(1024).fetch(&Request::get(url.clone())).unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "ok");
    assert_eq!(resp.content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(resp.requested_url, url);
    assert!(resp.is_success());
    assert!(!resp.truncated);
    mock.assert();
}

#[test]
fn error_statuses_are_responses() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("nope")
        .create();

    let resp = client(1024)
        .fetch(&Request::get(format!("{}/missing", server.url())))
        .unwrap();

    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, "nope");
    assert!(!resp.is_success());
    mock.assert();
}

#[test]
fn post_sends_headers_and_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/items")
        .match_header("content-type", "application/json")
        .match_body(r#"{"a":1}"#)
        .with_status(201)
        .with_body(r#"{"b":2}"#)
        .create();

    let req = Request::post(
        format!("{}/items", server.url()),
        "application/json",
        br#"{"a":1}"#.to_vec(),
    );
    let resp = client(1024).fetch(&req).unwrap();

    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, r#"{"b":2}"#);
    mock.assert();
}

#[test]
fn body_is_capped() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/big")
        .with_body("x".repeat(100))
        .create();

    let resp = client(10)
        .fetch(&Request::get(format!("{}/big", server.url())))
        .unwrap();

    assert_eq!(resp.body, "x".repeat(10));
    assert!(resp.truncated);
}

#[test]
fn bad_url_is_a_url_error() {
    let err = client(1024).fetch(&Request::get("not a url")).unwrap_err();
    assert!(matches!(err, NetError::Url { .. }), "{err:?}");
}

#[test]
fn refused_connection_is_a_transport_error() {
    let url = {
        let server = mockito::Server::new();
        format!("{}/gone", server.url())
    };
    let err = client(1024).fetch(&Request::get(url)).unwrap_err();
    assert!(matches!(err, NetError::Transport { .. }), "{err:?}");
}

#[test]
fn fetch_async_reports_on_callback() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/async").with_body("later").create();

    let (tx, rx) = mpsc::channel();
    let handle = fetch_async(
        client(1024),
        Request::get(format!("{}/async", server.url())),
        Arc::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(result.unwrap().body, "later");
    handle.join().unwrap();
}
