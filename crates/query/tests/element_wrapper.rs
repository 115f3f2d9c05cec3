use std::cell::{Cell, RefCell};
use std::rc::Rc;

use browser::{Page, PageConfig};
use query::{Query, QueryError, Wrapper};

const PAGE: &str = r#"<!doctype html>
<html><body>
  <div id="card" class="card" data-user-id="7" data-role="admin">
    <h2 class="title">Hello</h2>
    <button id="btn">Press</button>
  </div>
  <ul id="list"></ul>
  <input id="name" value="ann">
  <select id="size"><option>s</option><option value="m">Medium</option></select>
</body></html>"#;

fn query() -> Query {
    Query::new(Page::from_html(PAGE, PageConfig::default()))
}

#[test]
fn add_then_remove_restores_class_membership() {
    let q = query();
    let card = q.select("#card").unwrap();

    card.add(["fresh"]).remove(["fresh"]);
    assert!(!card.has_class("fresh"));

    card.add(["card"]).remove(["card"]);
    assert!(!card.has_class("card"));
    card.add(["card"]);
    assert!(card.has_class("card"));
}

#[test]
fn add_and_remove_take_several_classes() {
    let q = query();
    let card = q.select("#card").unwrap();
    card.add(["a", "b", "c"]);
    assert!(["a", "b", "c"].iter().all(|c| card.has_class(c)));
    card.remove(vec!["a".to_string(), "c".to_string()]);
    assert!(card.has_class("b") && !card.has_class("a") && !card.has_class("c"));
}

#[test]
fn toggle_class_twice_restores_membership() {
    let q = query();
    let card = q.select("#card").unwrap();
    for class in ["card", "absent"] {
        let before = card.has_class(class);
        card.toggle_class(class).toggle_class(class);
        assert_eq!(card.has_class(class), before);
    }
}

#[test]
fn hide_and_show_are_idempotent() {
    let q = query();
    let card = q.select("#card").unwrap();

    card.hide();
    let once = card.page().document().outer_html(card.node()).unwrap();
    card.hide();
    assert_eq!(card.page().document().outer_html(card.node()).unwrap(), once);
    assert!(card.is_hidden());

    card.show().show();
    assert!(!card.is_hidden());
    assert_eq!(card.style("display"), None);
}

#[test]
fn toggle_flips_visibility() {
    let q = query();
    let card = q.select("#card").unwrap();
    assert!(!card.toggle());
    assert!(card.is_hidden());
    assert!(card.toggle());
    assert!(!card.is_hidden());
}

#[test]
fn text_reads_back_what_was_set() {
    let q = query();
    let title = q.select(".title").unwrap();
    assert_eq!(title.text(), "Hello");
    assert_eq!(title.set_text("hello"), "hello");
    assert_eq!(title.text(), "hello");
    assert_eq!(title.html(), "hello");
    assert_eq!(title.set_text("<b>"), "<b>");
    assert_eq!(title.html(), "&lt;b&gt;");
}

#[test]
fn html_sets_and_returns_inner_markup() {
    let q = query();
    let list = q.select("#list").unwrap();
    assert_eq!(list.html(), "");
    let out = list.set_html(r#"<li class="x">one</li><li>two</li>"#);
    assert_eq!(out, r#"<li class="x">one</li><li>two</li>"#);
    assert_eq!(q.select("#list > li.x").unwrap().text(), "one");
}

#[test]
fn data_reads_what_was_written() {
    let q = query();
    let card = q.select("#card").unwrap();
    assert_eq!(card.data("userId").as_deref(), Some("7"));
    card.set_data("k", "v");
    assert_eq!(card.data("k").as_deref(), Some("v"));
    card.set_data("lastSeen", "now");
    assert_eq!(card.data("missing"), None);
    assert_eq!(
        card.dataset(),
        vec![
            ("userId".to_string(), "7".to_string()),
            ("role".to_string(), "admin".to_string()),
            ("k".to_string(), "v".to_string()),
            ("lastSeen".to_string(), "now".to_string()),
        ]
    );
    assert!(
        card.page()
            .document()
            .outer_html(card.node())
            .unwrap()
            .contains(r#"data-last-seen="now""#)
    );
}

#[test]
fn css_applies_single_and_mapped_properties() {
    let q = query();
    let card = q.select("#card").unwrap();
    card.css("color", "red")
        .css_map([("fontSize", "12px"), ("border", "1px solid black")]);
    assert_eq!(card.style("color").as_deref(), Some("red"));
    assert_eq!(card.style("font-size").as_deref(), Some("12px"));
    assert_eq!(card.style("border").as_deref(), Some("1px solid black"));
}

#[test]
fn value_reads_and_writes_form_controls() {
    let q = query();
    let name = q.select("#name").unwrap();
    assert_eq!(name.value().as_deref(), Some("ann"));
    assert_eq!(name.set_value("bob").as_deref(), Some("bob"));

    let size = q.select("#size").unwrap();
    assert_eq!(size.value().as_deref(), Some("s"));
    assert_eq!(size.set_value("m").as_deref(), Some("m"));

    let card = q.select("#card").unwrap();
    assert_eq!(card.value(), None);
}

#[test]
fn append_and_append_to_move_the_right_nodes() {
    let q = query();
    let list = q.select("#list").unwrap();
    let item = q.create("<li>made</li>").unwrap();

    list.append(item).unwrap();
    assert_eq!(list.html(), "<li>made</li>");

    let button = q.select("#btn").unwrap();
    button.append_to(&list).unwrap();
    assert_eq!(list.html(), "<li>made</li><button id=\"btn\">Press</button>");
    assert!(q.select("#card > #btn").is_err());

    let card = q.select("#card").unwrap();
    let err = q.select("#card > h2").unwrap().append(&card).unwrap_err();
    assert!(matches!(err, QueryError::Dom(_)));
}

#[test]
fn chained_calls_act_on_their_own_element() {
    let q = query();
    let card = q.select("#card").unwrap();
    let list = q.select("#list").unwrap();

    let returned = card.add(["one"]);
    assert_eq!(returned.node(), card.node());
    list.add(["two"]).hide();
    assert!(card.has_class("one") && !card.has_class("two"));
    assert!(list.is_hidden() && !card.is_hidden());
}

#[test]
fn wrapping_an_element_id_uses_that_node() {
    let q = query();
    let title = {
        let doc = q.page().document();
        doc.query_selector(doc.root(), "#card > h2").unwrap().unwrap()
    };

    let Ok(Wrapper::Element(wrapped)) = q.wrap(title) else {
        panic!("an element id wraps as an element");
    };
    assert_eq!(wrapped.node(), title);
    assert_eq!(wrapped.selector(), None);

    let returned = wrapped.add(["picked"]).css("color", "red");
    assert_eq!(returned.node(), title);
    assert!(q.select("h2.picked").is_ok_and(|el| el.node() == title));
    assert!(!q.select("#card").unwrap().has_class("picked"));

    let item = q.create("<li>fresh</li>").unwrap();
    let Ok(Wrapper::Element(detached)) = q.wrap(item) else {
        panic!("a detached element id wraps as an element");
    };
    assert_eq!(detached.set_text("moved"), "moved");
    detached.append_to(&q.select("#list").unwrap()).unwrap();
    assert_eq!(q.select("#list").unwrap().html(), "<li>moved</li>");
}

#[test]
fn click_handlers_run_on_dispatch_and_bubble() {
    let q = query();
    let clicks = Rc::new(RefCell::new(Vec::new()));

    let c = Rc::clone(&clicks);
    q.select("#btn").unwrap().click(move |this, _| {
        c.borrow_mut().push(this.text());
    });
    let c = Rc::clone(&clicks);
    q.select("#card").unwrap().on("click", move |this, event| {
        assert_ne!(event.target, this.node());
        c.borrow_mut().push("card".to_string());
    });

    let button = q.select("#btn").unwrap().node();
    q.page().dispatch_event(button, "click");
    assert_eq!(*clicks.borrow(), vec!["Press".to_string(), "card".to_string()]);
}

#[test]
fn ready_fires_once_on_content_loaded() {
    let q = query();
    let calls = Rc::new(Cell::new(0));

    let c = Rc::clone(&calls);
    q.document().ready(move |q| {
        c.set(c.get() + 1);
        q.select("#card").unwrap().add(["ready"]);
    });
    assert_eq!(calls.get(), 0);

    q.page().run_until_idle();
    assert_eq!(calls.get(), 1);
    assert!(q.select("#card.ready").is_ok());

    let root = q.page().document().root();
    q.page().dispatch_event(root, "DOMContentLoaded");
    assert_eq!(calls.get(), 1);
}

#[test]
fn wrapping_a_missing_element_fails_up_front() {
    let q = query();
    assert!(matches!(q.select("#nope"), Err(QueryError::NoMatch(s)) if s == "#nope"));
    assert!(matches!(q.select("div["), Err(QueryError::Selector(_))));
}
