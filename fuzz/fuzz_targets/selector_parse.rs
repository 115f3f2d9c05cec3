#![no_main]

use html::{Document, SelectorList};
use libfuzzer_sys::fuzz_target;

const PAGE: &str = r#"<div id="a" class="x y" data-k="v"><p lang="en-US">t</p><p></p><!--c--><span>s</span></div>"#;

fuzz_target!(|data: &[u8]| {
    let Ok(selector) = std::str::from_utf8(data) else {
        return;
    };
    let doc = Document::parse(PAGE);
    if let Ok(list) = SelectorList::parse(selector) {
        let all = doc.query_selector_all(doc.root(), selector).unwrap_or_default();
        let first = doc.query_selector(doc.root(), selector).ok().flatten();
        assert_eq!(all.first().copied(), first);
        assert!(all.iter().all(|n| list.matches(&doc, *n)));
    }
});
