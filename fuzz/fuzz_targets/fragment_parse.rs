#![no_main]

use html::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let mut doc = Document::new();
    let container = doc.parse_fragment(&input);

    let markup = doc.inner_html(container).unwrap_or_default();
    let again = doc.parse_fragment(&markup);
    let _ = doc.inner_html(again);

    if let Some(child) = doc.first_element_child(container) {
        doc.detach(child);
        assert_eq!(doc.parent(child), None);
        assert!(doc.element(child).is_some());
    }
});
