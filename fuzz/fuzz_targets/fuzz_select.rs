#![no_main]

use libfuzzer_sys::fuzz_target;
use xmlassert::document::parse_document;
use xmlassert::query::Query;

const DOC: &str = r#"<store><shelf id="1"><book lang="en"><title>A</title></book></shelf><book><title>B</title>tail</book></store>"#;

fuzz_target!(|data: &[u8]| {
    let expression = String::from_utf8_lossy(data);
    let Ok(doc) = parse_document(DOC) else {
        return;
    };
    if let Ok(query) = Query::parse(&expression) {
        for context in doc.iter() {
            if let Ok(found) = query.select(&doc, context) {
                assert!(found.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
});
