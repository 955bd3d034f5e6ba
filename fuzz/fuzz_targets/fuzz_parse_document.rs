#![no_main]

use libfuzzer_sys::fuzz_target;
use xmlassert::document::parse_document;
use xmlassert::path::full_path;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(doc) = parse_document(s)
    {
        for id in doc.iter() {
            let _ = full_path(&doc, id);
            let _ = doc.text_content(id);
        }
    }
});
