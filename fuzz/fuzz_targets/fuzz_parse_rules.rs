#![no_main]

use libfuzzer_sys::fuzz_target;
use xmlassert::query::PathEvaluator;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(file) = xmlassert::parse_rules(s)
        && xmlassert::validate_rules(&file, &PathEvaluator::new()).is_valid()
    {
        // Validated rule files must always compile.
        assert!(xmlassert::compile(&file).is_ok());
    }
});
