use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::HashSet;
use xmlassert::document::Document;
use xmlassert::engine::evaluate;
use xmlassert::query::PathEvaluator;
use xmlassert::types::QueryGroup;
use xmlassert::validator::Validator;

/// One `book` per entry, holding one `title` per inner value.
fn library(books: &[Vec<String>]) -> Document {
    let mut doc = Document::new("library");
    let root = doc.root();
    for titles in books {
        let book = doc.append_element(root, "book");
        for title in titles {
            let t = doc.append_element(book, "title");
            doc.append_text(t, title);
        }
    }
    doc
}

fn all_distinct(values: &[String]) -> bool {
    let set: HashSet<&String> = values.iter().collect();
    set.len() == values.len()
}

fn arb_validator() -> impl Strategy<Value = Validator> {
    prop_oneof![
        (0usize..5).prop_map(|expected| Validator::Count { expected }),
        Just(Validator::Unique),
        Just(Validator::regex("never").unwrap()),
        Just(Validator::value_membership(Vec::<String>::new())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // A two-level group passes iff every non-empty branch passes on its own.
    #[test]
    fn two_level_group_quantifies_over_branches(
        books in vec(vec("[a-c]", 0..4), 0..6),
    ) {
        let doc = library(&books);
        let group = QueryGroup::new(["book", "title"]).unwrap();
        let result = evaluate(&doc, &PathEvaluator::new(), &[doc.root()], &Validator::Unique, &group)
            .unwrap();

        let expected = books
            .iter()
            .filter(|titles| !titles.is_empty())
            .all(|titles| all_distinct(titles));
        prop_assert_eq!(result.passed, expected);

        let failing = books
            .iter()
            .filter(|titles| !titles.is_empty() && !all_distinct(titles))
            .count();
        prop_assert_eq!(result.diagnostics.len(), failing);
    }

    // Count is judged per branch; empty branches never count as zero.
    #[test]
    fn count_is_per_branch(sizes in vec(0usize..4, 0..6), expected in 1usize..4) {
        let books: Vec<Vec<String>> = sizes
            .iter()
            .map(|&n| (0..n).map(|i| i.to_string()).collect())
            .collect();
        let doc = library(&books);
        let group = QueryGroup::new(["book", "title"]).unwrap();
        let result = evaluate(
            &doc,
            &PathEvaluator::new(),
            &[doc.root()],
            &Validator::Count { expected },
            &group,
        )
        .unwrap();
        let holds = sizes.iter().filter(|&&n| n > 0).all(|&n| n == expected);
        prop_assert_eq!(result.passed, holds);
    }

    // Nothing matched at the first level means nothing can fail.
    #[test]
    fn unmatched_first_level_is_vacuously_true(
        books in vec(vec("[a-c]", 0..4), 0..6),
        validator in arb_validator(),
        depth in 1usize..4,
    ) {
        let doc = library(&books);
        let mut expressions = vec!["magazine".to_string()];
        expressions.extend((1..depth).map(|_| "title".to_string()));
        let group = QueryGroup::new(expressions).unwrap();
        let result = evaluate(&doc, &PathEvaluator::new(), &[doc.root()], &validator, &group).unwrap();
        prop_assert!(result.passed);
        prop_assert!(result.diagnostics.is_empty());
    }
}
