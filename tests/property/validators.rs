use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use xmlassert::document::{Document, NodeId};
use xmlassert::validator::Validator;

/// `<root><v>t0</v><v>t1</v>...</root>`, returning the `v` elements.
fn leaves(values: &[String]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new("root");
    let root = doc.root();
    let mut nodes = Vec::new();
    for value in values {
        let v = doc.append_element(root, "v");
        doc.append_text(v, value);
        nodes.push(v);
    }
    (doc, nodes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Count(k) passes exactly when the collection holds k nodes.
    #[test]
    fn count_passes_only_on_exact_size(values in vec("[a-z]{1,4}", 0..12)) {
        let (doc, nodes) = leaves(&values);
        let k = nodes.len();

        let exact = Validator::Count { expected: k }.check(&doc, &nodes);
        prop_assert!(exact.passed);

        let over = Validator::Count { expected: k + 1 }.check(&doc, &nodes);
        prop_assert!(!over.passed);
        prop_assert_eq!(
            &over.diagnostics[0].message,
            &format!("expected count {} but actual count is {}", k + 1, k)
        );

        if k > 0 {
            let under = Validator::Count { expected: k - 1 }.check(&doc, &nodes);
            prop_assert!(!under.passed);
        }
    }

    // Distinct values pass Unique; one added duplicate fails and is named.
    #[test]
    fn unique_detects_single_duplicate(
        distinct in btree_set("[a-z]{1,6}", 1..10),
        pick in any::<prop::sample::Index>(),
        at in any::<prop::sample::Index>(),
    ) {
        let mut values: Vec<String> = distinct.into_iter().collect();
        let (doc, nodes) = leaves(&values);
        prop_assert!(Validator::Unique.check(&doc, &nodes).passed);

        let duplicate = values[pick.index(values.len())].clone();
        let position = at.index(values.len() + 1);
        values.insert(position, duplicate.clone());

        let (doc, nodes) = leaves(&values);
        let result = Validator::Unique.check(&doc, &nodes);
        prop_assert!(!result.passed);
        prop_assert_eq!(result.diagnostics.len(), 1);
        let expected_suffix = format!("duplicate value of {}", duplicate);
        prop_assert!(result.diagnostics[0].message.ends_with(&expected_suffix));
    }

    // Regex passes iff all values fully match; the first offender is reported.
    #[test]
    fn regex_reports_first_non_matching_value(values in vec("[a-z0-9]{1,5}", 0..10)) {
        let (doc, nodes) = leaves(&values);
        let validator = Validator::regex("[a-z]+").unwrap();
        let result = validator.check(&doc, &nodes);

        let first_bad = values
            .iter()
            .find(|v| !v.chars().all(|c| c.is_ascii_lowercase()));

        match first_bad {
            None => prop_assert!(result.passed),
            Some(bad) => {
                prop_assert!(!result.passed);
                prop_assert_eq!(
                    &result.diagnostics[0].message,
                    &format!("root.v contains invalid value of {}", bad)
                );
            }
        }
    }

    // Membership passes iff every value is permitted.
    #[test]
    fn membership_matches_set_containment(
        values in vec("[a-d]", 0..10),
        permitted in btree_set("[a-d]", 0..4),
    ) {
        let (doc, nodes) = leaves(&values);
        let result = Validator::value_membership(permitted.iter().cloned()).check(&doc, &nodes);
        let expected = values.iter().all(|v| permitted.contains(v));
        prop_assert_eq!(result.passed, expected);
    }
}
