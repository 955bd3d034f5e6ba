use proptest::prelude::*;
use xmlassert::document::{Document, NodeId, NodeKind};
use xmlassert::query::{PathEvaluator, Query, QueryEvaluator};

/// Element names are drawn from a small pool so that queries hit often.
fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("a"), Just("b"), Just("c")].prop_map(String::from)
}

/// A random tree encoded as (parent pick, name) pairs, built depth-first.
fn arb_tree() -> impl Strategy<Value = Document> {
    prop::collection::vec((any::<prop::sample::Index>(), arb_name()), 0..24).prop_map(|spec| {
        let mut doc = Document::new("root");
        // Appending only under the open path keeps ids in document order.
        let mut open: Vec<NodeId> = vec![doc.root()];
        for (pick, name) in spec {
            let depth = pick.index(open.len());
            open.truncate(depth + 1);
            let parent = open[depth];
            let child = doc.append_element(parent, &name);
            open.push(child);
        }
        doc
    })
}

fn count_named(doc: &Document, name: &str) -> usize {
    doc.iter()
        .filter(|&id| doc.kind(id) == NodeKind::Element && doc.name(id) == name)
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // `//n` finds every element named n, from any context.
    #[test]
    fn descendant_search_finds_all_named(doc in arb_tree(), name in arb_name()) {
        let expected = count_named(&doc, &name);
        let evaluator = PathEvaluator::new();
        for context in doc.iter() {
            let found = evaluator.select(&doc, context, &format!("//{}", name)).unwrap();
            prop_assert_eq!(found.len(), expected);
        }
    }

    // Results are sorted in document order without duplicates.
    #[test]
    fn results_are_in_document_order(doc in arb_tree()) {
        let found = PathEvaluator::new()
            .select(&doc, doc.root(), "//a | //b | .//* | //c/..")
            .unwrap();
        prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    // A union with itself selects the same nodes.
    #[test]
    fn union_is_idempotent(doc in arb_tree(), name in arb_name()) {
        let single = Query::parse(&format!("*/{}", name)).unwrap();
        let doubled = Query::parse(&format!("*/{0} | */{0}", name)).unwrap();
        prop_assert_eq!(
            single.select(&doc, doc.root()).unwrap(),
            doubled.select(&doc, doc.root()).unwrap()
        );
    }

    // Every child reports its parent through `..`.
    #[test]
    fn parent_step_inverts_child_step(doc in arb_tree()) {
        let evaluator = PathEvaluator::new();
        for id in doc.iter() {
            for &child in doc.children(id) {
                prop_assert_eq!(evaluator.select(&doc, child, "..").unwrap(), vec![id]);
            }
        }
    }

    // `*[n]` picks the n-th child element, counting from one.
    #[test]
    fn positional_predicate_picks_nth_child(doc in arb_tree(), n in 1usize..6) {
        let evaluator = PathEvaluator::new();
        for id in doc.iter() {
            let children: Vec<NodeId> = doc.child_elements(id).collect();
            let found = evaluator.select(&doc, id, &format!("*[{}]", n)).unwrap();
            let expected: Vec<NodeId> = children.get(n - 1).copied().into_iter().collect();
            prop_assert_eq!(found, expected);
        }
    }

    // Attribute predicates filter by value.
    #[test]
    fn attribute_predicate_filters(doc in arb_tree(), name in arb_name()) {
        let evaluator = PathEvaluator::new();
        let all = evaluator.select(&doc, doc.root(), &format!("//{}", name)).unwrap();
        let none = evaluator
            .select(&doc, doc.root(), &format!("//{}[@id='missing']", name))
            .unwrap();
        let kept = evaluator
            .select(&doc, doc.root(), &format!("//{}[not(@id)]", name))
            .unwrap();
        prop_assert!(none.is_empty());
        prop_assert_eq!(kept, all);
    }
}
