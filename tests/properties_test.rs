//! Property-based tests for `lone`'s testable invariants (specification
//! section 8), exercised through the public reader/printer/equality API.

use lone::equality::is_equal;
use lone::interp::Interp;
use lone::reader::Parser;
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i32>().prop_map(|n| n.to_string()),
        "[a-zA-Z][a-zA-Z0-9-]{0,5}".prop_map(|s| s),
        "[a-zA-Z0-9 ]{0,6}".prop_map(|s| format!("\"{s}\"")),
    ]
}

fn form() -> impl Strategy<Value = String> {
    leaf().prop_recursive(3, 20, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("({})", items.join(" "))),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("[{}]", items.join(" "))),
            prop::collection::vec(inner, 0..3).prop_map(|items| {
                let entries: Vec<String> =
                    items.iter().enumerate().map(|(i, v)| format!("k{i} {v}")).collect();
                format!("{{{}}}", entries.join(" "))
            }),
        ]
    })
}

proptest! {
    /// Testable property: for any value the reader can produce out of
    /// integers, symbols, texts, lists, vectors, and nested tables,
    /// `read(print(v))` equals `v` under the `equal` relation.
    #[test]
    fn read_print_read_round_trips_under_equal(source in form()) {
        let mut interp = Interp::new().unwrap();
        let v1 = Parser::new(&source).read(&mut interp).unwrap().unwrap();
        let printed = lone::printer::print_to_string(&interp, v1);
        let v2 = Parser::new(&printed).read(&mut interp).unwrap().unwrap();
        prop_assert!(is_equal(&interp, v1, v2));
    }
}
