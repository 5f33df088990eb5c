//! Property tests for the attach option clause.
//!
//! A rendered clause must parse back to the same access mode and the same
//! parameters in the same order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use indexmap::IndexMap;
use proptest::prelude::*;

use lakehold_catalog::options::{AccessMode, ParamValue};
use lakehold_catalog::sql::AttachOptions;

fn arb_access_mode() -> impl Strategy<Value = AccessMode> {
    prop::sample::select(vec![
        AccessMode::Automatic,
        AccessMode::ReadOnly,
        AccessMode::ReadWrite,
    ])
}

fn arb_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        Just(ParamValue::Null),
        any::<bool>().prop_map(ParamValue::Boolean),
        any::<i64>().prop_map(ParamValue::Integer),
        // Quotes, commas and parentheses are the interesting characters.
        "[a-z0-9 ',()/:=.-]{0,24}".prop_map(ParamValue::Text),
    ]
}

fn arb_parameters() -> impl Strategy<Value = IndexMap<String, ParamValue>> {
    prop::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,12}", arb_value()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

proptest! {
    #[test]
    fn clause_round_trips(mode in arb_access_mode(), parameters in arb_parameters()) {
        let options = AttachOptions::new(mode, &parameters).unwrap();
        let clause = options.clause();
        let parsed = AttachOptions::parse(&clause).unwrap();

        prop_assert_eq!(parsed.access_mode, mode);
        let keys: Vec<&String> = parsed.parameters.keys().collect();
        let expected: Vec<&String> = parameters.keys().collect();
        prop_assert_eq!(keys, expected);
        prop_assert_eq!(&parsed, &options);
    }

    #[test]
    fn empty_clause_only_without_options(mode in arb_access_mode(), parameters in arb_parameters()) {
        let options = AttachOptions::new(mode, &parameters).unwrap();
        let empty = mode == AccessMode::Automatic && parameters.is_empty();
        prop_assert_eq!(options.clause().is_empty(), empty);
    }

    #[test]
    fn invalid_keys_are_rejected(key in "[A-Za-z_]{1,6}[ ;'\"-][A-Za-z0-9_]{0,6}") {
        let mut parameters = IndexMap::new();
        parameters.insert(key, ParamValue::Null);
        prop_assert!(AttachOptions::new(AccessMode::Automatic, &parameters).is_err());
    }
}
