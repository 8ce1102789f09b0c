//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records that stress the
//! chunking and splitting paths.

use bigdoc_core::Record;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating text mixing ASCII, multi-byte characters and
/// characters that need escaping.
pub fn text_strategy(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            6 => prop::char::range('a', 'z'),
            1 => prop::sample::select(vec!['é', 'ß', '中', '🍝', '"', '\\', '\n', '\u{1}']),
        ],
        0..max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for generating long runs of text, the kind that overflows a
/// chunk on its own.
pub fn big_text_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    (min_len..max_len, text_strategy(8)).prop_map(|(len, seed)| {
        let unit = if seed.is_empty() { "x".to_string() } else { seed };
        unit.chars().cycle().take(len).collect()
    })
}

/// Strategy for generating leaf values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        text_strategy(40).prop_map(Value::String),
    ]
}

/// Strategy for generating nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..8)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating records: many small fields, some nested values
/// and a few large text fields.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::collection::vec((field_name_strategy(), value_strategy()), 0..24),
        prop::collection::vec((field_name_strategy(), big_text_strategy(50, 3_000)), 0..3),
    )
        .prop_map(|(small, big)| {
            let big = big.into_iter().map(|(k, v)| (k, Value::String(v)));
            small.into_iter().chain(big).collect()
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
