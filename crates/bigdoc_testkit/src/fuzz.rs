//! Fuzz testing harnesses for Bigdoc.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use bigdoc_codec::from_canonical_string;
use bigdoc_core::{reassemble, Manifest, Part, PartStore, Record, StoredRecord, WriteToken};
use bigdoc_store::{DocPath, DocumentStore, InMemoryStore, RawRecord};
use serde_json::Value;

/// Fuzz target for canonical text parsing.
///
/// Arbitrary bytes must either parse or return an error, never panic.
pub fn fuzz_canonical_parse(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = from_canonical_string(text);
    }
}

/// Fuzz target for manifest decoding.
pub fn fuzz_manifest_decode(data: &[u8]) {
    if let Ok(Value::Object(raw)) = serde_json::from_slice::<Value>(data) {
        let _ = StoredRecord::from_raw(raw);
    }
}

/// Fuzz target for reassembly.
///
/// The input is read as a JSON array of part documents. Whatever it holds,
/// reassembly must return a record or an error, never panic.
pub fn fuzz_reassemble(data: &[u8]) {
    let Ok(Value::Array(docs)) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let parts: Vec<Part> = docs
        .into_iter()
        .filter_map(|doc| match doc {
            Value::Object(raw) => Part::from_raw(raw).ok(),
            _ => None,
        })
        .collect();
    let total = u32::try_from(parts.len()).unwrap_or(u32::MAX);
    let manifest = Manifest::for_write(total, WriteToken::new(), None);
    let _ = reassemble(&manifest, parts);
}

/// Fuzz target for the store-level read path.
///
/// Plants arbitrary documents under a record and reads it back.
pub fn fuzz_read(manifest: RawRecord, parts: Vec<RawRecord>) {
    let engine = match PartStore::with_defaults(InMemoryStore::new()) {
        Ok(engine) => engine,
        Err(_) => return,
    };
    let root = DocPath::new("fuzz", "r");
    let mut writes = vec![(root.clone(), manifest)];
    for (i, part) in parts.into_iter().enumerate() {
        writes.push((root.child("parts", format!("p{i}")), part));
    }
    if engine.store().atomic_write(writes).is_err() {
        return;
    }
    let _ = engine.read("fuzz", "r");
}

/// Fuzz target for write then read.
///
/// Any record the engine accepts must read back unchanged.
pub fn fuzz_write_read(record: &Record, ceiling: usize) {
    let engine = match PartStore::in_memory(bigdoc_core::Config::new().ceiling(ceiling)) {
        Ok(engine) => engine,
        Err(_) => return,
    };
    if engine.write("fuzz", "r", record).is_ok() {
        let read = engine.read("fuzz", "r").expect("accepted record must be readable");
        assert_eq!(read.as_ref(), Some(record), "roundtrip mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{record_strategy, value_strategy, PropTestConfig};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_fuzz_canonical_parse_edge_cases() {
        fuzz_canonical_parse(&[]);
        fuzz_canonical_parse(b"{");
        fuzz_canonical_parse(b"[1,2,");
        fuzz_canonical_parse(&[0xff, 0xfe]);
    }

    #[test]
    fn test_fuzz_reassemble_edge_cases() {
        fuzz_reassemble(b"[]");
        fuzz_reassemble(b"not json");
        fuzz_reassemble(
            br#"[{"partIndex":7,"generation":1,"writeToken":"00000000000000000000000000000000","data":{}}]"#,
        );
    }

    #[test]
    fn test_fuzz_read_with_garbage() {
        let manifest = crate::fixtures::record_from(json!({"isMultiPart": true, "totalParts": 2}));
        fuzz_read(manifest, vec![crate::fixtures::record_from(json!({"x": 1}))]);

        let manifest = crate::fixtures::record_from(json!({
            "isMultiPart": true,
            "totalParts": 4_000_000_000u64,
            "createdAt": 0,
            "lastUpdated": 0
        }));
        fuzz_read(manifest, vec![]);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn fuzz_manifest_decode_never_panics(value in value_strategy()) {
            fuzz_manifest_decode(&serde_json::to_vec(&value).unwrap());
        }

        #[test]
        fn fuzz_reassemble_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
            fuzz_reassemble(&data);
        }

        #[test]
        fn fuzz_write_read_holds(record in record_strategy(), ceiling in 50usize..500) {
            fuzz_write_read(&record, ceiling);
        }
    }
}
