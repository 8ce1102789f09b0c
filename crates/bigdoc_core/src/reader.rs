//! The read path: fetch, filter, sort, reassemble.

use crate::config::Config;
use crate::error::{ReadError, ReadResult, ReconstructionError};
use crate::manifest::{Manifest, StoredRecord};
use crate::part::{ChunkEntry, Part, SplitKind};
use crate::types::Record;
use crate::writer::is_current;
use bigdoc_codec::from_canonical_string;
use bigdoc_store::{DocPath, DocumentStore};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// How a logical record is laid out in the store, without reassembling it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    /// The manifest, or `None` for a record stored directly.
    pub manifest: Option<Manifest>,
    /// Field count of a directly stored record.
    pub direct_fields: Option<usize>,
    /// Parts belonging to the manifest's write.
    pub current_parts: usize,
    /// Parts left behind by other writes.
    pub stale_parts: usize,
}

/// Reads logical records back from the store.
pub struct Reassembler<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    config: &'a Config,
}

impl<'a, S: DocumentStore + ?Sized> Reassembler<'a, S> {
    /// Creates a reader over a store.
    pub fn new(store: &'a S, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Reads a logical record.
    ///
    /// Returns `Ok(None)` if no record is stored at `(collection, id)`.
    ///
    /// # Errors
    ///
    /// - [`ReadError::Store`] if a store call fails
    /// - [`ReadError::Corrupt`] if the manifest or a part cannot be decoded
    /// - [`ReadError::Reconstruction`] if the parts do not add up
    pub fn read(&self, collection: &str, id: &str) -> ReadResult<Option<Record>> {
        let path = DocPath::new(collection, id);
        let manifest = match self.load(&path)? {
            None => return Ok(None),
            Some(StoredRecord::Direct(record)) => return Ok(Some(record)),
            Some(StoredRecord::MultiPart(manifest)) => manifest,
        };

        let (current, stale) = self.load_parts(&path, &manifest)?;
        if stale > 0 {
            tracing::debug!(%path, stale, generation = %manifest.generation, "skipped stale parts");
        }
        let record = reassemble(&manifest, current)?;
        tracing::debug!(%path, parts = manifest.total_parts, fields = record.len(), "read record");
        Ok(Some(record))
    }

    /// Describes how a record is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Store`] or [`ReadError::Corrupt`].
    pub fn inspect(&self, collection: &str, id: &str) -> ReadResult<Option<RecordLayout>> {
        let path = DocPath::new(collection, id);
        match self.load(&path)? {
            None => Ok(None),
            Some(StoredRecord::Direct(record)) => {
                let stale = self
                    .store
                    .list(collection, id, &self.config.parts_subcollection)?
                    .len();
                Ok(Some(RecordLayout {
                    manifest: None,
                    direct_fields: Some(record.len()),
                    current_parts: 0,
                    stale_parts: stale,
                }))
            }
            Some(StoredRecord::MultiPart(manifest)) => {
                let (current, stale) = self.load_parts(&path, &manifest)?;
                Ok(Some(RecordLayout {
                    manifest: Some(manifest),
                    direct_fields: None,
                    current_parts: current.len(),
                    stale_parts: stale,
                }))
            }
        }
    }

    fn load(&self, path: &DocPath) -> ReadResult<Option<StoredRecord>> {
        self.store
            .get(&path.collection, &path.id)?
            .map(|raw| {
                StoredRecord::from_raw(raw).map_err(|source| ReadError::Corrupt {
                    path: path.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Fetches all parts and keeps those of the manifest's write.
    /// Returns them with the number of parts skipped.
    fn load_parts(&self, path: &DocPath, manifest: &Manifest) -> ReadResult<(Vec<Part>, usize)> {
        let sub = &self.config.parts_subcollection;
        let mut current = Vec::new();
        let mut stale = 0;
        for (doc_id, raw) in self.store.list(&path.collection, &path.id, sub)? {
            let part = Part::from_raw(raw).map_err(|source| ReadError::Corrupt {
                path: path.child(sub, doc_id).to_string(),
                source,
            })?;
            if is_current(manifest, &part) {
                current.push(part);
            } else {
                stale += 1;
            }
        }
        Ok((current, stale))
    }
}

/// Fragments of one split field, keyed by index.
#[derive(Default)]
struct SplitField {
    kind: Option<SplitKind>,
    parts: u32,
    fragments: BTreeMap<u32, String>,
}

/// Rebuilds a record from the parts of one write.
///
/// Parts may be given in any order; they are sorted by index and must cover
/// `0..manifest.total_parts` exactly. Descriptors and fragments of a field
/// may arrive in any relative order.
///
/// # Errors
///
/// Returns a [`ReconstructionError`]; no partial record is ever produced.
pub fn reassemble(manifest: &Manifest, mut parts: Vec<Part>) -> Result<Record, ReconstructionError> {
    parts.sort_by_key(|p| p.part_index);
    check_indices(manifest.total_parts, &parts)?;

    let mut record = Record::new();
    let mut splits: HashMap<String, SplitField> = HashMap::new();
    let mut split_order: Vec<String> = Vec::new();

    for part in parts {
        for entry in part.data.into_entries() {
            match entry {
                ChunkEntry::Field { name, value } => {
                    if record.contains_key(&name) {
                        return Err(ReconstructionError::DuplicateField { field: name });
                    }
                    record.insert(name, value);
                }
                ChunkEntry::FragmentMeta(meta) => {
                    let field = slot_for(&mut splits, &mut split_order, &meta.name);
                    if field.kind.is_some() {
                        return Err(ReconstructionError::DuplicateSplit { field: meta.name });
                    }
                    field.kind = Some(meta.split);
                    field.parts = meta.parts;
                }
                ChunkEntry::Fragment(fragment) => {
                    let field = slot_for(&mut splits, &mut split_order, &fragment.name);
                    if field.fragments.contains_key(&fragment.index) {
                        return Err(ReconstructionError::DuplicateFragment {
                            field: fragment.name,
                            index: fragment.index,
                        });
                    }
                    field.fragments.insert(fragment.index, fragment.content);
                }
            }
        }
    }

    for name in split_order {
        let Some(field) = splits.remove(&name) else {
            continue;
        };
        if record.contains_key(&name) {
            return Err(ReconstructionError::DuplicateField { field: name });
        }
        let value = finish_split(&name, field)?;
        record.insert(name, value);
    }
    Ok(record)
}

fn slot_for<'m>(
    splits: &'m mut HashMap<String, SplitField>,
    order: &mut Vec<String>,
    name: &str,
) -> &'m mut SplitField {
    if !splits.contains_key(name) {
        order.push(name.to_string());
    }
    splits.entry(name.to_string()).or_default()
}

fn check_indices(total: u32, parts: &[Part]) -> Result<(), ReconstructionError> {
    let mut expected = 0u32;
    for part in parts {
        if part.part_index < expected {
            return Err(ReconstructionError::DuplicatePart {
                index: part.part_index,
            });
        }
        if part.part_index > expected || expected >= total {
            break;
        }
        expected += 1;
    }
    if expected < total {
        return Err(ReconstructionError::MissingPart { index: expected });
    }
    if parts.len() != total as usize {
        return Err(ReconstructionError::PartCount {
            expected: total,
            found: parts.len(),
        });
    }
    Ok(())
}

fn finish_split(name: &str, field: SplitField) -> Result<Value, ReconstructionError> {
    let Some(kind) = field.kind else {
        return Err(ReconstructionError::OrphanFragment {
            field: name.to_string(),
        });
    };

    let found = field.fragments.len();
    let beyond = field
        .fragments
        .last_key_value()
        .is_some_and(|(&last, _)| last >= field.parts);
    if beyond || found > field.parts as usize {
        return Err(ReconstructionError::FragmentCount {
            field: name.to_string(),
            expected: field.parts,
            found,
        });
    }
    // indices are below `parts`, so any gap shows up as a key mismatch
    let missing = (0u32..)
        .zip(field.fragments.keys())
        .find(|&(expected, index)| expected != *index)
        .map_or(found as u32, |(expected, _)| expected);
    if missing < field.parts {
        return Err(ReconstructionError::MissingFragment {
            field: name.to_string(),
            index: missing,
        });
    }

    let text: String = field.fragments.into_values().collect();
    match kind {
        SplitKind::SplitString => Ok(Value::String(text)),
        SplitKind::SplitJson => {
            from_canonical_string(&text).map_err(|e| ReconstructionError::InvalidJson {
                field: name.to_string(),
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_record;
    use crate::part::{Chunk, Fragment, FragmentMeta, PartData};
    use crate::types::{Generation, WriteToken};
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn to_parts(chunks: &[Chunk], token: WriteToken) -> Vec<Part> {
        (0u32..)
            .zip(chunks)
            .map(|(i, c)| Part {
                part_index: i,
                generation: Generation::new(1),
                write_token: token,
                data: c.to_data(),
            })
            .collect()
    }

    fn manifest(total: u32, token: WriteToken) -> Manifest {
        let mut m = Manifest::for_write(total, token, None);
        m.generation = Generation::new(1);
        m
    }

    fn roundtrip(original: &Record, config: &Config) -> Record {
        let chunks = chunk_record(original, config).unwrap();
        let token = WriteToken::new();
        let m = manifest(chunks.len() as u32, token);
        reassemble(&m, to_parts(&chunks, token)).unwrap()
    }

    #[test]
    fn roundtrip_tiny_record() {
        let r = record(json!({"a": "x"}));
        assert_eq!(roundtrip(&r, &Config::default()), r);
    }

    #[test]
    fn roundtrip_empty_record() {
        assert_eq!(roundtrip(&Record::new(), &Config::default()), Record::new());
    }

    #[test]
    fn roundtrip_split_string_and_json() {
        let r = record(json!({
            "name": "Casa",
            "bio": "y".repeat(5_000),
            "menu": {"items": (0..300).map(|i| json!({"id": i, "dish": format!("dish {i}")})).collect::<Vec<_>>()},
            "rating": 4.5,
            "open": null
        }));
        assert_eq!(roundtrip(&r, &Config::new().ceiling(1_000)), r);
    }

    #[test]
    fn parts_in_any_order() {
        let r = record(json!({"a": "x".repeat(300), "b": "y".repeat(300), "c": [1, 2, 3]}));
        let config = Config::new().ceiling(100);
        let chunks = chunk_record(&r, &config).unwrap();
        let token = WriteToken::new();
        let mut parts = to_parts(&chunks, token);
        parts.reverse();
        let m = manifest(chunks.len() as u32, token);
        assert_eq!(reassemble(&m, parts).unwrap(), r);
    }

    #[test]
    fn fragments_before_descriptor_are_tolerated() {
        let token = WriteToken::new();
        let fragment = |index: u32, content: &str| Part {
            part_index: index,
            generation: Generation::new(1),
            write_token: token,
            data: PartData {
                fragments: vec![Fragment {
                    name: "bio".into(),
                    index,
                    content: content.into(),
                }],
                ..PartData::default()
            },
        };
        let parts = vec![
            fragment(1, "lo"),
            fragment(0, "hel"),
            Part {
                part_index: 2,
                generation: Generation::new(1),
                write_token: token,
                data: PartData {
                    splits: vec![FragmentMeta {
                        name: "bio".into(),
                        split: SplitKind::SplitString,
                        parts: 2,
                    }],
                    ..PartData::default()
                },
            },
        ];
        let r = reassemble(&manifest(3, token), parts).unwrap();
        assert_eq!(r.get("bio"), Some(&json!("hello")));
    }

    #[test]
    fn missing_part_is_an_error() {
        let r = record(json!({"bio": "z".repeat(500)}));
        let config = Config::new().ceiling(100);
        let chunks = chunk_record(&r, &config).unwrap();
        let token = WriteToken::new();
        let mut parts = to_parts(&chunks, token);
        parts.remove(3);
        let err = reassemble(&manifest(chunks.len() as u32, token), parts).unwrap_err();
        assert_eq!(err, ReconstructionError::MissingPart { index: 3 });
    }

    #[test]
    fn extra_part_is_an_error() {
        let r = record(json!({"a": 1}));
        let chunks = chunk_record(&r, &Config::default()).unwrap();
        let token = WriteToken::new();
        let mut parts = to_parts(&chunks, token);
        let mut extra = parts[0].clone();
        extra.part_index = 1;
        extra.data = PartData::default();
        parts.push(extra);
        let err = reassemble(&manifest(1, token), parts).unwrap_err();
        assert_eq!(err, ReconstructionError::PartCount { expected: 1, found: 2 });
    }

    #[test]
    fn duplicate_part_is_an_error() {
        let r = record(json!({"a": 1}));
        let chunks = chunk_record(&r, &Config::default()).unwrap();
        let token = WriteToken::new();
        let mut parts = to_parts(&chunks, token);
        parts.push(parts[0].clone());
        let err = reassemble(&manifest(1, token), parts).unwrap_err();
        assert_eq!(err, ReconstructionError::DuplicatePart { index: 0 });
    }

    #[test]
    fn fragment_count_mismatch_is_an_error() {
        let token = WriteToken::new();
        let data = PartData {
            splits: vec![FragmentMeta {
                name: "bio".into(),
                split: SplitKind::SplitString,
                parts: 3,
            }],
            fragments: vec![
                Fragment {
                    name: "bio".into(),
                    index: 0,
                    content: "a".into(),
                },
                Fragment {
                    name: "bio".into(),
                    index: 2,
                    content: "c".into(),
                },
            ],
            ..PartData::default()
        };
        let parts = vec![Part {
            part_index: 0,
            generation: Generation::new(1),
            write_token: token,
            data: data.clone(),
        }];
        assert_eq!(
            reassemble(&manifest(1, token), parts).unwrap_err(),
            ReconstructionError::MissingFragment {
                field: "bio".into(),
                index: 1
            }
        );

        let mut too_many = data;
        too_many.splits[0].parts = 1;
        let parts = vec![Part {
            part_index: 0,
            generation: Generation::new(1),
            write_token: token,
            data: too_many,
        }];
        assert_eq!(
            reassemble(&manifest(1, token), parts).unwrap_err(),
            ReconstructionError::FragmentCount {
                field: "bio".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn orphan_fragment_is_an_error() {
        let token = WriteToken::new();
        let parts = vec![Part {
            part_index: 0,
            generation: Generation::new(1),
            write_token: token,
            data: PartData {
                fragments: vec![Fragment {
                    name: "bio".into(),
                    index: 0,
                    content: "a".into(),
                }],
                ..PartData::default()
            },
        }];
        assert!(matches!(
            reassemble(&manifest(1, token), parts),
            Err(ReconstructionError::OrphanFragment { .. })
        ));
    }

    #[test]
    fn unparsable_json_split_is_an_error() {
        let token = WriteToken::new();
        let parts = vec![Part {
            part_index: 0,
            generation: Generation::new(1),
            write_token: token,
            data: PartData {
                splits: vec![FragmentMeta {
                    name: "menu".into(),
                    split: SplitKind::SplitJson,
                    parts: 1,
                }],
                fragments: vec![Fragment {
                    name: "menu".into(),
                    index: 0,
                    content: "{\"items\":[1,2".into(),
                }],
                ..PartData::default()
            },
        }];
        assert!(matches!(
            reassemble(&manifest(1, token), parts),
            Err(ReconstructionError::InvalidJson { .. })
        ));
    }

    #[test]
    fn field_named_like_bookkeeping_roundtrips() {
        let r = record(json!({
            "notes_metadata": {"type": "split_string", "parts": 9, "originalKey": "notes"},
            "notes_part_0": "plain value",
            "notes": "n".repeat(400)
        }));
        assert_eq!(roundtrip(&r, &Config::new().ceiling(150)), r);
    }

    #[test]
    fn split_floats_keep_every_bit() {
        let vals = [
            2.211_264_758_889_044_6e-23,
            1.120_377_875_953_363_3e-10,
            1.263_883_602_868_924_1e-28,
            f64::MIN_POSITIVE,
            f64::MAX,
            -0.1,
        ];
        let r = record(json!({ "vals": vals.repeat(4) }));
        let config = Config::new().ceiling(200);
        assert!(chunk_record(&r, &config).unwrap().len() > 1);

        let read = roundtrip(&r, &config);
        let bits = |rec: &Record| -> Vec<u64> {
            rec["vals"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_f64().unwrap().to_bits())
                .collect()
        };
        assert_eq!(bits(&read), bits(&r));
    }

    proptest! {
        #[test]
        fn split_float_arrays_roundtrip(
            vals in prop::collection::vec(any::<f64>().prop_filter("finite", |f| f.is_finite()), 20)
        ) {
            let r = record(json!({ "vals": vals }));
            prop_assert_eq!(roundtrip(&r, &Config::new().ceiling(200)), r);
        }
    }
}
