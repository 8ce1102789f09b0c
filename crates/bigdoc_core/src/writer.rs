//! The write path: cleanup, version check, persist.

use crate::chunk::Chunker;
use crate::config::Config;
use crate::error::{WriteError, WriteResult};
use crate::manifest::{Manifest, StoredRecord};
use crate::part::{ChunkEntry, Part};
use crate::types::{Generation, Record, WriteToken};
use bigdoc_codec::CodecError;
use bigdoc_store::{DocPath, DocumentStore, RawRecord, StoreError};

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Number of parts written.
    pub total_parts: u32,
    /// Generation stamped on the manifest and parts.
    pub generation: Generation,
    /// Token of this write.
    pub write_token: WriteToken,
    /// Number of fields that had to be split.
    pub split_fields: usize,
    /// Number of documents removed by the cleanup phase.
    pub removed: usize,
}

/// Replaces the physical representation of logical records.
///
/// A write is two store operations that are not jointly atomic:
///
/// 1. **cleanup** deletes the previous manifest and every part under the
///    record in one `atomic_delete`
/// 2. **persist** writes the new manifest and all new parts in one
///    `atomic_write`
///
/// Everything that can fail without touching the store (chunking, encoding)
/// happens first. Between the two phases the manifest is re-read; if another
/// writer persisted in the meantime the write is abandoned with
/// [`WriteError::Conflict`]. Callers must still serialize writes to one
/// record id: the check narrows the race, it cannot close it.
pub struct PartWriter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    config: &'a Config,
    chunker: Chunker,
}

impl<'a, S: DocumentStore + ?Sized> PartWriter<'a, S> {
    /// Creates a writer over a store.
    pub fn new(store: &'a S, config: &'a Config) -> Self {
        Self {
            store,
            config,
            chunker: Chunker::new(config),
        }
    }

    /// Writes a logical record, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// - [`WriteError::Serialization`] if the record cannot be encoded;
    ///   nothing was mutated
    /// - [`WriteError::Store`] if a store call failed before any mutation
    /// - [`WriteError::Conflict`] if another writer got in between cleanup
    ///   and persist
    /// - [`WriteError::PartialWrite`] if cleanup removed the old record but
    ///   persist failed; the record is now absent
    pub fn write(&self, collection: &str, id: &str, record: &Record) -> WriteResult<WriteReceipt> {
        let path = DocPath::new(collection, id);

        let chunks = self.chunker.chunk(record)?;
        let total_parts = u32::try_from(chunks.len())
            .map_err(|_| CodecError::serialization(format!("{path} needs too many parts")))?;
        let split_fields = chunks
            .iter()
            .flat_map(|c| c.entries())
            .filter(|e| matches!(e, ChunkEntry::FragmentMeta(_)))
            .count();

        let existing = self.store.get(collection, id)?;
        let exists = existing.is_some();
        let previous = existing.and_then(|raw| match StoredRecord::from_raw(raw) {
            Ok(stored) => stored.manifest().cloned(),
            Err(e) => {
                tracing::warn!(%path, error = %e, "replacing undecodable manifest");
                None
            }
        });

        let token = WriteToken::new();
        let manifest = Manifest::for_write(total_parts, token, previous.as_ref());
        let mut writes: Vec<(DocPath, RawRecord)> = Vec::with_capacity(chunks.len() + 1);
        writes.push((path.clone(), manifest.to_raw()?));
        for (index, chunk) in (0u32..).zip(&chunks) {
            let part = Part {
                part_index: index,
                generation: manifest.generation,
                write_token: token,
                data: chunk.to_data(),
            };
            writes.push((
                path.child(&self.config.parts_subcollection, part.id()),
                part.to_raw()?,
            ));
        }

        let removed = self.cleanup(&path, exists)?;
        tracing::debug!(%path, removed, "cleanup phase complete");

        let mutated = removed > 0;
        let interloper = self
            .store
            .get(collection, id)
            .map_err(|source| Self::after_cleanup(&path, mutated, source))?;
        if interloper.is_some() {
            tracing::warn!(%path, "record changed between cleanup and persist");
            return Err(WriteError::Conflict {
                path: path.to_string(),
            });
        }

        self.store
            .atomic_write(writes)
            .map_err(|source| Self::after_cleanup(&path, mutated, source))?;

        tracing::info!(
            %path,
            parts = total_parts,
            split_fields,
            generation = %manifest.generation,
            "wrote record"
        );
        Ok(WriteReceipt {
            total_parts,
            generation: manifest.generation,
            write_token: token,
            split_fields,
            removed,
        })
    }

    /// Deletes a logical record: its manifest and every part of every
    /// generation, in one atomic operation.
    ///
    /// Returns false if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Store`] if a store call fails.
    pub fn delete(&self, collection: &str, id: &str) -> WriteResult<bool> {
        let path = DocPath::new(collection, id);
        let exists = self.store.get(collection, id)?.is_some();
        let removed = self.cleanup(&path, exists)?;
        if removed > 0 {
            tracing::info!(%path, removed, "deleted record");
        }
        Ok(removed > 0)
    }

    /// Deletes parts that do not belong to the current manifest's write.
    ///
    /// With no manifest every part is garbage. A record stored directly has
    /// no parts of its own, so all of its parts are garbage too. Returns the
    /// number of parts removed.
    ///
    /// # Errors
    ///
    /// - [`WriteError::Store`] if a store call fails
    /// - [`WriteError::Corrupt`] if the record's own document cannot be
    ///   decoded; nothing is removed
    pub fn collect_garbage(&self, collection: &str, id: &str) -> WriteResult<usize> {
        let path = DocPath::new(collection, id);
        let current = match self.store.get(collection, id)? {
            Some(raw) => StoredRecord::from_raw(raw)
                .map_err(|source| WriteError::Corrupt {
                    path: path.to_string(),
                    source,
                })?
                .manifest()
                .cloned(),
            None => None,
        };

        let sub = &self.config.parts_subcollection;
        let mut stale = Vec::new();
        for (doc_id, raw) in self.store.list(collection, id, sub)? {
            let keep = match (&current, Part::from_raw(raw)) {
                (Some(manifest), Ok(part)) => is_current(manifest, &part),
                _ => false,
            };
            if !keep {
                stale.push(path.child(sub, doc_id));
            }
        }

        let count = stale.len();
        if count > 0 {
            self.store.atomic_delete(stale)?;
            tracing::info!(%path, removed = count, "collected stale parts");
        }
        Ok(count)
    }

    /// Removes the record's own document (if present) and all its parts.
    /// Makes no call when there is nothing to remove.
    fn cleanup(&self, path: &DocPath, include_manifest: bool) -> WriteResult<usize> {
        let sub = &self.config.parts_subcollection;
        let mut doomed: Vec<DocPath> = self
            .store
            .list(&path.collection, &path.id, sub)?
            .into_iter()
            .map(|(doc_id, _)| path.child(sub, doc_id))
            .collect();
        if include_manifest {
            doomed.push(path.clone());
        }
        if doomed.is_empty() {
            return Ok(0);
        }
        let count = doomed.len();
        self.store.atomic_delete(doomed)?;
        Ok(count)
    }

    fn after_cleanup(path: &DocPath, mutated: bool, source: StoreError) -> WriteError {
        if mutated {
            tracing::warn!(%path, error = %source, "persist failed after cleanup; record is absent");
            WriteError::PartialWrite {
                path: path.to_string(),
                source,
            }
        } else {
            WriteError::Store(source)
        }
    }
}

/// Returns true if a part was produced by the write the manifest describes.
pub(crate) fn is_current(manifest: &Manifest, part: &Part) -> bool {
    match &manifest.write_token {
        Some(token) => part.belongs_to(manifest.generation, token),
        None => part.generation == manifest.generation,
    }
}
