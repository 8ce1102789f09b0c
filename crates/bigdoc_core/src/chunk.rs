//! Greedy packing of a record's fields into size-bounded chunks.

use crate::config::Config;
use crate::part::{Chunk, ChunkEntry};
use crate::split::Splitter;
use crate::types::Record;
use bigdoc_codec::{CodecResult, Encoding};

/// Packs the fields of a record into chunks at or under the ceiling.
///
/// Single pass over the record in iteration order:
/// - a field whose entry size exceeds the ceiling flushes the open chunk and
///   is handed to the [`Splitter`]; its chunks are appended as they are
/// - a field that would overflow a non-empty open chunk flushes it first
/// - otherwise the field joins the open chunk
///
/// The same record and configuration always produce the same chunks.
#[derive(Clone, Copy)]
pub struct Chunker {
    encoding: &'static dyn Encoding,
    ceiling: usize,
    splitter: Splitter,
}

impl Chunker {
    /// Creates a chunker for the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: config.encoding.encoding(),
            ceiling: config.effective_ceiling(),
            splitter: Splitter::new(config),
        }
    }

    /// Returns the ceiling `C` in bytes.
    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Chunks a record.
    ///
    /// An empty record produces no chunks.
    ///
    /// # Errors
    ///
    /// Returns a codec error if any value cannot be serialized.
    pub fn chunk(&self, record: &Record) -> CodecResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut current = Chunk::new();

        for (key, value) in record {
            let entry_size = self.encoding.size_of_entry(key, value)?;

            if entry_size > self.ceiling {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.splitter.split(key, value)?);
                continue;
            }

            if current.size() + entry_size > self.ceiling && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push(
                ChunkEntry::Field {
                    name: key.clone(),
                    value: value.clone(),
                },
                entry_size,
            );
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        tracing::debug!(
            fields = record.len(),
            chunks = chunks.len(),
            ceiling = self.ceiling,
            encoding = self.encoding.name(),
            "chunked record"
        );
        Ok(chunks)
    }
}

/// Chunks a record with the given configuration.
///
/// # Errors
///
/// Returns a codec error if any value cannot be serialized.
pub fn chunk_record(record: &Record, config: &Config) -> CodecResult<Vec<Chunk>> {
    Chunker::new(config).chunk(record)
}
