//! Stress tests for Bigdoc.
//!
//! These tests verify behavior under heavy load and concurrent access.

use crate::fixtures::record_from;
use bigdoc_core::{Config, PartStore, Record};
use bigdoc_store::InMemoryStore;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        Self {
            total_ops: successful + failed,
            successful_ops: successful,
            failed_ops: failed,
            duration,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of writer threads; each owns its own record ids.
    pub writers: usize,
    /// Writes per writer.
    pub writes_per_writer: usize,
    /// Number of reader threads.
    pub readers: usize,
    /// Chunk ceiling.
    pub ceiling: usize,
    /// Size of the large field in each record, in characters.
    pub big_field_len: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writers: 4,
            writes_per_writer: 20,
            readers: 2,
            ceiling: 2_000,
            big_field_len: 10_000,
        }
    }
}

fn stress_record(writer: usize, round: usize, big_field_len: usize) -> Record {
    let fill = char::from(b'a' + (round % 26) as u8);
    record_from(json!({
        "writer": writer,
        "round": round,
        "big": fill.to_string().repeat(big_field_len)
    }))
}

/// Runs writers on disjoint record ids while readers poll a record that is
/// never rewritten. Returns the writer result; every read of the stable
/// record must succeed.
///
/// # Panics
///
/// Panics if a reader sees the stable record change or fail.
pub fn concurrent_writes(config: &StressConfig) -> StressTestResult {
    let engine = Arc::new(
        PartStore::in_memory(Config::new().ceiling(config.ceiling))
            .expect("Failed to create engine"),
    );
    let stable = stress_record(usize::MAX, 0, config.big_field_len);
    engine
        .write("stress", "stable", &stable)
        .expect("Failed to write stable record");

    let done = Arc::new(AtomicUsize::new(0));
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let writers: Vec<_> = (0..config.writers)
        .map(|w| {
            let engine = Arc::clone(&engine);
            let done = Arc::clone(&done);
            let successes = Arc::clone(&successes);
            let failures = Arc::clone(&failures);
            let writes = config.writes_per_writer;
            let len = config.big_field_len;
            thread::spawn(move || {
                for round in 0..writes {
                    let record = stress_record(w, round, len);
                    match engine.write("stress", &format!("w{w}"), &record) {
                        Ok(_) => successes.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failures.fetch_add(1, Ordering::Relaxed),
                    };
                }
                done.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let readers: Vec<_> = (0..config.readers)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let done = Arc::clone(&done);
            let stable = stable.clone();
            let writer_count = config.writers;
            thread::spawn(move || {
                while done.load(Ordering::SeqCst) < writer_count {
                    let read = engine
                        .read("stress", "stable")
                        .expect("stable record must stay readable");
                    assert_eq!(read.as_ref(), Some(&stable));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("stress thread panicked");
    }

    StressTestResult::new(
        successes.load(Ordering::Relaxed),
        failures.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Returns the engine's view of every writer's final record.
pub fn final_records(engine: &PartStore<InMemoryStore>, writers: usize) -> Vec<Option<Record>> {
    (0..writers)
        .map(|w| {
            engine
                .read("stress", &format!("w{w}"))
                .expect("Failed to read record")
        })
        .collect()
}
