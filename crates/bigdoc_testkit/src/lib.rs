//! # Bigdoc Testkit
//!
//! Test utilities for Bigdoc.
//!
//! This crate provides:
//! - Test fixtures and engine helpers
//! - Property-based test generators using proptest
//! - Fault-injecting store wrappers
//! - Cross-crate integration test helpers
//! - Fuzz testing harnesses
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use bigdoc_testkit::prelude::*;
//! use serde_json::json;
//!
//! with_engine(200, |engine| {
//!     let record = record_from(json!({"bio": "x".repeat(1_000)}));
//!     assert_roundtrip(&engine.engine, &record);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fault::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
