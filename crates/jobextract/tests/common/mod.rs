//! Shared test utilities for jobextract integration tests.
//!
//! This module provides:
//! - `TestHarness` for a temporary job server database on disk
//! - Builder patterns for pipelines and job rows

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{CountingStore, TestHarness};
