//! Deterministic, pure logic shared by the scaffolder.
//!
//! Core modules are free of I/O side effects. They operate on in-memory data
//! and return deterministic outputs suitable for tests.

pub mod actions;
pub mod capabilities;
pub mod contract;
pub mod document;
pub mod locator_key;
pub mod locator_set;
pub mod naming;
pub mod safe_path;
pub mod selector;
pub mod synthesizer;
pub mod types;
