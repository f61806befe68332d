//! Record sources.
//!
//! Reads already-exported policy and claim records from disk and hands
//! them to the pipeline fully materialized.

pub mod loader;

pub use loader::{RecordBundle, RecordSource, SourceError};
