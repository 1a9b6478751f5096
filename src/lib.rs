//! Bulk AI translator for structured database exports
//!
//! Flattens the table/row/field records of a JSON database export into a
//! key -> text workload, dispatches fixed-size batches to a chat-completion
//! service and merges the translations back in place, leaving everything
//! else untouched.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod processors;

// Re-export key types for convenience
pub use crate::core::{
    client::{BatchTranslation, ChatTranslator},
    config::{GlossaryTerm, TranslatorConfig},
    errors::TranslationError,
    models::{Document, FieldRef, Table, TokenCounts, UsageReport, Workload},
    usage::UsageTracker,
};

pub use crate::processors::export::ExportProcessor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
