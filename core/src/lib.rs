//! carddemo-core: decodes the CardDemo fixed-width mainframe master
//! files and reconciles them into a relational SQLite target.
//!
//! The pipeline is strictly sequential: record parsers (built on the
//! total field decoders) produce in-memory record sequences, and the
//! orchestrator loads them stage by stage, re-querying authoritative id
//! sets between stages to keep referential integrity across files.

pub mod config;
pub mod decoder;
pub mod error;
pub mod importer;
pub mod parser;
pub mod record;
pub mod store;
pub mod types;
