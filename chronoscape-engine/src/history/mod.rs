//! Commit history model and tolerant import.
//!
//! Raw exporter JSON is repaired field by field into a canonical, time-sorted
//! commit list. Individual bad records are dropped; only I/O and JSON syntax
//! failures surface as errors.

/// Load failures surfaced to the caller.
pub mod error;

/// Canonical commit, file statistic and export types.
pub mod model;

/// Per-field tolerant decoding and stable chronological ordering.
pub mod normalizer;

pub use error::{HistoryError, HistoryResult};
pub use model::{ChangedFileStat, Commit, GitHistoryExport};
pub use normalizer::{normalize_history, parse_history_str, read_history_file, require_commits};
