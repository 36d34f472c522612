use time::OffsetDateTime;

/// Per-file line statistics attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFileStat {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
}

/// A single commit as trusted from the exporter.
///
/// `branch` is a display label, not a DAG edge. `date` only orders commits and
/// is never checked against `parents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub email: Option<String>,
    pub date: OffsetDateTime,
    pub message: String,
    pub branch: String,
    pub parents: Vec<String>,
    pub files_changed: u64,
    pub insertions: u64,
    pub deletions: u64,
    pub changed_files: Vec<ChangedFileStat>,
}

impl Commit {
    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        (self.date.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(8)
            .map_or(self.hash.len(), |(index, _)| index);
        &self.hash[..end]
    }
}

/// Normalised export: cosmetic metadata plus commits sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHistoryExport {
    pub schema_version: Option<String>,
    pub repo: Option<String>,
    pub generated_at: Option<String>,
    pub commits: Vec<Commit>,
}

impl GitHistoryExport {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn repo_label(&self) -> &str {
        self.repo.as_deref().unwrap_or("unnamed repository")
    }
}
