use bevy::color::Hsla;
use bevy::math::Vec3;
use indexmap::IndexMap;

use crate::history::Commit;

/// A commit with its derived placement and appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCommit {
    pub commit: Commit,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub position: Vec3,
    pub branch: String,
    pub branch_color: Hsla,
    pub contributor_color: Hsla,
    pub brightness: f32,
    pub scale: f32,
}

/// Ordered positions of one branch's commits.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPath {
    pub branch: String,
    pub color: Hsla,
    pub points: Vec<Vec3>,
}

/// Spatializer output, shared read-only with the renderers through an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedHistory {
    pub commits: Vec<PreparedCommit>,
    pub branches: Vec<BranchPath>,
    pub branch_colors: IndexMap<String, Hsla>,
    pub contributor_colors: IndexMap<String, Hsla>,
    pub min_timestamp: i64,
    pub max_timestamp: i64,
}

impl PreparedHistory {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Number of leading commits with a timestamp at or before `timestamp`.
    pub fn count_until(&self, timestamp: i64) -> usize {
        self.commits
            .partition_point(|commit| commit.timestamp <= timestamp)
    }

    pub fn find_by_hash(&self, hash: &str) -> Option<usize> {
        self.commits
            .iter()
            .position(|prepared| prepared.commit.hash == hash)
    }
}
