use std::f32::consts::TAU;

use bevy::log::debug;
use bevy::math::Vec3;
use indexmap::{IndexMap, IndexSet};

use constants::layout::{
    ANGULAR_STEP, BRIGHTNESS_BASE, BRIGHTNESS_EXPONENT, BRIGHTNESS_GAIN, BRIGHTNESS_MAX,
    BRIGHTNESS_MIN, DELETION_WEIGHT, INSERTION_WEIGHT, JITTER_SCALE, JITTER_SEEDS, LANE_SPACING,
    LANE_WOBBLE_AMPLITUDE, LANE_WOBBLE_FREQUENCY, RADIAL_STEP, SCALE_BASE, SCALE_GAIN,
    SPIRAL_WOBBLE_AMPLITUDE, SPIRAL_WOBBLE_BRANCH_PHASE, SPIRAL_WOBBLE_FREQUENCY,
    TIMELINE_GROWTH, TIMELINE_SWEEP,
};

use super::hash::hash_to_unit;
use super::palette::{branch_color, contributor_color, fallback_contributor_color};
use super::prepared::{BranchPath, PreparedCommit, PreparedHistory};
use crate::history::{Commit, GitHistoryExport};

/// Lay out every commit of `history` as a spiral arm per branch.
///
/// Pure and deterministic. The input is re-sorted by timestamp (stable) so
/// the result does not depend on the caller having normalised it.
pub fn prepare_history(history: &GitHistoryExport) -> PreparedHistory {
    if history.commits.is_empty() {
        return PreparedHistory::default();
    }

    let mut sorted: Vec<&Commit> = history.commits.iter().collect();
    sorted.sort_by_key(|commit| commit.timestamp_millis());

    let branch_names = discover(sorted.iter().map(|commit| branch_label(commit)));
    let author_names = discover(sorted.iter().map(|commit| commit.author.as_str()));

    let branch_colors: IndexMap<String, _> = branch_names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), branch_color(index, branch_names.len())))
        .collect();
    let contributor_colors: IndexMap<String, _> = author_names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            (
                name.to_string(),
                contributor_color(index, author_names.len()),
            )
        })
        .collect();

    let max_volume = sorted
        .iter()
        .map(|commit| commit_volume(commit))
        .fold(1.0, f64::max);

    let total = sorted.len();
    let branch_count = branch_colors.len();
    let mut local_counts: Vec<u32> = vec![0; branch_count];

    let commits: Vec<PreparedCommit> = sorted
        .iter()
        .enumerate()
        .map(|(global_index, commit)| {
            let branch = branch_label(commit);
            let branch_index = branch_colors.get_index_of(branch).unwrap_or(0);
            local_counts[branch_index] += 1;
            let local = local_counts[branch_index] as f32;

            let t = global_index as f32 / total.saturating_sub(1).max(1) as f32;
            let position = spiral_position(&commit.hash, local, t, branch_index, branch_count);

            let normalized = (commit_volume(commit) / max_volume).powf(BRIGHTNESS_EXPONENT);
            let brightness =
                (BRIGHTNESS_BASE + normalized * BRIGHTNESS_GAIN).clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
            let scale = SCALE_BASE + brightness * SCALE_GAIN;

            PreparedCommit {
                commit: (*commit).clone(),
                timestamp: commit.timestamp_millis(),
                position,
                branch: branch.to_owned(),
                branch_color: branch_colors[branch_index],
                contributor_color: contributor_colors
                    .get(&commit.author)
                    .copied()
                    .unwrap_or_else(fallback_contributor_color),
                brightness: brightness as f32,
                scale: scale as f32,
            }
        })
        .collect();

    let mut branches: Vec<BranchPath> = branch_colors
        .iter()
        .map(|(branch, color)| BranchPath {
            branch: branch.clone(),
            color: *color,
            points: Vec::new(),
        })
        .collect();
    for prepared in &commits {
        if let Some(index) = branch_colors.get_index_of(&prepared.branch) {
            branches[index].points.push(prepared.position);
        }
    }

    let min_timestamp = commits.first().map_or(0, |c| c.timestamp);
    let max_timestamp = commits.last().map_or(0, |c| c.timestamp);

    debug!(
        "Prepared {} commits across {} branches and {} contributors",
        commits.len(),
        branches.len(),
        contributor_colors.len()
    );

    PreparedHistory {
        commits,
        branches,
        branch_colors,
        contributor_colors,
        min_timestamp,
        max_timestamp,
    }
}

fn branch_label(commit: &Commit) -> &str {
    if commit.branch.is_empty() {
        "main"
    } else {
        &commit.branch
    }
}

/// Unique labels in first-appearance order.
fn discover<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    labels.collect::<IndexSet<_>>().into_iter().collect()
}

fn commit_volume(commit: &Commit) -> f64 {
    let volume = commit.files_changed as f64
        + commit.insertions as f64 * INSERTION_WEIGHT
        + commit.deletions as f64 * DELETION_WEIGHT;
    volume.max(1.0)
}

fn spiral_position(
    hash: &str,
    local: f32,
    t: f32,
    branch_index: usize,
    branch_count: usize,
) -> Vec3 {
    let branch = branch_index as f32;
    let base_angle = branch / branch_count.max(1) as f32 * TAU;
    let angle = base_angle + local * ANGULAR_STEP + t * TIMELINE_SWEEP;
    let radius = local * RADIAL_STEP + t * TIMELINE_GROWTH;

    let jitter = Vec3::new(
        hash_to_unit(hash, JITTER_SEEDS[0]) - 0.5,
        hash_to_unit(hash, JITTER_SEEDS[1]) - 0.5,
        hash_to_unit(hash, JITTER_SEEDS[2]) - 0.5,
    ) * Vec3::from_array(JITTER_SCALE);

    let spiral_offset = (local * SPIRAL_WOBBLE_FREQUENCY + branch * SPIRAL_WOBBLE_BRANCH_PHASE)
        .sin()
        * SPIRAL_WOBBLE_AMPLITUDE;
    let arm = radius + spiral_offset;
    let lane = (branch - (branch_count as f32 - 1.0) / 2.0) * LANE_SPACING
        + (local * LANE_WOBBLE_FREQUENCY + branch).sin() * LANE_WOBBLE_AMPLITUDE;

    Vec3::new(angle.cos() * arm, lane, angle.sin() * arm) + jitter
}
