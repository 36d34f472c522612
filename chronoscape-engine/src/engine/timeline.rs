//! Timeline progress, autoplay and the visibility cursor.

use std::cell::Cell;
use std::rc::Rc;

use bevy::log::debug;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use constants::timeline::{PLAYBACK_RATE, PROGRESS_SMOOTHING, PROGRESS_SNAP_EPSILON};

use crate::layout::PreparedHistory;

const LABEL_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");
const LABEL_CHECKPOINTS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Count of leading, time-ordered commits currently revealed.
///
/// Written by the timeline once per frame and read by the renderers. Clones
/// share the same value.
#[derive(Debug, Clone, Default)]
pub struct VisibilityCursor(Rc<Cell<usize>>);

impl VisibilityCursor {
    pub fn new(value: usize) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    pub fn set(&self, value: usize) {
        self.0.set(value);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLabel {
    pub progress: f64,
    pub timestamp: i64,
    pub label: String,
}

#[derive(Debug)]
pub struct TimelineController {
    target: f64,
    animated: f64,
    playing: bool,
    cursor: VisibilityCursor,
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineController {
    /// Starts fully revealed and paused.
    pub fn new() -> Self {
        Self {
            target: 1.0,
            animated: 1.0,
            playing: false,
            cursor: VisibilityCursor::default(),
        }
    }

    pub fn cursor(&self) -> VisibilityCursor {
        self.cursor.clone()
    }

    pub fn target_progress(&self) -> f64 {
        self.target
    }

    pub fn animated_progress(&self) -> f64 {
        self.animated
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Jump the target to `progress` and stop playback.
    pub fn scrub(&mut self, progress: f64) {
        self.target = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        self.playing = false;
    }

    pub fn scrub_by(&mut self, step: f64) {
        self.scrub(self.target + step);
    }

    /// Toggle playback. Starting at the end rewinds to the beginning first.
    pub fn toggle_play(&mut self) {
        if self.playing {
            self.playing = false;
            return;
        }
        if self.target >= 1.0 {
            self.target = 0.0;
        }
        self.playing = true;
        debug!("Timeline playback started at {:.3}", self.target);
    }

    /// Snap to the fully revealed state, used after a new history loads.
    pub fn reset(&mut self) {
        self.target = 1.0;
        self.animated = 1.0;
        self.playing = false;
    }

    /// Advance by `elapsed_secs` and publish the cursor for `history`.
    pub fn tick(&mut self, elapsed_secs: f64, history: &PreparedHistory) -> usize {
        if self.playing {
            let next = self.target + elapsed_secs.max(0.0) * PLAYBACK_RATE;
            if next >= 1.0 {
                self.target = 1.0;
                self.playing = false;
                debug!("Timeline playback finished");
            } else {
                self.target = next;
            }
        }

        let delta = self.target - self.animated;
        if delta.abs() < PROGRESS_SNAP_EPSILON {
            self.animated = self.target;
        } else {
            self.animated += delta * PROGRESS_SMOOTHING;
        }

        let visible = cursor_for_progress(history, self.animated);
        self.cursor.set(visible);
        visible
    }
}

/// Timestamp shown at `progress`, interpolated between the history bounds.
pub fn effective_timestamp(history: &PreparedHistory, progress: f64) -> i64 {
    if history.is_empty() {
        return 0;
    }
    if history.min_timestamp == history.max_timestamp {
        return history.max_timestamp;
    }
    let span = (history.max_timestamp - history.min_timestamp) as f64;
    history.min_timestamp + (span * progress.clamp(0.0, 1.0)) as i64
}

/// Number of commits revealed at `progress`; at least one when any exist.
pub fn cursor_for_progress(history: &PreparedHistory, progress: f64) -> usize {
    if history.is_empty() {
        return 0;
    }
    history
        .count_until(effective_timestamp(history, progress))
        .max(1)
}

/// Dates at fixed checkpoints along the scrub bar.
pub fn timeline_labels(history: &PreparedHistory) -> Vec<TimelineLabel> {
    let Some(last) = history.len().checked_sub(1) else {
        return Vec::new();
    };

    LABEL_CHECKPOINTS
        .iter()
        .map(|&progress| {
            let index = ((last as f64 * progress).round() as usize).min(last);
            let commit = &history.commits[index];
            TimelineLabel {
                progress,
                timestamp: commit.timestamp,
                label: format_label_date(commit.commit.date),
            }
        })
        .collect()
}

pub fn format_label_date(date: OffsetDateTime) -> String {
    date.format(LABEL_DATE).unwrap_or_else(|_| "-".to_string())
}

/// Same format for an epoch-millisecond timestamp.
pub fn format_timestamp_label(timestamp_millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_millis) * 1_000_000)
        .map(format_label_date)
        .unwrap_or_else(|_| "-".to_string())
}
