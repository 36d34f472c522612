use bevy::prelude::*;

use crate::engine::loading::history_loader::HistoryLoaded;
use crate::engine::runtime::GalaxyRuntime;
use crate::engine::timeline::format_label_date;
use crate::layout::PreparedCommit;

const FILE_PREVIEW_LIMIT: usize = 8;

/// The commit last picked in the galaxy, if any.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct SelectedCommit(pub Option<PreparedCommit>);

/// Human-readable summary of a commit, one line per entry.
pub fn describe_commit(prepared: &PreparedCommit) -> Vec<String> {
    let commit = &prepared.commit;
    let mut lines = vec![
        format!("{} {}", commit.short_hash(), commit.message),
        format!(
            "{} on {} · {}",
            commit.author,
            prepared.branch,
            format_label_date(commit.date)
        ),
        format!(
            "{} files, +{} -{}",
            commit.files_changed, commit.insertions, commit.deletions
        ),
    ];

    lines.extend(
        commit
            .changed_files
            .iter()
            .take(FILE_PREVIEW_LIMIT)
            .map(|file| format!("  {} (+{} -{})", file.path, file.additions, file.deletions)),
    );
    let hidden = commit.changed_files.len().saturating_sub(FILE_PREVIEW_LIMIT);
    if hidden > 0 {
        lines.push(format!("  … {hidden} more"));
    }
    lines
}

pub fn report_selection(runtime: NonSend<GalaxyRuntime>, mut selected: ResMut<SelectedCommit>) {
    for commit in runtime.take_picked() {
        info!("Selected commit\n{}", describe_commit(&commit).join("\n"));
        selected.0 = Some(commit);
    }
}

pub fn clear_selection_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    runtime: NonSend<GalaxyRuntime>,
    mut selected: ResMut<SelectedCommit>,
) {
    if keyboard.just_pressed(KeyCode::Escape) && selected.0.is_some() {
        runtime.select_hash(None);
        selected.0 = None;
        debug!("Selection cleared");
    }
}

pub fn clear_selection_on_new_history(
    mut loaded: EventReader<HistoryLoaded>,
    mut selected: ResMut<SelectedCommit>,
) {
    if loaded.read().last().is_some() {
        selected.0 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::normalize_history;
    use crate::layout::prepare_history;
    use serde_json::json;

    fn prepared(files: usize) -> PreparedCommit {
        let changed: Vec<_> = (0..files)
            .map(|i| json!({ "path": format!("src/file{i}.rs"), "additions": i, "deletions": 1 }))
            .collect();
        let export = normalize_history(&json!([{
            "hash": "0123456789abcdef",
            "author": "Ada",
            "date": "2024-01-01T00:00:00Z",
            "message": "Add galaxy",
            "branch": "main",
            "changedFiles": changed,
        }]));
        prepare_history(&export).commits.remove(0)
    }

    #[test]
    fn test_describe_commit_header() {
        let lines = describe_commit(&prepared(2));
        assert_eq!(lines[0], "01234567 Add galaxy");
        assert_eq!(lines[1], "Ada on main · Jan 1, 2024");
        assert_eq!(lines[2], "2 files, +1 -2");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_file_preview_is_capped() {
        let lines = describe_commit(&prepared(11));
        assert_eq!(lines.len(), 3 + FILE_PREVIEW_LIMIT + 1);
        assert_eq!(lines.last().map(String::as_str), Some("  … 3 more"));
    }

    #[test]
    fn test_no_files_no_preview() {
        let lines = describe_commit(&prepared(0));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "0 files, +0 -0");
    }
}
