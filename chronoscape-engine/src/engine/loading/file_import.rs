use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task, block_on};

use crate::engine::loading::history_loader::{HistoryLoaded, install_history};
use crate::engine::runtime::GalaxyRuntime;
use crate::history::{GitHistoryExport, HistoryResult, read_history_file};

struct ImportTask {
    path: PathBuf,
    task: Task<HistoryResult<GitHistoryExport>>,
}

/// At most one history file being read in the background.
///
/// A newer request replaces an unfinished one; the galaxy keeps showing the
/// current history until a read completes.
#[derive(Resource, Default)]
pub struct PendingImport {
    pending: Option<ImportTask>,
}

impl PendingImport {
    pub fn spawn(&mut self, path: PathBuf) {
        info!("Reading history from {}", path.display());
        let task_path = path.clone();
        let task = IoTaskPool::get().spawn(async move { read_history_file(&task_path) });
        if let Some(previous) = self.pending.replace(ImportTask { path, task }) {
            debug!("Dropped unfinished import of {}", previous.path.display());
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The finished read, if any. Leaves unfinished work in place.
    pub fn take_finished(&mut self) -> Option<(PathBuf, HistoryResult<GitHistoryExport>)> {
        if !self.pending.as_ref()?.task.is_finished() {
            return None;
        }
        let ImportTask { path, task } = self.pending.take()?;
        Some((path, block_on(task)))
    }
}

pub fn is_history_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn handle_file_drop(mut events: EventReader<FileDragAndDrop>, mut imports: ResMut<PendingImport>) {
    for event in events.read() {
        let FileDragAndDrop::DroppedFile { path_buf, .. } = event else {
            continue;
        };
        if is_history_file(path_buf) {
            imports.spawn(path_buf.clone());
        } else {
            warn!("Ignoring dropped file {}, expected a .json export", path_buf.display());
        }
    }
}

pub fn poll_history_import(
    mut imports: ResMut<PendingImport>,
    mut runtime: NonSendMut<GalaxyRuntime>,
    mut loaded: EventWriter<HistoryLoaded>,
) {
    let Some((path, result)) = imports.take_finished() else {
        return;
    };

    let source = path.display().to_string();
    match result.and_then(|export| install_history(&mut runtime, export, &source)) {
        Ok(commits) => {
            loaded.write(HistoryLoaded { source, commits });
        }
        Err(err) => error!("Import of {source} failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryError;
    use bevy::tasks::TaskPool;
    use std::io::Write;

    fn finish(imports: &mut PendingImport) -> (PathBuf, HistoryResult<GitHistoryExport>) {
        for _ in 0..1000 {
            if let Some(done) = imports.take_finished() {
                return done;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("import never finished");
    }

    #[test]
    fn test_json_extension_check() {
        assert!(is_history_file(Path::new("history.json")));
        assert!(is_history_file(Path::new("HISTORY.JSON")));
        assert!(!is_history_file(Path::new("history.txt")));
        assert!(!is_history_file(Path::new("history")));
    }

    #[test]
    fn test_import_reads_file_in_background() {
        IoTaskPool::get_or_init(TaskPool::new);
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"commits": [{{"hash": "a1"}}, {{"hash": "b2"}}]}}"#).expect("write");

        let mut imports = PendingImport::default();
        imports.spawn(file.path().to_path_buf());
        assert!(imports.is_pending());

        let (path, result) = finish(&mut imports);
        assert_eq!(path, file.path());
        assert_eq!(result.expect("parsed").commits.len(), 2);
        assert!(!imports.is_pending());
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        IoTaskPool::get_or_init(TaskPool::new);
        let dir = tempfile::tempdir().expect("temp dir");
        let mut imports = PendingImport::default();
        imports.spawn(dir.path().join("missing.json"));

        let (_, result) = finish(&mut imports);
        assert!(matches!(result, Err(HistoryError::Io { .. })));
    }
}
