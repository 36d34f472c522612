use std::sync::Arc;

use bevy::asset::AssetLoadFailedEvent;
use bevy::prelude::*;
use serde::Deserialize;

use crate::engine::core::config::GalaxyConfig;
use crate::engine::loading::file_import::PendingImport;
use crate::engine::runtime::GalaxyRuntime;
use crate::history::{GitHistoryExport, HistoryError, HistoryResult, normalize_history, require_commits};
use crate::layout::prepare_history;

pub const DEMO_HISTORY_PATH: &str = "data/demo-history.json";

/// Raw exporter JSON, decoded leniently by the normalizer once loaded.
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct HistoryDocument(pub serde_json::Value);

#[derive(Resource, Default)]
pub struct HistoryLoader {
    handle: Option<Handle<HistoryDocument>>,
}

impl HistoryLoader {
    pub fn handle(&self) -> Option<&Handle<HistoryDocument>> {
        self.handle.as_ref()
    }
}

/// Sent whenever a new history replaces the one on screen.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HistoryLoaded {
    pub source: String,
    pub commits: usize,
}

/// Prepare `export` and show it. Empty exports leave the current history alone.
pub fn install_history(
    runtime: &mut GalaxyRuntime,
    export: GitHistoryExport,
    source: &str,
) -> HistoryResult<usize> {
    let export = require_commits(export)?;
    let prepared = prepare_history(&export);
    let commits = prepared.len();
    info!(
        "Loaded {commits} commits from {source} ({})",
        export.repo_label()
    );
    runtime.set_history(Arc::new(prepared));
    Ok(commits)
}

/// Startup: load the history named on the command line, or the demo.
pub fn start_loading(
    config: Res<GalaxyConfig>,
    mut loader: ResMut<HistoryLoader>,
    mut imports: ResMut<PendingImport>,
    asset_server: Res<AssetServer>,
) {
    match &config.history {
        Some(path) => imports.spawn(path.clone()),
        None => {
            info!("Loading demo history from {DEMO_HISTORY_PATH}");
            loader.handle = Some(asset_server.load(DEMO_HISTORY_PATH));
        }
    }
}

/// Install the demo document when it finishes loading, and again if it changes on disk.
pub fn apply_history_document(
    loader: Res<HistoryLoader>,
    mut events: EventReader<AssetEvent<HistoryDocument>>,
    documents: Res<Assets<HistoryDocument>>,
    mut runtime: NonSendMut<GalaxyRuntime>,
    mut loaded: EventWriter<HistoryLoaded>,
) {
    let Some(handle) = loader.handle() else {
        return;
    };

    for event in events.read() {
        let (AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id }) = event
        else {
            continue;
        };
        if *id != handle.id() {
            continue;
        }
        let Some(document) = documents.get(*id) else {
            continue;
        };

        let export = normalize_history(&document.0);
        match install_history(&mut runtime, export, DEMO_HISTORY_PATH) {
            Ok(commits) => {
                loaded.write(HistoryLoaded {
                    source: DEMO_HISTORY_PATH.to_string(),
                    commits,
                });
            }
            Err(err) => error!("Ignoring {DEMO_HISTORY_PATH}: {err}"),
        }
    }
}

pub fn report_history_load_failures(mut failures: EventReader<AssetLoadFailedEvent<HistoryDocument>>) {
    for failure in failures.read() {
        let err = HistoryError::Asset(failure.error.to_string());
        error!("Could not load {}: {err}", failure.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::HostConfig;
    use serde_json::json;

    #[test]
    fn test_document_is_transparent_json() {
        let document: HistoryDocument =
            serde_json::from_str(r#"[{"hash": "a1"}]"#).expect("valid json");
        assert_eq!(document.0, json!([{ "hash": "a1" }]));
    }

    #[test]
    fn test_install_history_replaces_runtime_history() {
        let mut runtime = GalaxyRuntime::mount(HostConfig::default(), false);
        let export = normalize_history(&json!([
            { "hash": "a1", "date": "2024-01-01T00:00:00Z" },
            { "hash": "b2", "date": "2024-01-02T00:00:00Z" },
        ]));

        let commits = install_history(&mut runtime, export, "test").expect("installed");

        assert_eq!(commits, 2);
        assert_eq!(runtime.history().len(), 2);
    }

    #[test]
    fn test_empty_history_keeps_previous() {
        let mut runtime = GalaxyRuntime::mount(HostConfig::default(), false);
        let first = normalize_history(&json!([{ "hash": "a1" }]));
        install_history(&mut runtime, first, "first").expect("installed");
        let before = Arc::clone(runtime.history());

        let result = install_history(&mut runtime, normalize_history(&json!({})), "empty");

        assert!(matches!(result, Err(HistoryError::Empty)));
        assert!(Arc::ptr_eq(&before, runtime.history()));
    }
}
