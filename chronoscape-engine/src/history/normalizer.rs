use std::path::Path;

use bevy::log::debug;
use serde_json::{Map, Value};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use super::error::{HistoryError, HistoryResult};
use super::model::{ChangedFileStat, Commit, GitHistoryExport};

const UNKNOWN_AUTHOR: &str = "Unknown Author";
const EMPTY_MESSAGE: &str = "(no commit message)";
const DEFAULT_BRANCH: &str = "main";
const UNKNOWN_PATH: &str = "unknown";

const LOCAL_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
const SPACED_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Repair an arbitrary parsed JSON value into a time-sorted history.
///
/// Accepts `{ commits: [...] }` or a bare list. Anything else yields an empty
/// commit list; deciding whether that is an error is left to the caller.
pub fn normalize_history(raw: &Value) -> GitHistoryExport {
    let (root, records) = match raw {
        Value::Array(records) => (None, records.as_slice()),
        Value::Object(root) => (
            Some(root),
            root.get("commits")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice),
        ),
        _ => (None, &[][..]),
    };

    let mut commits: Vec<Commit> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let commit = normalize_commit(record, index);
            if commit.is_none() {
                debug!("Dropping malformed commit record at index {index}");
            }
            commit
        })
        .collect();

    // `sort_by_key` is stable, so equal dates keep their input order.
    commits.sort_by_key(|commit| commit.date);

    let metadata = |key: &str| root.and_then(|root| string_field(root, key)).map(str::to_owned);

    GitHistoryExport {
        schema_version: metadata("schemaVersion"),
        repo: metadata("repo"),
        generated_at: metadata("generatedAt"),
        commits,
    }
}

/// Parse JSON text and normalise it. Only JSON syntax errors fail.
pub fn parse_history_str(text: &str) -> HistoryResult<GitHistoryExport> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(normalize_history(&raw))
}

/// Read a history export from disk.
pub fn read_history_file(path: impl AsRef<Path>) -> HistoryResult<GitHistoryExport> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_history_str(&text)
}

/// Reject histories without commits.
pub fn require_commits(history: GitHistoryExport) -> HistoryResult<GitHistoryExport> {
    if history.is_empty() {
        return Err(HistoryError::Empty);
    }
    Ok(history)
}

fn normalize_commit(raw: &Value, index: usize) -> Option<Commit> {
    let record = raw.as_object()?;

    let hash = non_empty_string_field(record, "hash")
        .map_or_else(|| format!("commit-{index:08x}"), str::to_owned);
    let author = string_field(record, "author").unwrap_or(UNKNOWN_AUTHOR).to_owned();
    let email = string_field(record, "email").map(str::to_owned);
    let date = string_field(record, "date")
        .and_then(parse_date)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let message = string_field(record, "message").unwrap_or(EMPTY_MESSAGE).to_owned();
    let branch = non_empty_string_field(record, "branch")
        .unwrap_or(DEFAULT_BRANCH)
        .to_owned();

    let parents = record
        .get("parents")
        .and_then(Value::as_array)
        .map(|parents| {
            parents
                .iter()
                .filter_map(Value::as_str)
                .filter(|parent| !parent.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let changed_files = normalize_changed_files(record.get("changedFiles").or_else(|| record.get("files")));

    let files_changed =
        count_field(record, "filesChanged").unwrap_or(changed_files.len() as u64);
    let insertions = count_field(record, "insertions")
        .unwrap_or_else(|| changed_files.iter().map(|file| file.additions).sum());
    let deletions = count_field(record, "deletions")
        .unwrap_or_else(|| changed_files.iter().map(|file| file.deletions).sum());

    Some(Commit {
        hash,
        author,
        email,
        date,
        message,
        branch,
        parents,
        files_changed,
        insertions,
        deletions,
        changed_files,
    })
}

fn normalize_changed_files(raw: Option<&Value>) -> Vec<ChangedFileStat> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let file = entry.as_object()?;
            let path = string_field(file, "path")
                .or_else(|| string_field(file, "file"))
                .unwrap_or(UNKNOWN_PATH);
            if path.is_empty() {
                return None;
            }
            Some(ChangedFileStat {
                path: path.to_owned(),
                additions: count_field(file, "additions").unwrap_or(0),
                deletions: count_field(file, "deletions").unwrap_or(0),
            })
        })
        .collect()
}

fn string_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn non_empty_string_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    string_field(record, key).filter(|value| !value.is_empty())
}

/// Non-negative count from a JSON number or numeric string. Fractions truncate.
fn count_field(record: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = match record.get(key)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(raw, LOCAL_DATE_TIME)
                .or_else(|_| PrimitiveDateTime::parse(raw, SPACED_DATE_TIME))
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|| {
            Date::parse(raw, DATE_ONLY)
                .ok()
                .map(|date| date.midnight().assume_utc())
        })
}
