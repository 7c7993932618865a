//! JSONL file writer for pipeline progress events.
//!
//! Each [`ProgressEvent`] is serialized as a single JSON line carrying its
//! `event` tag plus `timestamp` and `schema_version`, appended through a
//! buffered writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use synthesis_application::ProgressNotifier;
use synthesis_domain::{EVENT_SCHEMA_VERSION, ProgressEvent};
use tracing::warn;

/// Progress subscriber that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open the log for appending, creating the file and parent directories.
    ///
    /// Returns `None` if the file cannot be opened; event logging is
    /// best-effort and never blocks a run.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &ProgressEvent) -> Option<String> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let serde_json::Value::Object(mut map) = serde_json::to_value(event).ok()? else {
            return None;
        };
        map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
        map.insert(
            "schema_version".to_string(),
            serde_json::Value::from(EVENT_SCHEMA_VERSION),
        );
        serde_json::to_string(&serde_json::Value::Object(map)).ok()
    }
}

impl ProgressNotifier for JsonlEventLog {
    fn emit(&self, event: &ProgressEvent) {
        let Some(line) = Self::record(event) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(writer, "{}", line);
        // Terminal events end the run; make sure they hit disk
        if event.is_terminal() {
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthesis_domain::{RunProjection, Stage};

    fn events() -> Vec<ProgressEvent> {
        vec![
            ProgressEvent::StageStarted {
                run_id: "r1".into(),
                stage: Stage::InitialResponse,
                models: vec!["gpt-4o".into()],
            },
            ProgressEvent::RunCompleted {
                run_id: "r1".into(),
                final_answer: "done".into(),
                stages: 4,
            },
        ]
    }

    #[test]
    fn test_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/run.events.jsonl");
        let log = JsonlEventLog::open(&path).unwrap();
        for event in events() {
            log.emit(&event);
        }
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "stage_started");
        assert_eq!(first["run_id"], "r1");
        assert_eq!(first["stage"], "initial_response");
        assert_eq!(first["schema_version"], EVENT_SCHEMA_VERSION);
        assert!(first.get("timestamp").is_some());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "run_completed");
    }

    #[test]
    fn test_lines_parse_back_into_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let log = JsonlEventLog::open(&path).unwrap();
        for event in events() {
            log.emit(&event);
        }
        drop(log);

        // Unknown fields (timestamp, schema_version) are ignored on read
        let parsed: Vec<ProgressEvent> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed, events());
        assert!(RunProjection::from_events("r1", parsed.iter()).is_err());
    }

    #[test]
    fn test_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        for _ in 0..2 {
            let log = JsonlEventLog::open(&path).unwrap();
            log.emit(&events()[0]);
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_unopenable_path_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        assert!(JsonlEventLog::open(blocker.join("run.jsonl")).is_none());
    }
}
