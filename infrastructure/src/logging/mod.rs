//! Logging infrastructure: structured progress-event logging.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer that implements the
//! [`ProgressNotifier`](synthesis_application::ProgressNotifier) port.

mod jsonl_event_log;

pub use jsonl_event_log::JsonlEventLog;
