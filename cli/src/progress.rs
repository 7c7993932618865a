//! Console progress for pipeline runs

use colored::Colorize;
use std::sync::Mutex;
use synthesis_application::ProgressNotifier;
use synthesis_domain::{ProgressEvent, RunProjection, Stage};
use tracing::warn;

/// Prints one line per event to stderr and checks that the stream folds
/// into a valid run
#[derive(Default)]
pub struct ConsoleProgress {
    projection: Mutex<Option<RunProjection>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage_title(stage: Stage) -> String {
        format!("Stage {}: {}", stage.number(), stage.display_name())
    }

    /// Render an event as the line printed for it
    pub fn line(event: &ProgressEvent) -> String {
        match event {
            ProgressEvent::StageStarted { stage, models, .. } => format!(
                "{} {} ({} models)",
                "->".cyan(),
                Self::stage_title(*stage).bold(),
                models.len()
            ),
            ProgressEvent::ModelCompleted {
                model,
                success: true,
                latency_ms,
                ..
            } => format!("  {} {} ({} ms)", "v".green(), model, latency_ms),
            ProgressEvent::ModelCompleted {
                model, reason_code, ..
            } => format!(
                "  {} {} ({})",
                "x".red(),
                model,
                reason_code.map(|r| r.as_str()).unwrap_or("failed")
            ),
            ProgressEvent::StageCompleted {
                success: true,
                succeeded,
                failed,
                ..
            } => format!("  {} succeeded, {} failed", succeeded, failed)
                .dimmed()
                .to_string(),
            ProgressEvent::StageCompleted { stage, .. } => format!(
                "  {} {}",
                "x".red(),
                format!("{} failed", Self::stage_title(*stage)).red()
            ),
            ProgressEvent::RunCompleted { stages, .. } => format!(
                "{} {}",
                "v".green(),
                format!("Synthesis complete ({} stages)", stages).green().bold()
            ),
            ProgressEvent::RunFailed {
                reason_code,
                detail,
                ..
            } => format!(
                "{} {} {}",
                "x".red(),
                format!("Run failed [{}]:", reason_code.as_str()).red().bold(),
                detail
            ),
        }
    }

    fn track(&self, event: &ProgressEvent) {
        let mut projection = self.projection.lock().unwrap_or_else(|e| e.into_inner());
        let projection = projection.get_or_insert_with(|| RunProjection::new(event.run_id()));
        if let Err(e) = projection.apply(event) {
            warn!("progress stream out of order: {}", e);
        }
    }

    /// Whether a terminal event has been seen
    pub fn is_finished(&self) -> bool {
        self.projection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(RunProjection::is_finished)
    }
}

impl ProgressNotifier for ConsoleProgress {
    fn emit(&self, event: &ProgressEvent) {
        self.track(event);
        eprintln!("{}", Self::line(event));
        if matches!(event, ProgressEvent::StageCompleted { .. }) {
            eprintln!();
        }
    }
}
