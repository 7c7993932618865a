//! Result aggregation and optional persistence

use chrono::Utc;
use std::sync::Arc;
use synthesis_domain::{PipelineResult, PipelineRun, RunState};
use thiserror::Error;
use tracing::{info, warn};

use crate::ports::result_store::ResultStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("run {0} has not completed")]
    NotCompleted(String),

    #[error("run {0} completed without a final answer")]
    MissingFinalAnswer(String),
}

/// Builds the caller-facing [`PipelineResult`] from a completed run
#[derive(Default, Clone)]
pub struct ResultAggregator {
    store: Option<Arc<dyn ResultStore>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Pure projection of the run; calling it twice gives equal results
    pub fn build(run: &PipelineRun) -> Result<PipelineResult, AggregateError> {
        if run.state() != RunState::Completed {
            return Err(AggregateError::NotCompleted(run.id().to_string()));
        }
        let final_answer = run
            .final_answer()
            .ok_or_else(|| AggregateError::MissingFinalAnswer(run.id().to_string()))?;

        Ok(PipelineResult {
            run_id: run.id().to_string(),
            request: run.request().clone(),
            stages: run.stages().to_vec(),
            final_answer: final_answer.to_string(),
            started_at: run.started_at(),
            finished_at: run.finished_at().unwrap_or_else(Utc::now),
            storage: None,
            persistence_error: None,
        })
    }

    /// Build the result and persist it when the request asked for it.
    ///
    /// A persistence failure is recorded on the result and logged; it
    /// never turns a successful run into an error.
    pub async fn finalize(&self, run: &PipelineRun) -> Result<PipelineResult, AggregateError> {
        let mut result = Self::build(run)?;
        if !run.request().persist() {
            return Ok(result);
        }

        match &self.store {
            Some(store) => match store.store(&result).await {
                Ok(locations) => {
                    info!(
                        run_id = %result.run_id,
                        path = %locations.structured.display(),
                        "Persisted pipeline result"
                    );
                    result.storage = Some(locations);
                }
                Err(e) => {
                    warn!(run_id = %result.run_id, "Failed to persist result: {}", e);
                    result.persistence_error = Some(e.to_string());
                }
            },
            None => {
                warn!(run_id = %result.run_id, "Persistence requested but no result store configured");
                result.persistence_error = Some("no result store configured".to_string());
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::result_store::PersistenceError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use synthesis_domain::{
        ModelResponse, PipelineRequest, ProviderFamily, ProviderIdentity, Query, Stage,
        StageResult, StorageLocations, Transition,
    };

    fn completed_run(persist: bool) -> PipelineRun {
        let request = PipelineRequest::new(Query::try_new("q").unwrap(), ["gpt-4o"])
            .with_persist(persist)
            .with_caller_id("tester");
        let mut run = PipelineRun::with_id("run-1", request);
        run.transition(Transition::Start).unwrap();
        for stage in Stage::ALL {
            let response = ModelResponse::success(
                ProviderIdentity::new("gpt-4o", ProviderFamily::OpenAi),
                stage,
                format!("{} output", stage.as_str()),
                5,
                1,
            );
            run.record_stage(StageResult::from_completions(stage, vec![response]))
                .unwrap();
            run.transition(Transition::StageSucceeded).unwrap();
        }
        run
    }

    #[derive(Default)]
    struct RecordingStore {
        stored: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResultStore for RecordingStore {
        async fn store(&self, result: &PipelineResult) -> Result<StorageLocations, PersistenceError> {
            let stem = result.artifact_key().file_stem();
            self.stored.lock().unwrap().push(stem.clone());
            Ok(StorageLocations {
                structured: PathBuf::from(format!("{}.json", stem)),
                readable: PathBuf::from(format!("{}.md", stem)),
            })
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ResultStore for FailingStore {
        async fn store(&self, _result: &PipelineResult) -> Result<StorageLocations, PersistenceError> {
            Err(PersistenceError::Io {
                path: "/read-only".into(),
                message: "permission denied".into(),
            })
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let run = completed_run(false);
        let a = ResultAggregator::build(&run).unwrap();
        let b = ResultAggregator::build(&run).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.final_answer, "final_synthesis output");
        assert_eq!(a.stages.len(), 4);
    }

    #[test]
    fn test_build_rejects_unfinished_run() {
        let request = PipelineRequest::new(Query::try_new("q").unwrap(), ["gpt-4o"]);
        let run = PipelineRun::with_id("run-2", request);
        assert_eq!(
            ResultAggregator::build(&run),
            Err(AggregateError::NotCompleted("run-2".into()))
        );
    }

    #[tokio::test]
    async fn test_persists_only_when_requested() {
        let store = Arc::new(RecordingStore::default());
        let aggregator = ResultAggregator::new().with_store(store.clone());

        let result = aggregator.finalize(&completed_run(false)).await.unwrap();
        assert!(result.storage.is_none());
        assert!(store.stored.lock().unwrap().is_empty());

        let result = aggregator.finalize(&completed_run(true)).await.unwrap();
        let storage = result.storage.unwrap();
        assert!(storage.structured.to_string_lossy().ends_with("_tester.json"));
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_not_fatal() {
        let aggregator = ResultAggregator::new().with_store(Arc::new(FailingStore));
        let result = aggregator.finalize(&completed_run(true)).await.unwrap();
        assert!(result.storage.is_none());
        assert!(result.persistence_error.unwrap().contains("permission denied"));
        assert_eq!(result.final_answer, "final_synthesis output");
    }

    #[tokio::test]
    async fn test_missing_store_is_reported() {
        let result = ResultAggregator::new()
            .finalize(&completed_run(true))
            .await
            .unwrap();
        assert!(result.persistence_error.is_some());
    }
}
