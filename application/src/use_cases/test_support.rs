//! Scripted provider client shared by the use case tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use synthesis_domain::{Prompt, PromptTemplate, ProviderFamily, Stage};

use crate::ports::provider_client::{ProviderClient, ProviderError};

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Answer `"<model> <stage>"` immediately
    Answer,
    /// Answer after a delay
    Delay(Duration),
    /// Permanent failure in every stage
    Reject,
    /// Permanent failure in one stage only
    FailAt(Stage),
    /// Transient 503
    Unavailable,
    /// Never respond
    Hang,
    Panic,
}

/// Recognize the stage from the system prompt the templates produce
pub fn stage_of(prompt: &Prompt) -> Stage {
    Stage::ALL
        .into_iter()
        .find(|stage| {
            let template = match stage {
                Stage::InitialResponse => PromptTemplate::initial("", &[]),
                Stage::PeerReview => PromptTemplate::revision("", "", &[], &[]),
                Stage::MetaAnalysis => PromptTemplate::meta_analysis("", &[]),
                Stage::FinalSynthesis => PromptTemplate::final_synthesis("", &[]),
            };
            template.system == prompt.system
        })
        .unwrap_or(Stage::InitialResponse)
}

pub struct MockClient {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<(String, Stage, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockClient {
    pub fn new(behaviors: Vec<(&str, Behavior)>) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors
                .into_iter()
                .map(|(model, behavior)| (model.to_string(), behavior))
                .collect(),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls_in(&self, stage: Stage) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s, _)| *s == stage)
            .map(|(model, _, _)| model.clone())
            .collect()
    }

    pub fn prompts_in(&self, stage: Stage) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s, _)| *s == stage)
            .map(|(_, _, prompt)| prompt.clone())
            .collect()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _, _)| m == model)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for MockClient {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Other
    }

    async fn complete(&self, model: &str, prompt: &Prompt) -> Result<String, ProviderError> {
        let stage = stage_of(prompt);
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), stage, prompt.user.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let answer = Ok(format!("{} {}", model, stage.as_str()));
        let result = match self.behaviors.get(model).copied().unwrap_or(Behavior::Answer) {
            Behavior::Answer => answer,
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                answer
            }
            Behavior::Reject => Err(ProviderError::InvalidRequest("rejected".into())),
            Behavior::FailAt(failing) if failing == stage => {
                Err(ProviderError::InvalidRequest("rejected".into()))
            }
            Behavior::FailAt(_) => answer,
            Behavior::Unavailable => Err(ProviderError::Server {
                status: 503,
                message: "unavailable".into(),
            }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("client bug"),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[test]
fn test_stage_recognition() {
    for stage in Stage::ALL {
        let prompt = match stage {
            Stage::InitialResponse => PromptTemplate::initial("q", &[]),
            Stage::PeerReview => PromptTemplate::revision("q", "a", &[], &[]),
            Stage::MetaAnalysis => PromptTemplate::meta_analysis("q", &[]),
            Stage::FinalSynthesis => PromptTemplate::final_synthesis("q", &[]),
        };
        assert_eq!(stage_of(&prompt), stage);
    }
}
