//! The four fixed pipeline stages

use serde::{Deserialize, Serialize};

/// Stage of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Every requested model answers the query
    InitialResponse,
    /// Each surviving model revises its answer against its peers'
    PeerReview,
    /// Designated model(s) analyze all revised answers
    MetaAnalysis,
    /// One terminal call produces the canonical answer
    FinalSynthesis,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::InitialResponse,
        Stage::PeerReview,
        Stage::MetaAnalysis,
        Stage::FinalSynthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::InitialResponse => "initial_response",
            Stage::PeerReview => "peer_review",
            Stage::MetaAnalysis => "meta_analysis",
            Stage::FinalSynthesis => "final_synthesis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::InitialResponse => "Initial Response",
            Stage::PeerReview => "Peer Review & Revision",
            Stage::MetaAnalysis => "Meta-Analysis",
            Stage::FinalSynthesis => "Final Synthesis",
        }
    }

    /// 1-based position in the pipeline
    pub fn number(&self) -> usize {
        match self {
            Stage::InitialResponse => 1,
            Stage::PeerReview => 2,
            Stage::MetaAnalysis => 3,
            Stage::FinalSynthesis => 4,
        }
    }

    pub fn first() -> Stage {
        Stage::InitialResponse
    }

    /// The stage that follows this one, `None` after the final stage
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::InitialResponse => Some(Stage::PeerReview),
            Stage::PeerReview => Some(Stage::MetaAnalysis),
            Stage::MetaAnalysis => Some(Stage::FinalSynthesis),
            Stage::FinalSynthesis => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_all_stages_in_order() {
        let mut walked = vec![Stage::first()];
        while let Some(next) = walked.last().and_then(|s| s.next()) {
            walked.push(next);
        }
        assert_eq!(walked, Stage::ALL.to_vec());
    }

    #[test]
    fn test_numbers_follow_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.number(), i + 1);
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(Stage::MetaAnalysis).unwrap(),
            "meta_analysis"
        );
        assert_eq!(Stage::PeerReview.as_str(), "peer_review");
    }
}
