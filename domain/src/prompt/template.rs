//! Prompt templates for the four pipeline stages

use serde::{Deserialize, Serialize};

/// A system + user prompt pair sent as one provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    fn initial_system() -> &'static str {
        r#"You are a knowledgeable expert answering a question independently.
Provide a thoughtful, well-reasoned response. Be concise but comprehensive,
and support your points with reasoning and examples where appropriate."#
    }

    /// Stage 1: answer the query, with any resolved document context
    pub fn initial(query: &str, documents: &[(String, String)]) -> Prompt {
        let mut user = String::new();
        if !documents.is_empty() {
            user.push_str("Reference documents:\n");
            for (id, text) in documents {
                user.push_str(&format!("\n--- Document {} ---\n{}\n", id, text));
            }
            user.push('\n');
        }
        user.push_str(&format!(
            "Please answer the following question:\n\n{}\n\nProvide a clear, well-structured response.",
            query
        ));
        Prompt::new(Self::initial_system(), user)
    }

    fn revision_system() -> &'static str {
        r#"You are an expert revising your own answer after reading answers from peers.
Critically compare your answer with the others: keep what is correct,
fix what is wrong, and incorporate anything important you missed."#
    }

    /// Stage 2: revise an answer given anonymized peer answers.
    ///
    /// `absent` lists peers that produced no answer; pass an empty slice to
    /// leave them out of the prompt entirely.
    pub fn revision(
        query: &str,
        own_answer: &str,
        peers: &[(String, String)],
        absent: &[String],
    ) -> Prompt {
        let mut user = format!(
            "Original question: {}\n\nYour previous answer:\n{}\n",
            query, own_answer
        );

        if peers.is_empty() {
            user.push_str("\nNo peer answers are available. Review your answer on its own merits.\n");
        } else {
            user.push_str("\nAnswers from peers:\n");
            for (i, (_, content)) in peers.iter().enumerate() {
                user.push_str(&format!("\n--- Peer {} ---\n{}\n", peer_label(i), content));
            }
        }

        if !absent.is_empty() {
            user.push_str(&format!(
                "\n{} peer(s) failed to answer and are not represented above.\n",
                absent.len()
            ));
        }

        user.push_str("\nWrite your revised, complete answer to the original question.");
        Prompt::new(Self::revision_system(), user)
    }

    fn meta_analysis_system() -> &'static str {
        r#"You are an analyst comparing several expert answers to the same question.
Identify where they agree, where they disagree, and which positions are
best supported. Point out errors and gaps."#
    }

    /// Stage 3: analyze all revised answers
    pub fn meta_analysis(query: &str, revised: &[(String, String)]) -> Prompt {
        let mut user = format!("Original question: {}\n\nRevised expert answers:\n", query);
        for (model, content) in revised {
            user.push_str(&format!("\n--- {} ---\n{}\n", model, content));
        }
        user.push_str(
            r#"
Provide:
1. Consensus: points all or most answers agree on
2. Disagreements: where answers differ and which position is better supported
3. Errors and gaps: anything incorrect or missing"#,
        );
        Prompt::new(Self::meta_analysis_system(), user)
    }

    fn synthesis_system() -> &'static str {
        r#"You are a moderator producing the single final answer to a question.
Use the analyses provided to write one coherent, accurate and complete answer."#
    }

    /// Stage 4: produce the canonical answer from the meta-analyses
    pub fn final_synthesis(query: &str, analyses: &[(String, String)]) -> Prompt {
        let mut user = format!("Original question: {}\n\nAnalyses of the expert answers:\n", query);
        for (model, content) in analyses {
            user.push_str(&format!("\n--- Analysis by {} ---\n{}\n", model, content));
        }
        user.push_str("\nWrite the final answer to the original question.");
        Prompt::new(Self::synthesis_system(), user)
    }
}

fn peer_label(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    if index < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, index / 26)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_includes_documents() {
        let docs = vec![("doc-1".to_string(), "Rayleigh scattering".to_string())];
        let prompt = PromptTemplate::initial("Why is the sky blue?", &docs);
        assert!(prompt.user.contains("Document doc-1"));
        assert!(prompt.user.contains("Why is the sky blue?"));
    }

    #[test]
    fn test_revision_anonymizes_peers() {
        let peers = vec![("gpt-4o".to_string(), "peer answer".to_string())];
        let prompt = PromptTemplate::revision("q", "mine", &peers, &[]);
        assert!(prompt.user.contains("Peer A"));
        assert!(!prompt.user.contains("gpt-4o"));
        assert!(!prompt.user.contains("failed to answer"));
    }

    #[test]
    fn test_revision_without_peers_and_annotated_absence() {
        let absent = vec!["claude-sonnet-4".to_string(), "gemini-2.5-pro".to_string()];
        let prompt = PromptTemplate::revision("q", "mine", &[], &absent);
        assert!(prompt.user.contains("mine"));
        assert!(prompt.user.contains("No peer answers"));
        assert!(prompt.user.contains("2 peer(s) failed to answer"));
    }

    #[test]
    fn test_meta_and_final_name_sources() {
        let revised = vec![("gpt-4o".to_string(), "r1".to_string())];
        assert!(PromptTemplate::meta_analysis("q", &revised).user.contains("gpt-4o"));
        let analyses = vec![("claude-opus-4".to_string(), "a1".to_string())];
        assert!(PromptTemplate::final_synthesis("q", &analyses)
            .user
            .contains("Analysis by claude-opus-4"));
    }

    #[test]
    fn test_peer_label() {
        assert_eq!(peer_label(0), "A");
        assert_eq!(peer_label(25), "Z");
        assert_eq!(peer_label(26), "A1");
    }
}
