//! Human-readable Markdown rendering of a pipeline result

use synthesis_domain::{ModelResponse, PipelineResult, ResponseOutcome, StageResult};

/// Renders a [`PipelineResult`] as a Markdown report
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Format the complete result
    pub fn render(result: &PipelineResult) -> String {
        let mut output = String::new();

        output.push_str("# Synthesis Report\n\n");
        output.push_str(&format!("**Question:** {}\n\n", result.request.query().content()));
        output.push_str(&format!("**Models:** {}\n\n", result.request.models().join(", ")));
        output.push_str(&format!(
            "**Run:** `{}` ({} to {})\n",
            result.run_id,
            result.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            result.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ));
        if let Some(caller) = result.request.caller_id() {
            output.push_str(&format!("\n**Caller:** {}\n", caller));
        }

        output.push_str("\n## Final Answer\n\n");
        output.push_str(result.final_answer.trim());
        output.push('\n');

        for stage in &result.stages {
            output.push_str(&Self::stage_section(stage));
        }

        output
    }

    fn stage_section(stage: &StageResult) -> String {
        let mut section = format!(
            "\n## Stage {}: {}\n",
            stage.stage.number(),
            stage.stage.display_name()
        );
        for response in &stage.responses {
            section.push_str(&Self::response(response));
        }
        if !stage.failures.is_empty() {
            section.push_str("\n**Failed:**\n\n");
            for failure in &stage.failures {
                section.push_str(&Self::failure_line(failure));
            }
        }
        section
    }

    fn response(response: &ModelResponse) -> String {
        format!(
            "\n### {}\n\n{}\n",
            response.provider,
            response.content().unwrap_or_default().trim()
        )
    }

    fn failure_line(response: &ModelResponse) -> String {
        match &response.outcome {
            ResponseOutcome::Failure { reason, detail } => format!(
                "- {} ({}): {}\n",
                response.provider,
                reason.as_str(),
                detail
            ),
            ResponseOutcome::Success { .. } => String::new(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use synthesis_domain::{
        FailureReason, PipelineRequest, ProviderFamily, ProviderIdentity, Query, Stage,
    };

    pub(crate) fn sample_result(caller: Option<&str>) -> PipelineResult {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 5, 3).unwrap();
        let mut request = PipelineRequest::new(
            Query::try_new("Why is the sky blue?").unwrap(),
            ["gpt-4o", "claude-sonnet-4", "gemini-2.5-pro"],
        )
        .with_persist(true);
        if let Some(caller) = caller {
            request = request.with_caller_id(caller);
        }

        let ok = |model: &str, family, stage| {
            ModelResponse::success(
                ProviderIdentity::new(model, family),
                stage,
                format!("{} says Rayleigh", model),
                120,
                1,
            )
        };
        let mut stage1 = vec![
            ok("gpt-4o", ProviderFamily::OpenAi, Stage::InitialResponse),
            ok("claude-sonnet-4", ProviderFamily::Anthropic, Stage::InitialResponse),
            ModelResponse::failure(
                ProviderIdentity::new("gemini-2.5-pro", ProviderFamily::Google),
                Stage::InitialResponse,
                FailureReason::Timeout,
                "stage deadline elapsed",
                0,
                1,
            ),
        ];
        for r in &mut stage1 {
            r.completed_at = at;
        }
        let mut stage4 = vec![ok("claude-sonnet-4", ProviderFamily::Anthropic, Stage::FinalSynthesis)];
        stage4[0].completed_at = at;

        PipelineResult {
            run_id: "run-1".into(),
            request,
            stages: vec![
                StageResult::from_completions(Stage::InitialResponse, stage1),
                StageResult::from_completions(Stage::FinalSynthesis, stage4),
            ],
            final_answer: "Rayleigh scattering.".into(),
            started_at: at,
            finished_at: at,
            storage: None,
            persistence_error: None,
        }
    }

    #[test]
    fn test_render_sections() {
        let md = MarkdownRenderer::render(&sample_result(Some("team-a")));
        assert!(md.starts_with("# Synthesis Report"));
        assert!(md.contains("**Question:** Why is the sky blue?"));
        assert!(md.contains("## Final Answer\n\nRayleigh scattering."));
        assert!(md.contains("## Stage 1: Initial Response"));
        assert!(md.contains("### gpt-4o"));
        assert!(md.contains("- gemini-2.5-pro"));
        assert!(md.contains("(timeout): stage deadline elapsed"));
        assert!(md.contains("**Caller:** team-a"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let result = sample_result(None);
        assert_eq!(MarkdownRenderer::render(&result), MarkdownRenderer::render(&result));
    }
}
