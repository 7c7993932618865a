//! Result rendering for stdout

use synthesis_domain::PipelineResult;
use synthesis_infrastructure::{FileOutputFormat, MarkdownRenderer};

pub fn render(result: &PipelineResult, format: FileOutputFormat) -> serde_json::Result<String> {
    Ok(match format {
        FileOutputFormat::Answer => result.final_answer.trim().to_string(),
        FileOutputFormat::Json => serde_json::to_string_pretty(result)?,
        FileOutputFormat::Markdown => MarkdownRenderer::render(result),
    })
}
