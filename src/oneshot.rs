//! Non-interactive analysis for the `analyze` subcommand.
//!
//! Runs the same reducer as the TUI so validation and the failure message
//! stay identical between the two front ends.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::{error, warn};

use crate::analysis::{AnalysisResult, Section};
use crate::api::{PipelineAnalyzer, SelectedFile};
use crate::state::{reduce, AnalyzerEvent, AnalyzerState, Effect, ANALYSIS_FAILED_MESSAGE};

/// What a completed exchange prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Backend-reported failure or pipeline stats, for stderr
    pub status: Option<String>,
    /// Section headings and bodies, for stdout. Empty without `llm_response`.
    pub sections: String,
}

impl Report {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let mut sections = String::new();
        if result.has_sections() {
            for section in Section::all() {
                sections.push_str(&format!("{} {}\n", section.icon(), section.title()));
                sections.push_str(&result.section_text(section));
                sections.push_str("\n\n");
            }
        }
        Self {
            status: result.status_line(),
            sections,
        }
    }
}

/// Submit one pipeline and render the outcome.
///
/// A missing source fails before the backend is called. Transport and
/// server errors are logged and surface as the generic failure message.
/// A 2xx body carrying the backend's own `error` is a completed exchange.
pub async fn analyze_once(
    client: &dyn PipelineAnalyzer,
    file: Option<PathBuf>,
    url: Option<String>,
) -> Result<Report> {
    let mut state = AnalyzerState::default();
    let selection = match (file, url) {
        (Some(file), _) => AnalyzerEvent::FileSelected(SelectedFile::from_path(file)),
        (None, url) => AnalyzerEvent::UrlChanged(url.unwrap_or_default()),
    };
    reduce(&mut state, selection);

    let Some(Effect::Submit(input)) = reduce(&mut state, AnalyzerEvent::AnalyzeRequested) else {
        bail!("{}", state.error.unwrap_or_default());
    };

    let outcome = match client.analyze(&input).await {
        Ok(body) => AnalyzerEvent::AnalysisSucceeded(body),
        Err(e) => {
            error!(endpoint = %client.endpoint(), error = %e, "analysis request failed");
            AnalyzerEvent::AnalysisFailed(e.to_string())
        }
    };
    reduce(&mut state, outcome);

    let Some(result) = state.result else {
        bail!("{}", state.error.as_deref().unwrap_or(ANALYSIS_FAILED_MESSAGE));
    };
    if let Some(message) = result.backend_error() {
        warn!(error = %message, "backend reported a processing error");
    }
    Ok(Report::from_result(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NO_DATA;
    use crate::app::tests::FakeAnalyzer;
    use crate::state::MISSING_INPUT_MESSAGE;
    use serde_json::json;

    #[tokio::test]
    async fn test_success_prints_all_sections() {
        let client = FakeAnalyzer::ok(json!({
            "analysis": { "job_count": 1 },
            "llm_response": {
                "issues": ["missing cache step"],
                "optimized_pipeline": "steps:\n  - run: build\n"
            }
        }));
        let report = analyze_once(&*client, None, Some("https://example.com/ci.yaml".into()))
            .await
            .unwrap();

        assert_eq!(client.call_count(), 1);
        assert_eq!(report.status.as_deref(), Some("Pipeline: 1 job"));
        assert!(report.sections.starts_with("🐞 Issues\n[\n  \"missing cache step\"\n]"));
        assert!(report
            .sections
            .contains(&format!("💡 Suggestions\n{}\n", NO_DATA)));
        assert!(report
            .sections
            .contains("🛠 Optimized Pipeline\nsteps:\n  - run: build\n"));
        assert!(!report.sections.contains("\\n"));
    }

    #[tokio::test]
    async fn test_file_source_wins() {
        let client = FakeAnalyzer::ok(json!({ "llm_response": {} }));
        analyze_once(
            &*client,
            Some(PathBuf::from("ci/pipeline.yml")),
            Some("https://example.com/ci.yaml".into()),
        )
        .await
        .unwrap();

        let calls = client.calls.lock().unwrap();
        let file = calls[0].file.as_ref().unwrap();
        assert_eq!(file.name, "pipeline.yml");
        assert!(calls[0].url.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic_error() {
        let client = FakeAnalyzer::failing();
        let err = analyze_once(&*client, None, Some("https://example.com/ci.yaml".into()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_source_never_calls_backend() {
        let client = FakeAnalyzer::ok(json!({}));
        let err = analyze_once(&*client, None, Some(String::new()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MISSING_INPUT_MESSAGE);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_body_completes_without_sections() {
        let client = FakeAnalyzer::ok(json!({
            "error": "Processing failed",
            "details": "YAML parse error"
        }));
        let report = analyze_once(&*client, None, Some("https://example.com/ci.yaml".into()))
            .await
            .unwrap();
        assert_eq!(
            report.status.as_deref(),
            Some("Backend reported: Processing failed: YAML parse error")
        );
        assert!(report.sections.is_empty());
    }
}
