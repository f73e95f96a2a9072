//! Analysis result model and section rendering.
//!
//! The backend body is kept as an opaque JSON value. Only
//! `llm_response.{issues, suggestions, optimized_pipeline}` drives the panels.

use serde::Deserialize;
use serde_json::Value;

pub const NO_DATA: &str = "No data available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Issues,
    Suggestions,
    OptimizedPipeline,
}

impl Section {
    pub fn all() -> [Section; 3] {
        [Section::Issues, Section::Suggestions, Section::OptimizedPipeline]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Section::Issues => "issues",
            Section::Suggestions => "suggestions",
            Section::OptimizedPipeline => "optimized_pipeline",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Issues => "Issues",
            Section::Suggestions => "Suggestions",
            Section::OptimizedPipeline => "Optimized Pipeline",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Section::Issues => "🐞",
            Section::Suggestions => "💡",
            Section::OptimizedPipeline => "🛠",
        }
    }
}

/// Static stats the backend computes before asking the model
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PipelineStats {
    #[serde(default)]
    pub job_count: u64,
    #[serde(default)]
    pub long_running_steps: Vec<String>,
    #[serde(default)]
    pub parallel_jobs: bool,
}

impl PipelineStats {
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} job{}",
            self.job_count,
            if self.job_count == 1 { "" } else { "s" }
        )];
        if self.parallel_jobs {
            parts.push("matrix builds".to_string());
        }
        if !self.long_running_steps.is_empty() {
            parts.push(format!(
                "{} long-running step{}",
                self.long_running_steps.len(),
                if self.long_running_steps.len() == 1 { "" } else { "s" }
            ));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    body: Value,
}

impl AnalysisResult {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The model's response object, if present and truthy
    pub fn llm_response(&self) -> Option<&Value> {
        self.body.get("llm_response").filter(|v| is_truthy(v))
    }

    /// Panels are only shown when the backend produced an `llm_response`
    pub fn has_sections(&self) -> bool {
        self.llm_response().is_some()
    }

    pub fn section(&self, section: Section) -> Option<&Value> {
        self.llm_response().and_then(|r| r.get(section.key()))
    }

    pub fn section_text(&self, section: Section) -> String {
        render_section(section, self.section(section))
    }

    pub fn stats(&self) -> Option<PipelineStats> {
        let analysis = self.body.get("analysis")?;
        serde_json::from_value(analysis.clone()).ok()
    }

    /// Message from a backend that answered 2xx but reported its own failure
    pub fn backend_error(&self) -> Option<String> {
        let error = self.body.get("error")?.as_str()?;
        match self.body.get("details").and_then(Value::as_str) {
            Some(details) if !details.is_empty() => Some(format!("{}: {}", error, details)),
            _ => Some(error.to_string()),
        }
    }

    /// Backend-reported failure, else pipeline stats
    pub fn status_line(&self) -> Option<String> {
        if let Some(message) = self.backend_error() {
            return Some(format!("Backend reported: {}", message));
        }
        self.stats().map(|stats| format!("Pipeline: {}", stats.summary()))
    }
}

/// JavaScript-style truthiness, which is what the backend contract was written against.
/// Empty arrays and objects are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display text for one section.
pub fn render_section(section: Section, value: Option<&Value>) -> String {
    match value {
        Some(value) if is_truthy(value) => match (section, value) {
            (Section::OptimizedPipeline, Value::String(text)) => text.clone(),
            _ => pretty_json(value),
        },
        _ => NO_DATA.to_string(),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Top-level keys of the response object, for logging
pub fn response_keys(result: &AnalysisResult) -> Vec<String> {
    result
        .body()
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}
