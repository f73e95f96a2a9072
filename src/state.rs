//! UI-agnostic analyzer state
//!
//! All transitions go through [`reduce`], so the input exclusivity and the
//! in-flight guard can be checked without a terminal.

use serde_json::Value;

use crate::analysis::AnalysisResult;
use crate::api::{AnalyzeInput, SelectedFile};

pub const MISSING_INPUT_MESSAGE: &str = "Please upload a file or enter a URL.";
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze pipeline. Please check your input.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ReadyToSubmit,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerState {
    pub file: Option<SelectedFile>,
    pub url: String,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    FileSelected(SelectedFile),
    UrlChanged(String),
    AnalyzeRequested,
    AnalysisSucceeded(Value),
    /// Carries the underlying error for the log; the user sees a fixed message
    AnalysisFailed(String),
    AnalysisCancelled,
}

/// Side effects the reducer asks the caller to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit(AnalyzeInput),
}

impl AnalyzerState {
    pub fn has_input(&self) -> bool {
        self.file.is_some() || !self.url.is_empty()
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Submitting
        } else if self.result.is_some() {
            Phase::Success
        } else if self.error.is_some() && self.has_input() {
            Phase::Failed
        } else if self.has_input() {
            Phase::ReadyToSubmit
        } else {
            Phase::Idle
        }
    }

    pub fn input(&self) -> AnalyzeInput {
        AnalyzeInput {
            file: self.file.clone(),
            url: (!self.url.is_empty()).then(|| self.url.clone()),
        }
    }

    fn clear_output(&mut self) {
        self.result = None;
        self.error = None;
    }
}

/// Apply one event. Returns the effect to run, if any.
pub fn reduce(state: &mut AnalyzerState, event: AnalyzerEvent) -> Option<Effect> {
    match event {
        AnalyzerEvent::FileSelected(file) => {
            state.file = Some(file);
            state.url.clear();
            state.clear_output();
            None
        }
        AnalyzerEvent::UrlChanged(url) => {
            state.url = url;
            state.file = None;
            state.clear_output();
            None
        }
        AnalyzerEvent::AnalyzeRequested => {
            if state.loading {
                return None;
            }
            if !state.has_input() {
                state.error = Some(MISSING_INPUT_MESSAGE.to_string());
                return None;
            }
            state.loading = true;
            state.error = None;
            Some(Effect::Submit(state.input()))
        }
        AnalyzerEvent::AnalysisSucceeded(body) => {
            state.loading = false;
            state.error = None;
            state.result = Some(AnalysisResult::new(body));
            None
        }
        AnalyzerEvent::AnalysisFailed(_detail) => {
            state.loading = false;
            state.result = None;
            state.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
            None
        }
        AnalyzerEvent::AnalysisCancelled => {
            state.loading = false;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::from_path(name)
    }

    fn pick(name: &str) -> AnalyzerEvent {
        AnalyzerEvent::FileSelected(file(name))
    }

    fn typed(text: &str) -> AnalyzerEvent {
        AnalyzerEvent::UrlChanged(text.into())
    }

    fn succeeded() -> AnalyzerState {
        let mut state = AnalyzerState::default();
        reduce(&mut state, typed("https://example.com/ci.yaml"));
        reduce(&mut state, AnalyzerEvent::AnalyzeRequested);
        reduce(
            &mut state,
            AnalyzerEvent::AnalysisSucceeded(json!({ "llm_response": {} })),
        );
        state
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(AnalyzerState::default().phase(), Phase::Idle);
    }

    #[test]
    fn test_analyze_without_input_sets_error_and_no_effect() {
        let mut state = AnalyzerState::default();
        let effect = reduce(&mut state, AnalyzerEvent::AnalyzeRequested);
        assert!(effect.is_none());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(MISSING_INPUT_MESSAGE));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_emptied_url_counts_as_no_input() {
        let mut state = AnalyzerState::default();
        reduce(&mut state, typed("h"));
        reduce(&mut state, AnalyzerEvent::UrlChanged(String::new()));
        assert!(reduce(&mut state, AnalyzerEvent::AnalyzeRequested).is_none());
        assert_eq!(state.error.as_deref(), Some(MISSING_INPUT_MESSAGE));
    }

    #[test]
    fn test_file_and_url_are_mutually_exclusive() {
        let mut state = AnalyzerState::default();
        reduce(&mut state, typed("https://example.com/a.yml"));
        reduce(&mut state, pick("pipeline.yaml"));
        assert!(state.url.is_empty());
        assert_eq!(state.file, Some(file("pipeline.yaml")));

        reduce(&mut state, typed("https://example.com/b.yml"));
        assert!(state.file.is_none());
        assert_eq!(state.url, "https://example.com/b.yml");
    }

    #[test]
    fn test_exclusivity_holds_for_any_sequence() {
        let events = [
            AnalyzerEvent::FileSelected(file("a.yml")),
            AnalyzerEvent::UrlChanged("x".into()),
            AnalyzerEvent::UrlChanged("xy".into()),
            AnalyzerEvent::FileSelected(file("b.yaml")),
            AnalyzerEvent::FileSelected(file("c.yaml")),
            AnalyzerEvent::UrlChanged(String::new()),
        ];
        let mut state = AnalyzerState::default();
        for event in events {
            reduce(&mut state, event);
            assert!(!(state.file.is_some() && !state.url.is_empty()));
        }
    }

    #[test]
    fn test_new_input_clears_result_and_error() {
        let mut state = succeeded();
        state.error = Some("stale".into());
        reduce(&mut state, pick("pipeline.yaml"));
        assert!(state.result.is_none());
        assert!(state.error.is_none());

        let mut state = succeeded();
        reduce(&mut state, typed("https://example.com/x.yml"));
        assert!(state.result.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_submit_effect_carries_input() {
        let mut state = AnalyzerState::default();
        reduce(&mut state, pick("pipeline.yaml"));
        let effect = reduce(&mut state, AnalyzerEvent::AnalyzeRequested);
        assert_eq!(
            effect,
            Some(Effect::Submit(AnalyzeInput::from_file(file("pipeline.yaml"))))
        );
        assert!(state.loading);
        assert_eq!(state.phase(), Phase::Submitting);
    }

    #[test]
    fn test_analyze_is_inert_while_in_flight() {
        let mut state = AnalyzerState::default();
        reduce(&mut state, typed("https://example.com/ci.yaml"));
        assert!(reduce(&mut state, AnalyzerEvent::AnalyzeRequested).is_some());
        assert!(reduce(&mut state, AnalyzerEvent::AnalyzeRequested).is_none());
        assert!(state.loading);
    }

    #[test]
    fn test_success_stores_result_and_clears_flag() {
        let state = succeeded();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.result.is_some());
        assert_eq!(state.phase(), Phase::Success);
    }

    #[test]
    fn test_failure_sets_generic_message_and_clears_stale_result() {
        let mut state = succeeded();
        reduce(&mut state, AnalyzerEvent::AnalyzeRequested);
        reduce(
            &mut state,
            AnalyzerEvent::AnalysisFailed("connection refused".into()),
        );
        assert!(!state.loading);
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
        assert_eq!(state.phase(), Phase::Failed);
    }

    #[test]
    fn test_cancel_only_clears_flag() {
        let mut state = AnalyzerState::default();
        reduce(&mut state, typed("https://example.com/ci.yaml"));
        reduce(&mut state, AnalyzerEvent::AnalyzeRequested);
        reduce(&mut state, AnalyzerEvent::AnalysisCancelled);
        assert!(!state.loading);
        assert_eq!(state.phase(), Phase::ReadyToSubmit);
    }
}
