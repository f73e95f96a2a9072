use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::analysis;
use crate::api::{ApiError, PipelineAnalyzer, SelectedFile};
use crate::files::{self, DirEntry, EntryKind};
use crate::state::{reduce, AnalyzerEvent, AnalyzerState, Effect};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Files,
    Url,
    Analyze,
    Results,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Files => Focus::Url,
            Focus::Url => Focus::Analyze,
            Focus::Analyze => Focus::Results,
            Focus::Results => Focus::Files,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Files => Focus::Results,
            Focus::Url => Focus::Files,
            Focus::Analyze => Focus::Url,
            Focus::Results => Focus::Analyze,
        }
    }
}

pub type AnalysisTask = JoinHandle<Result<Value, ApiError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub analyzer: AnalyzerState,

    // Backend
    pub client: Arc<dyn PipelineAnalyzer>,
    pub analysis_task: Option<AnalysisTask>,

    // File picker
    pub current_dir: PathBuf,
    pub dir_entries: Vec<DirEntry>,
    pub file_state: ListState,
    pub picker_error: Option<String>,

    // URL input
    pub url_cursor: usize, // in chars, not bytes

    // Results pane
    pub results_scroll: u16,
    pub results_height: u16,
    pub results_width: u16,
    pub results_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: Arc<dyn PipelineAnalyzer>, start_dir: PathBuf) -> Self {
        let mut app = Self {
            should_quit: false,
            focus: Focus::Files,
            analyzer: AnalyzerState::default(),

            client,
            analysis_task: None,

            current_dir: start_dir.clone(),
            dir_entries: Vec::new(),
            file_state: ListState::default(),
            picker_error: None,

            url_cursor: 0,

            results_scroll: 0,
            results_height: 0,
            results_width: 0,
            results_area: None,

            animation_frame: 0,
        };
        app.change_dir(start_dir);
        app
    }

    /// Run an event through the reducer and start any requested work
    pub fn dispatch(&mut self, event: AnalyzerEvent) {
        let resets_output = matches!(
            event,
            AnalyzerEvent::FileSelected(_) | AnalyzerEvent::UrlChanged(_)
        );
        if let Some(effect) = reduce(&mut self.analyzer, event) {
            self.run_effect(effect);
        }
        if resets_output {
            self.results_scroll = 0;
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Submit(input) => {
                info!(endpoint = %self.client.endpoint(), "starting analysis");
                self.animation_frame = 0;
                self.results_scroll = 0;
                let client = Arc::clone(&self.client);
                let task = tokio::spawn(async move { client.analyze(&input).await });
                self.analysis_task = Some(task);
            }
        }
    }

    pub fn request_analysis(&mut self) {
        self.dispatch(AnalyzerEvent::AnalyzeRequested);
    }

    /// Collect the in-flight request if it has finished
    pub async fn poll_analysis(&mut self) {
        let finished = self
            .analysis_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.analysis_task.take() {
            let event = match task.await {
                Ok(Ok(body)) => {
                    let result = analysis::AnalysisResult::new(body.clone());
                    debug!(keys = ?analysis::response_keys(&result), "analysis complete");
                    if let Some(message) = result.backend_error() {
                        warn!(error = %message, "backend reported a processing error");
                    }
                    AnalyzerEvent::AnalysisSucceeded(body)
                }
                Ok(Err(e)) => {
                    error!(error = %e, "analysis request failed");
                    AnalyzerEvent::AnalysisFailed(e.to_string())
                }
                Err(e) => {
                    error!(error = %e, "analysis task did not complete");
                    AnalyzerEvent::AnalysisFailed(e.to_string())
                }
            };
            self.dispatch(event);
        }
    }

    /// Abort the in-flight request, e.g. on quit
    pub fn cancel_analysis(&mut self) {
        if let Some(task) = self.analysis_task.take() {
            task.abort();
            info!("analysis cancelled");
            self.dispatch(AnalyzerEvent::AnalysisCancelled);
        }
    }

    pub fn quit(&mut self) {
        self.cancel_analysis();
        self.should_quit = true;
    }

    // File picker
    pub fn change_dir(&mut self, dir: PathBuf) {
        match files::list_dir(&dir) {
            Ok(entries) => {
                self.dir_entries = entries;
                self.current_dir = dir;
                self.picker_error = None;
                // Skip the parent link when there is something to pick
                let skip_parent = self.dir_entries.len() > 1
                    && self.dir_entries[0].kind == EntryKind::Parent;
                let first = usize::from(skip_parent);
                self.file_state
                    .select((!self.dir_entries.is_empty()).then_some(first));
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "could not list directory");
                self.picker_error = Some(format!("{:#}", e));
            }
        }
    }

    pub fn selected_entry(&self) -> Option<&DirEntry> {
        self.file_state.selected().and_then(|i| self.dir_entries.get(i))
    }

    pub fn picker_down(&mut self) {
        let len = self.dir_entries.len();
        if len > 0 {
            let i = self.file_state.selected().unwrap_or(0);
            self.file_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn picker_up(&mut self) {
        let i = self.file_state.selected().unwrap_or(0);
        self.file_state.select(Some(i.saturating_sub(1)));
    }

    pub fn picker_first(&mut self) {
        if !self.dir_entries.is_empty() {
            self.file_state.select(Some(0));
        }
    }

    pub fn picker_last(&mut self) {
        let len = self.dir_entries.len();
        if len > 0 {
            self.file_state.select(Some(len - 1));
        }
    }

    pub fn picker_enter(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        match entry.kind {
            EntryKind::Parent | EntryKind::Directory => self.change_dir(entry.path),
            EntryKind::Pipeline => self.select_file(&entry.path),
        }
    }

    pub fn picker_parent(&mut self) {
        if let Some(parent) = self.current_dir.parent().map(Path::to_path_buf) {
            self.change_dir(parent);
        }
    }

    pub fn select_file(&mut self, path: &Path) {
        self.url_cursor = 0;
        self.dispatch(AnalyzerEvent::FileSelected(SelectedFile::from_path(path)));
    }

    // URL input editing. Every edit goes through the reducer.
    pub fn set_url(&mut self, url: String) {
        self.url_cursor = self.url_cursor.min(url.chars().count());
        self.dispatch(AnalyzerEvent::UrlChanged(url));
    }

    pub fn url_insert(&mut self, c: char) {
        let mut url = self.analyzer.url.clone();
        let byte_pos = char_to_byte_index(&url, self.url_cursor);
        url.insert(byte_pos, c);
        self.url_cursor += 1;
        self.set_url(url);
    }

    pub fn url_insert_str(&mut self, text: &str) {
        let cleaned: String = text.chars().filter(|c| !c.is_control()).collect();
        if cleaned.is_empty() {
            return;
        }
        let mut url = self.analyzer.url.clone();
        let byte_pos = char_to_byte_index(&url, self.url_cursor);
        url.insert_str(byte_pos, &cleaned);
        self.url_cursor += cleaned.chars().count();
        self.set_url(url);
    }

    pub fn url_backspace(&mut self) {
        if self.url_cursor > 0 {
            let mut url = self.analyzer.url.clone();
            self.url_cursor -= 1;
            let byte_pos = char_to_byte_index(&url, self.url_cursor);
            url.remove(byte_pos);
            self.set_url(url);
        }
    }

    pub fn url_delete(&mut self) {
        let char_count = self.analyzer.url.chars().count();
        if self.url_cursor < char_count {
            let mut url = self.analyzer.url.clone();
            let byte_pos = char_to_byte_index(&url, self.url_cursor);
            url.remove(byte_pos);
            self.set_url(url);
        }
    }

    pub fn url_cursor_left(&mut self) {
        self.url_cursor = self.url_cursor.saturating_sub(1);
    }

    pub fn url_cursor_right(&mut self) {
        let char_count = self.analyzer.url.chars().count();
        self.url_cursor = (self.url_cursor + 1).min(char_count);
    }

    pub fn url_cursor_home(&mut self) {
        self.url_cursor = 0;
    }

    pub fn url_cursor_end(&mut self) {
        self.url_cursor = self.analyzer.url.chars().count();
    }

    // Results scrolling
    /// Rows the results paragraph occupies once wrapped to the pane width
    pub fn total_result_lines(&self) -> u16 {
        let Some(result) = self.analyzer.result.as_ref().filter(|r| r.has_sections()) else {
            return 0;
        };
        // Before the first draw the pane width is unknown
        let width = if self.results_width > 0 {
            self.results_width
        } else {
            80
        };
        let rows = ui::results_paragraph(result).line_count(width);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    fn max_results_scroll(&self) -> u16 {
        self.total_result_lines().saturating_sub(self.results_height)
    }

    pub fn scroll_down(&mut self) {
        if self.results_scroll < self.max_results_scroll() {
            self.results_scroll = self.results_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.results_scroll = self.results_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = (self.results_height / 2).max(1);
        self.results_scroll = self
            .results_scroll
            .saturating_add(half_page)
            .min(self.max_results_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = (self.results_height / 2).max(1);
        self.results_scroll = self.results_scroll.saturating_sub(half_page);
    }

    pub fn scroll_top(&mut self) {
        self.results_scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.results_scroll = self.max_results_scroll();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.analyzer.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Title helpers
    pub fn analyze_label(&self) -> String {
        if self.analyzer.loading {
            format!("Analyzing{}", ".".repeat(self.animation_frame as usize + 1))
        } else {
            "Analyze Pipeline".to_string()
        }
    }

    pub fn file_title(&self) -> String {
        match &self.analyzer.file {
            Some(file) => format!(" {} ", file.name),
            None => " Upload a YAML file ".to_string(),
        }
    }

    /// Backend-reported failure or pipeline stats, shown under the error line
    pub fn status_line(&self) -> Option<String> {
        self.analyzer.result.as_ref().and_then(|r| r.status_line())
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
