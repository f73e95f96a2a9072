pub mod analysis;
pub mod api;
pub mod app;
pub mod config;
pub mod files;
pub mod handler;
pub mod logging;
pub mod oneshot;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use analysis::{AnalysisResult, Section};
pub use api::{AnalyzeInput, AnalyzerClient, ApiError, PipelineAnalyzer, SelectedFile};
pub use config::{Config, ConfigError};
pub use state::{reduce, AnalyzerEvent, AnalyzerState, Effect, Phase};
