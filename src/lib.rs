//! `WeatherBrief` - daily weather briefing
//!
//! Fetches the hourly forecast for one location, keeps the daytime
//! window and asks a language model to summarize it.

pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod weather;

// Re-export core types for public API
pub use cache::ResponseCache;
pub use config::BriefConfig;
pub use error::BriefError;
pub use llm::{CompletionProvider, OpenAiClient, Summary, SummaryGenerator};
pub use models::{DaytimeWindow, ForecastSample, ForecastSeries, Location};
pub use pipeline::{LivePipeline, Pipeline};
pub use prompt::{PromptTemplate, RenderedPrompt};
pub use weather::{ForecastClient, ForecastRequest, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, BriefError>;
