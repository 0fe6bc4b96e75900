//! Summary generation through a text completion provider

use crate::prompt::RenderedPrompt;
use crate::{BriefError, Result};
use async_trait::async_trait;
use tracing::{info, instrument};

pub mod openai;

pub use openai::OpenAiClient;

/// Trait implemented by concrete completion providers.
///
/// Returns every candidate text the provider generated for `prompt`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<String>>;
}

/// Natural-language summary of the daytime forecast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary(String);

impl Summary {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sends one prompt and expects exactly one completion back
pub struct SummaryGenerator<P> {
    provider: P,
}

impl<P: CompletionProvider> SummaryGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, fields(prompt_chars = prompt.as_str().len()))]
    pub async fn summarize(&self, prompt: &RenderedPrompt) -> Result<Summary> {
        let mut candidates = self.provider.generate(prompt.as_str()).await?;

        match candidates.len() {
            0 => Err(BriefError::provider(
                "Language model returned no generations",
            )),
            1 => {
                let text = candidates.remove(0);
                info!("Received summary of {} characters", text.len());
                Ok(Summary(text))
            }
            n => Err(BriefError::provider(format!(
                "Language model returned {n} generations for a single prompt"
            ))),
        }
    }
}
