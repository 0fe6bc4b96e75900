//! The single-shot briefing run: fetch, normalize, render, summarize

use crate::Result;
use crate::cache::ResponseCache;
use crate::config::BriefConfig;
use crate::llm::{CompletionProvider, OpenAiClient, Summary, SummaryGenerator};
use crate::models::{DaytimeWindow, Location};
use crate::prompt::{PromptTemplate, TEMPLATE_FILE_NAME};
use crate::weather::{
    CachedTransport, ForecastClient, ForecastRequest, HttpTransport, RetryPolicy, Transport,
};
use std::path::Path;
use std::time::Duration;
use tracing::{Instrument, info, info_span, instrument};

/// Per-attempt timeout of weather provider requests
const WEATHER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline wired to the live weather provider and completion API
pub type LivePipeline = Pipeline<CachedTransport<HttpTransport>, OpenAiClient>;

pub struct Pipeline<T, P> {
    forecast: ForecastClient<T>,
    request: ForecastRequest,
    template: PromptTemplate,
    summarizer: SummaryGenerator<P>,
}

impl<T: Transport, P: CompletionProvider> Pipeline<T, P> {
    pub fn new(
        forecast: ForecastClient<T>,
        request: ForecastRequest,
        template: PromptTemplate,
        summarizer: SummaryGenerator<P>,
    ) -> Self {
        Self {
            forecast,
            request,
            template,
            summarizer,
        }
    }

    /// Run every stage once. The first failing stage ends the run.
    #[instrument(name = "pipeline", skip(self), fields(location = %self.request.location.format_coordinates()))]
    pub async fn run(&self) -> Result<Summary> {
        let series = self
            .forecast
            .fetch_series(&self.request)
            .instrument(info_span!("fetch"))
            .await?;

        let table = {
            let _span = info_span!("normalize", samples = series.len()).entered();
            let window = DaytimeWindow::select(&series)?;
            info!("Selected {} daytime samples", window.len());
            window.to_table()
        };

        let prompt = {
            let _span = info_span!("render").entered();
            self.template.render(&table)
        };

        self.summarizer
            .summarize(&prompt)
            .instrument(info_span!("summarize"))
            .await
    }
}

impl LivePipeline {
    /// Build the live pipeline from loaded configuration.
    ///
    /// The template is loaded here, so a broken template fails the run
    /// before any network request is made.
    pub fn from_config(config: &BriefConfig, working_dir: &Path) -> Result<Self> {
        let template = PromptTemplate::load(&working_dir.join(TEMPLATE_FILE_NAME))?;

        let cache_dir = config.cache.resolve_location(working_dir);
        let cache = ResponseCache::open(&cache_dir)?;
        info!("Using response cache at {}", cache_dir.display());

        let http = HttpTransport::new(RetryPolicy::from(&config.retry), WEATHER_REQUEST_TIMEOUT)?;
        let transport = CachedTransport::new(http, cache, config.cache.ttl());
        let forecast = ForecastClient::new(transport, config.api_url.clone());

        let request = ForecastRequest::new(
            Location::new(config.latitude, config.longitude),
            config.timezone.clone(),
        );
        let summarizer = SummaryGenerator::new(OpenAiClient::new(&config.llm, &config.api_key)?);

        Ok(Self::new(forecast, request, template, summarizer))
    }
}
