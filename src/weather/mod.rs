//! Weather provider client
//!
//! Builds the hourly forecast request for the configured location and
//! fetches it through a [`Transport`], so that retry and caching are
//! decided by the transport stack rather than by the client.

use crate::models::{ForecastSeries, HourlyVariable, Location};
use crate::{BriefError, Result};
use reqwest::Url;
use std::time::Instant;
use tracing::{info, instrument};

pub mod open_meteo;
pub mod transport;

pub use open_meteo::ForecastResponse;
pub use transport::{CachedTransport, HttpTransport, RetryPolicy, Transport};

/// Hourly forecast request for a single location
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub location: Location,
    pub variables: Vec<HourlyVariable>,
    /// Timezone for the returned times (provider default is GMT)
    pub timezone: Option<String>,
}

impl ForecastRequest {
    /// Request every pipeline variable for `location`
    #[must_use]
    pub fn new(location: Location, timezone: Option<String>) -> Self {
        Self {
            location,
            variables: HourlyVariable::ALL.to_vec(),
            timezone,
        }
    }

    /// Full request URL; also the request's cache identity
    pub fn url(&self, base_url: &str) -> Result<Url> {
        let hourly = self
            .variables
            .iter()
            .map(|v| v.api_name())
            .collect::<Vec<_>>()
            .join(",");

        let mut params = vec![
            ("latitude", self.location.latitude.to_string()),
            ("longitude", self.location.longitude.to_string()),
            ("hourly", hourly),
            ("timeformat", "unixtime".to_string()),
        ];
        if let Some(timezone) = &self.timezone {
            params.push(("timezone", timezone.clone()));
        }

        Url::parse_with_params(base_url, &params)
            .map_err(|e| BriefError::config(format!("Invalid api_url '{base_url}': {e}")))
    }
}

/// Forecast client for the `OpenMeteo` forecast endpoint
pub struct ForecastClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> ForecastClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetch the forecast for exactly one location
    #[instrument(skip(self, request), fields(location = %request.location.format_coordinates()))]
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        let start_time = Instant::now();
        let url = self.request_url(request)?;

        let body = self.transport.get(&url).await?;
        let response = open_meteo::parse_single(&body)?;

        info!(
            "Retrieved forecast for {:.4}, {:.4} in {:.3}s",
            response.latitude,
            response.longitude,
            start_time.elapsed().as_secs_f64()
        );
        Ok(response)
    }

    /// Fetch and normalize the forecast into a series
    pub async fn fetch_series(&self, request: &ForecastRequest) -> Result<ForecastSeries> {
        self.fetch(request).await?.into_series()
    }

    fn request_url(&self, request: &ForecastRequest) -> Result<Url> {
        request.url(&self.base_url)
    }
}
