//! Error types and handling for `WeatherBrief`

use thiserror::Error;

/// Main error type for the `WeatherBrief` pipeline
#[derive(Error, Debug)]
pub enum BriefError {
    /// Configuration file missing, malformed or incomplete
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Missing or unusable secrets
    #[error("Credential error: {message}")]
    Credential { message: String },

    /// Transport failures that survived the retry policy
    #[error("Network error: {message}")]
    Network { message: String },

    /// Malformed or unexpected responses from either external API
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// The forecast contained no usable samples
    #[error("Empty forecast: {message}")]
    EmptyForecast { message: String },

    /// Prompt template missing, unreadable or without a forecast placeholder
    #[error("Template error: {message}")]
    Template { message: String },

    /// The language model provider rejected the credential
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The language model provider throttled the request
    #[error("Rate limit error: {message}")]
    RateLimit { message: String },

    /// Response cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BriefError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new credential error
    pub fn credential<S: Into<String>>(message: S) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new empty forecast error
    pub fn empty_forecast<S: Into<String>>(message: S) -> Self {
        Self::EmptyForecast {
            message: message.into(),
        }
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new rate limit error
    pub fn rate_limit<S: Into<String>>(message: S) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BriefError::Config { .. } => {
                "Configuration error. Please check config.json (api_url, latitude, longitude)."
                    .to_string()
            }
            BriefError::Credential { .. } => {
                "Missing credentials. Please set OPENAI_KEY in the environment or in .env."
                    .to_string()
            }
            BriefError::Network { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            BriefError::Provider { message } => {
                format!("An external service returned an unexpected response: {message}")
            }
            BriefError::EmptyForecast { .. } => {
                "The weather service returned no forecast for today's daytime window.".to_string()
            }
            BriefError::Template { message } => {
                format!("Invalid template.txt: {message}")
            }
            BriefError::Authentication { .. } => {
                "The language model provider rejected the API key. Please check OPENAI_KEY."
                    .to_string()
            }
            BriefError::RateLimit { .. } => {
                "The language model provider is throttling requests. Please try again later."
                    .to_string()
            }
            BriefError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            BriefError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// Process exit code for this error category
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            BriefError::Config { .. }
            | BriefError::Credential { .. }
            | BriefError::Template { .. } => 2,
            BriefError::Network { .. } => 3,
            BriefError::Provider { .. } | BriefError::EmptyForecast { .. } => 4,
            BriefError::Authentication { .. } | BriefError::RateLimit { .. } => 5,
            BriefError::Cache { .. } | BriefError::Io { .. } => 1,
        }
    }
}

impl From<anyhow::Error> for BriefError {
    fn from(err: anyhow::Error) -> Self {
        BriefError::cache(err.to_string())
    }
}
