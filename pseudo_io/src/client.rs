/**
Blocking client of the pseudonymization service.

| Request                        | Response                          |
|--------------------------------|-----------------------------------|
| `POST {base}tags/` form `text` | `{"success", "tags", "pseudo"}`   |
| `POST {base}` form `text`      | `{"success", "pseudo"}`           |
| `GET {base}stats/`             | `{"success", "stats_info"}`       |
*/
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const URL_VAR: &str = "PSEUDO_REST_API_URL";
pub const TIMEOUT_VAR: &str = "PSEUDO_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// The service could not be reached or answered with an HTTP error.
    #[error("The pseudonymization service is unavailable: {0}")]
    ServiceUnavailable(String),
    /// The service answered, but not with a successful prediction.
    #[error("Invalid response from the pseudonymization service: {0}")]
    InvalidResponse(String),
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

/// Connection settings of the service. The base URL always ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        ClientConfig {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `PSEUDO_REST_API_URL` and the optional `PSEUDO_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> Result<Self, PredictionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`], with the variables given by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PredictionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| PredictionError::Configuration(format!("{} is not set", URL_VAR)))?;
        let config = Self::new(base_url.trim());
        match lookup(TIMEOUT_VAR) {
            None => Ok(config),
            Some(secs) => {
                let secs: u64 = secs.trim().parse().map_err(|_| {
                    PredictionError::Configuration(format!(
                        "{} is not a number: {:?}",
                        TIMEOUT_VAR, secs
                    ))
                })?;
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    fn tags_url(&self) -> String {
        format!("{}tags/", self.base_url)
    }
    fn stats_url(&self) -> String {
        format!("{}stats/", self.base_url)
    }
}

/// What the service returns for one text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Prediction {
    /// The tagged markup, one `<sentence>` per sentence.
    pub tagged_text: String,
    pub pseudo_text: String,
}

/// Anything able to tag a text. The renderer only depends on this trait, so the remote service can
/// be swapped for a local model or a fake.
pub trait Tagger {
    fn tag(&self, text: &str) -> Result<Prediction, PredictionError>;
}

/// Pseudonymization without the tagged markup.
pub trait Pseudonymizer {
    fn pseudonymize(&self, text: &str) -> Result<String, PredictionError>;
}

#[derive(Deserialize)]
struct TagsResponse {
    success: bool,
    tags: Option<String>,
    pseudo: Option<String>,
}

#[derive(Deserialize)]
struct PseudoResponse {
    success: bool,
    pseudo: Option<String>,
}

#[derive(Deserialize)]
struct StatsResponse {
    success: bool,
    stats_info: Option<serde_json::Value>,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, PredictionError> {
    serde_json::from_str(body).map_err(|e| PredictionError::InvalidResponse(e.to_string()))
}

fn missing(field: &str) -> PredictionError {
    PredictionError::InvalidResponse(format!("missing field `{}`", field))
}

fn failure() -> PredictionError {
    PredictionError::InvalidResponse(String::from("the service reported a failure"))
}

/// Body of `POST {base}tags/`.
pub fn parse_tags_response(body: &str) -> Result<Prediction, PredictionError> {
    let response: TagsResponse = decode(body)?;
    if !response.success {
        return Err(failure());
    }
    Ok(Prediction {
        tagged_text: response.tags.ok_or_else(|| missing("tags"))?,
        pseudo_text: response.pseudo.ok_or_else(|| missing("pseudo"))?,
    })
}

/// Body of `POST {base}`.
pub fn parse_pseudo_response(body: &str) -> Result<String, PredictionError> {
    let response: PseudoResponse = decode(body)?;
    if !response.success {
        return Err(failure());
    }
    response.pseudo.ok_or_else(|| missing("pseudo"))
}

/// Body of `GET {base}stats/`.
pub fn parse_stats_response(body: &str) -> Result<serde_json::Value, PredictionError> {
    let response: StatsResponse = decode(body)?;
    if !response.success {
        return Err(failure());
    }
    response.stats_info.ok_or_else(|| missing("stats_info"))
}

#[derive(Debug, Clone)]
pub struct PseudoApiClient {
    config: ClientConfig,
    http: HttpClient,
}

impl PseudoApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, PredictionError> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PredictionError::Configuration(e.to_string()))?;
        info!("Using the pseudonymization service at {}", config.base_url());
        Ok(PseudoApiClient { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post_text(&self, url: &str, text: &str) -> Result<String, PredictionError> {
        debug!("POST {} ({} chars)", url, text.chars().count());
        let response = self
            .http
            .post(url)
            .form(&[("text", text)])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PredictionError::ServiceUnavailable(e.to_string()))?;
        response
            .text()
            .map_err(|e| PredictionError::ServiceUnavailable(e.to_string()))
    }

    /// Usage statistics of the service, as returned.
    pub fn stats(&self) -> Result<serde_json::Value, PredictionError> {
        let url = self.config.stats_url();
        debug!("GET {}", url);
        let body = self
            .http
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| PredictionError::ServiceUnavailable(e.to_string()))?;
        parse_stats_response(&body)
    }
}

impl Tagger for PseudoApiClient {
    fn tag(&self, text: &str) -> Result<Prediction, PredictionError> {
        let body = self.post_text(&self.config.tags_url(), text)?;
        parse_tags_response(&body)
    }
}

impl Pseudonymizer for PseudoApiClient {
    fn pseudonymize(&self, text: &str) -> Result<String, PredictionError> {
        let body = self.post_text(self.config.base_url(), text)?;
        parse_pseudo_response(&body)
    }
}
