//! Delegated answer generation.
//!
//! A [`Delegate`] is one external text-generation endpoint. The
//! [`DelegateChain`] tries its delegates strictly in order and returns the
//! first answer; endpoint failures are logged and swallowed here, so callers
//! only ever see a reply or [`DelegateError::Exhausted`].

pub mod chat;
pub mod completion;

pub use chat::ChatDelegate;
pub use completion::CompletionDelegate;

use crate::config::{DelegateConfig, Protocol};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from a single delegate, or from the chain as a whole.
#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("{endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("cannot connect to {endpoint} at {url}")]
    Connect { endpoint: String, url: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} sent a malformed response: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("all {attempts} delegate endpoint(s) failed")]
    Exhausted { attempts: usize },
}

/// One external text-generation service.
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Name used in logs and answer attribution.
    fn name(&self) -> &str;

    /// Ask the service to answer from the given analysis context.
    async fn try_generate(&self, context: &str) -> Result<String, DelegateError>;
}

/// A successful answer and the delegate that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateReply {
    pub endpoint: String,
    pub text: String,
}

/// Ordered fallback list of delegates.
#[derive(Default)]
pub struct DelegateChain {
    delegates: Vec<Box<dyn Delegate>>,
}

impl DelegateChain {
    /// Create a chain that tries `delegates` in the given order.
    pub fn new(delegates: Vec<Box<dyn Delegate>>) -> Self {
        Self { delegates }
    }

    /// Build the chain described by the configuration, preserving order.
    pub fn from_config(configs: &[DelegateConfig]) -> Result<Self, DelegateError> {
        let mut delegates: Vec<Box<dyn Delegate>> = Vec::with_capacity(configs.len());

        for config in configs {
            let timeout = Duration::from_secs(config.timeout_seconds);
            let delegate: Box<dyn Delegate> = match config.protocol {
                Protocol::Completion => Box::new(CompletionDelegate::new(
                    &config.name,
                    &config.url,
                    &config.model,
                    timeout,
                )?),
                Protocol::Chat => Box::new(ChatDelegate::new(
                    &config.name,
                    &config.url,
                    &config.model,
                    timeout,
                )?),
            };
            debug!(
                "Configured delegate {} ({:?}) at {}",
                config.name, config.protocol, config.url
            );
            delegates.push(delegate);
        }

        Ok(Self::new(delegates))
    }

    /// Number of configured delegates.
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    /// Delegate names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.delegates.iter().map(|d| d.name()).collect()
    }

    /// Try each delegate once, in order, until one answers.
    pub async fn generate(&self, context: &str) -> Result<DelegateReply, DelegateError> {
        for delegate in &self.delegates {
            info!("Trying {} endpoint...", delegate.name());

            match delegate.try_generate(context).await {
                Ok(text) => {
                    info!("{} answered ({} chars)", delegate.name(), text.len());
                    return Ok(DelegateReply {
                        endpoint: delegate.name().to_string(),
                        text,
                    });
                }
                Err(e) => {
                    warn!("{} failed: {}", delegate.name(), e);
                }
            }
        }

        Err(DelegateError::Exhausted {
            attempts: self.delegates.len(),
        })
    }
}

/// HTTP plumbing shared by both protocol variants.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub name: String,
    pub url: String,
    pub model: String,
    pub timeout: Duration,
    client: reqwest::Client,
}

impl Endpoint {
    /// `base_url` is the server root; `path` is the protocol's route on it.
    /// A URL that already ends with the route is used as is.
    pub fn new(
        name: &str,
        base_url: &str,
        path: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, DelegateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DelegateError::Client)?;

        let base_url = base_url.trim_end_matches('/');
        let url = if base_url.ends_with(path) {
            base_url.to_string()
        } else {
            format!("{}{}", base_url, path)
        };

        Ok(Self {
            name: name.to_string(),
            url,
            model: model.to_string(),
            timeout,
            client,
        })
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<B, R>(&self, body: &B) -> Result<R, DelegateError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!("POST {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DelegateError::Status {
                endpoint: self.name.clone(),
                status,
                body,
            });
        }

        response.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                self.malformed(e.to_string())
            }
        })
    }

    pub fn malformed(&self, reason: impl Into<String>) -> DelegateError {
        DelegateError::Malformed {
            endpoint: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn classify(&self, e: reqwest::Error) -> DelegateError {
        if e.is_timeout() {
            DelegateError::Timeout {
                endpoint: self.name.clone(),
                timeout: self.timeout,
            }
        } else if e.is_connect() {
            DelegateError::Connect {
                endpoint: self.name.clone(),
                url: self.url.clone(),
            }
        } else {
            DelegateError::Request {
                endpoint: self.name.clone(),
                source: e,
            }
        }
    }
}

/// Treat a missing or blank generated text as a malformed reply.
pub(crate) fn non_blank(endpoint: &Endpoint, text: Option<String>) -> Result<String, DelegateError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(endpoint.malformed("generated text is empty")),
        None => Err(endpoint.malformed("generated text is missing")),
    }
}
