//! Throttled HTTP fetching with retry on transient failures

use crate::config::HttpConfig;
use crate::error::{PlayerBaseError, Result, SourceError};
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

/// Blocking HTTP client that pauses after every request and retries
/// connection errors, 429 and 5xx with exponential backoff
pub struct Fetcher {
    client: reqwest::blocking::Client,
    config: HttpConfig,
    requests: usize,
}

impl Fetcher {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PlayerBaseError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            requests: 0,
        })
    }

    /// Number of requests sent so far, retries included
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Fetch a page body as text
    pub fn get_text(&mut self, url: &str) -> std::result::Result<String, SourceError> {
        self.with_retries(url, |fetcher| {
            let response = fetcher.send(url)?;
            response.text().map_err(|e| SourceError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Fetch and decode a JSON body
    pub fn get_json<T: DeserializeOwned>(&mut self, url: &str) -> std::result::Result<T, SourceError> {
        self.with_retries(url, |fetcher| {
            let response = fetcher.send(url)?;
            response
                .json::<T>()
                .map_err(|e| SourceError::MissingStructure(format!("{}: {}", url, e)))
        })
    }

    fn send(&mut self, url: &str) -> std::result::Result<reqwest::blocking::Response, SourceError> {
        self.requests += 1;
        let result = self.client.get(url).send();
        self.throttle();

        let response = result.map_err(|e| SourceError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited(url.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    fn with_retries<T>(
        &mut self,
        url: &str,
        mut attempt_fn: impl FnMut(&mut Self) -> std::result::Result<T, SourceError>,
    ) -> std::result::Result<T, SourceError> {
        let mut attempt = 0;
        loop {
            match attempt_fn(self) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let wait = backoff_delay(self.config.backoff, attempt);
                    log::debug!("{} failed ({}), retrying in {:?}", url, e, wait);
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn throttle(&self) {
        if !self.config.delay.is_zero() {
            thread::sleep(self.config.delay);
        }
    }
}

/// `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}
