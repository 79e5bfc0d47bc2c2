use std::time::Duration;

use async_trait::async_trait;
use polyjudge_core::{Judge0Config, Language, PollingConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::execution::{ExecutionBackend, ExecutionError, ExecutionOutcome, Result};

#[derive(Debug, Serialize)]
struct SubmissionRequest<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: String,
}

/// Client for a Judge0 instance: submit once, then poll with capped
/// exponential backoff until the submission leaves the queue
#[derive(Debug, Clone)]
pub struct Judge0Client {
    config: Judge0Config,
    polling: PollingConfig,
    client: reqwest::Client,
}

impl Judge0Client {
    pub fn new(config: Judge0Config, polling: PollingConfig) -> Self {
        Self {
            config,
            polling,
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(key) = self.config.api_key.as_deref() else {
            return request;
        };
        match self.config.rapidapi_host.as_deref() {
            Some(host) => request
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", host),
            None => request.header("X-Auth-Token", key),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ExecutionError::Api { status, body })
    }

    #[instrument(skip(self, source, stdin), fields(language = %language))]
    pub async fn create_submission(&self, language: Language, source: &str, stdin: &str) -> Result<String> {
        let url = format!("{}/submissions?base64_encoded=false&wait=false", self.base_url());
        let request = SubmissionRequest {
            source_code: source,
            language_id: language.judge0_id(),
            stdin,
        };

        let resp = self.authorize(self.client.post(&url)).json(&request).send().await?;
        let created: SubmissionToken = Self::check(resp).await?.json().await?;

        debug!(token = %created.token, "Submission created");
        Ok(created.token)
    }

    pub async fn fetch_submission(&self, token: &str) -> Result<ExecutionOutcome> {
        let url = format!("{}/submissions/{}?base64_encoded=false", self.base_url(), token);
        let resp = self.authorize(self.client.get(&url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Poll until a terminal status or the attempt budget runs out
    #[instrument(skip(self))]
    pub async fn wait_for_result(&self, token: &str) -> Result<ExecutionOutcome> {
        for attempt in 0..self.polling.max_attempts {
            tokio::time::sleep(Duration::from_millis(self.polling.delay_for(attempt))).await;

            let outcome = self.fetch_submission(token).await?;
            if outcome.is_terminal() {
                debug!(attempt, status = ?outcome.status, "Submission finished");
                return Ok(outcome);
            }
        }

        warn!(
            token,
            attempts = self.polling.max_attempts,
            "Submission still pending, giving up"
        );
        Err(ExecutionError::Timeout {
            token: token.to_string(),
            attempts: self.polling.max_attempts,
        })
    }
}

#[async_trait]
impl ExecutionBackend for Judge0Client {
    async fn submit(&self, language: Language, source: &str, stdin: &str) -> Result<ExecutionOutcome> {
        let token = self.create_submission(language, source, stdin).await?;
        self.wait_for_result(&token).await
    }
}
