use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize)]
struct Payload<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    prediction: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Classification label returned by the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction(pub serde_json::Value);

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(label) => write!(f, "{label}"),
            value => write!(f, "{value}"),
        }
    }
}

#[derive(Debug)]
pub enum PredictError {
    Request(reqwest::Error),
    Status(StatusCode, Option<String>),
    Body(serde_json::Error),
}

impl From<reqwest::Error> for PredictError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value)
    }
}

impl From<serde_json::Error> for PredictError {
    fn from(value: serde_json::Error) -> Self {
        Self::Body(value)
    }
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "request failed: {err}"),
            Self::Status(status, Some(message)) => write!(f, "HTTP error {status}: {message}"),
            Self::Status(status, None) => write!(f, "HTTP error {status}"),
            Self::Body(err) => write!(f, "invalid response body: {err}"),
        }
    }
}

impl std::error::Error for PredictError {}

#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn predict(&self, url: &str) -> Result<Prediction, PredictError>;
}

pub struct PredictClient {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl PredictClient {
    pub const fn new(http_client: reqwest::Client, endpoint: Url) -> Self {
        Self { http_client, endpoint }
    }
}

#[async_trait]
impl PredictionApi for PredictClient {
    async fn predict(&self, url: &str) -> Result<Prediction, PredictError> {
        let response =
            self.http_client.post(self.endpoint.clone()).json(&Payload { url }).send().await?;

        let status = response.status();
        log::debug!("response status: {status}");

        let body = response.text().await?;

        if !status.is_success() {
            let message =
                serde_json::from_str::<ErrorResponse>(&body).ok().map(|response| response.error);
            return Err(PredictError::Status(status, message));
        }

        let response = serde_json::from_str::<PredictResponse>(&body)?;
        log::debug!("response data: {body}");

        Ok(Prediction(response.prediction))
    }
}
