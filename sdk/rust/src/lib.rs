//! HTTP client for the data-ingest service.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Reply to a successful `POST /data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub message: String,
    pub total: usize,
}

/// Client bound to one service base URL.
///
/// Keeps a cookie store, so a successful [`IngestClient::login`] authenticates
/// later [`IngestClient::fetch_table`] calls.
pub struct IngestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl IngestClient {
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach the static API token used by `/data` and `/admin/*`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(res: Response) -> Result<Response, SdkError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(SdkError::Status { status, body })
    }

    /// Replace the stored record set with `records`.
    pub async fn push_records(&self, records: &[Value]) -> Result<IngestSummary, SdkError> {
        let res = self
            .authorized(self.client.post(self.url("/data")))
            .json(records)
            .send()
            .await?;
        Ok(Self::check(res).await?.json().await?)
    }

    /// Log in with a JSON body; the session cookie is kept for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SdkError> {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    /// The rendered table page (requires a prior login).
    pub async fn fetch_table(&self) -> Result<String, SdkError> {
        let res = self.client.get(self.url("/")).send().await?;
        Ok(Self::check(res).await?.text().await?)
    }

    pub async fn status(&self) -> Result<Value, SdkError> {
        let res = self
            .authorized(self.client.get(self.url("/admin/status")))
            .send()
            .await?;
        Ok(Self::check(res).await?.json().await?)
    }

    /// Lift a login block on `identifier`.
    pub async fn unblock(&self, identifier: &str) -> Result<Value, SdkError> {
        let res = self
            .authorized(self.client.post(self.url(&format!("/admin/unblock/{}", identifier))))
            .send()
            .await?;
        Ok(Self::check(res).await?.json().await?)
    }

    pub async fn health(&self) -> Result<bool, SdkError> {
        let res = self.client.get(self.url("/health")).send().await?;
        Ok(res.status().is_success())
    }
}

/// A small demo batch for smoke testing a deployment.
pub fn sample_records() -> Vec<Value> {
    [
        ("Ana", 25, "São Paulo"),
        ("João", 30, "Rio de Janeiro"),
        ("Maria", 28, "Belo Horizonte"),
        ("Pedro", 35, "Curitiba"),
        ("Paula", 22, "Porto Alegre"),
        ("Lucas", 32, "Salvador"),
        ("Carla", 27, "Fortaleza"),
        ("Rafael", 38, "Manaus"),
        ("Tatiane", 29, "Goiânia"),
        ("Felipe", 33, "Belém"),
    ]
    .into_iter()
    .map(|(name, age, city)| json!({ "name": name, "age": age, "city": city }))
    .collect()
}
