use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::models::stats::{CategoryStat, GlobalStat, StatsQuery};
use crate::stats_api::StatsApi;

pub const DEFAULT_ENDPOINT: &str = "https://api.sendgrid.com/v3/";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the SendGrid v3 stats endpoints.
#[derive(Clone)]
pub struct SendGridClient {
    api_key: String,
    base_url: Url,
    http: reqwest::Client,
}

impl fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SendGridClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_base_url(api_key, DEFAULT_ENDPOINT, timeout)
    }

    /// Build a client against a different API root. The root may carry a path
    /// prefix (`/v3/`), which is kept when joining endpoint paths.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            http,
        })
    }

    /// Join `sub_path` onto the base URL and append `query` pairs in order.
    fn request_url(&self, sub_path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            sub_path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        sub_path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.request_url(sub_path, query);
        tracing::debug!(path = %url.path(), "Requesting SendGrid API");

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                path = sub_path,
                body = %body,
                "SendGrid API returned an error body"
            );
            return Err(ApiError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl StatsApi for SendGridClient {
    async fn global_stats(&self, query: &StatsQuery) -> Result<Vec<GlobalStat>, ApiError> {
        query.validate()?;

        let params = [
            ("aggregated_by", query.aggregated_by.as_str()),
            ("end_date", query.end_date.as_str()),
            ("start_date", query.start_date.as_str()),
        ];
        self.get("/stats", &params).await
    }

    async fn category_stats(
        &self,
        query: &StatsQuery,
        categories: &[String],
    ) -> Result<Vec<CategoryStat>, ApiError> {
        query.validate()?;
        if categories.is_empty() {
            return Err(ApiError::Validation("categories must not be empty"));
        }

        let mut params = Vec::with_capacity(categories.len() + 3);
        params.push(("aggregated_by", query.aggregated_by.as_str()));
        params.extend(categories.iter().map(|c| ("categories", c.as_str())));
        params.push(("end_date", query.end_date.as_str()));
        params.push(("start_date", query.start_date.as_str()));

        self.get("/categories/stats", &params).await
    }
}
