//! External bookmark-count lookup client.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
struct CountResponse {
    counts: HashMap<String, i64>,
}

pub struct BookmarkCountClient {
    client: reqwest::Client,
    app_id: Option<String>,
    max_urls_per_call: usize,
}

impl BookmarkCountClient {
    pub fn new(app_id: Option<String>, timeout: Duration, max_urls_per_call: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is valid");
        Self { client, app_id, max_urls_per_call }
    }

    pub fn max_urls_per_call(&self) -> usize {
        self.max_urls_per_call
    }

    /// Looks up counts for a chunk of URLs. Missing entries in the response
    /// map to `None` ("missing" in the update report), never an error.
    pub async fn fetch_counts(&self, urls: &[String]) -> Result<HashMap<String, Option<i64>>, ServiceError> {
        let mut request = self
            .client
            .get("https://bookmark-count-api.example-provider.invalid/v1/counts")
            .query(&[("url", urls.join(","))]);

        if let Some(app_id) = &self.app_id {
            request = request.query(&[("app_id", app_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited);
        }

        if !response.status().is_success() {
            return Err(ServiceError::DependencyUnavailable(format!(
                "bookmark count API returned {}",
                response.status()
            )));
        }

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

        Ok(urls
            .iter()
            .map(|url| (url.clone(), parsed.counts.get(url).copied()))
            .collect())
    }
}
