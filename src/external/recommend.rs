use async_trait::async_trait;
use reqwest::header::ACCEPT;

use crate::{
    api::RecommendAPI,
    entities::{Recommendation, RecommendationRequest},
    error::{upstream_error, Error},
};

/// Client for the course recommendation backend.
#[derive(Clone, Debug)]
pub struct RecommendClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecommendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/recommend", self.base_url)
    }
}

#[async_trait]
impl RecommendAPI for RecommendClient {
    #[tracing::instrument(skip(self, request))]
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation, Error> {
        let res = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "recommendation rejected");
            return Err(upstream_error(body));
        }

        let data: Recommendation = serde_json::from_str(&body)?;

        Ok(data)
    }
}
