use std::future::Future;

use reqwest::Client;
use shared_types::{NearbyQuery, NearbyResponse};

use crate::config::SyncConfig;
use crate::error::FetchError;

/// Read-only source of nearby parking data.
pub trait NearbySource: Send + Sync + 'static {
    fn fetch_nearby(
        &self,
        query: &NearbyQuery,
    ) -> impl Future<Output = Result<NearbyResponse, FetchError>> + Send;
}

/// `GET {api_base}/api/parking/nearby` over HTTP.
#[derive(Debug, Clone)]
pub struct NearbyClient {
    client: Client,
    endpoint: String,
}

impl NearbyClient {
    pub fn new(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: nearby_endpoint(&config.api_base),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NearbySource for NearbyClient {
    async fn fetch_nearby(&self, query: &NearbyQuery) -> Result<NearbyResponse, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        let data: NearbyResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            pois = data.pois.len(),
            segments = data.segments.len(),
            "nearby response decoded"
        );
        Ok(data)
    }
}

fn nearby_endpoint(api_base: &str) -> String {
    format!("{}/api/parking/nearby", api_base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_without_double_slash() {
        assert_eq!(
            nearby_endpoint("http://localhost:8000/"),
            "http://localhost:8000/api/parking/nearby"
        );
    }

    #[test]
    fn client_uses_configured_base() {
        let mut config = SyncConfig::new("https://tiles/style.json");
        config.api_base = "https://parking.example.com".to_string();
        let client = NearbyClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://parking.example.com/api/parking/nearby"
        );
    }
}
