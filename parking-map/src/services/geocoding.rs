use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use shared_types::ViewportCenter;

use crate::config::SyncConfig;
use crate::error::GeocodeError;

const MAPTILER_BASE: &str = "https://api.maptiler.com";

/// Free text to a coordinate pair.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<ViewportCenter, GeocodeError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<GeocodedPlace>,
}

#[derive(Debug, Deserialize)]
struct GeocodedPlace {
    #[serde(default)]
    center: Option<[f64; 2]>,
}

/// MapTiler forward geocoding. Works without a key, it just never finds anything.
#[derive(Debug, Clone)]
pub struct MapTilerGeocoder {
    client: Client,
    key: Option<String>,
}

impl MapTilerGeocoder {
    pub fn new(config: &SyncConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            key: config.maptiler_key.clone(),
        })
    }

    fn url_for(&self, query: &str, key: &str) -> String {
        format!(
            "{}/geocoding/{}.json?key={}",
            MAPTILER_BASE,
            urlencoding::encode(query),
            key
        )
    }
}

impl Geocoder for MapTilerGeocoder {
    async fn geocode(&self, query: &str) -> Result<ViewportCenter, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        let key = self.key.as_deref().ok_or(GeocodeError::MissingKey)?;

        let response = self.client.get(self.url_for(query, key)).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(GeocodeError::Status { status, body });
        }

        let data: GeocodingResponse = response.json().await?;
        first_center(&data).ok_or_else(|| GeocodeError::NoResult(query.to_string()))
    }
}

fn first_center(data: &GeocodingResponse) -> Option<ViewportCenter> {
    data.features
        .first()
        .and_then(|place| place.center)
        .map(ViewportCenter::from_lng_lat)
}
