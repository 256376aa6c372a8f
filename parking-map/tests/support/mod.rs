#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parking_map::map::headless::HeadlessSurface;
use parking_map::services::geocoding::Geocoder;
use parking_map::services::nearby::NearbySource;
use parking_map::services::notify::{Notifier, Permission};
use parking_map::{FetchError, GeocodeError, MapEngine, SyncConfig};
use serde_json::json;
use shared_types::{FilterSet, NearbyQuery, NearbyResponse, ViewportCenter};

pub const SAN_JOSE: ViewportCenter = ViewportCenter {
    long: -121.8863,
    lat: 37.3382,
};

pub enum Reply {
    Ok(NearbyResponse, Duration),
    Fail(Duration),
}

#[derive(Default)]
struct Inner {
    queries: Mutex<Vec<NearbyQuery>>,
    replies: Mutex<VecDeque<Reply>>,
    fallback: NearbyResponse,
}

/// Nearby source that records every query and answers from a script.
/// Once the script runs out it keeps answering with the fallback.
#[derive(Clone, Default)]
pub struct CannedSource {
    inner: Arc<Inner>,
}

impl CannedSource {
    pub fn replying(fallback: NearbyResponse) -> Self {
        Self {
            inner: Arc::new(Inner {
                fallback,
                ..Default::default()
            }),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.inner.replies.lock().unwrap().push_back(reply);
    }

    pub fn queries(&self) -> Vec<NearbyQuery> {
        self.inner.queries.lock().unwrap().clone()
    }
}

impl NearbySource for CannedSource {
    async fn fetch_nearby(&self, query: &NearbyQuery) -> Result<NearbyResponse, FetchError> {
        self.inner.queries.lock().unwrap().push(query.clone());
        let reply = self.inner.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ok(response, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Reply::Fail(delay)) => {
                tokio::time::sleep(delay).await;
                Err(FetchError::Status {
                    status: 503,
                    body: "backend unavailable".to_string(),
                })
            }
            None => Ok(self.inner.fallback.clone()),
        }
    }
}

pub struct FixedGeocoder(pub Option<ViewportCenter>);

impl Geocoder for FixedGeocoder {
    async fn geocode(&self, query: &str) -> Result<ViewportCenter, GeocodeError> {
        self.0.ok_or_else(|| GeocodeError::NoResult(query.to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn notify(&self, _title: &str, _body: &str) {}

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub fn config() -> SyncConfig {
    SyncConfig::new("https://tiles.example.com/style.json")
}

pub fn filters(keys: &[&str]) -> FilterSet {
    keys.iter().copied().collect()
}

/// One garage, one meter and one segment of `rule_type`, all named `tag`.
pub fn response(tag: &str, rule_type: &str) -> NearbyResponse {
    serde_json::from_value(json!({
        "pois": [{
            "poi_type": "garage",
            "name": tag,
            "geometry": { "type": "Point", "coordinates": [-121.8860, 37.3380] }
        }, {
            "poi_type": "meter",
            "name": tag,
            "geometry": { "type": "Point", "coordinates": [-121.8870, 37.3390] }
        }],
        "segments": [{
            "segment_id": 1,
            "name": tag,
            "rule_type": rule_type,
            "max_duration_min": 120,
            "geometry": { "type": "LineString", "coordinates": [[-121.8865, 37.3381], [-121.8855, 37.3385]] }
        }]
    }))
    .unwrap()
}

pub fn engine(
    surface: HeadlessSurface,
    source: &CannedSource,
) -> MapEngine<HeadlessSurface, CannedSource> {
    MapEngine::new(
        config(),
        surface,
        source.clone(),
        Arc::new(RecordingNotifier::default()),
    )
    .unwrap()
}

/// Steps the engine until no timer is pending and no fetch is in flight.
pub async fn settle(engine: &mut MapEngine<HeadlessSurface, CannedSource>) {
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            assert!(engine.step().await, "engine stopped while settling");
            if engine.is_settled() {
                break;
            }
        }
    })
    .await
    .expect("engine did not settle");
}

/// Names carried by the features of a source, in order.
pub fn names(surface: &HeadlessSurface, source: &str) -> Vec<String> {
    surface
        .source(source)
        .map(|data| {
            data.iter()
                .filter_map(|f| f.property_str("name").map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
