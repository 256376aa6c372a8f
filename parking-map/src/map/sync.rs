use shared_types::{FeatureCollection, FilterSet, NearbyQuery, NearbyResponse, ViewportCenter};

use crate::error::FetchError;

/// The two feature collections from one nearby response. Always applied together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncedLayers {
    pub pois: FeatureCollection,
    pub segments: FeatureCollection,
}

impl SyncedLayers {
    pub fn from_response(response: &NearbyResponse) -> Self {
        Self {
            pois: response.pois.iter().map(|p| p.to_feature()).collect(),
            segments: response.segments.iter().map(|s| s.to_feature()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Loading,
    Ready { pois: usize, segments: usize },
    /// The last fetch failed. Previously applied data stays on the map.
    Unavailable { reason: String },
}

/// A fetch that has been issued but not yet completed.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: NearbyQuery,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Apply(SyncedLayers),
    Stale,
    Failed(FetchError),
}

/// Sequencing and status bookkeeping for nearby fetches.
#[derive(Debug)]
pub struct DataSynchronizer {
    radius_meters: u32,
    discard_stale: bool,
    next_seq: u64,
    last_applied: Option<u64>,
    in_flight: usize,
    status: SyncStatus,
}

impl DataSynchronizer {
    pub fn new(radius_meters: u32, discard_stale: bool) -> Self {
        Self {
            radius_meters,
            discard_stale,
            next_seq: 0,
            last_applied: None,
            in_flight: 0,
            status: SyncStatus::Idle,
        }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn begin(&mut self, center: ViewportCenter, filters: &FilterSet) -> FetchTicket {
        self.next_seq += 1;
        self.in_flight += 1;
        self.status = SyncStatus::Loading;
        FetchTicket {
            seq: self.next_seq,
            query: NearbyQuery {
                center,
                radius_meters: self.radius_meters,
                filters: filters.clone(),
            },
        }
    }

    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<NearbyResponse, FetchError>,
    ) -> SyncOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.discard_stale && self.last_applied.is_some_and(|applied| seq < applied) {
            tracing::warn!(
                seq,
                last_applied = ?self.last_applied,
                "discarding stale nearby response"
            );
            return SyncOutcome::Stale;
        }

        match result {
            Ok(response) => {
                let layers = SyncedLayers::from_response(&response);
                self.last_applied = Some(self.last_applied.map_or(seq, |a| a.max(seq)));
                self.status = SyncStatus::Ready {
                    pois: layers.pois.len(),
                    segments: layers.segments.len(),
                };
                SyncOutcome::Apply(layers)
            }
            Err(e) => {
                self.status = SyncStatus::Unavailable {
                    reason: e.to_string(),
                };
                SyncOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(garages: usize) -> NearbyResponse {
        let pois: Vec<_> = (0..garages)
            .map(|i| {
                json!({
                    "poi_type": "garage",
                    "name": format!("Garage {}", i),
                    "geometry": { "type": "Point", "coordinates": [-121.88, 37.33] }
                })
            })
            .collect();
        serde_json::from_value(json!({
            "pois": pois,
            "segments": [{
                "segment_id": 1,
                "rule_type": "free",
                "geometry": { "type": "LineString", "coordinates": [[-121.88, 37.33], [-121.87, 37.33]] }
            }]
        }))
        .unwrap()
    }

    fn center() -> ViewportCenter {
        ViewportCenter::new(-121.8863, 37.3382)
    }

    #[test]
    fn ticket_carries_radius_and_filters() {
        let mut sync = DataSynchronizer::new(800, true);
        let ticket = sync.begin(center(), &FilterSet::default());
        assert_eq!(ticket.seq, 1);
        assert_eq!(ticket.query.radius_meters, 800);
        assert_eq!(ticket.query.filters, FilterSet::default());
        assert_eq!(sync.status(), &SyncStatus::Loading);
    }

    #[test]
    fn success_builds_both_collections() {
        let mut sync = DataSynchronizer::new(800, true);
        let ticket = sync.begin(center(), &FilterSet::default());
        match sync.complete(ticket.seq, Ok(response(2))) {
            SyncOutcome::Apply(layers) => {
                assert_eq!(layers.pois.len(), 2);
                assert_eq!(layers.segments.len(), 1);
            }
            other => panic!("expected apply, got {:?}", other),
        }
        assert_eq!(
            sync.status(),
            &SyncStatus::Ready {
                pois: 2,
                segments: 1
            }
        );
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn older_response_after_newer_is_discarded() {
        let mut sync = DataSynchronizer::new(800, true);
        let old = sync.begin(center(), &FilterSet::default());
        let new = sync.begin(center(), &FilterSet::default());

        assert!(matches!(
            sync.complete(new.seq, Ok(response(1))),
            SyncOutcome::Apply(_)
        ));
        assert!(matches!(
            sync.complete(old.seq, Ok(response(5))),
            SyncOutcome::Stale
        ));
        assert_eq!(
            sync.status(),
            &SyncStatus::Ready {
                pois: 1,
                segments: 1
            }
        );
    }

    #[test]
    fn last_to_complete_wins_when_not_discarding() {
        let mut sync = DataSynchronizer::new(800, false);
        let old = sync.begin(center(), &FilterSet::default());
        let new = sync.begin(center(), &FilterSet::default());

        sync.complete(new.seq, Ok(response(1)));
        match sync.complete(old.seq, Ok(response(5))) {
            SyncOutcome::Apply(layers) => assert_eq!(layers.pois.len(), 5),
            other => panic!("expected apply, got {:?}", other),
        }
    }

    #[test]
    fn failure_is_distinct_from_empty() {
        let mut sync = DataSynchronizer::new(800, true);
        let ticket = sync.begin(center(), &FilterSet::default());
        let outcome = sync.complete(
            ticket.seq,
            Err(FetchError::Status {
                status: 503,
                body: "down".into(),
            }),
        );
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert!(matches!(sync.status(), SyncStatus::Unavailable { .. }));

        let retry = sync.begin(center(), &FilterSet::default());
        sync.complete(retry.seq, Ok(NearbyResponse::default()));
        assert_eq!(
            sync.status(),
            &SyncStatus::Ready {
                pois: 0,
                segments: 0
            }
        );
    }
}
