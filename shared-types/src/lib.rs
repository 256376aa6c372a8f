use serde::{Deserialize, Serialize};

pub mod filters;
pub mod geojson;
pub mod parking;

pub use filters::{FilterKey, FilterSet};
pub use geojson::{Feature, FeatureCollection, Geometry, Position, Properties};
pub use parking::{
    NearbyQuery, NearbyResponse, PoiRecord, PoiType, RuleType, SegmentId, SegmentRecord,
};

/// Logical center of the map, in WGS84 degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ViewportCenter {
    pub long: f64,
    pub lat: f64,
}

impl ViewportCenter {
    pub fn new(long: f64, lat: f64) -> Self {
        Self { long, lat }
    }

    /// `[lng, lat]`, the order GeoJSON and geocoders use.
    pub fn from_lng_lat([long, lat]: [f64; 2]) -> Self {
        Self { long, lat }
    }

    pub fn as_lng_lat(&self) -> [f64; 2] {
        [self.long, self.lat]
    }
}
