use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geojson::{Feature, Geometry, Properties};
use crate::{FilterSet, ViewportCenter};

/// Regulatory category of a street segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum RuleType {
    Free,
    TwoHour,
    Permit,
    Paid,
    #[default]
    Unknown,
}

impl RuleType {
    pub const ALL: [RuleType; 5] = [
        RuleType::Free,
        RuleType::TwoHour,
        RuleType::Permit,
        RuleType::Paid,
        RuleType::Unknown,
    ];

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("free") => Self::Free,
            Some("2h") => Self::TwoHour,
            Some("permit") => Self::Permit,
            Some("paid") => Self::Paid,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::TwoHour => "2h",
            Self::Permit => "permit",
            Self::Paid => "paid",
            Self::Unknown => "unknown",
        }
    }
}

impl From<Option<String>> for RuleType {
    fn from(raw: Option<String>) -> Self {
        Self::parse(raw.as_deref())
    }
}

impl From<RuleType> for &'static str {
    fn from(rule: RuleType) -> Self {
        rule.as_str()
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of point of interest. Kinds the map has no layer for (`lot`, ...)
/// keep their raw name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PoiType {
    Garage,
    Meter,
    Other(String),
}

impl PoiType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Garage => "garage",
            Self::Meter => "meter",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PoiType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "garage" => Self::Garage,
            "meter" => Self::Meter,
            _ => Self::Other(raw),
        }
    }
}

impl From<PoiType> for String {
    fn from(poi_type: PoiType) -> Self {
        match poi_type {
            PoiType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Segment ids are UUID text in the backend, but integer ids are accepted too.
/// Either way they are treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub geometry: Geometry,
    pub poi_type: PoiType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub props: Option<Properties>,
}

impl PoiRecord {
    /// `poi_type` and `name` first, then the record's own props layered on top.
    pub fn to_feature(&self) -> Feature {
        let mut properties = Properties::new();
        properties.insert("poi_type".into(), Value::from(self.poi_type.as_str()));
        properties.insert("name".into(), optional(self.name.as_deref()));
        if let Some(props) = &self.props {
            properties.extend(props.clone());
        }
        Feature::new(self.geometry.clone(), properties)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub geometry: Geometry,
    pub segment_id: SegmentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub max_duration_min: Option<i64>,
    #[serde(default)]
    pub days: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub permit_zone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

impl SegmentRecord {
    /// Absent optional fields are left out of the property bag entirely.
    pub fn to_feature(&self) -> Feature {
        let mut properties = Properties::new();
        let id = match &self.segment_id {
            SegmentId::Int(id) => Value::from(*id),
            SegmentId::Text(id) => Value::from(id.as_str()),
        };
        properties.insert("segment_id".into(), id);
        properties.insert("rule_type".into(), Value::from(self.rule_type.as_str()));

        let optional_fields = [
            ("name", self.name.as_deref()),
            ("days", self.days.as_deref()),
            ("start_time", self.start_time.as_deref()),
            ("end_time", self.end_time.as_deref()),
            ("permit_zone", self.permit_zone.as_deref()),
            ("source", self.source.as_deref()),
            ("confidence", self.confidence.as_deref()),
        ];
        for (key, value) in optional_fields {
            if let Some(value) = value {
                properties.insert(key.into(), Value::from(value));
            }
        }
        if let Some(minutes) = self.max_duration_min {
            properties.insert("max_duration_min".into(), Value::from(minutes));
        }

        Feature::new(self.geometry.clone(), properties)
    }
}

/// Body of `GET /api/parking/nearby`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pois: Vec<PoiRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub segments: Vec<SegmentRecord>,
}

/// One nearby lookup. Built fresh for every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub center: ViewportCenter,
    pub radius_meters: u32,
    pub filters: FilterSet,
}

impl NearbyQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lat", self.center.lat.to_string()),
            ("lng", self.center.long.to_string()),
            ("radius", self.radius_meters.to_string()),
            ("filters", self.filters.to_query_value()),
        ]
    }
}

fn optional(value: Option<&str>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
