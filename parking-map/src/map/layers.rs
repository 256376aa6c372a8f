use serde_json::{json, Value};
use shared_types::RuleType;

use crate::error::SurfaceError;
use crate::map::expression::Expr;
use crate::map::surface::RenderSurface;

pub const POI_SOURCE: &str = "pois";
pub const SEGMENT_SOURCE: &str = "segments";

pub const GARAGE_LAYER: &str = "poi-garage";
pub const METER_LAYER: &str = "poi-meter";
pub const SEGMENT_LAYER: &str = "segments-line";

/// Layers that must exist before any data or filter mutation.
pub const REQUIRED_LAYERS: &[&str] = &[GARAGE_LAYER, METER_LAYER, SEGMENT_LAYER];

const GARAGE_COLOR: &str = "#1f77b4";
const METER_COLOR: &str = "#d62728";
const UNKNOWN_COLOR: &str = "#9e9e9e";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Circle,
    Line,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: &'static str,
    pub kind: LayerKind,
    pub source: &'static str,
    pub filter: Option<Expr>,
    pub paint: Value,
}

impl LayerSpec {
    /// MapLibre style layer object.
    pub fn to_json(&self) -> Value {
        let mut layer = json!({
            "id": self.id,
            "type": self.kind.as_str(),
            "source": self.source,
            "paint": self.paint,
        });
        if let Some(filter) = &self.filter {
            layer["filter"] = filter.to_json();
        }
        layer
    }
}

pub fn rule_type_color(rule: RuleType) -> &'static str {
    match rule {
        RuleType::Free => "#2ca02c",
        RuleType::TwoHour => "#1f77b4",
        RuleType::Permit => "#9467bd",
        RuleType::Paid => "#ff7f0e",
        RuleType::Unknown => UNKNOWN_COLOR,
    }
}

/// `["match", ["get", "rule_type"], "free", "#2ca02c", ..., fallback]`
fn rule_type_color_match() -> Value {
    let mut expr = vec![json!("match"), json!(["get", "rule_type"])];
    for rule in RuleType::ALL {
        if rule != RuleType::Unknown {
            expr.push(json!(rule.as_str()));
            expr.push(json!(rule_type_color(rule)));
        }
    }
    expr.push(json!(UNKNOWN_COLOR));
    Value::Array(expr)
}

/// Sources and layers in draw order.
pub fn layer_catalogue() -> Vec<LayerSpec> {
    vec![
        LayerSpec {
            id: GARAGE_LAYER,
            kind: LayerKind::Circle,
            source: POI_SOURCE,
            filter: Some(Expr::property_eq("poi_type", "garage")),
            paint: json!({
                "circle-radius": 6,
                "circle-color": GARAGE_COLOR,
                "circle-stroke-color": "#fff",
                "circle-stroke-width": 1.5,
            }),
        },
        LayerSpec {
            id: METER_LAYER,
            kind: LayerKind::Circle,
            source: POI_SOURCE,
            filter: Some(Expr::property_eq("poi_type", "meter")),
            paint: json!({
                "circle-radius": 5,
                "circle-color": METER_COLOR,
                "circle-stroke-color": "#fff",
                "circle-stroke-width": 1.2,
            }),
        },
        LayerSpec {
            id: SEGMENT_LAYER,
            kind: LayerKind::Line,
            source: SEGMENT_SOURCE,
            filter: None,
            paint: json!({
                "line-width": 4,
                "line-color": rule_type_color_match(),
            }),
        },
    ]
}

/// Registers both sources and every layer. Anything already present is left alone.
pub fn install<S: RenderSurface>(surface: &mut S) -> Result<(), SurfaceError> {
    for source in [POI_SOURCE, SEGMENT_SOURCE] {
        if !surface.has_source(source) {
            surface.add_source(source);
        }
    }
    for layer in layer_catalogue() {
        if !surface.has_layer(layer.id) {
            surface.add_layer(&layer)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

pub fn legend() -> Vec<LegendEntry> {
    let mut entries = vec![
        LegendEntry {
            label: "Garage",
            color: GARAGE_COLOR,
        },
        LegendEntry {
            label: "Meter",
            color: METER_COLOR,
        },
    ];
    entries.extend(
        [
            ("Free", RuleType::Free),
            ("2h", RuleType::TwoHour),
            ("Permit", RuleType::Permit),
            ("Paid", RuleType::Paid),
        ]
        .into_iter()
        .map(|(label, rule)| LegendEntry {
            label,
            color: rule_type_color(rule),
        }),
    );
    entries
}
