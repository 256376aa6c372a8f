use serde_json::Value;
use shared_types::{Properties, ViewportCenter};

use crate::map::reminder::ReminderControl;

/// A click on the segments layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentClick {
    pub anchor: ViewportCenter,
    /// Properties of every feature under the pointer, topmost first.
    pub features: Vec<Properties>,
}

/// Rule metadata for one street segment, read back from its property bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentDetail {
    pub name: Option<String>,
    pub rule_type: Option<String>,
    pub max_duration_min: Option<i64>,
    pub days: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub permit_zone: Option<String>,
    pub source: Option<String>,
    pub confidence: Option<String>,
}

impl SegmentDetail {
    pub fn from_properties(properties: &Properties) -> Self {
        let text = |key: &str| {
            properties
                .get(key)
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
        };

        Self {
            name: text("name"),
            rule_type: text("rule_type"),
            max_duration_min: properties.get("max_duration_min").and_then(minutes),
            days: text("days"),
            start_time: text("start_time"),
            end_time: text("end_time"),
            permit_zone: text("permit_zone"),
            source: text("source"),
            confidence: text("confidence"),
        }
    }

    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("Street segment")
    }

    /// Popup body, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        let rule = self.rule_type.as_deref().unwrap_or("unknown");
        let rule_line = match self.max_duration_min.filter(|m| *m > 0) {
            Some(minutes) => format!("Rule: {} ({} min)", rule, minutes),
            None => format!("Rule: {}", rule),
        };

        vec![
            rule_line,
            format!("Days: {}", or_dash(&self.days)),
            format!(
                "Time: {} – {}",
                or_dash(&self.start_time),
                or_dash(&self.end_time)
            ),
            format!(
                "Permit: {}",
                self.permit_zone.as_deref().unwrap_or("N/A")
            ),
            format!(
                "Source: {} ({})",
                or_dash(&self.source),
                or_dash(&self.confidence)
            ),
        ]
    }
}

/// Durations arrive as numbers, but string-typed properties are tolerated.
fn minutes(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// What the surface shows for a selected segment.
#[derive(Debug)]
pub struct DetailPopup {
    pub anchor: ViewportCenter,
    pub detail: SegmentDetail,
    pub reminder: ReminderControl,
}
