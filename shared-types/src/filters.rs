use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parking::RuleType;

/// One toggle of the filter panel.
///
/// The four named keys are the ones the map understands. Anything else is
/// carried through (and forwarded to the backend as a hint) but has no
/// effect on what is drawn.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterKey {
    Garage,
    Free,
    TwoHour,
    Permit,
    Other(String),
}

impl FilterKey {
    /// Keys offered by the filter panel, in display order.
    pub const OPTIONS: [FilterKey; 4] = [
        FilterKey::Garage,
        FilterKey::Free,
        FilterKey::TwoHour,
        FilterKey::Permit,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "garage" => Self::Garage,
            "free" => Self::Free,
            "2h" => Self::TwoHour,
            "permit" => Self::Permit,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Garage => "garage",
            Self::Free => "free",
            Self::TwoHour => "2h",
            Self::Permit => "permit",
            Self::Other(raw) => raw,
        }
    }

    /// The segment rule type this key selects, if it selects one.
    pub fn rule_type(&self) -> Option<RuleType> {
        match self {
            Self::Free => Some(RuleType::Free),
            Self::TwoHour => Some(RuleType::TwoHour),
            Self::Permit => Some(RuleType::Permit),
            Self::Garage | Self::Other(_) => None,
        }
    }
}

impl From<String> for FilterKey {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<FilterKey> for String {
    fn from(key: FilterKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current selection of the filter panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    keys: BTreeSet<FilterKey>,
}

impl FilterSet {
    pub fn empty() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }

    pub fn contains(&self, key: &FilterKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: FilterKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &FilterKey) -> bool {
        self.keys.remove(key)
    }

    /// Flip one checkbox, as the filter panel does on every click.
    pub fn toggle(&mut self, key: FilterKey) {
        if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterKey> {
        self.keys.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Comma separated form used in the nearby query string.
    pub fn to_query_value(&self) -> String {
        self.keys
            .iter()
            .map(FilterKey::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Everything selected, which is how the filter panel starts out.
impl Default for FilterSet {
    fn default() -> Self {
        FilterKey::OPTIONS.into_iter().collect()
    }
}

impl FromIterator<FilterKey> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for FilterSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(FilterKey::parse).collect()
    }
}
