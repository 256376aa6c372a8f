use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("nearby request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("nearby request returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode nearby response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("search text is empty")]
    EmptyQuery,
    #[error("no geocoding key configured")]
    MissingKey,
    #[error("no result for '{0}'")]
    NoResult(String),
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding request returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    EngineClosed(#[from] EngineClosed),
}

impl GeocodeError {
    /// Text shown next to the search box.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery => "Enter an address or place to search.".to_string(),
            Self::MissingKey => "No MapTiler key set in .env".to_string(),
            Self::NoResult(_) => "No result".to_string(),
            Self::Http(_) | Self::Status { .. } => {
                "Search is temporarily unavailable.".to_string()
            }
            Self::EngineClosed(_) => "The map is no longer available.".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("layer `{0}` does not exist")]
    LayerNotFound(String),
    #[error("source `{0}` does not exist")]
    SourceNotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("No duration available for this rule.")]
    NoDuration,
    #[error("A {0} minute reminder is too long to schedule.")]
    TooLong(i64),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("map engine has shut down")]
pub struct EngineClosed;
