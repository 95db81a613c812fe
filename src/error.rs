use serde_json::Value as JsonValue;
use thiserror::Error;

/// Why a request against the server did not produce usable data.
///
/// Callers of the directory client treat every variant the same way (one
/// logical load failure); the variants only matter for logging and for the
/// text shown in the output pane.
#[derive(Debug, Clone, Error)]
pub enum LoadFailure {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("server answered with status {status}")]
    Protocol { status: i64, payload: JsonValue },
}

impl LoadFailure {
    pub fn is_protocol(&self) -> bool {
        matches!(self, LoadFailure::Protocol { .. })
    }
}

impl From<reqwest::Error> for LoadFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LoadFailure::Decode(e.to_string())
        } else {
            LoadFailure::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LoadFailure {
    fn from(e: serde_json::Error) -> Self {
        LoadFailure::Decode(e.to_string())
    }
}
