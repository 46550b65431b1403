use serde::Deserialize;
use wasm_bindgen::JsValue;

/// Failures that end a building request without a usable payload.
///
/// A 2xx response that cannot be understood is not an error: it is
/// normalized to an empty collection by [`crate::models::ApiPayload`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("request timed out after {0} ms")]
    Timeout(u32),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl FetchError {
    /// Build an HTTP error from a non-2xx response, preferring the
    /// backend's `{"error": "..."}` message over a synthesized one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        FetchError::Http { status, message }
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<FetchError> for JsValue {
    fn from(err: FetchError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown map style '{0}'")]
    UnknownStyle(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("app has not been initialized; call init_app first")]
    NotInitialized,
}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
