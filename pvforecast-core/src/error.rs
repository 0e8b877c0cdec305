use thiserror::Error;

/// Errors returned by [`ForecastClient`](crate::ForecastClient) operations.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A request parameter was rejected locally; no request was sent.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The request never produced an HTTP response (connect, DNS, timeout, body read).
    #[error("Failed to reach PVForecast service: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("PVForecast request failed with status {status}: {message}")]
    Service { status: u16, message: String },

    /// The response body could not be decoded into a forecast.
    #[error("Failed to decode PVForecast response: {source} (body: {body})")]
    Decode {
        #[source]
        source: serde_json::Error,
        /// Start of the body, lossily converted to text.
        body: String,
    },
}

impl ForecastError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    /// HTTP status for [`ForecastError::Service`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_display_names_the_parameter() {
        let err = ForecastError::invalid("lat", "must be within -90..=90, got 91");
        let msg = err.to_string();
        assert!(msg.contains("'lat'"));
        assert!(msg.contains("91"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn service_error_exposes_status() {
        let err = ForecastError::Service { status: 401, message: "bad key".into() };
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn decode_error_keeps_json_source() {
        use std::error::Error as _;

        let source = serde_json::from_str::<serde_json::Value>("[1,\n x]").unwrap_err();
        let err = ForecastError::Decode { source, body: "[1,\n x]".into() };

        let inner = err
            .source()
            .and_then(|e| e.downcast_ref::<serde_json::Error>())
            .expect("serde_json source");
        assert_eq!(inner.line(), 2);
        assert!(err.to_string().contains("(body: [1,"));
    }
}
