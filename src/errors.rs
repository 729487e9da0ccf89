use reqwest::StatusCode;
use thiserror::Error;

/// Every failure the search client can surface, normalized into one type.
///
/// All variants carry a human readable message. `Upstream` additionally
/// carries the HTTP status returned by the search service.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Search cancelled: {query}")]
    Cancelled { query: String },
}

impl SearchError {
    /// Map a failed `reqwest` call (no response received, or the body could
    /// not be read) onto the transport / unexpected split.
    pub fn from_request(base_url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Transport {
                message: "Request timed out, please try again".to_string(),
                source: Some(source),
            };
        }

        if source.is_connect() {
            return Self::Transport {
                message: format!(
                    "Cannot connect to the search service at {}, check your configuration",
                    base_url
                ),
                source: Some(source),
            };
        }

        // Timeouts are handled above; what remains here is a request that
        // failed to send or a body cut off mid-transfer.
        if source.is_request() || source.is_body() {
            return Self::Transport {
                message: format!("Request aborted: {}", source),
                source: Some(source),
            };
        }

        Self::Unexpected {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Map a non-2xx response status onto an `Upstream` error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = match status.as_u16() {
            404 => "Search service not available".to_string(),
            403 => {
                "Access forbidden - check that the JSON format is enabled in SearXNG settings"
                    .to_string()
            }
            429 => "Rate limit exceeded - try again later".to_string(),
            code if code >= 500 => "Search service is experiencing issues".to_string(),
            _ => {
                let detail = body.trim();
                if detail.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    format!("HTTP {}: {}", status, detail)
                }
            }
        };

        Self::Upstream {
            status: status.as_u16(),
            message,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: None,
        }
    }

    pub fn decode(context: &str, source: serde_json::Error) -> Self {
        Self::Unexpected {
            message: format!("{}: {}", context, source),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn cancelled(query: &str) -> Self {
        Self::Cancelled {
            query: query.to_string(),
        }
    }

    /// The upstream HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SearchError::Transport { message, .. }
            | SearchError::Upstream { message, .. }
            | SearchError::Unexpected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled { .. })
    }

    /// Text shown to the end user, with the status code appended when known.
    pub fn to_user_message(&self) -> String {
        match self.status() {
            Some(code) => format!("{} (HTTP {})", self.message(), code),
            None => self.message(),
        }
    }
}
