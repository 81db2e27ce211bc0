//! Error types for the chat host.

use serde::Deserialize;

/// Errors that can end a conversation turn.
///
/// `Transport` and `Api` are fatal to the turn and shown to the user;
/// tool-level failures never appear here, they flow back to the model
/// as structured results.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The model endpoint could not be reached.
    #[error("model transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The model API answered with an error status.
    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tool server connection failed.
    #[error("tool surface error: {0}")]
    Surface(String),

    /// The model kept requesting tools past the round cap.
    #[error("turn exceeded {0} tool rounds without a final reply")]
    TurnLimit(usize),
}

impl ChatError {
    /// Build an API error from a non-success response body, pulling the
    /// message out of the standard error envelope when possible.
    pub fn from_response(status: u16, body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
            Self::Api {
                status,
                message: envelope.error.message,
            }
        } else {
            Self::Api {
                status,
                message: body.to_string(),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
