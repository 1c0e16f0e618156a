use thiserror::Error;

use crate::service::dispatcher::ToggleKind;

/// Main error type for the mount control core
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Device-control API returned {status}: {}", .message.as_deref().unwrap_or("no error detail"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rejected by mount: {0}")]
    Rejected(String),

    #[error("{0} change already in progress")]
    Busy(ToggleKind),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ControlError {
    /// Text appended to a failed command's log prefix.
    ///
    /// Prefers the error reported by the device-control service, falling back
    /// to the transport-level description.
    pub fn detail(&self) -> String {
        match self {
            ControlError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ControlError::Api {
                status,
                message: None,
            } => format!("HTTP {}", status),
            ControlError::Transport(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ControlError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ControlError::Api {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ControlError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        ControlError::Decode(err.to_string())
    }
}

/// Errors from decoding or validating sexagesimal coordinates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("Invalid sexagesimal value: {0:?}")]
    Malformed(String),

    #[error("Minutes or seconds out of range in {0:?}")]
    FieldOutOfRange(String),

    #[error("Right ascension {0:?} outside 00:00:00..24:00:00")]
    RightAscensionOutOfRange(String),

    #[error("Declination {0:?} outside -90:00:00..+90:00:00")]
    DeclinationOutOfRange(String),

    #[error("Declination {0:?} must carry an explicit sign")]
    MissingSign(String),
}
