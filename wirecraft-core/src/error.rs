//! Error types for wirecraft

use thiserror::Error;

/// Result type alias for wirecraft operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wirecraft
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer is smaller than a layer's minimum fixed header
    #[error("{layer} header too short: need {need} bytes, got {got}")]
    TooShort {
        layer: &'static str,
        need: usize,
        got: usize,
    },

    /// A declared length or offset field disagrees with the buffer
    #[error("{layer} length field invalid: {reason}")]
    BadLength {
        layer: &'static str,
        reason: String,
    },

    /// Operation requires a layer type that is absent or in the wrong place
    #[error("Unsupported layer: {0}")]
    UnsupportedLayer(String),

    /// Address string or byte slice does not describe a valid address
    #[error("Invalid address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    /// No matching reply arrived before the deadline
    #[error("No matching reply before the timeout")]
    Timeout,

    /// The send or receive capability could not be opened or has failed
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a `TooShort` error for a named layer
    pub fn too_short(layer: &'static str, need: usize, got: usize) -> Self {
        Error::TooShort { layer, need, got }
    }

    /// Create a `BadLength` error for a named layer
    pub fn bad_length<S: Into<String>>(layer: &'static str, reason: S) -> Self {
        Error::BadLength {
            layer,
            reason: reason.into(),
        }
    }

    /// Create an `UnsupportedLayer` error with a custom message
    pub fn unsupported_layer<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedLayer(msg.into())
    }

    /// Create an `InvalidAddress` error
    pub fn invalid_address<S: Into<String>>(addr: S, reason: S) -> Self {
        Error::InvalidAddress {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Create a `TransportUnavailable` error with a custom message
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::TransportUnavailable(msg.into())
    }
}
