//! Error handling for OscNet
//!
//! This module defines the error taxonomy shared by the editor core, the
//! wire codecs and the serial link, plus a Result alias.
//!
//! None of these errors is process-fatal:
//!
//! - [`OscNetError::Rejected`] - an edit that would break a graph invariant; the edit is not applied
//! - [`OscNetError::MalformedFrame`] - a wire frame could not be decoded
//! - [`OscNetError::LinkFailure`] - the transport failed; the current session should stop
//! - [`OscNetError::InvalidId`] - a manual id edit would leave a gap in the id space

use crate::types::NodeId;
use std::time::Duration;
use thiserror::Error;

/// Why a graph edit was refused
#[derive(Debug, Clone, PartialEq)]
pub enum EditRejection {
    /// Edge from a node to itself
    SelfLoop(NodeId),
    /// An edge already connects the pair (in either orientation)
    DuplicateEdge(NodeId, NodeId),
    /// Referenced node does not exist
    UnknownNode(NodeId),
    /// No edge connects the pair
    UnknownEdge(NodeId, NodeId),
    /// A node with this id already exists
    DuplicateNode(NodeId),
    /// Bidirectional edges have no direction to invert
    BidirectionalInvert(NodeId, NodeId),
    /// Frequency outside the oscillator range
    FrequencyOutOfRange(f64),
}

impl std::fmt::Display for EditRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditRejection::SelfLoop(id) => write!(f, "edge from node {} to itself", id),
            EditRejection::DuplicateEdge(a, b) => {
                write!(f, "nodes {} and {} are already connected", a, b)
            }
            EditRejection::UnknownNode(id) => write!(f, "node {} does not exist", id),
            EditRejection::UnknownEdge(a, b) => {
                write!(f, "no edge between nodes {} and {}", a, b)
            }
            EditRejection::DuplicateNode(id) => write!(f, "node {} already exists", id),
            EditRejection::BidirectionalInvert(a, b) => {
                write!(f, "edge {}-{} is bidirectional and cannot be inverted", a, b)
            }
            EditRejection::FrequencyOutOfRange(freq) => write!(
                f,
                "frequency {:.2} Hz is outside {:.2}-{:.2} Hz",
                freq,
                crate::types::MIN_FREQUENCY_HZ,
                crate::types::MAX_FREQUENCY_HZ
            ),
        }
    }
}

/// Main error type for OscNet operations
#[derive(Error, Debug)]
pub enum OscNetError {
    /// Semantically invalid graph edit
    #[error("Edit rejected: {0}")]
    Rejected(EditRejection),

    /// Wire frame could not be decoded
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Transport-level I/O failure
    #[error("Link failure: {0}")]
    LinkFailure(String),

    /// Manual id edit that would break the density invariant
    #[error("Invalid id {id}: ids must be between 1 and {max}")]
    InvalidId { id: u32, max: u32 },

    /// The device did not acknowledge a transmitted frame
    #[error("No acknowledgement from device within {0:?}")]
    AckTimeout(Duration),

    /// The network does not fit into the device
    #[error("Network has {count} nodes but the device supports at most {max}")]
    TooManyNodes { count: usize, max: usize },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<OscNetError>,
    },
}

impl OscNetError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        OscNetError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error ends the current link session
    pub fn is_link_failure(&self) -> bool {
        match self {
            OscNetError::LinkFailure(_) => true,
            OscNetError::WithContext { source, .. } => source.is_link_failure(),
            _ => false,
        }
    }
}

impl From<EditRejection> for OscNetError {
    fn from(rejection: EditRejection) -> Self {
        OscNetError::Rejected(rejection)
    }
}

/// Result type alias for OscNet operations
pub type Result<T> = std::result::Result<T, OscNetError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OscNetError::MalformedFrame("missing '<'".to_string());
        assert_eq!(err.to_string(), "Malformed frame: missing '<'");
    }

    #[test]
    fn test_rejection_display() {
        let err: OscNetError = EditRejection::DuplicateEdge(NodeId(1), NodeId(2)).into();
        assert!(err.to_string().contains("already connected"));
    }

    #[test]
    fn test_error_with_context() {
        let err = OscNetError::LinkFailure("broken pipe".to_string());
        let with_ctx = err.with_context("Failed to send matrix");
        assert!(with_ctx.to_string().contains("Failed to send matrix"));
        assert!(with_ctx.is_link_failure());
    }

    #[test]
    fn test_invalid_id_message() {
        let err = OscNetError::InvalidId { id: 7, max: 4 };
        assert!(err.to_string().contains("between 1 and 4"));
        assert!(!err.is_link_failure());
    }
}
