//! Error types shared by the network model, the optimizer, and the I/O adapters.

use crate::models::{ConnectionId, RouteId, StationId};

/// Errors raised by rail network operations.
///
/// The `*NotFound` variants indicate a caller or logic bug (an unknown
/// station, route, or connection was requested) and are never recovered
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// No station with this name exists in the network.
    #[error("station not found: {0}")]
    StationNotFound(String),

    /// No station with this handle exists in the network.
    #[error("station id not found: {0}")]
    StationIdNotFound(StationId),

    /// No route with this id is registered in the network.
    #[error("route not found: {0}")]
    RouteNotFound(RouteId),

    /// No connection with this handle exists in the network.
    #[error("connection id not found: {0}")]
    ConnectionIdNotFound(ConnectionId),

    /// The two stations are not joined by a connection.
    #[error("no connection between {from} and {to}")]
    ConnectionNotFound { from: String, to: String },

    /// A station name occurs twice in the imported data.
    #[error("duplicate station: {0}")]
    DuplicateStation(String),

    /// A connection joins a station to itself.
    #[error("connection from {0} to itself")]
    SelfConnection(String),

    /// The same pair of stations is connected twice.
    #[error("duplicate connection between {from} and {to}")]
    DuplicateConnection { from: String, to: String },

    /// A connection duration is not a positive finite number.
    #[error("invalid duration {duration} for connection {from} - {to}")]
    InvalidDuration {
        from: String,
        to: String,
        duration: f64,
    },

    /// An insert or pop position lies outside the route.
    #[error("index {index} out of range for route of {len} stations")]
    IndexOutOfRange { index: isize, len: usize },

    /// A route references a connection the network does not own.
    #[error("route references foreign connection {0}")]
    ForeignConnection(ConnectionId),

    /// Route bookkeeping disagrees with the stations/connections it touches.
    #[error("inconsistent route {route}: {message}")]
    Inconsistent { route: RouteId, message: String },

    /// Optimizer configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    /// Returns `true` for the unknown-station/route/connection family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NetworkError::StationNotFound(_)
                | NetworkError::StationIdNotFound(_)
                | NetworkError::RouteNotFound(_)
                | NetworkError::ConnectionIdNotFound(_)
                | NetworkError::ConnectionNotFound { .. }
        )
    }
}

/// Result alias for rail network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
