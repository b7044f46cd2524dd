//! Error taxonomy for a dashboard render pass.
//!
//! Every variant aborts the pass it occurs in; nothing is retried or
//! replaced with fallback data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Missing or invalid connection secret or flag
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Handshake or network failure while talking to the warehouse
    #[error("connection error: {0}")]
    Connection(String),

    /// The warehouse rejected or failed a statement
    #[error("query failed: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    /// A result did not have the shape a section needs
    #[error("unexpected data shape: {0}")]
    DataShape(String),
}

impl DashboardError {
    pub fn query(sql: &str, message: impl std::fmt::Display) -> Self {
        DashboardError::Query {
            sql: compact_sql(sql),
            message: message.to_string(),
        }
    }

    /// Short class name shown in the error panel
    pub fn class(&self) -> &'static str {
        match self {
            DashboardError::Configuration(_) => "ConfigurationError",
            DashboardError::Connection(_) => "ConnectionError",
            DashboardError::Query { .. } => "QueryError",
            DashboardError::DataShape(_) => "DataShapeError",
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Collapse whitespace so multi-line statements fit on one line
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
