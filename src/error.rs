//! Error taxonomy for trace analysis.
//!
//! Every data-shape violation is fatal for a run: the binary aborts before rendering.
//! - **AmbiguousOrMissingHandle:** a name/role query matched zero or several objects.
//! - **UnmatchedPublishEvent:** an rcl publish has no rclcpp or rmw counterpart.
//! - **NoMatchingBand:** a timestamp lies outside every deadline band.

use thiserror::Error;

use crate::trace::model::Handle;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("expected exactly one {role} named '{name}', found {count}")]
    AmbiguousOrMissingHandle {
        role: String,
        name: String,
        count: usize,
    },

    #[error("rcl publish #{index} (message 0x{message:x}) has no matching {missing} publish")]
    UnmatchedPublishEvent {
        index: usize,
        message: Handle,
        missing: &'static str,
    },

    #[error("timestamp {timestamp} is outside every band of {deadlines} deadline(s)")]
    NoMatchingBand { timestamp: f64, deadlines: usize },

    #[error("error: must provide only 1 argument: name of directory containing trace")]
    MalformedArguments,

    #[error("no {0} instances to analyse")]
    EmptySeries(&'static str),

    #[error("malformed trace table: {0}")]
    MalformedTable(String),

    #[error("table query failed: {0}")]
    Table(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("rendering failed: {0}")]
    Render(String),
}
