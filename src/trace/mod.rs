//! Trace capture access: record types and the polars-backed Event Table.

pub mod model;
pub mod table;

pub use model::{CallbackInvocation, Handle, Layer, Nanos, PublishEvent, TimeRange};
pub use table::{TraceSession, TraceTables};
