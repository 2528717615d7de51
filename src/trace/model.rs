//! Plain records extracted from a trace capture.
//!
//! Timestamps and durations are integer nanoseconds on the capture's monotonic clock.
//! Derived instants (publication midpoints) are `f64` nanoseconds on the same clock.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Opaque identifier of a runtime object (publisher, subscription, node, callback) within one capture.
pub type Handle = u64;

/// Nanoseconds on the capture clock.
pub type Nanos = i64;

pub const NANOS_PER_MS: f64 = 1_000_000.0;
pub const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// One recorded callback execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackInvocation {
    pub owner: Handle,
    pub start: Nanos,
    pub duration: Nanos,
}

/// Begin, end (= begin + duration) and duration of one callback instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub begin: Nanos,
    pub end: Nanos,
    pub duration: Nanos,
}

impl From<&CallbackInvocation> for TimeRange {
    fn from(inv: &CallbackInvocation) -> Self {
        Self {
            begin: inv.start,
            end: inv.start + inv.duration,
            duration: inv.duration,
        }
    }
}

/// Software layer a publish call was recorded at.
///
/// A single user publish descends rclcpp -> rcl -> rmw; only the rcl record
/// carries the publisher handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Rclcpp,
    Rcl,
    Rmw,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Rclcpp => "rclcpp",
            Layer::Rcl => "rcl",
            Layer::Rmw => "rmw",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rclcpp" => Ok(Layer::Rclcpp),
            "rcl" => Ok(Layer::Rcl),
            "rmw" => Ok(Layer::Rmw),
            other => Err(AnalysisError::MalformedTable(format!(
                "unknown publish layer '{}'",
                other
            ))),
        }
    }
}

/// One publish call observed at one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishEvent {
    pub layer: Layer,
    pub timestamp: Nanos,
    /// Address of the outgoing message at call time.
    pub message: Handle,
    /// Only known at the rcl layer.
    pub publisher: Option<Handle>,
}

impl PublishEvent {
    pub fn rclcpp(timestamp: Nanos, message: Handle) -> Self {
        Self { layer: Layer::Rclcpp, timestamp, message, publisher: None }
    }

    pub fn rcl(timestamp: Nanos, message: Handle, publisher: Handle) -> Self {
        Self { layer: Layer::Rcl, timestamp, message, publisher: Some(publisher) }
    }

    pub fn rmw(timestamp: Nanos, message: Handle) -> Self {
        Self { layer: Layer::Rmw, timestamp, message, publisher: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_end_is_begin_plus_duration() {
        let inv = CallbackInvocation { owner: 7, start: 1_000, duration: 250 };
        let r = TimeRange::from(&inv);
        assert_eq!(r.begin, 1_000);
        assert_eq!(r.end, 1_250);
        assert_eq!(r.duration, 250);
    }

    #[test]
    fn layer_names_parse() {
        assert_eq!("rclcpp".parse::<Layer>().unwrap(), Layer::Rclcpp);
        assert_eq!(" rcl".parse::<Layer>().unwrap(), Layer::Rcl);
        assert_eq!("rmw".parse::<Layer>().unwrap(), Layer::Rmw);
        assert!(matches!("dds".parse::<Layer>(), Err(AnalysisError::MalformedTable(_))));
    }
}
