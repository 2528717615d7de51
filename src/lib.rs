//! # ROS 2 trace analysis
//!
//! Turns one captured run of the reference system into two charts: the timer callback
//! interval/duration plot and the pub/sub/timer time chart.
//!
//! ## Stages
//! - **trace:** loads the decoded capture tables (`<trace-dir>/ust/*.csv`) with polars.
//! - **analysis:** resolves names to handles, extracts callback ranges, correlates the
//!   rclcpp/rcl/rmw publish records, derives the chart series and deadline bands.
//! - **render / utils::export:** PNG/SVG (plotters), HTML (plotly) and CSV artifacts
//!   written beside the trace.
//! - **capture / synth:** the tracing session description and a synthetic capture of the
//!   same topology.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod render;
pub mod synth;
pub mod trace;
pub mod utils;
