//! Callback Interval Extractor: callback invocations to ordered time ranges.

use crate::analysis::resolver;
use crate::error::{AnalysisError, Result};
use crate::trace::{CallbackInvocation, Handle, Nanos, TimeRange, TraceSession};

/// Every invocation of the callback owning `handle`, as (begin, end, duration) in capture order.
/// An owner without invocations yields an empty sequence.
pub fn intervals_for(session: &TraceSession, handle: Handle) -> Result<Vec<TimeRange>> {
    Ok(to_ranges(&session.callback_durations(handle)?))
}

pub fn to_ranges(invocations: &[CallbackInvocation]) -> Vec<TimeRange> {
    invocations.iter().map(TimeRange::from).collect()
}

/// Timer callback ranges of `node_name`.
pub fn timer_ranges(session: &TraceSession, node_name: &str) -> Result<Vec<TimeRange>> {
    let obj = resolver::timer_callback(session, node_name)?;
    intervals_for(session, obj)
}

/// Subscription callback ranges for `topic`, optionally restricted to one node.
pub fn subscription_ranges(
    session: &TraceSession,
    topic: &str,
    node_name: Option<&str>,
) -> Result<Vec<TimeRange>> {
    let obj = resolver::subscription_callback(session, topic, node_name)?;
    intervals_for(session, obj)
}

/// Start timestamps of the subscription callback for `topic`.
pub fn subscription_times(
    session: &TraceSession,
    topic: &str,
    node_name: Option<&str>,
) -> Result<Vec<Nanos>> {
    Ok(subscription_ranges(session, topic, node_name)?
        .iter()
        .map(|r| r.begin)
        .collect())
}

/// First and last range; fails on an empty sequence.
pub fn span(ranges: &[TimeRange], what: &'static str) -> Result<(TimeRange, TimeRange)> {
    match (ranges.first(), ranges.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(AnalysisError::EmptySeries(what)),
    }
}
