//! Cross-layer publish correlation.
//!
//! A publish call descends rclcpp -> rcl -> rmw, but the publisher handle is only
//! recorded at the rcl layer. For each rcl publish of the target publisher, the nearest
//! earlier rclcpp record and the nearest later rmw record carrying the same message
//! address are taken as the call site and the transport entry. The reported instant is
//! their midpoint.
//!
//! Message addresses are only unique transiently (the allocator reuses them), so the
//! number of same-layer candidates between two rcl calls of the same address is counted.
//! More than one is an identity collision: it is reported, the nearest candidate still wins.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::resolver::{self, Role};
use crate::error::{AnalysisError, Result};
use crate::trace::{Handle, Layer, Nanos, PublishEvent, TraceSession};

/// How matching records are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Backward/forward scans over the whole event log. A window that no same-address rcl
    /// record closes is walked to the edge of the log, so a log without address reuse
    /// costs O(n) per publication.
    #[default]
    Linear,
    /// Scans over a per-address position index built in one pass; a window only ever
    /// visits records of its own address.
    Indexed,
}

/// An rcl publish with more than one candidate counterpart in its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub index: usize,
    pub message: Handle,
    pub layer: Layer,
    pub candidates: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationReport {
    /// Midpoint publication instants (ns), one per rcl publish, in capture order.
    pub instants: Vec<f64>,
    pub collisions: Vec<Collision>,
}

/// Result of one directional scan.
#[derive(Debug, Default)]
struct Probe {
    found: Option<usize>,
    candidates: usize,
}

/// Message address -> ascending positions in the event log.
#[derive(Debug, Default)]
pub struct TokenIndex {
    positions: HashMap<Handle, Vec<usize>>,
}

impl TokenIndex {
    pub fn build(events: &[PublishEvent]) -> Self {
        let mut positions: HashMap<Handle, Vec<usize>> = HashMap::new();
        for (i, e) in events.iter().enumerate() {
            positions.entry(e.message).or_default().push(i);
        }
        Self { positions }
    }

    /// Positions of `events[i]`'s address before and after `i`.
    fn around(&self, events: &[PublishEvent], i: usize) -> (&[usize], &[usize]) {
        let list = self
            .positions
            .get(&events[i].message)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        match list.binary_search(&i) {
            Ok(k) => (&list[..k], &list[k + 1..]),
            Err(k) => (&list[..k], &list[k..]),
        }
    }
}

/// Publication instants of `publisher`, first match wins, linear scans.
pub fn publish_times_for(events: &[PublishEvent], publisher: Handle) -> Result<Vec<f64>> {
    Ok(correlate(events, publisher, Strategy::Linear)?.instants)
}

/// Correlates every rcl publish of `publisher` with its rclcpp and rmw counterparts.
pub fn correlate(
    events: &[PublishEvent],
    publisher: Handle,
    strategy: Strategy,
) -> Result<CorrelationReport> {
    let index = match strategy {
        Strategy::Indexed => Some(TokenIndex::build(events)),
        Strategy::Linear => None,
    };

    let mut report = CorrelationReport::default();
    let rcl_indexes = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.layer == Layer::Rcl && e.publisher == Some(publisher))
        .map(|(i, _)| i);

    for i in rcl_indexes {
        let (before, after) = match &index {
            Some(idx) => {
                let (before, after) = idx.around(events, i);
                (
                    scan(events, i, before.iter().rev().copied(), Layer::Rclcpp),
                    scan(events, i, after.iter().copied(), Layer::Rmw),
                )
            }
            None => (
                scan(events, i, (0..i).rev(), Layer::Rclcpp),
                scan(events, i, i + 1..events.len(), Layer::Rmw),
            ),
        };

        let message = events[i].message;
        let top = before.found.ok_or(AnalysisError::UnmatchedPublishEvent {
            index: i,
            message,
            missing: "rclcpp",
        })?;
        let bottom = after.found.ok_or(AnalysisError::UnmatchedPublishEvent {
            index: i,
            message,
            missing: "rmw",
        })?;

        for (probe, layer) in [(&before, Layer::Rclcpp), (&after, Layer::Rmw)] {
            if probe.candidates > 1 {
                warn!(
                    "message 0x{:x}: {} {} candidates for rcl publish #{}",
                    message, probe.candidates, layer, i
                );
                report.collisions.push(Collision {
                    index: i,
                    message,
                    layer,
                    candidates: probe.candidates,
                });
            }
        }

        report
            .instants
            .push(midpoint(events[top].timestamp, events[bottom].timestamp));
    }

    debug!(
        "publisher 0x{:x}: {} publications, {} collisions ({:?})",
        publisher,
        report.instants.len(),
        report.collisions.len(),
        strategy
    );
    Ok(report)
}

/// Publication instants for the publisher of `topic`.
pub fn publish_times(
    session: &TraceSession,
    topic: &str,
    strategy: Strategy,
) -> Result<CorrelationReport> {
    let events = session.publish_instances()?;
    let publisher = resolver::resolve(session, Role::Publisher, topic)?;
    let report = correlate(&events, publisher, strategy)?;
    info!("{}: {} publications", topic, report.instants.len());
    Ok(report)
}

pub fn midpoint(call_site: Nanos, transport: Nanos) -> f64 {
    call_site as f64 + (transport - call_site) as f64 / 2.0
}

/// Walks `positions` away from rcl publish `i`, looking for `wanted` records with the same
/// address. The first hit is the match; hits are counted until a same-address rcl record
/// closes the window.
fn scan(
    events: &[PublishEvent],
    i: usize,
    positions: impl Iterator<Item = usize>,
    wanted: Layer,
) -> Probe {
    let message = events[i].message;
    let mut probe = Probe::default();
    let mut in_window = true;

    for j in positions {
        let e = &events[j];
        if e.message != message {
            continue;
        }
        if e.layer == Layer::Rcl {
            in_window = false;
        } else if e.layer == wanted {
            if in_window {
                probe.candidates += 1;
            }
            if probe.found.is_none() {
                probe.found = Some(j);
            }
        }
        if probe.found.is_some() && !in_window {
            break;
        }
    }
    probe
}
