//! Synthetic capture of the reference topology, for running the analysis without a robot stack.
//!
//! - Six upstream nodes, each with a periodic timer publishing on `/<node>`.
//! - `BehaviorPlanner` subscribes to all six topics and publishes on `/BehaviorPlanner`
//!   from its own timer.
//! - Every publish is recorded at rclcpp, rcl and rmw; the three records share a message
//!   address drawn from a small pool, so addresses recur across calls.
//!
//! Generation is deterministic for a given seed (`StdRng`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use csv::Writer;
use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::error::Result;
use crate::trace::{Handle, Layer, Nanos, PublishEvent, table::UST_DIR};

pub const PLANNER: &str = "BehaviorPlanner";

pub const UPSTREAM: [&str; 6] = [
    "ObjectCollisionEstimator",
    "NDTLocalizer",
    "Lanelet2GlobalPlanner",
    "Lanelet2MapLoader",
    "ParkingPlanner",
    "LanePlanner",
];

const MS: f64 = 1_000_000.0;
const TOKEN_BASE: i64 = 0x5581_2000_0000;
const TOKEN_STRIDE: i64 = 0x80;
/// Offsets of the rcl and rmw records after the rclcpp record (ns).
const RCL_DELAY: Nanos = 1_200;
const RMW_DELAY: Nanos = 3_400;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub seed: u64,
    pub duration_s: f64,
    /// Capture clock at the start of the run (ns).
    pub start_ns: Nanos,
    pub timer_period_ms: f64,
    /// Uniform release jitter of every timer, +/- this much.
    pub jitter_ms: f64,
    /// One period per upstream node, in `UPSTREAM` order.
    pub upstream_periods_ms: Vec<f64>,
    /// Distinct message addresses available to the allocator.
    pub token_pool: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            duration_s: 10.0,
            start_ns: 1_700_000_000_000_000_000,
            timer_period_ms: 100.0,
            jitter_ms: 2.0,
            upstream_periods_ms: vec![100.0, 100.0, 50.0, 100.0, 100.0, 100.0],
            token_pool: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeRow {
    pub node_handle: i64,
    pub tid: i64,
    pub name: String,
    pub namespace: String,
}

/// Publisher or subscription; the handle column is named per role when written.
#[derive(Debug, Clone)]
pub struct EndpointRow {
    pub handle: i64,
    pub node_handle: i64,
    pub topic_name: String,
    pub depth: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionObjectRow {
    pub subscription: i64,
    pub subscription_handle: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerRow {
    pub timer_handle: i64,
    pub period: i64,
    pub tid: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerLinkRow {
    pub timer_handle: i64,
    pub node_handle: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackObjectRow {
    pub reference: i64,
    pub callback_object: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackSymbolRow {
    pub callback_object: i64,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackInstanceRow {
    pub callback_object: i64,
    pub timestamp: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishRow {
    pub timestamp: i64,
    pub message: i64,
    pub layer: Layer,
    pub publisher_handle: Option<i64>,
}

/// Rows of every table of one synthetic capture.
#[derive(Debug, Clone, Default)]
pub struct SynthTrace {
    pub nodes: Vec<NodeRow>,
    pub rcl_publishers: Vec<EndpointRow>,
    pub rcl_subscriptions: Vec<EndpointRow>,
    pub subscription_objects: Vec<SubscriptionObjectRow>,
    pub timers: Vec<TimerRow>,
    pub timer_node_links: Vec<TimerLinkRow>,
    pub callback_objects: Vec<CallbackObjectRow>,
    pub callback_symbols: Vec<CallbackSymbolRow>,
    pub callback_instances: Vec<CallbackInstanceRow>,
    pub publish_instances: Vec<PublishRow>,
}

/// Handles of one node's objects.
struct NodeIds {
    node: i64,
    tid: i64,
    publisher: i64,
    timer: i64,
    timer_callback: i64,
}

impl NodeIds {
    fn new(index: i64) -> Self {
        Self {
            node: 0x1000 + index,
            tid: 4_000 + index,
            publisher: 0x2000 + index,
            timer: 0x3000 + index,
            timer_callback: 0x4000 + index,
        }
    }
}

/// A publish call before its message address is allocated.
struct PendingPublish {
    at: Nanos,
    publisher: i64,
}

struct Generator {
    rng: StdRng,
    config: SynthConfig,
    end: Nanos,
    trace: SynthTrace,
    publishes: Vec<PendingPublish>,
}

impl Generator {
    fn jitter(&mut self) -> Nanos {
        let j = self.config.jitter_ms.max(0.0);
        (self.rng.random_range(-j..=j) * MS) as Nanos
    }

    fn uniform_ms(&mut self, lo: f64, hi: f64) -> Nanos {
        (self.rng.random_range(lo..hi) * MS) as Nanos
    }

    fn add_node(&mut self, ids: &NodeIds, name: &str, period_ms: f64) {
        self.trace.nodes.push(NodeRow {
            node_handle: ids.node,
            tid: ids.tid,
            name: name.to_string(),
            namespace: "/".into(),
        });
        self.trace.rcl_publishers.push(EndpointRow {
            handle: ids.publisher,
            node_handle: ids.node,
            topic_name: format!("/{}", name),
            depth: 1,
        });
        self.trace.timers.push(TimerRow {
            timer_handle: ids.timer,
            period: (period_ms * MS) as i64,
            tid: ids.tid,
        });
        self.trace.timer_node_links.push(TimerLinkRow { timer_handle: ids.timer, node_handle: ids.node });
        self.trace.callback_objects.push(CallbackObjectRow {
            reference: ids.timer,
            callback_object: ids.timer_callback,
        });
        self.trace.callback_symbols.push(CallbackSymbolRow {
            callback_object: ids.timer_callback,
            symbol: format!("{}::timer_callback", name),
        });
    }

    /// Releases a periodic timer over the run; each instance publishes once.
    /// Returns the publish call instants.
    fn run_timer(&mut self, ids: &NodeIds, period_ms: f64, phase: Nanos) -> Vec<Nanos> {
        let period = (period_ms * MS) as Nanos;
        let mut published = Vec::new();
        let mut release = self.config.start_ns + phase;
        while release < self.end {
            let start = release + self.jitter().max(-phase);
            let duration = self.uniform_ms(0.5, 3.0);
            let at = start + duration / 3;
            self.trace.callback_instances.push(CallbackInstanceRow {
                callback_object: ids.timer_callback,
                timestamp: start,
                duration,
            });
            self.publishes.push(PendingPublish { at, publisher: ids.publisher });
            published.push(at);
            release += period;
        }
        published
    }

    /// Gives every publish call a message address from the pool that is not in flight.
    fn allocate_tokens(&mut self) {
        self.publishes.sort_by_key(|p| p.at);
        let mut busy_until: Vec<Nanos> = vec![Nanos::MIN; self.config.token_pool.max(1)];

        for p in &self.publishes {
            let free: Vec<usize> = (0..busy_until.len()).filter(|&k| busy_until[k] < p.at).collect();
            let slot = if free.is_empty() {
                busy_until.push(Nanos::MIN);
                busy_until.len() - 1
            } else {
                free[self.rng.random_range(0..free.len())]
            };
            busy_until[slot] = p.at + RMW_DELAY;

            let message = TOKEN_BASE + slot as i64 * TOKEN_STRIDE;
            self.trace.publish_instances.extend([
                PublishRow { timestamp: p.at, message, layer: Layer::Rclcpp, publisher_handle: None },
                PublishRow {
                    timestamp: p.at + RCL_DELAY,
                    message,
                    layer: Layer::Rcl,
                    publisher_handle: Some(p.publisher),
                },
                PublishRow { timestamp: p.at + RMW_DELAY, message, layer: Layer::Rmw, publisher_handle: None },
            ]);
        }
        self.trace.publish_instances.sort_by_key(|r| r.timestamp);
        debug!("{} publish calls over {} addresses", self.publishes.len(), busy_until.len());
    }
}

/// Builds a full capture of the reference topology.
pub fn generate(config: &SynthConfig) -> SynthTrace {
    let mut g = Generator {
        rng: StdRng::seed_from_u64(config.seed),
        end: config.start_ns + (config.duration_s * 1_000.0 * MS) as Nanos,
        config: config.clone(),
        trace: SynthTrace::default(),
        publishes: Vec::new(),
    };

    let planner = NodeIds::new(0);
    g.add_node(&planner, PLANNER, config.timer_period_ms);

    for (i, name) in UPSTREAM.iter().enumerate() {
        let period_ms = config.upstream_periods_ms.get(i).copied().unwrap_or(config.timer_period_ms);
        let ids = NodeIds::new(i as i64 + 1);
        g.add_node(&ids, name, period_ms);

        let sub_handle = 0x5000 + i as i64;
        let subscription = 0x6000 + i as i64;
        let callback = 0x7000 + i as i64;
        g.trace.rcl_subscriptions.push(EndpointRow {
            handle: sub_handle,
            node_handle: planner.node,
            topic_name: format!("/{}", name),
            depth: 1,
        });
        g.trace.subscription_objects.push(SubscriptionObjectRow { subscription, subscription_handle: sub_handle });
        g.trace.callback_objects.push(CallbackObjectRow { reference: subscription, callback_object: callback });
        g.trace.callback_symbols.push(CallbackSymbolRow {
            callback_object: callback,
            symbol: format!("{}::on_{}", PLANNER, name),
        });

        let phase = g.uniform_ms(0.0, period_ms);
        for sent in g.run_timer(&ids, period_ms, phase) {
            let latency = g.uniform_ms(0.2, 1.5);
            let duration = g.uniform_ms(0.05, 0.3);
            g.trace.callback_instances.push(CallbackInstanceRow {
                callback_object: callback,
                timestamp: sent + latency,
                duration,
            });
        }
    }

    let phase = g.uniform_ms(10.0, 30.0);
    g.run_timer(&planner, config.timer_period_ms, phase);

    g.allocate_tokens();
    g.trace.callback_instances.sort_by_key(|r| r.timestamp);

    info!(
        "Synthesized {} callback instances and {} publish records (seed {})",
        g.trace.callback_instances.len(),
        g.trace.publish_instances.len(),
        config.seed
    );
    g.trace
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    if rows.is_empty() {
        wtr.write_record(header)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn endpoint_rows(rows: &[EndpointRow], handle: &str, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record([handle, "node_handle", "topic_name", "depth"])?;
    for r in rows {
        wtr.write_record([
            r.handle.to_string(),
            r.node_handle.to_string(),
            r.topic_name.clone(),
            r.depth.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

impl SynthTrace {
    /// Writes every table to `<dir>/ust/` and returns that directory.
    pub fn write_tables(&self, dir: &Path) -> Result<PathBuf> {
        let ust = dir.join(UST_DIR);
        fs::create_dir_all(&ust)?;
        let at = |name: &str| ust.join(format!("{}.csv", name));

        write_rows(&at("nodes"), &self.nodes, &["node_handle", "tid", "name", "namespace"])?;
        endpoint_rows(&self.rcl_publishers, "publisher_handle", &at("rcl_publishers"))?;
        endpoint_rows(&self.rcl_subscriptions, "subscription_handle", &at("rcl_subscriptions"))?;
        write_rows(
            &at("subscription_objects"),
            &self.subscription_objects,
            &["subscription", "subscription_handle"],
        )?;
        write_rows(&at("timers"), &self.timers, &["timer_handle", "period", "tid"])?;
        write_rows(&at("timer_node_links"), &self.timer_node_links, &["timer_handle", "node_handle"])?;
        write_rows(&at("callback_objects"), &self.callback_objects, &["reference", "callback_object"])?;
        write_rows(&at("callback_symbols"), &self.callback_symbols, &["callback_object", "symbol"])?;
        write_rows(
            &at("callback_instances"),
            &self.callback_instances,
            &["callback_object", "timestamp", "duration"],
        )?;
        write_rows(
            &at("publish_instances"),
            &self.publish_instances,
            &["timestamp", "message", "layer", "publisher_handle"],
        )?;

        info!("Wrote synthetic trace tables to {}", ust.display());
        Ok(ust)
    }

    /// Publisher handle of `topic`, if the capture has one.
    pub fn publisher_of(&self, topic: &str) -> Option<Handle> {
        self.rcl_publishers
            .iter()
            .find(|r| r.topic_name == topic)
            .map(|r| r.handle as Handle)
    }

    /// Publish records as the correlator consumes them.
    pub fn publish_log(&self) -> Vec<PublishEvent> {
        self.publish_instances
            .iter()
            .map(|r| PublishEvent {
                layer: r.layer,
                timestamp: r.timestamp,
                message: r.message as Handle,
                publisher: r.publisher_handle.map(|h| h as Handle),
            })
            .collect()
    }

    /// rclcpp call instants of every publish by `publisher`, in order.
    pub fn call_sites(&self, publisher: Handle) -> Vec<Nanos> {
        self.publish_instances
            .iter()
            .filter(|r| r.layer == Layer::Rcl && r.publisher_handle == Some(publisher as i64))
            .map(|r| r.timestamp - RCL_DELAY)
            .collect()
    }
}
