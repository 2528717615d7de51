//! Event Table: the decoded tables of one trace capture, owned by a `TraceSession`.
//!
//! Tables are CSV exports under `<trace-dir>/ust/`, loaded once with polars and queried
//! read-only afterwards (filter by column, project column, iterate rows).
//! Handles and message tokens are signed decimal integers; times are nanoseconds.

use std::{
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use polars::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::trace::model::{CallbackInvocation, Handle, Layer, NANOS_PER_MS, PublishEvent};

/// Sub-directory of a trace holding the user-space tables.
pub const UST_DIR: &str = "ust";

/// Raw tables of a capture, one DataFrame per CSV file.
#[derive(Debug, Clone, Default)]
pub struct TraceTables {
    pub nodes: DataFrame,
    pub rcl_publishers: DataFrame,
    pub rcl_subscriptions: DataFrame,
    pub subscription_objects: DataFrame,
    pub timers: DataFrame,
    pub timer_node_links: DataFrame,
    pub callback_objects: DataFrame,
    pub callback_symbols: DataFrame,
    pub callback_instances: DataFrame,
    pub publish_instances: DataFrame,
}

/// A loaded capture. Single writer (`load`), read-only afterwards.
#[derive(Debug, Clone)]
pub struct TraceSession {
    dir: PathBuf,
    tables: TraceTables,
}

impl TraceSession {
    /// Loads every table of `<trace_dir>/ust/`. A missing table is an I/O error.
    pub fn load(trace_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = trace_dir.as_ref().to_path_buf();
        let ust = dir.join(UST_DIR);
        let read = |name: &str| read_table(&ust.join(format!("{}.csv", name)));

        let tables = TraceTables {
            nodes: read("nodes")?,
            rcl_publishers: read("rcl_publishers")?,
            rcl_subscriptions: read("rcl_subscriptions")?,
            subscription_objects: read("subscription_objects")?,
            timers: read("timers")?,
            timer_node_links: read("timer_node_links")?,
            callback_objects: read("callback_objects")?,
            callback_symbols: read("callback_symbols")?,
            callback_instances: read("callback_instances")?,
            publish_instances: read("publish_instances")?,
        };

        info!(
            "Loaded trace {:?}: {} nodes, {} callback instances, {} publish instances",
            dir,
            tables.nodes.height(),
            tables.callback_instances.height(),
            tables.publish_instances.height()
        );

        Ok(Self { dir, tables })
    }

    /// Wraps already-built tables (tests, synthetic captures).
    pub fn from_tables(dir: impl Into<PathBuf>, tables: TraceTables) -> Self {
        Self { dir: dir.into(), tables }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn publisher_handles(&self, topic: &str) -> Result<Vec<Handle>> {
        handles(select_i64(
            &self.tables.rcl_publishers,
            col("topic_name").eq(lit(topic)),
            "publisher_handle",
        )?)
    }

    pub fn subscription_handles(&self, topic: &str) -> Result<Vec<Handle>> {
        handles(select_i64(
            &self.tables.rcl_subscriptions,
            col("topic_name").eq(lit(topic)),
            "subscription_handle",
        )?)
    }

    pub fn node_handles(&self, name: &str) -> Result<Vec<Handle>> {
        handles(select_i64(&self.tables.nodes, col("name").eq(lit(name)), "node_handle")?)
    }

    /// Callback objects of the symbol registry, in table order.
    pub fn callback_objects(&self) -> Result<Vec<Handle>> {
        handles(select_i64(&self.tables.callback_symbols, lit(true), "callback_object")?)
    }

    /// Describes who owns a callback object, e.g.
    /// `Timer -- node: BehaviorPlanner, tid: 42, period: 100 ms`.
    /// Returns `None` when the object is neither a timer nor a subscription callback.
    pub fn callback_owner_info(&self, callback_object: Handle) -> Result<Option<String>> {
        let references = select_i64(
            &self.tables.callback_objects,
            key_eq("callback_object", callback_object),
            "reference",
        )?;
        let Some(&reference) = references.first() else {
            return Ok(None);
        };
        let reference = reference as Handle;

        if let Some(info) = self.timer_info(reference)? {
            return Ok(Some(format!("Timer -- {}", info)));
        }
        if let Some(info) = self.subscription_info(reference)? {
            return Ok(Some(format!("Subscription -- {}", info)));
        }
        Ok(None)
    }

    /// Every recorded invocation of `callback_object`, in capture order.
    pub fn callback_durations(&self, callback_object: Handle) -> Result<Vec<CallbackInvocation>> {
        let out = self
            .tables
            .callback_instances
            .clone()
            .lazy()
            .filter(key_eq("callback_object", callback_object))
            .select([
                col("timestamp").cast(DataType::Int64),
                col("duration").cast(DataType::Int64),
            ])
            .collect()?;

        let timestamps = out.column("timestamp")?.i64()?;
        let durations = out.column("duration")?.i64()?;

        let mut invocations = Vec::with_capacity(out.height());
        for i in 0..out.height() {
            let (Some(start), Some(duration)) = (timestamps.get(i), durations.get(i)) else {
                return Err(malformed("callback_instances", i, "timestamp/duration"));
            };
            invocations.push(CallbackInvocation { owner: callback_object, start, duration });
        }

        debug!("callback 0x{:x}: {} instances", callback_object, invocations.len());
        Ok(invocations)
    }

    /// All publish calls across layers and publishers, stably ordered by timestamp.
    pub fn publish_instances(&self) -> Result<Vec<PublishEvent>> {
        let out = self
            .tables
            .publish_instances
            .clone()
            .lazy()
            .select([
                col("timestamp").cast(DataType::Int64),
                col("message").cast(DataType::Int64),
                col("layer").cast(DataType::String),
                col("publisher_handle").cast(DataType::Int64),
            ])
            .collect()?;

        let timestamps = out.column("timestamp")?.i64()?;
        let messages = out.column("message")?.i64()?;
        let layers = out.column("layer")?.str()?;
        let publishers = out.column("publisher_handle")?.i64()?;

        let mut events = Vec::with_capacity(out.height());
        for i in 0..out.height() {
            let timestamp = timestamps
                .get(i)
                .ok_or_else(|| malformed("publish_instances", i, "timestamp"))?;
            let message = messages
                .get(i)
                .ok_or_else(|| malformed("publish_instances", i, "message"))?;
            let layer: Layer = layers
                .get(i)
                .ok_or_else(|| malformed("publish_instances", i, "layer"))?
                .parse()?;

            events.push(PublishEvent {
                layer,
                timestamp,
                message: message as Handle,
                publisher: publishers.get(i).map(|h| h as Handle),
            });
        }

        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn timer_info(&self, timer_handle: Handle) -> Result<Option<String>> {
        let key = || key_eq("timer_handle", timer_handle);
        let Some(&period) = select_i64(&self.tables.timers, key(), "period")?.first() else {
            return Ok(None);
        };
        let tid = select_i64(&self.tables.timers, key(), "tid")?.first().copied().unwrap_or(0);
        let node_handle = select_i64(&self.tables.timer_node_links, key(), "node_handle")?
            .first()
            .map(|h| *h as Handle);
        let node_name = match node_handle {
            Some(h) => self.node_name(h)?,
            None => None,
        };

        Ok(Some(format!(
            "node: {}, tid: {}, period: {} ms",
            node_name.as_deref().unwrap_or("unknown"),
            tid,
            period as f64 / NANOS_PER_MS
        )))
    }

    fn subscription_info(&self, subscription: Handle) -> Result<Option<String>> {
        let Some(&sub_handle) = select_i64(
            &self.tables.subscription_objects,
            key_eq("subscription", subscription),
            "subscription_handle",
        )?
        .first() else {
            return Ok(None);
        };
        let sub_handle = sub_handle as Handle;

        let key = || key_eq("subscription_handle", sub_handle);
        let topic = select_str(&self.tables.rcl_subscriptions, key(), "topic_name")?
            .into_iter()
            .next()
            .unwrap_or_default();
        let node_handle = select_i64(&self.tables.rcl_subscriptions, key(), "node_handle")?
            .first()
            .map(|h| *h as Handle);

        let (node_name, tid) = match node_handle {
            Some(h) => (self.node_name(h)?, self.node_tid(h)?),
            None => (None, None),
        };

        Ok(Some(format!(
            "node: {}, tid: {}, topic: {}",
            node_name.as_deref().unwrap_or("unknown"),
            tid.unwrap_or(0),
            topic
        )))
    }

    fn node_name(&self, node_handle: Handle) -> Result<Option<String>> {
        Ok(select_str(&self.tables.nodes, key_eq("node_handle", node_handle), "name")?
            .into_iter()
            .next())
    }

    fn node_tid(&self, node_handle: Handle) -> Result<Option<i64>> {
        Ok(select_i64(&self.tables.nodes, key_eq("node_handle", node_handle), "tid")?
            .first()
            .copied())
    }
}

/// Reads one CSV table (header row required).
fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalysisError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("missing trace table {}", path.display()),
        )));
    }

    let df = LazyCsvReader::new(path).with_has_header(true).finish()?.collect()?;
    debug!("read {} ({} rows)", path.display(), df.height());
    Ok(df)
}

/// Equality filter on an integer handle column. The literal is typed so it is never
/// widened past Int64.
fn key_eq(column: &str, value: Handle) -> Expr {
    col(column).cast(DataType::Int64).eq(lit(Scalar::from(value as i64)))
}

/// Filters `df` and projects one column as integers; nulls are dropped.
fn select_i64(df: &DataFrame, predicate: Expr, column: &str) -> Result<Vec<i64>> {
    let out = df
        .clone()
        .lazy()
        .filter(predicate)
        .select([col(column).cast(DataType::Int64)])
        .collect()?;
    Ok(out.column(column)?.i64()?.into_iter().flatten().collect())
}

/// Filters `df` and projects one column as strings; nulls are dropped.
fn select_str(df: &DataFrame, predicate: Expr, column: &str) -> Result<Vec<String>> {
    let out = df
        .clone()
        .lazy()
        .filter(predicate)
        .select([col(column).cast(DataType::String)])
        .collect()?;
    Ok(out
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_owned)
        .collect())
}

fn handles(raw: Vec<i64>) -> Result<Vec<Handle>> {
    Ok(raw.into_iter().map(|h| h as Handle).collect())
}

fn malformed(table: &str, row: usize, field: &str) -> AnalysisError {
    AnalysisError::MalformedTable(format!("{}: row {} has no {}", table, row, field))
}
