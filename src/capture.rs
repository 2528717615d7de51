//! Capture configuration: the tracing session that records a run of the reference system.
//!
//! The analysis never drives the tracer itself; `commands` spells out the session so a
//! capture can be reproduced by hand or by a launch script:
//! - create the session (optionally suffixed with a timestamp) under `base_path`
//! - enable the `ros2:*` user-space events and the kernel events below
//! - launch the executable, let it run for `length_s`, then interrupt and tear down

use std::path::PathBuf;

pub const DEFAULT_LENGTH_S: f64 = 30.0;

/// Scheduler, IRQ, statedump, block, migration, power, network and hrtimer events.
pub const KERNEL_EVENTS: &[&str] = &[
    "sched_switch",
    "sched_waking",
    "sched_pi_setprio",
    "sched_process_fork",
    "sched_process_exit",
    "sched_process_free",
    "sched_wakeup",
    "irq_softirq_entry",
    "irq_softirq_raise",
    "irq_softirq_exit",
    "irq_handler_entry",
    "irq_handler_exit",
    "lttng_statedump_process_state",
    "lttng_statedump_start",
    "lttng_statedump_end",
    "lttng_statedump_network_interface",
    "lttng_statedump_block_device",
    "block_rq_complete",
    "block_rq_insert",
    "block_rq_issue",
    "block_bio_frontmerge",
    "sched_migrate",
    "sched_migrate_task",
    "power_cpu_frequency",
    "net_dev_queue",
    "netif_receive_skb",
    "net_if_receive_skb",
    "timer_hrtimer_start",
    "timer_hrtimer_cancel",
    "timer_hrtimer_expire_entry",
    "timer_hrtimer_expire_exit",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub session_name: String,
    pub append_timestamp: bool,
    pub base_path: PathBuf,
    pub events_ust: Vec<String>,
    pub events_kernel: Vec<String>,
    pub package: String,
    pub executable: String,
    /// Run length in seconds before the system is interrupted.
    pub length_s: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            session_name: "system".into(),
            append_timestamp: true,
            base_path: PathBuf::from("."),
            events_ust: vec!["ros2:*".into()],
            events_kernel: KERNEL_EVENTS.iter().map(|e| (*e).to_string()).collect(),
            package: "autoware_reference_system".into(),
            executable: "autoware_default_multithreaded".into(),
            length_s: DEFAULT_LENGTH_S,
        }
    }
}

impl CaptureConfig {
    pub fn with_length(mut self, length_s: f64) -> Self {
        self.length_s = length_s;
        self
    }

    /// Session name, suffixed with `timestamp` when `append_timestamp` is set.
    pub fn session(&self, timestamp: &str) -> String {
        if self.append_timestamp {
            format!("{}-{}", self.session_name, timestamp)
        } else {
            self.session_name.clone()
        }
    }

    /// Directory the capture is written to; it becomes the analysis argument.
    pub fn trace_dir(&self, timestamp: &str) -> PathBuf {
        self.base_path.join(self.session(timestamp))
    }

    /// Ordered shell commands of one capture.
    pub fn commands(&self, timestamp: &str) -> Vec<String> {
        let session = self.session(timestamp);
        let mut cmds = vec![format!(
            "lttng create {} --output={}",
            session,
            self.trace_dir(timestamp).display()
        )];

        if !self.events_ust.is_empty() {
            cmds.push(format!("lttng enable-event --userspace {}", self.events_ust.join(",")));
            cmds.push("lttng add-context --userspace --type=vpid --type=vtid --type=procname".into());
        }
        if !self.events_kernel.is_empty() {
            cmds.push(format!("lttng enable-event --kernel {}", self.events_kernel.join(",")));
            cmds.push("lttng add-context --kernel --type=tid --type=pid --type=procname".into());
        }

        cmds.push("lttng start".into());
        cmds.push(format!("ros2 run {} {} &", self.package, self.executable));
        cmds.push(format!("sleep {}", self.length_s));
        cmds.push("kill -INT $!".into());
        cmds.push("lttng stop".into());
        cmds.push(format!("lttng destroy {}", session));
        cmds
    }
}
