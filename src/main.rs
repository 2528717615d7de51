//! # Trace analysis entry point
//!
//! `trace_analysis <trace-dir>` loads one capture, extracts the configured topology and
//! writes the timer plot, the time chart and the derived series beside the trace.
//!
//! ## Configuration
//! - `TRACE_ANALYSIS_CONFIG` — JSON file overriding the BehaviorPlanner defaults.
//! - `RUST_LOG` — log level (`info` shows each phase).

use std::{env, error::Error, path::PathBuf, process};

use log::{error, info};

use rts_trace_analysis::{analysis::pipeline, config::PipelineConfig, error::AnalysisError};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 1 {
        println!("{}", AnalysisError::MalformedArguments);
        process::exit(1);
    }

    let trace_dir = PathBuf::from(args[0].trim_end_matches('/'));
    println!("Trace directory: {}", trace_dir.display());

    let config = PipelineConfig::from_env()?;
    info!("Analysing node {} ({} subscriptions)", config.node, config.subscriptions.len());

    match pipeline::run(&trace_dir, &config) {
        Ok(report) => {
            if report.collisions > 0 {
                println!("{} publication(s) had ambiguous message addresses", report.collisions);
            }
            for path in &report.artifacts {
                println!("Wrote {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            error!("Analysis of {} failed: {}", trace_dir.display(), e);
            Err(e.into())
        }
    }
}
