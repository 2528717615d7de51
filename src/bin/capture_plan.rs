//! Prints the tracing session commands for one capture of the reference system.
//!
//! `capture_plan [length_s]` (default 30 s).

use std::{env, error::Error, time::{SystemTime, UNIX_EPOCH}};

use rts_trace_analysis::capture::{CaptureConfig, DEFAULT_LENGTH_S};

fn main() -> Result<(), Box<dyn Error>> {
    let length = match env::args().nth(1) {
        Some(arg) => arg.parse::<f64>()?,
        None => DEFAULT_LENGTH_S,
    };
    let config = CaptureConfig::default().with_length(length);

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs().to_string();
    println!("# trace directory: {}", config.trace_dir(&timestamp).display());
    for cmd in config.commands(&timestamp) {
        println!("{}", cmd);
    }
    Ok(())
}
