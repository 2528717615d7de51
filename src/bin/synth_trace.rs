//! Writes a synthetic capture of the reference topology.
//!
//! `synth_trace <out-dir> [seed] [duration_s]`; the result can be passed straight to
//! `trace_analysis`.

use std::{env, error::Error, path::PathBuf, process};

use log::info;

use rts_trace_analysis::synth::{self, SynthConfig};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(out) = args.first() else {
        println!("usage: synth_trace <out-dir> [seed] [duration_s]");
        process::exit(1);
    };

    let mut config = SynthConfig::default();
    if let Some(seed) = args.get(1) {
        config.seed = seed.parse()?;
    }
    if let Some(duration) = args.get(2) {
        config.duration_s = duration.parse()?;
    }

    let out = PathBuf::from(out);
    let ust = synth::generate(&config).write_tables(&out)?;
    info!("seed {}, {} s", config.seed, config.duration_s);
    println!("Synthetic trace written to {}", ust.display());
    Ok(())
}
