/*
This benchmark compares the two publish correlation strategies on synthetic capture logs of
growing length. Linear scans walk the whole event log around every rcl publish; Indexed scans
walk a per-address position list built once per run. Both must produce the same instants.
*/

use criterion::{
    criterion_group,
    criterion_main,
    Criterion,
    BenchmarkId,
};

use rts_trace_analysis::{
    analysis::correlator::{correlate, Strategy},
    synth::{generate, SynthConfig},
};
use std::hint::black_box;

//Capture lengths (seconds) of the synthetic logs
const DURATIONS_S: &[f64] = &[5.0, 20.0, 60.0];

fn bench_correlate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Correlate_publish_times");

    for &duration_s in DURATIONS_S {
        let trace = generate(&SynthConfig { duration_s, ..SynthConfig::default() });
        let events = trace.publish_log();
        let Some(publisher) = trace.publisher_of("/BehaviorPlanner") else {
            continue;
        };

        for strategy in [Strategy::Linear, Strategy::Indexed] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), events.len()),
                &events,
                |b, events| {
                    b.iter(|| correlate(black_box(events), black_box(publisher), strategy));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_correlate);
criterion_main!(benches);
