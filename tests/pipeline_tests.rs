//! End-to-end runs over synthetic captures written to a temporary trace directory.

use std::fs;

use rts_trace_analysis::{
    analysis::{
        correlator::{self, Strategy},
        intervals, pipeline,
        resolver::{self, Role},
    },
    config::{PipelineConfig, RenderOptions},
    error::AnalysisError,
    synth::{self, SynthConfig, SynthTrace},
    trace::{Layer, TraceSession},
};
use tempfile::TempDir;

fn synthetic() -> SynthTrace {
    synth::generate(&SynthConfig { duration_s: 3.0, ..SynthConfig::default() })
}

fn written(trace: &SynthTrace) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    trace.write_tables(dir.path()).unwrap();
    dir
}

fn quick_config() -> PipelineConfig {
    PipelineConfig {
        render: RenderOptions { png: false, svg: true, html: true, ..RenderOptions::default() },
        ..PipelineConfig::default()
    }
}

#[test]
fn resolves_reference_topology() {
    let dir = written(&synthetic());
    let session = TraceSession::load(dir.path()).unwrap();

    let publisher = resolver::resolve(&session, Role::Publisher, "/BehaviorPlanner").unwrap();
    assert_eq!(Some(publisher), synthetic().publisher_of("/BehaviorPlanner"));
    resolver::resolve(&session, Role::Node, "BehaviorPlanner").unwrap();

    let timer = intervals::timer_ranges(&session, "BehaviorPlanner").unwrap();
    assert_eq!(timer.len(), 30);
    assert!(timer.windows(2).all(|w| w[0].begin < w[1].begin));
    assert!(timer.iter().all(|r| r.end == r.begin + r.duration));

    for spec in &PipelineConfig::default().subscriptions {
        let times = intervals::subscription_times(&session, &spec.topic, Some("BehaviorPlanner")).unwrap();
        assert!(!times.is_empty(), "{} has no callbacks", spec.topic);
    }
}

#[test]
fn publication_instants_are_call_midpoints() {
    let trace = synthetic();
    let dir = written(&trace);
    let session = TraceSession::load(dir.path()).unwrap();
    let publisher = trace.publisher_of("/BehaviorPlanner").unwrap();

    let expected: Vec<f64> = trace
        .call_sites(publisher)
        .iter()
        .map(|&t| correlator::midpoint(t, t + 3_400))
        .collect();

    for strategy in [Strategy::Linear, Strategy::Indexed] {
        let report = correlator::publish_times(&session, "/BehaviorPlanner", strategy).unwrap();
        assert_eq!(report.instants, expected);
        assert!(report.collisions.is_empty());
    }
}

#[test]
fn full_run_writes_artifacts_beside_trace() {
    let dir = written(&synthetic());
    let report = pipeline::run(dir.path(), &quick_config()).unwrap();

    for name in [
        "5_analysis_timer.svg",
        "5_analysis_time_chart.svg",
        "5_analysis_timer.html",
        "5_analysis_time_chart.html",
        "5_analysis_timer.csv",
        "5_analysis_durations.csv",
        "5_analysis_timer_stats.csv",
    ] {
        let path = dir.path().join(name);
        assert!(report.artifacts.contains(&path), "{} not reported", name);
        assert!(fs::metadata(&path).unwrap().len() > 0, "{} is empty", name);
    }

    let stats = report.stats.unwrap();
    assert_eq!(stats.count, 29);
    assert!((stats.period_mean_ms - 100.0).abs() < 5.0);
    assert_eq!(report.collisions, 0);
}

#[test]
fn bitmap_output_renders() {
    let dir = written(&synthetic());
    let config = PipelineConfig {
        render: RenderOptions { png: true, svg: false, html: false, include_title: true, ..RenderOptions::default() },
        ..PipelineConfig::default()
    };
    pipeline::run(dir.path(), &config).unwrap();
    assert!(dir.path().join("5_analysis_timer.png").exists());
    assert!(dir.path().join("5_analysis_time_chart.png").exists());
}

#[test]
fn unknown_publisher_aborts_run() {
    let dir = written(&synthetic());
    let config = PipelineConfig { publisher_topic: "/Nowhere".into(), ..quick_config() };
    match pipeline::run(dir.path(), &config) {
        Err(AnalysisError::AmbiguousOrMissingHandle { count: 0, .. }) => {}
        other => panic!("unexpected result: {:?}", other.map(|r| r.artifacts)),
    }
    assert!(!dir.path().join("5_analysis_time_chart.svg").exists());
}

#[test]
fn dropped_transport_record_is_unmatched() {
    let mut trace = synthetic();
    let publisher = trace.publisher_of("/BehaviorPlanner").unwrap() as i64;
    let last_rcl = trace
        .publish_instances
        .iter()
        .rposition(|r| r.layer == Layer::Rcl && r.publisher_handle == Some(publisher))
        .unwrap();
    let message = trace.publish_instances[last_rcl].message;
    let rmw = last_rcl
        + trace.publish_instances[last_rcl..]
            .iter()
            .position(|r| r.layer == Layer::Rmw && r.message == message)
            .unwrap();
    trace.publish_instances.remove(rmw);

    let dir = written(&trace);
    let session = TraceSession::load(dir.path()).unwrap();
    let err = correlator::publish_times(&session, "/BehaviorPlanner", Strategy::Linear).unwrap_err();
    assert!(matches!(err, AnalysisError::UnmatchedPublishEvent { missing: "rmw", .. }));
}

#[test]
fn missing_table_is_io_error() {
    let dir = written(&synthetic());
    fs::remove_file(dir.path().join("ust").join("timers.csv")).unwrap();
    assert!(matches!(TraceSession::load(dir.path()), Err(AnalysisError::Io(_))));
}

#[test]
fn json_config_selects_topology() {
    let dir = written(&synthetic());
    let config_path = dir.path().join("analysis.json");
    fs::write(
        &config_path,
        r#"{
            "subscriptions": [{ "topic": "/LanePlanner", "label": "lane" }],
            "instances": 2,
            "strategy": "indexed",
            "prefix": "lane_only",
            "render": { "png": false, "svg": false }
        }"#,
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.node, "BehaviorPlanner");
    assert_eq!(config.strategy, Strategy::Indexed);

    let report = pipeline::run(dir.path(), &config).unwrap();
    assert!(dir.path().join("lane_only_time_chart.html").exists());
    assert!(report.artifacts.iter().all(|p| !p.extension().is_some_and(|e| e == "svg")));
}
