//! Analysis configuration: which topology to extract and how to render it.
//!
//! Defaults describe the BehaviorPlanner node of the reference system. Setting
//! `TRACE_ANALYSIS_CONFIG` to a JSON file replaces them.

use std::{env, fs, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::correlator::Strategy;
use crate::error::Result;

pub const CONFIG_ENV: &str = "TRACE_ANALYSIS_CONFIG";

/// Where marker colours come from on the time chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColourSource {
    /// One colour per series kind (subscriptions red, timer blue, publications green).
    #[default]
    Fixed,
    /// Colour of the timer instance each event feeds (subscriptions) or results from (publications).
    TimerBands,
}

/// One subscription row of the time chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    pub topic: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub include_title: bool,
    pub png: bool,
    pub svg: bool,
    pub html: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_title: false,
            png: true,
            svg: true,
            html: true,
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Node owning the timer and the subscriptions.
    pub node: String,
    pub subscriptions: Vec<SubscriptionSpec>,
    pub publisher_topic: String,
    /// Instances per subscription row; timer and publication rows get one more.
    pub instances: usize,
    /// Leading instances skipped on every row.
    pub skip: usize,
    pub colour_source: ColourSource,
    pub strategy: Strategy,
    /// Artifact name prefix, e.g. `<trace-dir>/<prefix>_timer.png`.
    pub prefix: String,
    pub render: RenderOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let topics = [
            "/ObjectCollisionEstimator",
            "/NDTLocalizer",
            "/Lanelet2GlobalPlanner",
            "/Lanelet2MapLoader",
            "/ParkingPlanner",
            "/LanePlanner",
        ];
        Self {
            node: "BehaviorPlanner".into(),
            subscriptions: topics
                .iter()
                .enumerate()
                .map(|(i, t)| SubscriptionSpec {
                    topic: (*t).into(),
                    label: format!("sub. {}", i + 1),
                })
                .collect(),
            publisher_topic: "/BehaviorPlanner".into(),
            instances: 4,
            skip: 0,
            colour_source: ColourSource::Fixed,
            strategy: Strategy::Linear,
            prefix: "5_analysis".into(),
            render: RenderOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults, or the JSON file named by `TRACE_ANALYSIS_CONFIG`.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => {
                info!("Loading analysis config from {}", path);
                Self::from_json_file(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_behavior_planner() {
        let c = PipelineConfig::default();
        assert_eq!(c.subscriptions.len(), 6);
        assert_eq!(c.subscriptions[0].label, "sub. 1");
        assert_eq!(c.subscriptions[5].topic, "/LanePlanner");
        assert_eq!(c.instances, 4);
        assert!(!c.render.include_title);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: PipelineConfig = serde_json::from_str(
            r#"{ "instances": 8, "colour_source": "timer_bands", "strategy": "indexed",
                 "render": { "html": false } }"#,
        )
        .unwrap();
        assert_eq!(c.instances, 8);
        assert_eq!(c.colour_source, ColourSource::TimerBands);
        assert_eq!(c.strategy, Strategy::Indexed);
        assert!(!c.render.html);
        assert!(c.render.png);
        assert_eq!(c.node, "BehaviorPlanner");
    }

    #[test]
    fn bad_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ instances: ").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(crate::error::AnalysisError::Config(_))
        ));
    }
}
