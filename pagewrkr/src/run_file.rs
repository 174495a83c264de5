use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use pagewrkr_core::runner::{Jitter, PageRange, PageStrategy};
use pagewrkr_core::{DataClassification, Preset, ScenarioOptions};
use serde::Deserialize;

/// YAML run file. Every field is optional; unset fields come from the preset or defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct RunFile {
    pub base_url: Option<String>,
    pub path: Option<String>,
    pub preset: Option<Preset>,

    pub workers: Option<u64>,
    pub requests_per_worker: Option<u64>,
    pub size: Option<u64>,
    pub pages: Option<PageRange>,
    pub page_strategy: Option<PageStrategy>,
    pub jitter: Option<JitterYaml>,

    pub request_timeout: Option<YamlDuration>,
    pub run_timeout: Option<YamlDuration>,
    pub data_classification: Option<DataClassification>,

    #[serde(default)]
    pub thresholds: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct JitterYaml {
    #[serde(default)]
    pub min: YamlDuration,
    pub max: YamlDuration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    fn into_inner(self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl<'de> serde::de::Visitor<'de> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a duration string (e.g. 10s, 250ms) or a number of seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v < 0 {
                    return Err(E::custom("duration must not be negative"));
                }
                Ok(YamlDuration(Duration::from_secs(v as u64)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("duration must be a finite, non-negative number"));
                }
                Ok(YamlDuration(Duration::from_secs_f64(v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v).map_err(E::custom)?;
                Ok(YamlDuration(d))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_any(V)
    }
}

impl From<RunFile> for ScenarioOptions {
    fn from(f: RunFile) -> Self {
        ScenarioOptions {
            preset: f.preset,
            base_url: f.base_url,
            path: f.path,
            workers: f.workers,
            requests_per_worker: f.requests_per_worker,
            size: f.size,
            pages: f.pages,
            page_strategy: f.page_strategy,
            jitter: f
                .jitter
                .map(|j| Jitter::new(j.min.into_inner(), j.max.into_inner())),
            request_timeout: f.request_timeout.map(YamlDuration::into_inner),
            run_timeout: f.run_timeout.map(YamlDuration::into_inner),
            classification: f.data_classification,
            thresholds: f.thresholds,
        }
    }
}

pub(crate) fn parse_run_file(raw: &str) -> anyhow::Result<RunFile> {
    if raw.trim().is_empty() {
        return Ok(RunFile::default());
    }
    serde_yaml::from_str(raw).context("failed to parse run file")
}

pub(crate) async fn load_run_file(path: &Path) -> anyhow::Result<RunFile> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read run file: {}", path.display()))?;
    parse_run_file(&raw).with_context(|| format!("invalid run file: {}", path.display()))
}
