use std::time::Duration;

use crate::error::{Error, Result};
use crate::executor::join_endpoint;
use crate::presets::Preset;
use crate::runner::{Jitter, LoadConfig, PageRange, PageStrategy};
use crate::stats::DataClassification;
use crate::verdict::ThresholdPolicy;

pub const DEFAULT_PATH: &str = "/api/products";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Overrides coming from the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub preset: Option<Preset>,
    pub base_url: Option<String>,
    pub workers: Option<u64>,
    pub requests_per_worker: Option<u64>,
    pub size: Option<u64>,
    pub run_timeout: Option<Duration>,
}

/// Scenario settings as written in a run file (or supplied by a preset). Unset fields fall back.
#[derive(Debug, Clone, Default)]
pub struct ScenarioOptions {
    pub preset: Option<Preset>,
    pub base_url: Option<String>,
    pub path: Option<String>,

    pub workers: Option<u64>,
    pub requests_per_worker: Option<u64>,
    pub size: Option<u64>,
    pub pages: Option<PageRange>,
    pub page_strategy: Option<PageStrategy>,
    pub jitter: Option<Jitter>,

    pub request_timeout: Option<Duration>,
    pub run_timeout: Option<Duration>,
    pub classification: Option<DataClassification>,

    /// Threshold expressions, e.g. `success_rate >= 95`.
    pub thresholds: Vec<String>,
}

/// Fully resolved scenario, ready to run.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub endpoint: String,
    pub size: u64,
    pub pages: PageRange,
    pub page_strategy: PageStrategy,
    pub request_timeout: Duration,
    pub load: LoadConfig,
    pub policy: ThresholdPolicy,
}

/// Resolves a scenario: CLI overrides, then the run file, then the preset, then defaults.
pub fn scenario_from_options(opts: ScenarioOptions, cfg: RunConfig) -> Result<ScenarioConfig> {
    let preset = cfg.preset.or(opts.preset);
    let base = preset.map(Preset::options).unwrap_or_default();

    let base_url = cfg
        .base_url
        .or(opts.base_url)
        .or(base.base_url)
        .filter(|u| !u.trim().is_empty())
        .ok_or(Error::MissingBaseUrl)?;
    let path = opts
        .path
        .or(base.path)
        .unwrap_or_else(|| DEFAULT_PATH.to_string());
    let endpoint = join_endpoint(&base_url, &path)?;

    let size = cfg.size.or(opts.size).or(base.size).unwrap_or(1);
    if size == 0 {
        return Err(Error::InvalidSize);
    }

    let pages = opts.pages.or(base.pages).unwrap_or_default();
    pages.validate()?;

    let request_timeout = opts
        .request_timeout
        .or(base.request_timeout)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
    if request_timeout.is_zero() {
        return Err(Error::InvalidRequestTimeout);
    }

    let load = LoadConfig {
        workers: cfg.workers.or(opts.workers).or(base.workers).unwrap_or(1),
        requests_per_worker: cfg
            .requests_per_worker
            .or(opts.requests_per_worker)
            .or(base.requests_per_worker)
            .unwrap_or(1),
        jitter: opts.jitter.or(base.jitter),
        run_timeout: cfg.run_timeout.or(opts.run_timeout).or(base.run_timeout),
        classification: opts
            .classification
            .or(base.classification)
            .unwrap_or_default(),
        ..LoadConfig::default()
    };
    load.validate()?;

    let policy = if !opts.thresholds.is_empty() {
        ThresholdPolicy::parse(&opts.thresholds)?
    } else if let Some(preset) = preset {
        preset.policy()
    } else {
        ThresholdPolicy::default_policy()
    };

    Ok(ScenarioConfig {
        name: preset.map_or_else(|| "custom".to_string(), |p| p.to_string()),
        endpoint,
        size,
        pages,
        page_strategy: opts
            .page_strategy
            .or(base.page_strategy)
            .unwrap_or_default(),
        request_timeout,
        load,
        policy,
    })
}
