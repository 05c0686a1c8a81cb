use anyhow::{Context, anyhow};
use chrono::{FixedOffset, TimeDelta};
use playout_core::BuilderSettings;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// Source that produced the scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulingConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Engine settings. Every field is optional in the file; missing fields
/// take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// How many days ahead a build reaches from the current time.
    pub days_to_build: u32,
    /// How far back finished items are kept, as a humantime string such as
    /// `"4h"` or `"1day 6h"`.
    pub trim_history: String,
    /// Rule visits at an unchanged clock before a build is aborted as a
    /// scheduling loop.
    pub loop_detection_threshold: u32,
    /// Leave out items whose files are missing or unavailable instead of
    /// scheduling them.
    pub skip_missing_items: bool,
    /// Fixed base seed for brand-new enumerator states. Leave unset in
    /// production; set it to make builds reproducible.
    pub seed: Option<u64>,
    /// Channel-local offset from UTC in minutes. Day boundaries and fixed
    /// start times are evaluated in this offset.
    pub utc_offset_minutes: i32,
    pub logging: LoggingConfig,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            days_to_build: 2,
            trim_history: "4h".to_string(),
            loop_detection_threshold: 6,
            skip_missing_items: false,
            seed: None,
            utc_offset_minutes: 0,
            logging: LoggingConfig::default(),
        }
    }
}

impl SchedulingConfig {
    /// Load configuration using environment variables.
    /// Evaluation order:
    /// 1) `$PLAYOUT_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$PLAYOUT_CONFIG_JSON` (inline JSON),
    /// 3) `playout.toml`, `playout.json`, `config/playout.toml` or
    ///    `config/playout.json` in the working directory,
    /// 4) defaults.
    pub fn load_from_env() -> anyhow::Result<(Self, SchedulingConfigSource)> {
        if let Ok(path_str) = env::var("PLAYOUT_CONFIG_PATH")
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, SchedulingConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var("PLAYOUT_CONFIG_JSON")
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw).context("failed to parse PLAYOUT_CONFIG_JSON")?;
            return Ok((parsed, SchedulingConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file(Path::new(".")) {
            let config = Self::load_from_file(&path)?;
            return Ok((config, SchedulingConfigSource::File(path)));
        }

        Ok((Self::default(), SchedulingConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read playout config from {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents)
                .with_context(|| format!("invalid playout config {}", path.display())),
            Some("toml") | Some("tml") => toml::from_str(&contents)
                .map_err(|err| anyhow!("invalid playout config {}: {}", path.display(), err)),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse playout config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("invalid playout config json: {err}"))
    }

    /// First default config file under `root`.
    pub fn find_default_file(root: &Path) -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "playout.toml",
            "playout.json",
            "config/playout.toml",
            "config/playout.json",
        ];

        CANDIDATES
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.exists())
    }

    pub fn trim_history(&self) -> Result<TimeDelta, ConfigError> {
        let parsed = humantime::parse_duration(self.trim_history.trim()).map_err(|source| {
            ConfigError::InvalidTrimHistory {
                value: self.trim_history.clone(),
                source,
            }
        })?;
        TimeDelta::from_std(parsed)
            .map_err(|_| ConfigError::TrimHistoryOutOfRange(self.trim_history.clone()))
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_minutes));
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or(ConfigError::InvalidUtcOffset(self.utc_offset_minutes))
    }

    /// The core builder settings described by this configuration.
    pub fn builder_settings(&self) -> Result<BuilderSettings, ConfigError> {
        if self.loop_detection_threshold < 2 {
            return Err(ConfigError::LoopThresholdTooSmall);
        }

        Ok(BuilderSettings {
            days_to_build: self.days_to_build,
            trim_history: self.trim_history()?,
            loop_detection_threshold: self.loop_detection_threshold,
            skip_missing_items: self.skip_missing_items,
            seed: self.seed,
            utc_offset: self.utc_offset()?,
        })
    }
}
