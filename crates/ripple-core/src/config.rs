use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::record::Timestamp;

/// Project configuration, loaded from `.ripple/config.toml`.
///
/// Every field is optional in the file; a missing file means defaults.
/// Stages receive the relevant values explicitly rather than reading
/// ambient state, so tests can inject a fixed zone and cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippleConfig {
    /// Directory holding individual snapshot files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Path of the merged-table artifact, replaced on every merge run.
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,
    /// UTC offset of the local display zone, e.g. `-05:00`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// How many posts the retrieval layer pulls per source per snapshot.
    #[serde(default = "default_post_count")]
    pub post_count: u32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            table_path: default_table_path(),
            utc_offset: default_utc_offset(),
            post_count: default_post_count(),
        }
    }
}

impl RippleConfig {
    /// Parse the configured UTC offset into a zone.
    ///
    /// # Errors
    ///
    /// Fails with a clear message if the offset string is not of the
    /// `[+-]HH:MM` form.
    pub fn zone(&self) -> Result<FixedOffset> {
        self.utc_offset
            .parse::<FixedOffset>()
            .map_err(|e| anyhow::anyhow!("invalid utc_offset '{}': {e}", self.utc_offset))
    }

    /// Resolve a path relative to the project root.
    #[must_use]
    pub fn resolve(project_root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }
}

/// Load the project config, or defaults if no config file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<RippleConfig> {
    let path = project_root.join(".ripple/config.toml");
    if !path.exists() {
        return Ok(RippleConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<RippleConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// The start of the current local calendar day: the default filtering
/// cutoff.
///
/// Returns `None` only for offsets that push the date out of chrono's
/// representable range, which no real zone does.
#[must_use]
pub fn local_midnight(now: DateTime<Utc>, zone: FixedOffset) -> Option<Timestamp> {
    now.with_timezone(&zone)
        .date_naive()
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(zone)
        .single()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_table_path() -> PathBuf {
    PathBuf::from("tweets.json")
}

fn default_utc_offset() -> String {
    // America/Chicago, daylight time.
    "-05:00".to_string()
}

const fn default_post_count() -> u32 {
    100
}

#[cfg(test)]
mod tests {
    use super::{RippleConfig, load_config, local_midnight};
    use chrono::{DateTime, FixedOffset, Utc};
    use std::path::PathBuf;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(dir.path()).expect("load");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.table_path, PathBuf::from("tweets.json"));
        assert_eq!(cfg.utc_offset, "-05:00");
        assert_eq!(cfg.post_count, 100);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ripple_dir = dir.path().join(".ripple");
        std::fs::create_dir_all(&ripple_dir).expect("create dir");
        std::fs::write(
            ripple_dir.join("config.toml"),
            "utc_offset = \"+09:00\"\npost_count = 25\n",
        )
        .expect("write config");

        let cfg = load_config(dir.path()).expect("load");
        assert_eq!(cfg.utc_offset, "+09:00");
        assert_eq!(cfg.post_count, 25);
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn invalid_toml_fails_with_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ripple_dir = dir.path().join(".ripple");
        std::fs::create_dir_all(&ripple_dir).expect("create dir");
        std::fs::write(ripple_dir.join("config.toml"), "utc_offset = [nope").expect("write");

        let err = load_config(dir.path()).expect_err("must fail");
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn zone_parses_offsets() {
        let mut cfg = RippleConfig::default();
        assert_eq!(
            cfg.zone().expect("parse"),
            FixedOffset::west_opt(5 * 3600).expect("offset")
        );

        cfg.utc_offset = "+05:30".to_string();
        assert_eq!(
            cfg.zone().expect("parse"),
            FixedOffset::east_opt(5 * 3600 + 1800).expect("offset")
        );

        cfg.utc_offset = "central".to_string();
        assert!(cfg.zone().is_err());
    }

    #[test]
    fn local_midnight_is_start_of_local_day() {
        let zone = FixedOffset::west_opt(5 * 3600).expect("offset");
        // 01:30 UTC is 20:30 the previous day in -05:00.
        let now: DateTime<Utc> = "2026-08-30T01:30:00Z".parse().expect("parse");
        let midnight = local_midnight(now, zone).expect("midnight");
        assert_eq!(midnight.to_rfc3339(), "2026-08-29T00:00:00-05:00");
    }
}
