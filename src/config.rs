// =============================================================================
// Scan Configuration — Tunable pipeline parameters with atomic save
// =============================================================================
//
// The two constants the legacy scanner hard-coded without any documented
// sensitivity analysis live here as configuration with the legacy defaults:
// the ADMF smoothing length (14) and the near-zero threshold (0.2) used by
// the oscillation statistics.
//
// The moving-average windows {5, 20, 60} and the oscillation horizons
// {22, 44, 66, 88} are NOT configurable: the output field names (`ma5`,
// `admf_1m`, ...) encode them, so changing them would silently break every
// downstream consumer of the records.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_admf_length() -> usize {
    14
}

fn default_near_zero_threshold() -> f64 {
    0.2
}

// =============================================================================
// ScanConfig
// =============================================================================

/// Tunable parameters for the per-instrument indicator pipeline.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Wilder smoothing length for the ADMF oscillator.
    #[serde(default = "default_admf_length")]
    pub admf_length: usize,

    /// Fraction of the window's peak magnitude below which a normalized
    /// oscillator value counts as "near zero" (0.2 = within 20% of the peak).
    #[serde(default = "default_near_zero_threshold")]
    pub near_zero_threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            admf_length: default_admf_length(),
            near_zero_threshold: default_near_zero_threshold(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scan config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scan config from {}", path.display()))?;

        info!(
            path = %path.display(),
            admf_length = config.admf_length,
            near_zero_threshold = config.near_zero_threshold,
            "scan config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise scan config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "scan config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.admf_length, 14);
        assert!((cfg.near_zero_threshold - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ScanConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.admf_length, 14);
        assert!((cfg.near_zero_threshold - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "admf_length": 21 }"#;
        let cfg: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.admf_length, 21);
        assert!((cfg.near_zero_threshold - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = ScanConfig {
            admf_length: 10,
            near_zero_threshold: 0.25,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.admf_length, cfg2.admf_length);
        assert!((cfg.near_zero_threshold - cfg2.near_zero_threshold).abs() < f64::EPSILON);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_config.json");

        let cfg = ScanConfig {
            admf_length: 7,
            near_zero_threshold: 0.3,
        };
        cfg.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded.admf_length, 7);
        assert!((loaded.near_zero_threshold - 0.3).abs() < f64::EPSILON);

        // The tmp sibling must not survive a successful save.
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(ScanConfig::load("/nonexistent/scan_config.json").is_err());
    }
}
