//! Configuration module — user-wide defaults from
//! `~/.config/seqdrill/config.toml` (platform-appropriate equivalent).
//!
//! `ScanOptions` passed to `Scanner::new` can override any field here at
//! call time; CLI flags override `ScanOptions` in turn.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::erasable::Policy;
use crate::ScanOptions;

/// seqdrill configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
}

/// Scan policy defaults, named exactly after the spec's knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub strict: bool,
    pub chunk_size_bytes: usize,
    pub include_non_bio_mismatches: bool,
    pub allow_sam_regen: bool,
    pub prefer_sra_over_fastq: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            strict: true,
            chunk_size_bytes: 4 * 1024 * 1024,
            include_non_bio_mismatches: false,
            allow_sam_regen: true,
            prefer_sra_over_fastq: false,
        }
    }
}

impl ScanConfig {
    pub fn to_scan_options(&self) -> ScanOptions {
        ScanOptions {
            strict: self.strict,
            chunk_size_bytes: self.chunk_size_bytes,
            include_non_bio_mismatches: self.include_non_bio_mismatches,
            policy: Policy {
                allow_sam_regen: self.allow_sam_regen,
                prefer_sra_over_fastq: self.prefer_sra_over_fastq,
            },
        }
    }
}

impl Config {
    /// Load config from default path or return defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path: `~/.config/seqdrill/config.toml`, falling
    /// back to a bare home-relative path if `ProjectDirs` can't resolve.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "seqdrill")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".seqdrill")
                    .join("config.toml")
            })
    }

    /// Check if config file exists.
    pub fn exists() -> bool {
        Self::default_path().exists()
    }

    /// Create default config file if it doesn't exist.
    pub fn ensure_exists() -> Result<()> {
        let path = Self::default_path();
        if !path.exists() {
            let config = Config::default();
            config.save_to(&path)?;
            tracing::info!("created default config at {}", path.display());
        }
        Ok(())
    }
}

/// Generate a sample config file with comments.
pub fn generate_sample_config() -> String {
    r#"# seqdrill configuration
# Location: ~/.config/seqdrill/config.toml

[scan]
# Fail fast on ambiguous/unreadable input where true; otherwise keep
# absorbing per-file errors silently (the core's default posture).
strict = true

# Read buffer size used by the Tier 2 streaming SHA-256 digest.
chunk_size_bytes = 4194304

# Include mismatches outside the bio-format vocabulary (PDFs, scripts, ...).
include_non_bio_mismatches = false

# Allow suggesting deletion of SAM files re-emittable from BAM/CRAM.
allow_sam_regen = true

# When both SRA and FASTQ are present, keep the SRA and mark FASTQ
# erasable instead of the default (keep FASTQ, mark SRA erasable).
prefer_sra_over_fastq = false
"#
    .to_string()
}
