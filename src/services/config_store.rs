// Configuration Storage Service
// Handles engine config file read/write, env overrides and version backup

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_inference_url")]
    pub inference_base_url: String,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    /// Per HTTP round trip. Not a deadline for the whole analysis.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_text_budget")]
    pub text_char_budget: usize,
    #[serde(default)]
    pub models: ModelConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_base_url: default_inference_url(),
            retry_delay_secs: default_retry_delay(),
            request_timeout_secs: default_request_timeout(),
            text_char_budget: default_text_budget(),
            models: ModelConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Apply `AUTHSCOPE_INFERENCE_URL` / `AUTHSCOPE_RETRY_DELAY_SECS` on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("AUTHSCOPE_INFERENCE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.inference_base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = env::var("AUTHSCOPE_RETRY_DELAY_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.retry_delay_secs = secs;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default = "default_text_detector")]
    pub text_detector: String,
    #[serde(default = "default_news_classifier")]
    pub news_classifier: String,
    #[serde(default = "default_image_detector")]
    pub image_detector: String,
    #[serde(default = "default_deepfake_detector")]
    pub deepfake_detector: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text_detector: default_text_detector(),
            news_classifier: default_news_classifier(),
            image_detector: default_image_detector(),
            deepfake_detector: default_deepfake_detector(),
        }
    }
}

fn default_inference_url() -> String { DEFAULT_INFERENCE_URL.to_string() }
fn default_retry_delay() -> u64 { 20 }
fn default_request_timeout() -> u64 { 120 }
fn default_text_budget() -> usize { 2000 }
fn default_text_detector() -> String { "openai-community/roberta-base-openai-detector".to_string() }
fn default_news_classifier() -> String { "jy46604790/Fake-News-Bert-Detect".to_string() }
fn default_image_detector() -> String { "umm-maybe/AI-image-detector".to_string() }
fn default_deepfake_detector() -> String { "prithivMLmods/Deep-Fake-Detector-Model".to_string() }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("authscope"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Load configuration from file; a missing file yields defaults.
    pub fn load(&self) -> Result<EngineConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(EngineConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

/// Load the user's config (or defaults) and apply environment overrides.
pub fn load_engine_config() -> EngineConfig {
    let stored = ConfigStore::default_config_dir()
        .map(ConfigStore::new)
        .and_then(|store| match store.load() {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!("Ignoring unreadable config: {}", e);
                None
            }
        });
    stored.unwrap_or_default().with_env_overrides()
}
