use crate::scanner::types::{FileTypeFilter, ScanPattern, ScanSettings, normalize_extension};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../assets/default-config.json");

/// `fileTypes` entry as persisted on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileTypeEntry {
    pub file_type: String,
    pub description: String,
}

/// `scanPatterns` entry as persisted on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternEntry {
    pub pattern: String,
    pub description: String,
}

/// Raw shape of a configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFile {
    pub file_types: Vec<FileTypeEntry>,
    pub scan_patterns: Vec<PatternEntry>,
    pub scanner: ScanSettings,
}

/// Merged and validated configuration
#[derive(Debug, Clone)]
pub struct ShredscanConfig {
    pub file_types: Vec<FileTypeFilter>,
    pub patterns: Vec<ScanPattern>,
    pub settings: ScanSettings,
    /// Entries dropped while validating, in load order
    pub warnings: Vec<String>,
}

impl ShredscanConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    /// Load embedded defaults, then either `custom_config` or the user and
    /// project files, then `SHREDSCAN_*` environment variables
    pub fn load_with_custom_config(custom_config: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Json::string(DEFAULT_CONFIG)); // Embedded defaults

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                anyhow::bail!("Config file not found: {}", custom_path.display());
            }
            figment = match custom_path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Json::file(custom_path)),
            };
        } else {
            // Standard priority: user config -> project config
            let user_dir = Self::user_config_dir();
            figment = figment
                .merge(Json::file(user_dir.join("config.json")))
                .merge(Toml::file(user_dir.join("config.toml")))
                .merge(Yaml::file(user_dir.join("config.yaml")))
                .merge(Json::file("shredscan.json"))
                .merge(Toml::file("shredscan.toml"))
                .merge(Yaml::file("shredscan.yaml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("SHREDSCAN_").split("__"));

        Self::from_figment(figment)
    }

    /// Extract and validate a prepared figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: ConfigFile = figment
            .extract()
            .context("Failed to parse configuration")?;

        let mut warnings = Vec::new();
        let file_types = validate_file_types(raw.file_types, &mut warnings);
        let patterns = validate_patterns(raw.scan_patterns, &mut warnings);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        raw.scanner
            .validate()
            .map_err(|message| anyhow::anyhow!("Invalid scanner settings: {message}"))?;

        tracing::debug!(
            "Loaded configuration: {} file types, {} patterns",
            file_types.len(),
            patterns.len()
        );

        Ok(Self {
            file_types,
            patterns,
            settings: raw.scanner,
            warnings,
        })
    }

    /// Validated configuration in the on-disk format
    pub fn to_config_file(&self) -> ConfigFile {
        ConfigFile {
            file_types: self
                .file_types
                .iter()
                .map(|t| FileTypeEntry {
                    file_type: t.extension.clone(),
                    description: t.description.clone(),
                })
                .collect(),
            scan_patterns: self
                .patterns
                .iter()
                .map(|p| PatternEntry {
                    pattern: p.pattern.clone(),
                    description: p.description.clone(),
                })
                .collect(),
            scanner: self.settings.clone(),
        }
    }

    fn user_config_dir() -> PathBuf {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config").join("shredscan"),
            Err(_) => PathBuf::from("~/.config/shredscan"),
        }
    }
}

fn validate_file_types(entries: Vec<FileTypeEntry>, warnings: &mut Vec<String>) -> Vec<FileTypeFilter> {
    let mut file_types: Vec<FileTypeFilter> = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let extension = normalize_extension(&entry.file_type);
        if extension.is_empty() || entry.description.trim().is_empty() {
            warnings.push(format!(
                "File type #{index} skipped: both fileType and description are required"
            ));
            continue;
        }
        if file_types.iter().any(|t| t.extension == extension) {
            warnings.push(format!("File type #{index} skipped: duplicate extension '{extension}'"));
            continue;
        }
        file_types.push(FileTypeFilter::new(extension, entry.description));
    }
    file_types
}

fn validate_patterns(entries: Vec<PatternEntry>, warnings: &mut Vec<String>) -> Vec<ScanPattern> {
    let mut patterns: Vec<ScanPattern> = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        if entry.pattern.is_empty() || entry.description.trim().is_empty() {
            warnings.push(format!(
                "Scan pattern #{index} skipped: both pattern and description are required"
            ));
            continue;
        }
        if let Err(e) = regex::bytes::Regex::new(&entry.pattern) {
            warnings.push(format!(
                "Scan pattern #{index} ({}) skipped: not a valid regular expression: {e}",
                entry.description
            ));
            continue;
        }
        if patterns.iter().any(|p| p.pattern == entry.pattern) {
            warnings.push(format!(
                "Scan pattern #{index} skipped: duplicate pattern '{}'",
                entry.pattern
            ));
            continue;
        }
        patterns.push(ScanPattern::new(entry.pattern, entry.description));
    }
    patterns
}
