use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::markup::MarkupPolicy;
use crate::pages::directory::LinkOverrides;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub agent_links: LinkOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_backend_base_url")]
    pub backend_base_url: String,
    #[serde(default)]
    pub markup_policy: MarkupPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_backend_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            backend_base_url: default_backend_base_url(),
            markup_policy: MarkupPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file with `${VAR}` substitution
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = substitute_env(&read_text_file(path)?);

        let path_lower = path.to_lowercase();
        let config = if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Try the known config locations in order, falling back to defaults
    pub fn discover() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        let config_paths: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
            exe_dir.join("conf.yaml").to_str().map(|s| s.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut config = None;
        for path in &config_paths {
            match Config::load(path) {
                Ok(cfg) => {
                    info!("Loaded configuration from: {}", path);
                    config = Some(cfg);
                    break;
                }
                Err(e) => debug!("Failed to load config from {}: {}", path, e),
            }
        }

        let mut config = config.unwrap_or_else(|| {
            warn!("No config file found (tried {:?}), using defaults", config_paths);
            Config::default()
        });
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("AGENT_SUITE_BACKEND_URL") {
            if !url.is_empty() {
                self.system_config.backend_base_url = url;
            }
        }
    }
}

/// Replace `${VAR_NAME}` with the environment value, leaving unknown names intact
fn substitute_env(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

fn read_text_file(path: &str) -> Result<String> {
    let mut bytes = fs::read(path)?;
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(0..3);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let (cow, _, _) = encoding_rs::UTF_8.decode(e.as_bytes());
            Ok(cow.into_owned())
        }
    }
}
