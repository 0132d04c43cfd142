use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub ui_url: String,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://127.0.0.1:5000/api".into(),
            ui_url: "https://127.0.0.1:5000".into(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    ui_url: Option<String>,
    access_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `path` if it exists, then environment variables.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    let defaults = Settings::default();
    settings.api_url = normalize_base_url(&settings.api_url, &defaults.api_url)
        .context("invalid api_url")?;
    settings.ui_url =
        normalize_base_url(&settings.ui_url, &defaults.ui_url).context("invalid ui_url")?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.ui_url {
        settings.ui_url = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DEPOSIT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("DEPOSIT_UI_URL") {
        settings.ui_url = v;
    }
    if let Some(v) = var("APP__UI_URL") {
        settings.ui_url = v;
    }

    if let Some(v) = var("DEPOSIT_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN") {
        settings.access_token = Some(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn normalize_base_url(raw: &str, fallback: &str) -> Result<String> {
    let raw = raw.trim();
    let candidate = if raw.is_empty() { fallback } else { raw };
    let candidate = candidate.trim_end_matches('/');

    Url::parse(candidate).with_context(|| format!("'{candidate}' is not an absolute URL"))?;
    Ok(candidate.to_string())
}

/// The UI base as a directory URL, so relative destinations join below it.
pub fn ui_base(settings: &Settings) -> Result<Url> {
    Url::parse(&format!("{}/", settings.ui_url.trim_end_matches('/')))
        .with_context(|| format!("invalid ui_url '{}'", settings.ui_url))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
