use std::{fs, path::Path, path::PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub download_dir: PathBuf,
    pub default_currency_symbol: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            download_dir: PathBuf::from("downloads"),
            default_currency_symbol: "$".into(),
            chart_width: 800,
            chart_height: 400,
        }
    }
}

/// Every key optional; anything missing keeps the default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    download_dir: Option<PathBuf>,
    default_currency_symbol: Option<String>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
}

pub fn load_settings() -> anyhow::Result<ClientSettings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if it exists, then `APP__*` variables.
pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", file.display()))?;
        if let Some(v) = file_cfg.server_url {
            settings.server_url = v;
        }
        if let Some(v) = file_cfg.download_dir {
            settings.download_dir = v;
        }
        if let Some(v) = file_cfg.default_currency_symbol {
            settings.default_currency_symbol = v;
        }
        if let Some(v) = file_cfg.chart_width {
            settings.chart_width = v;
        }
        if let Some(v) = file_cfg.chart_height {
            settings.chart_height = v;
        }
    }

    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__CURRENCY_SYMBOL") {
        settings.default_currency_symbol = v;
    }
    if let Some(v) = env("APP__CHART_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.chart_width = parsed;
        }
    }
    if let Some(v) = env("APP__CHART_HEIGHT") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.chart_height = parsed;
        }
    }

    Ok(settings)
}

pub fn validate_server_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid server url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url '{raw}' must use http or https");
    }
    Ok(url)
}
