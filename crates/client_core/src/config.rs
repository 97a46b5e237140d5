use std::{fs, io, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "relations.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub api_prefix: String,
    pub session_cookie: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub serialize_actions: bool,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            api_prefix: shared::protocol::DEFAULT_API_PREFIX.into(),
            session_cookie: None,
            request_timeout_seconds: None,
            serialize_actions: false,
            user_agent: concat!("relations-client/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    api_prefix: Option<String>,
    session_cookie: Option<String>,
    request_timeout_seconds: Option<u64>,
    serialize_actions: Option<bool>,
    user_agent: Option<String>,
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            merge_file_settings(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
    }

    apply_env_overrides(&mut settings, env);
    Ok(settings)
}

fn merge_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.api_prefix {
        settings.api_prefix = v;
    }
    if let Some(v) = file_cfg.session_cookie {
        settings.session_cookie = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = Some(v);
    }
    if let Some(v) = file_cfg.serialize_actions {
        settings.serialize_actions = v;
    }
    if let Some(v) = file_cfg.user_agent {
        settings.user_agent = v;
    }
}

pub fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("RELATIONS_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__API_PREFIX") {
        settings.api_prefix = v;
    }

    if let Some(v) = env("APP__SESSION_COOKIE") {
        settings.session_cookie = Some(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_seconds = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECONDS"),
        }
    }

    if let Some(v) = env("APP__SERIALIZE_ACTIONS") {
        match parse_flag(&v) {
            Some(parsed) => settings.serialize_actions = parsed,
            None => warn!(value = %v, "ignoring invalid APP__SERIALIZE_ACTIONS"),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
