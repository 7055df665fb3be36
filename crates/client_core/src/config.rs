use std::{collections::HashMap, fs};

use crate::http::normalize_base_url;

/// Where the two services live. Defaults target the router; pointing a URL
/// straight at a service origin is a configuration change, never a code
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub people_base_url: String,
    pub demography_base_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            people_base_url: "http://127.0.0.1:8765/api/v1".into(),
            demography_base_url: "http://127.0.0.1:8765/api/v1".into(),
        }
    }
}

/// Defaults, then `client.toml`, then environment variables, later layers
/// winning.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("people_base_url") {
                settings.people_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("demography_base_url") {
                settings.demography_base_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("PEOPLE_SERVICE_URL") {
        settings.people_base_url = v;
    }
    if let Ok(v) = std::env::var("DEMOGRAPHY_SERVICE_URL") {
        settings.demography_base_url = v;
    }

    settings.people_base_url = normalize_base_url(settings.people_base_url);
    settings.demography_base_url = normalize_base_url(settings.demography_base_url);
    settings
}
