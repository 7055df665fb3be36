use std::{collections::HashMap, fs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    /// Shared path prefix the router owns; rewritten away before forwarding.
    pub path_prefix: String,
    pub people_origin: String,
    pub demography_origin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".into(),
            path_prefix: "/api/v1".into(),
            people_origin: "http://127.0.0.1:51314".into(),
            demography_origin: "http://127.0.0.1:51315".into(),
        }
    }
}

/// Defaults, then `router.toml`, then environment variables, later layers
/// winning.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("router.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("path_prefix") {
                settings.path_prefix = v.clone();
            }
            if let Some(v) = file_cfg.get("people_origin") {
                settings.people_origin = v.clone();
            }
            if let Some(v) = file_cfg.get("demography_origin") {
                settings.demography_origin = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("ROUTER_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("ROUTER_PATH_PREFIX") {
        settings.path_prefix = v;
    }
    if let Ok(v) = std::env::var("PEOPLE_ORIGIN") {
        settings.people_origin = v;
    }
    if let Ok(v) = std::env::var("DEMOGRAPHY_ORIGIN") {
        settings.demography_origin = v;
    }

    settings.normalize();
    settings
}

impl Settings {
    /// Origins lose trailing slashes and the prefix gains a leading one so
    /// path concatenation stays unambiguous.
    pub fn normalize(&mut self) {
        while self.people_origin.ends_with('/') {
            self.people_origin.pop();
        }
        while self.demography_origin.ends_with('/') {
            self.demography_origin.pop();
        }
        while self.path_prefix.ends_with('/') {
            self.path_prefix.pop();
        }
        if !self.path_prefix.starts_with('/') {
            self.path_prefix.insert(0, '/');
        }
    }
}
