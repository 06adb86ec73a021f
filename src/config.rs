use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

const ENV_API_KEY: &str = "FRESHDESK_API_KEY";
const ENV_DOMAIN: &str = "FRESHDESK_DOMAIN";
const ENV_CUSTOM_FIELD: &str = "FRESHDESK_CUSTOM_FIELD";

/// `config.yml` beside the executable, else `config.yml` in the working
/// directory. An explicit path always wins.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    config_path_from(explicit, exe_dir.as_deref())
}

fn config_path_from(explicit: Option<PathBuf>, exe_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    exe_dir
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Process-wide settings, resolved once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub freshdesk_key: Option<String>,
    pub freshdesk_domain: Option<String>,
    pub freshdesk_custom_field: Option<String>,
    /// Repository full name or short name mapped to the custom field holding
    /// the issue number for that repository.
    pub repositories: Option<HashMap<String, String>>,
    pub helpdesk_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    freshdesk_key: Option<String>,
    freshdesk_domain: Option<String>,
    freshdesk_custom_field: Option<String>,
    repositories: Option<HashMap<String, String>>,
    helpdesk_base_url: Option<String>,
}

impl Settings {
    /// Environment first, then the YAML file at `config_path` on top of it.
    /// A missing file is fine; an unreadable or malformed one is not.
    pub fn load(config_path: &Path) -> AppResult<Self> {
        let mut settings = Self::from_env();

        match fs::read_to_string(config_path) {
            Ok(contents) => settings.merge_yaml(&contents).map_err(|err| {
                AppError::Configuration(format!(
                    "invalid config file {}: {err}",
                    config_path.display()
                ))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(AppError::Io(err)),
        }

        Ok(settings)
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            freshdesk_key: read(ENV_API_KEY),
            freshdesk_domain: read(ENV_DOMAIN),
            freshdesk_custom_field: read(ENV_CUSTOM_FIELD),
            repositories: None,
            helpdesk_base_url: None,
        }
    }

    fn merge_yaml(&mut self, contents: &str) -> Result<(), serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(());
        }
        let Some(file) = serde_yaml::from_str::<Option<SettingsFile>>(contents)? else {
            return Ok(());
        };

        if file.freshdesk_key.is_some() {
            self.freshdesk_key = file.freshdesk_key;
        }
        if file.freshdesk_domain.is_some() {
            self.freshdesk_domain = file.freshdesk_domain;
        }
        if file.freshdesk_custom_field.is_some() {
            self.freshdesk_custom_field = file.freshdesk_custom_field;
        }
        if file.repositories.is_some() {
            self.repositories = file.repositories;
        }
        if file.helpdesk_base_url.is_some() {
            self.helpdesk_base_url = file.helpdesk_base_url;
        }
        Ok(())
    }

    /// Root of the helpdesk REST surface, without the `/helpdesk` segment.
    pub fn helpdesk_base_url(&self) -> AppResult<String> {
        if let Some(base_url) = self.helpdesk_base_url.as_deref() {
            return Ok(base_url.trim_end_matches('/').to_string());
        }
        let domain = self
            .freshdesk_domain
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Freshdesk domain not configured".to_string()))?;
        Ok(format!("https://{domain}.freshdesk.com"))
    }

    pub fn uses_custom_base_url(&self) -> bool {
        self.helpdesk_base_url.is_some()
    }
}
