use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The four OAuth fields a run needs before it can talk to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_key: String,
    pub access_secret: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized config extension {0:?} (expected .yaml, .yml or .json)")]
    UnknownExtension(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Per-account settings under the `users` mapping. Credential fields are
/// either inline (`consumer_key`/`consumer_secret`/`key`/`secret`) or
/// split between the account (`key`/`secret`) and a named entry under
/// `apps` referenced by `app`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    pub app: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    #[serde(default)]
    pub whatsupbot: Monitoring,
}

/// The `whatsupbot` sub-mapping: a bare boolean toggles monitoring for
/// the account, a mapping may override the alert threshold.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Monitoring {
    Enabled(bool),
    Settings { hours: Option<i64> },
}

impl Default for Monitoring {
    fn default() -> Self {
        Monitoring::Enabled(true)
    }
}

impl Monitoring {
    pub fn disabled(&self) -> bool {
        matches!(self, Monitoring::Enabled(false))
    }

    pub fn hours(&self) -> Option<i64> {
        match self {
            Monitoring::Settings { hours } => *hours,
            Monitoring::Enabled(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AppSettings {
    consumer_key: String,
    consumer_secret: String,
}

/// A parsed bots config file. Accounts keep the order they appear in
/// the file; reports follow that order.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub users: Vec<(String, UserSettings)>,
    apps: HashMap<String, AppSettings>,
}

impl Config {
    /// Load a config file, picking the parser by file extension.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        // serde_json is built with preserve_order, so routing YAML through
        // a serde_json::Value keeps the mapping order for both formats.
        let raw: Value = match extension {
            "json" => serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?,
            other => return Err(ConfigError::UnknownExtension(other.to_string())),
        };

        Config::from_value(raw, &display)
    }

    fn from_value(raw: Value, path: &str) -> Result<Config, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_string(),
            message,
        };

        let users_map = raw
            .get("users")
            .and_then(Value::as_object)
            .ok_or_else(|| parse_error("missing `users` mapping".to_string()))?;

        let mut users = Vec::with_capacity(users_map.len());
        for (name, settings) in users_map {
            let settings: UserSettings = serde_json::from_value(settings.clone())
                .map_err(|e| parse_error(format!("user {}: {}", name, e)))?;
            users.push((name.clone(), settings));
        }

        let apps = match raw.get("apps") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| parse_error(format!("apps: {}", e)))?,
            None => HashMap::new(),
        };

        Ok(Config { users, apps })
    }

    /// Credentials for one account, if it carries a complete set.
    /// Inline consumer fields win over the account's `app` reference.
    pub fn credentials_for(&self, settings: &UserSettings) -> Option<Credentials> {
        let (consumer_key, consumer_secret) =
            match (&settings.consumer_key, &settings.consumer_secret) {
                (Some(key), Some(secret)) => (key.clone(), secret.clone()),
                _ => {
                    let app = self.apps.get(settings.app.as_deref()?)?;
                    (app.consumer_key.clone(), app.consumer_secret.clone())
                }
            };

        Some(Credentials {
            consumer_key,
            consumer_secret,
            access_key: settings.key.clone()?,
            access_secret: settings.secret.clone()?,
        })
    }

    /// First account with a complete credential set, in config order.
    pub fn credentials(&self) -> Option<Credentials> {
        self.users
            .iter()
            .find_map(|(_, settings)| self.credentials_for(settings))
    }
}
