//! Connection settings loaded from a JSON or TOML file

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up when no settings path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "connection_settings.json";

/// Database connection settings.
///
/// Required keys: `username`, `password`, `hostname`, `port`, `sid`.
/// `port` may be written as a number or as a numeric string.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    pub username: String,
    pub password: String,
    pub hostname: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Service identifier: the database the connection is routed to.
    pub sid: String,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

fn default_trust_cert() -> bool {
    true
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("sid", &self.sid)
            .field("encrypt", &self.encrypt)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let number = match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => n,
        PortValue::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("port {:?} is not a number", s)))?,
    };

    u16::try_from(number).map_err(|_| D::Error::custom(format!("port {} is out of range", number)))
}

/// Settings file formats, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SettingsFormat::Toml,
            _ => SettingsFormat::Json,
        }
    }
}

impl ConnectionSettings {
    /// Read and parse a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let parsed = match SettingsFormat::from_path(path) {
            SettingsFormat::Json => serde_json::from_str::<Self>(&content).map_err(|e| e.to_string()),
            SettingsFormat::Toml => toml::from_str::<Self>(&content).map_err(|e| e.to_string()),
        };

        let settings = parsed.map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        settings.validate()?;

        tracing::debug!(
            path = %path.display(),
            host = %settings.hostname,
            port = settings.port,
            sid = %settings.sid,
            "loaded connection settings"
        );
        Ok(settings)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(content).map_err(|e| Error::Parse {
            path: PathBuf::from("<json>"),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| Error::Parse {
            path: PathBuf::from("<toml>"),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::InvalidSettings("hostname is empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::InvalidSettings("port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Where to look for a settings file when none is given explicitly:
/// the working directory first, then the user's config directory.
pub fn default_settings_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_SETTINGS_FILE);
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join("sqlrunner").join(DEFAULT_SETTINGS_FILE))
        .filter(|path| path.exists())
        .unwrap_or(local)
}
