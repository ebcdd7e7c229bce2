use crate::error::{config_error, env_error, DaybookResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Freshness window for the event cache, in seconds
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 360;

/// Settings file read when `DAYBOOK_CONFIG` is not set
pub const DEFAULT_SETTINGS_FILE: &str = "daybook.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Google Calendar ID to read from and write to
    pub google_calendar_id: String,
    /// Timezone used when the calendar does not report one
    pub timezone: String,
    /// Directory holding the token and cache files
    pub data_dir: PathBuf,
    /// Credential record file name inside `data_dir`
    pub token_file: String,
    /// Event cache file name inside `data_dir`
    pub cache_file: String,
    /// How long a cached event list stays fresh
    pub cache_duration_secs: u64,
    /// Local port for the OAuth redirect listener
    pub oauth_redirect_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_calendar_id: "primary".to_string(),
            timezone: "UTC".to_string(),
            data_dir: PathBuf::from("."),
            token_file: "token.json".to_string(),
            cache_file: "events_cache.bin".to_string(),
            cache_duration_secs: DEFAULT_CACHE_DURATION_SECS,
            oauth_redirect_port: 8080,
        }
    }
}

/// Optional overrides read from the TOML settings file
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    pub google_calendar_id: Option<String>,
    pub timezone: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub token_file: Option<String>,
    pub cache_file: Option<String>,
    pub cache_duration_secs: Option<u64>,
    pub oauth_redirect_port: Option<u16>,
}

/// Client secrets as downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: ClientSecrets,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
}

impl Config {
    /// Load configuration from `.env`, the environment and the settings file
    pub fn load() -> DaybookResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        // Settings file first so the environment wins
        let settings = match env::var("DAYBOOK_CONFIG") {
            Ok(path) => read_settings(&path, true)?,
            Err(_) => read_settings(DEFAULT_SETTINGS_FILE, false)?,
        };
        if let Some(settings) = settings {
            config.apply_settings(settings);
        }

        if let Ok(calendar_id) = env::var("GOOGLE_CALENDAR_ID") {
            config.google_calendar_id = calendar_id;
        }
        if let Ok(timezone) = env::var("TIMEZONE") {
            config.timezone = timezone;
        }
        if let Ok(data_dir) = env::var("DAYBOOK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(secs) = env::var("CACHE_DURATION_SECS") {
            config.cache_duration_secs = secs
                .parse::<u64>()
                .map_err(|_| env_error("Invalid CACHE_DURATION_SECS format"))?;
        }
        if let Ok(port) = env::var("OAUTH_REDIRECT_PORT") {
            config.oauth_redirect_port = port
                .parse::<u16>()
                .map_err(|_| env_error("Invalid OAUTH_REDIRECT_PORT format"))?;
        }

        // Client credentials: environment first, then the downloaded secrets file
        match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
            (Ok(id), Ok(secret)) => {
                config.google_client_id = id;
                config.google_client_secret = secret;
            }
            _ => {
                let secrets_path = env::var("GOOGLE_CREDENTIALS_FILE")
                    .unwrap_or_else(|_| "credentials.json".to_string());
                let (id, secret) = read_client_secrets(&secrets_path).map_err(|_| {
                    config_error(&format!(
                        "Set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET or provide {}",
                        secrets_path
                    ))
                })?;
                config.google_client_id = id;
                config.google_client_secret = secret;
            }
        }

        // Reject durations chrono cannot represent before anything uses them
        config.cache_duration()?;

        Ok(config)
    }

    /// Apply overrides from the settings file
    pub fn apply_settings(&mut self, settings: FileSettings) {
        if let Some(calendar_id) = settings.google_calendar_id {
            self.google_calendar_id = calendar_id;
        }
        if let Some(timezone) = settings.timezone {
            self.timezone = timezone;
        }
        if let Some(data_dir) = settings.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(token_file) = settings.token_file {
            self.token_file = token_file;
        }
        if let Some(cache_file) = settings.cache_file {
            self.cache_file = cache_file;
        }
        if let Some(secs) = settings.cache_duration_secs {
            self.cache_duration_secs = secs;
        }
        if let Some(port) = settings.oauth_redirect_port {
            self.oauth_redirect_port = port;
        }
    }

    /// Fallback timezone as a chrono-tz value
    pub fn fallback_timezone(&self) -> DaybookResult<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }

    /// Cache freshness window; errors when the seconds do not fit a `Duration`
    pub fn cache_duration(&self) -> DaybookResult<chrono::Duration> {
        i64::try_from(self.cache_duration_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                config_error(&format!(
                    "cache_duration_secs out of range: {}",
                    self.cache_duration_secs
                ))
            })
    }
}

/// Read the TOML settings file. A missing file is only an error when it was
/// named explicitly.
pub fn read_settings<P: AsRef<Path>>(path: P, explicit: bool) -> DaybookResult<Option<FileSettings>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(toml::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound && !explicit => Ok(None),
        Err(e) => Err(config_error(&format!(
            "Failed to read settings file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Read the client id and secret from an installed-app `credentials.json`
pub fn read_client_secrets<P: AsRef<Path>>(path: P) -> DaybookResult<(String, String)> {
    let content = fs::read_to_string(path)?;
    parse_client_secrets(&content)
}

/// Parse the installed-app client secrets JSON
pub fn parse_client_secrets(content: &str) -> DaybookResult<(String, String)> {
    let file: ClientSecretsFile = serde_json::from_str(content)?;
    Ok((file.installed.client_id, file.installed.client_secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.cache_duration_secs, 360);
        assert_eq!(config.google_calendar_id, "primary");
        assert_eq!(config.fallback_timezone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn settings_override_only_given_fields() {
        let mut config = Config::default();
        let settings: FileSettings = toml::from_str(
            r#"
            timezone = "Europe/Helsinki"
            cache_duration_secs = 60
            "#,
        )
        .unwrap();

        config.apply_settings(settings);

        assert_eq!(config.timezone, "Europe/Helsinki");
        assert_eq!(config.cache_duration_secs, 60);
        assert_eq!(config.cache_file, "events_cache.bin");
    }

    #[test]
    fn parses_installed_client_secrets() {
        let json = r#"{"installed": {"client_id": "id.apps", "client_secret": "shh",
            "redirect_uris": ["http://localhost"]}}"#;
        let (id, secret) = parse_client_secrets(json).unwrap();
        assert_eq!(id, "id.apps");
        assert_eq!(secret, "shh");
    }

    #[test]
    fn oversized_cache_duration_is_rejected() {
        let config = Config {
            cache_duration_secs: 100_000_000_000_000_000,
            ..Config::default()
        };
        assert!(config.cache_duration().is_err());

        let config = Config {
            cache_duration_secs: u64::MAX,
            ..Config::default()
        };
        assert!(config.cache_duration().is_err());

        assert_eq!(Config::default().cache_duration().unwrap().num_seconds(), 360);
    }

    #[test]
    fn missing_settings_file_only_fails_when_named() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("daybook.toml");

        assert!(read_settings(&missing, false).unwrap().is_none());
        assert!(matches!(read_settings(&missing, true), Err(Error::Config(_))));
    }

    #[test]
    fn named_settings_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "cache_file = \"today.bin\"\n").unwrap();

        let settings = read_settings(&path, true).unwrap().unwrap();
        assert_eq!(settings.cache_file.as_deref(), Some("today.bin"));
    }

    #[test]
    fn invalid_timezone_is_a_config_error() {
        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Config::default()
        };
        assert!(config.fallback_timezone().is_err());
    }
}
