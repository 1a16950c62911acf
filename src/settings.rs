//! Application settings
//!
//! Layered configuration: built-in defaults, an optional `config.toml`,
//! then the `PORT` and `NODE_ENV` environment variables on top. All
//! values are resolved once at startup and immutable afterwards.

use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
    #[error("invalid listen address '{0}': {1}")]
    InvalidAddress(String, std::net::AddrParseError),
}

/// Runtime environment, from `NODE_ENV`. Anything other than the exact
/// string `development` (including unset) is production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("development") => Self::Development,
            _ => Self::Production,
        }
    }

    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
    pub performance: PerformanceSettings,
    pub app: AppSettings,
    #[serde(skip)]
    pub env: Environment,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub server_name: String,
    pub json_spaces: usize,
    pub max_body_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub access_log: bool,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceSettings {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub views_dir: String,
    pub public_dir: String,
    pub surveys_file: String,
    pub support_email: Option<String>,
    pub tracking_id: Option<String>,
    pub tracking_domain: Option<String>,
}

impl Settings {
    /// Load from `config.toml` (if present) and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let port = std::env::var("PORT").ok();
        let node_env = std::env::var("NODE_ENV").ok();
        Self::load_from(Some("config"), port.as_deref(), node_env.as_deref())
    }

    /// Load with explicit inputs instead of the process environment.
    pub fn load_from(
        file: Option<&str>,
        port: Option<&str>,
        node_env: Option<&str>,
    ) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("http.server_name", "survey-web/0.1")?
            .set_default("http.json_spaces", 4)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("app.views_dir", "views")?
            .set_default("app.public_dir", "public")?
            .set_default("app.surveys_file", "data/surveys.toml")?;

        if let Some(name) = file {
            builder = builder.add_source(config::File::with_name(name).required(false));
        }

        let mut settings: Self = builder.build()?.try_deserialize()?;

        // PORT wins over the file, matching the usual hosting convention.
        if let Some(raw) = port {
            settings.server.port = raw
                .parse()
                .map_err(|_| SettingsError::InvalidPort(raw.to_string()))?;
        }
        settings.env = Environment::from_node_env(node_env);

        Ok(settings)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| SettingsError::InvalidAddress(addr, e))
    }

    /// Access log format: the configured override, else `dev` in
    /// development and `tiny` in production.
    #[must_use]
    pub fn access_log_format(&self) -> &str {
        match &self.logging.format {
            Some(format) => format,
            None if self.env.is_development() => "dev",
            None => "tiny",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::load_from(None, None, None).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.http.json_spaces, 4);
        assert_eq!(settings.http.max_body_size, 1_048_576);
        assert!(settings.logging.access_log);
        assert_eq!(settings.app.views_dir, "views");
        assert_eq!(settings.env, Environment::Production);
    }

    #[test]
    fn node_env_selects_environment() {
        let dev = Settings::load_from(None, None, Some("development")).unwrap();
        assert!(dev.env.is_development());

        // Only the exact string counts.
        for other in [Some("dev"), Some("Development"), Some("production"), None] {
            let settings = Settings::load_from(None, None, other).unwrap();
            assert_eq!(settings.env, Environment::Production);
        }
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nport = 4100\n[http]\njson_spaces = 2").unwrap();

        let settings =
            Settings::load_from(Some(path.to_str().unwrap()), None, None).unwrap();
        assert_eq!(settings.server.port, 4100);
        assert_eq!(settings.http.json_spaces, 2);
        // Untouched sections keep their defaults.
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn port_variable_beats_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();

        let settings =
            Settings::load_from(Some(path.to_str().unwrap()), Some("5000"), None).unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Settings::load_from(None, Some("not-a-port"), None).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidPort(_)));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let settings = Settings::load_from(Some("no/such/config"), None, None).unwrap();
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let settings = Settings::load_from(None, Some("8080"), None).unwrap();
        assert_eq!(settings.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn access_log_format_follows_environment() {
        let dev = Settings::load_from(None, None, Some("development")).unwrap();
        assert_eq!(dev.access_log_format(), "dev");

        let prod = Settings::load_from(None, None, None).unwrap();
        assert_eq!(prod.access_log_format(), "tiny");

        let mut custom = Settings::load_from(None, None, None).unwrap();
        custom.logging.format = Some("$method $status".to_string());
        assert_eq!(custom.access_log_format(), "$method $status");
    }
}
