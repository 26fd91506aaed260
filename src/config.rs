use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.yaml";
const DEV_JWT_SECRET: &str = "railyard-dev-secret";
/// One year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported database driver: {0}")]
    UnsupportedDriver(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3000,
        }
    }
}

/// Storage backends reachable through sqlx's `Any` driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Postgres,
    Mysql,
}

impl Driver {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(ConfigError::UnsupportedDriver(other.to_string())),
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Self::Sqlite => 0,
            Self::Postgres => 5432,
            Self::Mysql => 3306,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: String,
    pub host: String,
    /// Falls back to the driver's standard port.
    pub port: Option<u16>,
    /// Database name, or for SQLite a file path relative to the app root or `:memory:`.
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_idle_conns: u32,
    pub max_open_conns: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite3".into(),
            host: "localhost".into(),
            port: None,
            database: "app.db".into(),
            username: String::new(),
            password: String::new(),
            max_idle_conns: 10,
            max_open_conns: 100,
        }
    }
}

impl DatabaseConfig {
    pub fn kind(&self) -> Result<Driver, ConfigError> {
        Driver::parse(&self.driver)
    }

    pub fn is_memory(&self) -> bool {
        self.database == ":memory:"
    }

    /// Connection URL understood by sqlx. SQLite files are created on first connect.
    pub fn url(&self, root: &Path) -> Result<String, ConfigError> {
        let driver = self.kind()?;
        let url = match driver {
            Driver::Sqlite if self.is_memory() => "sqlite::memory:".to_string(),
            Driver::Sqlite => format!("sqlite:{}?mode=rwc", root.join(&self.database).display()),
            Driver::Postgres | Driver::Mysql => {
                let scheme = if driver == Driver::Postgres { "postgres" } else { "mysql" };
                let port = self.port.unwrap_or(driver.default_port());
                let credentials = match (self.username.is_empty(), self.password.is_empty()) {
                    (true, _) => String::new(),
                    (false, true) => format!("{}@", escape_userinfo(&self.username)),
                    (false, false) => format!(
                        "{}:{}@",
                        escape_userinfo(&self.username),
                        escape_userinfo(&self.password)
                    ),
                };
                format!("{scheme}://{credentials}{}:{port}/{}", self.host, self.database)
            }
        };
        Ok(url)
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn escape_userinfo(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_JWT_SECRET.into(),
            issuer: "railyard".into(),
            ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub env: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Application root; static files and relative database paths resolve against it.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".into(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            root: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Reads `config.yaml` from `root` or `root/config`, then applies environment overrides.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(root) {
            Some(path) => Self::load_from(&path)?,
            None => {
                warn!(root = %root.display(), "could not find {CONFIG_FILE}; using defaults");
                Self::default()
            }
        };
        config.root = root.to_path_buf();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        if config.env == "production" && config.jwt.secret == DEV_JWT_SECRET {
            warn!("JWT_SECRET is not set; tokens are signed with the development secret");
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("APP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("APP_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "APP_PORT", value: port })?;
        }
        if let Some(env) = lookup("APP_ENV") {
            self.env = env;
        }
        if let Some(driver) = lookup("DB_DRIVER") {
            self.database.driver = driver;
        }
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            let parsed = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "DB_PORT", value: port })?;
            self.database.port = Some(parsed);
        }
        if let Some(database) = lookup("DB_DATABASE") {
            self.database.database = database;
        }
        if let Some(username) = lookup("DB_USERNAME") {
            self.database.username = username;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt.secret = secret;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.kind()?;
        if !(1..=MAX_TTL_MINUTES).contains(&self.jwt.ttl_minutes) {
            return Err(ConfigError::InvalidValue {
                key: "jwt.ttl_minutes",
                value: self.jwt.ttl_minutes.to_string(),
            });
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    [root.join(CONFIG_FILE), root.join("config").join(CONFIG_FILE)]
        .into_iter()
        .find(|p| p.is_file())
}
