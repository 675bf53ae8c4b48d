use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Connection coordinates of the event store.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Database URL, e.g. `postgres://tracker@db.internal/tracker` or `sqlite://events.db?mode=rwc`.
    #[serde(default)]
    pub url: String,
    /// Privileged credential applied to `url` as its password when set.
    #[serde(default)]
    pub password: Option<String>,
    /// Run the schema migration at startup.
    #[serde(default)]
    pub auto_migrate: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// What the pixel endpoint does when recording an open fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Answer `500` with a plain-text body and no pixel.
    #[default]
    Fail,
    /// Log the failure and serve the pixel anyway.
    ServePixel,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub on_store_failure: StoreFailurePolicy,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DebugConfig {
    /// Serve `/debug/setup-store`. Schema changes can always be applied with the migration CLI.
    #[serde(default = "default_true")]
    pub setup_enabled: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            setup_enabled: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    /// CIDR networks allowed to access debug endpoints. Examples: "127.0.0.1/32", "10.0.0.0/8".
    /// If not provided, defaults to common private & loopback ranges.
    #[serde(default = "default_debug_allowed_nets")]
    pub debug_allowed_nets: Vec<IpNet>,
    /// Prefer the first `X-Forwarded-For` hop over the socket address. Only enable behind a proxy.
    #[serde(default)]
    pub trust_forwarded_for: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl AppConfig {
    /// Configuration pointing at the given store with every other setting at its default.
    pub fn with_store_url(url: impl Into<String>) -> Self {
        Self {
            store: StoreConfig {
                url: url.into(),
                ..Default::default()
            },
            listen: ListenConfig::default(),
            tracking: TrackingConfig::default(),
            debug: DebugConfig::default(),
            debug_allowed_nets: default_debug_allowed_nets(),
            trust_forwarded_for: false,
            static_dir: default_static_dir(),
        }
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::Missing("store.url"));
        }
        if self.listen.port == 0 {
            return Err(ConfigError::Validation("listen.port must be > 0".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen.host, self.listen.port)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "String")]
pub struct IpNet {
    pub addr: IpAddr,
    pub prefix: u8,
}

impl IpNet {
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.addr, &ip.to_canonical()) {
            (IpAddr::V4(a), IpAddr::V4(b)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u32::MAX << (32 - self.prefix as u32)
                };
                (u32::from(a) & mask) == (u32::from(*b) & mask)
            }
            (IpAddr::V6(a), IpAddr::V6(b)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u128::MAX << (128 - self.prefix as u32)
                };
                (u128::from(a) & mask) == (u128::from(*b) & mask)
            }
            _ => false,
        }
    }
}

impl FromStr for IpNet {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip_part, prefix_part) = s
            .split_once('/')
            .ok_or_else(|| "CIDR must contain '/'".to_string())?;
        let addr = IpAddr::from_str(ip_part).map_err(|e| format!("Invalid IP: {e}"))?;
        let prefix: u8 = prefix_part
            .parse()
            .map_err(|e| format!("Invalid prefix: {e}"))?;
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix as u32 > max {
            return Err("Prefix out of range".into());
        }
        Ok(IpNet { addr, prefix })
    }
}

impl TryFrom<String> for IpNet {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_debug_allowed_nets() -> Vec<IpNet> {
    [
        "127.0.0.1/32",
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "::1/128",
        "fc00::/7",
    ]
    .iter()
    .filter_map(|s| s.parse().ok())
    .collect()
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any variable matching the key path separated by double underscores (e.g. `STORE__URL`)
/// overrides the file value. `PORT` is honoured as a shorthand for `listen.port`.
/// The file is optional so the service can be configured from the environment alone.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .set_override_option("listen.port", std::env::var("PORT").ok())?
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    Ok(app)
}
