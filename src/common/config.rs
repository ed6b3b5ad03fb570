use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Settings for the HTTP verifier, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let host: IpAddr = match lookup("HOST") {
            Some(host) => host.parse()?,
            None => config.addr.ip(),
        };
        let port: u16 = match lookup("PORT") {
            Some(port) => port.parse()?,
            None => config.addr.port(),
        };
        config.addr = SocketAddr::new(host, port);

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            let parsed = parse_origins(&origins);
            if !parsed.is_empty() {
                config.allowed_origins = parsed;
            }
        }

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs.parse()?);
        }

        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Settings for the holder client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub verifier_url: String,
    pub history_dir: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            verifier_url: env::var("VERIFIER_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", DEFAULT_PORT)),
            history_dir: env::var("HISTORY_DIR").unwrap_or_else(|_| ".history".to_string()),
        }
    }
}
