use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

const DEFAULT_PORT: u16 = 8000;

/// Process-level settings. Database and completion-provider settings are
/// read by their own modules (`db::Database::from_env`,
/// `gateway::GatewayConfig::from_env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub log_level: String,
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

impl Config {
    pub fn from_env() -> Self {
        let host = env_parsed::<IpAddr>("HOST").unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = env_parsed::<u16>("PORT").unwrap_or(DEFAULT_PORT);
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            bind: SocketAddr::new(host, port),
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parsed_rejects_garbage() {
        std::env::set_var("TEST_CONFIG_PORT", "not-a-port");
        assert_eq!(env_parsed::<u16>("TEST_CONFIG_PORT"), None);

        std::env::set_var("TEST_CONFIG_PORT", " 9000 ");
        assert_eq!(env_parsed::<u16>("TEST_CONFIG_PORT"), Some(9000));
    }
}
