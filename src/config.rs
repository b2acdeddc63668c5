use std::{env, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    /// Base URL clients can reach this server under; embedded in the SSE
    /// `endpoint` event so the client knows where to POST follow-ups.
    pub public_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_PUBLIC_URL must not be empty")]
    EmptyPublicUrl,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let public_url = match env::var("MCP_PUBLIC_URL") {
            Ok(value) => {
                let trimmed = value.trim().trim_end_matches('/').to_string();
                if trimmed.is_empty() {
                    return Err(ConfigError::EmptyPublicUrl);
                }
                trimmed
            }
            Err(_) => format!("http://localhost:{bind_port}"),
        };

        let config = Self {
            bind_addr,
            bind_port,
            public_url,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Env vars are process-wide; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parse_defaults() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        env::remove_var("BIND_ADDR");
        env::remove_var("BIND_PORT");
        env::remove_var("MCP_PUBLIC_URL");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.public_url, "http://localhost:8080");
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        env::set_var("BIND_PORT", "not-a-port");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));
        env::remove_var("BIND_PORT");
    }

    #[test]
    fn public_url_trailing_slash_is_trimmed() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        env::remove_var("BIND_PORT");
        env::set_var("MCP_PUBLIC_URL", "https://mcp.example.net/");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.public_url, "https://mcp.example.net");
        env::remove_var("MCP_PUBLIC_URL");
    }

    #[test]
    fn empty_public_url_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        env::remove_var("BIND_PORT");
        env::set_var("MCP_PUBLIC_URL", "  ");

        let err = Config::from_env().expect_err("expected empty url error");
        assert!(matches!(err, ConfigError::EmptyPublicUrl));
        env::remove_var("MCP_PUBLIC_URL");
    }
}
