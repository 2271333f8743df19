pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_bind_address, validate_positive_number, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";
pub const PORT_ENV: &str = "STREAMLIT_SERVER_PORT";
pub const ADDRESS_ENV: &str = "STREAMLIT_SERVER_ADDRESS";

/// 命令列旗標優先，其次環境變數，最後預設值
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "seat-planner")]
#[command(about = "Preference-driven classroom seat planner served over HTTP")]
#[command(version)]
pub struct ServerConfig {
    #[arg(long = "server-port", env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long = "server-address", env = ADDRESS_ENV, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per request phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.validate()?;
        let ip: IpAddr = self.address.parse().map_err(|_| {
            crate::utils::error::PlannerError::InvalidConfigValueError {
                field: "server.address".to_string(),
                value: self.address.clone(),
                reason: "Must be an IPv4 or IPv6 address".to_string(),
            }
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(feature = "cli")]
impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_bind_address("server.address", &self.address)?;
        validate_positive_number("server.port", self.port as usize, 1)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = ServerConfig::try_parse_from([
            "seat-planner",
            "--server-port",
            "9000",
            "--server-address",
            "127.0.0.1",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_address_rejected() {
        let config = ServerConfig::try_parse_from([
            "seat-planner",
            "--server-port",
            "8501",
            "--server-address",
            "not-an-ip",
        ])
        .unwrap();
        assert!(config.validate().is_err());
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_port_zero_rejected() {
        let config =
            ServerConfig::try_parse_from(["seat-planner", "--server-port", "0", "--server-address", "::1"])
                .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_numeric_port_is_parse_error() {
        assert!(ServerConfig::try_parse_from(["seat-planner", "--server-port", "http"]).is_err());
    }
}
