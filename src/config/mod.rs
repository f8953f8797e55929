//! Configuration module for the task-queue service.
//!
//! Loads a structured TOML file into strongly-typed structs using
//! `serde` + `toml`. Every field has a default, so the daemon also runs
//! without a config file at all.
//!
//! # Example `taskmq.toml`
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:8080"
//! ```
//!
//! Snapshot paths and the save interval are deliberately not configurable;
//! they are compile-time constants in the `snapshot` module.

use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

/// Load configuration from a TOML file into `Config`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(&path)?;
    let cfg: Config = toml::from_str(&raw)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_8080() {
        let cfg = Config::default();
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");

        let cfg: Config = toml::from_str("[server]\nbind_addr = \"127.0.0.1:9999\"\n").unwrap();
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9999");
    }
}
