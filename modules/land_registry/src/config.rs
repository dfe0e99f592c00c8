//! Configuration for the land registry module

use crate::domain::{LodConfig, ServiceOptions};
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "LAND_REGISTRY__";

/// Land registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SeaORM connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Maximum CSV upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Site name shown until an administrator sets one
    #[serde(default = "default_site_name")]
    pub default_site_name: String,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Coordinate system of uploaded polygons
    #[serde(default)]
    pub projection: ProjectionKind,

    /// Map level-of-detail thresholds
    #[serde(default)]
    pub lod: LodConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source projection for uploaded parcel geometry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// Stereo 70 (EPSG:3844)
    #[default]
    Stereo70,
    /// Already WGS84 longitude/latitude
    Wgs84,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// EnvFilter directives, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            min_password_length: default_min_password_length(),
            default_site_name: default_site_name(),
            bcrypt_cost: default_bcrypt_cost(),
            projection: ProjectionKind::default(),
            lod: LodConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the optional YAML file, then `LAND_REGISTRY__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = path {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be positive");
        }
        if self.min_password_length == 0 {
            bail!("min_password_length must be positive");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("bcrypt_cost must be between 4 and 31");
        }
        self.lod.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            min_password_length: self.min_password_length,
            default_site_name: self.default_site_name.clone(),
            max_upload_bytes: self.max_upload_bytes,
            lod: self.lod,
        }
    }
}

fn default_database_url() -> String {
    "sqlite://land_registry.db?mode=rwc".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8087".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_min_password_length() -> usize {
    8
}

fn default_site_name() -> String {
    crate::domain::service::DEFAULT_SITE_NAME.to_string()
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_log_filter() -> String {
    "info,land_registry=debug".to_string()
}
