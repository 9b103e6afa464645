mod app_config;
mod config;
mod records;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, parse_header_map};
pub use records::{ColorVariant, NormalizedRecord, RawDetailRecord};

/// Placeholder in [`AppConfig::product_url_template`] replaced by an article code.
pub const PRODUCT_ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
