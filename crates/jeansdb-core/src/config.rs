use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::{ConfigError, PRODUCT_ID_PLACEHOLDER};

const DEFAULT_BASE_URL: &str = "https://www2.hm.com/en_us/men/products/jeans.html";
const DEFAULT_PRODUCT_URL_TEMPLATE: &str = "https://www2.hm.com/en_us/productpage.{id}.html";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a config that
/// crawls the men's jeans category into `./data/hm_db.sqlite`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let base_url = or_default("JEANSDB_BASE_URL", DEFAULT_BASE_URL);
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "JEANSDB_BASE_URL",
            format!("expected an http(s) URL, got \"{base_url}\""),
        ));
    }

    let product_url_template =
        or_default("JEANSDB_PRODUCT_URL_TEMPLATE", DEFAULT_PRODUCT_URL_TEMPLATE);
    if !product_url_template.contains(PRODUCT_ID_PLACEHOLDER) {
        return Err(invalid(
            "JEANSDB_PRODUCT_URL_TEMPLATE",
            format!("template must contain the {PRODUCT_ID_PLACEHOLDER} placeholder"),
        ));
    }

    let work_dir = PathBuf::from(or_default("JEANSDB_WORK_DIR", "."));
    let database_path = PathBuf::from(or_default("JEANSDB_DATABASE_PATH", "data/hm_db.sqlite"));
    let table_name = or_default("JEANSDB_TABLE", "mens_jeans");
    let log_dir = PathBuf::from(or_default("JEANSDB_LOG_DIR", "logs"));
    let log_level = or_default("JEANSDB_LOG_LEVEL", "info");
    let user_agent = or_default("JEANSDB_USER_AGENT", DEFAULT_USER_AGENT);
    let http_headers = parse_header_map(&or_default("JEANSDB_HTTP_HEADERS", ""))
        .map_err(|reason| invalid("JEANSDB_HTTP_HEADERS", reason))?;

    let request_timeout_secs = parse_u64("JEANSDB_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("JEANSDB_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("JEANSDB_RETRY_BACKOFF_BASE_SECS", "2")?;
    let pause_every = parse_usize("JEANSDB_PAUSE_EVERY", "30")?;
    let pause_secs = parse_u64("JEANSDB_PAUSE_SECS", "10")?;
    let max_concurrent_products = parse_usize("JEANSDB_MAX_CONCURRENT_PRODUCTS", "1")?;
    let db_max_connections = parse_u32("JEANSDB_DB_MAX_CONNECTIONS", "1")?;

    Ok(AppConfig {
        base_url,
        product_url_template,
        work_dir,
        database_path,
        table_name,
        log_dir,
        log_level,
        user_agent,
        http_headers,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_secs,
        pause_every,
        pause_secs,
        max_concurrent_products,
        db_max_connections,
    })
}

/// Parses a `|`-separated list of `Name: value` pairs into header tuples.
///
/// `|` is the separator because user-agent style values routinely contain
/// commas and semicolons. Empty segments are ignored.
///
/// # Errors
///
/// Returns a description of the first segment that has no `:` or an empty name.
pub fn parse_header_map(raw: &str) -> Result<Vec<(String, String)>, String> {
    raw.split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = segment
                .split_once(':')
                .ok_or_else(|| format!("header \"{segment}\" is missing a ':' separator"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("header \"{segment}\" has an empty name"));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
