use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Category landing page, e.g. `https://www2.hm.com/en_us/men/products/jeans.html`.
    pub base_url: String,
    /// Detail page URL with a `{id}` placeholder for the article code.
    pub product_url_template: String,
    /// Local working directory; relative store and log paths resolve against it.
    pub work_dir: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub user_agent: String,
    /// Extra request headers sent with every page fetch, in configured order.
    pub http_headers: Vec<(String, String)>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Number of top-level products between politeness pauses. `0` disables pausing.
    pub pause_every: usize,
    pub pause_secs: u64,
    pub max_concurrent_products: usize,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Absolute-or-work-dir-relative path of the SQLite store.
    #[must_use]
    pub fn resolved_database_path(&self) -> PathBuf {
        self.work_dir.join(&self.database_path)
    }

    #[must_use]
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.work_dir.join(&self.log_dir)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self
            .http_headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("product_url_template", &self.product_url_template)
            .field("work_dir", &self.work_dir)
            .field("database_path", &self.database_path)
            .field("table_name", &self.table_name)
            .field("log_dir", &self.log_dir)
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("http_headers", &header_names)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("pause_every", &self.pause_every)
            .field("pause_secs", &self.pause_secs)
            .field("max_concurrent_products", &self.max_concurrent_products)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}
