use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db")]
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,
    #[serde(default = "default_busy_timeout")]
    pub db_busy_timeout_ms: u32,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl: i64,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_required_videos")]
    pub required_intro_videos: i32,
    #[serde(default = "default_dashboard_limit")]
    pub dashboard_limit: i64,
}

fn default_port() -> u16 { 5000 }
fn default_db() -> String { "elroiconnect.db".into() }
fn default_pool_size() -> u32 { 8 }
fn default_busy_timeout() -> u32 { 5_000 }
fn default_jwt_secret() -> String { "dev-secret-for-local".into() }
fn default_access_ttl() -> i64 { 86_400 }
fn default_upload_dir() -> String { "static/uploads".into() }
fn default_max_upload() -> usize { 16 * 1024 * 1024 }
fn default_required_videos() -> i32 { 2 }
fn default_dashboard_limit() -> i64 { 10 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_url: default_db(),
            db_pool_size: default_pool_size(),
            db_busy_timeout_ms: default_busy_timeout(),
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl: default_access_ttl(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload(),
            required_intro_videos: default_required_videos(),
            dashboard_limit: default_dashboard_limit(),
        }
    }
}

impl AppConfig {
    /// Reads `ELROI__*` environment variables, e.g. `ELROI__DATABASE_URL`.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ELROI").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_local_development() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.required_intro_videos, 2);
        assert_eq!(config.dashboard_limit, 10);
        assert_eq!(config.upload_dir, "static/uploads");
    }
}
