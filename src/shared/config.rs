use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// オンライン中の定期同期を有効にするか
    pub auto_sync: bool,
    /// 定期同期の間隔（秒）
    pub sync_interval: u64,
    /// レコードごとの再試行上限
    pub max_retry: u32,
    /// 同期済みレコードの保持日数
    pub retention_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 読み取りキャッシュのTTL（秒）
    pub read_cache_ttl: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: format!(
                    "sqlite://{}?mode=rwc",
                    default_data_dir().join("kensa.db").display()
                ),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig::default(),
            cache: CacheConfig {
                read_cache_ttl: 300,
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval: 300,
            max_retry: 3,
            retention_days: 7,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("kensa")
}
