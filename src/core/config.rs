use std::time::Duration;

use crate::db::ConnectionSettings;

/// 服务器配置 - 订单后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DB_ENDPOINT | rocksdb://data/storefront.db | 数据库端点 (测试用 mem://) |
/// | DB_NAMESPACE | storefront | 数据库命名空间 |
/// | DB_DATABASE | storefront | 数据库名 |
/// | DB_MAX_RETRIES | 5 | 连接重试次数上限 |
/// | DB_RETRY_BASE_MS | 2000 | 退避基础延迟 (毫秒，第 n 次重试等待 n×base) |
/// | DB_RECONNECT_INTERVAL_MS | 30000 | 后台重连检查间隔 (毫秒) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时 (毫秒) |
///
/// # 示例
///
/// ```ignore
/// DB_ENDPOINT=mem:// HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 数据库端点 (surrealdb engine::any 格式)
    pub db_endpoint: String,
    /// 数据库命名空间
    pub db_namespace: String,
    /// 数据库名
    pub db_database: String,
    /// 连接重试次数上限
    pub db_max_retries: u32,
    /// 退避基础延迟 (毫秒)
    pub db_retry_base_ms: u64,
    /// 后台重连检查间隔 (毫秒)
    pub db_reconnect_interval_ms: u64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            db_endpoint: std::env::var("DB_ENDPOINT")
                .unwrap_or_else(|_| "rocksdb://data/storefront.db".into()),
            db_namespace: std::env::var("DB_NAMESPACE").unwrap_or_else(|_| "storefront".into()),
            db_database: std::env::var("DB_DATABASE").unwrap_or_else(|_| "storefront".into()),
            db_max_retries: std::env::var("DB_MAX_RETRIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            db_retry_base_ms: std::env::var("DB_RETRY_BASE_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2000),
            db_reconnect_interval_ms: std::env::var("DB_RECONNECT_INTERVAL_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
        }
    }

    /// 转换为连接管理器设置
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            endpoint: self.db_endpoint.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            max_retries: self.db_max_retries,
            retry_base: Duration::from_millis(self.db_retry_base_ms),
            reconnect_interval: Duration::from_millis(self.db_reconnect_interval_ms),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
