use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageLimits};

/// 默认批量操作 id 上限
pub const DEFAULT_MAX_BULK_IDS: usize = 500;

/// 核心配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_URL | sqlite:blog.db | SQLite 数据库地址 |
/// | DB_MAX_CONNECTIONS | 5 | 连接池大小 |
/// | DB_BUSY_TIMEOUT_MS | 5000 | 写锁等待时间(毫秒) |
/// | DEFAULT_PAGE_SIZE | 10 | 默认每页数量 |
/// | MAX_PAGE_SIZE | 100 | 每页数量上限 |
/// | MAX_BULK_IDS | 500 | 单次批量操作 id 上限 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志目录，设置后按天滚动写文件 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_URL=sqlite:/data/blog.db MAX_PAGE_SIZE=50 cargo test
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_busy_timeout_ms: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// 批量接口允许的最大 id 数
    pub max_bulk_ids: usize,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            db_busy_timeout_ms: env_or("DB_BUSY_TIMEOUT_MS", defaults.db_busy_timeout_ms),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("MAX_PAGE_SIZE", defaults.max_page_size),
            max_bulk_ids: env_or("MAX_BULK_IDS", defaults.max_bulk_ids),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// 先读取 `.env` 文件 (如果存在)，再从环境变量加载
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }
}

/// 文档表中的默认值，不读取环境变量
impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:blog.db".into(),
            db_max_connections: 5,
            db_busy_timeout_ms: 5000,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_bulk_ids: DEFAULT_MAX_BULK_IDS,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}
