//! 缓存配置类型模块
//!
//! 所有配置项均可序列化，支持 TOML 持久化；构建器在 config 模块中提供

use serde::{Deserialize, Serialize};

/// Redis 连接字符串环境变量名
///
/// 未设置时缓存层降级为无后端的直通模式，系统仅依赖后备存储
pub const REDIS_URL_ENV: &str = "LINKSHIELD_REDIS_URL";

/// 缓存层总配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,
    /// 缓存键命名空间前缀
    pub namespace: String,
    /// Redis 连接配置（None 表示降级为无后端模式）
    pub redis: Option<RedisConfig>,
    /// TTL 配置
    pub ttl: TtlConfig,
    /// 内存占用优化阈值（字节），超过后触发分类清理
    pub memory_threshold_bytes: u64,
    /// 失效扫描单页键数量上限
    pub scan_page_size: usize,
}

impl CacheConfig {
    /// 从环境变量构建配置
    ///
    /// 读取 `LINKSHIELD_REDIS_URL`，未设置时返回无后端降级配置
    pub fn from_env() -> Self {
        let redis = std::env::var(REDIS_URL_ENV).ok().map(RedisConfig::new);
        Self {
            enabled: true,
            namespace: default_namespace(),
            redis,
            ttl: TtlConfig::default(),
            memory_threshold_bytes: default_memory_threshold(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: default_namespace(),
            redis: None,
            ttl: TtlConfig::default(),
            memory_threshold_bytes: default_memory_threshold(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

fn default_namespace() -> String {
    "linkshield".to_string()
}

/// 默认内存优化阈值: 100MB
fn default_memory_threshold() -> u64 {
    100 * 1024 * 1024
}

fn default_scan_page_size() -> usize {
    200
}

/// Redis 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// 连接字符串，如 redis://127.0.0.1:6379/0
    pub url: String,
    /// 连接重试次数上限
    pub connect_attempts: u32,
    /// 重试基础延迟（毫秒），按指数退避增长并附加抖动
    pub retry_base_delay_ms: u64,
}

impl RedisConfig {
    /// 使用默认重试策略创建连接配置
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_attempts: 3,
            retry_base_delay_ms: 200,
        }
    }
}

/// TTL 配置
///
/// 列表类数据比单条记录老化更快，使用更短的 TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConfig {
    /// 默认 TTL（秒），用于单条报告缓存
    pub default_ttl_secs: u64,
    /// 最近报告列表 TTL（秒）
    pub recent_list_ttl_secs: u64,
    /// 统计数据 TTL（秒）
    pub stats_ttl_secs: u64,
    /// 分享访问分析 TTL（秒）
    pub analytics_ttl_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
            recent_list_ttl_secs: 300,
            stats_ttl_secs: 600,
            analytics_ttl_secs: 1800,
        }
    }
}

/// 周期性维护配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// 维护周期（分钟）
    pub interval_minutes: u64,
}

impl MaintenanceConfig {
    /// 维护周期对应的 Duration
    pub fn period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_minutes * 60)
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
        }
    }
}
