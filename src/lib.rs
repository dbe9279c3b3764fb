//! linkshield_cache - LinkShield 分享报告缓存加速层
//!
//! 提供 Redis/内存双后端的键值缓存客户端、读穿透缓存服务与缓存维护管理器。
//! 缓存整体定位为尽力而为的加速器：后端不可用时所有操作退化为安全默认值，
//! 系统仅依赖后备存储继续正确运行，用户最多感知到缓存冷读的正常延迟。

// 导出所有公共模块
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod service;
pub mod store;
pub mod types;

// 重新导出常用类型和函数
pub use cache::{
    CacheBackend, CacheClient, CacheLookup, CachePerformanceStats, CacheWrite, ClientStats,
    HealthReport, HealthStatus, MemoryBackend, RedisBackend,
};
pub use config::{passthrough_cache_config, redis_cache_config};
pub use error::{CacheError, CacheResult};
pub use manager::CacheManager;
pub use service::CachedReportService;
pub use store::{MemoryReportStore, ReportStore, StoredReport};
#[cfg(feature = "sqlite-store")]
pub use store::SqliteReportStore;
pub use types::{
    CacheConfig, CacheMetrics, MaintenanceConfig, OptimizeReport, RedisConfig, ReportStatistics,
    ReportSummary, ShareAnalytics, TtlConfig, WarmupOptions, WarmupReport,
};

use rat_logger::debug;
use std::sync::Arc;

/// 初始化 linkshield_cache 库
///
/// 注意：日志系统由调用者自行初始化，本库不自动初始化日志
pub fn init() {
    debug!("{} 初始化完成", get_info());
}

/// 按配置组装完整的缓存管理器
///
/// 依次完成：缓存客户端连接（失败时降级为直通模式）、
/// 缓存服务与管理器的构造注入。后备存储由调用者提供，
/// 同一进程内共享同一个管理器实例即可复用底层连接。
pub async fn build_cache_manager(
    config: CacheConfig,
    store: Arc<dyn ReportStore>,
) -> CacheManager {
    let client = Arc::new(CacheClient::connect(config.clone()).await);
    CacheManager::new(store, client, config)
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
