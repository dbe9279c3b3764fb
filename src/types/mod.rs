//! 公共类型定义模块
//!
//! 集中导出缓存配置、报告投影和维护操作相关类型

pub mod cache_config;
pub mod maintenance;
pub mod report;

pub use cache_config::{CacheConfig, MaintenanceConfig, RedisConfig, TtlConfig};
pub use maintenance::{CacheMetrics, KeySample, OptimizeReport, WarmupOptions, WarmupReport};
pub use report::{ReportStatistics, ReportSummary, ShareAnalytics};
