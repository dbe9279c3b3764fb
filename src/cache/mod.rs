//! 缓存层模块
//!
//! 提供字节级后端抽象、命名空间客户端、键注册表与统计类型。
//! 缓存整体定位为尽力而为的加速器：不可用时系统退化为仅依赖后备存储。

pub mod backend;
pub mod client;
pub mod keys;
pub mod stats;

pub use backend::{CacheBackend, MemoryBackend, RedisBackend};
pub use client::{CacheClient, CacheLookup, CacheWrite};
pub use stats::{
    BackendStats, CachePerformanceStats, ClientStats, HealthReport, HealthStatus,
};
