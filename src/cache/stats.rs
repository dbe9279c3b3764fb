//! 缓存统计模块
//!
//! 提供缓存性能统计和后端聚合信息

use serde::{Deserialize, Serialize};

/// 缓存性能统计
#[derive(Debug, Clone)]
pub struct CachePerformanceStats {
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 缓存写入次数
    pub writes: u64,
    /// 缓存删除次数
    pub deletes: u64,
    /// 后端不可用导致的降级次数
    pub degraded_ops: u64,
}

impl CachePerformanceStats {
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            writes: 0,
            deletes: 0,
            degraded_ops: 0,
        }
    }

    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Default for CachePerformanceStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 后端聚合统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStats {
    /// 当前键数量
    pub key_count: u64,
    /// 内存使用量（字节）
    pub memory_usage_bytes: u64,
}

impl Default for BackendStats {
    fn default() -> Self {
        Self {
            key_count: 0,
            memory_usage_bytes: 0,
        }
    }
}

/// 客户端对外统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStats {
    /// 后端是否在线
    pub connected: bool,
    /// 命名空间下的键数量
    pub key_count: u64,
    /// 内存使用量（字节）
    pub memory_usage_bytes: u64,
}

/// 健康检查状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// 写-读-删往返成功
    Healthy,
    /// 后端不可用或往返失败
    Unhealthy,
}

/// 健康检查报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// 健康状态
    pub status: HealthStatus,
    /// 诊断详情
    pub details: String,
}
