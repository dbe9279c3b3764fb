//! 缓存维护操作相关类型模块
//!
//! 定义预热选项、维护结果报告和缓存指标快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 缓存预热选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupOptions {
    /// 预热的最近公开报告数量
    pub recent_reports_count: usize,
    /// 按分享次数预热的热门报告数量
    pub popular_reports_count: usize,
    /// 活跃用户判定窗口（天）
    pub active_user_window_days: i64,
    /// 单次预热的活跃用户数上限
    pub max_users: usize,
}

impl Default for WarmupOptions {
    fn default() -> Self {
        Self {
            recent_reports_count: 10,
            popular_reports_count: 20,
            active_user_window_days: 7,
            max_users: 50,
        }
    }
}

/// 预热执行结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarmupReport {
    /// 写入的最近报告条数
    pub recent_reports: usize,
    /// 预热的热门报告条数
    pub popular_reports: usize,
    /// 预热的用户列表缓存数
    pub warmed_users: usize,
}

/// 内存优化执行结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeReport {
    /// 本次是否触发了清理
    pub triggered: bool,
    /// 触发时的内存占用（字节）
    pub memory_usage_bytes: u64,
    /// 按类别删除的键数量
    pub deleted_user_reports: usize,
    /// 删除的分享分析键数量
    pub deleted_analytics: usize,
    /// 删除的统计键数量
    pub deleted_stats: usize,
}

/// 采样键的探测结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySample {
    /// 被探测的缓存键（未加命名空间前缀）
    pub key: String,
    /// 键当前是否存在
    pub exists: bool,
    /// 剩余 TTL（秒），键不存在或无 TTL 时为 None
    pub ttl_secs: Option<u64>,
}

/// 缓存指标快照
///
/// 聚合客户端统计与两个知名采样键的即时状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// 缓存后端是否在线
    pub connected: bool,
    /// 命名空间下的键总数
    pub key_count: u64,
    /// 内存占用（字节）
    pub memory_usage_bytes: u64,
    /// 累计命中率 (0.0-1.0)
    pub hit_rate: f64,
    /// 采样键状态
    pub samples: Vec<KeySample>,
    /// 快照生成时间
    pub collected_at: DateTime<Utc>,
}
