//! 缓存内存优化与指标相关方法
//!
//! 内存占用越过阈值后按优先级级联清理三类可再生缓存：
//! 用户报告列表 → 分享分析 → 报告统计。一旦触发即全部清空，
//! 中途不复查内存（清理的都是可从后备存储重建的条目）。

use super::CacheManager;
use crate::cache::keys;
use crate::types::maintenance::{CacheMetrics, KeySample, OptimizeReport};
use chrono::Utc;
use rat_logger::{debug, info, warn};

impl CacheManager {
    /// 按内存阈值执行分类清理
    ///
    /// 低于阈值时不做任何删除
    pub async fn optimize_cache(&self) -> OptimizeReport {
        let stats = self.client.get_stats().await;
        if stats.memory_usage_bytes <= self.config.memory_threshold_bytes {
            debug!(
                "内存占用 {} 字节未超过阈值 {} 字节，跳过优化",
                stats.memory_usage_bytes, self.config.memory_threshold_bytes
            );
            return OptimizeReport {
                triggered: false,
                memory_usage_bytes: stats.memory_usage_bytes,
                ..Default::default()
            };
        }

        warn!(
            "内存占用 {} 字节超过阈值 {} 字节，开始分类清理",
            stats.memory_usage_bytes, self.config.memory_threshold_bytes
        );
        let deleted_user_reports = self
            .client
            .delete_pattern(&keys::user_reports_pattern())
            .await;
        let deleted_analytics = self
            .client
            .delete_pattern(&keys::share_analytics_pattern())
            .await;
        let deleted_stats = self
            .client
            .delete_pattern(&keys::report_stats_pattern())
            .await;

        let report = OptimizeReport {
            triggered: true,
            memory_usage_bytes: stats.memory_usage_bytes,
            deleted_user_reports,
            deleted_analytics,
            deleted_stats,
        };
        info!(
            "缓存优化完成: 用户列表 {} 个, 分享分析 {} 个, 统计 {} 个",
            report.deleted_user_reports, report.deleted_analytics, report.deleted_stats
        );
        report
    }

    /// 采集缓存指标快照
    ///
    /// 聚合后端统计、累计命中率与两个知名采样键的即时状态
    pub async fn get_cache_metrics(&self) -> CacheMetrics {
        let stats = self.client.get_stats().await;
        let perf = self.client.performance_stats();

        let mut samples = Vec::with_capacity(2);
        for key in [keys::recent_reports(), keys::report_stats(None)] {
            let exists = self.client.exists(&key).await;
            let ttl_secs = if exists { self.client.ttl(&key).await } else { None };
            samples.push(KeySample {
                key,
                exists,
                ttl_secs,
            });
        }

        CacheMetrics {
            connected: stats.connected,
            key_count: stats.key_count,
            memory_usage_bytes: stats.memory_usage_bytes,
            hit_rate: perf.hit_rate(),
            samples,
            collected_at: Utc::now(),
        }
    }
}
