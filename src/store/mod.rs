//! 后备存储模块
//!
//! 定义权威数据源的查询边界。缓存层永远不拥有数据，
//! 所有缓存条目都是后备存储某一时刻状态的严格函数。

pub mod memory;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use crate::error::CacheResult;
use crate::types::report::{ReportStatistics, ReportSummary, ShareAnalytics};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub use memory::{MemoryReportStore, StoredReport};
#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteReportStore;

/// 分享报告后备存储接口
///
/// 读操作全部异步；实现方保证返回的投影是持久化状态的一致快照
#[async_trait]
pub trait ReportStore: Send + Sync + std::fmt::Debug {
    /// 按 slug 查找单条报告
    async fn find_by_slug(&self, slug: &str) -> CacheResult<Option<ReportSummary>>;

    /// 批量按 slug 查找，用于缓存预热；结果不保证与输入同序
    async fn reports_by_slugs(&self, slugs: &[String]) -> CacheResult<Vec<ReportSummary>>;

    /// 最近创建的公开报告，按创建时间倒序
    async fn recent_public_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>>;

    /// 按分享次数倒序的热门报告
    async fn top_shared_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>>;

    /// 指定用户的报告列表，按创建时间倒序
    async fn user_reports(&self, user_id: &str, limit: usize) -> CacheResult<Vec<ReportSummary>>;

    /// 自指定时间以来有报告活动的用户ID（去重）
    async fn active_user_ids(&self, since: DateTime<Utc>) -> CacheResult<Vec<String>>;

    /// 批量存在性检查：返回候选中仍然存在的 slug 集合
    ///
    /// 单次 IN 查询代替逐键往返，供失效扫描按页调用
    async fn existing_slugs(&self, candidates: &[String]) -> CacheResult<HashSet<String>>;

    /// 报告统计，user_id 为 None 时返回全局统计
    async fn report_statistics(&self, user_id: Option<&str>) -> CacheResult<ReportStatistics>;

    /// 分享访问分析数据
    async fn share_analytics(&self, check_id: &str) -> CacheResult<Option<ShareAnalytics>>;
}
