//! 带缓存的报告服务模块
//!
//! 在后备存储之上做透明的读穿透缓存包装：
//! 读命中直接返回投影，未命中时回源并写回缓存；
//! 存储层错误原样向上传播且绝不写入缓存。

use crate::cache::client::{CacheClient, CacheLookup, CacheWrite};
use crate::cache::keys;
use crate::error::CacheResult;
use crate::store::ReportStore;
use crate::types::report::{ReportStatistics, ReportSummary, ShareAnalytics};
use rat_logger::debug;
use std::sync::Arc;

/// 带缓存功能的报告服务包装器
#[derive(Debug, Clone)]
pub struct CachedReportService {
    /// 权威后备存储
    store: Arc<dyn ReportStore>,
    /// 缓存客户端
    client: Arc<CacheClient>,
}

impl CachedReportService {
    /// 创建新的缓存服务
    pub fn new(store: Arc<dyn ReportStore>, client: Arc<CacheClient>) -> Self {
        Self { store, client }
    }

    /// 按 slug 获取报告 - 先查缓存，未命中时回源并写回
    ///
    /// 仅缓存回源成功且存在的结果；存储错误不缓存、直接传播
    pub async fn get_report_by_slug(&self, slug: &str) -> CacheResult<Option<ReportSummary>> {
        let key = keys::report(slug);
        if let CacheLookup::Hit(summary) = self.client.get::<ReportSummary>(&key).await {
            return Ok(Some(summary));
        }

        let summary = self.store.find_by_slug(slug).await?;
        if let Some(summary) = &summary {
            self.client.set(&key, summary, None).await;
            debug!("报告已回填缓存: slug={}", slug);
        }
        Ok(summary)
    }

    /// 预载最近公开报告列表
    ///
    /// 列表数据老化更快，使用更短的列表 TTL
    pub async fn preload_recent_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let reports = self.store.recent_public_reports(limit).await?;
        let ttl = self.client.ttl_config().recent_list_ttl_secs;
        self.client
            .set(&keys::recent_reports(), &reports, Some(ttl))
            .await;
        debug!("最近报告列表已预载: {} 条", reports.len());
        Ok(reports)
    }

    /// 按 slug 列表批量预热单条报告缓存
    ///
    /// 后备存储批量取回后一次性批量写入；不存在的 slug 不会产生缓存条目
    pub async fn warm_up_reports(&self, slugs: &[String]) -> CacheResult<usize> {
        if slugs.is_empty() {
            return Ok(0);
        }
        let reports = self.store.reports_by_slugs(slugs).await?;
        let entries: Vec<CacheWrite<&ReportSummary>> = reports
            .iter()
            .map(|summary| CacheWrite {
                key: keys::report(&summary.slug),
                value: summary,
                ttl_secs: None,
            })
            .collect();
        self.client.mset(&entries).await;
        debug!("报告批量预热完成: 请求 {} 个, 写入 {} 个", slugs.len(), entries.len());
        Ok(entries.len())
    }

    /// 获取用户的分享报告列表 - 读穿透缓存
    pub async fn get_user_reports(
        &self,
        user_id: &str,
        limit: usize,
    ) -> CacheResult<Vec<ReportSummary>> {
        let key = keys::user_reports(user_id);
        if let CacheLookup::Hit(reports) = self.client.get::<Vec<ReportSummary>>(&key).await {
            return Ok(reports);
        }

        let reports = self.store.user_reports(user_id, limit).await?;
        self.client.set(&key, &reports, None).await;
        Ok(reports)
    }

    /// 强制刷新用户报告列表缓存（跳过读缓存，直接回源覆盖）
    pub async fn preload_user_reports(
        &self,
        user_id: &str,
        limit: usize,
    ) -> CacheResult<Vec<ReportSummary>> {
        let reports = self.store.user_reports(user_id, limit).await?;
        self.client
            .set(&keys::user_reports(user_id), &reports, None)
            .await;
        debug!("用户报告列表已预载: user_id={}, {} 条", user_id, reports.len());
        Ok(reports)
    }

    /// 获取报告统计 - 读穿透缓存，user_id 为 None 时为全局统计
    pub async fn get_report_statistics(
        &self,
        user_id: Option<&str>,
    ) -> CacheResult<ReportStatistics> {
        let key = keys::report_stats(user_id);
        if let CacheLookup::Hit(stats) = self.client.get::<ReportStatistics>(&key).await {
            return Ok(stats);
        }

        let stats = self.store.report_statistics(user_id).await?;
        let ttl = self.client.ttl_config().stats_ttl_secs;
        self.client.set(&key, &stats, Some(ttl)).await;
        Ok(stats)
    }

    /// 获取分享访问分析 - 读穿透缓存
    pub async fn get_share_analytics(
        &self,
        check_id: &str,
    ) -> CacheResult<Option<ShareAnalytics>> {
        let key = keys::share_analytics(check_id);
        if let CacheLookup::Hit(analytics) = self.client.get::<ShareAnalytics>(&key).await {
            return Ok(Some(analytics));
        }

        let analytics = self.store.share_analytics(check_id).await?;
        if let Some(analytics) = &analytics {
            let ttl = self.client.ttl_config().analytics_ttl_secs;
            self.client.set(&key, analytics, Some(ttl)).await;
        }
        Ok(analytics)
    }

    /// 底层缓存客户端
    pub fn client(&self) -> &Arc<CacheClient> {
        &self.client
    }

    /// 底层后备存储
    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }
}
