//! 内存后备存储模块
//!
//! 面向测试和嵌入式演示场景的 ReportStore 实现，
//! 数据保存在进程内，不做持久化

use super::ReportStore;
use crate::error::CacheResult;
use crate::types::report::{ReportStatistics, ReportSummary, ShareAnalytics};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// 存储记录：投影之外附带归属与可见性字段
#[derive(Debug, Clone)]
pub struct StoredReport {
    /// 报告投影
    pub summary: ReportSummary,
    /// 归属用户，匿名报告为 None
    pub user_id: Option<String>,
    /// 是否公开可见
    pub is_public: bool,
    /// 累计分享次数
    pub share_count: u64,
}

/// 内存后备存储
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: RwLock<Vec<StoredReport>>,
    analytics: RwLock<HashMap<String, ShareAnalytics>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或覆盖一条报告记录
    pub async fn insert_report(&self, record: StoredReport) {
        let mut reports = self.reports.write().await;
        reports.retain(|r| r.summary.slug != record.summary.slug);
        reports.push(record);
    }

    /// 删除报告记录，返回是否存在
    pub async fn remove_report(&self, slug: &str) -> bool {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.summary.slug != slug);
        reports.len() != before
    }

    /// 写入分享分析数据
    pub async fn insert_analytics(&self, analytics: ShareAnalytics) {
        self.analytics
            .write()
            .await
            .insert(analytics.check_id.clone(), analytics);
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn find_by_slug(&self, slug: &str) -> CacheResult<Option<ReportSummary>> {
        let reports = self.reports.read().await;
        Ok(reports
            .iter()
            .find(|r| r.summary.slug == slug)
            .map(|r| r.summary.clone()))
    }

    async fn reports_by_slugs(&self, slugs: &[String]) -> CacheResult<Vec<ReportSummary>> {
        let wanted: HashSet<&str> = slugs.iter().map(|s| s.as_str()).collect();
        let reports = self.reports.read().await;
        Ok(reports
            .iter()
            .filter(|r| wanted.contains(r.summary.slug.as_str()))
            .map(|r| r.summary.clone())
            .collect())
    }

    async fn recent_public_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let reports = self.reports.read().await;
        let mut public: Vec<&StoredReport> = reports.iter().filter(|r| r.is_public).collect();
        public.sort_by(|a, b| b.summary.created_at.cmp(&a.summary.created_at));
        Ok(public
            .into_iter()
            .take(limit)
            .map(|r| r.summary.clone())
            .collect())
    }

    async fn top_shared_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let reports = self.reports.read().await;
        let mut sorted: Vec<&StoredReport> = reports.iter().collect();
        sorted.sort_by(|a, b| b.share_count.cmp(&a.share_count));
        Ok(sorted
            .into_iter()
            .take(limit)
            .map(|r| r.summary.clone())
            .collect())
    }

    async fn user_reports(&self, user_id: &str, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let reports = self.reports.read().await;
        let mut owned: Vec<&StoredReport> = reports
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .collect();
        owned.sort_by(|a, b| b.summary.created_at.cmp(&a.summary.created_at));
        Ok(owned
            .into_iter()
            .take(limit)
            .map(|r| r.summary.clone())
            .collect())
    }

    async fn active_user_ids(&self, since: DateTime<Utc>) -> CacheResult<Vec<String>> {
        let reports = self.reports.read().await;
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for report in reports.iter() {
            if report.summary.created_at >= since {
                if let Some(user_id) = &report.user_id {
                    if seen.insert(user_id.clone()) {
                        users.push(user_id.clone());
                    }
                }
            }
        }
        Ok(users)
    }

    async fn existing_slugs(&self, candidates: &[String]) -> CacheResult<HashSet<String>> {
        let reports = self.reports.read().await;
        let known: HashSet<&str> = reports.iter().map(|r| r.summary.slug.as_str()).collect();
        Ok(candidates
            .iter()
            .filter(|c| known.contains(c.as_str()))
            .cloned()
            .collect())
    }

    async fn report_statistics(&self, user_id: Option<&str>) -> CacheResult<ReportStatistics> {
        let reports = self.reports.read().await;
        let scoped: Vec<&StoredReport> = reports
            .iter()
            .filter(|r| match user_id {
                Some(user_id) => r.user_id.as_deref() == Some(user_id),
                None => true,
            })
            .collect();

        let total = scoped.len() as u64;
        let average_score = if scoped.is_empty() {
            0.0
        } else {
            scoped.iter().map(|r| r.summary.security_score as f64).sum::<f64>() / total as f64
        };
        Ok(ReportStatistics {
            total_reports: total,
            average_score,
            reports_with_ai: scoped.iter().filter(|r| r.summary.has_ai_analysis).count() as u64,
            last_created_at: scoped.iter().map(|r| r.summary.created_at).max(),
        })
    }

    async fn share_analytics(&self, check_id: &str) -> CacheResult<Option<ShareAnalytics>> {
        Ok(self.analytics.read().await.get(check_id).cloned())
    }
}
