//! 缓存预热相关方法
//!
//! 顺序执行三个预热步骤：最近报告列表、热门报告单条缓存、
//! 活跃用户的报告列表缓存。任一步骤失败即中止后续步骤并传播错误，
//! 已写入的条目保留（缓存是尽力而为的，部分预热可以接受）。

use super::{CacheManager, DEFAULT_USER_LIST_LIMIT};
use crate::error::CacheResult;
use crate::types::maintenance::{WarmupOptions, WarmupReport};
use chrono::{Duration, Utc};
use rat_logger::{debug, info};

impl CacheManager {
    /// 执行全量缓存预热
    pub async fn warm_up_cache(&self, options: WarmupOptions) -> CacheResult<WarmupReport> {
        info!(
            "开始缓存预热: 最近 {} 条, 热门 {} 条, 活跃窗口 {} 天",
            options.recent_reports_count,
            options.popular_reports_count,
            options.active_user_window_days
        );

        // 步骤一：最近公开报告列表
        let recent = self
            .service
            .preload_recent_reports(options.recent_reports_count)
            .await?;

        // 步骤二：按分享次数预热热门报告的单条缓存
        let popular = self
            .store
            .top_shared_reports(options.popular_reports_count)
            .await?;
        let slugs: Vec<String> = popular.iter().map(|r| r.slug.clone()).collect();
        let popular_warmed = self.service.warm_up_reports(&slugs).await?;

        // 步骤三：近期有报告活动的用户列表缓存
        let since = Utc::now() - Duration::days(options.active_user_window_days);
        let users = self.store.active_user_ids(since).await?;
        let mut warmed_users = 0;
        for user_id in users.iter().take(options.max_users) {
            self.service
                .preload_user_reports(user_id, DEFAULT_USER_LIST_LIMIT)
                .await?;
            warmed_users += 1;
        }

        let report = WarmupReport {
            recent_reports: recent.len(),
            popular_reports: popular_warmed,
            warmed_users,
        };
        info!(
            "缓存预热完成: 最近 {} 条, 热门 {} 条, 用户 {} 个",
            report.recent_reports, report.popular_reports, report.warmed_users
        );
        Ok(report)
    }

    /// 预载单个用户的报告列表缓存
    pub async fn preload_user_cache(&self, user_id: &str) -> CacheResult<usize> {
        let reports = self
            .service
            .preload_user_reports(user_id, DEFAULT_USER_LIST_LIMIT)
            .await?;
        debug!("用户缓存已预载: user_id={}, {} 条", user_id, reports.len());
        Ok(reports.len())
    }
}
