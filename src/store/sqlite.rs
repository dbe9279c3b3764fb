//! SQLite 后备存储模块
//!
//! 基于 sqlx 的 ReportStore 实现，面向单机部署。
//! 生产环境的 LinkShield 主库由 ORM 层负责迁移，
//! 这里只维护缓存层消费的最小表结构。

use super::ReportStore;
use crate::error::CacheResult;
use crate::types::report::{ReportStatistics, ReportSummary, ShareAnalytics};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rat_logger::debug;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::HashSet;

/// IN 子句单次绑定的参数上限
const IN_CLAUSE_CHUNK: usize = 400;

/// SQLite 后备存储
#[derive(Debug, Clone)]
pub struct SqliteReportStore {
    pool: SqlitePool,
}

impl SqliteReportStore {
    /// 连接数据库并确保表结构存在
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        debug!("SQLite 后备存储已连接: {}", url);
        Ok(store)
    }

    /// 创建缓存层依赖的最小表结构
    async fn ensure_schema(&self) -> CacheResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shareable_reports (
                slug            TEXT PRIMARY KEY,
                url             TEXT NOT NULL,
                domain          TEXT NOT NULL,
                security_score  INTEGER NOT NULL,
                created_at      TEXT NOT NULL,
                has_ai_analysis INTEGER NOT NULL DEFAULT 0,
                user_id         TEXT,
                is_public       INTEGER NOT NULL DEFAULT 1,
                share_count     INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS share_analytics (
                check_id       TEXT PRIMARY KEY,
                view_count     INTEGER NOT NULL DEFAULT 0,
                last_viewed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 写入或覆盖一条报告记录
    pub async fn insert_report(
        &self,
        summary: &ReportSummary,
        user_id: Option<&str>,
        is_public: bool,
        share_count: u64,
    ) -> CacheResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO shareable_reports
                (slug, url, domain, security_score, created_at, has_ai_analysis,
                 user_id, is_public, share_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&summary.slug)
        .bind(&summary.url)
        .bind(&summary.domain)
        .bind(summary.security_score)
        .bind(summary.created_at)
        .bind(summary.has_ai_analysis)
        .bind(user_id)
        .bind(is_public)
        .bind(share_count as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 删除报告记录，返回是否存在
    pub async fn remove_report(&self, slug: &str) -> CacheResult<bool> {
        let result = sqlx::query("DELETE FROM shareable_reports WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 写入分享分析数据
    pub async fn insert_analytics(&self, analytics: &ShareAnalytics) -> CacheResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO share_analytics (check_id, view_count, last_viewed_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&analytics.check_id)
        .bind(analytics.view_count as i64)
        .bind(analytics.last_viewed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_summary(row: &SqliteRow) -> CacheResult<ReportSummary> {
    Ok(ReportSummary {
        slug: row.try_get("slug")?,
        url: row.try_get("url")?,
        domain: row.try_get("domain")?,
        security_score: row.try_get("security_score")?,
        created_at: row.try_get("created_at")?,
        has_ai_analysis: row.try_get("has_ai_analysis")?,
    })
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn find_by_slug(&self, slug: &str) -> CacheResult<Option<ReportSummary>> {
        let row = sqlx::query(
            "SELECT slug, url, domain, security_score, created_at, has_ai_analysis \
             FROM shareable_reports WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_summary).transpose()
    }

    async fn reports_by_slugs(&self, slugs: &[String]) -> CacheResult<Vec<ReportSummary>> {
        let mut results = Vec::with_capacity(slugs.len());
        for chunk in slugs.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT slug, url, domain, security_score, created_at, has_ai_analysis \
                 FROM shareable_reports WHERE slug IN ({})",
                placeholders
            );
            let mut query = sqlx::query(&sql);
            for slug in chunk {
                query = query.bind(slug);
            }
            let rows = query.fetch_all(&self.pool).await?;
            for row in &rows {
                results.push(row_to_summary(row)?);
            }
        }
        Ok(results)
    }

    async fn recent_public_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let rows = sqlx::query(
            "SELECT slug, url, domain, security_score, created_at, has_ai_analysis \
             FROM shareable_reports WHERE is_public = 1 \
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_summary).collect()
    }

    async fn top_shared_reports(&self, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let rows = sqlx::query(
            "SELECT slug, url, domain, security_score, created_at, has_ai_analysis \
             FROM shareable_reports ORDER BY share_count DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_summary).collect()
    }

    async fn user_reports(&self, user_id: &str, limit: usize) -> CacheResult<Vec<ReportSummary>> {
        let rows = sqlx::query(
            "SELECT slug, url, domain, security_score, created_at, has_ai_analysis \
             FROM shareable_reports WHERE user_id = ? \
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_summary).collect()
    }

    async fn active_user_ids(&self, since: DateTime<Utc>) -> CacheResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT user_id FROM shareable_reports \
             WHERE user_id IS NOT NULL AND created_at >= ?",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("user_id").map_err(Into::into))
            .collect()
    }

    async fn existing_slugs(&self, candidates: &[String]) -> CacheResult<HashSet<String>> {
        let mut existing = HashSet::new();
        for chunk in candidates.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT slug FROM shareable_reports WHERE slug IN ({})",
                placeholders
            );
            let mut query = sqlx::query(&sql);
            for slug in chunk {
                query = query.bind(slug);
            }
            let rows = query.fetch_all(&self.pool).await?;
            for row in &rows {
                existing.insert(row.try_get::<String, _>("slug")?);
            }
        }
        Ok(existing)
    }

    async fn report_statistics(&self, user_id: Option<&str>) -> CacheResult<ReportStatistics> {
        let sql = match user_id {
            Some(_) => {
                "SELECT COUNT(*) AS total, AVG(security_score) AS avg_score, \
                 COALESCE(SUM(has_ai_analysis), 0) AS with_ai, MAX(created_at) AS last_created \
                 FROM shareable_reports WHERE user_id = ?"
            }
            None => {
                "SELECT COUNT(*) AS total, AVG(security_score) AS avg_score, \
                 COALESCE(SUM(has_ai_analysis), 0) AS with_ai, MAX(created_at) AS last_created \
                 FROM shareable_reports"
            }
        };
        let mut query = sqlx::query(sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        let row = query.fetch_one(&self.pool).await?;

        Ok(ReportStatistics {
            total_reports: row.try_get::<i64, _>("total")? as u64,
            average_score: row.try_get::<Option<f64>, _>("avg_score")?.unwrap_or(0.0),
            reports_with_ai: row.try_get::<i64, _>("with_ai")? as u64,
            last_created_at: row.try_get::<Option<DateTime<Utc>>, _>("last_created")?,
        })
    }

    async fn share_analytics(&self, check_id: &str) -> CacheResult<Option<ShareAnalytics>> {
        let row = sqlx::query(
            "SELECT check_id, view_count, last_viewed_at FROM share_analytics WHERE check_id = ?",
        )
        .bind(check_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            Ok(ShareAnalytics {
                check_id: row.try_get("check_id")?,
                view_count: row.try_get::<i64, _>("view_count")? as u64,
                last_viewed_at: row.try_get("last_viewed_at")?,
            })
        })
        .transpose()
    }
}
