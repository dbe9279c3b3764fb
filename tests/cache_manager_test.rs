//! 缓存管理器集成测试
//!
//! 覆盖预热、失效对账、内存优化阈值、用户缓存清理与维护任务生命周期

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkshield_cache::cache::backend::MemoryBackend;
use linkshield_cache::error::CacheResult;
use linkshield_cache::store::{MemoryReportStore, ReportStore, StoredReport};
use linkshield_cache::{
    CacheClient, CacheLookup, CacheManager, ReportStatistics, ReportSummary, ShareAnalytics,
    TtlConfig, WarmupOptions,
};
use linkshield_cache::types::CacheConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn stored(
    slug: &str,
    user: Option<&str>,
    hours_ago: i64,
    share_count: u64,
    is_public: bool,
) -> StoredReport {
    StoredReport {
        summary: ReportSummary {
            slug: slug.to_string(),
            url: format!("https://example.com/{}", slug),
            domain: "example.com".to_string(),
            security_score: 75,
            created_at: Utc::now() - chrono::Duration::hours(hours_ago),
            has_ai_analysis: false,
        },
        user_id: user.map(String::from),
        is_public,
        share_count,
    }
}

fn build_manager(store: Arc<MemoryReportStore>, threshold: u64) -> CacheManager {
    let config = CacheConfig::builder()
        .namespace("test")
        .ttl(TtlConfig::default())
        .memory_threshold_bytes(threshold)
        .scan_page_size(2)
        .build()
        .unwrap();
    let client = Arc::new(CacheClient::new(
        config.clone(),
        Some(Arc::new(MemoryBackend::new())),
    ));
    CacheManager::new(store, client, config)
}

const HIGH_THRESHOLD: u64 = 100 * 1024 * 1024;

#[tokio::test]
async fn test_warm_up_cache_full_pass() {
    let store = Arc::new(MemoryReportStore::new());
    store.insert_report(stored("a", Some("u1"), 3, 5, true)).await;
    store.insert_report(stored("b", Some("u1"), 2, 9, true)).await;
    store.insert_report(stored("c", Some("u2"), 1, 1, true)).await;
    // 超出活跃窗口的用户不参与预热
    store.insert_report(stored("old", Some("u3"), 24 * 30, 0, true)).await;
    let manager = build_manager(store, HIGH_THRESHOLD);

    let report = manager
        .warm_up_cache(WarmupOptions {
            recent_reports_count: 5,
            popular_reports_count: 2,
            active_user_window_days: 7,
            max_users: 10,
        })
        .await
        .unwrap();

    assert_eq!(report.recent_reports, 4);
    assert_eq!(report.popular_reports, 2);
    assert_eq!(report.warmed_users, 2);

    let client = manager.client();
    assert!(client.exists("recent_reports").await);
    // 热门报告 b (9次) 与 a (5次) 获得单条缓存
    assert!(client.exists("report:b").await);
    assert!(client.exists("report:a").await);
    assert!(!client.exists("report:c").await);
    assert!(client.exists("user_reports:u1").await);
    assert!(client.exists("user_reports:u2").await);
    assert!(!client.exists("user_reports:u3").await);
}

#[tokio::test]
async fn test_invalidate_stale_entries_reconciles() {
    let store = Arc::new(MemoryReportStore::new());
    store.insert_report(stored("alive", None, 1, 0, true)).await;
    store.insert_report(stored("doomed", None, 2, 0, true)).await;
    store.insert_report(stored("third", None, 3, 0, true)).await;
    let manager = build_manager(store.clone(), HIGH_THRESHOLD);

    // 预热后删除其中一条的源记录
    let slugs = vec![
        "alive".to_string(),
        "doomed".to_string(),
        "third".to_string(),
    ];
    manager.service().warm_up_reports(&slugs).await.unwrap();
    let client = manager.client();
    client.set("og_image:alive", &vec![1u8], None).await;
    client.set("og_image:doomed", &vec![2u8], None).await;
    store.remove_report("doomed").await;

    // 分页大小为 2，三个键会分两页对账
    let removed = manager.invalidate_stale_entries().await.unwrap();
    assert_eq!(removed, 1);

    assert!(client.exists("report:alive").await);
    assert!(client.exists("report:third").await);
    assert!(!client.exists("report:doomed").await);
    // 死亡 slug 的预览图缓存随之清理，存活的保留
    assert!(client.exists("og_image:alive").await);
    assert!(!client.exists("og_image:doomed").await);
}

#[tokio::test]
async fn test_invalidate_with_empty_cache() {
    let store = Arc::new(MemoryReportStore::new());
    let manager = build_manager(store, HIGH_THRESHOLD);
    assert_eq!(manager.invalidate_stale_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_optimize_below_threshold_no_deletes() {
    let store = Arc::new(MemoryReportStore::new());
    let manager = build_manager(store, HIGH_THRESHOLD);
    let client = manager.client();
    client.set("user_reports:u1", &vec![1], None).await;

    let report = manager.optimize_cache().await;
    assert!(!report.triggered);
    assert_eq!(report.deleted_user_reports, 0);
    assert!(client.exists("user_reports:u1").await);
}

#[tokio::test]
async fn test_optimize_above_threshold_cascading_clear() {
    let store = Arc::new(MemoryReportStore::new());
    // 阈值设为 1 字节，任何写入都会触发优化
    let manager = build_manager(store, 1);
    let client = manager.client();
    client.set("user_reports:u1", &vec![1, 2, 3], None).await;
    client.set("share_analytics:chk1", &10, None).await;
    client.set("report_stats:global", &5, None).await;
    client.set("report:a", &1, None).await;

    let report = manager.optimize_cache().await;
    assert!(report.triggered);
    assert_eq!(report.deleted_user_reports, 1);
    assert_eq!(report.deleted_analytics, 1);
    assert_eq!(report.deleted_stats, 1);

    // 三类可再生缓存被清空，单条报告与列表缓存保留
    assert!(!client.exists("user_reports:u1").await);
    assert!(!client.exists("share_analytics:chk1").await);
    assert!(!client.exists("report_stats:global").await);
    assert!(client.exists("report:a").await);
}

#[tokio::test]
async fn test_metrics_snapshot() {
    let store = Arc::new(MemoryReportStore::new());
    store.insert_report(stored("a", None, 1, 0, true)).await;
    let manager = build_manager(store, HIGH_THRESHOLD);

    manager.service().preload_recent_reports(5).await.unwrap();
    let metrics = manager.get_cache_metrics().await;

    assert!(metrics.connected);
    assert_eq!(metrics.key_count, 1);
    assert_eq!(metrics.samples.len(), 2);

    let recent = &metrics.samples[0];
    assert_eq!(recent.key, "recent_reports");
    assert!(recent.exists);
    assert!(recent.ttl_secs.is_some());

    let stats = &metrics.samples[1];
    assert_eq!(stats.key, "report_stats:global");
    assert!(!stats.exists);
}

#[tokio::test]
async fn test_clear_user_cache_wins_over_warmup() {
    // 场景：预热批次包含某用户，随后的显式清理以最后写入者胜出
    let store = Arc::new(MemoryReportStore::new());
    store.insert_report(stored("a", Some("u1"), 1, 2, true)).await;
    let manager = build_manager(store, HIGH_THRESHOLD);

    manager.warm_up_cache(WarmupOptions::default()).await.unwrap();
    assert!(manager.client().exists("user_reports:u1").await);

    let deleted = manager.clear_user_cache("u1").await;
    assert_eq!(deleted, 1);
    // 最终状态：该用户的键不存在
    assert!(!manager.client().exists("user_reports:u1").await);
}

#[tokio::test]
async fn test_preload_user_cache() {
    let store = Arc::new(MemoryReportStore::new());
    store.insert_report(stored("a", Some("u9"), 1, 0, true)).await;
    let manager = build_manager(store, HIGH_THRESHOLD);

    let count = manager.preload_user_cache("u9").await.unwrap();
    assert_eq!(count, 1);
    let cached = manager
        .client()
        .get::<Vec<ReportSummary>>("user_reports:u9")
        .await;
    assert!(matches!(cached, CacheLookup::Hit(list) if list.len() == 1));
}

#[tokio::test]
async fn test_emergency_cache_clear() {
    let store = Arc::new(MemoryReportStore::new());
    let manager = build_manager(store, HIGH_THRESHOLD);
    let client = manager.client();
    client.set("report:a", &1, None).await;
    client.set("user_reports:u1", &vec![1], None).await;

    let deleted = manager.emergency_cache_clear().await;
    assert_eq!(deleted, 2);
    assert_eq!(client.get_stats().await.key_count, 0);
}

#[tokio::test]
async fn test_maintenance_lifecycle() {
    let store = Arc::new(MemoryReportStore::new());
    let manager = build_manager(store, HIGH_THRESHOLD);
    let period = Duration::from_secs(1800);

    assert!(!manager.is_maintenance_running().await);
    manager.start_periodic_maintenance(period).await;
    assert!(manager.is_maintenance_running().await);

    // 重复启动被忽略
    manager.start_periodic_maintenance(period).await;
    assert!(manager.is_maintenance_running().await);

    manager.stop_periodic_maintenance().await;
    assert!(!manager.is_maintenance_running().await);

    // shutdown 幂等
    manager.start_periodic_maintenance(period).await;
    manager.shutdown().await;
    assert!(!manager.is_maintenance_running().await);
}

/// 索引查询总是失败的后备存储，用于验证维护周期的容错
#[derive(Debug)]
struct BrokenIndexStore;

#[async_trait]
impl ReportStore for BrokenIndexStore {
    async fn find_by_slug(&self, _slug: &str) -> CacheResult<Option<ReportSummary>> {
        Ok(None)
    }
    async fn reports_by_slugs(&self, _slugs: &[String]) -> CacheResult<Vec<ReportSummary>> {
        Ok(Vec::new())
    }
    async fn recent_public_reports(&self, _limit: usize) -> CacheResult<Vec<ReportSummary>> {
        Ok(Vec::new())
    }
    async fn top_shared_reports(&self, _limit: usize) -> CacheResult<Vec<ReportSummary>> {
        Ok(Vec::new())
    }
    async fn user_reports(&self, _user_id: &str, _limit: usize) -> CacheResult<Vec<ReportSummary>> {
        Ok(Vec::new())
    }
    async fn active_user_ids(&self, _since: DateTime<Utc>) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn existing_slugs(&self, _candidates: &[String]) -> CacheResult<HashSet<String>> {
        Err(linkshield_cache::shield_error!(store, "索引查询失败"))
    }
    async fn report_statistics(&self, _user_id: Option<&str>) -> CacheResult<ReportStatistics> {
        Ok(ReportStatistics {
            total_reports: 0,
            average_score: 0.0,
            reports_with_ai: 0,
            last_created_at: None,
        })
    }
    async fn share_analytics(&self, _check_id: &str) -> CacheResult<Option<ShareAnalytics>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_maintenance_tick_survives_store_errors() {
    let config = CacheConfig::builder()
        .namespace("test")
        .ttl(TtlConfig::default())
        // 阈值 1 字节，每个周期都会触发优化清理
        .memory_threshold_bytes(1)
        .build()
        .unwrap();
    let client = Arc::new(CacheClient::new(
        config.clone(),
        Some(Arc::new(MemoryBackend::new())),
    ));
    let manager = CacheManager::new(Arc::new(BrokenIndexStore), client.clone(), config);

    // 报告键使每次失效扫描都触达出错的存储
    client.set("report:ghost", &1, None).await;
    client.set("user_reports:u1", &vec![1], None).await;

    manager.start_periodic_maintenance(Duration::from_millis(150)).await;

    // 首个周期到期前不执行任何清理
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(client.exists("user_reports:u1").await);

    // 第一个周期：失效扫描出错被吞掉，同一周期的优化仍然执行
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!client.exists("user_reports:u1").await);

    // 出错的周期之后定时器仍然存活，下一周期继续清理
    client.set("user_reports:u2", &vec![2], None).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!client.exists("user_reports:u2").await);
    assert!(manager.is_maintenance_running().await);

    manager.shutdown().await;
}
