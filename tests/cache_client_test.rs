//! 缓存客户端集成测试
//!
//! 覆盖命中/未命中/降级语义、TTL、模式删除与健康检查

use linkshield_cache::cache::backend::MemoryBackend;
use linkshield_cache::{
    CacheBackend, CacheClient, CacheLookup, CacheWrite, HealthStatus, TtlConfig,
};
use linkshield_cache::types::CacheConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    name: String,
    score: i32,
}

fn test_config() -> CacheConfig {
    CacheConfig::builder()
        .namespace("test")
        .ttl(TtlConfig::default())
        .build()
        .unwrap()
}

fn memory_client() -> CacheClient {
    CacheClient::new(test_config(), Some(Arc::new(MemoryBackend::new())))
}

#[tokio::test]
async fn test_set_get_roundtrip() {
    let client = memory_client();
    let payload = Payload {
        name: "报告A".to_string(),
        score: 87,
    };

    assert!(client.set("report:a", &payload, None).await);
    let looked_up = client.get::<Payload>("report:a").await;
    assert_eq!(looked_up, CacheLookup::Hit(payload));
}

#[tokio::test]
async fn test_get_missing_key_is_miss() {
    let client = memory_client();
    let looked_up = client.get::<Payload>("report:nope").await;
    assert_eq!(looked_up, CacheLookup::Miss);
}

#[tokio::test]
async fn test_expired_key_is_miss() {
    let client = memory_client();
    let payload = Payload {
        name: "短命".to_string(),
        score: 1,
    };
    assert!(client.set("report:short", &payload, Some(1)).await);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(client.get::<Payload>("report:short").await, CacheLookup::Miss);
}

#[tokio::test]
async fn test_delete_then_get_is_miss() {
    let client = memory_client();
    let payload = Payload {
        name: "x".to_string(),
        score: 0,
    };
    client.set("report:x", &payload, None).await;
    assert!(client.delete("report:x").await);
    assert_eq!(client.get::<Payload>("report:x").await, CacheLookup::Miss);
    // 重复删除返回 false
    assert!(!client.delete("report:x").await);
}

#[tokio::test]
async fn test_delete_pattern_exact_scoping() {
    let client = memory_client();
    client.set("user_reports:u1", &vec![1, 2], None).await;
    client.set("user_reports:u2", &vec![3], None).await;
    client.set("report:a", &42, None).await;
    client.set("report_stats:u1", &7, None).await;

    let deleted = client.delete_pattern("user_reports:*").await;
    assert_eq!(deleted, 2);

    // 其他前缀的键不受影响
    assert!(client.exists("report:a").await);
    assert!(client.exists("report_stats:u1").await);
    assert!(!client.exists("user_reports:u1").await);
}

#[tokio::test]
async fn test_degraded_mode_safe_defaults() {
    // 无后端时所有操作返回安全默认值且不 panic
    let client = CacheClient::new(test_config(), None);

    assert_eq!(client.get::<Payload>("any").await, CacheLookup::Unavailable);
    assert!(!client.set("any", &1, None).await);
    assert!(!client.delete("any").await);
    assert_eq!(client.delete_pattern("any:*").await, 0);
    assert!(!client.exists("any").await);
    assert!(client.keys("*").await.is_empty());
    assert_eq!(client.mget::<i32>(&["a".to_string(), "b".to_string()]).await, vec![None, None]);
    assert_eq!(client.increment("counter", 1).await, None);
    assert!(!client.expire("any", 60).await);
    assert_eq!(client.ttl("any").await, None);
    assert_eq!(client.clear().await, 0);

    let stats = client.get_stats().await;
    assert!(!stats.connected);
    assert_eq!(stats.key_count, 0);

    let health = client.health_check().await;
    assert_eq!(health.status, HealthStatus::Unhealthy);

    // 上面 11 个数据操作（含 ttl）每个都计入一次降级统计
    assert_eq!(client.performance_stats().degraded_ops, 11);
}

#[tokio::test]
async fn test_mget_preserves_order_with_gaps() {
    let client = memory_client();
    client.set("report:a", &1, None).await;
    client.set("report:c", &3, None).await;

    let values = client
        .mget::<i32>(&[
            "report:a".to_string(),
            "report:b".to_string(),
            "report:c".to_string(),
        ])
        .await;
    assert_eq!(values, vec![Some(1), None, Some(3)]);
}

#[tokio::test]
async fn test_mset_per_entry_ttl() {
    let client = memory_client();
    let entries = vec![
        CacheWrite {
            key: "x".to_string(),
            value: 1,
            ttl_secs: Some(10),
        },
        CacheWrite {
            key: "y".to_string(),
            value: 2,
            ttl_secs: None,
        },
    ];
    assert!(client.mset(&entries).await);

    // x 使用独立 TTL，y 使用默认 TTL (3600s)
    let ttl_x = client.ttl("x").await.unwrap();
    assert!(ttl_x <= 10);
    let ttl_y = client.ttl("y").await.unwrap();
    assert!(ttl_y > 10 && ttl_y <= 3600);
}

#[tokio::test]
async fn test_increment_and_expire() {
    let client = memory_client();
    assert_eq!(client.increment("views", 1).await, Some(1));
    assert_eq!(client.increment("views", 5).await, Some(6));

    assert!(client.expire("views", 30).await);
    let ttl = client.ttl("views").await.unwrap();
    assert!(ttl <= 30);
}

#[tokio::test]
async fn test_clear_only_touches_namespace() {
    let backend = Arc::new(MemoryBackend::new());
    let client = CacheClient::new(test_config(), Some(backend.clone()));
    client.set("report:a", &1, None).await;
    client.set("report:b", &2, None).await;

    // 同一后端上其他命名空间的键
    backend
        .set("other:report:z", bytes::Bytes::from_static(b"1"), None)
        .await
        .unwrap();

    let deleted = client.clear().await;
    assert_eq!(deleted, 2);
    assert!(backend.exists("other:report:z").await.unwrap());
}

#[tokio::test]
async fn test_corrupted_payload_is_miss() {
    let backend = Arc::new(MemoryBackend::new());
    let client = CacheClient::new(test_config(), Some(backend.clone()));

    // 直接向后端写入损坏的载荷
    backend
        .set("test:report:bad", bytes::Bytes::from_static(b"{not json"), None)
        .await
        .unwrap();

    assert_eq!(client.get::<Payload>("report:bad").await, CacheLookup::Miss);

    // 下次写入自愈
    let payload = Payload {
        name: "修复".to_string(),
        score: 5,
    };
    client.set("report:bad", &payload, None).await;
    assert_eq!(
        client.get::<Payload>("report:bad").await,
        CacheLookup::Hit(payload)
    );
}

#[tokio::test]
async fn test_health_check_roundtrip() {
    let client = memory_client();
    let health = client.health_check().await;
    assert_eq!(health.status, HealthStatus::Healthy);

    // 哨兵键不残留
    assert!(!client.exists("health_check:sentinel").await);
}

#[tokio::test]
async fn test_stats_reflect_usage() {
    let client = memory_client();
    client.set("report:a", &1, None).await;
    let _ = client.get::<i32>("report:a").await;
    let _ = client.get::<i32>("report:missing").await;

    let stats = client.get_stats().await;
    assert!(stats.connected);
    assert_eq!(stats.key_count, 1);
    assert!(stats.memory_usage_bytes > 0);

    let perf = client.performance_stats();
    assert_eq!(perf.hits, 1);
    assert_eq!(perf.misses, 1);
    assert_eq!(perf.writes, 1);
    assert!(perf.hit_rate() > 0.49 && perf.hit_rate() < 0.51);
}
