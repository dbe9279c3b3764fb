//! 缓存客户端模块
//!
//! 提供带命名空间的序列化缓存门面。核心可用性策略：
//! 后端缺失或故障时所有操作退化为安全默认值（Unavailable/false/0/空），
//! 绝不向调用方抛出缓存层错误，缓存只是尽力而为的加速器。

use crate::cache::backend::{CacheBackend, RedisBackend};
use crate::cache::stats::{
    CachePerformanceStats, ClientStats, HealthReport, HealthStatus,
};
use crate::types::cache_config::{CacheConfig, TtlConfig};
use bytes::Bytes;
use rat_logger::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 健康检查使用的哨兵键
const HEALTH_SENTINEL_KEY: &str = "health_check:sentinel";

/// 缓存查询结果
///
/// 区分"确实不存在"与"缓存不可达"，调用方可据此做可观测性统计；
/// 两种情况对业务语义等价于未命中
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// 命中，携带反序列化后的值
    Hit(T),
    /// 键不存在、已过期或载荷损坏
    Miss,
    /// 后端不可用
    Unavailable,
}

impl<T> CacheLookup<T> {
    /// 是否命中
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// 是否因后端不可用而降级
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheLookup::Unavailable)
    }

    /// 转换为 Option，未命中与不可用统一折叠为 None
    pub fn into_option(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}

/// 批量写入条目
#[derive(Debug, Clone)]
pub struct CacheWrite<T> {
    /// 缓存键（未加命名空间）
    pub key: String,
    /// 待序列化的值
    pub value: T,
    /// 独立 TTL（秒），None 时使用默认 TTL
    pub ttl_secs: Option<u64>,
}

/// 缓存客户端
///
/// 进程内共享同一个实例即可复用底层连接；通过构造注入后端，
/// 便于测试替换和多实例隔离
#[derive(Debug)]
pub struct CacheClient {
    config: CacheConfig,
    backend: Option<Arc<dyn CacheBackend>>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    degraded_ops: AtomicU64,
}

impl CacheClient {
    /// 使用显式后端创建客户端
    pub fn new(config: CacheConfig, backend: Option<Arc<dyn CacheBackend>>) -> Self {
        Self {
            config,
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            degraded_ops: AtomicU64::new(0),
        }
    }

    /// 按配置建立客户端
    ///
    /// 配置了 Redis 时尝试连接（有上限退避重试）；连接失败或未配置时
    /// 降级为无后端模式并记录日志，不向调用方返回错误
    pub async fn connect(config: CacheConfig) -> Self {
        let backend: Option<Arc<dyn CacheBackend>> = if !config.enabled {
            debug!("缓存已禁用，使用无后端模式");
            None
        } else if let Some(redis_config) = &config.redis {
            match RedisBackend::connect(redis_config).await {
                Ok(backend) => Some(Arc::new(backend)),
                Err(e) => {
                    warn!("Redis 后端不可用，缓存降级为直通模式: {}", e);
                    None
                }
            }
        } else {
            debug!("未配置 Redis 连接字符串，缓存降级为直通模式");
            None
        };
        Self::new(config, backend)
    }

    /// 获取 TTL 配置
    pub fn ttl_config(&self) -> &TtlConfig {
        &self.config.ttl
    }

    /// 获取默认 TTL（秒）
    pub fn default_ttl(&self) -> u64 {
        self.config.ttl.default_ttl_secs
    }

    /// 获取命名空间前缀
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// 为键加上命名空间前缀，全客户端唯一的加前缀入口
    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    /// 命名空间下的全量通配模式
    fn namespace_pattern(&self) -> String {
        format!("{}:*", self.config.namespace)
    }

    /// 获取可用后端，禁用或缺失时计入降级统计
    fn active_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        if !self.config.enabled {
            return None;
        }
        self.backend.as_ref()
    }

    fn record_degraded(&self) {
        self.degraded_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// 读取并反序列化缓存值
    ///
    /// 载荷损坏视为未命中，下次写入自愈
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return CacheLookup::Unavailable;
        };
        let namespaced = self.namespaced(key);
        match backend.get(&namespaced).await {
            Ok(Some(raw)) => match serde_json::from_slice::<T>(&raw) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("缓存命中: key={}", key);
                    CacheLookup::Hit(value)
                }
                Err(e) => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    warn!("缓存载荷损坏，按未命中处理: key={}, 错误: {}", key, e);
                    CacheLookup::Miss
                }
            },
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("缓存未命中: key={}", key);
                CacheLookup::Miss
            }
            Err(e) => {
                self.record_degraded();
                warn!("缓存读取失败: key={}, 错误: {}", key, e);
                CacheLookup::Unavailable
            }
        }
    }

    /// 序列化并写入缓存值
    ///
    /// ttl_secs 为 None 时使用默认 TTL；失败返回 false
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return false;
        };
        let raw = match serde_json::to_vec(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("缓存序列化失败: key={}, 错误: {}", key, e);
                return false;
            }
        };
        let ttl = Duration::from_secs(ttl_secs.unwrap_or(self.config.ttl.default_ttl_secs));
        let namespaced = self.namespaced(key);
        match backend.set(&namespaced, Bytes::from(raw), Some(ttl)).await {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                debug!("已写入缓存: key={}, ttl={}s", key, ttl.as_secs());
                true
            }
            Err(e) => {
                self.record_degraded();
                warn!("缓存写入失败: key={}, 错误: {}", key, e);
                false
            }
        }
    }

    /// 删除单个键
    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return false;
        };
        let namespaced = self.namespaced(key);
        match backend.delete(&namespaced).await {
            Ok(existed) => {
                if existed {
                    self.deletes.fetch_add(1, Ordering::Relaxed);
                }
                existed
            }
            Err(e) => {
                self.record_degraded();
                warn!("缓存删除失败: key={}, 错误: {}", key, e);
                false
            }
        }
    }

    /// 按通配模式批量删除，返回删除数量
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return 0;
        };
        let namespaced = self.namespaced(pattern);
        match backend.delete_pattern(&namespaced).await {
            Ok(count) => {
                self.deletes.fetch_add(count as u64, Ordering::Relaxed);
                debug!("模式删除完成: pattern={}, 删除 {} 个键", pattern, count);
                count
            }
            Err(e) => {
                self.record_degraded();
                warn!("模式删除失败: pattern={}, 错误: {}", pattern, e);
                0
            }
        }
    }

    /// 检查键是否存在
    pub async fn exists(&self, key: &str) -> bool {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return false;
        };
        let namespaced = self.namespaced(key);
        match backend.exists(&namespaced).await {
            Ok(exists) => exists,
            Err(e) => {
                self.record_degraded();
                warn!("缓存存在性检查失败: key={}, 错误: {}", key, e);
                false
            }
        }
    }

    /// 列出匹配模式的键（已去掉命名空间前缀）
    pub async fn keys(&self, pattern: &str) -> Vec<String> {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return Vec::new();
        };
        let namespaced = self.namespaced(pattern);
        let prefix = format!("{}:", self.config.namespace);
        match backend.keys(&namespaced).await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&prefix).map(|s| s.to_string()))
                .collect(),
            Err(e) => {
                self.record_degraded();
                warn!("缓存键列举失败: pattern={}, 错误: {}", pattern, e);
                Vec::new()
            }
        }
    }

    /// 批量读取，结果顺序与键一致，缺失或损坏的条目为 None
    pub async fn mget<T: DeserializeOwned>(&self, keys: &[String]) -> Vec<Option<T>> {
        if keys.is_empty() {
            return Vec::new();
        }
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return keys.iter().map(|_| None).collect();
        };
        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        match backend.mget(&namespaced).await {
            Ok(values) => values
                .into_iter()
                .map(|raw| {
                    raw.and_then(|raw| match serde_json::from_slice::<T>(&raw) {
                        Ok(value) => {
                            self.hits.fetch_add(1, Ordering::Relaxed);
                            Some(value)
                        }
                        Err(_) => {
                            self.misses.fetch_add(1, Ordering::Relaxed);
                            None
                        }
                    })
                })
                .collect(),
            Err(e) => {
                self.record_degraded();
                warn!("批量读取失败: 错误: {}", e);
                keys.iter().map(|_| None).collect()
            }
        }
    }

    /// 批量写入，每个条目可携带独立 TTL，缺省使用默认 TTL
    pub async fn mset<T: Serialize>(&self, entries: &[CacheWrite<T>]) -> bool {
        if entries.is_empty() {
            return true;
        }
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return false;
        };
        let mut batch = Vec::with_capacity(entries.len());
        for entry in entries {
            let raw = match serde_json::to_vec(&entry.value) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("批量写入序列化失败: key={}, 错误: {}", entry.key, e);
                    return false;
                }
            };
            let ttl = Duration::from_secs(
                entry.ttl_secs.unwrap_or(self.config.ttl.default_ttl_secs),
            );
            batch.push((self.namespaced(&entry.key), Bytes::from(raw), Some(ttl)));
        }
        match backend.mset(batch).await {
            Ok(()) => {
                self.writes.fetch_add(entries.len() as u64, Ordering::Relaxed);
                debug!("批量写入完成: {} 个条目", entries.len());
                true
            }
            Err(e) => {
                self.record_degraded();
                warn!("批量写入失败: 错误: {}", e);
                false
            }
        }
    }

    /// 原子自增计数器，后端不可用时返回 None
    pub async fn increment(&self, key: &str, amount: i64) -> Option<i64> {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return None;
        };
        let namespaced = self.namespaced(key);
        match backend.increment(&namespaced, amount).await {
            Ok(value) => Some(value),
            Err(e) => {
                self.record_degraded();
                warn!("计数器自增失败: key={}, 错误: {}", key, e);
                None
            }
        }
    }

    /// 设置键的过期时间
    pub async fn expire(&self, key: &str, ttl_secs: u64) -> bool {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return false;
        };
        let namespaced = self.namespaced(key);
        match backend.expire(&namespaced, Duration::from_secs(ttl_secs)).await {
            Ok(applied) => applied,
            Err(e) => {
                self.record_degraded();
                warn!("设置过期时间失败: key={}, 错误: {}", key, e);
                false
            }
        }
    }

    /// 查询键剩余 TTL（秒）
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return None;
        };
        let namespaced = self.namespaced(key);
        match backend.ttl(&namespaced).await {
            Ok(ttl) => ttl,
            Err(e) => {
                self.record_degraded();
                warn!("TTL 查询失败: key={}, 错误: {}", key, e);
                None
            }
        }
    }

    /// 清空命名空间下的所有键，返回删除数量
    pub async fn clear(&self) -> usize {
        let Some(backend) = self.active_backend() else {
            self.record_degraded();
            return 0;
        };
        match backend.delete_pattern(&self.namespace_pattern()).await {
            Ok(count) => {
                self.deletes.fetch_add(count as u64, Ordering::Relaxed);
                debug!("已清空命名空间 {}: 删除 {} 个键", self.config.namespace, count);
                count
            }
            Err(e) => {
                self.record_degraded();
                warn!("命名空间清空失败: 错误: {}", e);
                0
            }
        }
    }

    /// 获取后端聚合统计
    pub async fn get_stats(&self) -> ClientStats {
        let Some(backend) = self.active_backend() else {
            return ClientStats {
                connected: false,
                key_count: 0,
                memory_usage_bytes: 0,
            };
        };
        match backend.stats(&self.namespace_pattern()).await {
            Ok(stats) => ClientStats {
                connected: true,
                key_count: stats.key_count,
                memory_usage_bytes: stats.memory_usage_bytes,
            },
            Err(e) => {
                warn!("缓存统计获取失败: 错误: {}", e);
                ClientStats {
                    connected: false,
                    key_count: 0,
                    memory_usage_bytes: 0,
                }
            }
        }
    }

    /// 健康检查：对哨兵键执行写-读-删往返
    pub async fn health_check(&self) -> HealthReport {
        let Some(backend) = self.active_backend() else {
            return HealthReport {
                status: HealthStatus::Unhealthy,
                details: "缓存后端未连接".to_string(),
            };
        };
        let sentinel = self.namespaced(HEALTH_SENTINEL_KEY);
        let payload = Bytes::from_static(b"ok");

        let round_trip = async {
            backend
                .set(&sentinel, payload.clone(), Some(Duration::from_secs(10)))
                .await?;
            let read = backend.get(&sentinel).await?;
            backend.delete(&sentinel).await?;
            anyhow::ensure!(read.as_deref() == Some(payload.as_ref()), "哨兵键读回值不一致");
            Ok::<(), anyhow::Error>(())
        };

        match round_trip.await {
            Ok(()) => HealthReport {
                status: HealthStatus::Healthy,
                details: "写-读-删往返正常".to_string(),
            },
            Err(e) => HealthReport {
                status: HealthStatus::Unhealthy,
                details: format!("健康检查失败: {}", e),
            },
        }
    }

    /// 获取累计性能统计快照
    pub fn performance_stats(&self) -> CachePerformanceStats {
        CachePerformanceStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            degraded_ops: self.degraded_ops.load(Ordering::Relaxed),
        }
    }
}
