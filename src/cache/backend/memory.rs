//! 内存缓存后端模块
//!
//! 基于 DashMap 的嵌入式键值存储，读取时惰性剔除过期条目，
//! 列举与统计时顺带清扫。用于测试和无 Redis 的嵌入式部署。

use super::{CacheBackend, glob_match};
use crate::cache::stats::BackendStats;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// 内存缓存条目
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Bytes,
    /// 绝对过期时间，None 表示永不过期
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    fn remaining_ttl(&self) -> Option<u64> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()).as_secs())
    }
}

/// 内存缓存后端
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 读取未过期的条目，过期条目就地剔除
    fn live_entry(&self, key: &str) -> Option<MemoryEntry> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return None;
            }
            return Some(entry.clone());
        }
        None
    }

    /// 清扫所有已过期条目
    fn sweep_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.live_entry(key).map(|e| e.value))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let matched: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired() && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();
        let mut deleted = 0;
        for key in matched {
            if self.entries.remove(&key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.sweep_expired();
        Ok(self
            .entries
            .iter()
            .filter(|e| glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>> {
        Ok(keys
            .iter()
            .map(|key| self.live_entry(key).map(|e| e.value))
            .collect())
    }

    async fn mset(&self, entries: Vec<(String, Bytes, Option<Duration>)>) -> Result<()> {
        let now = Instant::now();
        for (key, value, ttl) in entries {
            self.entries.insert(
                key,
                MemoryEntry {
                    value,
                    expires_at: ttl.map(|d| now + d),
                },
            );
        }
        Ok(())
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        // 与 Redis INCRBY 语义一致：值必须是整数字符串，自增保留原 TTL
        let current = self.live_entry(key);
        let (base, expires_at) = match current {
            Some(entry) => {
                let text = std::str::from_utf8(&entry.value)
                    .map_err(|_| anyhow!("计数器值不是有效的 UTF-8"))?;
                let parsed: i64 = text
                    .parse()
                    .map_err(|_| anyhow!("计数器值不是整数: {}", text))?;
                (parsed, entry.expires_at)
            }
            None => (0, None),
        };
        let next = base + amount;
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: Bytes::from(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.live_entry(key).and_then(|e| e.remaining_ttl()))
    }

    async fn stats(&self, pattern: &str) -> Result<BackendStats> {
        self.sweep_expired();
        let mut key_count = 0u64;
        let mut memory_usage_bytes = 0u64;
        for entry in self.entries.iter() {
            if glob_match(pattern, entry.key()) {
                key_count += 1;
                memory_usage_bytes += (entry.key().len() + entry.value().value.len()) as u64;
            }
        }
        Ok(BackendStats {
            key_count,
            memory_usage_bytes,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
