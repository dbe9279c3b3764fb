//! Redis 缓存后端模块
//!
//! 基于 redis::aio::ConnectionManager 的生产环境后端。
//! 连接建立采用有上限的指数退避重试，重试耗尽后由调用方决定降级；
//! 模式操作使用 SCAN 游标迭代，避免在生产路径上使用 KEYS 命令。

use super::CacheBackend;
use crate::cache::stats::BackendStats;
use crate::types::cache_config::RedisConfig;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use rat_logger::{debug, warn};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Redis 缓存后端
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// 按配置建立连接
    ///
    /// 最多重试 `connect_attempts` 次，每次延迟按指数增长并附加随机抖动；
    /// 全部失败时返回错误，由客户端层降级为无后端模式
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .with_context(|| format!("无效的 Redis 连接字符串: {}", config.url))?;

        let mut last_err = None;
        for attempt in 0..config.connect_attempts.max(1) {
            if attempt > 0 {
                let base = backoff_base_ms(config.retry_base_delay_ms, attempt);
                let jitter = rand::thread_rng().gen_range(0..=config.retry_base_delay_ms / 2 + 1);
                let delay = Duration::from_millis(base + jitter);
                debug!("Redis 连接重试 第{}次, 延迟 {:?}", attempt + 1, delay);
                tokio::time::sleep(delay).await;
            }
            match ConnectionManager::new(client.clone()).await {
                Ok(conn) => {
                    debug!("Redis 连接已建立: {}", config.url);
                    return Ok(Self { conn });
                }
                Err(e) => {
                    warn!("Redis 连接失败 (第{}次): {}", attempt + 1, e);
                    last_err = Some(e);
                }
            }
        }
        Err(anyhow!(
            "Redis 连接重试耗尽 ({}次): {}",
            config.connect_attempts,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    /// 通过 SCAN 收集匹配模式的键
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        {
            let mut iter = conn
                .scan_match::<&str, String>(pattern)
                .await
                .context("SCAN 执行失败")?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.context("GET 执行失败")?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) if ttl.as_secs() > 0 => {
                let _: () = conn
                    .set_ex(key, value.as_ref(), ttl.as_secs())
                    .await
                    .context("SETEX 执行失败")?;
            }
            _ => {
                let _: () = conn.set(key, value.as_ref()).await.context("SET 执行失败")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(key).await.context("DEL 执行失败")?;
        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let keys = self.scan_keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(&keys).await.context("批量 DEL 执行失败")?;
        Ok(deleted as usize)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.context("EXISTS 执行失败")?;
        Ok(exists)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.scan_keys(pattern).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        // MGET 单键时返回标量，统一走 cmd 构造避免类型歧义
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .context("MGET 执行失败")?;
        Ok(values.into_iter().map(|v| v.map(Bytes::from)).collect())
    }

    async fn mset(&self, entries: Vec<(String, Bytes, Option<Duration>)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for (key, value, ttl) in &entries {
            match ttl {
                Some(ttl) if ttl.as_secs() > 0 => {
                    pipe.set_ex(key, value.as_ref(), ttl.as_secs()).ignore();
                }
                _ => {
                    pipe.set(key, value.as_ref()).ignore();
                }
            }
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .context("批量 SET 管道执行失败")?;
        Ok(())
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, amount).await.context("INCRBY 执行失败")?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let applied: bool = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .context("EXPIRE 执行失败")?;
        Ok(applied)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key).await.context("TTL 执行失败")?;
        // -2: 键不存在, -1: 无过期时间
        if ttl < 0 {
            Ok(None)
        } else {
            Ok(Some(ttl as u64))
        }
    }

    async fn stats(&self, pattern: &str) -> Result<BackendStats> {
        let key_count = self.scan_keys(pattern).await?.len() as u64;

        let mut conn = self.conn.clone();
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .context("INFO memory 执行失败")?;
        let memory_usage_bytes = parse_used_memory(&info).unwrap_or(0);

        Ok(BackendStats {
            key_count,
            memory_usage_bytes,
        })
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("PING 执行失败")?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(anyhow!("PING 返回异常: {}", pong))
        }
    }
}

/// 指数退避的基础延迟（毫秒）
///
/// 指数封顶为 16，乘法饱和，重试次数配置再大也不会溢出
fn backoff_base_ms(base_ms: u64, attempt: u32) -> u64 {
    let exp = attempt.saturating_sub(1).min(16);
    base_ms.saturating_mul(1u64 << exp)
}

/// 从 INFO memory 输出中解析 used_memory 字段
fn parse_used_memory(info: &str) -> Option<u64> {
    info.lines()
        .find_map(|line| line.strip_prefix("used_memory:"))
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{backoff_base_ms, parse_used_memory};

    #[test]
    fn test_parse_used_memory() {
        let info = "# Memory\r\nused_memory:1048576\r\nused_memory_human:1.00M\r\n";
        assert_eq!(parse_used_memory(info), Some(1048576));
        assert_eq!(parse_used_memory("# Memory\r\n"), None);
    }

    #[test]
    fn test_backoff_exponent_capped() {
        assert_eq!(backoff_base_ms(200, 1), 200);
        assert_eq!(backoff_base_ms(200, 4), 1600);
        // 重试次数配置过大时指数封顶，不会移位溢出
        assert_eq!(backoff_base_ms(200, 70), 200 * 65536);
        assert_eq!(backoff_base_ms(u64::MAX, 70), u64::MAX);
    }
}
