//! 缓存后端抽象模块
//!
//! 定义字节级键值存储接口，命名空间处理在客户端层完成。
//! 内存后端用于嵌入式部署与测试，Redis 后端用于生产环境。

pub mod memory;
pub mod redis;

use crate::cache::stats::BackendStats;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

/// 字节级缓存后端接口
///
/// 所有方法对键不做任何前缀处理；单键操作在后端内部保证原子性
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// 读取键对应的原始值
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// 写入键值，ttl 为 None 时表示不过期
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<()>;

    /// 删除键，返回键是否存在
    async fn delete(&self, key: &str) -> Result<bool>;

    /// 按通配模式批量删除，返回删除数量
    async fn delete_pattern(&self, pattern: &str) -> Result<usize>;

    /// 检查键是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// 列出匹配通配模式的所有键
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// 批量读取，结果与键顺序一致，缺失项为 None
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Bytes>>>;

    /// 批量写入，每个条目可携带独立 TTL
    async fn mset(&self, entries: Vec<(String, Bytes, Option<Duration>)>) -> Result<()>;

    /// 原子自增，键不存在时从 0 开始
    async fn increment(&self, key: &str, amount: i64) -> Result<i64>;

    /// 为已存在的键设置过期时间，返回是否生效
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// 查询键的剩余 TTL（秒），键不存在或无过期时间时为 None
    async fn ttl(&self, key: &str) -> Result<Option<u64>>;

    /// 统计匹配模式的键数量与内存占用
    async fn stats(&self, pattern: &str) -> Result<BackendStats>;

    /// 连通性探测
    async fn ping(&self) -> Result<()>;
}

/// 简易通配匹配
///
/// 支持 `*` 匹配任意字符序列，足以覆盖键注册表生成的前缀模式
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            // 首段必须锚定开头
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            // 末段必须锚定结尾
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
