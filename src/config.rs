//! # 配置管理模块
//!
//! 提供缓存层配置的构建器模式和链式配置，以及 TOML/JSON 配置文件的
//! 加载与保存。构建器要求关键配置项显式设置，缺失时返回配置错误。

use crate::error::{CacheError, CacheResult};
use crate::types::cache_config::{CacheConfig, MaintenanceConfig, RedisConfig, TtlConfig};
use rat_logger::info;

/// 缓存配置构建器
///
/// 命名空间与 TTL 必须显式设置；Redis 连接可选，
/// 未设置时客户端降级为无后端的直通模式
#[derive(Debug)]
pub struct CacheConfigBuilder {
    enabled: Option<bool>,
    namespace: Option<String>,
    redis: Option<RedisConfig>,
    ttl: Option<TtlConfig>,
    memory_threshold_bytes: Option<u64>,
    scan_page_size: Option<usize>,
}

impl CacheConfig {
    /// 创建缓存配置构建器
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// 从配置文件加载配置
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径，.toml 后缀按 TOML 解析，其余按 JSON
    pub fn from_file<P: AsRef<std::path::Path>>(config_path: P) -> CacheResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref()).map_err(CacheError::IoError)?;

        let config: CacheConfig =
            if config_path.as_ref().extension().and_then(|s| s.to_str()) == Some("toml") {
                toml::from_str(&content).map_err(|e| {
                    crate::shield_error!(config, format!("解析TOML配置文件失败: {}", e))
                })?
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    crate::shield_error!(config, format!("解析JSON配置文件失败: {}", e))
                })?
            };

        info!("从文件加载缓存配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径，.toml 后缀按 TOML 序列化，其余按 JSON
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, config_path: P) -> CacheResult<()> {
        let content = if config_path.as_ref().extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)
                .map_err(|e| crate::shield_error!(config, format!("序列化TOML配置失败: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::shield_error!(config, format!("序列化JSON配置失败: {}", e)))?
        };

        std::fs::write(config_path.as_ref(), content).map_err(CacheError::IoError)?;

        info!("保存缓存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }
}

impl CacheConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            enabled: None,
            namespace: None,
            redis: None,
            ttl: None,
            memory_threshold_bytes: None,
            scan_page_size: None,
        }
    }

    /// 设置是否启用缓存
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// 设置缓存键命名空间
    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// 设置 Redis 连接配置
    pub fn redis(mut self, redis: RedisConfig) -> Self {
        self.redis = Some(redis);
        self
    }

    /// 设置 TTL 配置
    pub fn ttl(mut self, ttl: TtlConfig) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// 设置内存优化阈值（字节）
    pub fn memory_threshold_bytes(mut self, threshold: u64) -> Self {
        self.memory_threshold_bytes = Some(threshold);
        self
    }

    /// 设置失效扫描单页键数量
    pub fn scan_page_size(mut self, page_size: usize) -> Self {
        self.scan_page_size = Some(page_size);
        self
    }

    /// 构建缓存配置
    ///
    /// 命名空间与 TTL 未显式设置时返回配置错误
    pub fn build(self) -> CacheResult<CacheConfig> {
        let defaults = CacheConfig::default();
        let namespace = self
            .namespace
            .ok_or_else(|| crate::shield_error!(config, "缓存命名空间未设置"))?;
        if namespace.is_empty() || namespace.contains('*') {
            return Err(crate::shield_error!(
                config,
                format!("非法的缓存命名空间: {}", namespace)
            ));
        }
        let ttl = self
            .ttl
            .ok_or_else(|| crate::shield_error!(config, "TTL 配置未设置"))?;
        if ttl.default_ttl_secs == 0 {
            return Err(crate::shield_error!(config, "默认 TTL 必须大于 0"));
        }

        Ok(CacheConfig {
            enabled: self.enabled.unwrap_or(true),
            namespace,
            redis: self.redis,
            ttl,
            memory_threshold_bytes: self
                .memory_threshold_bytes
                .unwrap_or(defaults.memory_threshold_bytes),
            scan_page_size: self.scan_page_size.unwrap_or(defaults.scan_page_size),
        })
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷函数 - 创建带 Redis 后端的缓存配置
///
/// # 参数
///
/// * `namespace` - 缓存键命名空间
/// * `url` - Redis 连接字符串
pub fn redis_cache_config<S: Into<String>>(namespace: S, url: S) -> CacheResult<CacheConfig> {
    CacheConfig::builder()
        .namespace(namespace)
        .redis(RedisConfig::new(url.into()))
        .ttl(TtlConfig::default())
        .build()
}

/// 便捷函数 - 创建无后端的直通缓存配置（测试或无 Redis 部署）
pub fn passthrough_cache_config<S: Into<String>>(namespace: S) -> CacheResult<CacheConfig> {
    CacheConfig::builder()
        .namespace(namespace)
        .ttl(TtlConfig::default())
        .build()
}

/// 便捷函数 - 创建默认维护配置
pub fn default_maintenance_config() -> MaintenanceConfig {
    MaintenanceConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_namespace() {
        let result = CacheConfig::builder().ttl(TtlConfig::default()).build();
        assert!(matches!(result, Err(CacheError::ConfigError { .. })));
    }

    #[test]
    fn test_builder_rejects_wildcard_namespace() {
        let result = CacheConfig::builder()
            .namespace("link*shield")
            .ttl(TtlConfig::default())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = CacheConfig::builder()
            .namespace("test")
            .ttl(TtlConfig::default())
            .build()
            .unwrap();
        assert!(config.enabled);
        assert_eq!(config.memory_threshold_bytes, 100 * 1024 * 1024);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = redis_cache_config("linkshield", "redis://127.0.0.1:6379/0").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.toml");
        config.save_to_file(&path).unwrap();

        let loaded = CacheConfig::from_file(&path).unwrap();
        assert_eq!(loaded.namespace, "linkshield");
        assert_eq!(
            loaded.redis.as_ref().map(|r| r.url.as_str()),
            Some("redis://127.0.0.1:6379/0")
        );
        assert_eq!(loaded.ttl.default_ttl_secs, 3600);
    }
}
