//! 缓存管理器模块
//!
//! 编排缓存预热、失效清理、内存优化与周期性维护。
//! 每个操作都是独立幂等的清扫，失败时向调用方传播首个错误；
//! 只有周期维护的单次 tick 会吞掉错误以保持定时器存活。

mod invalidation;
mod maintenance;
mod optimization;
mod warmup;

use crate::cache::client::CacheClient;
use crate::service::CachedReportService;
use crate::store::ReportStore;
use crate::types::cache_config::CacheConfig;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// 用户报告列表缓存的默认条数
pub(crate) const DEFAULT_USER_LIST_LIMIT: usize = 20;

/// 缓存管理器
///
/// 持有维护定时器句柄，是唯一允许执行批量/模式删除的写入方；
/// 单条读未命中的写回由 CachedReportService 负责
#[derive(Debug, Clone)]
pub struct CacheManager {
    pub(crate) client: Arc<CacheClient>,
    pub(crate) service: CachedReportService,
    pub(crate) store: Arc<dyn ReportStore>,
    pub(crate) config: CacheConfig,
    /// 周期维护任务句柄，停止时显式 abort，避免热重载/重启场景泄漏
    pub(crate) maintenance_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl CacheManager {
    /// 创建缓存管理器
    pub fn new(store: Arc<dyn ReportStore>, client: Arc<CacheClient>, config: CacheConfig) -> Self {
        let service = CachedReportService::new(store.clone(), client.clone());
        Self {
            client,
            service,
            store,
            config,
            maintenance_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// 获取缓存服务
    pub fn service(&self) -> &CachedReportService {
        &self.service
    }

    /// 获取缓存客户端
    pub fn client(&self) -> &Arc<CacheClient> {
        &self.client
    }
}
