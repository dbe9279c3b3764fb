//! 周期性维护相关方法
//!
//! 定时器每个周期执行失效清理和内存优化。单次 tick 的错误
//! 被捕获并记录，绝不拆除定时器；句柄被保留，
//! 停止或关闭时显式 abort，避免进程热重载场景下的任务泄漏。

use super::CacheManager;
use rat_logger::{debug, error, info};
use std::time::Duration;
use tokio::time::{Instant, interval_at};

impl CacheManager {
    /// 启动周期性维护任务
    ///
    /// 首个周期在 `period` 之后触发（启动时的预热由调用方显式执行）；
    /// 已在运行时不重复启动
    pub async fn start_periodic_maintenance(&self, period: Duration) {
        let mut handle = self.maintenance_handle.write().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("周期维护任务已在运行，忽略重复启动");
            return;
        }

        let manager = self.clone();
        let period = period.max(Duration::from_millis(1));
        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            info!("周期维护任务已启动: 周期 {:?}", period);
            loop {
                ticker.tick().await;
                debug!("执行维护周期: 失效清理 + 内存优化");

                if let Err(e) = manager.invalidate_stale_entries().await {
                    error!("维护周期失效清理失败: {}", e);
                }
                let report = manager.optimize_cache().await;
                if report.triggered {
                    info!(
                        "维护周期触发内存优化: 占用 {} 字节",
                        report.memory_usage_bytes
                    );
                }
            }
        }));
    }

    /// 停止周期性维护任务
    pub async fn stop_periodic_maintenance(&self) {
        let mut handle = self.maintenance_handle.write().await;
        if let Some(handle) = handle.take() {
            handle.abort();
            info!("周期维护任务已停止");
        }
    }

    /// 维护任务是否在运行
    pub async fn is_maintenance_running(&self) -> bool {
        self.maintenance_handle
            .read()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// 关闭管理器，释放定时器资源
    pub async fn shutdown(&self) {
        info!("开始关闭缓存管理器");
        self.stop_periodic_maintenance().await;
        info!("缓存管理器已关闭");
    }
}
