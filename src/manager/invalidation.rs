//! 缓存失效清理相关方法
//!
//! 将缓存中的报告键与后备存储对账：slug 已不存在的条目被删除。
//! 存在性检查按页批量执行（单次 IN 查询），避免逐键往返后备存储。

use super::CacheManager;
use crate::cache::keys;
use crate::error::CacheResult;
use rat_logger::{debug, info, warn};

impl CacheManager {
    /// 清理后备存储中已删除报告的陈旧缓存条目，返回删除数量
    ///
    /// 开销与缓存中报告键数量成正比，只适合维护频率调用，
    /// 不应出现在请求路径上
    pub async fn invalidate_stale_entries(&self) -> CacheResult<usize> {
        let cached_keys = self.client.keys(&keys::report_pattern()).await;
        if cached_keys.is_empty() {
            debug!("失效扫描: 无报告缓存条目");
            return Ok(0);
        }

        let mut removed = 0;
        for page in cached_keys.chunks(self.config.scan_page_size) {
            let slugs: Vec<String> = page
                .iter()
                .filter_map(|key| keys::slug_from_report_key(key))
                .map(String::from)
                .collect();
            if slugs.is_empty() {
                continue;
            }

            let existing = self.store.existing_slugs(&slugs).await?;
            for slug in &slugs {
                if !existing.contains(slug) {
                    if self.client.delete(&keys::report(slug)).await {
                        debug!("已删除陈旧缓存: slug={}", slug);
                        removed += 1;
                    }
                    // 报告已删除，附属的预览图缓存一并清理
                    self.client.delete(&keys::og_image(slug)).await;
                }
            }
        }

        info!(
            "失效扫描完成: 检查 {} 个键, 删除 {} 个陈旧条目",
            cached_keys.len(),
            removed
        );
        Ok(removed)
    }

    /// 清理指定用户的全部缓存条目，返回删除数量
    pub async fn clear_user_cache(&self, user_id: &str) -> usize {
        let mut deleted = 0;
        if self.client.delete(&keys::user_reports(user_id)).await {
            deleted += 1;
        }
        if self.client.delete(&keys::report_stats(Some(user_id))).await {
            deleted += 1;
        }
        info!("已清理用户缓存: user_id={}, 删除 {} 个键", user_id, deleted);
        deleted
    }

    /// 紧急清空命名空间下的所有缓存，返回删除数量
    pub async fn emergency_cache_clear(&self) -> usize {
        warn!("执行紧急缓存清空");
        let deleted = self.client.clear().await;
        warn!("紧急缓存清空完成: 删除 {} 个键", deleted);
        deleted
    }
}
