//! 缓存键注册表模块
//!
//! 提供各类语义标识符到规范缓存键的纯函数映射。
//! 全库唯一的键构造入口：任何模块不得手工拼接缓存键。
//! 不同实体类型使用互不重叠的前缀，保证键空间无碰撞。

/// 单条报告缓存键前缀
pub const REPORT_PREFIX: &str = "report";
/// 最近报告列表键
pub const RECENT_REPORTS_KEY: &str = "recent_reports";
/// 分享分析键前缀
pub const SHARE_ANALYTICS_PREFIX: &str = "share_analytics";
/// 用户报告列表键前缀
pub const USER_REPORTS_PREFIX: &str = "user_reports";
/// 报告统计键前缀
pub const REPORT_STATS_PREFIX: &str = "report_stats";
/// OG 预览图键前缀
pub const OG_IMAGE_PREFIX: &str = "og_image";
/// 全局统计的占位标识
pub const GLOBAL_STATS_ID: &str = "global";

/// 生成单条报告缓存键
pub fn report(slug: &str) -> String {
    format!("{}:{}", REPORT_PREFIX, slug)
}

/// 生成最近报告列表缓存键
pub fn recent_reports() -> String {
    RECENT_REPORTS_KEY.to_string()
}

/// 生成分享分析缓存键
pub fn share_analytics(check_id: &str) -> String {
    format!("{}:{}", SHARE_ANALYTICS_PREFIX, check_id)
}

/// 生成用户报告列表缓存键
pub fn user_reports(user_id: &str) -> String {
    format!("{}:{}", USER_REPORTS_PREFIX, user_id)
}

/// 生成报告统计缓存键
///
/// user_id 为 None 时返回全局统计键
pub fn report_stats(user_id: Option<&str>) -> String {
    format!(
        "{}:{}",
        REPORT_STATS_PREFIX,
        user_id.unwrap_or(GLOBAL_STATS_ID)
    )
}

/// 生成 OG 预览图缓存键
pub fn og_image(slug: &str) -> String {
    format!("{}:{}", OG_IMAGE_PREFIX, slug)
}

/// 单条报告键的通配模式
pub fn report_pattern() -> String {
    format!("{}:*", REPORT_PREFIX)
}

/// 用户报告列表键的通配模式
pub fn user_reports_pattern() -> String {
    format!("{}:*", USER_REPORTS_PREFIX)
}

/// 分享分析键的通配模式
pub fn share_analytics_pattern() -> String {
    format!("{}:*", SHARE_ANALYTICS_PREFIX)
}

/// 报告统计键的通配模式
pub fn report_stats_pattern() -> String {
    format!("{}:*", REPORT_STATS_PREFIX)
}

/// 从报告缓存键还原 slug
///
/// 失效扫描用于将扫描到的键映射回后备存储中的标识；
/// 非 report 前缀的键返回 None
pub fn slug_from_report_key(key: &str) -> Option<&str> {
    key.strip_prefix(REPORT_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .filter(|slug| !slug.is_empty())
}
