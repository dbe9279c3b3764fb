//! 分享报告投影类型模块
//!
//! 定义缓存层使用的报告去范式化投影，字段足以支撑列表页渲染，
//! 无需回查后备存储

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分享报告摘要投影
///
/// 以 slug 唯一标识一份可公开分享的扫描报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// 报告短链标识
    pub slug: String,
    /// 被扫描的 URL
    pub url: String,
    /// URL 所属域名
    pub domain: String,
    /// 安全评分 (0-100)
    pub security_score: i32,
    /// 报告创建时间
    pub created_at: DateTime<Utc>,
    /// 是否包含 AI 分析结果
    pub has_ai_analysis: bool,
}

/// 报告统计信息
///
/// 按用户维度或全局维度聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStatistics {
    /// 报告总数
    pub total_reports: u64,
    /// 平均安全评分
    pub average_score: f64,
    /// 含 AI 分析的报告数
    pub reports_with_ai: u64,
    /// 最近一份报告的创建时间
    pub last_created_at: Option<DateTime<Utc>>,
}

/// 分享访问分析数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAnalytics {
    /// 关联的检测记录ID
    pub check_id: String,
    /// 分享页累计访问次数
    pub view_count: u64,
    /// 最近一次访问时间
    pub last_viewed_at: Option<DateTime<Utc>>,
}
