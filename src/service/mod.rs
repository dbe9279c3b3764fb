//! 缓存服务层模块
//!
//! 提供对后备存储的读穿透缓存装饰

pub mod cached;

pub use cached::CachedReportService;
