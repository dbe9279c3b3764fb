//! 错误类型定义模块
//!
//! 提供统一的错误类型和结果别名，缓存后端内部使用 anyhow，
//! 对外接口统一使用 CacheError

use thiserror::Error;

/// linkshield_cache 统一错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError {
        /// 错误消息
        message: String,
    },

    /// 缓存存储连接错误
    #[error("缓存连接错误: {message}")]
    ConnectionError {
        /// 错误消息
        message: String,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    SerializationError {
        /// 错误消息
        message: String,
    },

    /// 后备存储查询错误
    #[error("后备存储错误: {message}")]
    StoreError {
        /// 错误消息
        message: String,
    },

    /// 缓存维护操作错误
    #[error("维护操作错误: {message}")]
    MaintenanceError {
        /// 错误消息
        message: String,
    },

    /// IO 错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 统一结果类型别名
pub type CacheResult<T> = Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::SerializationError {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "sqlite-store")]
impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        CacheError::StoreError {
            message: err.to_string(),
        }
    }
}

/// 便捷错误构造宏
///
/// 用法: `shield_error!(config, "消息")` 或 `shield_error!(store, format!(...))`
#[macro_export]
macro_rules! shield_error {
    (config, $msg:expr) => {
        $crate::error::CacheError::ConfigError {
            message: $msg.to_string(),
        }
    };
    (connection, $msg:expr) => {
        $crate::error::CacheError::ConnectionError {
            message: $msg.to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::CacheError::SerializationError {
            message: $msg.to_string(),
        }
    };
    (store, $msg:expr) => {
        $crate::error::CacheError::StoreError {
            message: $msg.to_string(),
        }
    };
    (maintenance, $msg:expr) => {
        $crate::error::CacheError::MaintenanceError {
            message: $msg.to_string(),
        }
    };
}
