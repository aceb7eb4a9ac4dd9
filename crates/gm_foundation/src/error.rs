// crates/gm_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `GmError` 枚举和 `GmResult` 类型别名，用于整个工作区的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误，配置相关错误在 gm_config 中定义并向上转换
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **可追溯**: 支持错误链
//!
//! # 示例
//!
//! ```
//! use gm_foundation::error::{GmError, GmResult};
//!
//! fn check_shape(nz: usize) -> GmResult<()> {
//!     if nz == 0 {
//!         return Err(GmError::config("网格层数必须 >= 1"));
//!     }
//!     Ok(())
//! }
//! assert!(check_shape(0).is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type GmResult<T> = Result<T, GmError>;

/// GateMap 错误类型
#[derive(Error, Debug)]
pub enum GmError {
    // ========================================================================
    // 输入数据错误
    // ========================================================================
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    // ========================================================================
    // 配置错误
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    // ========================================================================
    // 计算错误
    // ========================================================================
    /// 投影错误
    #[error("投影错误: {0}")]
    Projection(String),
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl GmError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 投影错误
    pub fn projection(message: impl Into<String>) -> Self {
        Self::Projection(message.into())
    }

    /// 是否为配置类错误
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidConfig { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl GmError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> GmResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 测试
// ========================================================================
