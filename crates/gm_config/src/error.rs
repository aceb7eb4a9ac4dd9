// crates/gm_config/src/error.rs

//! 配置层错误类型

use gm_foundation::GmError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 未知的名称（权重函数、影响半径模式等）
    #[error("未知的{kind} '{name}', 支持: {expected}")]
    UnknownName {
        /// 名称类别
        kind: &'static str,
        /// 输入的名称
        name: String,
        /// 支持的名称列表
        expected: &'static str,
    },

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 数量不匹配（如滤波器数量与雷达数量）
    #[error("{what} 数量不匹配: 期望 {expected}, 实际 {actual}")]
    CountMismatch {
        /// 对象名称
        what: &'static str,
        /// 期望数量
        expected: usize,
        /// 实际数量
        actual: usize,
    },

    /// 无法由输入数据确定的参数
    #[error("无法确定 {key}: {reason}")]
    Unresolvable {
        /// 参数名
        key: &'static str,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 创建无效值错误
    pub fn invalid_value(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for GmError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { key, value, reason } => {
                GmError::invalid_config(key, value, reason)
            }
            other => GmError::config(other.to_string()),
        }
    }
}
