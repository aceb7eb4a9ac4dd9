// crates/gm_config/src/weighting.rs

//! 权重函数选择
//!
//! 配置中的权重函数名称在构建映射时解析一次，得到固定数值标签的枚举；
//! 热循环只对标签做 `match`，不再比较字符串。
//!
//! | 名称 | 标签 | 说明 |
//! |------|------|------|
//! | Barnes | 0 | 旧版高斯权重，已弃用 |
//! | Cressman | 1 | (R² − d²)/(R² + d²) |
//! | Nearest | 2 | 半径内等权 |
//! | Barnes2 | 3 | Pauley & Wu (1990) 修正的高斯权重 |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// 权重函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WeightingFunction {
    /// 旧版 Barnes：exp(−d²/2R²)
    Barnes = 0,
    /// Cressman
    Cressman = 1,
    /// 半径内等权
    Nearest = 2,
    /// Barnes2：exp(−d²/(R²/4))
    Barnes2 = 3,
}

impl WeightingFunction {
    /// 获取名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Barnes => "Barnes",
            Self::Cressman => "Cressman",
            Self::Nearest => "Nearest",
            Self::Barnes2 => "Barnes2",
        }
    }

    /// 数值标签
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// 是否已弃用
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::Barnes)
    }
}

impl Default for WeightingFunction {
    fn default() -> Self {
        Self::Barnes2
    }
}

impl std::fmt::Display for WeightingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for WeightingFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BARNES2" => Ok(Self::Barnes2),
            "NEAREST" => Ok(Self::Nearest),
            "CRESSMAN" => Ok(Self::Cressman),
            "BARNES" => Ok(Self::Barnes),
            _ => Err(ConfigError::UnknownName {
                kind: "权重函数",
                name: s.to_string(),
                expected: "Barnes, Barnes2, Cressman, Nearest",
            }),
        }
    }
}
