// crates/gm_config/src/roi.rs

//! 影响半径 (RoI) 模式选择
//!
//! 名称在配置阶段解析为带参数的 [`RoiMode`]。依赖雷达位置的偏移量和
//! 最大方位间距由核心层在映射开始前计算。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// 影响半径函数类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiFunctionKind {
    /// 常数半径
    Constant,
    /// 半径随到雷达的距离线性增长
    Dist,
    /// 由虚拟波束几何推导的半径
    DistBeam,
    /// 8/3 × 最大方位间距
    MaxSpace,
}

impl RoiFunctionKind {
    /// 获取名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Dist => "dist",
            Self::DistBeam => "dist_beam",
            Self::MaxSpace => "max_space",
        }
    }
}

impl FromStr for RoiFunctionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "dist" => Ok(Self::Dist),
            "dist_beam" => Ok(Self::DistBeam),
            "max_space" => Ok(Self::MaxSpace),
            _ => Err(ConfigError::UnknownName {
                kind: "影响半径函数",
                name: s.to_string(),
                expected: "constant, dist, dist_beam, max_space",
            }),
        }
    }
}

impl std::fmt::Display for RoiFunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 解析后的影响半径模式（带参数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoiMode {
    /// 常数半径 (米)
    Constant {
        /// 半径
        radius: f64,
    },
    /// roi = z_factor·Δz + xy_factor·Δh，下限 min_radius
    Dist {
        /// 垂直距离系数
        z_factor: f64,
        /// 水平距离系数
        xy_factor: f64,
        /// 最小半径 (米)
        min_radius: f64,
    },
    /// roi = h_factor·Δz/20 + Δh·tan(nb·bsp)，下限 min_radius
    DistBeam {
        /// 高度缩放系数
        h_factor: f64,
        /// 虚拟波束宽度 (度)
        nb: f64,
        /// 虚拟波束间距系数
        bsp: f64,
        /// 最小半径 (米)
        min_radius: f64,
    },
    /// 8/3 × 所有雷达的最大方位间距
    MaxSpace,
}

impl RoiMode {
    /// 对应的类别
    pub fn kind(&self) -> RoiFunctionKind {
        match self {
            Self::Constant { .. } => RoiFunctionKind::Constant,
            Self::Dist { .. } => RoiFunctionKind::Dist,
            Self::DistBeam { .. } => RoiFunctionKind::DistBeam,
            Self::MaxSpace => RoiFunctionKind::MaxSpace,
        }
    }

    /// 校验参数
    ///
    /// 系数必须为非负有限值，半径必须为正；这保证了半径随距离单调不减。
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Constant { radius } => positive("constant_roi", radius),
            Self::Dist {
                z_factor,
                xy_factor,
                min_radius,
            } => {
                non_negative("z_factor", z_factor)?;
                non_negative("xy_factor", xy_factor)?;
                positive("min_radius", min_radius)
            }
            Self::DistBeam {
                h_factor,
                nb,
                bsp,
                min_radius,
            } => {
                non_negative("h_factor", h_factor)?;
                non_negative("nb", nb)?;
                non_negative("bsp", bsp)?;
                if nb * bsp >= 90.0 {
                    return Err(ConfigError::invalid_value(
                        "nb*bsp",
                        nb * bsp,
                        "虚拟波束张角必须小于 90 度",
                    ));
                }
                positive("min_radius", min_radius)
            }
            Self::MaxSpace => Ok(()),
        }
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(key, value, "必须为正的有限值"))
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(key, value, "必须为非负有限值"))
    }
}
