// crates/gm_grid/src/roi.rs

//! 影响半径函数
//!
//! 半径在单元中心处按所属雷达求值。诊断网格没有所属雷达，
//! 取所有雷达中的最小半径（即最近雷达的半径）。
//!
//! 为了确定每个库点需要扫描的单元范围，每种模式还提供搜索上界：
//! 对任何可能被该库点覆盖的单元 c 都有 |c − p| ≤ 上界。
//!
//! 距离相关模式的半径关于位置是 L-Lipschitz 的凸函数：
//! - 若 c 被覆盖，|c − p| ≤ R(c) ≤ R(p) + L·|c − p|，L < 1 时得 |c − p| ≤ R(p)/(1 − L)
//! - 凸函数在网格包围盒上的最大值在 8 个角点之一取得

use glam::DVec3;

use gm_config::{ConfigError, RoiMode};
use gm_foundation::error::GmResult;

/// MaxSpace 模式下半径与最大方位间距之比
pub const MAX_SPACE_RATIO: f64 = 8.0 / 3.0;

/// 搜索上界的相对余量
const BOUND_SLACK: f64 = 1e-9;

/// 影响半径函数
///
/// `offsets` 为各雷达相对网格原点的位置 (x, y, z)，按雷达输入顺序排列。
#[derive(Debug, Clone, PartialEq)]
pub enum RoiFunction {
    /// 常数半径
    Constant {
        /// 半径 [m]
        radius: f64,
    },
    /// max(min_radius, z_factor·Δz + xy_factor·Δh)
    Dist {
        /// 垂直系数
        z_factor: f64,
        /// 水平系数
        xy_factor: f64,
        /// 最小半径 [m]
        min_radius: f64,
        /// 雷达位置
        offsets: Vec<DVec3>,
    },
    /// max(min_radius, h_factor·Δz/20 + Δh·tan(nb·bsp))
    DistBeam {
        /// 高度缩放系数
        h_factor: f64,
        /// tan(nb·bsp·π/180)
        beam_factor: f64,
        /// 最小半径 [m]
        min_radius: f64,
        /// 雷达位置
        offsets: Vec<DVec3>,
    },
    /// 8/3 × 最大方位间距
    MaxSpace {
        /// 半径 [m]
        radius: f64,
        /// 所有雷达的最大方位间距 [m]
        max_az_spacing: f64,
    },
}

impl RoiFunction {
    /// 由配置模式构建
    ///
    /// MaxSpace 模式需要 `max_az_spacing`，缺失时返回配置错误。
    pub fn from_mode(mode: RoiMode, offsets: Vec<DVec3>, max_az_spacing: Option<f64>) -> GmResult<Self> {
        mode.validate()?;
        let roi = match mode {
            RoiMode::Constant { radius } => Self::Constant { radius },
            RoiMode::Dist {
                z_factor,
                xy_factor,
                min_radius,
            } => Self::Dist {
                z_factor,
                xy_factor,
                min_radius,
                offsets,
            },
            RoiMode::DistBeam {
                h_factor,
                nb,
                bsp,
                min_radius,
            } => Self::DistBeam {
                h_factor,
                beam_factor: (nb * bsp).to_radians().tan(),
                min_radius,
                offsets,
            },
            RoiMode::MaxSpace => {
                let spacing = max_az_spacing.ok_or_else(|| ConfigError::Unresolvable {
                    key: "max_az_spacing",
                    reason: "max_space 模式需要方位间距".into(),
                })?;
                Self::MaxSpace {
                    radius: MAX_SPACE_RATIO * spacing,
                    max_az_spacing: spacing,
                }
            }
        };
        Ok(roi)
    }

    /// 半径是否与位置无关
    #[inline]
    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::Constant { .. } | Self::MaxSpace { .. })
    }

    /// 半径关于位置的 Lipschitz 常数
    pub fn lipschitz(&self) -> f64 {
        match *self {
            Self::Constant { .. } | Self::MaxSpace { .. } => 0.0,
            Self::Dist {
                z_factor,
                xy_factor,
                ..
            } => z_factor.hypot(xy_factor),
            Self::DistBeam {
                h_factor,
                beam_factor,
                ..
            } => (h_factor / 20.0).hypot(beam_factor),
        }
    }

    /// 点 p 处相对第 `sensor` 部雷达的半径
    #[inline]
    pub fn radius_for_sensor(&self, p: DVec3, sensor: usize) -> f64 {
        match self {
            Self::Constant { radius } | Self::MaxSpace { radius, .. } => *radius,
            Self::Dist {
                z_factor,
                xy_factor,
                min_radius,
                offsets,
            } => {
                let d = p - offsets[sensor];
                (z_factor * d.z + xy_factor * d.x.hypot(d.y)).max(*min_radius)
            }
            Self::DistBeam {
                h_factor,
                beam_factor,
                min_radius,
                offsets,
            } => {
                let d = p - offsets[sensor];
                (h_factor * d.z / 20.0 + d.x.hypot(d.y) * beam_factor).max(*min_radius)
            }
        }
    }

    /// 点 p 处的半径（所有雷达中的最小值）
    pub fn radius_at(&self, p: DVec3) -> f64 {
        match self {
            Self::Constant { radius } | Self::MaxSpace { radius, .. } => *radius,
            Self::Dist {
                offsets,
                min_radius,
                ..
            }
            | Self::DistBeam {
                offsets,
                min_radius,
                ..
            } => {
                if offsets.is_empty() {
                    return *min_radius;
                }
                (0..offsets.len())
                    .map(|s| self.radius_for_sensor(p, s))
                    .fold(f64::INFINITY, f64::min)
            }
        }
    }

    /// 第 `sensor` 部雷达在网格包围盒上的最大半径
    pub fn box_bound(&self, corners: &[DVec3; 8], sensor: usize) -> f64 {
        corners
            .iter()
            .map(|&c| self.radius_for_sensor(c, sensor))
            .fold(0.0, f64::max)
    }

    /// 位于 p 的库点的搜索上界
    ///
    /// `box_max` 为 [`box_bound`](Self::box_bound) 的结果。
    #[inline]
    pub fn search_radius(&self, p: DVec3, sensor: usize, box_max: f64) -> f64 {
        if self.is_uniform() {
            return self.radius_for_sensor(p, sensor);
        }
        let l = self.lipschitz();
        let bound = if l < 1.0 {
            (self.radius_for_sensor(p, sensor) / (1.0 - l)).min(box_max)
        } else {
            box_max
        };
        bound * (1.0 + BOUND_SLACK)
    }
}

/// 单部雷达的最大方位间距
///
/// 取每条射线最远库点的水平位置，计算相邻射线之间的距离最大值。
/// 少于两条射线时返回 None。`positions` 按 (射线, 库点) 行优先排列。
pub fn azimuthal_spacing(positions: &[DVec3], nrays: usize, ngates: usize) -> Option<f64> {
    if nrays < 2 || ngates == 0 || positions.len() < nrays * ngates {
        return None;
    }
    let last = |ray: usize| positions[ray * ngates + ngates - 1];
    (1..nrays)
        .map(|ray| {
            let d = last(ray) - last(ray - 1);
            d.x.hypot(d.y)
        })
        .reduce(f64::max)
}

/// 所有雷达的最大方位间距
///
/// 缓冲按雷达个数分配，没有任何雷达能给出正的有限间距时返回配置错误。
pub fn max_azimuthal_spacing(per_sensor: &[Option<f64>]) -> GmResult<f64> {
    let max = per_sensor.iter().flatten().copied().fold(f64::NAN, f64::max);
    if max.is_finite() && max > 0.0 {
        Ok(max)
    } else {
        Err(ConfigError::Unresolvable {
            key: "max_az_spacing",
            reason: "没有雷达包含至少两条射线的有效方位间距".into(),
        }
        .into())
    }
}
