// crates/gm_geo/src/antenna.rs

//! 天线坐标 -> 笛卡尔坐标
//!
//! 采用 4/3 等效地球半径模型，考虑标准大气折射下波束路径的弯曲。
//!
//! $$
//! z = \sqrt{r^2 + R^2 + 2 r R \sin\theta_e} - R
//! $$
//!
//! $$
//! s = R \arcsin\left(\frac{r \cos\theta_e}{R + z}\right)
//! $$
//!
//! 其中 $R = \frac{4}{3} R_{earth}$，$s$ 为沿地表的弧长。
//! x 指向东，y 指向北，z 为相对天线的高度。

use glam::DVec3;

/// 地球平均半径 (米)
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// 等效地球半径系数
pub const EFFECTIVE_RADIUS_FACTOR: f64 = 4.0 / 3.0;

/// 单个库点的天线坐标 -> 相对天线的笛卡尔坐标
///
/// # Arguments
/// - `range`: 斜距 (米)
/// - `azimuth`: 方位角 (度，正北顺时针)
/// - `elevation`: 仰角 (度)
#[inline]
#[must_use]
pub fn antenna_to_cartesian(range: f64, azimuth: f64, elevation: f64) -> DVec3 {
    let re = EARTH_RADIUS * EFFECTIVE_RADIUS_FACTOR;
    let (sin_e, cos_e) = elevation.to_radians().sin_cos();
    let (sin_a, cos_a) = azimuth.to_radians().sin_cos();

    let z = (range * range + re * re + 2.0 * range * re * sin_e).sqrt() - re;
    let s = re * (range * cos_e / (re + z)).asin();
    DVec3::new(s * sin_a, s * cos_a, z)
}

/// 整个扫描的天线坐标 -> 笛卡尔坐标
///
/// 返回行优先 (nrays × ngates) 的位置数组
#[must_use]
pub fn antenna_vectors_to_cartesian(
    ranges: &[f64],
    azimuths: &[f64],
    elevations: &[f64],
) -> Vec<DVec3> {
    let mut out = Vec::with_capacity(azimuths.len() * ranges.len());
    for (&az, &el) in azimuths.iter().zip(elevations) {
        out.extend(ranges.iter().map(|&r| antenna_to_cartesian(r, az, el)));
    }
    out
}
