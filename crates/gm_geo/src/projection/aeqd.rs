// crates/gm_geo/src/projection/aeqd.rs

//! 方位等距投影 (Azimuthal Equidistant) 实现
//!
//! 将地球视为正球体。投影中心到任意点的距离与方位角在投影面上保持不变，
//! 因此适合以雷达站或网格原点为中心的局地笛卡尔坐标。
//!
//! # 注意
//!
//! 与 Web Mercator 相同，这里不使用椭球体参数；在雷达有效探测范围
//! （数百公里）内误差可以忽略。

use gm_foundation::error::{GmError, GmResult};

/// 球体地球半径 (米)
///
/// 与常用雷达工具链的方位等距投影保持一致
pub const AEQD_EARTH_RADIUS: f64 = 6_370_997.0;

/// 地理坐标 -> 方位等距平面坐标
///
/// # Arguments
/// - `lon`, `lat`: 目标点经纬度 (度)
/// - `lon_0`, `lat_0`: 投影中心经纬度 (度)
///
/// # Returns
/// (x, y) 东向、北向坐标 (米)
///
/// # Errors
/// 输入不是有限值时返回投影错误
pub fn geographic_to_aeqd(lon: f64, lat: f64, lon_0: f64, lat_0: f64) -> GmResult<(f64, f64)> {
    if !(lon.is_finite() && lat.is_finite()) {
        return Err(GmError::projection(format!(
            "方位等距正向投影输入无效: lon={lon}, lat={lat}"
        )));
    }

    let lat_rad = lat.to_radians();
    let lat_0_rad = lat_0.to_radians();
    let lon_diff = (lon - lon_0).to_radians();

    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lat_0, cos_lat_0) = lat_0_rad.sin_cos();
    let cos_lon_diff = lon_diff.cos();

    // 数值误差可能使 cos(c) 略超出 [-1, 1]
    let arg = (sin_lat_0 * sin_lat + cos_lat_0 * cos_lat * cos_lon_diff).clamp(-1.0, 1.0);
    let c = arg.acos();
    let k = if c == 0.0 { 1.0 } else { c / c.sin() };

    let x = AEQD_EARTH_RADIUS * k * cos_lat * lon_diff.sin();
    let y = AEQD_EARTH_RADIUS * k * (cos_lat_0 * sin_lat - sin_lat_0 * cos_lat * cos_lon_diff);
    Ok((x, y))
}

/// 方位等距平面坐标 -> 地理坐标
///
/// # Returns
/// (lon, lat) 经度和纬度 (度)，经度归一化到 [-180, 180)
///
/// # Errors
/// 输入不是有限值时返回投影错误
pub fn aeqd_to_geographic(x: f64, y: f64, lon_0: f64, lat_0: f64) -> GmResult<(f64, f64)> {
    if !(x.is_finite() && y.is_finite()) {
        return Err(GmError::projection(format!(
            "方位等距逆向投影输入无效: x={x}, y={y}"
        )));
    }

    let rho = x.hypot(y);
    if rho == 0.0 {
        return Ok((lon_0, lat_0));
    }

    let lat_0_rad = lat_0.to_radians();
    let (sin_lat_0, cos_lat_0) = lat_0_rad.sin_cos();
    let c = rho / AEQD_EARTH_RADIUS;
    let (sin_c, cos_c) = c.sin_cos();

    let lat_arg = (cos_c * sin_lat_0 + y * sin_c * cos_lat_0 / rho).clamp(-1.0, 1.0);
    let lat = lat_arg.asin().to_degrees();

    let x1 = x * sin_c;
    let x2 = rho * cos_lat_0 * cos_c - y * sin_lat_0 * sin_c;
    let lon = lon_0 + x1.atan2(x2).to_degrees();
    Ok((wrap_longitude(lon), lat))
}

/// 经度归一化到 [-180, 180)
#[inline]
fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

// ============================================================================
// 测试
// ============================================================================
