// crates/gm_geo/src/projection/mod.rs

//! 纯 Rust 实现的网格投影
//!
//! 雷达库点的经纬度通过投影转换为相对网格原点的笛卡尔坐标。
//!
//! 支持的投影类型：
//! - 方位等距投影（球体，默认）
//!
//! 自定义投影只需实现 [`MapProjection`] trait。
//!
//! # 示例
//!
//! ```
//! use gm_geo::projection::{MapProjection, Projection};
//!
//! let proj = Projection::aeqd(-97.5, 36.5);
//! let (x, y) = proj.forward(-97.5, 36.5).unwrap();
//! assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
//! ```

mod aeqd;

pub use aeqd::{aeqd_to_geographic, geographic_to_aeqd, AEQD_EARTH_RADIUS};

use gm_foundation::error::GmResult;
use serde::{Deserialize, Serialize};

/// 地图投影 Trait
///
/// 所有投影实现都必须实现此 trait。实现必须是纯函数，
/// 映射过程中可能在多个线程上并发调用。
pub trait MapProjection: Send + Sync {
    /// 获取投影名称
    fn name(&self) -> &'static str;

    /// 正向投影：地理坐标 -> 平面坐标
    ///
    /// # Arguments
    /// - `lon`: 经度 (度)
    /// - `lat`: 纬度 (度)
    ///
    /// # Returns
    /// (x, y) 平面坐标 (米)
    fn forward(&self, lon: f64, lat: f64) -> GmResult<(f64, f64)>;

    /// 逆向投影：平面坐标 -> 地理坐标
    fn inverse(&self, x: f64, y: f64) -> GmResult<(f64, f64)>;

    /// 批量正向投影
    fn forward_batch(&self, lon: &[f64], lat: &[f64]) -> GmResult<(Vec<f64>, Vec<f64>)> {
        let mut xs = Vec::with_capacity(lon.len());
        let mut ys = Vec::with_capacity(lon.len());
        for (&lo, &la) in lon.iter().zip(lat) {
            let (x, y) = self.forward(lo, la)?;
            xs.push(x);
            ys.push(y);
        }
        Ok((xs, ys))
    }
}

/// 投影枚举（静态分发）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "proj", rename_all = "snake_case")]
pub enum Projection {
    /// 球体方位等距投影
    Aeqd {
        /// 投影中心经度 (度)
        lon_0: f64,
        /// 投影中心纬度 (度)
        lat_0: f64,
    },
}

impl Projection {
    /// 以指定中心创建方位等距投影
    #[must_use]
    pub fn aeqd(lon_0: f64, lat_0: f64) -> Self {
        Self::Aeqd { lon_0, lat_0 }
    }

    /// 投影中心 (lon, lat)
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        match *self {
            Self::Aeqd { lon_0, lat_0 } => (lon_0, lat_0),
        }
    }
}

impl MapProjection for Projection {
    fn name(&self) -> &'static str {
        match self {
            Self::Aeqd { .. } => "aeqd",
        }
    }

    fn forward(&self, lon: f64, lat: f64) -> GmResult<(f64, f64)> {
        match *self {
            Self::Aeqd { lon_0, lat_0 } => geographic_to_aeqd(lon, lat, lon_0, lat_0),
        }
    }

    fn inverse(&self, x: f64, y: f64) -> GmResult<(f64, f64)> {
        match *self {
            Self::Aeqd { lon_0, lat_0 } => aeqd_to_geographic(x, y, lon_0, lat_0),
        }
    }
}
