// crates/gm_geo/src/lib.rs
//! GateMap 地理空间处理模块
//!
//! 提供雷达库点从天线坐标、地理坐标到网格笛卡尔坐标的转换。
//!
//! # 模块
//!
//! - `projection`: 网格投影 (方位等距) 与 `MapProjection` trait
//! - `antenna`: 天线坐标 (方位/仰角/斜距) -> 笛卡尔坐标
//!
//! # 示例
//!
//! ```
//! use gm_geo::prelude::*;
//!
//! // 库点位置
//! let p = antenna_to_cartesian(10_000.0, 90.0, 0.5);
//! assert!(p.x > 9_000.0);
//!
//! // 以网格原点为中心的投影
//! let proj = Projection::aeqd(-97.5, 36.5);
//! let (x, _y) = proj.forward(-97.4, 36.5).unwrap();
//! assert!(x > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod antenna;
pub mod projection;

/// 预导入模块
pub mod prelude {
    pub use crate::antenna::{antenna_to_cartesian, antenna_vectors_to_cartesian};
    pub use crate::projection::{MapProjection, Projection};
}

// 重导出常用类型
pub use antenna::{antenna_to_cartesian, antenna_vectors_to_cartesian};
pub use projection::{MapProjection, Projection};
