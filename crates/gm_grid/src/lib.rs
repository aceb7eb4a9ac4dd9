// crates/gm_grid/src/lib.rs

//! GateMap 核心映射
//!
//! 将一部或多部雷达的库点数据加权映射到规则三维笛卡尔网格。
//!
//! # 模块
//!
//! - `grid`: 网格几何
//! - `sensor`: 雷达扫描输入、掩码场与排除掩码
//! - `fields`: 场选择与稠密场缓冲
//! - `roi`: 影响半径函数与搜索上界
//! - `weighting`: 权重核
//! - `accumulator`: 分区累加缓冲
//! - `finalize`: 归一化与影响半径诊断网格
//! - `mapper`: 映射入口
//! - `output`: 映射结果
//!
//! # 示例
//!
//! ```
//! use gm_config::{GridConfig, MappingConfig};
//! use gm_grid::prelude::*;
//!
//! let scan = SensorScan::new(
//!     "KTLX",
//!     SensorLocation::fixed(35.33, -97.28, 384.0),
//!     vec![0.0, 90.0, 180.0, 270.0],
//!     vec![0.5; 4],
//!     vec![1000.0, 2000.0],
//! )
//! .with_field("DBZ", MaskedField::all_valid(vec![20.0; 8]))
//! .unwrap();
//!
//! let grid = GridConfig::new([1, 5, 5], [[0.0, 0.0], [-2000.0, 2000.0], [-2000.0, 2000.0]]);
//! let config = MappingConfig::new(grid).with_constant_roi(1500.0);
//! let output = map_gates_to_grid(&[scan], None, &config).unwrap();
//! assert!(output.field("DBZ").unwrap().n_valid() > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod fields;
pub mod finalize;
pub mod grid;
pub mod mapper;
pub mod output;
pub mod roi;
pub mod sensor;
pub mod weighting;

/// 预导入模块
pub mod prelude {
    pub use crate::grid::GridGeometry;
    pub use crate::mapper::{map_gates_to_grid, GateMapper};
    pub use crate::output::{GridOutput, GriddedField, MappingWarning};
    pub use crate::sensor::{ExclusionMask, MaskedField, SensorLocation, SensorScan};
}

// 重导出常用类型
pub use accumulator::{AccumulateStats, GridAccumulator};
pub use grid::{Axis, GridGeometry};
pub use mapper::{map_gates_to_grid, GateMapper};
pub use output::{GridOutput, GriddedField, MappingWarning, OriginInfo};
pub use roi::RoiFunction;
pub use sensor::{ExclusionMask, GatePositions, MaskedField, SensorLocation, SensorScan};
pub use weighting::WeightingKernel;
