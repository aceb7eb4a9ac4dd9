// crates/gm_grid/src/output.rs

//! 映射输出
//!
//! 每个场输出一个三维数值网格和并行的有效性网格；
//! 没有任何库点到达的单元为缺测，数值为 NaN 且有效位为 false。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use gm_geo::Projection;

use crate::grid::GridGeometry;

/// 带有效性掩码的三维网格场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedField {
    shape: [usize; 3],
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl GriddedField {
    /// 由数值和有效性掩码创建（内部保证长度一致）
    pub(crate) fn from_parts(shape: [usize; 3], values: Vec<f64>, valid: Vec<bool>) -> Self {
        debug_assert_eq!(values.len(), shape.iter().product::<usize>());
        debug_assert_eq!(values.len(), valid.len());
        Self { shape, values, valid }
    }

    /// 所有单元均有效
    pub(crate) fn dense(shape: [usize; 3], values: Vec<f64>) -> Self {
        let valid = vec![true; values.len()];
        Self::from_parts(shape, values, valid)
    }

    /// 形状 (nz, ny, nx)
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// 展平的数值（缺测为 NaN）
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 展平的有效性掩码
    #[inline]
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// 读取单元值，缺测返回 None
    #[inline]
    pub fn get(&self, k: usize, j: usize, i: usize) -> Option<f64> {
        let [nz, ny, nx] = self.shape;
        if k >= nz || j >= ny || i >= nx {
            return None;
        }
        let idx = (k * ny + j) * nx + i;
        self.valid[idx].then(|| self.values[idx])
    }

    /// 有效单元数
    pub fn n_valid(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// 是否全部缺测
    pub fn is_all_missing(&self) -> bool {
        !self.valid.iter().any(|&v| v)
    }
}

/// 映射过程中的非致命问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingWarning {
    /// 使用了已弃用的权重函数
    DeprecatedWeighting {
        /// 权重函数名称
        function: String,
        /// 建议替代
        replacement: String,
    },
    /// 指定的场在某部雷达中不存在，该雷达对该场无贡献
    MissingField {
        /// 雷达名称
        sensor: String,
        /// 场名称
        field: String,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeprecatedWeighting {
                function,
                replacement,
            } => write!(f, "权重函数 {function} 已弃用，请使用 {replacement}"),
            Self::MissingField { sensor, field } => {
                write!(f, "雷达 {sensor} 缺少场 {field}，已跳过其贡献")
            }
        }
    }
}

/// 网格原点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginInfo {
    /// 纬度 [deg]
    pub latitude: f64,
    /// 经度 [deg]
    pub longitude: f64,
    /// 海拔 [m]
    pub altitude: f64,
}

/// 映射结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridOutput {
    /// 网格几何
    pub geometry: GridGeometry,
    /// 网格原点
    pub origin: OriginInfo,
    /// 使用的投影；跳过地理转换或使用自定义投影时为 None
    pub projection: Option<Projection>,
    /// 场名称 -> 网格场
    pub fields: BTreeMap<String, GriddedField>,
    /// 每个单元使用的影响半径（诊断）
    pub roi: Option<GriddedField>,
    /// 非致命警告
    pub warnings: Vec<MappingWarning>,
}

impl GridOutput {
    /// 按名称获取场
    pub fn field(&self, name: &str) -> Option<&GriddedField> {
        self.fields.get(name)
    }

    /// 场名称列表
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
