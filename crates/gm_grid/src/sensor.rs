// crates/gm_grid/src/sensor.rs

//! 雷达扫描输入
//!
//! 外部解析器把雷达文件整理成 [`SensorScan`] 交给映射核心：
//! 每条射线的方位角/仰角、每个库的斜距、雷达位置、库点位置以及
//! 带有效性掩码的场数据。掩码始终与数值并行存储，不依赖填充值。

use std::borrow::Cow;
use std::collections::BTreeMap;

use glam::DVec3;

use gm_foundation::error::{GmError, GmResult};
use gm_geo::antenna::antenna_vectors_to_cartesian;
use gm_geo::projection::{aeqd_to_geographic, geographic_to_aeqd};

/// 带有效性掩码的二维场 (nrays × ngates，行优先)
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedField {
    data: Vec<f64>,
    valid: Vec<bool>,
}

impl MaskedField {
    /// 由数值和有效性掩码创建
    pub fn new(data: Vec<f64>, valid: Vec<bool>) -> GmResult<Self> {
        GmError::check_size("field valid mask", data.len(), valid.len())?;
        Ok(Self { data, valid })
    }

    /// 所有数值均有效
    pub fn all_valid(data: Vec<f64>) -> Self {
        let valid = vec![true; data.len()];
        Self { data, valid }
    }

    /// 非有限值 (NaN/Inf) 视为无效
    pub fn from_finite(data: Vec<f64>) -> Self {
        let valid = data.iter().map(|v| v.is_finite()).collect();
        Self { data, valid }
    }

    /// 数值
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// 有效性掩码（true 为有效）
    #[inline]
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// 元素个数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 雷达位置
///
/// 固定雷达每个数组长度为 1；移动平台（车载、机载）为逐射线位置，
/// 映射时取平均值。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorLocation {
    /// 纬度 [deg]
    pub latitude: Vec<f64>,
    /// 经度 [deg]
    pub longitude: Vec<f64>,
    /// 海拔 [m]
    pub altitude: Vec<f64>,
}

impl SensorLocation {
    /// 固定雷达
    pub fn fixed(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude: vec![latitude],
            longitude: vec![longitude],
            altitude: vec![altitude],
        }
    }

    /// 移动平台
    pub fn moving(latitude: Vec<f64>, longitude: Vec<f64>, altitude: Vec<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// 平均纬度
    pub fn mean_latitude(&self) -> f64 {
        mean(&self.latitude)
    }

    /// 平均经度
    pub fn mean_longitude(&self) -> f64 {
        mean(&self.longitude)
    }

    /// 平均海拔
    pub fn mean_altitude(&self) -> f64 {
        mean(&self.altitude)
    }

    fn validate(&self) -> GmResult<()> {
        for (name, values) in [
            ("latitude", &self.latitude),
            ("longitude", &self.longitude),
            ("altitude", &self.altitude),
        ] {
            if values.is_empty() {
                return Err(GmError::invalid_input(format!("雷达位置 {name} 为空")));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(GmError::invalid_input(format!("雷达位置 {name} 含非有限值")));
            }
        }
        Ok(())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// 库点位置来源
#[derive(Debug, Clone, PartialEq)]
pub enum GatePositions {
    /// 由方位角/仰角/斜距按 4/3 等效地球半径模型计算
    Antenna,
    /// 预先计算的相对雷达的笛卡尔坐标 (x 东, y 北, z 高度) [m]
    Cartesian(Vec<DVec3>),
    /// 预先计算的地理坐标
    Geographic {
        /// 经度 [deg]
        longitude: Vec<f64>,
        /// 纬度 [deg]
        latitude: Vec<f64>,
        /// 海拔 [m]
        altitude: Vec<f64>,
    },
}

/// 库点地理坐标
#[derive(Debug, Clone, PartialEq)]
pub struct GateGeographic {
    /// 经度 [deg]
    pub longitude: Vec<f64>,
    /// 纬度 [deg]
    pub latitude: Vec<f64>,
    /// 海拔 [m]
    pub altitude: Vec<f64>,
}

/// 单部雷达的一次扫描（体扫）
#[derive(Debug, Clone)]
pub struct SensorScan {
    /// 雷达名称，用于确定多雷达合并顺序
    pub name: String,
    /// 射线方位角 [deg]
    pub azimuth: Vec<f64>,
    /// 射线仰角 [deg]
    pub elevation: Vec<f64>,
    /// 库斜距 [m]
    pub range: Vec<f64>,
    /// 雷达位置
    pub location: SensorLocation,
    /// 库点位置
    pub gates: GatePositions,
    /// 场数据
    pub fields: BTreeMap<String, MaskedField>,
}

impl SensorScan {
    /// 创建扫描，库点位置由天线坐标计算
    pub fn new(
        name: impl Into<String>,
        location: SensorLocation,
        azimuth: Vec<f64>,
        elevation: Vec<f64>,
        range: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            azimuth,
            elevation,
            range,
            location,
            gates: GatePositions::Antenna,
            fields: BTreeMap::new(),
        }
    }

    /// 射线数
    #[inline]
    pub fn nrays(&self) -> usize {
        self.azimuth.len()
    }

    /// 每条射线的库数
    #[inline]
    pub fn ngates(&self) -> usize {
        self.range.len()
    }

    /// 库点总数
    #[inline]
    pub fn n_gates_total(&self) -> usize {
        self.nrays() * self.ngates()
    }

    /// 使用预先计算的笛卡尔库点位置（相对雷达）
    pub fn with_cartesian_gates(mut self, positions: Vec<DVec3>) -> Self {
        self.gates = GatePositions::Cartesian(positions);
        self
    }

    /// 使用预先计算的库点地理坐标
    pub fn with_geographic_gates(
        mut self,
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        altitude: Vec<f64>,
    ) -> Self {
        self.gates = GatePositions::Geographic {
            longitude,
            latitude,
            altitude,
        };
        self
    }

    /// 添加场
    pub fn add_field(&mut self, name: impl Into<String>, field: MaskedField) -> GmResult<()> {
        GmError::check_size("field", self.n_gates_total(), field.len())?;
        self.fields.insert(name.into(), field);
        Ok(())
    }

    /// 添加场（链式）
    pub fn with_field(mut self, name: impl Into<String>, field: MaskedField) -> GmResult<Self> {
        self.add_field(name, field)?;
        Ok(self)
    }

    /// 验证各数组尺寸一致
    pub fn validate(&self) -> GmResult<()> {
        GmError::check_size("elevation", self.nrays(), self.elevation.len())?;
        self.location.validate()?;

        let n = self.n_gates_total();
        match &self.gates {
            GatePositions::Antenna => {}
            GatePositions::Cartesian(p) => GmError::check_size("gate cartesian", n, p.len())?,
            GatePositions::Geographic {
                longitude,
                latitude,
                altitude,
            } => {
                GmError::check_size("gate longitude", n, longitude.len())?;
                GmError::check_size("gate latitude", n, latitude.len())?;
                GmError::check_size("gate altitude", n, altitude.len())?;
            }
        }
        for field in self.fields.values() {
            GmError::check_size("field", n, field.len())?;
        }
        Ok(())
    }

    /// 库点相对雷达的笛卡尔坐标 (x 东, y 北, z 高度)
    pub fn gate_cartesian(&self) -> GmResult<Cow<'_, [DVec3]>> {
        match &self.gates {
            GatePositions::Antenna => Ok(Cow::Owned(antenna_vectors_to_cartesian(
                &self.range,
                &self.azimuth,
                &self.elevation,
            ))),
            GatePositions::Cartesian(p) => Ok(Cow::Borrowed(p.as_slice())),
            GatePositions::Geographic {
                longitude,
                latitude,
                altitude,
            } => {
                let lon_0 = self.location.mean_longitude();
                let lat_0 = self.location.mean_latitude();
                let alt_0 = self.location.mean_altitude();
                let mut out = Vec::with_capacity(longitude.len());
                for ((&lon, &lat), &alt) in longitude.iter().zip(latitude).zip(altitude) {
                    let (x, y) = geographic_to_aeqd(lon, lat, lon_0, lat_0)?;
                    out.push(DVec3::new(x, y, alt - alt_0));
                }
                Ok(Cow::Owned(out))
            }
        }
    }

    /// 库点地理坐标
    ///
    /// 未提供时由相对雷达的笛卡尔坐标经方位等距逆投影得到。
    pub fn gate_geographic(&self) -> GmResult<GateGeographic> {
        if let GatePositions::Geographic {
            longitude,
            latitude,
            altitude,
        } = &self.gates
        {
            return Ok(GateGeographic {
                longitude: longitude.clone(),
                latitude: latitude.clone(),
                altitude: altitude.clone(),
            });
        }

        let lon_0 = self.location.mean_longitude();
        let lat_0 = self.location.mean_latitude();
        let alt_0 = self.location.mean_altitude();
        let cart = self.gate_cartesian()?;

        let n = cart.len();
        let mut geo = GateGeographic {
            longitude: Vec::with_capacity(n),
            latitude: Vec::with_capacity(n),
            altitude: Vec::with_capacity(n),
        };
        for p in cart.iter() {
            let (lon, lat) = aeqd_to_geographic(p.x, p.y, lon_0, lat_0)?;
            geo.longitude.push(lon);
            geo.latitude.push(lat);
            geo.altitude.push(alt_0 + p.z);
        }
        Ok(geo)
    }
}

/// 库点排除掩码（由外部滤波器给出，对所有场一致）
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionMask {
    nrays: usize,
    ngates: usize,
    excluded: Vec<bool>,
}

impl ExclusionMask {
    /// 全部包含
    pub fn include_all(nrays: usize, ngates: usize) -> Self {
        Self {
            nrays,
            ngates,
            excluded: vec![false; nrays * ngates],
        }
    }

    /// 由排除标志创建 (true 为排除)
    pub fn from_excluded(nrays: usize, ngates: usize, excluded: Vec<bool>) -> GmResult<Self> {
        GmError::check_size("exclusion mask", nrays * ngates, excluded.len())?;
        Ok(Self {
            nrays,
            ngates,
            excluded,
        })
    }

    /// 排除单个库点
    pub fn exclude(&mut self, ray: usize, gate: usize) {
        if ray < self.nrays && gate < self.ngates {
            self.excluded[ray * self.ngates + gate] = true;
        }
    }

    /// 排除满足条件的库点（条件作用于场数据）
    ///
    /// 场长度必须等于 `nrays * ngates`。
    pub fn exclude_where<F>(&mut self, field: &MaskedField, mut predicate: F) -> GmResult<()>
    where
        F: FnMut(f64) -> bool,
    {
        GmError::check_size("exclusion mask field", self.excluded.len(), field.len())?;
        for ((flag, &v), &ok) in self.excluded.iter_mut().zip(field.data()).zip(field.valid()) {
            if ok && predicate(v) {
                *flag = true;
            }
        }
        Ok(())
    }

    /// 展平索引处是否排除
    #[inline]
    pub fn is_excluded(&self, idx: usize) -> bool {
        self.excluded[idx]
    }

    /// 排除的库点数
    pub fn n_excluded(&self) -> usize {
        self.excluded.iter().filter(|&&e| e).count()
    }

    /// 检查与扫描尺寸一致
    pub fn check_shape(&self, scan: &SensorScan) -> GmResult<()> {
        GmError::check_size("exclusion mask rays", scan.nrays(), self.nrays)?;
        GmError::check_size("exclusion mask gates", scan.ngates(), self.ngates)
    }
}
