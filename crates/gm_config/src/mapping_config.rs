// crates/gm_config/src/mapping_config.rs

//! MappingConfig - 库点到网格映射的配置
//!
//! 所有数值使用 f64 存储以便 JSON 序列化。名称类参数（权重函数、
//! 影响半径函数）以字符串保存，由 [`MappingConfig::resolve`] 一次性解析。

use serde::{Deserialize, Serialize};
use std::path::Path;

use gm_geo::Projection;

use crate::error::ConfigError;
use crate::roi::{RoiFunctionKind, RoiMode};
use crate::weighting::WeightingFunction;

/// 映射配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// 网格定义
    pub grid: GridConfig,

    /// 待映射的场名称，None 表示所有雷达共有的场
    #[serde(default)]
    pub fields: Option<Vec<String>>,

    /// 权重函数名称 (Barnes/Barnes2/Cressman/Nearest)
    #[serde(default = "default_weighting_function")]
    pub weighting_function: String,

    /// 影响半径函数名称 (constant/dist/dist_beam/max_space)
    #[serde(default = "default_roi_func")]
    pub roi_func: String,

    /// 常数影响半径 [m]
    #[serde(default = "default_constant_roi")]
    pub constant_roi: f64,

    /// dist: 垂直距离系数
    #[serde(default = "default_z_factor")]
    pub z_factor: f64,

    /// dist: 水平距离系数
    #[serde(default = "default_xy_factor")]
    pub xy_factor: f64,

    /// dist/dist_beam: 最小影响半径 [m]
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,

    /// dist_beam: 高度缩放系数
    #[serde(default = "default_h_factor")]
    pub h_factor: f64,

    /// dist_beam: 虚拟波束宽度 [deg]
    #[serde(default = "default_nb")]
    pub nb: f64,

    /// dist_beam: 虚拟波束间距系数
    #[serde(default = "default_bsp")]
    pub bsp: f64,

    /// 大气层顶高度 [m]，高于此高度的库点被忽略
    #[serde(default = "default_toa")]
    pub toa: f64,

    /// 是否输出影响半径诊断网格
    #[serde(default = "default_map_roi")]
    pub map_roi: bool,

    /// 并行配置
    #[serde(default)]
    pub parallel: ParallelConfig,
}

fn default_weighting_function() -> String { "Barnes2".to_string() }
fn default_roi_func() -> String { "dist_beam".to_string() }
fn default_constant_roi() -> f64 { 500.0 }
fn default_z_factor() -> f64 { 0.05 }
fn default_xy_factor() -> f64 { 0.02 }
fn default_min_radius() -> f64 { 500.0 }
fn default_h_factor() -> f64 { 1.0 }
fn default_nb() -> f64 { 1.5 }
fn default_bsp() -> f64 { 1.0 }
fn default_toa() -> f64 { 17000.0 }
fn default_map_roi() -> bool { true }

/// 网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// 网格点数 (nz, ny, nx)
    pub shape: [usize; 3],

    /// 各轴范围 [[z_min, z_max], [y_min, y_max], [x_min, x_max]] [m]
    pub limits: [[f64; 2]; 3],

    /// 网格原点经纬度，None 表示使用第一部雷达的位置
    #[serde(default)]
    pub origin: Option<GridOrigin>,

    /// 网格原点海拔 [m]，None 表示使用第一部雷达的海拔
    #[serde(default)]
    pub origin_alt: Option<f64>,

    /// 网格投影，None 表示以原点为中心的方位等距投影
    #[serde(default)]
    pub projection: Option<ProjectionConfig>,
}

/// 网格原点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOrigin {
    /// 纬度 [deg]
    pub latitude: f64,
    /// 经度 [deg]
    pub longitude: f64,
}

/// 投影配置
///
/// 未给出的投影中心由网格原点补全。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "proj", rename_all = "snake_case")]
pub enum ProjectionConfig {
    /// 方位等距投影
    Aeqd {
        /// 投影中心纬度
        #[serde(default)]
        lat_0: Option<f64>,
        /// 投影中心经度
        #[serde(default)]
        lon_0: Option<f64>,
    },
}

impl ProjectionConfig {
    /// 以网格原点补全投影中心
    pub fn resolve(&self, origin: GridOrigin) -> Projection {
        match *self {
            Self::Aeqd { lat_0, lon_0 } => Projection::aeqd(
                lon_0.unwrap_or(origin.longitude),
                lat_0.unwrap_or(origin.latitude),
            ),
        }
    }
}

/// 并行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParallelStrategy {
    /// 串行执行
    Sequential,
    /// 按射线分区并行，分区缓冲按固定顺序合并
    Parallel,
    /// 根据库点数自动选择
    #[default]
    Auto,
}

/// 并行配置
///
/// 分区只由 `rays_per_partition` 决定，与线程数无关，
/// 因此串行与并行的结果逐位一致。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// 并行策略
    #[serde(default)]
    pub strategy: ParallelStrategy,

    /// 每个分区的射线数
    #[serde(default = "default_rays_per_partition")]
    pub rays_per_partition: usize,

    /// Auto 模式下启用并行的最小库点数
    #[serde(default = "default_min_parallel_gates")]
    pub min_parallel_gates: usize,
}

fn default_rays_per_partition() -> usize { 90 }
fn default_min_parallel_gates() -> usize { 50_000 }

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            strategy: ParallelStrategy::default(),
            rays_per_partition: default_rays_per_partition(),
            min_parallel_gates: default_min_parallel_gates(),
        }
    }
}

impl ParallelConfig {
    /// 给定库点总数时是否并行
    pub fn use_parallel(&self, n_gates: usize) -> bool {
        match self.strategy {
            ParallelStrategy::Sequential => false,
            ParallelStrategy::Parallel => true,
            ParallelStrategy::Auto => n_gates >= self.min_parallel_gates,
        }
    }
}

/// 解析后的映射参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMapping {
    /// 权重函数
    pub weighting: WeightingFunction,
    /// 影响半径模式
    pub roi: RoiMode,
}

impl GridConfig {
    /// 创建网格配置
    pub fn new(shape: [usize; 3], limits: [[f64; 2]; 3]) -> Self {
        Self {
            shape,
            limits,
            origin: None,
            origin_alt: None,
            projection: None,
        }
    }

    /// 设置网格原点
    pub fn with_origin(mut self, latitude: f64, longitude: f64) -> Self {
        self.origin = Some(GridOrigin { latitude, longitude });
        self
    }

    /// 设置原点海拔
    pub fn with_origin_alt(mut self, altitude: f64) -> Self {
        self.origin_alt = Some(altitude);
        self
    }

    /// 设置投影
    pub fn with_projection(mut self, projection: ProjectionConfig) -> Self {
        self.projection = Some(projection);
        self
    }

    /// 验证网格定义
    pub fn validate(&self) -> Result<(), ConfigError> {
        const AXES: [&str; 3] = ["z", "y", "x"];
        for (axis, (&n, limits)) in AXES.iter().zip(self.shape.iter().zip(&self.limits)) {
            if n == 0 {
                return Err(ConfigError::invalid_value(
                    format!("grid.shape.{axis}"),
                    n,
                    "网格点数必须 >= 1",
                ));
            }
            let [start, stop] = *limits;
            if !(start.is_finite() && stop.is_finite()) {
                return Err(ConfigError::invalid_value(
                    format!("grid.limits.{axis}"),
                    format!("[{start}, {stop}]"),
                    "范围必须为有限值",
                ));
            }
            if n > 1 && stop < start {
                return Err(ConfigError::invalid_value(
                    format!("grid.limits.{axis}"),
                    format!("[{start}, {stop}]"),
                    "上界不能小于下界",
                ));
            }
        }
        if let Some(origin) = self.origin {
            if !(-90.0..=90.0).contains(&origin.latitude) || !origin.longitude.is_finite() {
                return Err(ConfigError::invalid_value(
                    "grid.origin",
                    format!("({}, {})", origin.latitude, origin.longitude),
                    "纬度必须在 [-90, 90] 内",
                ));
            }
        }
        if let Some(alt) = self.origin_alt {
            if !alt.is_finite() {
                return Err(ConfigError::invalid_value("grid.origin_alt", alt, "必须为有限值"));
            }
        }
        Ok(())
    }
}

impl MappingConfig {
    /// 使用默认参数创建配置
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            fields: None,
            weighting_function: default_weighting_function(),
            roi_func: default_roi_func(),
            constant_roi: default_constant_roi(),
            z_factor: default_z_factor(),
            xy_factor: default_xy_factor(),
            min_radius: default_min_radius(),
            h_factor: default_h_factor(),
            nb: default_nb(),
            bsp: default_bsp(),
            toa: default_toa(),
            map_roi: default_map_roi(),
            parallel: ParallelConfig::default(),
        }
    }

    /// 设置权重函数
    pub fn with_weighting(mut self, name: impl Into<String>) -> Self {
        self.weighting_function = name.into();
        self
    }

    /// 使用常数影响半径
    pub fn with_constant_roi(mut self, radius: f64) -> Self {
        self.roi_func = RoiFunctionKind::Constant.name().to_string();
        self.constant_roi = radius;
        self
    }

    /// 设置影响半径函数名称
    pub fn with_roi_func(mut self, name: impl Into<String>) -> Self {
        self.roi_func = name.into();
        self
    }

    /// 设置场列表
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// 设置大气层顶高度
    pub fn with_toa(mut self, toa: f64) -> Self {
        self.toa = toa;
        self
    }

    /// 设置并行策略
    pub fn with_parallel(mut self, strategy: ParallelStrategy) -> Self {
        self.parallel.strategy = strategy;
        self
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: MappingConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 解析权重函数与影响半径模式
    pub fn resolve(&self) -> Result<ResolvedMapping, ConfigError> {
        let weighting: WeightingFunction = self.weighting_function.parse()?;

        let roi = match self.roi_func.parse::<RoiFunctionKind>()? {
            RoiFunctionKind::Constant => RoiMode::Constant {
                radius: self.constant_roi,
            },
            RoiFunctionKind::Dist => RoiMode::Dist {
                z_factor: self.z_factor,
                xy_factor: self.xy_factor,
                min_radius: self.min_radius,
            },
            RoiFunctionKind::DistBeam => RoiMode::DistBeam {
                h_factor: self.h_factor,
                nb: self.nb,
                bsp: self.bsp,
                min_radius: self.min_radius,
            },
            RoiFunctionKind::MaxSpace => RoiMode::MaxSpace,
        };
        roi.validate()?;

        Ok(ResolvedMapping { weighting, roi })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.resolve()?;

        if !self.toa.is_finite() {
            return Err(ConfigError::invalid_value("toa", self.toa, "必须为有限值"));
        }
        if self.parallel.rays_per_partition == 0 {
            return Err(ConfigError::invalid_value(
                "parallel.rays_per_partition",
                0,
                "分区射线数必须 >= 1",
            ));
        }
        if let Some(fields) = &self.fields {
            if fields.is_empty() {
                return Err(ConfigError::invalid_value("fields", "[]", "场列表不能为空"));
            }
        }
        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}
