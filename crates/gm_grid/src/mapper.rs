// crates/gm_grid/src/mapper.rs

//! 库点到网格的映射
//!
//! # 流程
//!
//! 1. 校验配置与输入，解析权重函数和影响半径模式
//! 2. 确定网格原点、原点海拔和投影
//! 3. 计算各雷达位置与库点位置（相对网格原点）
//! 4. 按规范顺序（雷达名称，其次输入序号）逐部雷达累加
//! 5. 归一化得到各场网格，可选输出影响半径诊断网格
//!
//! 单部雷达且未给出原点、原点海拔和投影时跳过地理转换，
//! 直接使用库点相对雷达的笛卡尔坐标。

use std::time::Instant;

use glam::DVec3;
use rayon::prelude::*;

use gm_config::{ConfigError, GridOrigin, MappingConfig, RoiMode, WeightingFunction};
use gm_foundation::error::{GmError, GmResult};
use gm_geo::{MapProjection, Projection};

use crate::accumulator::{AccumulateContext, AccumulateStats, GateBatch, GridAccumulator};
use crate::fields::{determine_fields, FieldBuffer};
use crate::finalize::{compute_roi_grid, finalize_fields};
use crate::grid::GridGeometry;
use crate::output::{GridOutput, MappingWarning, OriginInfo};
use crate::roi::{azimuthal_spacing, max_azimuthal_spacing, RoiFunction};
use crate::sensor::{ExclusionMask, SensorScan};
use crate::weighting::WeightingKernel;

/// 库点映射器
///
/// 持有已校验的配置，可对多组输入重复调用 [`map`](Self::map)。
pub struct GateMapper {
    config: MappingConfig,
    projector: Option<Box<dyn MapProjection>>,
}

impl GateMapper {
    /// 创建映射器（校验配置）
    pub fn new(config: MappingConfig) -> GmResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            projector: None,
        })
    }

    /// 使用自定义投影代替配置中的投影
    pub fn with_projector<P: MapProjection + 'static>(mut self, projector: P) -> Self {
        self.projector = Some(Box::new(projector));
        self
    }

    /// 当前配置
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// 执行映射
    ///
    /// # 参数
    /// - `sensors`: 雷达扫描，至少一部
    /// - `filters`: 排除掩码，给出时数量必须与雷达数一致
    pub fn map(
        &self,
        sensors: &[SensorScan],
        filters: Option<&[ExclusionMask]>,
    ) -> GmResult<GridOutput> {
        let start = Instant::now();
        if sensors.is_empty() {
            return Err(GmError::invalid_input("至少需要一部雷达"));
        }

        let resolved = self.config.resolve()?;
        for sensor in sensors {
            sensor.validate()?;
        }
        let filters = resolve_filters(filters, sensors)?;

        let mut warnings = Vec::new();
        if resolved.weighting.is_deprecated() {
            log::warn!("Barnes 权重函数已弃用，请使用与 Pauley & Wu (1990) 一致的 Barnes2");
            warnings.push(MappingWarning::DeprecatedWeighting {
                function: resolved.weighting.name().to_string(),
                replacement: WeightingFunction::Barnes2.name().to_string(),
            });
        }

        // 网格原点与投影
        let grid = &self.config.grid;
        let skip_transform = sensors.len() == 1
            && grid.origin.is_none()
            && grid.origin_alt.is_none()
            && grid.projection.is_none()
            && self.projector.is_none();

        let first = &sensors[0];
        let origin = grid.origin.unwrap_or_else(|| GridOrigin {
            latitude: first.location.mean_latitude(),
            longitude: first.location.mean_longitude(),
        });
        let origin_alt = grid
            .origin_alt
            .unwrap_or_else(|| first.location.mean_altitude());
        let projection = grid
            .projection
            .map(|p| p.resolve(origin))
            .unwrap_or_else(|| Projection::aeqd(origin.longitude, origin.latitude));
        let projector: &dyn MapProjection = match &self.projector {
            Some(p) => p.as_ref(),
            None => &projection,
        };

        let fields = determine_fields(self.config.fields.as_deref(), sensors);
        if fields.is_empty() {
            log::warn!("雷达之间没有共有的场，输出将不含任何场");
        }
        let geometry = GridGeometry::from_config(grid)?;

        // 雷达与库点位置（相对网格原点）
        let offsets = sensors
            .iter()
            .map(|s| sensor_offset(s, projector, skip_transform, origin_alt))
            .collect::<GmResult<Vec<_>>>()?;
        let positions = sensors
            .par_iter()
            .map(|s| gate_positions(s, projector, skip_transform, origin_alt))
            .collect::<GmResult<Vec<_>>>()?;

        // 影响半径
        let max_az_spacing = match resolved.roi {
            RoiMode::MaxSpace => {
                let mut per_sensor = Vec::with_capacity(sensors.len());
                for (s, p) in sensors.iter().zip(&positions) {
                    per_sensor.push(azimuthal_spacing(p, s.nrays(), s.ngates()));
                }
                Some(max_azimuthal_spacing(&per_sensor)?)
            }
            _ => None,
        };
        let roi = RoiFunction::from_mode(resolved.roi, offsets, max_az_spacing)?;
        let corners = geometry.corners();
        let box_bounds: Vec<f64> = (0..sensors.len())
            .map(|s| roi.box_bound(&corners, s))
            .collect();

        let ctx = AccumulateContext {
            geometry: &geometry,
            roi: &roi,
            kernel: WeightingKernel::new(resolved.weighting),
            toa: self.config.toa,
        };
        let mut total = GridAccumulator::new(geometry.n_cells(), fields.len());
        let mut stats = AccumulateStats::default();

        for s in canonical_order(sensors) {
            let sensor = &sensors[s];
            let buffer = FieldBuffer::extract(sensor, &fields, &mut warnings);
            let batch = GateBatch {
                sensor: s,
                nrays: sensor.nrays(),
                ngates: sensor.ngates(),
                positions: &positions[s],
                fields: &buffer,
                excluded: filters[s],
                box_max: box_bounds[s],
            };
            let st = ctx.accumulate_sensor(&batch, &self.config.parallel, &mut total);
            log::debug!(
                "雷达 {}: 映射 {} 个库点, 排除 {}, 高于层顶 {}, 无效 {}",
                sensor.name,
                st.gates_mapped,
                st.gates_excluded,
                st.gates_above_toa,
                st.gates_masked
            );
            stats.merge(&st);
        }

        let shape = geometry.shape();
        let gridded = finalize_fields(&total, &fields, shape);
        let roi_grid = self.config.map_roi.then(|| compute_roi_grid(&geometry, &roi));

        log::info!(
            "映射完成: {} 部雷达, {} 个场, 网格 {:?}, {} 个库点参与, 用时 {:.3}s",
            sensors.len(),
            fields.len(),
            shape,
            stats.gates_mapped,
            start.elapsed().as_secs_f64()
        );

        Ok(GridOutput {
            geometry,
            origin: OriginInfo {
                latitude: origin.latitude,
                longitude: origin.longitude,
                altitude: origin_alt,
            },
            projection: (!skip_transform && self.projector.is_none()).then_some(projection),
            fields: gridded,
            roi: roi_grid,
            warnings,
        })
    }
}

/// 将库点映射到网格
///
/// 等价于 `GateMapper::new(config.clone())?.map(sensors, filters)`。
pub fn map_gates_to_grid(
    sensors: &[SensorScan],
    filters: Option<&[ExclusionMask]>,
    config: &MappingConfig,
) -> GmResult<GridOutput> {
    GateMapper::new(config.clone())?.map(sensors, filters)
}

/// 雷达处理顺序：按名称，名称相同按输入序号
fn canonical_order(sensors: &[SensorScan]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sensors.len()).collect();
    order.sort_by(|&a, &b| sensors[a].name.cmp(&sensors[b].name).then(a.cmp(&b)));
    order
}

fn resolve_filters<'a>(
    filters: Option<&'a [ExclusionMask]>,
    sensors: &[SensorScan],
) -> GmResult<Vec<Option<&'a ExclusionMask>>> {
    let Some(filters) = filters else {
        return Ok(vec![None; sensors.len()]);
    };
    if filters.len() != sensors.len() {
        return Err(ConfigError::CountMismatch {
            what: "排除掩码",
            expected: sensors.len(),
            actual: filters.len(),
        }
        .into());
    }
    for (mask, sensor) in filters.iter().zip(sensors) {
        mask.check_shape(sensor)?;
    }
    Ok(filters.iter().map(Some).collect())
}

/// 雷达平均位置相对网格原点的坐标
fn sensor_offset(
    sensor: &SensorScan,
    projector: &dyn MapProjection,
    skip_transform: bool,
    origin_alt: f64,
) -> GmResult<DVec3> {
    let z = sensor.location.mean_altitude() - origin_alt;
    if skip_transform {
        return Ok(DVec3::new(0.0, 0.0, z));
    }
    let (x, y) = projector.forward(
        sensor.location.mean_longitude(),
        sensor.location.mean_latitude(),
    )?;
    Ok(DVec3::new(x, y, z))
}

/// 库点相对网格原点的坐标
fn gate_positions(
    sensor: &SensorScan,
    projector: &dyn MapProjection,
    skip_transform: bool,
    origin_alt: f64,
) -> GmResult<Vec<DVec3>> {
    if skip_transform {
        let alt_0 = sensor.location.mean_altitude();
        let cart = sensor.gate_cartesian()?;
        return Ok(cart
            .iter()
            .map(|p| DVec3::new(p.x, p.y, alt_0 + p.z - origin_alt))
            .collect());
    }

    let geo = sensor.gate_geographic()?;
    let (xs, ys) = projector.forward_batch(&geo.longitude, &geo.latitude)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(&geo.altitude)
        .map(|((x, y), &alt)| DVec3::new(x, y, alt - origin_alt))
        .collect())
}
