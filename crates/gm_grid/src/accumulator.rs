// crates/gm_grid/src/accumulator.rs

//! 网格累加器
//!
//! 每个库点把加权值累加到影响半径内的单元上。
//!
//! # 设计
//!
//! - `GridAccumulator` - 单个分区私有的 sum/wsum 缓冲，记录被写过的单元
//! - `AccumulateContext` - 映射期间只读的几何、影响半径和权重核
//!
//! 每部雷达按固定射线数切分为若干分区，分区只取决于输入，
//! 与线程数无关。各分区累加到私有缓冲后按分区顺序合并，
//! 因此串行与并行的浮点加法顺序完全一致。
//!
//! 并行时分区按批处理，每批最多 `rayon::current_num_threads()` 个分区，
//! 缓冲在批之间复用，峰值内存为 (批大小 × 网格)。
//! 合并和重置只遍历被写过的单元，开销与贡献数成正比而非网格大小。

use std::ops::Range;

use glam::DVec3;
use rayon::prelude::*;

use gm_config::ParallelConfig;

use crate::fields::FieldBuffer;
use crate::grid::GridGeometry;
use crate::roi::RoiFunction;
use crate::sensor::ExclusionMask;
use crate::weighting::WeightingKernel;

// ============================================================
// 累加缓冲
// ============================================================

/// 加权和缓冲
///
/// 布局为 `[cell * nfields + field]`。
#[derive(Debug, Clone, PartialEq)]
pub struct GridAccumulator {
    n_cells: usize,
    nfields: usize,
    sum: Vec<f64>,
    wsum: Vec<f64>,
    /// 被写过的单元，按首次写入顺序
    touched: Vec<usize>,
    marked: Vec<bool>,
}

impl GridAccumulator {
    /// 创建全零缓冲
    pub fn new(n_cells: usize, nfields: usize) -> Self {
        Self {
            n_cells,
            nfields,
            sum: vec![0.0; n_cells * nfields],
            wsum: vec![0.0; n_cells * nfields],
            touched: Vec::new(),
            marked: vec![false; n_cells],
        }
    }

    /// 重置为零（只清理被写过的单元）
    pub fn reset(&mut self) {
        for &cell in &self.touched {
            let base = cell * self.nfields;
            self.sum[base..base + self.nfields].fill(0.0);
            self.wsum[base..base + self.nfields].fill(0.0);
            self.marked[cell] = false;
        }
        self.touched.clear();
    }

    /// 单元数量
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 场数量
    pub fn nfields(&self) -> usize {
        self.nfields
    }

    /// 加权值之和
    pub fn sum(&self) -> &[f64] {
        &self.sum
    }

    /// 权重之和
    pub fn wsum(&self) -> &[f64] {
        &self.wsum
    }

    /// 被写过的单元数
    pub fn n_touched(&self) -> usize {
        self.touched.len()
    }

    /// 合并另一个缓冲
    ///
    /// 只把 `other` 中被写过的单元逐元素加到本缓冲。
    pub fn merge(&mut self, other: &GridAccumulator) {
        debug_assert_eq!(self.sum.len(), other.sum.len());
        let nf = self.nfields;
        for &cell in &other.touched {
            let base = cell * nf;
            for f in base..base + nf {
                self.sum[f] += other.sum[f];
                self.wsum[f] += other.wsum[f];
            }
            self.mark(cell);
        }
    }

    #[inline]
    fn mark(&mut self, cell: usize) {
        if !self.marked[cell] {
            self.marked[cell] = true;
            self.touched.push(cell);
        }
    }

    /// 向单元累加一个库点
    #[inline]
    fn add(&mut self, cell: usize, weight: f64, values: &[f64], valid: &[bool]) {
        let base = cell * self.nfields;
        for (f, (&v, &ok)) in values.iter().zip(valid).enumerate() {
            if ok {
                self.sum[base + f] += weight * v;
                self.wsum[base + f] += weight;
            }
        }
        self.mark(cell);
    }
}

// ============================================================
// 统计
// ============================================================

/// 累加统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulateStats {
    /// 参与映射的库点数
    pub gates_mapped: usize,
    /// 被排除掩码过滤的库点数
    pub gates_excluded: usize,
    /// 高于大气层顶的库点数
    pub gates_above_toa: usize,
    /// 所有场均无效（或位置非有限）的库点数
    pub gates_masked: usize,
    /// 累加的 (库点, 单元) 对数
    pub contributions: usize,
}

impl AccumulateStats {
    /// 合并统计
    pub fn merge(&mut self, other: &AccumulateStats) {
        self.gates_mapped += other.gates_mapped;
        self.gates_excluded += other.gates_excluded;
        self.gates_above_toa += other.gates_above_toa;
        self.gates_masked += other.gates_masked;
        self.contributions += other.contributions;
    }
}

// ============================================================
// 单部雷达的库点
// ============================================================

/// 单部雷达准备好的库点数据
#[derive(Debug, Clone, Copy)]
pub struct GateBatch<'a> {
    /// 雷达在输入中的序号（影响半径的偏移量按此索引）
    pub sensor: usize,
    /// 射线数
    pub nrays: usize,
    /// 每条射线的库数
    pub ngates: usize,
    /// 库点相对网格原点的位置 (x, y, z)，行优先 (射线, 库)
    pub positions: &'a [DVec3],
    /// 场数据
    pub fields: &'a FieldBuffer,
    /// 排除掩码
    pub excluded: Option<&'a ExclusionMask>,
    /// 该雷达在网格包围盒上的最大影响半径
    pub box_max: f64,
}

// ============================================================
// 累加上下文
// ============================================================

/// 映射期间只读的累加参数
#[derive(Debug, Clone, Copy)]
pub struct AccumulateContext<'a> {
    /// 网格几何
    pub geometry: &'a GridGeometry,
    /// 影响半径
    pub roi: &'a RoiFunction,
    /// 权重核
    pub kernel: WeightingKernel,
    /// 大气层顶（相对原点海拔）[m]
    pub toa: f64,
}

impl<'a> AccumulateContext<'a> {
    /// 将一部雷达的所有库点累加到 `total`
    ///
    /// 射线按 `rays_per_partition` 分区，各分区缓冲按分区顺序合并。
    /// 并行时每批最多 `rayon::current_num_threads()` 个分区。
    pub fn accumulate_sensor(
        &self,
        batch: &GateBatch<'_>,
        parallel: &ParallelConfig,
        total: &mut GridAccumulator,
    ) -> AccumulateStats {
        let partitions = ray_partitions(batch.nrays, parallel.rays_per_partition);
        let batch_size = if parallel.use_parallel(batch.nrays * batch.ngates) {
            rayon::current_num_threads()
        } else {
            1
        };
        self.accumulate_partitions(batch, &partitions, batch_size, total)
    }

    /// 分批累加分区
    ///
    /// 每批内的分区并行累加到各自的缓冲，再按分区顺序合并到 `total`，
    /// 然后开始下一批。结果与 `batch_size` 无关。
    fn accumulate_partitions(
        &self,
        batch: &GateBatch<'_>,
        partitions: &[Range<usize>],
        batch_size: usize,
        total: &mut GridAccumulator,
    ) -> AccumulateStats {
        let mut stats = AccumulateStats::default();
        let width = batch_size.clamp(1, partitions.len().max(1));
        let mut buffers: Vec<GridAccumulator> = (0..width)
            .map(|_| GridAccumulator::new(total.n_cells(), total.nfields()))
            .collect();

        for chunk in partitions.chunks(width) {
            let chunk_stats: Vec<AccumulateStats> = if chunk.len() > 1 {
                buffers[..chunk.len()]
                    .par_iter_mut()
                    .zip(chunk.par_iter())
                    .map(|(acc, rays)| {
                        acc.reset();
                        self.accumulate_rays(batch, rays.clone(), acc)
                    })
                    .collect()
            } else {
                buffers[..chunk.len()]
                    .iter_mut()
                    .zip(chunk)
                    .map(|(acc, rays)| {
                        acc.reset();
                        self.accumulate_rays(batch, rays.clone(), acc)
                    })
                    .collect()
            };
            for (acc, st) in buffers.iter().zip(&chunk_stats) {
                total.merge(acc);
                stats.merge(st);
            }
        }
        stats
    }

    /// 将指定射线范围内的库点累加到 `acc`
    pub fn accumulate_rays(
        &self,
        batch: &GateBatch<'_>,
        rays: Range<usize>,
        acc: &mut GridAccumulator,
    ) -> AccumulateStats {
        let mut stats = AccumulateStats::default();
        for ray in rays {
            for gate in 0..batch.ngates {
                let idx = ray * batch.ngates + gate;
                if batch.excluded.is_some_and(|m| m.is_excluded(idx)) {
                    stats.gates_excluded += 1;
                    continue;
                }
                let p = batch.positions[idx];
                if !p.is_finite() {
                    stats.gates_masked += 1;
                    continue;
                }
                if p.z > self.toa {
                    stats.gates_above_toa += 1;
                    continue;
                }
                let valid = batch.fields.gate_valid(idx);
                if !valid.iter().any(|&v| v) {
                    stats.gates_masked += 1;
                    continue;
                }
                stats.gates_mapped += 1;
                stats.contributions += self.accumulate_gate(
                    p,
                    batch.fields.gate_values(idx),
                    valid,
                    batch.sensor,
                    batch.box_max,
                    acc,
                );
            }
        }
        stats
    }

    /// 累加单个库点，返回受影响的单元数
    #[inline]
    fn accumulate_gate(
        &self,
        p: DVec3,
        values: &[f64],
        valid: &[bool],
        sensor: usize,
        box_max: f64,
        acc: &mut GridAccumulator,
    ) -> usize {
        let bound = self.roi.search_radius(p, sensor, box_max);
        let g = self.geometry;
        let (Some((k0, k1)), Some((j0, j1)), Some((i0, i1))) = (
            g.z.index_range(p.z, bound),
            g.y.index_range(p.y, bound),
            g.x.index_range(p.x, bound),
        ) else {
            return 0;
        };

        let b2 = bound * bound;
        let mut touched = 0;
        for k in k0..=k1 {
            let dz = g.z.coord(k) - p.z;
            let dz2 = dz * dz;
            if dz2 > b2 {
                continue;
            }
            for j in j0..=j1 {
                let dy = g.y.coord(j) - p.y;
                let dzy2 = dz2 + dy * dy;
                if dzy2 > b2 {
                    continue;
                }
                for i in i0..=i1 {
                    let dx = g.x.coord(i) - p.x;
                    let d2 = dzy2 + dx * dx;
                    if d2 > b2 {
                        continue;
                    }
                    let r = self.roi.radius_for_sensor(g.cell_center(k, j, i), sensor);
                    let r2 = r * r;
                    if d2 > r2 {
                        continue;
                    }
                    let w = self.kernel.weight_sq(d2, r2);
                    acc.add(g.linear_index(k, j, i), w, values, valid);
                    touched += 1;
                }
            }
        }
        touched
    }
}

/// 按固定射线数切分射线
fn ray_partitions(nrays: usize, rays_per_partition: usize) -> Vec<Range<usize>> {
    let step = rays_per_partition.max(1);
    (0..nrays)
        .step_by(step)
        .map(|start| start..(start + step).min(nrays))
        .collect()
}
