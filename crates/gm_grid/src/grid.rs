// crates/gm_grid/src/grid.rs

//! 规则三维笛卡尔网格几何
//!
//! 网格由点数 (nz, ny, nx)、起点和步长描述，单元中心
//! `center(k, j, i) = start + (k·dz, j·dy, i·dx)`。
//! 单点轴的步长为 0，该轴上只有固定坐标参与距离计算。
//!
//! 数据按 z 优先的行优先顺序展平：`idx = (k·ny + j)·nx + i`。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use gm_config::GridConfig;
use gm_foundation::error::GmResult;

/// 索引范围计算的相对容差
const INDEX_TOLERANCE: f64 = 1e-9;

/// 单个坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// 起点坐标 [m]
    pub start: f64,
    /// 步长 [m]
    pub step: f64,
    /// 点数
    pub len: usize,
}

impl Axis {
    /// 由范围创建坐标轴
    pub fn from_limits(len: usize, start: f64, stop: f64) -> Self {
        let step = if len > 1 {
            (stop - start) / (len - 1) as f64
        } else {
            0.0
        };
        Self { start, step, len }
    }

    /// 第 i 个点的坐标
    #[inline]
    pub fn coord(&self, i: usize) -> f64 {
        self.start + i as f64 * self.step
    }

    /// 所有点坐标
    pub fn coords(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.coord(i)).collect()
    }

    /// 最后一个点的坐标
    #[inline]
    pub fn end(&self) -> f64 {
        self.coord(self.len - 1)
    }

    /// 与 `[c - r, c + r]` 相交的索引闭区间
    ///
    /// 结果只是候选范围，最终是否覆盖由三维距离判断。
    /// 步长为 0 的轴（单点或退化范围）按固定坐标判断。
    pub fn index_range(&self, c: f64, r: f64) -> Option<(usize, usize)> {
        if self.step == 0.0 {
            return if (c - self.start).abs() <= r * (1.0 + INDEX_TOLERANCE) {
                Some((0, self.len - 1))
            } else {
                None
            };
        }

        let lo = ((c - r - self.start) / self.step - INDEX_TOLERANCE).ceil();
        let hi = ((c + r - self.start) / self.step + INDEX_TOLERANCE).floor();
        let last = (self.len - 1) as f64;
        if !(lo <= hi) || hi < 0.0 || lo > last {
            return None;
        }
        Some((lo.max(0.0) as usize, hi.min(last) as usize))
    }
}

/// 网格几何（映射期间不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// z 轴
    pub z: Axis,
    /// y 轴
    pub y: Axis,
    /// x 轴
    pub x: Axis,
}

impl GridGeometry {
    /// 由点数和范围创建
    ///
    /// # 参数
    /// - `shape`: (nz, ny, nx)
    /// - `limits`: [[z_min, z_max], [y_min, y_max], [x_min, x_max]]
    pub fn new(shape: [usize; 3], limits: [[f64; 2]; 3]) -> GmResult<Self> {
        GridConfig::new(shape, limits).validate()?;
        Ok(Self::from_validated(shape, limits))
    }

    /// 由网格配置创建
    pub fn from_config(config: &GridConfig) -> GmResult<Self> {
        config.validate()?;
        Ok(Self::from_validated(config.shape, config.limits))
    }

    fn from_validated(shape: [usize; 3], limits: [[f64; 2]; 3]) -> Self {
        let [nz, ny, nx] = shape;
        Self {
            z: Axis::from_limits(nz, limits[0][0], limits[0][1]),
            y: Axis::from_limits(ny, limits[1][0], limits[1][1]),
            x: Axis::from_limits(nx, limits[2][0], limits[2][1]),
        }
    }

    /// 网格形状 (nz, ny, nx)
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        [self.z.len, self.y.len, self.x.len]
    }

    /// 单元总数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.z.len * self.y.len * self.x.len
    }

    /// 起点 (x, y, z)
    #[inline]
    pub fn origin(&self) -> DVec3 {
        DVec3::new(self.x.start, self.y.start, self.z.start)
    }

    /// 步长 (dx, dy, dz)
    #[inline]
    pub fn step(&self) -> DVec3 {
        DVec3::new(self.x.step, self.y.step, self.z.step)
    }

    /// 展平索引
    #[inline]
    pub fn linear_index(&self, k: usize, j: usize, i: usize) -> usize {
        (k * self.y.len + j) * self.x.len + i
    }

    /// 展平索引 -> (k, j, i)
    #[inline]
    pub fn unravel(&self, idx: usize) -> (usize, usize, usize) {
        let i = idx % self.x.len;
        let j = (idx / self.x.len) % self.y.len;
        let k = idx / (self.x.len * self.y.len);
        (k, j, i)
    }

    /// 单元中心坐标
    #[inline]
    pub fn cell_center(&self, k: usize, j: usize, i: usize) -> DVec3 {
        DVec3::new(self.x.coord(i), self.y.coord(j), self.z.coord(k))
    }

    /// 网格包围盒的 8 个角点
    pub fn corners(&self) -> [DVec3; 8] {
        let xs = [self.x.start, self.x.end()];
        let ys = [self.y.start, self.y.end()];
        let zs = [self.z.start, self.z.end()];
        let mut out = [DVec3::ZERO; 8];
        for (n, c) in out.iter_mut().enumerate() {
            *c = DVec3::new(xs[n & 1], ys[(n >> 1) & 1], zs[(n >> 2) & 1]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry::new([3, 5, 11], [[0.0, 2000.0], [-2000.0, 2000.0], [-5000.0, 5000.0]]).unwrap()
    }

    #[test]
    fn test_steps_and_centers() {
        let g = geometry();
        assert_eq!(g.shape(), [3, 5, 11]);
        assert_eq!(g.n_cells(), 165);
        assert!((g.z.step - 1000.0).abs() < 1e-12);
        assert!((g.y.step - 1000.0).abs() < 1e-12);
        assert!((g.x.step - 1000.0).abs() < 1e-12);

        let c = g.cell_center(1, 2, 5);
        assert_eq!(c, DVec3::new(0.0, 0.0, 1000.0));
    }

    #[test]
    fn test_single_cell_axis_has_zero_step() {
        let g = GridGeometry::new([1, 1, 4], [[500.0, 500.0], [0.0, 0.0], [0.0, 300.0]]).unwrap();
        assert_eq!(g.z.step, 0.0);
        assert_eq!(g.y.step, 0.0);
        assert_eq!(g.cell_center(0, 0, 3), DVec3::new(300.0, 0.0, 500.0));
    }

    #[test]
    fn test_axis_coords() {
        let g = geometry();
        assert_eq!(g.z.coords(), vec![0.0, 1000.0, 2000.0]);
        assert_eq!(g.y.coords(), vec![-2000.0, -1000.0, 0.0, 1000.0, 2000.0]);
        let xs = g.x.coords();
        assert_eq!(xs.len(), 11);
        assert_eq!(xs[0], -5000.0);
        assert_eq!(*xs.last().unwrap(), g.x.end());
        assert_eq!(Axis::from_limits(1, 750.0, 750.0).coords(), vec![750.0]);
    }

    #[test]
    fn test_linear_index_roundtrip() {
        let g = geometry();
        let idx = g.linear_index(2, 3, 7);
        assert_eq!(g.unravel(idx), (2, 3, 7));
    }

    #[test]
    fn test_index_range_clipped() {
        let axis = Axis::from_limits(11, -5000.0, 5000.0);
        assert_eq!(axis.index_range(0.0, 1000.0), Some((4, 6)));
        assert_eq!(axis.index_range(-4900.0, 500.0), Some((0, 0)));
        assert_eq!(axis.index_range(5200.0, 1000.0), Some((10, 10)));
        assert_eq!(axis.index_range(-7000.0, 1000.0), None);
        assert_eq!(axis.index_range(0.0, 400.0), Some((5, 5)));
        assert_eq!(axis.index_range(500.0, 400.0), None);
    }

    #[test]
    fn test_index_range_single_point_axis() {
        let axis = Axis::from_limits(1, 1000.0, 1000.0);
        assert_eq!(axis.index_range(1200.0, 500.0), Some((0, 0)));
        assert_eq!(axis.index_range(2000.0, 500.0), None);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = GridGeometry::new([2, 2, 2], [[0.0, 1.0], [1.0, 0.0], [0.0, 1.0]]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_corners() {
        let g = geometry();
        let corners = g.corners();
        assert!(corners.contains(&DVec3::new(-5000.0, -2000.0, 0.0)));
        assert!(corners.contains(&DVec3::new(5000.0, 2000.0, 2000.0)));
    }
}
