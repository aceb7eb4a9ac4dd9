// crates/gm_grid/src/weighting.rs

//! 权重核
//!
//! 只在 d ≤ R 时求值。两个高斯核加上 1e-5 的下限，
//! 远端库点的权重不会下溢为 0。

use gm_config::WeightingFunction;

/// 高斯核的权重下限
pub const GAUSSIAN_WEIGHT_FLOOR: f64 = 1e-5;

/// 已解析的权重核
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightingKernel {
    function: WeightingFunction,
}

impl WeightingKernel {
    /// 创建权重核
    pub fn new(function: WeightingFunction) -> Self {
        Self { function }
    }

    /// 对应的权重函数
    #[inline]
    pub fn function(&self) -> WeightingFunction {
        self.function
    }

    /// 由距离平方和半径平方计算权重
    ///
    /// 调用方保证 `d2 <= r2`。
    #[inline]
    pub fn weight_sq(&self, d2: f64, r2: f64) -> f64 {
        match self.function {
            WeightingFunction::Nearest => 1.0,
            WeightingFunction::Cressman => (r2 - d2) / (r2 + d2),
            WeightingFunction::Barnes => (-d2 / (2.0 * r2)).exp() + GAUSSIAN_WEIGHT_FLOOR,
            WeightingFunction::Barnes2 => (-d2 / (r2 / 4.0)).exp() + GAUSSIAN_WEIGHT_FLOOR,
        }
    }

    /// 距离 d 处、半径 r 时的权重，d > r 时为 0
    pub fn weight(&self, d: f64, r: f64) -> f64 {
        if d > r {
            return 0.0;
        }
        self.weight_sq(d * d, r * r)
    }
}

impl From<WeightingFunction> for WeightingKernel {
    fn from(function: WeightingFunction) -> Self {
        Self::new(function)
    }
}
