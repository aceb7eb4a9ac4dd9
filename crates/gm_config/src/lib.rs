// crates/gm_config/src/lib.rs

//! GateMap Config Layer
//!
//! 配置层，提供映射参数、名称解析和校验。
//!
//! # 模块概览
//!
//! - [`mapping_config`]: MappingConfig 映射配置（全 f64，JSON 序列化）
//! - [`weighting`]: WeightingFunction 权重函数标签
//! - [`roi`]: RoiFunctionKind / RoiMode 影响半径模式
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! gm_grid       ─> uses MappingConfig, ResolvedMapping
//! gm_config     ─> MappingConfig, WeightingFunction, RoiMode (本层)
//! gm_geo        ─> Projection
//! gm_foundation ─> GmError
//! ```
//!
//! # 设计原则
//!
//! 1. **一次解析**: 字符串名称在 `resolve` 中转换为带标签的枚举
//! 2. **全 f64 配置**: 所有数值使用 f64
//! 3. **显式错误**: 未知名称、非法参数一律返回 `ConfigError`，从不静默回退

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mapping_config;
pub mod roi;
pub mod weighting;

// 重导出核心类型
pub use error::ConfigError;
pub use mapping_config::{
    GridConfig, GridOrigin, MappingConfig, ParallelConfig, ParallelStrategy, ProjectionConfig,
    ResolvedMapping,
};
pub use roi::{RoiFunctionKind, RoiMode};
pub use weighting::WeightingFunction;
