// crates/gm_foundation/src/lib.rs

//! GateMap Foundation Layer
//!
//! 基础层，提供整个工作区共享的错误类型。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `GmError` 与 `GmResult`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

// 重导出常用类型
pub use error::{GmError, GmResult};
