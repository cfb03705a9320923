//! # mpscan-core
//!
//! mpscan 核心库, 提供各 crate 共用的错误类型.

pub mod error;

// 重导出常用类型
pub use error::{MpError, MpResult};
