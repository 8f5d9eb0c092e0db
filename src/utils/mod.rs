//! 工具模块 - 错误处理和日志

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult, ok};
