//! # QMS Core
//!
//! 诊所排队叫号系统的核心模块，提供基础数据结构、错误定义和通用工具。

pub mod arabic;
pub mod error;
pub mod models;
pub mod validation;

pub use error::{QmsError, Result};
pub use models::*;
