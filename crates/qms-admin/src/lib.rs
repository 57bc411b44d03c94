//! # QMS管理模块
//!
//! 提供配置加载、验证与运行期更新等运维功能

pub mod config;

pub use config::{
    AudioConfig, ConfigManager, DatabaseConfig, LoggingConfig, QmsConfig, ServerConfig, WebConfig,
};
