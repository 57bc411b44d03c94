//! # QMS实时推送模块
//!
//! 把持久层的行级变更扇出给所有在线页面：
//! - 行变更事件的类型化建模与分发
//! - 按诊所等值谓词过滤的订阅流
//! - 显示屏消费端（本地读模型 + 语音播报触发）

pub mod display;
pub mod events;
pub mod hub;

pub use display::{BoardNotification, DisplayConsumer};
pub use events::{ChangeEvent, ChangeOp, TableKind};
pub use hub::{EventStream, RealtimeHub};
