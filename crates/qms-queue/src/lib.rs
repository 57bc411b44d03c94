//! # QMS队列引擎模块
//!
//! 叫号业务的核心：
//! - 诊所计数器的原子推进/回退/指定/清零
//! - 紧急呼叫与转诊记录
//! - 叫号记录状态机与存储接口

pub mod engine;
pub mod state_machine;
pub mod store;

pub use engine::QueueEngine;
pub use state_machine::{CallEvent, CallStateMachine};
pub use store::{memory::MemoryQueueStore, NewQueueCall, QueueMutation, QueueStore};
