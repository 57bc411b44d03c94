//! # QMS数据库模块
//!
//! 负责排队与门诊运营数据的存储，提供PostgreSQL连接池、
//! 完整的CRUD操作和队列存储接口的数据库实现。

pub mod connection;
pub mod models;
pub mod queries;
pub mod queue_store;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use models::*;
pub use queries::DatabaseQueries;
pub use queue_store::PgQueueStore;
