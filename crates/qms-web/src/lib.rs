//! # QMS Web服务模块
//!
//! 提供诊所排队系统的HTTP API、登录会话与WebSocket实时推送。

pub mod auth;
pub mod error;
pub mod handlers;
pub mod queue;
pub mod realtime;
pub mod server;
pub mod state;

pub use auth::{AuthService, Claims, SessionRole};
pub use error::{ApiError, ApiResult};
pub use server::WebServer;
pub use state::AppState;
