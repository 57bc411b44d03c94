//! Web层共享状态

use crate::auth::AuthService;
use qms_database::DatabasePool;
use qms_queue::QueueEngine;
use qms_realtime::RealtimeHub;
use std::sync::Arc;

/// 所有处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub db: DatabasePool,
    pub engine: Arc<QueueEngine>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: DatabasePool, engine: Arc<QueueEngine>, auth: Arc<AuthService>) -> Self {
        Self { db, engine, auth }
    }

    pub fn hub(&self) -> &RealtimeHub {
        self.engine.hub()
    }
}
