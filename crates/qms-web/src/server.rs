//! Web服务器

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use qms_core::Result;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{
    admin_login, auth_middleware, clinic_login, doctor_login, get_current_session, screen_login,
};
use crate::handlers;
use crate::queue;
use crate::realtime::ws_handler;
use crate::state::AppState;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let app = Self::create_app(state);
        Self { addr, app }
    }

    fn create_app(state: AppState) -> Router {
        Router::new()
            // 根路径与健康检查
            .route("/", get(handlers::api_root))
            .route("/health", get(handlers::health))

            // 认证路由（无需token）
            .route("/auth/admin/login", post(admin_login))
            .route("/auth/clinic/login", post(clinic_login))
            .route("/auth/screen/login", post(screen_login))
            .route("/auth/doctor/login", post(doctor_login))

            // 实时推送
            .route("/realtime/ws", get(ws_handler))

            // 公开API（门户、显示屏启动时拉取）
            .nest("/api/v1", public_routes())

            // 需要认证的API
            .nest("/api/v1", protected_routes(state.clone()))

            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
            .with_state(state)
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| qms_core::QmsError::Internal(format!("web server failed: {}", e)))?;

        Ok(())
    }
}

/// 无需登录的业务路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/center", get(handlers::get_center))
        .route("/clinics", get(handlers::list_clinics))
        .route("/clinics/:id", get(handlers::get_clinic))
        .route("/clinics/:id/doctors", get(handlers::list_clinic_doctors))
        .route("/clinics/:id/queue", get(queue::snapshot))
        .route("/patients/register", post(handlers::register_patient))
        .route("/patients/lookup", get(handlers::lookup_patient))
        .route("/appointments", post(handlers::create_appointment))
        .route("/appointments/mine", get(handlers::list_my_appointments))
        .route("/consultations", post(handlers::create_consultation))
        .route(
            "/patients/:id/consultations",
            get(handlers::list_patient_consultations),
        )
        .route("/complaints", post(handlers::create_complaint))
}

/// 需要会话令牌的业务路由
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // 会话
        .route("/session", get(get_current_session))

        // 中心配置
        .route("/center", put(handlers::update_center))

        // 显示屏
        .route("/screens", post(handlers::create_screen))
        .route("/screens", get(handlers::list_screens))
        .route("/screens/:id", delete(handlers::delete_screen))

        // 诊所管理
        .route("/clinics", post(handlers::create_clinic))
        .route("/clinics/:id", put(handlers::update_clinic))
        .route("/clinics/:id", delete(handlers::delete_clinic))

        // 队列操作
        .route("/clinics/:id/queue/advance", post(queue::advance))
        .route("/clinics/:id/queue/recede", post(queue::recede))
        .route("/clinics/:id/queue/call", post(queue::call_specific))
        .route("/clinics/:id/queue/reset", post(queue::reset))
        .route("/clinics/:id/queue/toggle", post(queue::toggle_active))
        .route("/clinics/:id/queue/emergency", post(queue::emergency))
        .route("/clinics/:id/queue/transfer", post(queue::transfer))
        .route("/calls/:id/complete", post(queue::complete_call))

        // 医生管理
        .route("/doctors", post(handlers::create_doctor))
        .route("/doctors", get(handlers::list_doctors))
        .route(
            "/doctors/:id/work-status",
            put(handlers::update_doctor_work_status),
        )
        .route("/doctors/:id", delete(handlers::delete_doctor))

        // 患者档案
        .route("/patients/search", get(handlers::search_patients))

        // 预约
        .route("/appointments", get(handlers::list_appointments))
        .route(
            "/appointments/:id/status",
            put(handlers::update_appointment_status),
        )

        // 问诊
        .route("/consultations/open", get(handlers::list_open_consultations))
        .route(
            "/consultations/:id/respond",
            post(handlers::respond_consultation),
        )

        // 投诉
        .route("/complaints", get(handlers::list_complaints))
        .route("/complaints/:id", put(handlers::update_complaint))

        // 请假
        .route("/leave-requests", post(handlers::create_leave_request))
        .route("/leave-requests/mine", get(handlers::list_my_leave_requests))
        .route(
            "/leave-requests/pending",
            get(handlers::list_pending_leave_requests),
        )
        .route(
            "/leave-requests/:id/review",
            post(handlers::review_leave_request),
        )

        // 考勤
        .route("/attendance/check-in", post(handlers::check_in))
        .route("/attendance/check-out", post(handlers::check_out))
        .route("/attendance", get(handlers::list_attendance))

        // 通知
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )

        // 管理员开通
        .route("/admins", post(handlers::create_admin_user))

        .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}
