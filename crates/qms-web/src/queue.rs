//! 队列操作处理器
//!
//! 诊所操作台的叫号入口。所有计数器变更都走队列引擎，
//! 这里只做角色校验和请求拆包。

use crate::auth::{require_role, Claims, SessionRole};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use qms_core::QmsError;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// 操作诊所队列的角色
const QUEUE_ROLES: &[SessionRole] = &[SessionRole::Admin, SessionRole::Clinic];

/// 诊所会话只能操作自己的队列
fn check_clinic_scope(claims: &Claims, clinic_id: &Uuid) -> qms_core::Result<()> {
    require_role(claims, QUEUE_ROLES)?;
    if claims.role == SessionRole::Clinic && claims.sub != *clinic_id {
        return Err(QmsError::Auth(
            "Clinic session cannot operate another clinic's queue".to_string(),
        ));
    }
    Ok(())
}

/// 叫下一号
pub async fn advance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let mutation = state.engine.advance(clinic_id).await?;
    Ok(Json(json!({
        "clinic": mutation.after,
        "call": mutation.call
    })))
}

/// 回退一号（计数器为零时静默无操作）
pub async fn recede(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    match state.engine.recede(clinic_id).await? {
        Some(mutation) => Ok(Json(json!({
            "clinic": mutation.after,
            "changed": true
        }))),
        None => Ok(Json(json!({ "changed": false }))),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallSpecificRequest {
    pub number: i32,
}

/// 叫指定号码
pub async fn call_specific(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<CallSpecificRequest>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let mutation = state.engine.call_specific(clinic_id, request.number).await?;
    Ok(Json(json!({
        "clinic": mutation.after,
        "call": mutation.call
    })))
}

/// 计数器清零
pub async fn reset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let clinic = state.engine.reset(clinic_id).await?;
    Ok(Json(clinic))
}

/// 切换接诊开关
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let clinic = state.engine.toggle_active(clinic_id).await?;
    Ok(Json(clinic))
}

#[derive(Debug, Deserialize)]
pub struct EmergencyRequest {
    pub patient_number: i32,
}

/// 紧急呼叫
pub async fn emergency(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<EmergencyRequest>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let call = state
        .engine
        .emergency(clinic_id, request.patient_number)
        .await?;
    Ok(Json(call))
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub patient_number: i32,
    pub to_clinic_id: Uuid,
}

/// 转诊到另一诊所
pub async fn transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> ApiResult<impl IntoResponse> {
    check_clinic_scope(&claims, &clinic_id)?;

    let call = state
        .engine
        .transfer(clinic_id, request.patient_number, request.to_clinic_id)
        .await?;
    Ok(Json(call))
}

/// 结束一次叫号的就诊
pub async fn complete_call(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(call_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, QUEUE_ROLES)?;

    let call = state.engine.complete(call_id).await?;
    Ok(Json(call))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
    pub limit: Option<i64>,
}

/// 诊所当前状态与最近叫号记录（公开，显示屏与门户轮询兜底）
pub async fn snapshot(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
    Query(params): Query<SnapshotParams>,
) -> ApiResult<impl IntoResponse> {
    let (clinic, calls) = state
        .engine
        .snapshot(clinic_id, params.limit.unwrap_or(20))
        .await?;
    Ok(Json(json!({
        "clinic": clinic,
        "recent_calls": calls
    })))
}
