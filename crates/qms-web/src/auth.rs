//! 用户认证和授权系统
//!
//! 服务端签发带过期时间的会话令牌：负载为base64编码的声明，
//! 签名为 `sha256(secret || payload)`。密码以sha256哈希入库比对。

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use qms_core::{QmsError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

/// 会话主体角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Admin,
    Clinic,
    Screen,
    Doctor,
    Patient,
}

/// 会话令牌声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 主体ID
    pub sub: Uuid,
    /// 主体角色
    pub role: SessionRole,
    /// 显示名
    pub name: String,
    /// 过期时间（Unix秒）
    pub exp: i64,
    /// 签发时间（Unix秒）
    pub iat: i64,
    /// 令牌ID
    pub jti: Uuid,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub role: SessionRole,
    pub subject_id: Uuid,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// 管理员登录请求
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// 诊所登录请求（诊所号 + 口令）
#[derive(Debug, Deserialize)]
pub struct ClinicLoginRequest {
    pub clinic_id: Uuid,
    pub password: String,
}

/// 显示屏登录请求（屏号 + 口令）
#[derive(Debug, Deserialize)]
pub struct ScreenLoginRequest {
    pub screen_number: i32,
    pub password: String,
}

/// 医生登录请求（工号 + 国民身份证号）
#[derive(Debug, Deserialize)]
pub struct DoctorLoginRequest {
    pub doctor_number: String,
    pub national_id: String,
}

/// 认证服务
pub struct AuthService {
    secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(secret: String, token_ttl: Duration) -> Self {
        Self { secret, token_ttl }
    }

    /// 密码哈希（sha256十六进制）
    pub fn hash_password(password: &str) -> String {
        let digest = Sha256::digest(password.as_bytes());
        format!("{:x}", digest)
    }

    /// 比对明文密码与存储的哈希
    pub fn verify_password(password: &str, hash: &str) -> bool {
        Self::hash_password(password) == hash
    }

    /// 签发会话令牌
    pub fn issue_token(&self, sub: Uuid, role: SessionRole, name: &str) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub,
            role,
            name: name.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = self.sign(&payload);

        Ok((format!("{}.{}", payload, signature), expires_at))
    }

    /// 验证令牌签名与有效期，返回声明
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| QmsError::Auth("Invalid token format".to_string()))?;

        if self.sign(payload) != signature {
            return Err(QmsError::Auth("Invalid token signature".to_string()));
        }

        let claims_data = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| QmsError::Auth("Invalid token encoding".to_string()))?;
        let claims: Claims = serde_json::from_slice(&claims_data)
            .map_err(|_| QmsError::Auth("Invalid token claims".to_string()))?;

        if claims.exp < Utc::now().timestamp() {
            return Err(QmsError::Auth("Token has expired".to_string()));
        }

        Ok(claims)
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// 认证中间件
///
/// 校验 `Authorization: Bearer` 令牌并把声明塞进请求扩展。
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return Err(QmsError::Auth("Missing token".to_string()).into());
        }
    };

    match state.auth.verify_token(token) {
        Ok(claims) => {
            let mut request = request;
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("Token verification failed: {}", e);
            Err(e.into())
        }
    }
}

/// 校验会话角色
pub fn require_role(claims: &Claims, roles: &[SessionRole]) -> Result<()> {
    if !roles.contains(&claims.role) {
        return Err(QmsError::Auth("Insufficient permissions".to_string()));
    }
    Ok(())
}

/// 管理员登录
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Admin login attempt: {}", request.email);

    let queries = qms_database::DatabaseQueries::new(&state.db);
    let user = queries
        .get_admin_by_email(&request.email)
        .await?
        .ok_or_else(|| QmsError::Auth("Invalid email or password".to_string()))?;

    if !user.is_active {
        return Err(QmsError::Auth("Account is disabled".to_string()).into());
    }
    if !AuthService::verify_password(&request.password, &user.password_hash) {
        warn!("Admin login failed: {}", request.email);
        return Err(QmsError::Auth("Invalid email or password".to_string()).into());
    }

    queries.touch_admin_login(&user.id).await?;

    let (token, expires_at) = state
        .auth
        .issue_token(user.id, SessionRole::Admin, &user.full_name)?;
    info!("Admin logged in: {}", user.email);

    Ok(Json(SessionResponse {
        token,
        role: SessionRole::Admin,
        subject_id: user.id,
        name: user.full_name,
        expires_at,
    }))
}

/// 诊所登录
pub async fn clinic_login(
    State(state): State<AppState>,
    Json(request): Json<ClinicLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = qms_database::DatabaseQueries::new(&state.db);
    let clinic = queries
        .get_clinic_by_id(&request.clinic_id)
        .await?
        .ok_or_else(|| QmsError::Auth("Invalid clinic or password".to_string()))?;

    if clinic.password != request.password {
        warn!("Clinic login failed: {}", clinic.name);
        return Err(QmsError::Auth("Invalid clinic or password".to_string()).into());
    }

    let (token, expires_at) = state
        .auth
        .issue_token(clinic.id, SessionRole::Clinic, &clinic.name)?;
    info!("Clinic logged in: {}", clinic.name);

    Ok(Json(SessionResponse {
        token,
        role: SessionRole::Clinic,
        subject_id: clinic.id,
        name: clinic.name,
        expires_at,
    }))
}

/// 显示屏登录
pub async fn screen_login(
    State(state): State<AppState>,
    Json(request): Json<ScreenLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = qms_database::DatabaseQueries::new(&state.db);
    let screen = queries
        .get_screen_by_number(request.screen_number)
        .await?
        .ok_or_else(|| QmsError::Auth("Invalid screen or password".to_string()))?;

    if !screen.is_active || screen.password != request.password {
        warn!("Screen login failed: {}", request.screen_number);
        return Err(QmsError::Auth("Invalid screen or password".to_string()).into());
    }

    let name = format!("screen-{}", screen.screen_number);
    let (token, expires_at) = state
        .auth
        .issue_token(screen.id, SessionRole::Screen, &name)?;
    info!("Screen logged in: {}", name);

    Ok(Json(SessionResponse {
        token,
        role: SessionRole::Screen,
        subject_id: screen.id,
        name,
        expires_at,
    }))
}

/// 医生登录
pub async fn doctor_login(
    State(state): State<AppState>,
    Json(request): Json<DoctorLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = qms_database::DatabaseQueries::new(&state.db);
    let doctor = queries
        .get_doctor_by_credentials(&request.doctor_number, &request.national_id)
        .await?
        .ok_or_else(|| QmsError::Auth("Invalid credentials".to_string()))?;

    let (token, expires_at) = state
        .auth
        .issue_token(doctor.id, SessionRole::Doctor, &doctor.name)?;
    info!("Doctor logged in: {}", doctor.name);

    Ok(Json(SessionResponse {
        token,
        role: SessionRole::Doctor,
        subject_id: doctor.id,
        name: doctor.name,
        expires_at,
    }))
}

/// 获取当前会话信息
pub async fn get_current_session(request: Request) -> ApiResult<impl IntoResponse> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| QmsError::Auth("Not authenticated".to_string()))?;

    Ok(Json(claims.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret-at-least-16".to_string(), Duration::hours(12))
    }

    #[test]
    fn test_issue_and_verify_token() {
        let auth = service();
        let id = Uuid::new_v4();
        let (token, _) = auth.issue_token(id, SessionRole::Clinic, "الأسنان").unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, SessionRole::Clinic);
        assert_eq!(claims.name, "الأسنان");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = service();
        let (token, _) = auth
            .issue_token(Uuid::new_v4(), SessionRole::Admin, "admin")
            .unwrap();

        let mut tampered = token.clone();
        tampered.insert(2, 'x');
        assert!(auth.verify_token(&tampered).is_err());

        // 换密钥签发的令牌也无效
        let other = AuthService::new("another-secret-value".to_string(), Duration::hours(1));
        let (foreign, _) = other
            .issue_token(Uuid::new_v4(), SessionRole::Admin, "admin")
            .unwrap();
        assert!(auth.verify_token(&foreign).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthService::new("test-secret-at-least-16".to_string(), Duration::seconds(-1));
        let (token, _) = auth
            .issue_token(Uuid::new_v4(), SessionRole::Screen, "screen-1")
            .unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = AuthService::hash_password("Abcdef12");
        assert!(AuthService::verify_password("Abcdef12", &hash));
        assert!(!AuthService::verify_password("abcdef12", &hash));
    }
}
