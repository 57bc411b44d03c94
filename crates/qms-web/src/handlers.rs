//! HTTP处理器

use crate::auth::{require_role, AuthService, Claims, SessionRole};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use qms_core::validation::{self, ValidationReport};
use qms_core::{
    AppointmentStatus, AttendanceStatus, Center, ComplaintKind, ComplaintStatus, Gender,
    LeaveType, NotificationKind, QmsError, RecipientType, RequestStatus, Result, Shift,
    WorkStatus,
};
use qms_database::{
    DatabaseQueries, NewAppointment, NewAttendanceRecord, NewClinic, NewComplaint,
    NewConsultation, NewDoctor, NewLeaveRequest, NewPatient, NewScreen,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// 不通过则把字段错误序列化进验证错误
fn ensure_valid(report: ValidationReport) -> Result<()> {
    if report.is_valid {
        Ok(())
    } else {
        Err(QmsError::Validation(serde_json::to_string(&report.errors)?))
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| QmsError::Validation(format!("invalid time: {}", value)))
}

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "QMS Web API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api/v1",
            "realtime": "/realtime/ws"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

// ========== 中心配置 ==========

/// 读取中心配置（显示屏与门户公用）
pub async fn get_center(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let center = DatabaseQueries::new(&state.db)
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    Ok(Json(center))
}

/// 更新中心配置（管理员）
pub async fn update_center(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(center): Json<Center>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db).update_center(&center).await?;
    info!("Center settings updated by {}", claims.name);
    Ok(Json(center))
}

// ========== 显示屏 ==========

#[derive(Debug, Deserialize)]
pub struct CreateScreenRequest {
    pub screen_number: i32,
    pub password: String,
}

pub async fn create_screen(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateScreenRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    if request.screen_number < 1 {
        return Err(QmsError::Validation("screen number must be positive".to_string()).into());
    }

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;

    let screen = NewScreen {
        id: Uuid::new_v4(),
        center_id: center.id,
        screen_number: request.screen_number,
        password: request.password,
    };
    let id = queries.create_screen(&screen).await?;
    info!("Screen {} created", request.screen_number);
    Ok(Json(json!({ "id": id })))
}

pub async fn list_screens(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    Ok(Json(queries.list_screens(&center.id).await?))
}

pub async fn delete_screen(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db).delete_screen(&id).await?;
    Ok(Json(json!({ "deleted": id })))
}

// ========== 诊所 ==========

#[derive(Debug, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub clinic_number: i32,
    pub screen_ids: Vec<i32>,
    pub password: String,
}

pub async fn create_clinic(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateClinicRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;
    ensure_valid(validation::validate_clinic_form(
        &request.name,
        request.clinic_number,
        &request.password,
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;

    let clinic = NewClinic {
        id: Uuid::new_v4(),
        center_id: center.id,
        name: request.name.clone(),
        clinic_number: request.clinic_number,
        screen_ids: request.screen_ids,
        password: request.password,
    };
    let id = queries.create_clinic(&clinic).await?;
    info!("Clinic created: {}", request.name);
    Ok(Json(json!({ "id": id })))
}

/// 公开的诊所列表（门户与显示屏启动时拉取）
pub async fn list_clinics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    Ok(Json(queries.list_clinics(&center.id).await?))
}

pub async fn get_clinic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let clinic = DatabaseQueries::new(&state.db)
        .get_clinic_by_id(&id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("clinic {}", id)))?;
    Ok(Json(clinic))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: String,
    pub clinic_number: i32,
    pub screen_ids: Vec<i32>,
    pub password: String,
}

pub async fn update_clinic(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClinicRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;
    ensure_valid(validation::validate_clinic_form(
        &request.name,
        request.clinic_number,
        &request.password,
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    let mut clinic = queries
        .get_clinic_by_id(&id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("clinic {}", id)))?;

    clinic.name = request.name;
    clinic.clinic_number = request.clinic_number;
    clinic.screen_ids = request.screen_ids;
    clinic.password = request.password;
    queries.update_clinic(&clinic).await?;
    Ok(Json(clinic))
}

pub async fn delete_clinic(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db).delete_clinic(&id).await?;
    info!("Clinic deleted: {}", id);
    Ok(Json(json!({ "deleted": id })))
}

// ========== 医生 ==========

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub doctor_number: String,
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub work_days: Vec<String>,
    pub shift: Shift,
    pub annual_leave_balance: Option<i32>,
    pub emergency_leave_balance: Option<i32>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
}

pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateDoctorRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;
    ensure_valid(validation::validate_doctor_form(
        &request.name,
        &request.phone,
        &request.national_id,
        &request.specialty,
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    queries
        .get_clinic_by_id(&request.clinic_id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("clinic {}", request.clinic_id)))?;

    let doctor = NewDoctor {
        id: Uuid::new_v4(),
        center_id: center.id,
        doctor_number: request.doctor_number,
        name: request.name.clone(),
        phone: request.phone,
        national_id: request.national_id,
        specialty: request.specialty,
        clinic_id: request.clinic_id,
        work_days: request.work_days,
        shift: request.shift,
        annual_leave_balance: request.annual_leave_balance.unwrap_or(21),
        emergency_leave_balance: request.emergency_leave_balance.unwrap_or(7),
        notes: request.notes,
        photo_url: request.photo_url,
    };
    let id = queries.create_doctor(&doctor).await?;
    info!("Doctor created: {}", request.name);
    Ok(Json(json!({ "id": id })))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    Ok(Json(queries.list_doctors(&center.id).await?))
}

/// 诊所的在岗医生（公开，门户展示）
pub async fn list_clinic_doctors(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_doctors_by_clinic(&clinic_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkStatusRequest {
    pub work_status: WorkStatus,
}

pub async fn update_doctor_work_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db)
        .update_doctor_work_status(&id, &request.work_status)
        .await?;
    Ok(Json(json!({ "updated": id })))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db).delete_doctor(&id).await?;
    Ok(Json(json!({ "deleted": id })))
}

// ========== 患者 ==========

#[derive(Debug, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: Option<String>,
    pub gender: Gender,
    pub family_members: i32,
    pub chronic_diseases: Vec<String>,
    pub is_pregnant: bool,
    pub is_breastfeeding: bool,
    pub previous_surgeries: Option<String>,
    pub drug_allergies: Option<String>,
    pub current_medications: Option<String>,
}

/// 患者自助登记（公开）
pub async fn register_patient(
    State(state): State<AppState>,
    Json(request): Json<RegisterPatientRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(validation::validate_patient_form(
        &request.full_name,
        &request.national_id,
        &request.phone,
        request.family_members,
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    if queries
        .get_patient_by_national_id(&request.national_id)
        .await?
        .is_some()
    {
        return Err(QmsError::Validation("الرقم القومي مسجل بالفعل".to_string()).into());
    }

    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;

    let patient = NewPatient {
        id: Uuid::new_v4(),
        center_id: center.id,
        full_name: request.full_name,
        national_id: request.national_id,
        phone: request.phone,
        email: request.email,
        gender: request.gender,
        family_members: request.family_members,
        chronic_diseases: request.chronic_diseases,
        is_pregnant: request.is_pregnant,
        is_breastfeeding: request.is_breastfeeding,
        previous_surgeries: request.previous_surgeries,
        drug_allergies: request.drug_allergies,
        current_medications: request.current_medications,
    };
    let id = queries.create_patient(&patient).await?;
    info!("Patient registered: {}", id);
    Ok(Json(json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct PatientLookupParams {
    pub national_id: String,
}

/// 按国民身份证号查档（患者门户登录）
pub async fn lookup_patient(
    State(state): State<AppState>,
    Query(params): Query<PatientLookupParams>,
) -> ApiResult<impl IntoResponse> {
    let patient = DatabaseQueries::new(&state.db)
        .get_patient_by_national_id(&params.national_id)
        .await?
        .ok_or_else(|| QmsError::NotFound("patient".to_string()))?;
    Ok(Json(patient))
}

#[derive(Debug, Deserialize)]
pub struct PatientSearchParams {
    pub name: String,
    pub limit: Option<i64>,
}

pub async fn search_patients(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PatientSearchParams>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin, SessionRole::Doctor])?;

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .search_patients_by_name(&params.name, params.limit.unwrap_or(50))
            .await?,
    ))
}

// ========== 预约 ==========

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub clinic_id: Uuid,
    pub patient_name: String,
    pub national_id: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub visit_reason: String,
    pub shift: Shift,
}

/// 预约挂号（公开）
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(validation::validate_appointment_form(
        &request.patient_name,
        &request.national_id,
        &request.phone,
        &request.appointment_time,
        &request.visit_reason,
    ))?;

    let time = parse_time(&request.appointment_time)?;
    if request.appointment_date < Utc::now().date_naive() {
        return Err(QmsError::Validation("لا يمكن الحجز في تاريخ سابق".to_string()).into());
    }

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    queries
        .get_clinic_by_id(&request.clinic_id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("clinic {}", request.clinic_id)))?;

    if queries
        .slot_taken(&request.clinic_id, request.appointment_date, time)
        .await?
    {
        return Err(QmsError::Validation("هذا الموعد محجوز بالفعل".to_string()).into());
    }

    let appointment = NewAppointment {
        id: Uuid::new_v4(),
        center_id: center.id,
        clinic_id: request.clinic_id,
        patient_name: request.patient_name,
        national_id: request.national_id,
        phone: request.phone,
        appointment_date: request.appointment_date,
        appointment_time: time,
        visit_reason: request.visit_reason,
        shift: request.shift,
    };
    let id = queries.create_appointment(&appointment).await?;
    info!("Appointment created: {}", id);
    Ok(Json(json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct AppointmentListParams {
    pub clinic_id: Uuid,
    pub date: NaiveDate,
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AppointmentListParams>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin, SessionRole::Clinic, SessionRole::Doctor])?;

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_appointments(&params.clinic_id, params.date)
            .await?,
    ))
}

/// 患者查看自己的预约（公开，按国民身份证号）
pub async fn list_my_appointments(
    State(state): State<AppState>,
    Query(params): Query<PatientLookupParams>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_appointments_by_national_id(&params.national_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin, SessionRole::Clinic, SessionRole::Doctor])?;

    DatabaseQueries::new(&state.db)
        .update_appointment_status(&id, &request.status)
        .await?;
    Ok(Json(json!({ "updated": id })))
}

// ========== 问诊 ==========

#[derive(Debug, Deserialize)]
pub struct CreateConsultationRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub specialty_required: String,
    pub complaint_text: String,
    pub current_symptoms: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub blood_pressure: Option<String>,
    pub temperature: Option<f64>,
    pub pulse: Option<i32>,
}

/// 患者发起远程问诊（公开）
pub async fn create_consultation(
    State(state): State<AppState>,
    Json(request): Json<CreateConsultationRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(validation::validate_consultation_form(
        &request.complaint_text,
        &request.current_symptoms,
        &request.specialty_required,
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    queries
        .get_patient_by_id(&request.patient_id)
        .await?
        .ok_or_else(|| QmsError::NotFound("patient".to_string()))?;
    queries
        .get_doctor_by_id(&request.doctor_id)
        .await?
        .ok_or_else(|| QmsError::NotFound("doctor".to_string()))?;

    let consultation = NewConsultation {
        id: Uuid::new_v4(),
        patient_id: request.patient_id,
        doctor_id: request.doctor_id,
        specialty_required: request.specialty_required,
        complaint_text: request.complaint_text,
        current_symptoms: request.current_symptoms,
        weight_kg: request.weight_kg,
        height_cm: request.height_cm,
        blood_pressure: request.blood_pressure,
        temperature: request.temperature,
        pulse: request.pulse,
    };
    let id = queries.create_consultation(&consultation).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn list_open_consultations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_open_consultations(&claims.sub)
            .await?,
    ))
}

pub async fn list_patient_consultations(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_consultations_by_patient(&patient_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RespondConsultationRequest {
    pub response_text: String,
}

/// 医生答复问诊并关闭
pub async fn respond_consultation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RespondConsultationRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    let queries = DatabaseQueries::new(&state.db);
    let consultation = queries
        .get_consultation_by_id(&id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("consultation {}", id)))?;

    if consultation.doctor_id != claims.sub {
        return Err(QmsError::Auth("Consultation belongs to another doctor".to_string()).into());
    }

    queries.respond_consultation(&id, &request.response_text).await?;
    info!("Consultation {} answered by {}", id, claims.name);
    Ok(Json(json!({ "closed": id })))
}

// ========== 投诉与建议 ==========

#[derive(Debug, Deserialize)]
pub struct CreateComplaintRequest {
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: ComplaintKind,
    pub message: String,
}

/// 提交投诉或建议（公开，可匿名）
pub async fn create_complaint(
    State(state): State<AppState>,
    Json(request): Json<CreateComplaintRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_valid(validation::validate_complaint_form(
        &request.message,
        request.phone.as_deref(),
        request.email.as_deref(),
    ))?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;

    let complaint = NewComplaint {
        id: Uuid::new_v4(),
        center_id: center.id,
        patient_name: request.patient_name,
        phone: request.phone,
        email: request.email,
        kind: request.kind,
        message: request.message,
    };
    let id = queries.create_complaint(&complaint).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn list_complaints(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;
    Ok(Json(queries.list_complaints(&center.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateComplaintRequest {
    pub status: ComplaintStatus,
    pub notes: Option<String>,
}

pub async fn update_complaint(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateComplaintRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    DatabaseQueries::new(&state.db)
        .update_complaint(&id, &request.status, request.notes.as_deref())
        .await?;
    Ok(Json(json!({ "updated": id })))
}

// ========== 请假 ==========

#[derive(Debug, Deserialize)]
pub struct CreateLeaveRequest {
    pub request_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub acting_doctor_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// 医生提交请假申请
pub async fn create_leave_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateLeaveRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    if request.end_date < request.start_date {
        return Err(QmsError::Validation("end date before start date".to_string()).into());
    }

    let queries = DatabaseQueries::new(&state.db);
    let leave = NewLeaveRequest {
        id: Uuid::new_v4(),
        doctor_id: claims.sub,
        request_type: request.request_type,
        start_date: request.start_date,
        end_date: request.end_date,
        acting_doctor_id: request.acting_doctor_id,
        notes: request.notes,
    };
    let id = queries.create_leave_request(&leave).await?;
    info!("Leave request {} submitted by {}", id, claims.name);
    Ok(Json(json!({ "id": id })))
}

pub async fn list_my_leave_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_leave_requests_by_doctor(&claims.sub)
            .await?,
    ))
}

pub async fn list_pending_leave_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_pending_leave_requests()
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReviewLeaveRequest {
    pub status: RequestStatus,
}

/// 审批请假：批准年假/紧急假时同步扣减余额
pub async fn review_leave_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewLeaveRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    if request.status == RequestStatus::Pending {
        return Err(QmsError::Validation("review must approve or reject".to_string()).into());
    }

    let queries = DatabaseQueries::new(&state.db);
    let leave = queries
        .get_leave_request_by_id(&id)
        .await?
        .ok_or_else(|| QmsError::NotFound(format!("leave request {}", id)))?;

    if leave.status != RequestStatus::Pending {
        return Err(QmsError::Validation("request already reviewed".to_string()).into());
    }

    queries.update_leave_request_status(&id, &request.status).await?;

    if request.status == RequestStatus::Approved {
        let days = (leave.end_date - leave.start_date).num_days() as i32 + 1;
        match leave.request_type {
            LeaveType::Annual => {
                queries.deduct_leave_balance(&leave.doctor_id, days, 0).await?;
            }
            LeaveType::Emergency => {
                queries.deduct_leave_balance(&leave.doctor_id, 0, days).await?;
            }
            _ => {}
        }
    }

    // 审批结果推给申请人
    let (title, kind) = match request.status {
        RequestStatus::Approved => ("تمت الموافقة على طلب الإجازة", NotificationKind::Approval),
        _ => ("تم رفض طلب الإجازة", NotificationKind::Request),
    };
    let notification = qms_database::NewNotification {
        id: Uuid::new_v4(),
        recipient_id: leave.doctor_id,
        recipient_type: RecipientType::Doctor,
        title: title.to_string(),
        message: format!("{} - {}", leave.start_date, leave.end_date),
        kind,
    };
    queries.create_notification(&notification).await?;

    info!("Leave request {} reviewed by {}", id, claims.name);
    Ok(Json(json!({ "reviewed": id })))
}

// ========== 考勤 ==========

pub async fn check_in(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    let now = Utc::now();
    let record = NewAttendanceRecord {
        id: Uuid::new_v4(),
        doctor_id: claims.sub,
        date: now.date_naive(),
        check_in_time: Some(now.time()),
        status: AttendanceStatus::Present,
        notes: None,
    };
    let id = DatabaseQueries::new(&state.db).check_in(&record).await?;
    info!("Doctor {} checked in", claims.name);
    Ok(Json(json!({ "id": id })))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Doctor])?;

    let now = Utc::now();
    DatabaseQueries::new(&state.db)
        .check_out(&claims.sub, now.date_naive(), now.time())
        .await?;
    info!("Doctor {} checked out", claims.name);
    Ok(Json(json!({ "checked_out": claims.sub })))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceParams {
    pub doctor_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AttendanceParams>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin, SessionRole::Doctor])?;

    if claims.role == SessionRole::Doctor && claims.sub != params.doctor_id {
        return Err(QmsError::Auth("Can only view own attendance".to_string()).into());
    }

    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_attendance(&params.doctor_id, params.from, params.to)
            .await?,
    ))
}

// ========== 通知 ==========

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        DatabaseQueries::new(&state.db)
            .list_notifications(&claims.sub)
            .await?,
    ))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    DatabaseQueries::new(&state.db)
        .mark_notification_read(&id)
        .await?;
    Ok(Json(json!({ "read": id })))
}

// ========== 管理员开通 ==========

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: qms_core::AdminRole,
}

pub async fn create_admin_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateAdminRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, &[SessionRole::Admin])?;

    if !validation::validate_email(&request.email) {
        return Err(QmsError::Validation("invalid email".to_string()).into());
    }
    if !validation::validate_password(&request.password) {
        return Err(QmsError::Validation(
            "password must be 8+ chars with upper, lower and digit".to_string(),
        )
        .into());
    }

    let queries = DatabaseQueries::new(&state.db);
    let center = queries
        .get_center()
        .await?
        .ok_or_else(|| QmsError::NotFound("center".to_string()))?;

    let user = qms_database::NewAdminUser {
        id: Uuid::new_v4(),
        center_id: center.id,
        email: request.email.clone(),
        password_hash: AuthService::hash_password(&request.password),
        full_name: request.full_name,
        role: request.role,
    };
    let id = queries.create_admin_user(&user).await?;
    info!("Admin user created: {}", request.email);
    Ok(Json(json!({ "id": id })))
}
