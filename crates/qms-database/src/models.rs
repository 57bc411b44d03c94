//! 数据库模型

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use qms_core::models::*;
use sqlx::FromRow;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 数据库中心表
#[derive(Debug, FromRow)]
pub struct DbCenter {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub news_ticker: String,
    pub ticker_speed: i32,
    pub alert_duration: i32,
    pub speech_speed: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbCenter> for Center {
    fn from(db: DbCenter) -> Self {
        Center {
            id: db.id,
            name: db.name,
            description: db.description,
            logo_url: db.logo_url,
            address: db.address,
            phone: db.phone,
            email: db.email,
            news_ticker: db.news_ticker,
            ticker_speed: db.ticker_speed,
            alert_duration: db.alert_duration,
            speech_speed: db.speech_speed,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库显示屏表
#[derive(Debug, FromRow)]
pub struct DbScreen {
    pub id: Uuid,
    pub center_id: Uuid,
    pub screen_number: i32,
    pub password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbScreen> for Screen {
    fn from(db: DbScreen) -> Self {
        Screen {
            id: db.id,
            center_id: db.center_id,
            screen_number: db.screen_number,
            password: db.password,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库诊所表
#[derive(Debug, FromRow)]
pub struct DbClinic {
    pub id: Uuid,
    pub center_id: Uuid,
    pub name: String,
    pub clinic_number: i32,
    pub screen_ids: Vec<i32>,
    pub password: String,
    pub current_number: i32,
    pub is_active: bool,
    pub last_call_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbClinic> for Clinic {
    fn from(db: DbClinic) -> Self {
        Clinic {
            id: db.id,
            center_id: db.center_id,
            name: db.name,
            clinic_number: db.clinic_number,
            screen_ids: db.screen_ids,
            password: db.password,
            current_number: db.current_number,
            is_active: db.is_active,
            last_call_time: db.last_call_time,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库叫号记录表
#[derive(Debug, FromRow)]
pub struct DbQueueCall {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub patient_number: i32,
    pub called_at: DateTime<Utc>,
    pub is_emergency: bool,
    pub transferred_to_clinic_id: Option<Uuid>,
    pub status: String, // 存储为字符串，转换为CallStatus枚举
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbQueueCall> for QueueCall {
    fn from(db: DbQueueCall) -> Self {
        QueueCall {
            id: db.id,
            clinic_id: db.clinic_id,
            patient_number: db.patient_number,
            called_at: db.called_at,
            is_emergency: db.is_emergency,
            transferred_to_clinic_id: db.transferred_to_clinic_id,
            status: match db.status.as_str() {
                "pending" => CallStatus::Pending,
                "completed" => CallStatus::Completed,
                "transferred" => CallStatus::Transferred,
                _ => CallStatus::Called, // 默认状态
            },
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库医生表
#[derive(Debug, FromRow)]
pub struct DbDoctor {
    pub id: Uuid,
    pub center_id: Uuid,
    pub doctor_number: String,
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub work_days: Vec<String>,
    pub work_status: String,
    pub shift: String,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub annual_leave_balance: i32,
    pub emergency_leave_balance: i32,
    pub absence_days: i32,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbDoctor> for Doctor {
    fn from(db: DbDoctor) -> Self {
        Doctor {
            id: db.id,
            center_id: db.center_id,
            doctor_number: db.doctor_number,
            name: db.name,
            phone: db.phone,
            national_id: db.national_id,
            specialty: db.specialty,
            clinic_id: db.clinic_id,
            work_days: db.work_days,
            work_status: match db.work_status.as_str() {
                "inactive" => WorkStatus::Inactive,
                "on_leave" => WorkStatus::OnLeave,
                _ => WorkStatus::Active,
            },
            shift: match db.shift.as_str() {
                "evening" => Shift::Evening,
                "both" => Shift::Both,
                _ => Shift::Morning,
            },
            check_in_time: db.check_in_time,
            check_out_time: db.check_out_time,
            annual_leave_balance: db.annual_leave_balance,
            emergency_leave_balance: db.emergency_leave_balance,
            absence_days: db.absence_days,
            notes: db.notes,
            photo_url: db.photo_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库患者表
#[derive(Debug, FromRow)]
pub struct DbPatient {
    pub id: Uuid,
    pub center_id: Uuid,
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub email: Option<String>,
    pub gender: String,
    pub family_members: i32,
    pub chronic_diseases: Vec<String>,
    pub is_pregnant: bool,
    pub is_breastfeeding: bool,
    pub previous_surgeries: Option<String>,
    pub drug_allergies: Option<String>,
    pub current_medications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbPatient> for Patient {
    fn from(db: DbPatient) -> Self {
        Patient {
            id: db.id,
            center_id: db.center_id,
            full_name: db.full_name,
            national_id: db.national_id,
            phone: db.phone,
            email: db.email,
            gender: match db.gender.as_str() {
                "female" => Gender::Female,
                "child" => Gender::Child,
                _ => Gender::Male,
            },
            family_members: db.family_members,
            chronic_diseases: db.chronic_diseases,
            is_pregnant: db.is_pregnant,
            is_breastfeeding: db.is_breastfeeding,
            previous_surgeries: db.previous_surgeries,
            drug_allergies: db.drug_allergies,
            current_medications: db.current_medications,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库预约表
#[derive(Debug, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub center_id: Uuid,
    pub clinic_id: Uuid,
    pub patient_name: String,
    pub national_id: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub visit_reason: String,
    pub shift: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAppointment> for Appointment {
    fn from(db: DbAppointment) -> Self {
        Appointment {
            id: db.id,
            center_id: db.center_id,
            clinic_id: db.clinic_id,
            patient_name: db.patient_name,
            national_id: db.national_id,
            phone: db.phone,
            appointment_date: db.appointment_date,
            appointment_time: db.appointment_time,
            visit_reason: db.visit_reason,
            shift: match db.shift.as_str() {
                "evening" => Shift::Evening,
                "both" => Shift::Both,
                _ => Shift::Morning,
            },
            status: match db.status.as_str() {
                "confirmed" => AppointmentStatus::Confirmed,
                "completed" => AppointmentStatus::Completed,
                "cancelled" => AppointmentStatus::Cancelled,
                _ => AppointmentStatus::Pending,
            },
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库问诊表
#[derive(Debug, FromRow)]
pub struct DbConsultation {
    pub id: Uuid,
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
    pub response_text: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbConsultation> for Consultation {
    fn from(db: DbConsultation) -> Self {
        Consultation {
            id: db.id,
            patient_id: db.patient_id,
            doctor_id: db.doctor_id,
            specialty_required: db.specialty_required,
            complaint_text: db.complaint_text,
            current_symptoms: db.current_symptoms,
            weight_kg: db.weight_kg,
            height_cm: db.height_cm,
            blood_pressure: db.blood_pressure,
            temperature: db.temperature,
            pulse: db.pulse,
            response_text: db.response_text,
            status: match db.status.as_str() {
                "closed" => ConsultationStatus::Closed,
                _ => ConsultationStatus::Open,
            },
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库投诉表
#[derive(Debug, FromRow)]
pub struct DbComplaint {
    pub id: Uuid,
    pub center_id: Uuid,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub kind: String,
    pub message: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbComplaint> for Complaint {
    fn from(db: DbComplaint) -> Self {
        Complaint {
            id: db.id,
            center_id: db.center_id,
            patient_name: db.patient_name,
            phone: db.phone,
            email: db.email,
            kind: match db.kind.as_str() {
                "suggestion" => ComplaintKind::Suggestion,
                _ => ComplaintKind::Complaint,
            },
            message: db.message,
            notes: db.notes,
            status: match db.status.as_str() {
                "reviewed" => ComplaintStatus::Reviewed,
                "resolved" => ComplaintStatus::Resolved,
                _ => ComplaintStatus::New,
            },
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库请假申请表
#[derive(Debug, FromRow)]
pub struct DbLeaveRequest {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub request_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub acting_doctor_id: Option<Uuid>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbLeaveRequest> for LeaveRequest {
    fn from(db: DbLeaveRequest) -> Self {
        LeaveRequest {
            id: db.id,
            doctor_id: db.doctor_id,
            request_type: match db.request_type.as_str() {
                "annual" => LeaveType::Annual,
                "emergency" => LeaveType::Emergency,
                "rest_day" => LeaveType::RestDay,
                "mission" => LeaveType::Mission,
                "morning_permission" => LeaveType::MorningPermission,
                "evening_permission" => LeaveType::EveningPermission,
                "training_mission" => LeaveType::TrainingMission,
                "sick" => LeaveType::Sick,
                "insurance" => LeaveType::Insurance,
                "travel_permit" => LeaveType::TravelPermit,
                _ => LeaveType::Other,
            },
            start_date: db.start_date,
            end_date: db.end_date,
            acting_doctor_id: db.acting_doctor_id,
            notes: db.notes,
            status: match db.status.as_str() {
                "approved" => RequestStatus::Approved,
                "rejected" => RequestStatus::Rejected,
                _ => RequestStatus::Pending,
            },
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库考勤表
#[derive(Debug, FromRow)]
pub struct DbAttendanceRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAttendanceRecord> for AttendanceRecord {
    fn from(db: DbAttendanceRecord) -> Self {
        AttendanceRecord {
            id: db.id,
            doctor_id: db.doctor_id,
            date: db.date,
            check_in_time: db.check_in_time,
            check_out_time: db.check_out_time,
            status: match db.status.as_str() {
                "absent" => AttendanceStatus::Absent,
                "late" => AttendanceStatus::Late,
                "on_leave" => AttendanceStatus::OnLeave,
                _ => AttendanceStatus::Present,
            },
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库管理员表
#[derive(Debug, FromRow)]
pub struct DbAdminUser {
    pub id: Uuid,
    pub center_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAdminUser> for AdminUser {
    fn from(db: DbAdminUser) -> Self {
        AdminUser {
            id: db.id,
            center_id: db.center_id,
            email: db.email,
            password_hash: db.password_hash,
            full_name: db.full_name,
            role: match db.role.as_str() {
                "super_admin" => AdminRole::SuperAdmin,
                "manager" => AdminRole::Manager,
                _ => AdminRole::Admin,
            },
            is_active: db.is_active,
            last_login: db.last_login,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 数据库通知表
#[derive(Debug, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_type: String,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbNotification> for Notification {
    fn from(db: DbNotification) -> Self {
        Notification {
            id: db.id,
            recipient_id: db.recipient_id,
            recipient_type: match db.recipient_type.as_str() {
                "doctor" => RecipientType::Doctor,
                "patient" => RecipientType::Patient,
                _ => RecipientType::Admin,
            },
            title: db.title,
            message: db.message,
            kind: match db.kind.as_str() {
                "call" => NotificationKind::Call,
                "alert" => NotificationKind::Alert,
                "request" => NotificationKind::Request,
                "approval" => NotificationKind::Approval,
                _ => NotificationKind::System,
            },
            is_read: db.is_read,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

// 插入模型 - 用于创建新记录

/// 新诊所插入模型
#[derive(Debug)]
pub struct NewClinic {
    pub id: Uuid,
    pub center_id: Uuid,
    pub name: String,
    pub clinic_number: i32,
    pub screen_ids: Vec<i32>,
    pub password: String,
}

/// 新显示屏插入模型
#[derive(Debug)]
pub struct NewScreen {
    pub id: Uuid,
    pub center_id: Uuid,
    pub screen_number: i32,
    pub password: String,
}

/// 新医生插入模型
#[derive(Debug)]
pub struct NewDoctor {
    pub id: Uuid,
    pub center_id: Uuid,
    pub doctor_number: String,
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub work_days: Vec<String>,
    pub shift: Shift,
    pub annual_leave_balance: i32,
    pub emergency_leave_balance: i32,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
}

/// 新患者插入模型
#[derive(Debug)]
pub struct NewPatient {
    pub id: Uuid,
    pub center_id: Uuid,
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

/// 新预约插入模型
#[derive(Debug)]
pub struct NewAppointment {
    pub id: Uuid,
    pub center_id: Uuid,
    pub clinic_id: Uuid,
    pub patient_name: String,
    pub national_id: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub visit_reason: String,
    pub shift: Shift,
}

/// 新问诊插入模型
#[derive(Debug)]
pub struct NewConsultation {
    pub id: Uuid,
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

/// 新投诉插入模型
#[derive(Debug)]
pub struct NewComplaint {
    pub id: Uuid,
    pub center_id: Uuid,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub kind: ComplaintKind,
    pub message: String,
}

/// 新请假申请插入模型
#[derive(Debug)]
pub struct NewLeaveRequest {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub request_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub acting_doctor_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// 新考勤记录插入模型
#[derive(Debug)]
pub struct NewAttendanceRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// 新管理员插入模型
#[derive(Debug)]
pub struct NewAdminUser {
    pub id: Uuid,
    pub center_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: AdminRole,
}

/// 新通知插入模型
#[derive(Debug)]
pub struct NewNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_type: RecipientType,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}
