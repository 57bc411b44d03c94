//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 医疗中心配置（每个部署一条记录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Center {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub news_ticker: String,      // 显示屏滚动新闻
    pub ticker_speed: i32,        // 滚动速度
    pub alert_duration: i32,      // 叫号提示显示秒数
    pub speech_speed: f64,        // 语音播报速率
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 候诊大厅显示屏终端
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screen {
    pub id: Uuid,
    pub center_id: Uuid,
    pub screen_number: i32,
    pub password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 诊所（排队计数器的归属单位）
///
/// 不变量: `current_number >= 0`，仅由队列引擎修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub center_id: Uuid,
    pub name: String,
    pub clinic_number: i32,       // 诊所序号，用于语音片段定位
    pub screen_ids: Vec<i32>,     // 叫号广播到的显示屏
    pub password: String,
    pub current_number: i32,      // 当前叫号
    pub is_active: bool,          // 停诊时拒绝叫号
    pub last_call_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 叫号审计记录（只追加，允许同号重复叫号）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueCall {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub patient_number: i32,
    pub called_at: DateTime<Utc>,
    pub is_emergency: bool,
    pub transferred_to_clinic_id: Option<Uuid>,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 叫号状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Called,
    Completed,
    Transferred,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Called => "called",
            Self::Completed => "completed",
            Self::Transferred => "transferred",
        }
    }
}

/// 医生信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub center_id: Uuid,
    pub doctor_number: String,
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub work_days: Vec<String>,
    pub work_status: WorkStatus,
    pub shift: Shift,
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

/// 医生在职状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Active,
    Inactive,
    OnLeave,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OnLeave => "on_leave",
        }
    }
}

/// 班次
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Evening,
    Both,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
            Self::Both => "both",
        }
    }
}

/// 患者档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 性别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Child,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Child => "child",
        }
    }
}

/// 预约记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
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
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 预约状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 远程问诊记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
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
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 问诊状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Open,
    Closed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// 投诉与建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub center_id: Uuid,
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: ComplaintKind,
    pub message: String,
    pub notes: Option<String>,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 投诉类别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintKind {
    Complaint,
    Suggestion,
}

impl ComplaintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complaint => "complaint",
            Self::Suggestion => "suggestion",
        }
    }
}

/// 投诉处理状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    New,
    Reviewed,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
        }
    }
}

/// 请假申请
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub request_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub acting_doctor_id: Option<Uuid>,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 请假类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Emergency,
    RestDay,
    Mission,
    MorningPermission,
    EveningPermission,
    TrainingMission,
    Sick,
    Insurance,
    TravelPermit,
    Other,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Emergency => "emergency",
            Self::RestDay => "rest_day",
            Self::Mission => "mission",
            Self::MorningPermission => "morning_permission",
            Self::EveningPermission => "evening_permission",
            Self::TrainingMission => "training_mission",
            Self::Sick => "sick",
            Self::Insurance => "insurance",
            Self::TravelPermit => "travel_permit",
            Self::Other => "other",
        }
    }
}

/// 审批状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// 考勤记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 考勤状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    OnLeave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::OnLeave => "on_leave",
        }
    }
}

/// 后台管理用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub center_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 管理员角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Manager,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

/// 站内通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_type: RecipientType,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 通知接收方类别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Admin,
    Doctor,
    Patient,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        }
    }
}

/// 通知类别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Call,
    Alert,
    Request,
    Approval,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Alert => "alert",
            Self::Request => "request",
            Self::Approval => "approval",
            Self::System => "system",
        }
    }
}
