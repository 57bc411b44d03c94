//! 行变更事件定义
//!
//! 把数据库的行级变更建模为带标签的变体 {table, op, before?, after?}，
//! 订阅端按表与操作类型做类型化分发，避免散落的字段探测。

use qms_core::{Clinic, QueueCall};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件来源表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Centers,
    Screens,
    Clinics,
    QueueCalls,
    Doctors,
    Patients,
    Appointments,
    Consultations,
    Complaints,
    LeaveRequests,
    AttendanceRecords,
    Notifications,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Centers => "centers",
            Self::Screens => "screens",
            Self::Clinics => "clinics",
            Self::QueueCalls => "queue_calls",
            Self::Doctors => "doctors",
            Self::Patients => "patients",
            Self::Appointments => "appointments",
            Self::Consultations => "consultations",
            Self::Complaints => "complaints",
            Self::LeaveRequests => "leave_requests",
            Self::AttendanceRecords => "attendance_records",
            Self::Notifications => "notifications",
        }
    }
}

/// 变更操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// 行变更事件
///
/// `clinic_scope` 是服务端过滤用的等值谓词键（clinics.id 或
/// queue_calls.clinic_id），与中心级广播的事件为 None。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: TableKind,
    pub op: ChangeOp,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_scope: Option<Uuid>,
}

impl ChangeEvent {
    /// 诊所行更新事件
    pub fn clinic_updated(before: Option<&Clinic>, after: &Clinic) -> Self {
        Self {
            table: TableKind::Clinics,
            op: ChangeOp::Update,
            before: before.and_then(|c| serde_json::to_value(c).ok()),
            after: serde_json::to_value(after).ok(),
            clinic_scope: Some(after.id),
        }
    }

    /// 叫号记录插入事件
    pub fn queue_call_inserted(call: &QueueCall) -> Self {
        Self {
            table: TableKind::QueueCalls,
            op: ChangeOp::Insert,
            before: None,
            after: serde_json::to_value(call).ok(),
            clinic_scope: Some(call.clinic_id),
        }
    }

    /// 叫号记录更新事件
    pub fn queue_call_updated(before: Option<&QueueCall>, after: &QueueCall) -> Self {
        Self {
            table: TableKind::QueueCalls,
            op: ChangeOp::Update,
            before: before.and_then(|c| serde_json::to_value(c).ok()),
            after: serde_json::to_value(after).ok(),
            clinic_scope: Some(after.clinic_id),
        }
    }

    /// 其余表的通用行事件
    pub fn row<T: Serialize>(table: TableKind, op: ChangeOp, before: Option<&T>, after: Option<&T>) -> Self {
        Self {
            table,
            op,
            before: before.and_then(|r| serde_json::to_value(r).ok()),
            after: after.and_then(|r| serde_json::to_value(r).ok()),
            clinic_scope: None,
        }
    }

    /// 解码更新后的诊所行
    pub fn clinic_after(&self) -> Option<Clinic> {
        if self.table != TableKind::Clinics {
            return None;
        }
        self.after
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 解码更新前的诊所行
    pub fn clinic_before(&self) -> Option<Clinic> {
        if self.table != TableKind::Clinics {
            return None;
        }
        self.before
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 解码插入/更新后的叫号记录
    pub fn queue_call_after(&self) -> Option<QueueCall> {
        if self.table != TableKind::QueueCalls {
            return None;
        }
        self.after
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 事件是否命中指定诊所的等值过滤
    pub fn matches_clinic(&self, clinic_id: Uuid) -> bool {
        self.clinic_scope == Some(clinic_id)
    }
}
