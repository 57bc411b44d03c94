//! 队列持久化接口
//!
//! 引擎与存储之间的边界。计数器变更必须是存储端的原子条件更新，
//! 计数器与审计行在同一事务内提交，调用方不做读改写。

use chrono::Utc;
use qms_core::{CallStatus, Clinic, QueueCall, Result};
use uuid::Uuid;

/// 新叫号记录
#[derive(Debug, Clone)]
pub struct NewQueueCall {
    pub clinic_id: Uuid,
    pub patient_number: i32,
    pub is_emergency: bool,
    pub transferred_to_clinic_id: Option<Uuid>,
    pub status: CallStatus,
}

impl NewQueueCall {
    /// 普通叫号记录
    pub fn called(clinic_id: Uuid, patient_number: i32) -> Self {
        Self {
            clinic_id,
            patient_number,
            is_emergency: false,
            transferred_to_clinic_id: None,
            status: CallStatus::Called,
        }
    }

    /// 紧急叫号记录
    pub fn emergency(clinic_id: Uuid, patient_number: i32) -> Self {
        Self {
            is_emergency: true,
            ..Self::called(clinic_id, patient_number)
        }
    }

    /// 转诊记录
    pub fn transferred(clinic_id: Uuid, patient_number: i32, to_clinic_id: Uuid) -> Self {
        Self {
            transferred_to_clinic_id: Some(to_clinic_id),
            status: CallStatus::Transferred,
            ..Self::called(clinic_id, patient_number)
        }
    }
}

/// 一次计数器变更的前后快照与同事务写入的审计行
#[derive(Debug, Clone)]
pub struct QueueMutation {
    pub before: Clinic,
    pub after: Clinic,
    pub call: Option<QueueCall>,
}

/// 队列存储接口
///
/// 返回 `Ok(None)` 表示守卫条件未命中（停诊、计数已为零）或
/// 诊所不存在，由引擎补查后区分。
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync {
    /// 查询诊所
    async fn fetch_clinic(&self, clinic_id: Uuid) -> Result<Option<Clinic>>;

    /// 原子 +1，守卫 `is_active = TRUE`，同事务追加审计行并刷新叫号时间
    async fn advance(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>>;

    /// 原子 -1，守卫 `current_number > 0`；不追加审计行
    async fn recede(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>>;

    /// 无条件置为指定号码，同事务追加审计行
    async fn set_current(&self, clinic_id: Uuid, number: i32) -> Result<Option<QueueMutation>>;

    /// 置零；不追加审计行
    async fn reset(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>>;

    /// 设置接诊开关
    async fn set_active(&self, clinic_id: Uuid, active: bool) -> Result<Option<Clinic>>;

    /// 追加一条不改动计数器的审计行（紧急/转诊）
    async fn append_call(&self, call: NewQueueCall) -> Result<QueueCall>;

    /// 查询叫号记录
    async fn fetch_call(&self, call_id: Uuid) -> Result<Option<QueueCall>>;

    /// 更新叫号记录状态
    async fn update_call_status(
        &self,
        call_id: Uuid,
        status: CallStatus,
    ) -> Result<Option<QueueCall>>;

    /// 按诊所列出最近的叫号记录
    async fn list_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<QueueCall>>;
}

/// 内存存储
///
/// 引擎测试与本地演示用的参考实现，单把锁保证与数据库
/// 事务等价的原子性。
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        clinics: HashMap<Uuid, Clinic>,
        calls: Vec<QueueCall>,
    }

    pub struct MemoryQueueStore {
        state: Mutex<State>,
    }

    impl MemoryQueueStore {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State::default()),
            }
        }

        pub fn insert_clinic(&self, clinic: Clinic) {
            self.state
                .lock()
                .expect("store lock poisoned")
                .clinics
                .insert(clinic.id, clinic);
        }

        pub fn call_count(&self) -> usize {
            self.state.lock().expect("store lock poisoned").calls.len()
        }

        fn make_call(new_call: &NewQueueCall) -> QueueCall {
            let now = Utc::now();
            QueueCall {
                id: Uuid::new_v4(),
                clinic_id: new_call.clinic_id,
                patient_number: new_call.patient_number,
                called_at: now,
                is_emergency: new_call.is_emergency,
                transferred_to_clinic_id: new_call.transferred_to_clinic_id,
                status: new_call.status.clone(),
                created_at: now,
                updated_at: now,
            }
        }
    }

    impl Default for MemoryQueueStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait::async_trait]
    impl QueueStore for MemoryQueueStore {
        async fn fetch_clinic(&self, clinic_id: Uuid) -> Result<Option<Clinic>> {
            let state = self.state.lock().expect("store lock poisoned");
            Ok(state.clinics.get(&clinic_id).cloned())
        }

        async fn advance(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(clinic) = state.clinics.get_mut(&clinic_id) else {
                return Ok(None);
            };
            if !clinic.is_active {
                return Ok(None);
            }

            let before = clinic.clone();
            clinic.current_number += 1;
            clinic.last_call_time = Some(Utc::now());
            clinic.updated_at = Utc::now();
            let after = clinic.clone();

            let call = Self::make_call(&NewQueueCall::called(clinic_id, after.current_number));
            state.calls.push(call.clone());

            Ok(Some(QueueMutation {
                before,
                after,
                call: Some(call),
            }))
        }

        async fn recede(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(clinic) = state.clinics.get_mut(&clinic_id) else {
                return Ok(None);
            };
            if clinic.current_number <= 0 {
                return Ok(None);
            }

            let before = clinic.clone();
            clinic.current_number -= 1;
            clinic.updated_at = Utc::now();
            let after = clinic.clone();

            Ok(Some(QueueMutation {
                before,
                after,
                call: None,
            }))
        }

        async fn set_current(&self, clinic_id: Uuid, number: i32) -> Result<Option<QueueMutation>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(clinic) = state.clinics.get_mut(&clinic_id) else {
                return Ok(None);
            };

            let before = clinic.clone();
            clinic.current_number = number;
            clinic.last_call_time = Some(Utc::now());
            clinic.updated_at = Utc::now();
            let after = clinic.clone();

            let call = Self::make_call(&NewQueueCall::called(clinic_id, number));
            state.calls.push(call.clone());

            Ok(Some(QueueMutation {
                before,
                after,
                call: Some(call),
            }))
        }

        async fn reset(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(clinic) = state.clinics.get_mut(&clinic_id) else {
                return Ok(None);
            };

            let before = clinic.clone();
            clinic.current_number = 0;
            clinic.updated_at = Utc::now();
            let after = clinic.clone();

            Ok(Some(QueueMutation {
                before,
                after,
                call: None,
            }))
        }

        async fn set_active(&self, clinic_id: Uuid, active: bool) -> Result<Option<Clinic>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(clinic) = state.clinics.get_mut(&clinic_id) else {
                return Ok(None);
            };
            clinic.is_active = active;
            clinic.updated_at = Utc::now();
            Ok(Some(clinic.clone()))
        }

        async fn append_call(&self, new_call: NewQueueCall) -> Result<QueueCall> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let call = Self::make_call(&new_call);
            state.calls.push(call.clone());
            Ok(call)
        }

        async fn fetch_call(&self, call_id: Uuid) -> Result<Option<QueueCall>> {
            let state = self.state.lock().expect("store lock poisoned");
            Ok(state.calls.iter().find(|c| c.id == call_id).cloned())
        }

        async fn update_call_status(
            &self,
            call_id: Uuid,
            status: CallStatus,
        ) -> Result<Option<QueueCall>> {
            let mut state = self.state.lock().expect("store lock poisoned");
            let Some(call) = state.calls.iter_mut().find(|c| c.id == call_id) else {
                return Ok(None);
            };
            call.status = status;
            call.updated_at = Utc::now();
            Ok(Some(call.clone()))
        }

        async fn list_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<QueueCall>> {
            let state = self.state.lock().expect("store lock poisoned");
            let mut calls: Vec<QueueCall> = state
                .calls
                .iter()
                .filter(|c| c.clinic_id == clinic_id)
                .cloned()
                .collect();
            calls.sort_by(|a, b| b.called_at.cmp(&a.called_at));
            calls.truncate(limit as usize);
            Ok(calls)
        }
    }
}
