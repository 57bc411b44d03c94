//! 队列引擎
//!
//! 诊所当前叫号的唯一写入方。每个操作委托存储层的原子条件更新，
//! 提交成功后把行变更事件广播给实时分发中心。

use crate::state_machine::{CallEvent, CallStateMachine};
use crate::store::{NewQueueCall, QueueMutation, QueueStore};
use qms_core::{CallStatus, Clinic, QmsError, QueueCall, Result};
use qms_realtime::{ChangeEvent, RealtimeHub};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 队列引擎
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    hub: RealtimeHub,
    state_machine: CallStateMachine,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn QueueStore>, hub: RealtimeHub) -> Self {
        Self {
            store,
            hub,
            state_machine: CallStateMachine::new(),
        }
    }

    pub fn hub(&self) -> &RealtimeHub {
        &self.hub
    }

    /// 叫下一号
    ///
    /// 要求诊所接诊中；计数器 +1 与审计行在存储端同事务提交。
    pub async fn advance(&self, clinic_id: Uuid) -> Result<QueueMutation> {
        match self.store.advance(clinic_id).await? {
            Some(mutation) => {
                info!(
                    "Clinic {} advanced to number {}",
                    mutation.after.name, mutation.after.current_number
                );
                self.publish_mutation(&mutation);
                Ok(mutation)
            }
            None => Err(self.closed_or_missing(clinic_id).await?),
        }
    }

    /// 回退一号
    ///
    /// 计数器已为零时是空操作，不发起任何写入，返回 None。
    pub async fn recede(&self, clinic_id: Uuid) -> Result<Option<QueueMutation>> {
        match self.store.recede(clinic_id).await? {
            Some(mutation) => {
                info!(
                    "Clinic {} receded to number {}",
                    mutation.after.name, mutation.after.current_number
                );
                self.publish_mutation(&mutation);
                Ok(Some(mutation))
            }
            None => {
                if self.store.fetch_clinic(clinic_id).await?.is_none() {
                    return Err(QmsError::NotFound(format!("clinic {}", clinic_id)));
                }
                Ok(None)
            }
        }
    }

    /// 叫指定号码（人工干预，不校验号码是否发放过）
    pub async fn call_specific(&self, clinic_id: Uuid, number: i32) -> Result<QueueMutation> {
        if number < 0 {
            return Err(QmsError::Validation(format!(
                "patient number must be non-negative, got {}",
                number
            )));
        }

        match self.store.set_current(clinic_id, number).await? {
            Some(mutation) => {
                info!("Clinic {} called number {}", mutation.after.name, number);
                self.publish_mutation(&mutation);
                Ok(mutation)
            }
            None => Err(QmsError::NotFound(format!("clinic {}", clinic_id))),
        }
    }

    /// 计数器清零；不追加审计行
    pub async fn reset(&self, clinic_id: Uuid) -> Result<Clinic> {
        match self.store.reset(clinic_id).await? {
            Some(mutation) => {
                info!("Clinic {} queue reset", mutation.after.name);
                self.publish_mutation(&mutation);
                Ok(mutation.after)
            }
            None => Err(QmsError::NotFound(format!("clinic {}", clinic_id))),
        }
    }

    /// 切换接诊开关，返回新状态
    pub async fn toggle_active(&self, clinic_id: Uuid) -> Result<Clinic> {
        let clinic = self
            .store
            .fetch_clinic(clinic_id)
            .await?
            .ok_or_else(|| QmsError::NotFound(format!("clinic {}", clinic_id)))?;

        let updated = self
            .store
            .set_active(clinic_id, !clinic.is_active)
            .await?
            .ok_or_else(|| QmsError::NotFound(format!("clinic {}", clinic_id)))?;

        info!(
            "Clinic {} is now {}",
            updated.name,
            if updated.is_active { "open" } else { "closed" }
        );
        self.hub
            .publish(ChangeEvent::clinic_updated(Some(&clinic), &updated));
        Ok(updated)
    }

    /// 紧急呼叫：只追加标记行并广播，不改动计数器
    pub async fn emergency(&self, clinic_id: Uuid, patient_number: i32) -> Result<QueueCall> {
        if self.store.fetch_clinic(clinic_id).await?.is_none() {
            return Err(QmsError::NotFound(format!("clinic {}", clinic_id)));
        }

        let call = self
            .store
            .append_call(NewQueueCall::emergency(clinic_id, patient_number))
            .await?;
        warn!(
            "Emergency call issued for clinic {} number {}",
            clinic_id, patient_number
        );
        self.hub.publish(ChangeEvent::queue_call_inserted(&call));
        Ok(call)
    }

    /// 转诊：追加转诊记录，两边诊所的计数器都不动，
    /// 接收方需要自行叫号。
    pub async fn transfer(
        &self,
        clinic_id: Uuid,
        patient_number: i32,
        to_clinic_id: Uuid,
    ) -> Result<QueueCall> {
        if clinic_id == to_clinic_id {
            return Err(QmsError::Validation(
                "cannot transfer a patient to the same clinic".to_string(),
            ));
        }
        if self.store.fetch_clinic(clinic_id).await?.is_none() {
            return Err(QmsError::NotFound(format!("clinic {}", clinic_id)));
        }
        if self.store.fetch_clinic(to_clinic_id).await?.is_none() {
            return Err(QmsError::NotFound(format!("clinic {}", to_clinic_id)));
        }

        let call = self
            .store
            .append_call(NewQueueCall::transferred(
                clinic_id,
                patient_number,
                to_clinic_id,
            ))
            .await?;
        info!(
            "Patient {} transferred from clinic {} to {}",
            patient_number, clinic_id, to_clinic_id
        );
        self.hub.publish(ChangeEvent::queue_call_inserted(&call));
        Ok(call)
    }

    /// 结束就诊：Called → Completed，转换合法性由状态机裁决
    pub async fn complete(&self, call_id: Uuid) -> Result<QueueCall> {
        let call = self
            .store
            .fetch_call(call_id)
            .await?
            .ok_or_else(|| QmsError::NotFound(format!("queue call {}", call_id)))?;

        let next = self
            .state_machine
            .transition(&call.status, &CallEvent::Complete)?;
        let updated = self
            .store
            .update_call_status(call_id, next)
            .await?
            .ok_or_else(|| QmsError::NotFound(format!("queue call {}", call_id)))?;

        self.hub
            .publish(ChangeEvent::queue_call_updated(Some(&call), &updated));
        Ok(updated)
    }

    /// 当前状态与最近叫号记录
    pub async fn snapshot(&self, clinic_id: Uuid, limit: i64) -> Result<(Clinic, Vec<QueueCall>)> {
        if limit < 0 {
            return Err(QmsError::Validation(format!(
                "limit must be non-negative, got {}",
                limit
            )));
        }
        let clinic = self
            .store
            .fetch_clinic(clinic_id)
            .await?
            .ok_or_else(|| QmsError::NotFound(format!("clinic {}", clinic_id)))?;
        let calls = self.store.list_calls(clinic_id, limit).await?;
        Ok((clinic, calls))
    }

    fn publish_mutation(&self, mutation: &QueueMutation) {
        self.hub.publish(ChangeEvent::clinic_updated(
            Some(&mutation.before),
            &mutation.after,
        ));
        if let Some(call) = &mutation.call {
            self.hub.publish(ChangeEvent::queue_call_inserted(call));
        }
    }

    async fn closed_or_missing(&self, clinic_id: Uuid) -> Result<QmsError> {
        match self.store.fetch_clinic(clinic_id).await? {
            Some(clinic) => Ok(QmsError::ClinicClosed(clinic.name)),
            None => Ok(QmsError::NotFound(format!("clinic {}", clinic_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryQueueStore;
    use chrono::Utc;

    fn clinic(number: i32, active: bool) -> Clinic {
        let now = Utc::now();
        Clinic {
            id: Uuid::new_v4(),
            center_id: Uuid::new_v4(),
            name: "الأسنان".to_string(),
            clinic_number: 1,
            screen_ids: vec![1, 2],
            password: "1234".to_string(),
            current_number: number,
            is_active: active,
            last_call_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn engine_with(clinics: Vec<Clinic>) -> (QueueEngine, Arc<MemoryQueueStore>) {
        let store = Arc::new(MemoryQueueStore::new());
        for c in clinics {
            store.insert_clinic(c);
        }
        let engine = QueueEngine::new(store.clone(), RealtimeHub::new());
        (engine, store)
    }

    #[tokio::test]
    async fn test_advance_increments_and_logs_one_call() {
        let c = clinic(4, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        let mutation = engine.advance(id).await.unwrap();

        assert_eq!(mutation.before.current_number, 4);
        assert_eq!(mutation.after.current_number, 5);
        assert!(mutation.after.last_call_time.is_some());
        let call = mutation.call.unwrap();
        assert_eq!(call.patient_number, 5);
        assert_eq!(call.status, CallStatus::Called);
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_three_advances_from_twelve() {
        // 场景：诊所从12号开始连叫三次
        let c = clinic(12, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        for _ in 0..3 {
            engine.advance(id).await.unwrap();
        }

        let (clinic, calls) = engine.snapshot(id, 10).await.unwrap();
        assert_eq!(clinic.current_number, 15);
        assert_eq!(store.call_count(), 3);
        let mut numbers: Vec<i32> = calls.iter().map(|c| c.patient_number).collect();
        numbers.sort();
        assert_eq!(numbers, vec![13, 14, 15]);
    }

    #[tokio::test]
    async fn test_snapshot_rejects_negative_limit() {
        let c = clinic(5, true);
        let id = c.id;
        let (engine, _store) = engine_with(vec![c]);

        let err = engine.snapshot(id, -1).await.unwrap_err();
        assert!(matches!(err, QmsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_advance_rejected_when_closed() {
        let c = clinic(7, false);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        let err = engine.advance(id).await.unwrap_err();
        assert!(matches!(err, QmsError::ClinicClosed(_)));

        // 计数器未变，也没有写入审计行
        let (clinic, _) = engine.snapshot(id, 10).await.unwrap();
        assert_eq!(clinic.current_number, 7);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recede_is_noop_at_zero() {
        let c = clinic(0, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        let result = engine.recede(id).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recede_decrements_without_audit_row() {
        let c = clinic(9, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        let mutation = engine.recede(id).await.unwrap().unwrap();
        assert_eq!(mutation.after.current_number, 8);
        assert!(mutation.call.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_call_specific_sets_exact_number() {
        let c = clinic(20, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        // 回叫比当前小的号码也允许
        let mutation = engine.call_specific(id, 6).await.unwrap();
        assert_eq!(mutation.after.current_number, 6);
        assert_eq!(mutation.call.unwrap().patient_number, 6);
        assert_eq!(store.call_count(), 1);

        let err = engine.call_specific(id, -1).await.unwrap_err();
        assert!(matches!(err, QmsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_zeroes_without_audit_row() {
        let c = clinic(42, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);

        let clinic = engine.reset(id).await.unwrap();
        assert_eq!(clinic.current_number, 0);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_emergency_keeps_counter_and_inserts_flagged_row() {
        let c = clinic(12, true);
        let id = c.id;
        let (engine, store) = engine_with(vec![c]);
        let mut stream = engine.hub().subscribe_clinic(id);

        let call = engine.emergency(id, 12).await.unwrap();
        assert!(call.is_emergency);
        assert_eq!(store.call_count(), 1);

        let (clinic, _) = engine.snapshot(id, 10).await.unwrap();
        assert_eq!(clinic.current_number, 12);

        // 订阅端收到紧急插入事件
        let event = stream.recv().await.unwrap();
        let received = event.queue_call_after().unwrap();
        assert!(received.is_emergency);
    }

    #[tokio::test]
    async fn test_transfer_appends_row_and_keeps_both_counters() {
        let from = clinic(5, true);
        let to = clinic(9, true);
        let (from_id, to_id) = (from.id, to.id);
        let (engine, _store) = engine_with(vec![from, to]);

        let call = engine.transfer(from_id, 5, to_id).await.unwrap();
        assert_eq!(call.status, CallStatus::Transferred);
        assert_eq!(call.transferred_to_clinic_id, Some(to_id));

        let (from_clinic, _) = engine.snapshot(from_id, 10).await.unwrap();
        let (to_clinic, _) = engine.snapshot(to_id, 10).await.unwrap();
        assert_eq!(from_clinic.current_number, 5);
        assert_eq!(to_clinic.current_number, 9);

        let err = engine.transfer(from_id, 5, from_id).await.unwrap_err();
        assert!(matches!(err, QmsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_toggle_active_flips_and_broadcasts() {
        let c = clinic(3, true);
        let id = c.id;
        let (engine, _store) = engine_with(vec![c]);
        let mut stream = engine.hub().subscribe_clinic(id);

        let updated = engine.toggle_active(id).await.unwrap();
        assert!(!updated.is_active);

        let event = stream.recv().await.unwrap();
        assert!(!event.clinic_after().unwrap().is_active);

        let updated = engine.toggle_active(id).await.unwrap();
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn test_complete_transitions_called_row() {
        let c = clinic(1, true);
        let id = c.id;
        let (engine, _store) = engine_with(vec![c]);

        let mutation = engine.advance(id).await.unwrap();
        let call = mutation.call.unwrap();

        let completed = engine.complete(call.id).await.unwrap();
        assert_eq!(completed.status, CallStatus::Completed);

        // 已完成的记录不能再次完成
        let err = engine.complete(call.id).await.unwrap_err();
        assert!(matches!(err, QmsError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_advance_broadcasts_update_then_insert() {
        let c = clinic(2, true);
        let id = c.id;
        let (engine, _store) = engine_with(vec![c]);
        let mut stream = engine.hub().subscribe_clinic(id);

        engine.advance(id).await.unwrap();

        let first = stream.recv().await.unwrap();
        let clinic_after = first.clinic_after().unwrap();
        assert_eq!(clinic_after.current_number, 3);
        assert_eq!(first.clinic_before().unwrap().current_number, 2);

        let second = stream.recv().await.unwrap();
        assert_eq!(second.queue_call_after().unwrap().patient_number, 3);
    }
}
