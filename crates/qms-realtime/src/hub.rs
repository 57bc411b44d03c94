//! 实时事件分发中心
//!
//! 队列引擎提交写入后把行变更事件广播给所有订阅端（控制台、
//! 显示屏、客户页面）。推送语义为至少一次、按投递顺序消费，
//! 订阅端不做去重。

use crate::events::ChangeEvent;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// 事件分发中心
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 广播一条变更事件，返回收到事件的订阅端数量
    ///
    /// 没有订阅端时事件直接丢弃，发布方不失败。
    pub fn publish(&self, event: ChangeEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                debug!("No realtime subscribers, event dropped");
                0
            }
        }
    }

    /// 订阅全部事件
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
            clinic_filter: None,
        }
    }

    /// 按诊所等值谓词订阅（clinics.id / queue_calls.clinic_id）
    pub fn subscribe_clinic(&self, clinic_id: Uuid) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
            clinic_filter: Some(clinic_id),
        }
    }

    /// 当前订阅端数量
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// 订阅流
///
/// drop 即退订，随页面组件一起销毁避免泄漏通道。
pub struct EventStream {
    rx: broadcast::Receiver<ChangeEvent>,
    clinic_filter: Option<Uuid>,
}

impl EventStream {
    /// 接收下一条命中过滤条件的事件；通道关闭返回 None
    ///
    /// 消费滞后导致的丢帧只记日志，继续消费后续事件。
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(clinic_id) = self.clinic_filter {
                        if !event.matches_clinic(clinic_id) {
                            continue;
                        }
                    }
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Realtime subscriber lagged, {} events dropped", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChangeOp, TableKind};
    use qms_core::{CallStatus, QueueCall};

    fn call(clinic_id: Uuid) -> QueueCall {
        let now = chrono::Utc::now();
        QueueCall {
            id: Uuid::new_v4(),
            clinic_id,
            patient_number: 1,
            called_at: now,
            is_emergency: false,
            transferred_to_clinic_id: None,
            status: CallStatus::Called,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = RealtimeHub::new();
        assert_eq!(hub.publish(ChangeEvent::queue_call_inserted(&call(Uuid::new_v4()))), 0);
    }

    #[tokio::test]
    async fn test_clinic_filter_drops_other_clinics() {
        let hub = RealtimeHub::new();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut stream = hub.subscribe_clinic(mine);
        hub.publish(ChangeEvent::queue_call_inserted(&call(other)));
        hub.publish(ChangeEvent::queue_call_inserted(&call(mine)));

        let event = stream.recv().await.expect("event");
        assert_eq!(event.table, TableKind::QueueCalls);
        assert_eq!(event.op, ChangeOp::Insert);
        assert!(event.matches_clinic(mine));
    }

    #[tokio::test]
    async fn test_fanout_reaches_all_subscribers() {
        let hub = RealtimeHub::new();
        let clinic_id = Uuid::new_v4();
        let mut a = hub.subscribe_clinic(clinic_id);
        let mut b = hub.subscribe();

        let delivered = hub.publish(ChangeEvent::queue_call_inserted(&call(clinic_id)));
        assert_eq!(delivered, 2);
        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
    }
}
