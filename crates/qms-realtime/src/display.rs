//! 显示屏消费端
//!
//! 把行变更事件转为显示屏本地状态：当前叫号、最近叫号列表、
//! 临时可视提醒，并在号码变化时触发语音播报。
//!
//! 事件按投递顺序无条件套用（last-applied-wins）。通道是至少一次
//! 投递且本端不去重，同一事件重复投递会重复触发播报。

use crate::events::{ChangeEvent, ChangeOp, TableKind};
use chrono::{DateTime, Duration, Utc};
use qms_audio::{Announcer, ClipLibrary};
use qms_core::{Clinic, QueueCall};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 最近叫号列表保留的最大条数，与快照接口的默认条数一致
const RECENT_CALLS_CAP: usize = 20;

/// 可视提醒
#[derive(Debug, Clone)]
pub struct BoardNotification {
    pub message: String,
    pub is_emergency: bool,
    pub expires_at: DateTime<Utc>,
}

/// 显示屏读模型
///
/// 随显示页面构造与销毁；drop 时其订阅流一并释放。
pub struct DisplayConsumer {
    clinic: Option<Clinic>,
    recent_calls: Vec<QueueCall>,
    notifications: Vec<BoardNotification>,
    announcer: Arc<Announcer>,
    clips: ClipLibrary,
    alert_duration: Duration,
    emergency_duration: Duration,
}

impl DisplayConsumer {
    /// `alert_secs` 来自中心配置 `alert_duration`，默认5秒；
    /// 紧急提醒固定为普通时长的两倍（默认10秒）。
    pub fn new(
        initial: Option<Clinic>,
        announcer: Arc<Announcer>,
        clips: ClipLibrary,
        alert_secs: i64,
    ) -> Self {
        Self {
            clinic: initial,
            recent_calls: Vec::new(),
            notifications: Vec::new(),
            announcer,
            clips,
            alert_duration: Duration::seconds(alert_secs),
            emergency_duration: Duration::seconds(alert_secs * 2),
        }
    }

    /// 套用一条投递到本端的事件
    pub async fn apply(&mut self, event: &ChangeEvent, now: DateTime<Utc>) {
        match (event.table, event.op) {
            (TableKind::Clinics, ChangeOp::Update) => {
                if let Some(after) = event.clinic_after() {
                    self.apply_clinic_update(event.clinic_before(), after, now);
                }
            }
            (TableKind::QueueCalls, ChangeOp::Insert) => {
                if let Some(call) = event.queue_call_after() {
                    self.apply_call_insert(call, now).await;
                }
            }
            (TableKind::QueueCalls, ChangeOp::Update) => {
                if let Some(call) = event.queue_call_after() {
                    if let Some(existing) =
                        self.recent_calls.iter_mut().find(|c| c.id == call.id)
                    {
                        *existing = call;
                    }
                }
            }
            (TableKind::QueueCalls, ChangeOp::Delete) => {
                if let Some(before) = event.before.as_ref() {
                    if let Ok(call) = serde_json::from_value::<QueueCall>(before.clone()) {
                        self.recent_calls.retain(|c| c.id != call.id);
                    }
                }
            }
            _ => debug!("Display ignoring event for table {}", event.table.as_str()),
        }
    }

    // 变更判断基于事件携带的前后快照；通道重复投递会重复触发播报
    fn apply_clinic_update(
        &mut self,
        before: Option<Clinic>,
        after: Clinic,
        now: DateTime<Utc>,
    ) {
        let number_changed = before
            .map(|prev| prev.current_number != after.current_number)
            .unwrap_or(false);

        if number_changed && after.current_number > 0 {
            self.announcer.enqueue_all(
                self.clips
                    .patient_call_sequence(after.current_number, after.clinic_number),
            );
            self.notifications.push(BoardNotification {
                message: format!(
                    "العميل رقم {} - {}",
                    qms_core::arabic::number_to_arabic(after.current_number),
                    after.name
                ),
                is_emergency: false,
                expires_at: now + self.alert_duration,
            });
        }

        // 无条件套用新行，后到的状态覆盖先到的
        self.clinic = Some(after);
    }

    async fn apply_call_insert(&mut self, call: QueueCall, now: DateTime<Utc>) {
        if call.is_emergency {
            // 紧急播报抢占正在进行的普通播报
            self.announcer.stop().await;
            self.announcer.enqueue_all(self.clips.emergency_sequence());
            self.notifications.push(BoardNotification {
                message: "🚨 نداء طوارئ".to_string(),
                is_emergency: true,
                expires_at: now + self.emergency_duration,
            });
        }
        self.recent_calls.push(call);
        // 只保留最新的一页，旧记录从头部淘汰
        if self.recent_calls.len() > RECENT_CALLS_CAP {
            let overflow = self.recent_calls.len() - RECENT_CALLS_CAP;
            self.recent_calls.drain(..overflow);
        }
    }

    /// 清理到期的可视提醒
    pub fn expire_notifications(&mut self, now: DateTime<Utc>) {
        self.notifications.retain(|n| n.expires_at > now);
    }

    pub fn clinic(&self) -> Option<&Clinic> {
        self.clinic.as_ref()
    }

    pub fn current_number(&self) -> i32 {
        self.clinic.as_ref().map(|c| c.current_number).unwrap_or(0)
    }

    pub fn recent_calls(&self) -> &[QueueCall] {
        &self.recent_calls
    }

    pub fn notifications(&self) -> &[BoardNotification] {
        &self.notifications
    }
}

/// 便捷函数：为指定诊所跑一个显示端消费循环
///
/// 订阅流耗尽（hub 被销毁）时返回。
pub async fn run_display_loop(
    mut stream: crate::hub::EventStream,
    mut consumer: DisplayConsumer,
) {
    while let Some(event) = stream.recv().await {
        let now = Utc::now();
        consumer.apply(&event, now).await;
        consumer.expire_notifications(now);
    }
    debug!("Display loop terminated, channel closed");
}

/// 显示屏消费端的订阅入口
pub fn subscribe_display(
    hub: &crate::hub::RealtimeHub,
    clinic_id: Uuid,
) -> crate::hub::EventStream {
    hub.subscribe_clinic(clinic_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_audio::{AudioClip, AudioSink};
    use qms_core::{CallStatus, QmsError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSink {
        played: Mutex<Vec<String>>,
        stops: AtomicUsize,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                played: Mutex::new(Vec::new()),
                stops: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl AudioSink for CountingSink {
        async fn play(&self, clip: &AudioClip) -> Result<()> {
            self.played.lock().unwrap().push(clip.name.clone());
            Ok(())
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn clinic(number: i32) -> Clinic {
        let now = Utc::now();
        Clinic {
            id: Uuid::new_v4(),
            center_id: Uuid::new_v4(),
            name: "الأسنان".to_string(),
            clinic_number: 3,
            screen_ids: vec![1],
            password: "1234".to_string(),
            current_number: number,
            is_active: true,
            last_call_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn consumer_with_sink(initial: Option<Clinic>) -> (DisplayConsumer, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink::new());
        let announcer = Arc::new(Announcer::new(sink.clone()));
        let consumer = DisplayConsumer::new(initial, announcer, ClipLibrary::new("/audio"), 5);
        (consumer, sink)
    }

    #[tokio::test]
    async fn test_number_change_triggers_announcement_and_notification() {
        let before = clinic(12);
        let mut after = before.clone();
        after.current_number = 13;

        let (mut consumer, sink) = consumer_with_sink(Some(before.clone()));
        let now = Utc::now();
        consumer
            .apply(&ChangeEvent::clinic_updated(Some(&before), &after), now)
            .await;
        consumer.announcer.wait_idle().await;

        assert_eq!(consumer.current_number(), 13);
        assert_eq!(
            *sink.played.lock().unwrap(),
            vec!["ding", "patient_number", "clinic_name"]
        );
        let notes = consumer.notifications();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].is_emergency);
        assert_eq!(notes[0].expires_at, now + Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_applies_last_wins() {
        // 通道是至少一次投递且本端不去重：同一事件重复投递会重复
        // 触发播报（已知缺口），但状态套用是 last-applied-wins，终态一致。
        let before = clinic(12);
        let mut after = before.clone();
        after.current_number = 13;
        let event = ChangeEvent::clinic_updated(Some(&before), &after);

        let (mut consumer, sink) = consumer_with_sink(Some(before));
        let now = Utc::now();
        consumer.apply(&event, now).await;
        consumer.apply(&event, now).await;
        consumer.announcer.wait_idle().await;

        assert_eq!(consumer.current_number(), 13);
        assert_eq!(sink.played.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unchanged_number_does_not_announce() {
        let before = clinic(12);
        let mut after = before.clone();
        after.is_active = false;

        let (mut consumer, sink) = consumer_with_sink(Some(before.clone()));
        consumer
            .apply(&ChangeEvent::clinic_updated(Some(&before), &after), Utc::now())
            .await;

        assert!(sink.played.lock().unwrap().is_empty());
        assert!(!consumer.clinic().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_emergency_insert_preempts_and_alerts() {
        let c = clinic(12);
        let now = Utc::now();
        let call = QueueCall {
            id: Uuid::new_v4(),
            clinic_id: c.id,
            patient_number: 12,
            called_at: now,
            is_emergency: true,
            transferred_to_clinic_id: None,
            status: CallStatus::Called,
            created_at: now,
            updated_at: now,
        };

        let (mut consumer, sink) = consumer_with_sink(Some(c));
        consumer
            .apply(&ChangeEvent::queue_call_inserted(&call), now)
            .await;
        consumer.announcer.wait_idle().await;

        // 计数器不变，抢占了播放，紧急提醒窗口为普通的两倍
        assert_eq!(consumer.current_number(), 12);
        assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
        assert_eq!(
            *sink.played.lock().unwrap(),
            vec!["emergency", "emergency", "emergency"]
        );
        let notes = consumer.notifications();
        assert!(notes[0].is_emergency);
        assert_eq!(notes[0].expires_at, now + Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_recent_calls_keep_newest_entries() {
        let c = clinic(1);
        let (mut consumer, _sink) = consumer_with_sink(Some(c.clone()));
        let now = Utc::now();

        for n in 1..=25 {
            let call = QueueCall {
                id: Uuid::new_v4(),
                clinic_id: c.id,
                patient_number: n,
                called_at: now,
                is_emergency: false,
                transferred_to_clinic_id: None,
                status: CallStatus::Called,
                created_at: now,
                updated_at: now,
            };
            consumer
                .apply(&ChangeEvent::queue_call_inserted(&call), now)
                .await;
        }

        // 长时间运行的显示端不无限累积，只保留最新一页
        let recent = consumer.recent_calls();
        assert_eq!(recent.len(), RECENT_CALLS_CAP);
        assert_eq!(recent[0].patient_number, 6);
        assert_eq!(recent[recent.len() - 1].patient_number, 25);
    }

    #[tokio::test]
    async fn test_notifications_expire() {
        let before = clinic(1);
        let mut after = before.clone();
        after.current_number = 2;

        let (mut consumer, _sink) = consumer_with_sink(Some(before.clone()));
        let now = Utc::now();
        consumer
            .apply(&ChangeEvent::clinic_updated(Some(&before), &after), now)
            .await;
        assert_eq!(consumer.notifications().len(), 1);

        consumer.expire_notifications(now + Duration::seconds(6));
        assert!(consumer.notifications().is_empty());
    }
}
