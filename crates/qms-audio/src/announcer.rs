//! 语音播报队列
//!
//! 严格按入队顺序逐条播放片段，互不重叠。单条片段加载或播放失败时
//! 跳过并继续下一条，坏文件不会阻塞整个队列。

use crate::clips::AudioClip;
use qms_core::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

/// 片段播放接口
///
/// 播放端由显示终端注入，测试中用假实现记录播放顺序。
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// 播放单个片段直至自然结束
    async fn play(&self, clip: &AudioClip) -> Result<()>;

    /// 立即中止当前片段
    async fn stop(&self);
}

/// 仅写日志的播放端，用于无声运行的服务进程
pub struct TracingSink;

#[async_trait::async_trait]
impl AudioSink for TracingSink {
    async fn play(&self, clip: &AudioClip) -> Result<()> {
        debug!("Playing audio clip: {} ({})", clip.name, clip.path);
        Ok(())
    }

    async fn stop(&self) {}
}

struct Inner {
    queue: VecDeque<AudioClip>,
    // stop() 递增代号，旧的播放任务据此退出
    epoch: u64,
}

/// 播报器
///
/// 显式构造、随显示页面生命周期创建和销毁，不依赖进程级单例。
/// 状态机：Idle → enqueue → Playing → 队列耗尽 → Idle。
pub struct Announcer {
    sink: Arc<dyn AudioSink>,
    inner: Arc<Mutex<Inner>>,
    playing_tx: watch::Sender<bool>,
    playing_rx: watch::Receiver<bool>,
}

impl Announcer {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        let (playing_tx, playing_rx) = watch::channel(false);
        Self {
            sink,
            inner: Arc::new(Mutex::new(Inner {
                queue: VecDeque::new(),
                epoch: 0,
            })),
            playing_tx,
            playing_rx,
        }
    }

    /// 入队单个片段；空闲时立即开始播放
    pub fn enqueue(&self, clip: AudioClip) {
        self.enqueue_all(vec![clip]);
    }

    /// 批量入队；正在播放时追加到队尾，播完当前片段后继续
    pub fn enqueue_all(&self, clips: Vec<AudioClip>) {
        if clips.is_empty() {
            return;
        }

        let epoch;
        let start_drain;
        {
            let mut inner = self.inner.lock().expect("announcer lock poisoned");
            inner.queue.extend(clips);
            epoch = inner.epoch;
            // borrow 与 send 都在锁内，避免两个入队者同时启动播放任务
            start_drain = !*self.playing_tx.borrow();
            if start_drain {
                let _ = self.playing_tx.send(true);
            }
        }

        if start_drain {
            let sink = self.sink.clone();
            let inner = self.inner.clone();
            let playing_tx = self.playing_tx.clone();
            tokio::spawn(async move {
                Self::drain(sink, inner, playing_tx, epoch).await;
            });
        }
    }

    async fn drain(
        sink: Arc<dyn AudioSink>,
        inner: Arc<Mutex<Inner>>,
        playing_tx: watch::Sender<bool>,
        epoch: u64,
    ) {
        loop {
            let clip = {
                let mut guard = inner.lock().expect("announcer lock poisoned");
                if guard.epoch != epoch {
                    // stop() 已作废本任务，播放标志由 stop() 负责复位
                    return;
                }
                match guard.queue.pop_front() {
                    Some(clip) => clip,
                    None => {
                        // 判空与标志复位在同一把锁内：此后入队的片段
                        // 看到 playing = false，会自行启动新的播放任务
                        let _ = playing_tx.send(false);
                        return;
                    }
                }
            };

            if let Err(e) = sink.play(&clip).await {
                warn!("Failed to play audio clip {}: {}", clip.path, e);
            }
        }
    }

    /// 立即停止播放并清空队列（紧急播报抢占普通播报时使用）
    pub async fn stop(&self) {
        {
            let mut inner = self.inner.lock().expect("announcer lock poisoned");
            inner.epoch += 1;
            inner.queue.clear();
        }
        self.sink.stop().await;
        let _ = self.playing_tx.send(false);
    }

    /// 当前待播片段数
    pub fn queue_len(&self) -> usize {
        self.inner.lock().expect("announcer lock poisoned").queue.len()
    }

    /// 是否正在播放
    pub fn is_playing(&self) -> bool {
        *self.playing_rx.borrow()
    }

    /// 等待队列播完回到空闲状态
    pub async fn wait_idle(&self) {
        let mut rx = self.playing_rx.clone();
        loop {
            if !*rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_core::QmsError;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// 记录播放顺序并检测重叠的假播放端
    struct RecordingSink {
        played: Mutex<Vec<String>>,
        active: AtomicBool,
        fail_on: Option<String>,
    }

    impl RecordingSink {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                played: Mutex::new(Vec::new()),
                active: AtomicBool::new(false),
                fail_on: fail_on.map(|s| s.to_string()),
            }
        }

        fn played(&self) -> Vec<String> {
            self.played.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AudioSink for RecordingSink {
        async fn play(&self, clip: &AudioClip) -> Result<()> {
            assert!(
                !self.active.swap(true, Ordering::SeqCst),
                "two clips playing concurrently"
            );
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.active.store(false, Ordering::SeqCst);

            if self.fail_on.as_deref() == Some(clip.name.as_str()) {
                return Err(QmsError::Audio(format!("load failed: {}", clip.path)));
            }
            self.played.lock().unwrap().push(clip.name.clone());
            Ok(())
        }

        async fn stop(&self) {}
    }

    fn clip(name: &str) -> AudioClip {
        AudioClip::new(name, format!("/audio/{name}.mp3"))
    }

    #[tokio::test]
    async fn test_clips_play_in_order_without_overlap() {
        let sink = Arc::new(RecordingSink::new(None));
        let announcer = Announcer::new(sink.clone());

        announcer.enqueue_all(vec![clip("a"), clip("b"), clip("c")]);
        announcer.wait_idle().await;

        assert_eq!(sink.played(), vec!["a", "b", "c"]);
        assert!(!announcer.is_playing());
        assert_eq!(announcer.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_failed_clip_is_skipped() {
        let sink = Arc::new(RecordingSink::new(Some("b")));
        let announcer = Announcer::new(sink.clone());

        announcer.enqueue_all(vec![clip("a"), clip("b"), clip("c")]);
        announcer.wait_idle().await;

        // b 播放失败被跳过，a 与 c 正常完成
        assert_eq!(sink.played(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_enqueue_while_playing_appends() {
        let sink = Arc::new(RecordingSink::new(None));
        let announcer = Announcer::new(sink.clone());

        announcer.enqueue_all(vec![clip("a"), clip("b")]);
        announcer.enqueue(clip("c"));
        announcer.wait_idle().await;

        assert_eq!(sink.played(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_back_to_back_enqueues_all_play() {
        // 队列耗尽与再次入队交错时不丢片段
        let sink = Arc::new(RecordingSink::new(None));
        let announcer = Announcer::new(sink.clone());

        for i in 0..30 {
            announcer.enqueue(clip(&format!("c{i}")));
            announcer.wait_idle().await;
        }

        assert_eq!(sink.played().len(), 30);
        assert_eq!(announcer.queue_len(), 0);
        assert!(!announcer.is_playing());
    }

    #[tokio::test]
    async fn test_stop_clears_pending_queue() {
        let sink = Arc::new(RecordingSink::new(None));
        let announcer = Announcer::new(sink.clone());

        announcer.enqueue_all(vec![clip("a"), clip("b"), clip("c"), clip("d")]);
        announcer.stop().await;

        assert_eq!(announcer.queue_len(), 0);
        assert!(!announcer.is_playing());

        // 等正在播的片段自然结束（假播放端不支持中断）
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // 停止后可以继续接收新的播报
        announcer.enqueue(clip("e"));
        announcer.wait_idle().await;
        assert!(sink.played().contains(&"e".to_string()));
    }
}
