/// 订阅统计 (每话题)
/// Per-topic counters, readable from any thread
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::debug;

#[derive(Debug)]
pub struct SubscriberStats {
    topic: String,
    received: AtomicU64,
    rendered: AtomicU64,
    malformed: AtomicU64,   // 解析/解码失败被丢弃
    queue_dropped: AtomicU64, // 队列满被丢弃
    fps: Mutex<FpsCounter>,
}

/// 快照,便于日志与测试比较
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub rendered: u64,
    pub malformed: u64,
    pub queue_dropped: u64,
    pub receive_fps: f64,
}

#[derive(Debug)]
struct FpsCounter {
    count: usize,
    last: Instant,
    current_fps: f64,
}

impl SubscriberStats {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            received: AtomicU64::new(0),
            rendered: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            queue_dropped: AtomicU64::new(0),
            fps: Mutex::new(FpsCounter {
                count: 0,
                last: Instant::now(),
                current_fps: 0.0,
            }),
        }
    }

    /// 每秒打印一次接收统计
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let Ok(mut fps) = self.fps.lock() else {
            return;
        };
        fps.count += 1;
        let elapsed = fps.last.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            fps.current_fps = fps.count as f64 / elapsed;
            debug!(
                "📺 {} 接收统计: {}帧 | 实际{:.1}fps",
                self.topic, fps.count, fps.current_fps
            );
            fps.last = Instant::now();
            fps.count = 0;
        }
    }

    pub fn record_rendered(&self) {
        self.rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_dropped(&self) {
        self.queue_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            rendered: self.rendered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            queue_dropped: self.queue_dropped.load(Ordering::Relaxed),
            receive_fps: self.fps.lock().map(|f| f.current_fps).unwrap_or(0.0),
        }
    }
}
