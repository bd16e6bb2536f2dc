/// 每主题有界帧队列 (TopicQueue)
/// Bounded per-topic hand-off between a subscriber and the display
///
/// 满队列时丢弃新帧 (drop-newest),不阻塞订阅线程。
/// 容量检查与入队由 crossbeam 有界通道一步完成。
pub mod registry;

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use image::RgbImage;
use tracing::warn;

pub use registry::TopicQueues;

/// 原始程序每主题队列长度
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// 已叠加完成的一帧
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub topic: String,
    pub image: RgbImage,
    pub sequence: u64, // 主题内帧序号
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    Dropped,
}

#[derive(Debug)]
pub struct TopicQueue {
    topic: String,
    capacity: usize,
    tx: Sender<AnnotatedFrame>,
    rx: Receiver<AnnotatedFrame>,
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
}

impl TopicQueue {
    /// 容量至少为 1
    pub fn new(topic: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            topic: topic.into(),
            capacity,
            tx,
            rx,
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 非阻塞入队,满则丢弃本帧
    pub fn push(&self, frame: AnnotatedFrame) -> PushOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.pushed.fetch_add(1, Ordering::Relaxed);
                PushOutcome::Queued
            }
            // 队列自身持有接收端,不会出现 Disconnected
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    topic = %self.topic,
                    dropped = total,
                    "Dropping frames as the queue is full"
                );
                PushOutcome::Dropped
            }
        }
    }

    /// 非阻塞出队 (FIFO),空队列返回 None
    pub fn pop_latest_or_none(&self) -> Option<AnnotatedFrame> {
        match self.rx.try_recv() {
            Ok(frame) => {
                self.popped.fetch_add(1, Ordering::Relaxed);
                Some(frame)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    pub fn popped(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn frame(sequence: u64) -> AnnotatedFrame {
        AnnotatedFrame {
            topic: "camera1".into(),
            image: RgbImage::new(2, 2),
            sequence,
        }
    }

    #[test]
    fn test_twelve_frames_into_capacity_ten() {
        let queue = TopicQueue::new("camera1", 10);
        let outcomes: Vec<_> = (1..=12).map(|i| queue.push(frame(i))).collect();

        assert!(outcomes[..10].iter().all(|o| *o == PushOutcome::Queued));
        assert_eq!(&outcomes[10..], &[PushOutcome::Dropped, PushOutcome::Dropped]);
        assert_eq!(queue.len(), 10);
        assert_eq!(queue.dropped(), 2);

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop_latest_or_none())
            .map(|f| f.sequence)
            .collect();
        assert_eq!(popped, (1..=10).collect::<Vec<_>>());
        assert!(queue.pop_latest_or_none().is_none());
    }

    #[test]
    fn test_capacity_plus_k_drops_k() {
        for (capacity, k) in [(1usize, 1u64), (3, 5), (10, 0)] {
            let queue = TopicQueue::new("t", capacity);
            for i in 0..capacity as u64 + k {
                queue.push(frame(i));
            }
            assert_eq!(queue.len(), capacity);
            assert_eq!(queue.dropped(), k);
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue = TopicQueue::new("t", 0);
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.push(frame(0)), PushOutcome::Queued);
    }

    #[test]
    fn test_counters_balance_under_concurrency() {
        let queue = Arc::new(TopicQueue::new("t", 4));
        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    queue.push(frame(i));
                }
            })
        };
        let mut last = None;
        for _ in 0..500 {
            if let Some(f) = queue.pop_latest_or_none() {
                if let Some(prev) = last {
                    assert!(f.sequence > prev, "FIFO order violated");
                }
                last = Some(f.sequence);
            }
        }
        producer.join().unwrap();

        assert!(queue.len() <= queue.capacity());
        assert_eq!(
            queue.pushed() - queue.popped(),
            queue.len() as u64,
            "pushes - pops must equal len"
        );
        assert_eq!(queue.pushed() + queue.dropped(), 500);
    }
}
