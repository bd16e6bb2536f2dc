/// 订阅流水线 (Subscription Pipeline)
///
/// 每话题一个独立线程:
/// - subscriber: 接收 → 解析元数据 → 解码 → 叠加 → (落盘) → 入队
/// - supervisor: 启动全部订阅线程,提供取消/等待/事件
/// - stats:      每话题计数与接收帧率
/// - cancel:     取消令牌
pub mod cancel;
pub mod stats;
pub mod subscriber;
pub mod supervisor;

use std::sync::Arc;
use std::time::Duration;

use crate::annotation::LabelMap;
use crate::frame::FrameDecoder;
use crate::overlay::OverlayRenderer;
use crate::persist::FrameSink;
use crate::queue::DEFAULT_QUEUE_CAPACITY;

pub use cancel::CancellationToken;
pub use stats::{StatsSnapshot, SubscriberStats};
pub use subscriber::{SubscriberExit, SubscriberState, TopicSubscriber};
pub use supervisor::{SubscriberSupervisor, SupervisorEvent, SupervisorHandle};

/// 订阅等待上限,决定取消的响应速度
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// 所有订阅线程共享的只读部分
#[derive(Clone)]
pub struct PipelineContext {
    pub labels: Arc<LabelMap>,
    pub renderer: Arc<OverlayRenderer>,
    pub decoder: FrameDecoder,
    pub sink: Option<Arc<dyn FrameSink>>,
    pub save_image: bool,
    pub queue_capacity: usize,
    pub poll_timeout: Duration,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            labels: Arc::new(LabelMap::default()),
            renderer: Arc::new(OverlayRenderer::default()),
            decoder: FrameDecoder::default(),
            sink: None,
            save_image: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("labels", &self.labels.len())
            .field("decoder", &self.decoder)
            .field("sink", &self.sink.is_some())
            .field("save_image", &self.save_image)
            .field("queue_capacity", &self.queue_capacity)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
