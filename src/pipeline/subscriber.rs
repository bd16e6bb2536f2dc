/// 话题订阅者 (TopicSubscriber)
/// One subscription, one thread: receive → parse → decode → overlay → queue
///
/// 状态: Connecting → Receiving → (Stopped | Failed)
/// 单帧错误只丢弃该帧;传输层致命错误只结束本订阅。
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use super::cancel::CancellationToken;
use super::stats::SubscriberStats;
use super::PipelineContext;
use crate::annotation::{AnnotationRecord, LabelMap};
use crate::bus::{BusMessage, Connect, TransportError};
use crate::error::VisualizerError;
use crate::frame::FrameDecoder;
use crate::overlay::OverlayRenderer;
use crate::persist::FrameSink;
use crate::queue::{AnnotatedFrame, PushOutcome, TopicQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Connecting,
    Receiving,
    Stopped,
    Failed,
}

/// 订阅线程的退出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberExit {
    Cancelled,
    Failed(String),
}

pub struct TopicSubscriber {
    topic: String,
    connection: Option<Box<dyn Connect>>,
    decoder: FrameDecoder,
    renderer: Arc<OverlayRenderer>,
    labels: Arc<LabelMap>,
    queue: Arc<TopicQueue>,
    sink: Option<Arc<dyn FrameSink>>,
    save_image: bool,
    token: CancellationToken,
    poll_timeout: Duration,
    stats: Arc<SubscriberStats>,
    state: SubscriberState,
    sequence: u64,
}

impl TopicSubscriber {
    pub fn new(
        topic: impl Into<String>,
        connection: Box<dyn Connect>,
        queue: Arc<TopicQueue>,
        context: &PipelineContext,
        token: CancellationToken,
    ) -> Self {
        let topic = topic.into();
        Self {
            stats: Arc::new(SubscriberStats::new(topic.clone())),
            topic,
            connection: Some(connection),
            decoder: context.decoder,
            renderer: context.renderer.clone(),
            labels: context.labels.clone(),
            queue,
            sink: context.sink.clone(),
            save_image: context.save_image,
            token,
            poll_timeout: context.poll_timeout,
            state: SubscriberState::Connecting,
            sequence: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> SubscriberState {
        self.state
    }

    pub fn stats(&self) -> Arc<SubscriberStats> {
        self.stats.clone()
    }

    /// 阻塞运行直到取消或传输失败 (在自己的线程里调用)
    pub fn run(mut self) -> SubscriberExit {
        let span = info_span!("subscriber", topic = %self.topic);
        let _enter = span.enter();

        let Some(connection) = self.connection.take() else {
            self.state = SubscriberState::Failed;
            return SubscriberExit::Failed("subscriber already started".to_string());
        };
        debug!("🔌 连接 {}", connection.describe());
        let mut subscription = match connection.connect(&self.topic) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("❌ 订阅失败: {}", e);
                self.state = SubscriberState::Failed;
                return SubscriberExit::Failed(e.to_string());
            }
        };

        self.state = SubscriberState::Receiving;
        info!("✅ 订阅线程启动 ({})", subscription.transport_type());

        loop {
            if self.token.is_cancelled() {
                self.state = SubscriberState::Stopped;
                info!("订阅线程退出");
                return SubscriberExit::Cancelled;
            }
            match subscription.receive_timeout(self.poll_timeout) {
                Ok(message) => {
                    self.handle(message);
                }
                Err(TransportError::Timeout) => {}
                Err(e) if !e.is_fatal() => {
                    warn!("⚠️ 丢弃无效消息: {}", e);
                    self.stats.record_malformed();
                }
                Err(e) => {
                    error!("❌ 订阅中断: {}", e);
                    self.state = SubscriberState::Failed;
                    return SubscriberExit::Failed(e.to_string());
                }
            }
        }
    }

    /// 处理一条消息;返回入队结果,被丢弃的消息返回 None
    pub fn handle(&mut self, message: BusMessage) -> Option<PushOutcome> {
        // 元数据或图像缺失: 静默丢弃
        let (metadata, blob) = message.into_parts()?;
        self.stats.record_received();

        let (record, image) = match self.annotate(&metadata, blob) {
            Ok(annotated) => annotated,
            Err(e) => {
                error!("❌ 丢弃帧: {}", e);
                self.stats.record_malformed();
                return None;
            }
        };
        self.stats.record_rendered();
        debug!("Metadata is : {}", metadata);

        if self.save_image {
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.save(&self.topic, &record, &image) {
                    warn!("⚠️ 保存图像失败: {:#}", e);
                }
            }
        }

        self.sequence += 1;
        let outcome = self.queue.push(AnnotatedFrame {
            topic: self.topic.clone(),
            image,
            sequence: self.sequence,
        });
        if outcome == PushOutcome::Dropped {
            self.stats.record_queue_dropped();
        }
        Some(outcome)
    }

    fn annotate(
        &self,
        metadata: &Value,
        blob: Vec<u8>,
    ) -> Result<(AnnotationRecord, RgbImage), VisualizerError> {
        let record = AnnotationRecord::from_metadata(metadata)?;
        let frame = self.decoder.decode_message(record.frame_message(blob))?;
        let image = self
            .renderer
            .render(frame, &record, self.labels.for_topic(&self.topic));
        Ok((record, image))
    }
}
