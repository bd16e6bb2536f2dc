/// 消息总线接口 (Message Bus)
/// Subscription side of the publish/subscribe transport
///
/// 每个话题一个订阅者,阻塞接收 (metadata, blob) 对:
/// - channel: 进程内总线 (crossbeam-channel),用于演示与测试
/// - zmq:     ZeroMQ SUB 套接字 (需要 `zmq` feature)
pub mod channel;
#[cfg(feature = "zmq")]
pub mod zmq;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub use channel::{channel, ChannelPublisher, ChannelSubscriber};

/// 总线消息: 元数据或图像缺失时对应字段为 None
#[derive(Debug, Clone, Default)]
pub struct BusMessage {
    pub metadata: Option<Value>,
    pub blob: Option<Vec<u8>>,
}

impl BusMessage {
    pub fn new(metadata: Value, blob: Vec<u8>) -> Self {
        Self {
            metadata: Some(metadata),
            blob: Some(blob),
        }
    }

    /// 两部分都在才算完整消息
    pub fn into_parts(self) -> Option<(Value, Vec<u8>)> {
        match (self.metadata, self.blob) {
            (Some(metadata), Some(blob)) if !metadata.is_null() => Some((metadata, blob)),
            _ => None,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// 超时内没有消息,不是故障
    #[error("receive timed out")]
    Timeout,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[cfg(feature = "zmq")]
    #[error("zmq error: {0}")]
    Zmq(::zmq::Error),
}

impl TransportError {
    /// 订阅是否已不可恢复
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Timeout | TransportError::InvalidMessage(_))
    }
}

/// 单个话题的订阅句柄
pub trait Subscriber: Send {
    /// 阻塞接收下一条消息,最多等待 `timeout`
    fn receive_timeout(&mut self, timeout: Duration) -> TransportResult<BusMessage>;

    fn transport_type(&self) -> &str;
}

/// 连接配置: 对核心不透明,只负责为话题打开订阅
pub trait Connect: Send {
    fn connect(self: Box<Self>, topic: &str) -> TransportResult<Box<dyn Subscriber>>;

    fn describe(&self) -> String;
}

/// (话题, 连接配置)
pub struct TopicEndpoint {
    pub topic: String,
    pub connection: Box<dyn Connect>,
}

impl TopicEndpoint {
    pub fn new(topic: impl Into<String>, connection: impl Connect + 'static) -> Self {
        Self {
            topic: topic.into(),
            connection: Box::new(connection),
        }
    }
}

impl std::fmt::Debug for TopicEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicEndpoint")
            .field("topic", &self.topic)
            .field("connection", &self.connection.describe())
            .finish()
    }
}
