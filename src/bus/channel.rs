/// 进程内总线 (crossbeam-channel)
/// In-process bus used by the demo publisher and tests
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde_json::Value;

use super::{BusMessage, Connect, Subscriber, TransportError, TransportResult};

/// 创建一对发布端/订阅端 (无界队列,发布端不阻塞)
pub fn channel() -> (ChannelPublisher, ChannelSubscriber) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelPublisher { tx }, ChannelSubscriber { rx })
}

#[derive(Clone)]
pub struct ChannelPublisher {
    tx: Sender<BusMessage>,
}

impl ChannelPublisher {
    pub fn publish(&self, metadata: Value, blob: Vec<u8>) -> TransportResult<()> {
        self.send(BusMessage::new(metadata, blob))
    }

    /// 原样发送 (允许缺失元数据或图像)
    pub fn send(&self, message: BusMessage) -> TransportResult<()> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

pub struct ChannelSubscriber {
    rx: Receiver<BusMessage>,
}

impl Subscriber for ChannelSubscriber {
    fn receive_timeout(&mut self, timeout: Duration) -> TransportResult<BusMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Ok(message),
            Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout),
            // 所有发布端都已释放
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::ConnectionClosed),
        }
    }

    fn transport_type(&self) -> &str {
        "channel"
    }
}

impl Connect for ChannelSubscriber {
    fn connect(self: Box<Self>, _topic: &str) -> TransportResult<Box<dyn Subscriber>> {
        Ok(self)
    }

    fn describe(&self) -> String {
        "in-process channel".to_string()
    }
}
