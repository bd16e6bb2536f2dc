//! ZeroMQ SUB 订阅端
//!
//! 多帧消息格式: `[topic, metadata(JSON), blob]`,blob 帧可缺省。
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use super::{BusMessage, Connect, Subscriber, TransportError, TransportResult};

/// 连接配置: 发布端地址 (如 `tcp://127.0.0.1:65013`)
#[derive(Clone)]
pub struct ZmqConnection {
    context: Arc<zmq::Context>,
    endpoint: String,
    recv_hwm: i32,
}

impl ZmqConnection {
    pub fn new(context: Arc<zmq::Context>, endpoint: impl Into<String>) -> Self {
        Self {
            context,
            endpoint: endpoint.into(),
            recv_hwm: 1000,
        }
    }

    pub fn with_recv_hwm(mut self, recv_hwm: i32) -> Self {
        self.recv_hwm = recv_hwm;
        self
    }
}

impl Connect for ZmqConnection {
    fn connect(self: Box<Self>, topic: &str) -> TransportResult<Box<dyn Subscriber>> {
        let socket = self.context.socket(zmq::SUB)?;
        socket.set_linger(0)?;
        socket.set_rcvhwm(self.recv_hwm)?;
        socket
            .connect(&self.endpoint)
            .map_err(|e| TransportError::ConnectFailed(format!("{}: {}", self.endpoint, e)))?;
        socket.set_subscribe(topic.as_bytes())?;

        info!("🦀 [ZMQ-SUB] {} connected to {}", topic, self.endpoint);

        Ok(Box::new(ZmqSubscriber {
            socket,
            topic: topic.to_string(),
        }))
    }

    fn describe(&self) -> String {
        format!("zmq {}", self.endpoint)
    }
}

pub struct ZmqSubscriber {
    socket: zmq::Socket,
    topic: String,
}

impl Subscriber for ZmqSubscriber {
    fn receive_timeout(&mut self, timeout: Duration) -> TransportResult<BusMessage> {
        let ready = self.socket.poll(zmq::POLLIN, timeout.as_millis() as i64)?;
        if ready == 0 {
            return Err(TransportError::Timeout);
        }

        let mut parts = self.socket.recv_multipart(0)?.into_iter();
        let topic = parts.next().unwrap_or_default();
        if topic != self.topic.as_bytes() {
            return Err(TransportError::InvalidMessage(format!(
                "unexpected topic frame {:?}",
                String::from_utf8_lossy(&topic)
            )));
        }

        let metadata = match parts.next() {
            Some(bytes) if !bytes.is_empty() => Some(
                serde_json::from_slice::<Value>(&bytes)
                    .map_err(|e| TransportError::InvalidMessage(e.to_string()))?,
            ),
            _ => None,
        };
        let blob = parts.next().filter(|b| !b.is_empty());

        Ok(BusMessage { metadata, blob })
    }

    fn transport_type(&self) -> &str {
        "zmq-sub"
    }
}

impl From<zmq::Error> for TransportError {
    fn from(err: zmq::Error) -> Self {
        match err {
            zmq::Error::EAGAIN => Self::Timeout,
            zmq::Error::ETERM => Self::ConnectionClosed,
            _ => Self::Zmq(err),
        }
    }
}
