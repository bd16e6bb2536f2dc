//! 话题列表与连接配置
//!
//! - `SubTopics`:      `publisher/topic,publisher2/topic2`
//! - `<topic>_cfg`:    `mode,address` (如 `zmq_tcp,127.0.0.1:65013`)
use std::fmt;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub publisher: String,
    pub topic: String,
}

/// 解析 SubTopics,空项忽略
pub fn parse_topic_list(value: &str) -> Result<Vec<TopicSpec>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('/') {
            Some((publisher, topic)) if !topic.trim().is_empty() && !topic.contains('/') => {
                Ok(TopicSpec {
                    publisher: publisher.trim().to_string(),
                    topic: topic.trim().to_string(),
                })
            }
            _ => Err(ConfigError::InvalidValue {
                key: "SubTopics".into(),
                value: entry.to_string(),
            }),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    ZmqTcp,
    ZmqIpc,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::ZmqTcp => write!(f, "zmq_tcp"),
            TransportMode::ZmqIpc => write!(f, "zmq_ipc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub mode: TransportMode,
    pub address: String,
}

impl ConnectionSpec {
    /// ZeroMQ 端点: tcp 直接用地址,ipc 为 `<目录>/<话题>`
    pub fn zmq_endpoint(&self, topic: &str) -> String {
        if self.address.contains("://") {
            return self.address.clone();
        }
        match self.mode {
            TransportMode::ZmqTcp => format!("tcp://{}", self.address),
            TransportMode::ZmqIpc => format!(
                "ipc://{}/{}",
                self.address.trim_end_matches('/'),
                topic
            ),
        }
    }
}

/// 解析 `<topic>_cfg` 的值
pub fn parse_topic_cfg(topic: &str, value: &str) -> Result<ConnectionSpec, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: format!("{}_cfg", topic),
        value: value.to_string(),
    };
    let (mode, address) = value.split_once(',').ok_or_else(invalid)?;
    let mode = match mode.trim() {
        "zmq_tcp" => TransportMode::ZmqTcp,
        "zmq_ipc" => TransportMode::ZmqIpc,
        _ => return Err(invalid()),
    };
    let address = address.trim();
    if address.is_empty() {
        return Err(invalid());
    }
    Ok(ConnectionSpec {
        mode,
        address: address.to_string(),
    })
}
