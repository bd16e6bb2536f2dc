/// 错误类型定义
/// Error types shared across the pipeline
use thiserror::Error;

use crate::bus::TransportError;

/// 帧解码错误 (FrameDecoder)
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload has {actual} bytes, expected {expected} ({height}x{width}x{channels})")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        height: u32,
        width: u32,
        channels: u8,
    },
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),
    #[error("image codec rejected payload: {0}")]
    Decode(#[from] image::ImageError),
}

/// 元数据解析错误 (AnnotationRecord)
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("metadata is not a JSON object")]
    NotAnObject,
    #[error("missing or invalid field `{0}`")]
    InvalidField(&'static str),
    #[error("`encoding_type` and `encoding_level` must both be present (found only `{0}`)")]
    IncompleteEncoding(&'static str),
    #[error("unsupported encoding type `{0}`")]
    UnsupportedEncoding(String),
    #[error("malformed `{field}`: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误 (启动阶段致命)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing environment variable `{0}`")]
    MissingEnv(String),
    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },
}

/// 单帧处理错误: 任何一种都只丢弃当前帧
#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = VisualizerError> = std::result::Result<T, E>;
