/// 帧数据结构定义
/// Data structures describing one frame received from the bus
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::AnnotationError;

/// 解码后的像素缓冲 (RGB语义)
pub type PixelBuffer = DynamicImage;

/// 压缩格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    Jpeg,
    Png,
}

impl EncodingType {
    pub fn parse(name: &str) -> Result<Self, AnnotationError> {
        match name.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(EncodingType::Jpeg),
            "png" => Ok(EncodingType::Png),
            other => Err(AnnotationError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// 编码声明: `encoding_type` + `encoding_level` 必须同时出现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub kind: EncodingType,
    pub level: i64,
}

/// 原始帧的通道顺序 (上游相机管线默认 BGR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Bgr,
    Rgb,
}

/// 总线帧: 尺寸 + 可选编码 + 负载
#[derive(Debug, Clone)]
pub struct FrameMessage {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
    pub encoding: Option<Encoding>,
    pub payload: Vec<u8>,
}

impl FrameMessage {
    /// 未压缩时负载应有的字节数,乘积溢出时为 None
    pub fn expected_len(&self) -> Option<usize> {
        raw_len(self.height, self.width, self.channels)
    }
}

/// height × width × channels,溢出返回 None
pub fn raw_len(height: u32, width: u32, channels: u8) -> Option<usize> {
    (height as usize)
        .checked_mul(width as usize)?
        .checked_mul(channels as usize)
}
