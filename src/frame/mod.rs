/// 帧解码系统 (Frame Decoding)
///
/// - types:   总线帧描述 (尺寸/通道/编码)
/// - decoder: 原始像素或压缩图像 → 内存像素缓冲
pub mod decoder;
pub mod types;

pub use decoder::FrameDecoder;
pub use types::{raw_len, ChannelOrder, Encoding, EncodingType, FrameMessage, PixelBuffer};
