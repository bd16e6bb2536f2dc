/// 帧解码器
/// Raw-or-encoded payload → pixel buffer
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use tracing::debug;

use super::types::{raw_len, ChannelOrder, Encoding, FrameMessage, PixelBuffer};
use crate::error::FrameError;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    order: ChannelOrder,
}

impl FrameDecoder {
    pub fn new(order: ChannelOrder) -> Self {
        Self { order }
    }

    pub fn decode_message(&self, message: FrameMessage) -> Result<PixelBuffer, FrameError> {
        self.decode(
            message.payload,
            message.height,
            message.width,
            message.channels,
            message.encoding.as_ref(),
        )
    }

    /// 解码一帧
    ///
    /// 无编码时负载直接按 `height × width × channels` 解释;
    /// 有编码时交给 image 编解码器。
    pub fn decode(
        &self,
        payload: Vec<u8>,
        height: u32,
        width: u32,
        channels: u8,
        encoding: Option<&Encoding>,
    ) -> Result<PixelBuffer, FrameError> {
        match encoding {
            Some(encoding) => {
                let image = image::load_from_memory(&payload)?;
                if image.width() != width || image.height() != height {
                    debug!(
                        "{:?} frame decoded as {}x{}, metadata declared {}x{}",
                        encoding.kind,
                        image.width(),
                        image.height(),
                        width,
                        height
                    );
                }
                Ok(image)
            }
            None => self.reshape(payload, height, width, channels),
        }
    }

    fn reshape(
        &self,
        payload: Vec<u8>,
        height: u32,
        width: u32,
        channels: u8,
    ) -> Result<PixelBuffer, FrameError> {
        // 溢出的尺寸不可能匹配任何负载
        let expected = raw_len(height, width, channels).unwrap_or(usize::MAX);
        let actual = payload.len();
        let mismatch = || FrameError::ShapeMismatch {
            expected,
            actual,
            height,
            width,
            channels,
        };
        if actual != expected {
            return Err(mismatch());
        }

        let image = match channels {
            1 => GrayImage::from_raw(width, height, payload).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(width, height, payload).map(DynamicImage::ImageLumaA8),
            // BGR(A) → RGB(A)
            3 => RgbImage::from_raw(width, height, payload).map(|mut img| {
                if self.order == ChannelOrder::Bgr {
                    img.pixels_mut().for_each(|px| px.0.swap(0, 2));
                }
                DynamicImage::ImageRgb8(img)
            }),
            4 => RgbaImage::from_raw(width, height, payload).map(|mut img| {
                if self.order == ChannelOrder::Bgr {
                    img.pixels_mut().for_each(|px| px.0.swap(0, 2));
                }
                DynamicImage::ImageRgba8(img)
            }),
            other => return Err(FrameError::UnsupportedChannels(other)),
        };

        image.ok_or_else(mismatch)
    }
}
