/// 演示发布端
/// Synthetic frame publisher for the in-process bus (`--demo` and tests)
///
/// 生成带缺陷/检测框/FPS/状态信息的 BGR 帧,可选 PNG 编码。
use std::io::Cursor;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::annotation::TopicLabels;
use crate::bus::ChannelPublisher;
use crate::pipeline::CancellationToken;

/// 演示用标签
pub fn demo_labels() -> TopicLabels {
    [("0", "MISSING"), ("1", "SHORT"), ("2", "scratch"), ("3", "dent")]
        .into_iter()
        .map(|(id, text)| (id.to_string(), text.to_string()))
        .collect()
}

pub struct DemoPublisher {
    publisher: ChannelPublisher,
    topic: String,
    width: u32,
    height: u32,
    encode_png: bool,
    rng: StdRng,
    sequence: u64,
}

impl DemoPublisher {
    pub fn new(publisher: ChannelPublisher, topic: impl Into<String>, seed: u64) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            width: 320,
            height: 240,
            encode_png: false,
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        // 缺陷框需要至少 40 像素的活动范围
        self.width = width.max(48);
        self.height = height.max(48);
        self
    }

    /// 以 PNG 编码发送 (encoding_type/encoding_level)
    pub fn with_png(mut self, encode_png: bool) -> Self {
        self.encode_png = encode_png;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 生成下一条 (元数据, 负载)
    pub fn next_message(&mut self) -> (Value, Vec<u8>) {
        self.sequence += 1;
        let (w, h) = (self.width, self.height);
        let shift = (self.sequence * 4) as u32;

        // BGR 渐变
        let mut payload = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                payload.push(((x + shift) % 256) as u8);
                payload.push(((y * 255) / h) as u8);
                payload.push(64);
            }
        }

        let defect_count = self.rng.gen_range(0..3);
        let defects: Vec<Value> = (0..defect_count)
            .map(|_| {
                let x = self.rng.gen_range(0..w - 40);
                let y = self.rng.gen_range(0..h - 40);
                let size = self.rng.gen_range(10..40);
                json!({"tl": [x, y], "br": [x + size, y + size], "type": self.rng.gen_range(0..5)})
            })
            .collect();

        let alert = if defect_count > 0 { 2 } else { 1 };
        let mut metadata = json!({
            "height": h,
            "width": w,
            "channels": 3,
            "img_handle": format!("{}_{:06}", self.topic, self.sequence),
            "defects": defects,
            "VideoIngestionFps": 30.0,
            "VideoAnalyticsFps": self.rng.gen_range(25.0..30.0_f64).round(),
            "display_info": [
                {"priority": 0, "info": format!("frame {}", self.sequence)},
                {"priority": alert, "info": format!("defects: {}", defect_count)},
            ],
        });

        if self.sequence % 3 == 0 {
            metadata["gva_meta"] = json!([{
                "x": w / 2, "y": h / 2, "width": w / 4, "height": h / 4,
                "tensor": [{"label_id": 1}, {"label_id": null}]
            }]);
        }

        if self.encode_png {
            match encode_png(payload.clone(), w, h) {
                Ok(encoded) => {
                    metadata["encoding_type"] = json!("png");
                    metadata["encoding_level"] = json!(3);
                    return (metadata, encoded);
                }
                Err(e) => warn!("⚠️ PNG 编码失败,改发原始帧: {}", e),
            }
        }
        (metadata, payload)
    }

    pub fn publish_one(&mut self) -> bool {
        let (metadata, payload) = self.next_message();
        self.publisher.publish(metadata, payload).is_ok()
    }

    /// 后台线程按固定间隔发布,直到取消或订阅端关闭
    pub fn spawn(
        mut self,
        interval: Duration,
        token: CancellationToken,
    ) -> std::io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name(format!("demo-{}", self.topic))
            .spawn(move || {
                info!("🎬 演示发布启动: {}", self.topic);
                while !token.is_cancelled() {
                    if !self.publish_one() {
                        break;
                    }
                    thread::sleep(interval);
                }
                info!("演示发布退出: {} ({}帧)", self.topic, self.sequence);
                self.sequence
            })
    }
}

/// 负载是 BGR,按 RGB 编码前先交换
fn encode_png(mut bgr: Vec<u8>, width: u32, height: u32) -> image::ImageResult<Vec<u8>> {
    bgr.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
    let image = RgbImage::from_raw(width, height, bgr).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationRecord;
    use crate::bus::channel;
    use crate::frame::FrameDecoder;

    #[test]
    fn test_messages_are_well_formed() {
        let (publisher, _rx) = channel();
        let mut demo = DemoPublisher::new(publisher, "cam", 7).with_size(64, 48);
        for _ in 0..6 {
            let (metadata, payload) = demo.next_message();
            let record = AnnotationRecord::from_metadata(&metadata).unwrap();
            assert_eq!(payload.len(), 64 * 48 * 3);
            assert!(record.defects.is_some());
            assert_eq!(record.metrics.len(), 2);
        }
    }

    #[test]
    fn test_png_messages_decode() {
        let (publisher, _rx) = channel();
        let mut demo = DemoPublisher::new(publisher, "cam", 1)
            .with_size(64, 48)
            .with_png(true);
        let (metadata, payload) = demo.next_message();
        let record = AnnotationRecord::from_metadata(&metadata).unwrap();
        assert!(record.encoding.is_some());

        let image = FrameDecoder::default()
            .decode_message(record.frame_message(payload))
            .unwrap();
        assert_eq!((image.width(), image.height()), (64, 48));
    }
}
