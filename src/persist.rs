/// 标注帧落盘 (save_image)
/// Optional persistence hook for annotated frames
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

use crate::annotation::AnnotationRecord;

/// 持久化接口: 失败由调用方记录后忽略
pub trait FrameSink: Send + Sync {
    fn save(&self, topic: &str, record: &AnnotationRecord, frame: &RgbImage) -> Result<PathBuf>;
}

/// 写入 `<dir>/<tag><img_handle>.png`
#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    dir: PathBuf,
}

impl PngDirectorySink {
    /// 目录不存在时创建
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("无法创建图像目录: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// bad_/good_ 取决于缺陷列表,无该字段时不加前缀;
    /// 没有 img_handle 时用 `<topic>_<时间戳>`
    pub fn file_name(topic: &str, record: &AnnotationRecord) -> String {
        let tag = match record.has_defects() {
            Some(true) => "bad_",
            Some(false) => "good_",
            None => "",
        };
        let handle = match record.img_handle.as_deref() {
            Some(handle) => handle.to_string(),
            None => format!(
                "{}_{}",
                topic,
                chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
            ),
        };
        format!("{}{}.png", tag, handle)
    }
}

impl FrameSink for PngDirectorySink {
    fn save(&self, topic: &str, record: &AnnotationRecord, frame: &RgbImage) -> Result<PathBuf> {
        let path = self.dir.join(Self::file_name(topic, record));
        let file = File::create(&path)
            .with_context(|| format!("无法创建文件: {}", path.display()))?;
        // 快速压缩档,接近原程序的 PNG 压缩等级 3
        let encoder = PngEncoder::new_with_quality(
            BufWriter::new(file),
            CompressionType::Fast,
            FilterType::Adaptive,
        );
        encoder
            .write_image(
                frame.as_raw(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgb8,
            )
            .with_context(|| format!("PNG 编码失败: {}", path.display()))?;
        debug!(topic, path = %path.display(), "💾 已保存标注帧");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(extra: serde_json::Value) -> AnnotationRecord {
        let mut metadata = json!({"height": 2, "width": 2, "channels": 3});
        for (k, v) in extra.as_object().unwrap() {
            metadata[k] = v.clone();
        }
        AnnotationRecord::from_metadata(&metadata).unwrap()
    }

    #[test]
    fn test_file_name_tags() {
        let bad = record(json!({"img_handle": "a1", "defects": [{"tl": [0, 0], "br": [1, 1], "type": 0}]}));
        let good = record(json!({"img_handle": "a2", "defects": []}));
        let plain = record(json!({"img_handle": "a3"}));
        assert_eq!(PngDirectorySink::file_name("t", &bad), "bad_a1.png");
        assert_eq!(PngDirectorySink::file_name("t", &good), "good_a2.png");
        assert_eq!(PngDirectorySink::file_name("t", &plain), "a3.png");

        let anonymous = PngDirectorySink::file_name("cam", &record(json!({})));
        assert!(anonymous.starts_with("cam_") && anonymous.ends_with(".png"));
    }

    #[test]
    fn test_save_writes_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PngDirectorySink::new(dir.path().join("nested")).unwrap();
        let frame = RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));

        let path = sink
            .save("cam", &record(json!({"img_handle": "x", "defects": []})), &frame)
            .unwrap();

        assert_eq!(path, dir.path().join("nested").join("good_x.png"));
        let loaded = image::open(&path).unwrap().into_rgb8();
        assert_eq!(loaded, frame);
    }
}
