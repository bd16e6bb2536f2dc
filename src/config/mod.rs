/// 可视化配置 (JSON 文件)
/// Visualizer configuration: labels, persistence, queue and display settings
///
/// - env:    环境变量 (IMAGE_DIR / DEV_MODE / PY_LOG_LEVEL / SubTopics ...)
/// - topics: 话题列表与连接配置格式
pub mod env;
pub mod topics;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::annotation::LabelMap;
use crate::display::DisplayConfig;
use crate::error::ConfigError;
use crate::frame::{ChannelOrder, FrameDecoder};
use crate::overlay::{OverlayRenderer, OverlayStyle};
use crate::persist::FrameSink;
use crate::pipeline::PipelineContext;
use crate::queue::DEFAULT_QUEUE_CAPACITY;

pub use env::EnvConfig;
pub use topics::{parse_topic_cfg, parse_topic_list, ConnectionSpec, TopicSpec, TransportMode};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    #[serde(deserialize_with = "flexible_bool")]
    pub save_image: bool, // 是否保存标注帧到 IMAGE_DIR
    pub labels: LabelMap,       // 话题 → (id → 标签)
    pub queue_capacity: usize,  // 每话题队列长度
    pub poll_timeout_ms: u64,   // 订阅接收等待上限
    pub channel_order: ChannelOrder, // 原始帧通道顺序
    pub display: DisplayConfig,
    pub style: OverlayStyle,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            save_image: false,
            labels: LabelMap::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_timeout_ms: 200,
            channel_order: ChannelOrder::default(),
            display: DisplayConfig::default(),
            style: OverlayStyle::default(),
        }
    }
}

impl VisualizerConfig {
    /// 从JSON文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 文件不存在时写出默认配置
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!("📝 配置文件不存在,创建默认配置...");
        let config = Self::default();
        if let Err(e) = config.save(path) {
            warn!("⚠️ {}", e);
        }
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity".into(),
                value: "0".into(),
            });
        }
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_timeout_ms".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// 组装订阅线程共享的上下文
    pub fn pipeline_context(&self, sink: Option<Arc<dyn FrameSink>>) -> PipelineContext {
        PipelineContext {
            labels: Arc::new(self.labels.clone()),
            renderer: Arc::new(OverlayRenderer::new(self.style.clone())),
            decoder: FrameDecoder::new(self.channel_order),
            sink,
            save_image: self.save_image,
            queue_capacity: self.queue_capacity,
            poll_timeout: self.poll_timeout(),
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️ 当前可视化配置:");
        info!("  保存图像: {}", self.save_image);
        info!("  标签话题数: {}", self.labels.len());
        info!("  队列长度: {}", self.queue_capacity);
        info!("  接收超时: {}ms", self.poll_timeout_ms);
        info!("  通道顺序: {:?}", self.channel_order);
        info!(
            "  窗口: {}x{} | 刷新 {}ms",
            self.display.window_width, self.display.window_height, self.display.refresh_ms
        );
    }
}

/// y/yes/t/true/on/1 和 n/no/f/false/off/0 (不区分大小写)
pub fn strtobool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// save_image 既可以是布尔值也可以是 "true"/"false" 字符串
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => strtobool("save_image", &s).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_save_image_and_labels() {
        let config = VisualizerConfig::from_json(
            r#"{
                "save_image": "True",
                "labels": {"camera1_stream_results": {"0": "MISSING", "1": "SHORT"}}
            }"#,
        )
        .unwrap();
        assert!(config.save_image);
        assert_eq!(config.labels.lookup("camera1_stream_results", "1"), Some("SHORT"));
        assert_eq!(config.queue_capacity, 10);

        let config = VisualizerConfig::from_json(r#"{"save_image": false}"#).unwrap();
        assert!(!config.save_image);
        assert!(VisualizerConfig::from_json(r#"{"save_image": "maybe"}"#).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = VisualizerConfig::from_json(r#"{"queue_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "queue_capacity"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visualizer.json");

        let created = VisualizerConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        let loaded = VisualizerConfig::load(&path).unwrap();
        assert_eq!(loaded.queue_capacity, created.queue_capacity);
        assert_eq!(loaded.display, created.display);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = VisualizerConfig::load("/nonexistent/visualizer.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_strtobool() {
        assert!(strtobool("k", "YES").unwrap());
        assert!(!strtobool("k", "off").unwrap());
        assert!(strtobool("k", "2").is_err());
    }
}
