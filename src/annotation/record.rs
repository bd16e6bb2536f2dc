/// 每帧元数据解析
/// Per-frame metadata, parsed from the JSON record that accompanies a blob
///
/// 两种历史格式互不排斥,可同时出现:
/// - `gva_meta`: RegionList (x/y/width/height + tensor标签)
/// - `defects`:  DefectList (tl/br + type)
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::error::AnnotationError;
use crate::frame::{Encoding, EncodingType, FrameMessage};

/// RegionList 中的一个检测框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub tensor: Vec<Tensor>,
}

impl Region {
    /// (左上, 右下),超出 i32 范围时饱和
    pub fn corners(&self) -> ((i32, i32), (i32, i32)) {
        let x1 = self.x as i32;
        let y1 = self.y as i32;
        (
            (x1, y1),
            (
                x1.saturating_add(self.width as i32),
                y1.saturating_add(self.height as i32),
            ),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    #[serde(default)]
    pub label_id: Value,
}

/// DefectList 中的一个缺陷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    pub tl: [f64; 2],
    pub br: [f64; 2],
    #[serde(rename = "type")]
    pub kind: Value,
}

impl Defect {
    pub fn corners(&self) -> ((i32, i32), (i32, i32)) {
        (
            (self.tl[0] as i32, self.tl[1] as i32),
            (self.br[0] as i32, self.br[1] as i32),
        )
    }
}

/// display_info 优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Medium),
            2 => Ok(Priority::High),
            other => Err(format!("priority {} out of range 0..=2", other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

/// 一条状态信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub priority: Priority,
    pub info: String,
}

impl DisplayInfo {
    /// 单条解析,失败只影响这一条
    pub fn from_value(entry: &Value) -> Result<Self, serde_json::Error> {
        DisplayInfo::deserialize(entry)
    }
}

/// 名称含 "Fps" 的数值字段,保留消息里的数字写法 (`30` 与 `30.0` 不同)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetric {
    pub name: String,
    pub value: Number,
}

impl FrameMetric {
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

impl std::fmt::Display for FrameMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.name, self.value)
    }
}

/// 一帧的全部元数据
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationRecord {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
    pub encoding: Option<Encoding>,
    pub img_handle: Option<String>,
    pub regions: Option<Vec<Region>>,
    pub defects: Option<Vec<Defect>>,
    /// 原样保留,渲染时逐条校验
    pub display_info: Option<Vec<Value>>,
    /// 按消息中的字段顺序
    pub metrics: Vec<FrameMetric>,
}

impl AnnotationRecord {
    pub fn from_metadata(metadata: &Value) -> Result<Self, AnnotationError> {
        let obj = metadata.as_object().ok_or(AnnotationError::NotAnObject)?;

        let height = dimension(obj, "height")?;
        let width = dimension(obj, "width")?;
        let channels = u8::try_from(dimension(obj, "channels")?)
            .map_err(|_| AnnotationError::InvalidField("channels"))?;

        let regions = optional_list::<Region>(obj, "gva_meta")?;
        let defects = optional_list::<Defect>(obj, "defects")?;

        let display_info = obj.get("display_info").map(|v| match v {
            Value::Array(entries) => entries.clone(),
            other => vec![other.clone()],
        });

        let mut metrics = Vec::new();
        for (name, value) in obj.iter().filter(|(name, _)| name.contains("Fps")) {
            match value {
                Value::Number(value) => metrics.push(FrameMetric {
                    name: name.clone(),
                    value: value.clone(),
                }),
                _ => warn!("⚠️ 忽略非数值指标 {}: {}", name, value),
            }
        }

        Ok(Self {
            height,
            width,
            channels,
            encoding: encoding(obj)?,
            img_handle: obj
                .get("img_handle")
                .and_then(Value::as_str)
                .map(str::to_string),
            regions,
            defects,
            display_info,
            metrics,
        })
    }

    /// 搭配图像负载组成总线帧
    pub fn frame_message(&self, payload: Vec<u8>) -> FrameMessage {
        FrameMessage {
            height: self.height,
            width: self.width,
            channels: self.channels,
            encoding: self.encoding,
            payload,
        }
    }

    /// 有缺陷 → Some(true),缺陷列表为空 → Some(false),无该字段 → None
    pub fn has_defects(&self) -> Option<bool> {
        self.defects.as_ref().map(|d| !d.is_empty())
    }
}

/// 标签查找键: 与配置里的字符串 id 对齐 (`3` 和 `"3"` 都是 "3")
pub fn label_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn dimension(obj: &Map<String, Value>, key: &'static str) -> Result<u32, AnnotationError> {
    let value = obj.get(key).ok_or(AnnotationError::InvalidField(key))?;
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(AnnotationError::InvalidField(key))
}

fn encoding(obj: &Map<String, Value>) -> Result<Option<Encoding>, AnnotationError> {
    match (obj.get("encoding_type"), obj.get("encoding_level")) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(AnnotationError::IncompleteEncoding("encoding_type")),
        (None, Some(_)) => Err(AnnotationError::IncompleteEncoding("encoding_level")),
        (Some(kind), Some(level)) => {
            let kind = kind
                .as_str()
                .ok_or(AnnotationError::InvalidField("encoding_type"))?;
            let level = match level {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .ok_or(AnnotationError::InvalidField("encoding_level"))?;
            Ok(Some(Encoding {
                kind: EncodingType::parse(kind)?,
                level,
            }))
        }
    }
}

fn optional_list<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<T>>, AnnotationError> {
    obj.get(field)
        .map(|v| {
            serde_json::from_value::<Vec<T>>(v.clone())
                .map_err(|source| AnnotationError::Malformed { field, source })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_both_schemas_may_be_present() {
        let record = AnnotationRecord::from_metadata(&json!({
            "height": 480, "width": 640, "channels": 3,
            "gva_meta": [{"x": 1, "y": 2, "width": 10, "height": 20,
                          "tensor": [{"label_id": 1}, {"label_id": null}]}],
            "defects": [{"tl": [10, 10], "br": [50.7, 50], "type": 3}],
        }))
        .unwrap();

        let regions = record.regions.unwrap();
        assert_eq!(regions[0].corners(), ((1, 2), (11, 22)));
        assert_eq!(regions[0].tensor.len(), 2);
        let defects = record.defects.unwrap();
        assert_eq!(defects[0].corners(), ((10, 10), (50, 50)));
        assert_eq!(label_key(&defects[0].kind).as_deref(), Some("3"));
    }

    #[test]
    fn test_neither_schema() {
        let record =
            AnnotationRecord::from_metadata(&json!({"height": 1, "width": 1, "channels": 1}))
                .unwrap();
        assert!(record.regions.is_none());
        assert!(record.defects.is_none());
        assert_eq!(record.has_defects(), None);
    }

    #[test]
    fn test_fps_metrics_keep_message_order() {
        let record = AnnotationRecord::from_metadata(&json!({
            "height": 1, "width": 1, "channels": 3,
            "VideoIngestionFps": 30,
            "img_handle": "abc",
            "VideoAnalyticsFps": 29.5,
            "BadFps": "n/a",
        }))
        .unwrap();

        let names: Vec<_> = record.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["VideoIngestionFps", "VideoAnalyticsFps"]);
        assert_eq!(record.metrics[0].to_string(), "VideoIngestionFps : 30");
        assert_eq!(record.metrics[1].to_string(), "VideoAnalyticsFps : 29.5");
        assert_eq!(record.img_handle.as_deref(), Some("abc"));
    }

    #[test]
    fn test_encoding_requires_both_keys() {
        let err = AnnotationRecord::from_metadata(&json!({
            "height": 1, "width": 1, "channels": 3, "encoding_level": 95,
        }))
        .unwrap_err();
        assert!(matches!(err, AnnotationError::IncompleteEncoding("encoding_level")));

        let record = AnnotationRecord::from_metadata(&json!({
            "height": "2", "width": "2", "channels": "3",
            "encoding_type": "jpeg", "encoding_level": 95,
        }))
        .unwrap();
        assert_eq!(
            record.encoding,
            Some(Encoding { kind: EncodingType::Jpeg, level: 95 })
        );
        assert_eq!(record.height, 2);
    }

    #[test]
    fn test_missing_dimension_is_rejected() {
        let err = AnnotationRecord::from_metadata(&json!({"height": 1, "width": 1})).unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidField("channels")));
    }

    #[test]
    fn test_fps_metric_keeps_float_form() {
        let record = AnnotationRecord::from_metadata(&json!({
            "height": 1, "width": 1, "channels": 3, "VideoIngestionFps": 30.0,
        }))
        .unwrap();
        assert_eq!(record.metrics[0].to_string(), "VideoIngestionFps : 30.0");
        assert_eq!(record.metrics[0].as_f64(), Some(30.0));
    }

    #[test]
    fn test_region_corners_saturate() {
        let record = AnnotationRecord::from_metadata(&json!({
            "height": 1, "width": 1, "channels": 3,
            "gva_meta": [{"x": 2e9, "y": -2e9, "width": 2e9, "height": -2e9}],
        }))
        .unwrap();
        let region = &record.regions.as_ref().unwrap()[0];
        assert_eq!(
            region.corners(),
            ((2_000_000_000, -2_000_000_000), (i32::MAX, i32::MIN))
        );
    }

    #[test]
    fn test_malformed_defects_are_rejected() {
        let err = AnnotationRecord::from_metadata(&json!({
            "height": 1, "width": 1, "channels": 3, "defects": [{"tl": [1, 2]}],
        }))
        .unwrap_err();
        assert!(matches!(err, AnnotationError::Malformed { field: "defects", .. }));
    }

    #[test]
    fn test_display_info_entry_validation() {
        assert!(DisplayInfo::from_value(&json!({"priority": 1, "info": "ok"})).is_ok());
        assert!(DisplayInfo::from_value(&json!({"priority": "1", "info": "x"})).is_err());
        assert!(DisplayInfo::from_value(&json!({"priority": 5, "info": "x"})).is_err());
        assert!(DisplayInfo::from_value(&json!({"info": "x"})).is_err());
        assert!(DisplayInfo::from_value(&json!("just text")).is_err());
    }
}
