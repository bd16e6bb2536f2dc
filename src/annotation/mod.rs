/// 标注元数据 (Annotation Metadata)
///
/// - record: 每帧元数据 (RegionList / DefectList / display_info / Fps指标)
/// - labels: 话题 → (id → 标签文本) 只读映射
pub mod labels;
pub mod record;

pub use labels::{LabelMap, TopicLabels};
pub use record::{label_key, AnnotationRecord, Defect, DisplayInfo, FrameMetric, Priority, Region, Tensor};
