// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 缺陷可视化 (Defect Visualizer)
//!
//! 订阅多路 (metadata, image) 消息流,按元数据在图像上叠加缺陷/检测信息,
//! 再经每话题有界队列交给显示端。
//!
//! 流水线: bus → pipeline::TopicSubscriber → frame::FrameDecoder
//!        → overlay::OverlayRenderer → queue::TopicQueue → display::DisplayMultiplexer
pub mod annotation; // 元数据解析与标签映射
pub mod bus; // 消息总线订阅接口
pub mod config; // JSON配置 / 环境变量 / 话题解析
pub mod demo; // 演示发布端
pub mod display; // 显示轮询与网格合成
pub mod error; // 错误类型
pub mod frame; // 帧解码
pub mod logging; // 日志初始化
pub mod overlay; // 叠加渲染
pub mod persist; // 标注帧落盘
pub mod pipeline; // 订阅线程与监督者
pub mod queue; // 每话题有界队列

pub use crate::annotation::{AnnotationRecord, LabelMap};
pub use crate::bus::{BusMessage, Connect, Subscriber, TopicEndpoint, TransportError};
pub use crate::config::VisualizerConfig;
pub use crate::display::DisplayMultiplexer;
pub use crate::error::{AnnotationError, ConfigError, FrameError, VisualizerError};
pub use crate::frame::{FrameDecoder, PixelBuffer};
pub use crate::overlay::{OverlayRenderer, OverlayStyle};
pub use crate::pipeline::{PipelineContext, SubscriberSupervisor, SupervisorEvent, SupervisorHandle};
pub use crate::queue::{AnnotatedFrame, PushOutcome, TopicQueue, TopicQueues};
