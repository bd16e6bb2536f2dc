/// 叠加渲染系统 (Overlay Rendering)
///
/// - style:    颜色/字体等配置常量
/// - text:     文字绘制 (内置点阵字体或 TTF 字体)
/// - renderer: 检测框/缺陷框/边框/FPS/状态信息
mod glyphs;
pub mod renderer;
pub mod style;
pub mod text;

pub use renderer::{OverlayRenderer, OverlayReport};
pub use style::OverlayStyle;
pub use text::TextPainter;
