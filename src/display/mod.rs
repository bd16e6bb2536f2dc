/// 显示端 (Display)
///
/// - multiplexer: 固定节奏轮询各话题队列,保留每话题最新一帧
/// - mosaic:      按话题数排布网格,合成整窗图像
pub mod mosaic;
pub mod multiplexer;

use serde::{Deserialize, Serialize};

pub use mosaic::{compose_mosaic, scale_to_width, MosaicLayout};
pub use multiplexer::{DisplayMultiplexer, TopicTile};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub refresh_ms: u64,    // 刷新周期
    pub tile_size: u32,     // 未连接占位图边长
    pub window_width: u32,  // 合成窗口宽
    pub window_height: u32, // 合成窗口高
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 50,
            tile_size: 300,
            window_width: 600,
            window_height: 600,
            fullscreen: false,
        }
    }
}
