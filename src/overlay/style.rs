//! 叠加样式 - 可通过JSON配置覆盖
use std::path::PathBuf;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::annotation::Priority;

pub const GOOD_COLOR: [u8; 3] = [0, 255, 0];
pub const BAD_COLOR: [u8; 3] = [255, 0, 0];
pub const INFO_LOW_COLOR: [u8; 3] = [0, 255, 0];
pub const INFO_MEDIUM_COLOR: [u8; 3] = [170, 150, 0];
pub const INFO_HIGH_COLOR: [u8; 3] = [255, 0, 0];

/// 叠加样式 (RGB)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub good_color: [u8; 3], // 无缺陷边框 / FPS文字
    pub bad_color: [u8; 3],  // 缺陷框 / 标签 / 有缺陷边框
    pub info_low_color: [u8; 3],
    pub info_medium_color: [u8; 3],
    pub info_high_color: [u8; 3],
    pub border_width: u32,  // 整帧边框宽度(像素)
    pub box_thickness: u32, // 检测框线宽
    pub text_scale: u32,    // 点阵字体放大倍数
    pub font_path: Option<PathBuf>,
    pub font_size: f32, // TTF字体像素高度
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            good_color: GOOD_COLOR,
            bad_color: BAD_COLOR,
            info_low_color: INFO_LOW_COLOR,
            info_medium_color: INFO_MEDIUM_COLOR,
            info_high_color: INFO_HIGH_COLOR,
            border_width: 5,
            box_thickness: 2,
            text_scale: 1,
            font_path: None,
            font_size: 14.0,
        }
    }
}

impl OverlayStyle {
    pub fn good(&self) -> Rgb<u8> {
        Rgb(self.good_color)
    }

    pub fn bad(&self) -> Rgb<u8> {
        Rgb(self.bad_color)
    }

    pub fn priority_color(&self, priority: Priority) -> Rgb<u8> {
        match priority {
            Priority::Low => Rgb(self.info_low_color),
            Priority::Medium => Rgb(self.info_medium_color),
            Priority::High => Rgb(self.info_high_color),
        }
    }
}
