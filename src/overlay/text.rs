/// 文字绘制
/// Text drawing with a baseline-left origin
///
/// 配置了字体文件时使用 TTF (ab_glyph + imageproc),否则使用内置 5x7 点阵字体。
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{info, warn};

use super::glyphs::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::style::OverlayStyle;

pub enum TextPainter {
    Bitmap { scale: u32 },
    Font { font: FontArc, scale: PxScale },
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextPainter::Bitmap { scale } => write!(f, "Bitmap(x{})", scale),
            TextPainter::Font { scale, .. } => write!(f, "Font({}px)", scale.y),
        }
    }
}

impl TextPainter {
    pub fn bitmap(scale: u32) -> Self {
        TextPainter::Bitmap {
            scale: scale.max(1),
        }
    }

    /// 按样式选择字体,字体文件不可用时退回点阵字体
    pub fn from_style(style: &OverlayStyle) -> Self {
        let Some(path) = style.font_path.as_deref() else {
            return Self::bitmap(style.text_scale);
        };
        match load_font(path) {
            Ok(font) => {
                info!("✅ 字体加载成功: {}", path.display());
                TextPainter::Font {
                    font,
                    scale: PxScale::from(style.font_size),
                }
            }
            Err(e) => {
                warn!("⚠️ {:#}, 使用内置点阵字体", e);
                Self::bitmap(style.text_scale)
            }
        }
    }

    pub fn line_height(&self) -> i32 {
        match self {
            TextPainter::Bitmap { scale } => GLYPH_HEIGHT * *scale as i32,
            TextPainter::Font { scale, .. } => scale.y.ceil() as i32,
        }
    }

    pub fn text_width(&self, text: &str) -> i32 {
        match self {
            TextPainter::Bitmap { scale } => {
                text.chars().count() as i32 * GLYPH_ADVANCE * *scale as i32
            }
            TextPainter::Font { font, scale } => text_size(*scale, font, text).0 as i32,
        }
    }

    /// 在 (x, baseline) 处绘制文字,超出画面部分裁掉
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, baseline: i32, color: Rgb<u8>) {
        let top = baseline as i64 - self.line_height() as i64;
        let right = x as i64 + self.text_width(text) as i64;
        if x as i64 >= image.width() as i64
            || top >= image.height() as i64
            || right <= 0
            || baseline <= 0
        {
            return;
        }
        // 与画面相交时 top 不小于 -line_height,不会溢出
        let top = top as i32;
        match self {
            TextPainter::Bitmap { scale } => draw_bitmap(image, text, x, top, *scale as i32, color),
            TextPainter::Font { font, scale } => {
                draw_text_mut(image, color, x, top, *scale, font, text)
            }
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("字体文件读取失败: {}", path.display()))?;
    FontArc::try_from_vec(bytes).map_err(|e| anyhow!("字体解析失败 {}: {}", path.display(), e))
}

fn draw_bitmap(image: &mut RgbImage, text: &str, x: i32, top: i32, scale: i32, color: Rgb<u8>) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    for (index, ch) in text.chars().enumerate() {
        let origin_x = x + index as i32 * GLYPH_ADVANCE * scale;
        if origin_x >= width {
            break;
        }
        for (row, pattern) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (pattern >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale {
                    let py = top + row as i32 * scale + dy;
                    if py < 0 || py >= height {
                        continue;
                    }
                    for dx in 0..scale {
                        let px = origin_x + col * scale + dx;
                        if px >= 0 && px < width {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}
