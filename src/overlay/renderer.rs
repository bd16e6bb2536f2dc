/// 叠加渲染器 (OverlayRenderer)
/// 职责: 解码帧 + 元数据 → 标注帧
///
/// 固定顺序:
/// 1. RegionList 检测框 + 标签 (标签偏移在整帧内累加)
/// 2. DefectList 缺陷框 + 标签 (话题没有标签表时只画框)
/// 3. 整帧边框 (有缺陷红色 / 无缺陷绿色 / 无该字段不加)
/// 4. Fps 指标文字
/// 5. display_info 状态信息 (按优先级着色,坏条目逐条跳过)
use std::collections::HashSet;

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, error};

use super::style::OverlayStyle;
use super::text::TextPainter;
use crate::annotation::{label_key, AnnotationRecord, DisplayInfo, TopicLabels};
use crate::frame::PixelBuffer;

// 文字布局 (基线左端)
const REGION_LABEL_STEP: i32 = 10;
const DEFECT_LABEL_OFFSET: i32 = 20;
const METRIC_ORIGIN: (i32, i32) = (20, 20);
const METRIC_STEP: i32 = 20;
const INFO_ORIGIN: (i32, i32) = (20, 50);
const INFO_STEP: i32 = 10;

/// 单帧渲染统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayReport {
    pub region_boxes: usize,
    pub defect_boxes: usize,
    pub labels_drawn: usize,
    /// 本帧中找不到映射的 id (去重,按出现顺序)
    pub unknown_labels: Vec<String>,
    pub border: Option<Rgb<u8>>,
    pub metric_lines: usize,
    pub info_lines: usize,
    pub skipped_info: usize,
}

#[derive(Debug)]
pub struct OverlayRenderer {
    style: OverlayStyle,
    text: TextPainter,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        let text = TextPainter::from_style(&style);
        Self { style, text }
    }

    pub fn with_painter(style: OverlayStyle, text: TextPainter) -> Self {
        Self { style, text }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn render(
        &self,
        frame: PixelBuffer,
        record: &AnnotationRecord,
        labels: Option<&TopicLabels>,
    ) -> RgbImage {
        self.render_with_report(frame, record, labels).0
    }

    pub fn render_with_report(
        &self,
        frame: PixelBuffer,
        record: &AnnotationRecord,
        labels: Option<&TopicLabels>,
    ) -> (RgbImage, OverlayReport) {
        let mut image = frame.into_rgb8();
        let mut report = OverlayReport::default();
        let mut unknown = HashSet::new();
        let bad = self.style.bad();

        // 1. RegionList
        let mut offset: i32 = 0;
        for region in record.regions.iter().flatten() {
            let (tl, br) = region.corners();
            self.draw_box(&mut image, tl, br, bad);
            report.region_boxes += 1;

            for tensor in &region.tensor {
                let Some(id) = label_key(&tensor.label_id) else {
                    continue;
                };
                let pos = (tl.0, tl.1.saturating_sub(offset));
                offset = offset.saturating_add(REGION_LABEL_STEP);
                match labels.and_then(|l| l.get(&id)) {
                    Some(text) => {
                        self.text.draw(&mut image, text, pos.0, pos.1, bad);
                        report.labels_drawn += 1;
                    }
                    None => {
                        if unknown.insert(id.clone()) {
                            error!("Label id:{} not found", id);
                            report.unknown_labels.push(id);
                        }
                    }
                }
            }
        }

        // 2. DefectList
        for defect in record.defects.iter().flatten() {
            let (tl, br) = defect.corners();
            self.draw_box(&mut image, tl, br, bad);
            report.defect_boxes += 1;

            let Some(labels) = labels else {
                continue;
            };
            let pos = (tl.0, br.1.saturating_add(DEFECT_LABEL_OFFSET));
            let raw = label_key(&defect.kind).unwrap_or_else(|| defect.kind.to_string());
            let text = match labels.get(&raw) {
                Some(text) => text.as_str(),
                None => {
                    if unknown.insert(raw.clone()) {
                        error!("Defect type:{} not found in label map", raw);
                        report.unknown_labels.push(raw.clone());
                    }
                    raw.as_str()
                }
            };
            self.text.draw(&mut image, text, pos.0, pos.1, bad);
            report.labels_drawn += 1;
        }

        // 3. 边框
        if let Some(has_defects) = record.has_defects() {
            let color = if has_defects { bad } else { self.style.good() };
            image = add_border(&image, self.style.border_width, color);
            report.border = Some(color);
        }

        // 4. Fps 指标
        let (x, mut y) = METRIC_ORIGIN;
        for metric in &record.metrics {
            let line = metric.to_string();
            debug!("{}", line);
            self.text.draw(&mut image, &line, x, y, self.style.good());
            report.metric_lines += 1;
            y += METRIC_STEP;
        }

        // 5. display_info
        let (dx, mut dy) = INFO_ORIGIN;
        for entry in record.display_info.iter().flatten() {
            match DisplayInfo::from_value(entry) {
                Ok(info) => {
                    dy += INFO_STEP;
                    let color = self.style.priority_color(info.priority);
                    self.text.draw(&mut image, &info.info, dx, dy, color);
                    report.info_lines += 1;
                }
                Err(e) => {
                    error!("Invalid display_info entry {}: {}", entry, e);
                    report.skipped_info += 1;
                }
            }
        }

        (image, report)
    }

    /// 线宽为 box_thickness 的空心矩形,向内加粗
    ///
    /// 坐标先裁到画面外扩 thickness 的范围内: 画面外的边不可见,
    /// 裁剪后绘制量只与画面大小有关。
    fn draw_box(&self, image: &mut RgbImage, tl: (i32, i32), br: (i32, i32), color: Rgb<u8>) {
        let thickness = self.style.box_thickness.max(1) as i64;
        let clip = |v: i32, limit: u32| (v as i64).clamp(-thickness, limit as i64 + thickness);
        let (x1, x2) = (clip(tl.0.min(br.0), image.width()), clip(tl.0.max(br.0), image.width()));
        let (y1, y2) = (clip(tl.1.min(br.1), image.height()), clip(tl.1.max(br.1), image.height()));
        for i in 0..thickness {
            let w = x2 - x1 - 2 * i + 1;
            let h = y2 - y1 - 2 * i + 1;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at((x1 + i) as i32, (y1 + i) as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }
}

/// 四周加等宽纯色边框
pub fn add_border(image: &RgbImage, width: u32, color: Rgb<u8>) -> RgbImage {
    let mut bordered =
        RgbImage::from_pixel(image.width() + 2 * width, image.height() + 2 * width, color);
    imageops::replace(&mut bordered, image, width as i64, width as i64);
    bordered
}
