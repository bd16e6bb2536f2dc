//! 叠加渲染: 解码 → 渲染,通过公共接口
use image::Rgb;
use serde_json::json;

use defect_visualizer::annotation::TopicLabels;
use defect_visualizer::frame::{ChannelOrder, FrameDecoder};
use defect_visualizer::overlay::{OverlayRenderer, OverlayStyle};
use defect_visualizer::AnnotationRecord;

fn labels() -> TopicLabels {
    [("1".to_string(), "person".to_string()), ("3".to_string(), "scratch".to_string())]
        .into_iter()
        .collect()
}

#[test]
fn test_both_schemas_and_status_lines() {
    let metadata = json!({
        "height": 120, "width": 160, "channels": 3,
        "gva_meta": [{"x": 80, "y": 60, "width": 40, "height": 30, "tensor": [{"label_id": 1}]}],
        "defects": [{"tl": [10, 10], "br": [50, 50], "type": 3}, {"tl": [60, 10], "br": [70, 20], "type": 8}],
        "VideoIngestionFps": 30,
        "display_info": [{"priority": 2, "info": "ALERT"}, {"priority": 7, "info": "bad"}, {"info": "x"}],
    });
    let record = AnnotationRecord::from_metadata(&metadata).unwrap();
    let frame = FrameDecoder::new(ChannelOrder::Bgr)
        .decode_message(record.frame_message(vec![0; 160 * 120 * 3]))
        .unwrap();

    let renderer = OverlayRenderer::new(OverlayStyle::default());
    let (image, report) = renderer.render_with_report(frame, &record, Some(&labels()));

    assert_eq!(image.dimensions(), (170, 130));
    assert_eq!(report.region_boxes, 1);
    assert_eq!(report.defect_boxes, 2);
    assert_eq!(report.unknown_labels, vec!["8".to_string()]);
    assert_eq!(report.metric_lines, 1);
    assert_eq!(report.info_lines, 1);
    assert_eq!(report.skipped_info, 2);
    assert_eq!(report.border, Some(Rgb([255, 0, 0])));
}

#[test]
fn test_custom_style_colors() {
    let style = OverlayStyle {
        good_color: [1, 2, 3],
        border_width: 2,
        ..OverlayStyle::default()
    };
    let record = AnnotationRecord::from_metadata(&json!({
        "height": 4, "width": 4, "channels": 1, "defects": []
    }))
    .unwrap();
    let frame = FrameDecoder::default()
        .decode_message(record.frame_message(vec![200; 16]))
        .unwrap();

    let image = OverlayRenderer::new(style).render(frame, &record, None);
    assert_eq!(image.dimensions(), (8, 8));
    assert_eq!(*image.get_pixel(0, 0), Rgb([1, 2, 3]));
    assert_eq!(*image.get_pixel(3, 3), Rgb([200, 200, 200]));
}
