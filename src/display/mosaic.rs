//! 网格合成: 列数 = n/2 + 1,单话题占满窗口
use image::imageops::{self, FilterType};
use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl MosaicLayout {
    pub fn for_topics(count: usize, window_width: u32, window_height: u32) -> Self {
        let count = count.max(1) as u32;
        let columns = if count == 1 { 1 } else { count / 2 + 1 };
        let rows = count.div_ceil(columns);
        Self {
            columns,
            rows,
            cell_width: (window_width / columns).max(1),
            cell_height: (window_height / rows).max(1),
        }
    }

    /// 第 index 个格子的左上角
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (
            (index % self.columns) * self.cell_width,
            (index / self.columns) * self.cell_height,
        )
    }
}

/// 缩放到指定宽度;高度 = 宽 / (宽高比 + 0.1)
pub fn scale_to_width(image: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || width == 0 {
        return RgbImage::new(width.max(1), 1);
    }
    let aspect = w as f64 / h as f64 + 0.1;
    let height = ((width as f64 / aspect).round() as u32).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// 按顺序把各话题画面放进网格,超出格子的部分裁掉
pub fn compose_mosaic(tiles: &[&RgbImage], window_width: u32, window_height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(window_width.max(1), window_height.max(1));
    let layout = MosaicLayout::for_topics(tiles.len(), window_width, window_height);

    for (index, tile) in tiles.iter().enumerate() {
        let scaled = scale_to_width(tile, layout.cell_width);
        let visible_height = scaled.height().min(layout.cell_height);
        let cropped = imageops::crop_imm(&scaled, 0, 0, scaled.width(), visible_height).to_image();
        let (x, y) = layout.origin(index);
        imageops::replace(&mut canvas, &cropped, x as i64, y as i64);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_layout_matches_grid_rule() {
        assert_eq!(
            MosaicLayout::for_topics(1, 600, 600),
            MosaicLayout { columns: 1, rows: 1, cell_width: 600, cell_height: 600 }
        );
        let two = MosaicLayout::for_topics(2, 600, 600);
        assert_eq!((two.columns, two.rows), (2, 1));
        let three = MosaicLayout::for_topics(3, 600, 600);
        assert_eq!((three.columns, three.rows), (2, 2));
        let five = MosaicLayout::for_topics(5, 600, 600);
        assert_eq!((five.columns, five.rows, five.cell_width), (3, 2, 200));
        assert_eq!(five.origin(4), (200, 300));
    }

    #[test]
    fn test_scale_keeps_aspect_ratio() {
        let image = RgbImage::new(400, 200);
        // 600 / (2.0 + 0.1) = 285.7
        assert_eq!(scale_to_width(&image, 600).dimensions(), (600, 286));
    }

    #[test]
    fn test_compose_places_tiles_in_cells() {
        let red = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(10, 10, Rgb([0, 255, 0]));
        let canvas = compose_mosaic(&[&red, &green], 200, 100);

        assert_eq!(canvas.dimensions(), (200, 100));
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*canvas.get_pixel(110, 10), Rgb([0, 255, 0]));
    }
}
