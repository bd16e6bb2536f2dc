/// 显示复用器 (DisplayMultiplexer)
/// Consumer side of the topic queues
///
/// 每次轮询从每个话题队列最多取一帧;队列为空时保留上一帧,
/// 从未收到帧的话题显示 "DISCONNECTED" 占位图。
use std::thread;
use std::time::{Duration, Instant};

use image::{Rgb, RgbImage};
use tracing::{debug, info};

use super::mosaic::compose_mosaic;
use super::DisplayConfig;
use crate::overlay::TextPainter;
use crate::pipeline::CancellationToken;
use crate::queue::TopicQueues;

/// 单个话题的显示状态
#[derive(Debug, Clone)]
pub struct TopicTile {
    pub topic: String,
    pub image: RgbImage,
    pub last_sequence: Option<u64>, // None = 尚未收到
    pub updates: u64,
}

impl TopicTile {
    pub fn is_connected(&self) -> bool {
        self.last_sequence.is_some()
    }
}

pub struct DisplayMultiplexer {
    queues: TopicQueues,
    tiles: Vec<TopicTile>,
    config: DisplayConfig,
}

/// 黑底白字占位图
pub fn disconnected_tile(size: u32) -> RgbImage {
    let size = size.max(1);
    let mut tile = RgbImage::new(size, size);
    let painter = TextPainter::bitmap(2);
    let baseline = (size as i32 * 5 / 6).max(painter.line_height());
    painter.draw(&mut tile, "Disconnected", 20, baseline, Rgb([255, 255, 255]));
    tile
}

impl DisplayMultiplexer {
    pub fn new(queues: TopicQueues, config: DisplayConfig) -> Self {
        let blank = disconnected_tile(config.tile_size);
        let tiles = queues
            .topics()
            .map(|topic| TopicTile {
                topic: topic.to_string(),
                image: blank.clone(),
                last_sequence: None,
                updates: 0,
            })
            .collect();
        Self {
            queues,
            tiles,
            config,
        }
    }

    pub fn tiles(&self) -> &[TopicTile] {
        &self.tiles
    }

    pub fn tile(&self, topic: &str) -> Option<&TopicTile> {
        self.tiles.iter().find(|t| t.topic == topic)
    }

    /// 轮询一次,返回本次有新帧的话题数
    pub fn poll(&mut self) -> usize {
        let mut updated = 0;
        for tile in &mut self.tiles {
            if let Some(frame) = self.queues.pop_latest_or_none(&tile.topic) {
                tile.image = frame.image;
                tile.last_sequence = Some(frame.sequence);
                tile.updates += 1;
                updated += 1;
            }
        }
        updated
    }

    /// 全部话题合成一张窗口图
    pub fn mosaic(&self) -> RgbImage {
        let images: Vec<&RgbImage> = self.tiles.iter().map(|t| &t.image).collect();
        compose_mosaic(&images, self.config.window_width, self.config.window_height)
    }

    /// 按 refresh_ms 固定节奏轮询直到取消,每次轮询后回调
    pub fn run<F>(&mut self, token: &CancellationToken, mut on_refresh: F)
    where
        F: FnMut(&DisplayMultiplexer, usize),
    {
        let cadence = Duration::from_millis(self.config.refresh_ms.max(1));
        info!(
            "🖥️ 显示循环启动: {} 个话题, 刷新周期 {:?}",
            self.tiles.len(),
            cadence
        );
        while !token.is_cancelled() {
            let started = Instant::now();
            let updated = self.poll();
            if updated > 0 {
                debug!("刷新 {} 个画面", updated);
            }
            on_refresh(&*self, updated);
            if let Some(rest) = cadence.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        info!("显示循环退出");
    }
}
