/// 缺陷可视化 (Defect Visualizer)
///
/// 系统架构:
/// 1. 订阅线程: 每话题一个,接收 → 解码 → 叠加 → 入队
/// 2. 主线程:   固定节奏轮询各话题队列,合成网格画面 (可定期存快照)
/// 3. 演示线程: `--demo` 时在进程内总线上发布合成帧
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use defect_visualizer::bus::{self, TopicEndpoint};
use defect_visualizer::config::{self, parse_topic_list, EnvConfig, VisualizerConfig};
use defect_visualizer::demo::{demo_labels, DemoPublisher};
use defect_visualizer::display::DisplayMultiplexer;
use defect_visualizer::logging::init_logging;
use defect_visualizer::persist::{FrameSink, PngDirectorySink};
use defect_visualizer::pipeline::{
    CancellationToken, SubscriberExit, SubscriberSupervisor, SupervisorEvent,
};

const DEMO_TOPICS: &str = "Demo/camera1_stream_results,Demo/camera2_stream_results";

/// 可视化参数
#[derive(Parser, Debug)]
#[command(author, version, about = "缺陷可视化 - 多路标注帧订阅与显示", long_about = None)]
struct Args {
    /// JSON配置文件 (labels / save_image / display ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 订阅话题 `publisher/topic,...` (默认读取 SubTopics)
    #[arg(short, long)]
    topics: Option<String>,

    /// 所有话题共用的 ZeroMQ 地址 (默认读取 `<topic>_cfg`)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// 使用进程内演示发布端
    #[arg(long)]
    demo: bool,

    /// 定期把合成画面保存到该目录
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// 快照间隔(秒)
    #[arg(long, default_value_t = 5)]
    snapshot_every: u64,

    /// 运行时长(秒),默认一直运行
    #[arg(long)]
    duration: Option<u64>,

    /// 全屏显示
    #[arg(short, long)]
    fullscreen: bool,
}

fn env_flag(key: &str) -> Result<bool> {
    match std::env::var(key) {
        Ok(value) => Ok(config::strtobool(key, &value)?),
        Err(_) => Ok(false),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dev_mode = env_flag("DEV_MODE")?;
    let log_level = std::env::var("PY_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    init_logging(&log_level, dev_mode)?;

    let mut config = match &args.config {
        Some(path) => VisualizerConfig::load(path)
            .with_context(|| format!("配置加载失败: {}", path.display()))?,
        None => VisualizerConfig::default(),
    };
    config.display.fullscreen |= args.fullscreen;
    if config.display.fullscreen {
        info!("🖥️ 全屏模式");
    }

    info!("🚀 缺陷可视化启动 (dev_mode={})", dev_mode);

    // ========== 话题与连接 ==========
    let mut demo_publishers = Vec::new();
    let endpoints: Vec<TopicEndpoint> = if args.demo {
        let topics = parse_topic_list(args.topics.as_deref().unwrap_or(DEMO_TOPICS))?;
        let mut labels: Vec<_> = config
            .labels
            .topics()
            .map(|t| (t.to_string(), config.labels.for_topic(t).cloned().unwrap_or_default()))
            .collect();
        let mut endpoints = Vec::new();
        for (index, spec) in topics.into_iter().enumerate() {
            if config.labels.for_topic(&spec.topic).is_none() {
                labels.push((spec.topic.clone(), demo_labels()));
            }
            let (publisher, subscriber) = bus::channel();
            demo_publishers.push(DemoPublisher::new(publisher, spec.topic.clone(), index as u64));
            endpoints.push(TopicEndpoint::new(spec.topic, subscriber));
        }
        config.labels = labels.into_iter().collect();
        endpoints
    } else {
        network_endpoints(&args)?
    };
    if endpoints.is_empty() {
        bail!("没有可订阅的话题 (设置 SubTopics 或 --topics)");
    }
    config.print_summary();

    // ========== 落盘 ==========
    let sink: Option<Arc<dyn FrameSink>> = if config.save_image {
        let dir = std::env::var("IMAGE_DIR").context("save_image 需要 IMAGE_DIR")?;
        Some(Arc::new(PngDirectorySink::new(dir)?))
    } else {
        None
    };

    // ========== 启动订阅线程 ==========
    let handle = SubscriberSupervisor::start(endpoints, config.pipeline_context(sink));

    let demo_token = CancellationToken::new();
    let mut demo_threads = Vec::new();
    for publisher in demo_publishers {
        demo_threads.push(publisher.spawn(Duration::from_millis(66), demo_token.clone())?);
    }

    if let Some(dir) = &args.snapshot {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("无法创建快照目录: {}", dir.display()))?;
    }

    // ========== 主线程: 显示轮询 ==========
    let display_token = CancellationToken::new();
    let mut mux = DisplayMultiplexer::new(handle.queues().clone(), config.display.clone());
    let started = Instant::now();
    let mut last_snapshot = Instant::now();
    let snapshot_every = Duration::from_secs(args.snapshot_every.max(1));
    let deadline = args.duration.map(Duration::from_secs);
    let total = handle.topics().count();
    let mut finished = 0;

    mux.run(&display_token, |mux, _updated| {
        for event in handle.events().try_iter() {
            match event {
                SupervisorEvent::SubscriberStopped { topic } => info!("订阅已停止: {}", topic),
                SupervisorEvent::SubscriberFailed { topic, error } => {
                    error!("❌ 订阅失败 {}: {}", topic, error)
                }
            }
            finished += 1;
        }
        if finished >= total {
            warn!("⚠️ 所有订阅线程均已退出");
            display_token.cancel();
        }

        if let Some(dir) = &args.snapshot {
            if last_snapshot.elapsed() >= snapshot_every {
                let path = dir.join(format!(
                    "mosaic_{}.png",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ));
                match mux.mosaic().save(&path) {
                    Ok(()) => info!("📸 快照已保存: {}", path.display()),
                    Err(e) => warn!("⚠️ 快照保存失败: {}", e),
                }
                last_snapshot = Instant::now();
            }
        }

        if deadline.is_some_and(|d| started.elapsed() >= d) {
            display_token.cancel();
        }
    });

    // ========== 退出 ==========
    for (topic, stats) in handle
        .topics()
        .filter_map(|t| handle.stats(t).map(|s| (t.to_string(), s)))
        .collect::<Vec<_>>()
    {
        info!(
            "📊 {}: 接收{} | 渲染{} | 丢弃(格式){} | 丢弃(队列){}",
            topic, stats.received, stats.rendered, stats.malformed, stats.queue_dropped
        );
    }
    let exits = handle.shutdown();
    // 订阅先退出,演示发布端随后停止
    demo_token.cancel();
    for thread in demo_threads {
        let _ = thread.join();
    }
    let failed = exits
        .iter()
        .filter(|(_, exit)| matches!(exit, SubscriberExit::Failed(_)))
        .count();
    info!("✅ 可视化退出 ({}/{} 个订阅失败)", failed, exits.len());
    if failed == exits.len() {
        bail!("所有订阅均失败");
    }
    Ok(())
}

/// 按 SubTopics/`<topic>_cfg` 或命令行参数建立 ZeroMQ 订阅
#[cfg(feature = "zmq")]
fn network_endpoints(args: &Args) -> Result<Vec<TopicEndpoint>> {
    use defect_visualizer::bus::zmq::ZmqConnection;

    let context = Arc::new(zmq::Context::new());
    let pairs: Vec<(String, String)> = match (&args.topics, &args.endpoint) {
        (Some(topics), Some(endpoint)) => parse_topic_list(topics)?
            .into_iter()
            .map(|spec| (spec.topic, endpoint.clone()))
            .collect(),
        (Some(_), None) | (None, Some(_)) => {
            bail!("--topics 与 --endpoint 需要同时指定")
        }
        (None, None) => EnvConfig::from_env()?
            .topics
            .into_iter()
            .map(|(spec, connection)| {
                let endpoint = connection.zmq_endpoint(&spec.topic);
                (spec.topic, endpoint)
            })
            .collect(),
    };
    Ok(pairs
        .into_iter()
        .map(|(topic, endpoint)| {
            info!("📡 {} ← {}", topic, endpoint);
            TopicEndpoint::new(topic, ZmqConnection::new(context.clone(), endpoint))
        })
        .collect())
}

#[cfg(not(feature = "zmq"))]
fn network_endpoints(args: &Args) -> Result<Vec<TopicEndpoint>> {
    if args.topics.is_none() {
        EnvConfig::from_env()?;
    }
    bail!("未启用 `zmq` feature,只能使用 --demo")
}
