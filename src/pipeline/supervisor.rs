/// 订阅监督者 (SubscriberSupervisor)
/// Spawns one named thread per topic endpoint and hands back a control handle
///
/// start 立即返回;线程退出 (包括 panic) 时发送 SupervisorEvent,不自动重启。
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{error, info, warn};

use super::cancel::CancellationToken;
use super::stats::{StatsSnapshot, SubscriberStats};
use super::subscriber::{SubscriberExit, TopicSubscriber};
use super::PipelineContext;
use crate::bus::TopicEndpoint;
use crate::queue::TopicQueues;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// 被取消后正常退出
    SubscriberStopped { topic: String },
    /// 连接失败或订阅中断,其它话题不受影响
    SubscriberFailed { topic: String, error: String },
}

struct Worker {
    topic: String,
    token: CancellationToken,
    handle: Option<JoinHandle<SubscriberExit>>,
    spawn_error: Option<String>,
}

pub struct SubscriberSupervisor;

impl SubscriberSupervisor {
    /// 每个 (话题, 连接) 启动一个线程
    pub fn start(endpoints: Vec<TopicEndpoint>, context: PipelineContext) -> SupervisorHandle {
        let queues = TopicQueues::new(
            endpoints.iter().map(|e| e.topic.clone()),
            context.queue_capacity,
        );
        let (events_tx, events_rx) = unbounded();
        let mut workers = Vec::with_capacity(endpoints.len());
        let mut stats = HashMap::new();

        for endpoint in endpoints {
            let TopicEndpoint { topic, connection } = endpoint;
            let Some(queue) = queues.get(&topic).cloned() else {
                continue;
            };
            let token = CancellationToken::new();
            let subscriber =
                TopicSubscriber::new(topic.clone(), connection, queue, &context, token.clone());
            stats.insert(topic.clone(), subscriber.stats());

            let events = events_tx.clone();
            let thread_topic = topic.clone();
            let spawned = thread::Builder::new()
                .name(format!("sub-{}", topic))
                .spawn(move || {
                    let exit = panic::catch_unwind(AssertUnwindSafe(|| subscriber.run()))
                        .unwrap_or_else(|payload| {
                            let reason = panic_reason(payload.as_ref());
                            error!("❌ 订阅线程 {} panic: {}", thread_topic, reason);
                            SubscriberExit::Failed(format!("subscriber panicked: {}", reason))
                        });
                    notify(&events, &thread_topic, &exit);
                    exit
                });

            let (handle, spawn_error) = match spawned {
                Ok(handle) => (Some(handle), None),
                Err(e) => {
                    error!("❌ 无法启动订阅线程 {}: {}", topic, e);
                    let exit = SubscriberExit::Failed(e.to_string());
                    notify(&events_tx, &topic, &exit);
                    (None, Some(e.to_string()))
                }
            };
            workers.push(Worker {
                topic,
                token,
                handle,
                spawn_error,
            });
        }

        info!("🚀 已启动 {} 个订阅线程", workers.len());
        SupervisorHandle {
            workers,
            events: events_rx,
            stats,
            queues,
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn notify(events: &Sender<SupervisorEvent>, topic: &str, exit: &SubscriberExit) {
    let event = match exit {
        SubscriberExit::Cancelled => SupervisorEvent::SubscriberStopped {
            topic: topic.to_string(),
        },
        SubscriberExit::Failed(error) => SupervisorEvent::SubscriberFailed {
            topic: topic.to_string(),
            error: error.clone(),
        },
    };
    // 句柄已释放时无人关心事件
    let _ = events.send(event);
}

pub struct SupervisorHandle {
    workers: Vec<Worker>,
    events: Receiver<SupervisorEvent>,
    stats: HashMap<String, Arc<SubscriberStats>>,
    queues: TopicQueues,
}

impl SupervisorHandle {
    /// 显示端读取的队列集合
    pub fn queues(&self) -> &TopicQueues {
        &self.queues
    }

    pub fn events(&self) -> &Receiver<SupervisorEvent> {
        &self.events
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.workers.iter().map(|w| w.topic.as_str())
    }

    pub fn stats(&self, topic: &str) -> Option<StatsSnapshot> {
        self.stats.get(topic).map(|s| s.snapshot())
    }

    /// 仍在运行的线程数
    pub fn running(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.handle.as_ref().is_some_and(|h| !h.is_finished()))
            .count()
    }

    pub fn cancel(&self) {
        for worker in &self.workers {
            worker.token.cancel();
        }
    }

    /// 只取消一个话题
    pub fn cancel_topic(&self, topic: &str) -> bool {
        let mut found = false;
        for worker in self.workers.iter().filter(|w| w.topic == topic) {
            worker.token.cancel();
            found = true;
        }
        found
    }

    /// 等待全部线程退出,按启动顺序返回每个话题的结果
    pub fn join(mut self) -> Vec<(String, SubscriberExit)> {
        self.workers
            .drain(..)
            .map(|mut worker| {
                let exit = match (worker.handle.take(), worker.spawn_error.take()) {
                    (Some(handle), _) => handle.join().unwrap_or_else(|_| {
                        warn!("订阅线程 {} panic", worker.topic);
                        SubscriberExit::Failed("subscriber thread panicked".to_string())
                    }),
                    (None, Some(error)) => SubscriberExit::Failed(error),
                    (None, None) => SubscriberExit::Cancelled,
                };
                (worker.topic, exit)
            })
            .collect()
    }

    pub fn shutdown(self) -> Vec<(String, SubscriberExit)> {
        self.cancel();
        self.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{channel, BusMessage, Connect, Subscriber, TransportError, TransportResult};
    use std::time::Duration;

    struct Refused;

    impl Connect for Refused {
        fn connect(self: Box<Self>, _topic: &str) -> TransportResult<Box<dyn Subscriber>> {
            Err(TransportError::ConnectFailed("refused".into()))
        }

        fn describe(&self) -> String {
            "refused".into()
        }
    }

    struct Exploding;

    struct ExplodingSubscriber;

    impl Subscriber for ExplodingSubscriber {
        fn receive_timeout(&mut self, _timeout: Duration) -> TransportResult<BusMessage> {
            panic!("receive blew up");
        }

        fn transport_type(&self) -> &str {
            "exploding"
        }
    }

    impl Connect for Exploding {
        fn connect(self: Box<Self>, _topic: &str) -> TransportResult<Box<dyn Subscriber>> {
            Ok(Box::new(ExplodingSubscriber))
        }

        fn describe(&self) -> String {
            "exploding".into()
        }
    }

    fn context() -> PipelineContext {
        PipelineContext {
            poll_timeout: Duration::from_millis(10),
            ..PipelineContext::default()
        }
    }

    #[test]
    fn test_failed_connection_reports_event() {
        let (_publisher, rx) = channel();
        let handle = SubscriberSupervisor::start(
            vec![TopicEndpoint::new("ok", rx), TopicEndpoint::new("bad", Refused)],
            context(),
        );

        let event = handle.events().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            event,
            SupervisorEvent::SubscriberFailed {
                topic: "bad".into(),
                error: "connect failed: refused".into()
            }
        );

        let exits = handle.shutdown();
        assert_eq!(exits[0], ("ok".to_string(), SubscriberExit::Cancelled));
        assert!(matches!(exits[1].1, SubscriberExit::Failed(_)));
    }

    #[test]
    fn test_panicking_subscriber_reports_failure() {
        let (_publisher, rx) = channel();
        let handle = SubscriberSupervisor::start(
            vec![TopicEndpoint::new("boom", Exploding), TopicEndpoint::new("ok", rx)],
            context(),
        );

        let event = handle.events().recv_timeout(Duration::from_secs(5)).unwrap();
        match event {
            SupervisorEvent::SubscriberFailed { topic, error } => {
                assert_eq!(topic, "boom");
                assert!(error.contains("receive blew up"), "{}", error);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let exits = handle.shutdown();
        assert!(matches!(exits[0].1, SubscriberExit::Failed(ref e) if e.contains("panicked")));
        assert_eq!(exits[1], ("ok".to_string(), SubscriberExit::Cancelled));
    }

    #[test]
    fn test_panic_reason_from_payload() {
        let text: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_reason(text.as_ref()), "static");
        assert_eq!(panic_reason(owned.as_ref()), "owned");
        assert_eq!(panic_reason(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_frames_reach_topic_queue() {
        let (publisher, rx) = channel();
        let handle = SubscriberSupervisor::start(vec![TopicEndpoint::new("cam", rx)], context());
        publisher
            .send(BusMessage::new(
                serde_json::json!({"height": 1, "width": 1, "channels": 1}),
                vec![7],
            ))
            .unwrap();

        let mut frame = None;
        for _ in 0..500 {
            frame = handle.queues().pop_latest_or_none("cam");
            if frame.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let frame = frame.unwrap();
        assert_eq!(frame.image.get_pixel(0, 0).0, [7, 7, 7]);
        assert_eq!(handle.stats("cam").unwrap().rendered, 1);

        assert!(handle.cancel_topic("cam"));
        assert_eq!(
            handle.events().recv_timeout(Duration::from_secs(5)).unwrap(),
            SupervisorEvent::SubscriberStopped { topic: "cam".into() }
        );
        handle.join();
    }
}
