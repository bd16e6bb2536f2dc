//! 全部主题队列的只读索引 (启动时建立,之后不再变化)
use std::collections::HashMap;
use std::sync::Arc;

use super::{AnnotatedFrame, TopicQueue};

#[derive(Debug, Default, Clone)]
pub struct TopicQueues {
    order: Vec<Arc<TopicQueue>>,
    index: HashMap<String, usize>,
}

impl TopicQueues {
    /// 按给定顺序为每个主题建队列,重复主题只建一次
    pub fn new<I, S>(topics: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queues = Self::default();
        for topic in topics {
            let topic = topic.into();
            if queues.index.contains_key(&topic) {
                continue;
            }
            queues.index.insert(topic.clone(), queues.order.len());
            queues.order.push(Arc::new(TopicQueue::new(topic, capacity)));
        }
        queues
    }

    pub fn get(&self, topic: &str) -> Option<&Arc<TopicQueue>> {
        self.index.get(topic).map(|&i| &self.order[i])
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|q| q.topic())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TopicQueue>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 未知主题返回 None
    pub fn pop_latest_or_none(&self, topic: &str) -> Option<AnnotatedFrame> {
        self.get(topic).and_then(|q| q.pop_latest_or_none())
    }

    pub fn dropped(&self, topic: &str) -> Option<u64> {
        self.get(topic).map(|q| q.dropped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_topics_keep_order_and_dedup() {
        let queues = TopicQueues::new(["b", "a", "b", "c"], 3);
        assert_eq!(queues.topics().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(queues.get("a").map(|q| q.capacity()), Some(3));
        assert!(queues.get("zzz").is_none());
        assert_eq!(queues.dropped("zzz"), None);
    }

    #[test]
    fn test_queues_are_isolated() {
        let queues = TopicQueues::new(["a", "b"], 1);
        let frame = |topic: &str| AnnotatedFrame {
            topic: topic.into(),
            image: RgbImage::new(1, 1),
            sequence: 0,
        };
        let a = queues.get("a").unwrap();
        a.push(frame("a"));
        a.push(frame("a"));

        assert_eq!(queues.dropped("a"), Some(1));
        assert_eq!(queues.dropped("b"), Some(0));
        assert!(queues.pop_latest_or_none("b").is_none());
        assert_eq!(queues.pop_latest_or_none("a").map(|f| f.topic), Some("a".into()));
    }
}
