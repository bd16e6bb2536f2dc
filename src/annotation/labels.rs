/// 标签映射 (启动时加载一次,之后只读)
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 单个话题的 id → 标签文本
pub type TopicLabels = HashMap<String, String>;

/// 话题 → 标签映射
///
/// 构造后包进 `Arc` 交给所有订阅线程,读取无需加锁。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(HashMap<String, TopicLabels>);

impl LabelMap {
    pub fn new(map: HashMap<String, TopicLabels>) -> Self {
        Self(map)
    }

    pub fn for_topic(&self, topic: &str) -> Option<&TopicLabels> {
        self.0.get(topic)
    }

    pub fn lookup(&self, topic: &str, id: &str) -> Option<&str> {
        self.for_topic(topic)
            .and_then(|labels| labels.get(id))
            .map(String::as_str)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, TopicLabels)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (String, TopicLabels)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_topic() {
        let map: LabelMap = serde_json::from_str(
            r#"{"camera1_stream_results": {"0": "MISSING", "1": "SHORT"}}"#,
        )
        .unwrap();

        assert_eq!(map.lookup("camera1_stream_results", "1"), Some("SHORT"));
        assert_eq!(map.lookup("camera1_stream_results", "7"), None);
        assert_eq!(map.lookup("camera2_stream_results", "0"), None);
        assert_eq!(map.len(), 1);
    }
}
