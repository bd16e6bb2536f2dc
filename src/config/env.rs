//! 环境变量配置
use std::path::PathBuf;

use super::strtobool;
use super::topics::{parse_topic_cfg, parse_topic_list, ConnectionSpec, TopicSpec};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    pub app_name: String,
    pub dev_mode: bool,
    pub log_level: String,
    pub image_dir: Option<PathBuf>,
    /// (话题, 连接配置),按 SubTopics 顺序
    pub topics: Vec<(TopicSpec, ConnectionSpec)>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 缺少 SubTopics 或某个 `<topic>_cfg` 时报错
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dev_mode = match lookup("DEV_MODE") {
            Some(value) => strtobool("DEV_MODE", &value)?,
            None => false,
        };
        let log_level = lookup("PY_LOG_LEVEL").unwrap_or_else(|| "INFO".to_string());
        let app_name = lookup("AppName").unwrap_or_else(|| "Visualizer".to_string());
        let image_dir = lookup("IMAGE_DIR")
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        let sub_topics =
            lookup("SubTopics").ok_or_else(|| ConfigError::MissingEnv("SubTopics".into()))?;
        let topics = parse_topic_list(&sub_topics)?
            .into_iter()
            .map(|spec| {
                let key = format!("{}_cfg", spec.topic);
                let value = lookup(&key).ok_or(ConfigError::MissingEnv(key))?;
                let connection = parse_topic_cfg(&spec.topic, &value)?;
                Ok((spec, connection))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            app_name,
            dev_mode,
            log_level,
            image_dir,
            topics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_full_environment() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("DEV_MODE", "true"),
            ("PY_LOG_LEVEL", "debug"),
            ("AppName", "Visualizer"),
            ("IMAGE_DIR", "/saved_images"),
            ("SubTopics", "VideoAnalytics/camera1_stream_results"),
            ("camera1_stream_results_cfg", "zmq_tcp,127.0.0.1:65013"),
        ]))
        .unwrap();

        assert!(env.dev_mode);
        assert_eq!(env.log_level, "debug");
        assert_eq!(env.image_dir, Some(PathBuf::from("/saved_images")));
        assert_eq!(env.topics.len(), 1);
        assert_eq!(env.topics[0].0.topic, "camera1_stream_results");
        assert_eq!(env.topics[0].1.address, "127.0.0.1:65013");
    }

    #[test]
    fn test_missing_topic_cfg() {
        let err = EnvConfig::from_lookup(lookup(&[("SubTopics", "P/cam")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref key) if key == "cam_cfg"));

        let err = EnvConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref key) if key == "SubTopics"));
    }

    #[test]
    fn test_invalid_dev_mode() {
        let err = EnvConfig::from_lookup(lookup(&[("DEV_MODE", "sometimes"), ("SubTopics", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
