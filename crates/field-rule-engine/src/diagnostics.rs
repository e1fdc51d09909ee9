//! 软跳过诊断
//!
//! 值缺失、兄弟字段缺失或兄弟字段值缺失时规则自动通过。
//! 字段名拼错和"没有可检查的数据"在结果上无法区分，宿主可以通过观察者发现从未真正执行的规则。

use crate::models::Rule;
use rule_shared::config::EngineConfig;
use rule_shared::observability::metrics::record_rule_skip;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{Level, debug, error, info, trace, warn};

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 被校验字段的值为空
    ValueAbsent,
    /// 兄弟字段不在对象的字段表中
    SiblingFieldMissing,
    /// 兄弟字段的值为空
    SiblingValueAbsent,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValueAbsent => "value_absent",
            Self::SiblingFieldMissing => "sibling_field_missing",
            Self::SiblingValueAbsent => "sibling_value_absent",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 软跳过观察者
#[cfg_attr(test, mockall::automock)]
pub trait SkipObserver: Send + Sync {
    fn on_skip(&self, rule: &Rule, reason: SkipReason);
}

/// 默认观察者：输出日志并累加 `rule_skips_total` 计数
#[derive(Debug, Clone, Copy)]
pub struct TracingSkipObserver {
    level: Level,
}

impl TracingSkipObserver {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// 按引擎配置的日志级别构建，无法识别的级别使用 debug
    pub fn from_config(config: &EngineConfig) -> Self {
        let level = config.skip_log_level.parse().unwrap_or(Level::DEBUG);
        Self::new(level)
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingSkipObserver {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl SkipObserver for TracingSkipObserver {
    fn on_skip(&self, rule: &Rule, reason: SkipReason) {
        let kind = rule.kind.name();
        let sibling = rule.kind.sibling().map(|s| s.field()).unwrap_or("");

        match self.level {
            Level::TRACE => trace!(rule_id = %rule.id, field = %rule.field, kind, sibling, %reason, "规则已跳过"),
            Level::DEBUG => debug!(rule_id = %rule.id, field = %rule.field, kind, sibling, %reason, "规则已跳过"),
            Level::INFO => info!(rule_id = %rule.id, field = %rule.field, kind, sibling, %reason, "规则已跳过"),
            Level::WARN => warn!(rule_id = %rule.id, field = %rule.field, kind, sibling, %reason, "规则已跳过"),
            _ => error!(rule_id = %rule.id, field = %rule.field, kind, sibling, %reason, "规则已跳过"),
        }

        record_rule_skip(kind, reason.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Comparison;

    #[test]
    fn test_level_from_config() {
        let config = EngineConfig {
            skip_log_level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(TracingSkipObserver::from_config(&config).level(), Level::WARN);

        let config = EngineConfig {
            skip_log_level: "noisy".to_string(),
            ..Default::default()
        };
        assert_eq!(TracingSkipObserver::from_config(&config).level(), Level::DEBUG);
    }

    #[test]
    fn test_tracing_observer_does_not_panic() {
        rule_shared::observability::tracing::init_for_tests();
        let rule = Rule::numeric_field_compare("min", Comparison::Lower, "max");
        for level in [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR] {
            TracingSkipObserver::new(level).on_skip(&rule, SkipReason::SiblingValueAbsent);
        }
    }

    #[test]
    fn test_reason_names() {
        assert_eq!(SkipReason::SiblingFieldMissing.to_string(), "sibling_field_missing");
        let json = serde_json::to_string(&SkipReason::ValueAbsent).unwrap();
        assert_eq!(json, "\"value_absent\"");
    }
}
