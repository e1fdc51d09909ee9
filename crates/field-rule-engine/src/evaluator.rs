//! 规则评估器
//!
//! 按规则种类把规范化器、解析器和匹配器组合成一次通过/失败判定。
//! 三类结果分别走不同通道：
//! - 配置错误（规则挂错字段类型等）返回 `Err`
//! - 校验失败返回 `Ok(Outcome::Fail)`
//! - 数据缺失时软跳过，返回 `Ok(Outcome::Pass)` 并通知 [`SkipObserver`]

use crate::containment::ContainmentMatcher;
use crate::diagnostics::{SkipObserver, SkipReason, TracingSkipObserver};
use crate::error::{Result, RuleError};
use crate::models::{Outcome, Rule, RuleKind};
use crate::numeric::{CanonicalNumber, NumericNormalizer};
use crate::resolver::FieldResolver;
use crate::schema::FieldAccess;
use crate::temporal::{Clock, SystemClock, TemporalNormalizer};
use crate::text::TextRelation;
use crate::value::Value;
use regex::Regex;
use rule_shared::config::EngineConfig;
use rule_shared::observability::metrics::record_rule_evaluation;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::debug;

static UPPER_CASE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+$"));

/// 单次评估的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Holds,
    Violated,
    Skipped(SkipReason),
}

impl Verdict {
    fn from_bool(holds: bool) -> Self {
        if holds { Self::Holds } else { Self::Violated }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Holds => "pass",
            Self::Violated => "fail",
            Self::Skipped(_) => "skip",
        }
    }
}

/// 规则评估器
pub struct RuleEvaluator {
    clock: Arc<dyn Clock>,
    observer: Arc<dyn SkipObserver>,
    message_overrides: HashMap<String, String>,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingSkipObserver::default()),
            message_overrides: HashMap::new(),
        }
    }

    /// 按引擎配置构建：跳过诊断的日志级别和失败消息覆盖
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingSkipObserver::from_config(config)),
            message_overrides: config.message_overrides.clone(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SkipObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 覆盖某一规则种类的默认失败消息模板
    pub fn with_message_override(
        mut self,
        kind: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.message_overrides.insert(kind.into(), template.into());
        self
    }

    /// 评估单条规则
    ///
    /// `value` 是声明字段的当前值，`object` 用于读取兄弟字段，
    /// `field_label` 是声明字段的展示标签，用于渲染失败消息。
    pub fn evaluate(
        &self,
        rule: &Rule,
        value: &Value,
        object: &dyn FieldAccess,
        field_label: &str,
    ) -> Result<Outcome> {
        let start = Instant::now();
        let result = self.judge(rule, value, object);
        let elapsed = start.elapsed().as_secs_f64();

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(e) => {
                record_rule_evaluation(rule.kind.name(), "error", elapsed);
                return Err(e);
            }
        };
        record_rule_evaluation(rule.kind.name(), verdict.label(), elapsed);

        match verdict {
            Verdict::Holds => Ok(Outcome::Pass),
            Verdict::Skipped(reason) => {
                self.observer.on_skip(rule, reason);
                Ok(Outcome::Pass)
            }
            Verdict::Violated => {
                let message = self.failure_message(rule, field_label);
                debug!(rule_id = %rule.id, field = %rule.field, kind = rule.kind.name(), %message, "规则未通过");
                Ok(Outcome::Fail(message))
            }
        }
    }

    /// 渲染失败消息：规则自定义模板 → 配置覆盖 → 默认模板
    pub fn failure_message(&self, rule: &Rule, field_label: &str) -> String {
        let fallback = self
            .message_overrides
            .get(rule.kind.name())
            .map(String::as_str);
        rule.render_failure_message(field_label, fallback)
    }

    fn judge(&self, rule: &Rule, value: &Value, object: &dyn FieldAccess) -> Result<Verdict> {
        if value.is_null() {
            return Ok(Verdict::Skipped(SkipReason::ValueAbsent));
        }

        let verdict = match &rule.kind {
            RuleKind::NumericCompare {
                operator,
                milestone,
            } => {
                let lhs = number(rule, value)?;
                Verdict::from_bool(operator.evaluate(lhs, *milestone))
            }
            RuleKind::NumericFieldCompare { operator, other } => {
                let lhs = number(rule, value)?;
                match sibling_value(other, object) {
                    Ok(sibling) => {
                        let rhs = NumericNormalizer::to_canonical(&sibling)
                            .ok_or_else(|| sibling_not_applicable(rule, other, &sibling))?;
                        Verdict::from_bool(operator.evaluate(lhs, rhs))
                    }
                    Err(reason) => Verdict::Skipped(reason),
                }
            }
            RuleKind::InNumericList { milestones } => {
                let member = ContainmentMatcher::is_member(milestones, value)
                    .ok_or_else(|| not_applicable(rule, value))?;
                Verdict::from_bool(member)
            }
            RuleKind::ContainsNumerics { milestones } => {
                let contains = ContainmentMatcher::contains_all(milestones, value)
                    .ok_or_else(|| not_applicable(rule, value))?;
                Verdict::from_bool(contains)
            }
            RuleKind::InstantCompare {
                operator,
                milestone,
            } => {
                let millis =
                    TemporalNormalizer::to_millis(value).ok_or_else(|| not_applicable(rule, value))?;
                Verdict::from_bool(operator.evaluate(millis, milestone.millis()))
            }
            RuleKind::CurrentTimeCompare { operator } => {
                let millis =
                    TemporalNormalizer::to_millis(value).ok_or_else(|| not_applicable(rule, value))?;
                // 每次评估都重新读取时钟
                let now = TemporalNormalizer::instant_millis(&self.clock.now());
                Verdict::from_bool(operator.evaluate(millis, now))
            }
            RuleKind::StartsWith { prefix, comparison } => {
                let text = value.as_text().ok_or_else(|| not_applicable(rule, value))?;
                Verdict::from_bool(TextRelation::StartsWith.evaluate(text, prefix, *comparison))
            }
            RuleKind::TextFieldRelation {
                relation,
                other,
                comparison,
            } => {
                let source = value.as_text().ok_or_else(|| not_applicable(rule, value))?;
                match sibling_value(other, object) {
                    Ok(Value::Text(target)) if target.is_empty() => {
                        Verdict::Skipped(SkipReason::SiblingValueAbsent)
                    }
                    Ok(Value::Text(target)) => {
                        Verdict::from_bool(relation.evaluate(source, &target, *comparison))
                    }
                    Ok(sibling) => return Err(sibling_not_applicable(rule, other, &sibling)),
                    Err(reason) => Verdict::Skipped(reason),
                }
            }
            RuleKind::UpperCase => {
                let regex = UPPER_CASE.as_ref().map_err(|e| RuleError::InvalidDefinition {
                    path: rule.field.clone(),
                    reason: e.to_string(),
                })?;
                let matched = match value {
                    Value::Text(text) => regex.is_match(text),
                    Value::Char(c) => regex.is_match(c.encode_utf8(&mut [0; 4])),
                    other => return Err(not_applicable(rule, other)),
                };
                Verdict::from_bool(matched)
            }
            RuleKind::MaxEntries { max } => match value {
                Value::Map(entries) => Verdict::from_bool(entries.len() <= *max),
                other => return Err(not_applicable(rule, other)),
            },
        };

        Ok(verdict)
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn number(rule: &Rule, value: &Value) -> Result<CanonicalNumber> {
    NumericNormalizer::to_canonical(value).ok_or_else(|| not_applicable(rule, value))
}

/// 读取兄弟字段的当前值，字段缺失或值为空时给出跳过原因
fn sibling_value(
    other: &FieldResolver,
    object: &dyn FieldAccess,
) -> std::result::Result<Value, SkipReason> {
    let resolved = other
        .resolve(object)
        .ok_or(SkipReason::SiblingFieldMissing)?;
    if resolved.value.is_null() {
        return Err(SkipReason::SiblingValueAbsent);
    }
    Ok(resolved.value)
}

fn not_applicable(rule: &Rule, value: &Value) -> RuleError {
    RuleError::NotApplicable {
        rule: rule.kind.name(),
        field: rule.field.clone(),
        actual: value.type_name(),
    }
}

fn sibling_not_applicable(rule: &Rule, other: &FieldResolver, value: &Value) -> RuleError {
    RuleError::NotApplicable {
        rule: rule.kind.name(),
        field: other.field().to_string(),
        actual: value.type_name(),
    }
}
