//! 整体校验执行器
//!
//! [`ModelRules`] 在注册时把规则绑定到模型字段表并检查字段类型，
//! [`ModelValidator`] 对一个对象实例逐字段执行全部规则并汇总失败。

use crate::compiler::CompiledRuleSet;
use crate::error::{Result, RuleError};
use crate::evaluator::RuleEvaluator;
use crate::models::{Outcome, Rule, RuleKind};
use crate::schema::{FieldType, ModelSchema};
use rule_shared::config::EngineConfig;
use rule_shared::observability::metrics::record_model_validation;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// 绑定到模型字段表的规则集
pub struct ModelRules<T> {
    schema: Arc<ModelSchema<T>>,
    rules: Vec<Arc<Rule>>,
}

impl<T> ModelRules<T> {
    /// 绑定规则并检查字段类型兼容性
    ///
    /// 规则定义无效、声明字段不存在或类型不兼容时返回错误；兄弟字段不存在时仅记录警告，
    /// 评估时按软跳过处理。
    pub fn bind<I>(schema: Arc<ModelSchema<T>>, rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<Rule>>,
    {
        let rules: Vec<Arc<Rule>> = rules.into_iter().collect();
        for rule in &rules {
            check_rule(&schema, rule)?;
        }

        debug!(model = %schema.model_name(), rules = rules.len(), "规则已绑定");
        Ok(Self { schema, rules })
    }

    /// 绑定编译后的规则集，规则集的模型名必须与字段表一致
    pub fn from_compiled(schema: Arc<ModelSchema<T>>, compiled: &CompiledRuleSet) -> Result<Self> {
        if compiled.model != schema.model_name() {
            return Err(RuleError::InvalidDefinition {
                path: "model".to_string(),
                reason: format!(
                    "规则集模型 '{}' 与字段表模型 '{}' 不一致",
                    compiled.model,
                    schema.model_name()
                ),
            });
        }
        Self::bind(schema, compiled.rules.iter().cloned())
    }

    pub fn schema(&self) -> &ModelSchema<T> {
        &self.schema
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// 声明在指定字段上的规则
    pub fn rules_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Arc<Rule>> + 'a {
        self.rules.iter().filter(move |rule| rule.field == field)
    }
}

fn accepts(kind: &RuleKind, field_type: FieldType) -> bool {
    match kind {
        RuleKind::NumericCompare { .. }
        | RuleKind::NumericFieldCompare { .. }
        | RuleKind::InNumericList { .. } => field_type.is_numeric(),
        RuleKind::ContainsNumerics { .. } => field_type.is_numeric_container(),
        RuleKind::InstantCompare { .. } | RuleKind::CurrentTimeCompare { .. } => {
            field_type.is_temporal()
        }
        RuleKind::StartsWith { .. } | RuleKind::TextFieldRelation { .. } => field_type.is_text(),
        RuleKind::UpperCase => field_type.is_text() || field_type == FieldType::Char,
        RuleKind::MaxEntries { .. } => field_type.is_map(),
    }
}

fn check_rule<T>(schema: &ModelSchema<T>, rule: &Rule) -> Result<()> {
    rule.validate()?;

    let field = schema
        .field(&rule.field)
        .ok_or_else(|| RuleError::UnknownField {
            model: schema.model_name().to_string(),
            field: rule.field.clone(),
        })?;

    if !accepts(&rule.kind, field.field_type()) {
        return Err(RuleError::FieldTypeMismatch {
            rule: rule.kind.name(),
            model: schema.model_name().to_string(),
            field: rule.field.clone(),
            actual: field.field_type().to_string(),
        });
    }

    if let Some(sibling) = rule.kind.sibling() {
        match schema.field(sibling.field()) {
            Some(other) if !accepts(&rule.kind, other.field_type()) => {
                return Err(RuleError::FieldTypeMismatch {
                    rule: rule.kind.name(),
                    model: schema.model_name().to_string(),
                    field: sibling.field().to_string(),
                    actual: other.field_type().to_string(),
                });
            }
            Some(_) => {}
            None => {
                warn!(
                    model = %schema.model_name(),
                    field = %rule.field,
                    sibling = %sibling.field(),
                    rule_id = %rule.id,
                    "兄弟字段不存在，规则将在评估时被跳过"
                );
            }
        }
    }

    Ok(())
}

/// 单个字段的校验失败
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub label: String,
    pub rule_id: String,
    pub message: String,
}

/// 整体校验报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub model: String,
    pub failures: Vec<FieldFailure>,
    /// 已评估的规则数
    pub evaluated: usize,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_ms: i64,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// 指定字段的失败
    pub fn failures_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldFailure> + 'a {
        self.failures.iter().filter(move |f| f.field == field)
    }
}

/// 整体校验器
pub struct ModelValidator {
    evaluator: RuleEvaluator,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl ModelValidator {
    pub fn new(evaluator: RuleEvaluator) -> Self {
        Self {
            evaluator,
            trace_enabled: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            evaluator: RuleEvaluator::from_config(config),
            trace_enabled: config.trace_enabled,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    /// 按字段注册顺序执行全部规则
    ///
    /// 校验失败收集到报告中；配置错误立即中止并返回。
    pub fn validate<T>(&self, rules: &ModelRules<T>, object: &T) -> Result<ValidationReport> {
        let start = Instant::now();
        let schema = rules.schema();
        let instance = schema.instance(object);

        let mut report = ValidationReport {
            model: schema.model_name().to_string(),
            ..Default::default()
        };

        for field in schema.fields() {
            let mut field_rules = rules.rules_for(field.name()).peekable();
            if field_rules.peek().is_none() {
                continue;
            }

            let value = field.read(object);
            let label = field.label();

            for rule in field_rules {
                let outcome = self.evaluator.evaluate(rule, &value, &instance, label)?;
                report.evaluated += 1;

                if self.trace_enabled {
                    report.evaluation_trace.push(format!(
                        "{}[{}]: {} => {}",
                        field.name(),
                        rule.id,
                        rule.kind.name(),
                        if outcome.is_pass() { "PASS" } else { "FAIL" }
                    ));
                }

                if let Outcome::Fail(message) = outcome {
                    report.failures.push(FieldFailure {
                        field: field.name().to_string(),
                        label: label.to_string(),
                        rule_id: rule.id.clone(),
                        message,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        report.evaluation_time_ms = elapsed.as_millis() as i64;
        record_model_validation(schema.model_name(), report.is_valid(), elapsed.as_secs_f64());

        Ok(report)
    }
}

impl Default for ModelValidator {
    fn default() -> Self {
        Self::new(RuleEvaluator::new())
    }
}
