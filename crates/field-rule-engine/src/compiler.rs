//! 规则编译器
//!
//! 将 JSON 规则定义解析并编译成不可变的规则实例。
//! 空里程碑列表、无效日期等配置错误都在这里报告，不会留到评估时。

use crate::containment::MilestoneSet;
use crate::error::{Result, RuleError};
use crate::models::{Rule, RuleDefinition, RuleKind, RuleSetDefinition, RuleSpec};
use crate::resolver::FieldResolver;
use crate::temporal::InstantMilestone;
use crate::text::StringComparison;
use rule_shared::config::EngineConfig;
use std::collections::HashSet;
use std::sync::Arc;

/// 编译后的模型规则集
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    pub model: String,
    pub version: String,
    pub rules: Vec<Arc<Rule>>,
    /// 规则集引用的所有字段（声明字段与兄弟字段）
    pub required_fields: HashSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledRuleSet {
    /// 声明在指定字段上的规则
    pub fn rules_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Arc<Rule>> + 'a {
        self.rules.iter().filter(move |rule| rule.field == field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
    default_comparison: StringComparison,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self {
            compile_version: 0,
            default_comparison: StringComparison::default(),
        }
    }

    /// 按引擎配置构建，配置的默认比较模式无效时返回错误
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new().with_default_comparison(config.default_comparison.parse()?))
    }

    /// 规则定义未指定比较模式时使用的模式
    pub fn with_default_comparison(mut self, comparison: StringComparison) -> Self {
        self.default_comparison = comparison;
        self
    }

    pub fn compile_version(&self) -> u64 {
        self.compile_version
    }

    /// 从 JSON 字符串编译规则集
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledRuleSet> {
        let definition: RuleSetDefinition = serde_json::from_str(json)?;
        self.compile_set(definition)
    }

    /// 编译规则集
    pub fn compile_set(&mut self, definition: RuleSetDefinition) -> Result<CompiledRuleSet> {
        if definition.model.is_empty() {
            return Err(RuleError::InvalidDefinition {
                path: "model".to_string(),
                reason: "模型名称不能为空".to_string(),
            });
        }

        if definition.rules.is_empty() {
            return Err(RuleError::InvalidDefinition {
                path: "rules".to_string(),
                reason: format!("模型 '{}' 的规则列表不能为空", definition.model),
            });
        }

        let mut ids = HashSet::new();
        let mut required_fields = HashSet::new();
        let mut rules = Vec::with_capacity(definition.rules.len());

        for (i, rule_definition) in definition.rules.iter().enumerate() {
            let path = format!("rules[{}]", i);
            let rule = self.compile_rule(rule_definition, &path)?;

            if !ids.insert(rule.id.clone()) {
                return Err(RuleError::InvalidDefinition {
                    path,
                    reason: format!("规则 ID '{}' 重复", rule.id),
                });
            }

            required_fields.insert(rule.field.clone());
            if let Some(sibling) = rule.kind.sibling() {
                required_fields.insert(sibling.field().to_string());
            }

            rules.push(Arc::new(rule));
        }

        self.compile_version += 1;

        Ok(CompiledRuleSet {
            model: definition.model,
            version: definition.version,
            rules,
            required_fields,
            compile_version: self.compile_version,
        })
    }

    /// 编译单条规则
    pub fn compile(&self, definition: &RuleDefinition) -> Result<Rule> {
        self.compile_rule(definition, "rule")
    }

    fn compile_rule(&self, definition: &RuleDefinition, path: &str) -> Result<Rule> {
        if definition.field.is_empty() {
            return Err(invalid(path, "字段不能为空"));
        }

        let kind = self.compile_kind(definition, path)?;
        let mut rule = Rule::new(definition.field.clone(), kind);

        if let Some(id) = &definition.id {
            if id.is_empty() {
                return Err(invalid(path, "规则 ID 不能为空"));
            }
            rule = rule.with_id(id.clone());
        }

        if let Some(message) = &definition.message {
            rule = rule.with_message(message.clone());
        }

        rule.validate().map_err(|e| match e {
            RuleError::InvalidDefinition { reason, .. } => invalid(path, &reason),
            other => other,
        })?;

        Ok(rule)
    }

    fn compile_kind(&self, definition: &RuleDefinition, path: &str) -> Result<RuleKind> {
        let field = definition.field.as_str();

        let kind = match &definition.spec {
            RuleSpec::NumericCompare {
                operator,
                milestone,
            } => RuleKind::NumericCompare {
                operator: *operator,
                milestone: (*milestone).into(),
            },
            RuleSpec::NumericFieldCompare { operator, other } => RuleKind::NumericFieldCompare {
                operator: *operator,
                other: FieldResolver::new(other.as_str()),
            },
            RuleSpec::InNumericList { milestones } => RuleKind::InNumericList {
                milestones: MilestoneSet::new(field, milestones.iter().copied())?,
            },
            RuleSpec::ContainsNumerics { milestones } => RuleKind::ContainsNumerics {
                milestones: MilestoneSet::new(field, milestones.iter().copied())?,
            },
            RuleSpec::InstantCompare {
                operator,
                milestone,
                end_of_year,
            } => {
                let milestone = match (milestone, end_of_year) {
                    (Some(at), None) => InstantMilestone::from_datetime(*at),
                    (None, Some(year)) => InstantMilestone::end_of_year(*year)?,
                    _ => {
                        return Err(invalid(
                            path,
                            "milestone 与 end_of_year 必须且只能提供一个",
                        ));
                    }
                };
                RuleKind::InstantCompare {
                    operator: *operator,
                    milestone,
                }
            }
            RuleSpec::CurrentTimeCompare { operator } => RuleKind::CurrentTimeCompare {
                operator: *operator,
            },
            RuleSpec::StartsWith { prefix, comparison } => RuleKind::StartsWith {
                prefix: prefix.clone(),
                comparison: comparison.unwrap_or(self.default_comparison),
            },
            RuleSpec::TextFieldRelation {
                relation,
                other,
                comparison,
            } => RuleKind::TextFieldRelation {
                relation: *relation,
                other: FieldResolver::new(other.as_str()),
                comparison: comparison.unwrap_or(self.default_comparison),
            },
            RuleSpec::UpperCase => RuleKind::UpperCase,
            RuleSpec::MaxEntries { max } => RuleKind::MaxEntries { max: *max },
        };

        Ok(kind)
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(path: &str, reason: &str) -> RuleError {
    RuleError::InvalidDefinition {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
