//! 规则引擎领域模型
//!
//! [`Rule`] 是编译后的不可变规则，构建一次后以 `Arc` 共享并发评估；
//! [`RuleDefinition`] 是其 JSON 定义形式，经 [`crate::RuleCompiler`] 编译。

use crate::containment::MilestoneSet;
use crate::error::{Result, RuleError};
use crate::message::{self, MessageArgs};
use crate::numeric::CanonicalNumber;
use crate::operators::Comparison;
use crate::resolver::FieldResolver;
use crate::schema::FieldAccess;
use crate::temporal::InstantMilestone;
use crate::text::{StringComparison, TextRelation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 评估结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail(String),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Pass => None,
            Self::Fail(message) => Some(message),
        }
    }
}

/// 规则种类及其操作数
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// 字段值与字面量里程碑比较
    NumericCompare {
        operator: Comparison,
        milestone: CanonicalNumber,
    },
    /// 字段值与兄弟字段的当前值比较
    NumericFieldCompare {
        operator: Comparison,
        other: FieldResolver,
    },
    /// 字段值须属于里程碑集合
    InNumericList { milestones: MilestoneSet },
    /// 集合须包含全部里程碑
    ContainsNumerics { milestones: MilestoneSet },
    InstantCompare {
        operator: Comparison,
        milestone: InstantMilestone,
    },
    /// 与评估时的当前时间比较
    CurrentTimeCompare { operator: Comparison },
    StartsWith {
        prefix: String,
        comparison: StringComparison,
    },
    /// 与兄弟文本字段之间的关系
    TextFieldRelation {
        relation: TextRelation,
        other: FieldResolver,
        comparison: StringComparison,
    },
    UpperCase,
    /// 映射字段的键数量上限
    MaxEntries { max: usize },
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumericCompare { .. } => "numeric_compare",
            Self::NumericFieldCompare { .. } => "numeric_field_compare",
            Self::InNumericList { .. } => "in_numeric_list",
            Self::ContainsNumerics { .. } => "contains_numerics",
            Self::InstantCompare { .. } => "instant_compare",
            Self::CurrentTimeCompare { .. } => "current_time_compare",
            Self::StartsWith { .. } => "starts_with",
            Self::TextFieldRelation { .. } => "text_field_relation",
            Self::UpperCase => "upper_case",
            Self::MaxEntries { .. } => "max_entries",
        }
    }

    /// 引用的兄弟字段
    pub fn sibling(&self) -> Option<&FieldResolver> {
        match self {
            Self::NumericFieldCompare { other, .. } | Self::TextFieldRelation { other, .. } => {
                Some(other)
            }
            _ => None,
        }
    }

    /// 默认失败消息模板
    pub fn default_template(&self) -> &'static str {
        match self {
            Self::NumericCompare { .. } => "{field} must be {operator} {milestone}",
            Self::NumericFieldCompare { .. } => "{field} must be {operator} {other}",
            Self::InNumericList { .. } => "{field} must be one of {milestones}",
            Self::ContainsNumerics { .. } => "{field} must contain {milestones}",
            Self::InstantCompare { .. } => "{field} must be {operator} {year}-{month}-{day}",
            Self::CurrentTimeCompare { .. } => "{field} must be {operator} the current time",
            Self::StartsWith { .. } => "{field} must start with {prefix}",
            Self::TextFieldRelation { relation, .. } => match relation {
                TextRelation::StartsWith => "{field} must start with {other}",
                TextRelation::EndsWith => "{field} must end with {other}",
                TextRelation::Contains => "{field} must contain {other}",
                TextRelation::Equals => "{field} is not equal to {other_name}",
                TextRelation::Compare { .. } => "{field} cannot be compared to {other_name}",
            },
            Self::UpperCase => "{field} must contain only uppercase letters",
            Self::MaxEntries { .. } => "{field} must not contain more than {max} entries",
        }
    }

    /// 消息参数，按位置占位符的顺序添加
    fn message_args(&self, field_label: &str) -> MessageArgs {
        let args = MessageArgs::new(field_label);
        match self {
            Self::NumericCompare {
                operator,
                milestone,
            } => args
                .with("milestone", milestone)
                .with("operator", operator.phrase()),
            Self::NumericFieldCompare { operator, other } => args
                .with("other", sibling_label(other))
                .with("other_name", other.field())
                .with("operator", operator.phrase()),
            Self::InNumericList { milestones } | Self::ContainsNumerics { milestones } => {
                args.with("milestones", milestones.joined())
            }
            Self::InstantCompare {
                operator,
                milestone,
            } => args
                .with("year", milestone.year())
                .with("month", milestone.month())
                .with("day", milestone.day())
                .with("operator", operator.phrase())
                .with("milestone", milestone.at().to_rfc3339()),
            Self::CurrentTimeCompare { operator } => args.with("operator", operator.phrase()),
            Self::StartsWith { prefix, .. } => args.with("prefix", prefix),
            Self::TextFieldRelation { other, .. } => args
                .with("other_name", other.field())
                .with("other", sibling_label(other)),
            Self::UpperCase => args,
            Self::MaxEntries { max } => args.with("max", max),
        }
    }
}

fn sibling_label(other: &FieldResolver) -> String {
    other
        .cached_label()
        .map(|label| label.as_str().to_string())
        .unwrap_or_else(|| other.field().to_string())
}

/// 编译后的规则
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    /// 声明规则的字段
    pub field: String,
    pub kind: RuleKind,
    /// 自定义失败消息模板
    pub message: Option<String>,
}

impl Rule {
    pub fn new(field: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            field: field.into(),
            kind,
            message: None,
        }
    }

    pub fn numeric_compare(
        field: impl Into<String>,
        operator: Comparison,
        milestone: impl Into<CanonicalNumber>,
    ) -> Self {
        Self::new(
            field,
            RuleKind::NumericCompare {
                operator,
                milestone: milestone.into(),
            },
        )
    }

    pub fn numeric_field_compare(
        field: impl Into<String>,
        operator: Comparison,
        other: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            RuleKind::NumericFieldCompare {
                operator,
                other: FieldResolver::new(other),
            },
        )
    }

    /// 里程碑集合为空时返回错误
    pub fn in_numeric_list<I, N>(field: impl Into<String>, milestones: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<CanonicalNumber>,
    {
        let field = field.into();
        let milestones = MilestoneSet::new(&field, milestones)?;
        Ok(Self::new(field, RuleKind::InNumericList { milestones }))
    }

    /// 里程碑集合为空时返回错误
    pub fn contains_numerics<I, N>(field: impl Into<String>, milestones: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<CanonicalNumber>,
    {
        let field = field.into();
        let milestones = MilestoneSet::new(&field, milestones)?;
        Ok(Self::new(field, RuleKind::ContainsNumerics { milestones }))
    }

    pub fn instant_compare(
        field: impl Into<String>,
        operator: Comparison,
        milestone: InstantMilestone,
    ) -> Self {
        Self::new(
            field,
            RuleKind::InstantCompare {
                operator,
                milestone,
            },
        )
    }

    pub fn current_time_compare(field: impl Into<String>, operator: Comparison) -> Self {
        Self::new(field, RuleKind::CurrentTimeCompare { operator })
    }

    pub fn starts_with(
        field: impl Into<String>,
        prefix: impl Into<String>,
        comparison: StringComparison,
    ) -> Self {
        Self::new(
            field,
            RuleKind::StartsWith {
                prefix: prefix.into(),
                comparison,
            },
        )
    }

    pub fn text_field_relation(
        field: impl Into<String>,
        relation: TextRelation,
        other: impl Into<String>,
        comparison: StringComparison,
    ) -> Self {
        Self::new(
            field,
            RuleKind::TextFieldRelation {
                relation,
                other: FieldResolver::new(other),
                comparison,
            },
        )
    }

    pub fn upper_case(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::UpperCase)
    }

    pub fn max_entries(field: impl Into<String>, max: usize) -> Self {
        Self::new(field, RuleKind::MaxEntries { max })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 渲染失败消息：自定义模板 → 默认模板
    ///
    /// 兄弟字段标签取自首次评估时缓存的值；规则尚未评估过时使用兄弟字段名，
    /// 需要展示标签时改用 [`Rule::format_failure_message_for`]。
    pub fn format_failure_message(&self, field_label: &str) -> String {
        self.render_failure_message(field_label, None)
    }

    /// 先从对象字段表解析兄弟字段标签再渲染失败消息
    pub fn format_failure_message_for(&self, field_label: &str, object: &dyn FieldAccess) -> String {
        if let Some(sibling) = self.kind.sibling() {
            sibling.label(object);
        }
        self.format_failure_message(field_label)
    }

    /// 检查规则自身的定义
    ///
    /// 构造函数不做校验，[`crate::RuleCompiler`] 和 [`crate::ModelRules::bind`] 在注册时调用，
    /// 保证无效定义以配置错误报告，而不是变成普通的校验失败。
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RuleError::InvalidDefinition {
            path: self.field.clone(),
            reason,
        };

        if self.field.is_empty() {
            return Err(invalid("字段不能为空".to_string()));
        }
        if self.id.is_empty() {
            return Err(invalid("规则 ID 不能为空".to_string()));
        }

        match &self.kind {
            RuleKind::NumericCompare { milestone, .. } if !milestone.value().is_finite() => {
                return Err(RuleError::InvalidMilestone(format!(
                    "字段 {} 的里程碑必须是有限数值，实际为 {}",
                    self.field, milestone
                )));
            }
            RuleKind::StartsWith { prefix, .. } if prefix.is_empty() => {
                return Err(invalid("前缀不能为空".to_string()));
            }
            RuleKind::TextFieldRelation {
                relation: TextRelation::Compare { expected },
                ..
            } if !(-1..=1).contains(expected) => {
                return Err(invalid(format!(
                    "比较结果符号必须是 -1、0 或 1，实际为 {expected}"
                )));
            }
            _ => {}
        }

        if let Some(sibling) = self.kind.sibling() {
            if sibling.field().is_empty() {
                return Err(invalid("兄弟字段名不能为空".to_string()));
            }
            if sibling.field() == self.field {
                return Err(invalid(format!("字段 '{}' 不能引用自身", self.field)));
            }
        }

        Ok(())
    }

    /// 渲染失败消息：自定义模板 → `fallback` → 默认模板
    pub fn render_failure_message(&self, field_label: &str, fallback: Option<&str>) -> String {
        let template = self
            .message
            .as_deref()
            .or(fallback)
            .unwrap_or_else(|| self.kind.default_template());
        message::render(template, &self.kind.message_args(field_label))
    }
}

/// 单条规则的 JSON 定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub field: String,
    #[serde(flatten)]
    pub spec: RuleSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 规则种类的 JSON 定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    NumericCompare {
        operator: Comparison,
        milestone: f64,
    },
    NumericFieldCompare {
        operator: Comparison,
        other: String,
    },
    InNumericList {
        milestones: Vec<f64>,
    },
    ContainsNumerics {
        milestones: Vec<f64>,
    },
    /// `milestone` 与 `end_of_year` 必须且只能提供一个
    InstantCompare {
        operator: Comparison,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        milestone: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_of_year: Option<i32>,
    },
    CurrentTimeCompare {
        operator: Comparison,
    },
    /// 未指定比较模式时使用引擎配置的默认模式
    StartsWith {
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comparison: Option<StringComparison>,
    },
    TextFieldRelation {
        relation: TextRelation,
        other: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comparison: Option<StringComparison>,
    },
    UpperCase,
    MaxEntries {
        max: usize,
    },
}

/// 模型规则集的 JSON 定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDefinition {
    pub model: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub rules: Vec<RuleDefinition>,
}

fn default_version() -> String {
    "1.0".to_string()
}
