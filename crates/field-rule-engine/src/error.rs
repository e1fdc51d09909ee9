//! 规则引擎错误类型
//!
//! 这里的错误都属于配置错误：规则挂错了字段、定义不完整或操作符未知。
//! 普通的校验失败不走错误通道，而是 [`crate::Outcome::Fail`]。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("无效的操作符: {0}")]
    InvalidOperator(String),

    #[error("规则定义无效: {path} - {reason}")]
    InvalidDefinition { path: String, reason: String },

    #[error("里程碑列表不能为空: 字段 {field}")]
    EmptyMilestones { field: String },

    #[error("无效的里程碑: {0}")]
    InvalidMilestone(String),

    #[error("规则不适用: {rule} 不支持字段 {field} 的值类型 {actual}")]
    NotApplicable {
        rule: &'static str,
        field: String,
        actual: &'static str,
    },

    #[error("字段类型不匹配: {rule} 不能挂在 {model}.{field} ({actual}) 上")]
    FieldTypeMismatch {
        rule: &'static str,
        model: String,
        field: String,
        actual: String,
    },

    #[error("字段不存在: {model}.{field}")]
    UnknownField { model: String, field: String },

    #[error("字段重复注册: {model}.{field}")]
    DuplicateField { model: String, field: String },

    #[error("规则集未找到: {0}")]
    RuleSetNotFound(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
