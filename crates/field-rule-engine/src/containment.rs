//! 包含关系匹配
//!
//! 目标集合在规则定义时去重且不能为空；运行时集合不去重。

use crate::error::{Result, RuleError};
use crate::numeric::{CanonicalNumber, NumericNormalizer};
use crate::value::Value;

/// 规则定义时声明的数值里程碑集合
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneSet {
    values: Vec<CanonicalNumber>,
}

impl MilestoneSet {
    /// 构造里程碑集合，保持首次出现的顺序去重
    ///
    /// 空集合或包含 NaN 时返回配置错误。
    pub fn new<I, N>(field: &str, milestones: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<CanonicalNumber>,
    {
        let mut values: Vec<CanonicalNumber> = Vec::new();
        for milestone in milestones {
            let milestone = milestone.into();
            if milestone.is_nan() {
                return Err(RuleError::InvalidMilestone(format!(
                    "字段 {field} 的里程碑包含 NaN"
                )));
            }
            if !values.contains(&milestone) {
                values.push(milestone);
            }
        }

        if values.is_empty() {
            return Err(RuleError::EmptyMilestones {
                field: field.to_string(),
            });
        }

        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[CanonicalNumber] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: CanonicalNumber) -> bool {
        self.values.contains(&value)
    }

    /// 逗号拼接，用于失败消息
    pub fn joined(&self) -> String {
        self.values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// 包含关系匹配器
pub struct ContainmentMatcher;

impl ContainmentMatcher {
    /// 判断运行时集合是否包含目标集合的全部元素
    ///
    /// 运行时值不是可识别形状的数值容器时返回 None（规则不适用）。
    pub fn contains_all(target: &MilestoneSet, collection: &Value) -> Option<bool> {
        let numbers = NumericNormalizer::to_canonical_sequence(collection)?;

        if numbers.len() < target.len() {
            return Some(false);
        }

        Some(target.as_slice().iter().all(|wanted| numbers.contains(wanted)))
    }

    /// 判断单个值是否属于目标集合，值不是数值时返回 None
    pub fn is_member(target: &MilestoneSet, value: &Value) -> Option<bool> {
        NumericNormalizer::to_canonical(value).map(|n| target.contains(n))
    }
}
