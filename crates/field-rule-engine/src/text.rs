//! 文本关系
//!
//! 比较模式中的"区域"比较按字符大小写折叠后排序，折叠相同时小写优先于大写。

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 文本比较模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
    Culture,
    CultureIgnoreCase,
}

impl StringComparison {
    pub fn ignores_case(self) -> bool {
        matches!(self, Self::OrdinalIgnoreCase | Self::CultureIgnoreCase)
    }

    fn fold(self, s: &str) -> Cow<'_, str> {
        match self {
            Self::Ordinal | Self::Culture => Cow::Borrowed(s),
            Self::OrdinalIgnoreCase => Cow::Owned(s.to_uppercase()),
            Self::CultureIgnoreCase => Cow::Owned(s.to_lowercase()),
        }
    }

    /// 三向比较
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Ordinal => a.cmp(b),
            Self::OrdinalIgnoreCase | Self::CultureIgnoreCase => self.fold(a).cmp(&self.fold(b)),
            Self::Culture => culture_order(a, b),
        }
    }

    pub fn equals(self, a: &str, b: &str) -> bool {
        self.fold(a) == self.fold(b)
    }
}

impl fmt::Display for StringComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ordinal => "ordinal",
            Self::OrdinalIgnoreCase => "ordinal_ignore_case",
            Self::Culture => "culture",
            Self::CultureIgnoreCase => "culture_ignore_case",
        };
        f.write_str(name)
    }
}

impl FromStr for StringComparison {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ordinal" => Ok(Self::Ordinal),
            "ordinal_ignore_case" => Ok(Self::OrdinalIgnoreCase),
            "culture" => Ok(Self::Culture),
            "culture_ignore_case" => Ok(Self::CultureIgnoreCase),
            other => Err(RuleError::InvalidDefinition {
                path: "comparison".to_string(),
                reason: format!("未知的文本比较模式: {other}"),
            }),
        }
    }
}

fn culture_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, _)| {
                if x.is_lowercase() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}

/// 文本关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRelation {
    StartsWith,
    EndsWith,
    Contains,
    Equals,
    /// 三向比较结果的符号（-1、0、1）须等于 `expected`
    Compare { expected: i8 },
}

impl TextRelation {
    /// 判断 `source` 与 `target` 之间的关系是否成立
    pub fn evaluate(self, source: &str, target: &str, comparison: StringComparison) -> bool {
        match self {
            Self::StartsWith => comparison.fold(source).starts_with(comparison.fold(target).as_ref()),
            Self::EndsWith => comparison.fold(source).ends_with(comparison.fold(target).as_ref()),
            Self::Contains => comparison.fold(source).contains(comparison.fold(target).as_ref()),
            Self::Equals => comparison.equals(source, target),
            Self::Compare { expected } => sign(comparison.compare(source, target)) == expected,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::Compare { .. } => "compare",
        }
    }
}

fn sign(ordering: Ordering) -> i8 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}
