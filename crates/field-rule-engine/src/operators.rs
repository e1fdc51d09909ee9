//! 比较操作符定义
//!
//! 六种比较关系统一作用于规范化后的数值（见 [`crate::numeric`]）和时间戳
//! （见 [`crate::temporal`]）。

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[serde(alias = "lt")]
    Lower,
    #[serde(alias = "lte")]
    LowerOrEqual,
    #[serde(alias = "eq")]
    Equal,
    #[serde(alias = "neq")]
    NotEqual,
    #[serde(alias = "gte")]
    GreaterOrEqual,
    #[serde(alias = "gt")]
    Greater,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Self::Lower,
        Self::LowerOrEqual,
        Self::Equal,
        Self::NotEqual,
        Self::GreaterOrEqual,
        Self::Greater,
    ];

    /// 判断 `lhs OP rhs` 是否成立
    ///
    /// 相等判断使用精确比较，不做 epsilon 容差。NaN 与任何值都不可比较，
    /// 此时只有 `NotEqual` 成立。
    pub fn evaluate<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Self::Lower => lhs < rhs,
            Self::LowerOrEqual => lhs <= rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Greater => lhs > rhs,
        }
    }

    /// 满足该操作符的三向比较结果
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Lower => ordering == Ordering::Less,
            Self::LowerOrEqual => ordering != Ordering::Greater,
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Greater => ordering == Ordering::Greater,
        }
    }

    /// 三向比较结果，NaN 参与时为 None
    pub fn relation<T: PartialOrd>(lhs: T, rhs: T) -> Option<Ordering> {
        lhs.partial_cmp(&rhs)
    }

    /// 取反后的操作符，`a OP b` 不成立当且仅当 `a OP.negate() b` 成立（NaN 除外）
    pub fn negate(self) -> Self {
        match self {
            Self::Lower => Self::GreaterOrEqual,
            Self::LowerOrEqual => Self::Greater,
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::GreaterOrEqual => Self::Lower,
            Self::Greater => Self::LowerOrEqual,
        }
    }

    /// 用于失败消息的短语
    pub fn phrase(self) -> &'static str {
        match self {
            Self::Lower => "lower than",
            Self::LowerOrEqual => "lower than or equal to",
            Self::Equal => "equal to",
            Self::NotEqual => "not equal to",
            Self::GreaterOrEqual => "greater than or equal to",
            Self::Greater => "greater than",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::LowerOrEqual => "lower_or_equal",
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::Greater => "greater",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lower" | "lt" => Ok(Self::Lower),
            "lower_or_equal" | "lte" => Ok(Self::LowerOrEqual),
            "equal" | "eq" => Ok(Self::Equal),
            "not_equal" | "neq" => Ok(Self::NotEqual),
            "greater_or_equal" | "gte" => Ok(Self::GreaterOrEqual),
            "greater" | "gt" => Ok(Self::Greater),
            other => Err(RuleError::InvalidOperator(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_operator_table() {
        assert!(Comparison::Lower.evaluate(1.0, 2.0));
        assert!(!Comparison::Lower.evaluate(2.0, 2.0));
        assert!(Comparison::LowerOrEqual.evaluate(2.0, 2.0));
        assert!(Comparison::Equal.evaluate(5.0, 5.0));
        assert!(Comparison::NotEqual.evaluate(5.0, 6.0));
        assert!(Comparison::GreaterOrEqual.evaluate(3.0, 3.0));
        assert!(Comparison::Greater.evaluate(4.0, 3.0));
        assert!(!Comparison::Greater.evaluate(3.0, 3.0));
    }

    #[test]
    fn test_nan_is_unordered() {
        for op in Comparison::ALL {
            let holds = op.evaluate(f64::NAN, 1.0);
            assert_eq!(holds, op == Comparison::NotEqual, "{op}");
        }
        assert_eq!(Comparison::relation(f64::NAN, 1.0), None);
        assert_eq!(Comparison::relation(1.0, 2.0), Some(Ordering::Less));
    }

    #[test]
    fn test_parse_operator() {
        assert_eq!("greater".parse::<Comparison>().unwrap(), Comparison::Greater);
        assert_eq!("lte".parse::<Comparison>().unwrap(), Comparison::LowerOrEqual);

        let err = "between".parse::<Comparison>().unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperator(ref op) if op == "between"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Comparison::GreaterOrEqual).unwrap();
        assert_eq!(json, "\"greater_or_equal\"");

        let parsed: Comparison = serde_json::from_str("\"not_equal\"").unwrap();
        assert_eq!(parsed, Comparison::NotEqual);

        assert!(serde_json::from_str::<Comparison>("\"almost\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_trichotomy(a in -1.0e12f64..1.0e12, b in -1.0e12f64..1.0e12) {
            let lower = Comparison::Lower.evaluate(a, b);
            let equal = Comparison::Equal.evaluate(a, b);
            let greater = Comparison::Greater.evaluate(a, b);

            prop_assert_eq!(u8::from(lower) + u8::from(equal) + u8::from(greater), 1);
            prop_assert_eq!(Comparison::LowerOrEqual.evaluate(a, b), lower || equal);
            prop_assert_eq!(Comparison::GreaterOrEqual.evaluate(a, b), greater || equal);
            prop_assert_eq!(Comparison::NotEqual.evaluate(a, b), !equal);
        }

        #[test]
        fn prop_accepts_matches_evaluate(a in any::<i64>(), b in any::<i64>()) {
            for op in Comparison::ALL {
                prop_assert_eq!(op.accepts(a.cmp(&b)), op.evaluate(a, b));
                prop_assert_eq!(op.negate().evaluate(a, b), !op.evaluate(a, b));
            }
        }
    }
}
