//! 数值规范化
//!
//! 把各种数值表示（定宽整数、浮点、任意精度十进制）统一换算为 64 位浮点的规范形式，
//! 容器按 数组 → 列表 → 序列 的固定优先级探测形状后逐元素换算。

use crate::value::{ContainerShape, Numeric, NumericArray, NumericKind, Value};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 规范化后的数值
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalNumber(f64);

impl CanonicalNumber {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }
}

impl fmt::Display for CanonicalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for CanonicalNumber {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i32> for CanonicalNumber {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl From<i64> for CanonicalNumber {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl From<u8> for CanonicalNumber {
    fn from(value: u8) -> Self {
        Self(f64::from(value))
    }
}

/// 数值规范化器
pub struct NumericNormalizer;

impl NumericNormalizer {
    /// 单个数值的规范形式
    pub fn canonical(numeric: Numeric) -> Option<CanonicalNumber> {
        numeric.to_f64().map(CanonicalNumber)
    }

    /// 把单个值规范化，非数值返回 None
    pub fn to_canonical(value: &Value) -> Option<CanonicalNumber> {
        match value {
            Value::Number(n) => Self::canonical(*n),
            _ => None,
        }
    }

    /// 把数值容器逐元素规范化，保持元素顺序
    ///
    /// 按 [`ContainerShape::PROBE_ORDER`] 依次尝试，使用运行时值满足的第一个形状。
    /// 通用列表仅在所有元素为同一数值类型时被接受。
    pub fn to_canonical_sequence(value: &Value) -> Option<Vec<CanonicalNumber>> {
        match value {
            Value::Numbers { shape, items } => ContainerShape::PROBE_ORDER
                .into_iter()
                .find(|contract| shape.satisfies(*contract))
                .and_then(|contract| Self::read_shape(contract, items)),
            // 空的无类型列表（例如 JSON `[]`）视为空数值序列
            Value::List(items) if items.is_empty() => Some(Vec::new()),
            Value::List(items) => Self::read_homogeneous(items),
            _ => None,
        }
    }

    /// 容器声明的元素类型
    pub fn element_kind(value: &Value) -> Option<NumericKind> {
        match value {
            Value::Numbers { items, .. } => Some(items.kind()),
            Value::List(items) => Self::list_kind(items),
            _ => None,
        }
    }

    fn read_shape(contract: ContainerShape, items: &NumericArray) -> Option<Vec<CanonicalNumber>> {
        match contract {
            // 连续存储，整体换算
            ContainerShape::Array => items
                .to_f64_vec()
                .map(|values| values.into_iter().map(CanonicalNumber).collect()),
            ContainerShape::List => (0..items.len())
                .map(|index| items.get(index).and_then(Self::canonical))
                .collect(),
            ContainerShape::Sequence => items.iter().map(Self::canonical).collect(),
        }
    }

    fn read_homogeneous(items: &[Value]) -> Option<Vec<CanonicalNumber>> {
        Self::list_kind(items)?;
        items.iter().map(Self::to_canonical).collect()
    }

    fn list_kind(items: &[Value]) -> Option<NumericKind> {
        let first = match items.first()? {
            Value::Number(n) => n.kind(),
            _ => return None,
        };
        items
            .iter()
            .all(|item| matches!(item, Value::Number(n) if n.kind() == first))
            .then_some(first)
    }
}
