//! 运行时字段值模型
//!
//! 宿主通过字段访问表（见 [`crate::schema`]）把字段的当前值交给引擎。
//! 数值用带标签的枚举描述其具体表示（定宽整数、浮点、任意精度十进制），
//! 数值容器同时携带容器形状和元素类型，因此空容器也能报告自己的元素类型。

use chrono::{DateTime, TimeZone, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, LinkedList, VecDeque};
use std::fmt;
use std::hash::Hash;

/// 可转换为数值表示的元素类型
pub trait NumericElement: Copy {
    const KIND: NumericKind;

    fn into_numeric(self) -> Numeric;

    fn into_array(items: Vec<Self>) -> NumericArray;
}

macro_rules! numeric_representations {
    ($($variant:ident => $ty:ty, $name:literal;)+) => {
        /// 数值表示类型标签
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum NumericKind {
            $($variant),+
        }

        impl NumericKind {
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        /// 单个数值
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Numeric {
            $($variant($ty)),+
        }

        impl Numeric {
            pub fn kind(&self) -> NumericKind {
                match self {
                    $(Self::$variant(_) => NumericKind::$variant),+
                }
            }
        }

        impl fmt::Display for Numeric {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant(v) => write!(f, "{}", v)),+
                }
            }
        }

        impl ToPrimitive for Numeric {
            fn to_i64(&self) -> Option<i64> {
                match self {
                    $(Self::$variant(v) => v.to_i64()),+
                }
            }

            fn to_u64(&self) -> Option<u64> {
                match self {
                    $(Self::$variant(v) => v.to_u64()),+
                }
            }

            fn to_f64(&self) -> Option<f64> {
                match self {
                    $(Self::$variant(v) => v.to_f64()),+
                }
            }
        }

        /// 同质数值序列
        #[derive(Debug, Clone, PartialEq)]
        pub enum NumericArray {
            $($variant(Vec<$ty>)),+
        }

        impl NumericArray {
            /// 指定元素类型的空序列
            pub fn empty(kind: NumericKind) -> Self {
                match kind {
                    $(NumericKind::$variant => Self::$variant(Vec::new())),+
                }
            }

            pub fn kind(&self) -> NumericKind {
                match self {
                    $(Self::$variant(_) => NumericKind::$variant),+
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $(Self::$variant(items) => items.len()),+
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// 按下标读取
            pub fn get(&self, index: usize) -> Option<Numeric> {
                match self {
                    $(Self::$variant(items) => items.get(index).copied().map(Numeric::$variant)),+
                }
            }

            /// 顺序遍历
            pub fn iter(&self) -> Box<dyn Iterator<Item = Numeric> + '_> {
                match self {
                    $(Self::$variant(items) => Box::new(items.iter().copied().map(Numeric::$variant))),+
                }
            }

            /// 把元素逐个转换为 f64，任一元素无法转换时返回 None
            pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
                match self {
                    $(Self::$variant(items) => items.iter().map(|v| v.to_f64()).collect()),+
                }
            }
        }

        $(
            impl NumericElement for $ty {
                const KIND: NumericKind = NumericKind::$variant;

                fn into_numeric(self) -> Numeric {
                    Numeric::$variant(self)
                }

                fn into_array(items: Vec<Self>) -> NumericArray {
                    NumericArray::$variant(items)
                }
            }

            impl From<$ty> for Numeric {
                fn from(v: $ty) -> Self {
                    Numeric::$variant(v)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(Numeric::$variant(v))
                }
            }
        )+
    };
}

numeric_representations! {
    I8 => i8, "i8";
    I16 => i16, "i16";
    I32 => i32, "i32";
    I64 => i64, "i64";
    I128 => i128, "i128";
    U8 => u8, "u8";
    U16 => u16, "u16";
    U32 => u32, "u32";
    U64 => u64, "u64";
    U128 => u128, "u128";
    F32 => f32, "f32";
    F64 => f64, "f64";
    Decimal => Decimal, "decimal";
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 容器形状
///
/// 定长数组同时满足列表和序列契约，列表同时满足序列契约。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    /// 定长数组
    Array,
    /// 可按下标访问的列表
    List,
    /// 只能顺序遍历的序列
    Sequence,
}

impl ContainerShape {
    /// 规范化时探测形状的固定优先级
    pub const PROBE_ORDER: [ContainerShape; 3] = [Self::Array, Self::List, Self::Sequence];

    /// 该形状的值是否满足 `contract` 形状契约
    pub fn satisfies(self, contract: ContainerShape) -> bool {
        match self {
            Self::Array => true,
            Self::List => matches!(contract, Self::List | Self::Sequence),
            Self::Sequence => contract == Self::Sequence,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::List => "list",
            Self::Sequence => "sequence",
        }
    }
}

/// 字段运行时值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Numeric),
    Text(String),
    Char(char),
    Instant(DateTime<Utc>),
    /// 带形状和元素类型标签的数值容器
    Numbers {
        shape: ContainerShape,
        items: NumericArray,
    },
    /// 元素类型未声明的通用序列
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Char(_) => "char",
            Self::Instant(_) => "instant",
            Self::Numbers { shape, .. } => match shape {
                ContainerShape::Array => "numeric array",
                ContainerShape::List => "numeric list",
                ContainerShape::Sequence => "numeric sequence",
            },
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// 以指定形状构造数值容器
    pub fn numbers<T, I>(shape: ContainerShape, items: I) -> Self
    where
        T: NumericElement,
        I: IntoIterator<Item = T>,
    {
        Self::Numbers {
            shape,
            items: T::into_array(items.into_iter().collect()),
        }
    }

    /// 只能顺序遍历的数值序列
    pub fn sequence<T, I>(items: I) -> Self
    where
        T: NumericElement,
        I: IntoIterator<Item = T>,
    {
        Self::numbers(ContainerShape::Sequence, items)
    }

    /// 通用值列表
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<Numeric> for Value {
    fn from(v: Numeric) -> Self {
        Self::Number(v)
    }
}

/// 任意时区的时间点统一换算为 UTC
impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::Instant(v.with_timezone(&Utc))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: NumericElement, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Self::numbers(ContainerShape::Array, v)
    }
}

impl<T: NumericElement> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Numbers {
            shape: ContainerShape::List,
            items: T::into_array(v),
        }
    }
}

impl<T: NumericElement> From<VecDeque<T>> for Value {
    fn from(v: VecDeque<T>) -> Self {
        Self::numbers(ContainerShape::List, v)
    }
}

impl<T: NumericElement> From<LinkedList<T>> for Value {
    fn from(v: LinkedList<T>) -> Self {
        Self::sequence(v)
    }
}

impl<T: NumericElement + Ord> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Self::sequence(v)
    }
}

impl<T: NumericElement + Eq + Hash> From<HashSet<T>> for Value {
    fn from(v: HashSet<T>) -> Self {
        Self::sequence(v)
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(v: BTreeMap<String, V>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// JSON 值转换：数字数组成为数值列表（全部为整数时为 i64，否则为 f64）
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(json_number(&n)),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => json_array(items),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

fn json_number(n: &serde_json::Number) -> Numeric {
    if let Some(i) = n.as_i64() {
        Numeric::I64(i)
    } else if let Some(u) = n.as_u64() {
        Numeric::U64(u)
    } else {
        Numeric::F64(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn json_array(items: Vec<serde_json::Value>) -> Value {
    if items.is_empty() || !items.iter().all(serde_json::Value::is_number) {
        return Value::List(items.into_iter().map(Into::into).collect());
    }

    let integers: Option<Vec<i64>> = items.iter().map(serde_json::Value::as_i64).collect();
    match integers {
        Some(ints) => Value::from(ints),
        None => Value::from(
            items
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect::<Vec<f64>>(),
        ),
    }
}
