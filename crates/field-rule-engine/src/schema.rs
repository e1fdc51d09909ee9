//! 模型字段访问表
//!
//! 宿主在注册模型时为每个字段提供取值函数、展示标签和声明类型，
//! 引擎通过 [`FieldAccess`] 在评估时按名称读取兄弟字段。

use crate::error::{Result, RuleError};
use crate::value::{ContainerShape, NumericKind, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 字段声明类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// 未声明，绑定时不做类型检查
    Any,
    Bool,
    Numeric { kind: NumericKind },
    Numbers {
        shape: ContainerShape,
        element: NumericKind,
    },
    Text,
    Char,
    Instant,
    Map,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric { .. } | Self::Any)
    }

    pub fn is_numeric_container(self) -> bool {
        matches!(self, Self::Numbers { .. } | Self::Any)
    }

    /// 时间比较接受结构化时间点，也接受原始毫秒数
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Instant | Self::Numeric { .. } | Self::Any)
    }

    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::Any)
    }

    pub fn is_map(self) -> bool {
        matches!(self, Self::Map | Self::Any)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Numeric { kind } => write!(f, "{kind}"),
            Self::Numbers { shape, element } => write!(f, "{}<{element}>", shape.name()),
            Self::Text => f.write_str("text"),
            Self::Char => f.write_str("char"),
            Self::Instant => f.write_str("instant"),
            Self::Map => f.write_str("map"),
        }
    }
}

/// 字段取值函数
pub type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// 字段描述
pub struct FieldDescriptor<T> {
    name: String,
    display: Option<String>,
    display_name: Option<String>,
    field_type: FieldType,
    getter: Getter<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn new<F>(name: impl Into<String>, field_type: FieldType, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            display: None,
            display_name: None,
            field_type,
            getter: Arc::new(getter),
        }
    }

    /// 显式展示标签，优先级最高
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// 旧式展示名称，仅在没有显式展示标签时使用
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// 展示标签：显式标签 → 旧式展示名称 → 字段名
    pub fn label(&self) -> &str {
        self.display
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn read(&self, object: &T) -> Value {
        (self.getter)(object)
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            display: self.display.clone(),
            display_name: self.display_name.clone(),
            field_type: self.field_type,
            getter: Arc::clone(&self.getter),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("label", &self.label())
            .field("field_type", &self.field_type)
            .finish()
    }
}

/// 模型字段表，注册时构建一次
pub struct ModelSchema<T> {
    model: String,
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<String, usize>,
}

impl<T> ModelSchema<T> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// 注册字段，同名字段重复注册返回错误
    pub fn register(&mut self, descriptor: FieldDescriptor<T>) -> Result<()> {
        if self.index.contains_key(descriptor.name()) {
            return Err(RuleError::DuplicateField {
                model: self.model.clone(),
                field: descriptor.name().to_string(),
            });
        }

        self.index
            .insert(descriptor.name().to_string(), self.fields.len());
        self.fields.push(descriptor);
        Ok(())
    }

    /// 链式注册
    pub fn with_field(mut self, descriptor: FieldDescriptor<T>) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// 按注册顺序遍历字段
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 把对象实例和字段表组合为可按名称读取的视图
    pub fn instance<'a>(&'a self, object: &'a T) -> Instance<'a, T> {
        Instance {
            schema: self,
            object,
        }
    }
}

impl<T> fmt::Debug for ModelSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("model", &self.model)
            .field("fields", &self.fields)
            .finish()
    }
}

/// 按名称读取对象字段
#[cfg_attr(test, mockall::automock)]
pub trait FieldAccess {
    fn model_name(&self) -> &str;

    /// 字段当前值，字段不存在时返回 None
    fn field_value(&self, name: &str) -> Option<Value>;

    /// 字段展示标签，字段不存在时返回 None
    fn field_label(&self, name: &str) -> Option<String>;
}

/// 对象实例视图
pub struct Instance<'a, T> {
    schema: &'a ModelSchema<T>,
    object: &'a T,
}

impl<T> Instance<'_, T> {
    pub fn object(&self) -> &T {
        self.object
    }
}

impl<T> FieldAccess for Instance<'_, T> {
    fn model_name(&self) -> &str {
        self.schema.model_name()
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        self.schema.field(name).map(|field| field.read(self.object))
    }

    fn field_label(&self, name: &str) -> Option<String> {
        self.schema.field(name).map(|field| field.label().to_string())
    }
}
