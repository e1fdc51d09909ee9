//! 声明式字段约束引擎
//!
//! 为模型字段声明约束并在对象实例上执行校验，支持：
//! - 数值比较（含跨字段比较）和数值集合包含判断
//! - 时间点比较（固定时间点或当前时间）
//! - 文本前缀、跨字段文本关系、大写检查
//! - JSON 规则定义、编译和缓存
//! - 可观察的软跳过诊断

pub mod compiler;
pub mod containment;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod message;
pub mod models;
pub mod numeric;
pub mod operators;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod temporal;
pub mod text;
pub mod value;

pub use compiler::{CompiledRuleSet, RuleCompiler};
pub use containment::{ContainmentMatcher, MilestoneSet};
pub use diagnostics::{SkipObserver, SkipReason, TracingSkipObserver};
pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use executor::{FieldFailure, ModelRules, ModelValidator, ValidationReport};
pub use models::{Outcome, Rule, RuleDefinition, RuleKind, RuleSetDefinition, RuleSpec};
pub use numeric::{CanonicalNumber, NumericNormalizer};
pub use operators::Comparison;
pub use resolver::{FieldResolver, Resolved};
pub use schema::{FieldAccess, FieldDescriptor, FieldType, Instance, ModelSchema};
pub use store::{RuleStore, RuleStoreStats};
pub use temporal::{CanonicalInstant, Clock, InstantMilestone, SystemClock, TemporalNormalizer};
pub use text::{StringComparison, TextRelation};
pub use value::{ContainerShape, Numeric, NumericArray, NumericKind, Value};
