//! 兄弟字段解析
//!
//! 规则实例在进程生命周期内被并发复用，展示标签在首次解析时计算并缓存在规则上。
//! 缓存写入采用"为空时写入"：并发写入者计算出的值相同，重复计算或丢失的写入都无影响，
//! 读取方总能拿到完整的值。

use crate::schema::FieldAccess;
use crate::value::Value;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub label: Arc<String>,
}

/// 兄弟字段解析器
pub struct FieldResolver {
    field: String,
    label: ArcSwapOption<String>,
}

impl FieldResolver {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: ArcSwapOption::empty(),
        }
    }

    /// 引用的兄弟字段名
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 已缓存的展示标签
    pub fn cached_label(&self) -> Option<Arc<String>> {
        self.label.load_full()
    }

    /// 读取兄弟字段的当前值和展示标签
    ///
    /// 字段不在对象的字段表中时返回 None，调用方按跳过处理。
    pub fn resolve(&self, object: &dyn FieldAccess) -> Option<Resolved> {
        let value = object.field_value(&self.field)?;
        Some(Resolved {
            value,
            label: self.label(object),
        })
    }

    /// 兄弟字段的展示标签，首次解析后缓存
    ///
    /// 字段不在字段表中时退回字段名。
    pub fn label(&self, object: &dyn FieldAccess) -> Arc<String> {
        if let Some(cached) = self.label.load_full() {
            return cached;
        }

        let computed = Arc::new(
            object
                .field_label(&self.field)
                .unwrap_or_else(|| self.field.clone()),
        );

        let empty: Option<Arc<String>> = None;
        let previous = self
            .label
            .compare_and_swap(&empty, Some(Arc::clone(&computed)));

        // 另一个线程先写入时沿用它的值
        match &*previous {
            Some(existing) => Arc::clone(existing),
            None => computed,
        }
    }
}

impl Clone for FieldResolver {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            label: ArcSwapOption::new(self.label.load_full()),
        }
    }
}

impl fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldResolver")
            .field("field", &self.field)
            .field("label", &self.cached_label())
            .finish()
    }
}

impl PartialEq for FieldResolver {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MockFieldAccess;
    use mockall::predicate::eq;
    use std::thread;

    fn access_with_label(label: &'static str, times: usize) -> MockFieldAccess {
        let mut access = MockFieldAccess::new();
        access
            .expect_field_value()
            .with(eq("limit"))
            .returning(|_| Some(Value::from(5i32)));
        access
            .expect_field_label()
            .with(eq("limit"))
            .times(times)
            .returning(move |_| Some(label.to_string()));
        access
    }

    #[test]
    fn test_resolve_value_and_label() {
        let resolver = FieldResolver::new("limit");
        let access = access_with_label("Limit", 1);

        let resolved = resolver.resolve(&access).unwrap();
        assert_eq!(resolved.value, Value::from(5i32));
        assert_eq!(resolved.label.as_str(), "Limit");
    }

    #[test]
    fn test_label_is_memoized() {
        let resolver = FieldResolver::new("limit");
        let access = access_with_label("Limit", 1);

        for _ in 0..5 {
            let resolved = resolver.resolve(&access).unwrap();
            assert_eq!(resolved.label.as_str(), "Limit");
        }
        assert_eq!(resolver.cached_label().as_deref().map(String::as_str), Some("Limit"));
    }

    #[test]
    fn test_missing_field() {
        let resolver = FieldResolver::new("limit");
        let mut access = MockFieldAccess::new();
        access.expect_field_value().returning(|_| None);
        access.expect_field_label().never();

        assert!(resolver.resolve(&access).is_none());
        assert!(resolver.cached_label().is_none());
    }

    #[test]
    fn test_label_falls_back_to_field_name() {
        let resolver = FieldResolver::new("limit");
        let mut access = MockFieldAccess::new();
        access.expect_field_value().returning(|_| Some(Value::Null));
        access.expect_field_label().returning(|_| None);

        let resolved = resolver.resolve(&access).unwrap();
        assert_eq!(resolved.label.as_str(), "limit");
    }

    #[test]
    fn test_concurrent_resolution_agrees() {
        let resolver = Arc::new(FieldResolver::new("limit"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    let mut access = MockFieldAccess::new();
                    access.expect_field_value().returning(|_| Some(Value::from(1u8)));
                    access
                        .expect_field_label()
                        .returning(|_| Some("Limit".to_string()));
                    (0..100)
                        .map(|_| resolver.resolve(&access).unwrap().label)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for label in handle.join().unwrap() {
                assert_eq!(label.as_str(), "Limit");
            }
        }
        assert!(resolver.cached_label().is_some());
    }

    #[test]
    fn test_clone_keeps_cached_label() {
        let resolver = FieldResolver::new("limit");
        let access = access_with_label("Limit", 1);
        resolver.resolve(&access).unwrap();

        let cloned = resolver.clone();
        assert_eq!(cloned.cached_label().as_deref().map(String::as_str), Some("Limit"));
    }
}
