//! 字段约束引擎性能基准测试
//!
//! 测试覆盖：
//! - JSON 规则集编译性能
//! - 整体对象校验性能
//! - 不同规则数量下的性能曲线

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rule_engine::{
    FieldDescriptor, FieldType, ModelRules, ModelSchema, ModelValidator, NumericKind,
    RuleCompiler, RuleStore, Value,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

/// 宽对象：N 个数值字段、一个文本字段
struct Wide {
    numbers: Vec<i64>,
    amount: Decimal,
    title: String,
}

fn create_schema(width: usize) -> Arc<ModelSchema<Wide>> {
    let mut schema = ModelSchema::new("Wide");
    for i in 0..width {
        let descriptor = FieldDescriptor::new(
            format!("field_{}", i),
            FieldType::Numeric { kind: NumericKind::I64 },
            move |w: &Wide| Value::from(w.numbers.get(i).copied()),
        );
        schema.register(descriptor).unwrap();
    }
    schema
        .register(FieldDescriptor::new(
            "amount",
            FieldType::Numeric { kind: NumericKind::Decimal },
            |w: &Wide| Value::from(w.amount),
        ))
        .unwrap();
    schema
        .register(
            FieldDescriptor::new("title", FieldType::Text, |w: &Wide| {
                Value::from(w.title.as_str())
            })
            .with_display("Title"),
        )
        .unwrap();
    Arc::new(schema)
}

/// 每个数值字段一条字面量比较和一条跨字段比较
fn create_rules_json(width: usize) -> String {
    let mut rules = Vec::with_capacity(width * 2 + 2);
    for i in 0..width {
        rules.push(json!({
            "field": format!("field_{}", i),
            "kind": "numeric_compare",
            "operator": "gte",
            "milestone": 0
        }));
        rules.push(json!({
            "field": format!("field_{}", i),
            "kind": "numeric_field_compare",
            "operator": "lower_or_equal",
            "other": "amount"
        }));
    }
    rules.push(json!({"field": "title", "kind": "upper_case"}));
    rules.push(json!({
        "field": "title",
        "kind": "starts_with",
        "prefix": "re",
        "comparison": "culture_ignore_case"
    }));

    json!({"model": "Wide", "version": "1.0", "rules": rules}).to_string()
}

fn create_object(width: usize) -> Wide {
    Wide {
        numbers: (0..width as i64).collect(),
        amount: Decimal::new(width as i64 * 100, 2),
        title: "REPORT".to_string(),
    }
}

/// 规则集编译基准
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for width in [10usize, 100].iter() {
        let json = create_rules_json(*width);
        group.throughput(Throughput::Elements((*width * 2 + 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &json, |b, json| {
            let mut compiler = RuleCompiler::new();
            b.iter(|| compiler.compile_from_json(black_box(json)))
        });
    }

    group.finish();
}

/// 整体校验随规则数量的扩展性
fn bench_validate_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_scaling");
    let validator = ModelValidator::default();

    for width in [1usize, 10, 50, 100].iter() {
        let store = RuleStore::new();
        store.load_from_json(&create_rules_json(*width)).unwrap();
        let rules =
            ModelRules::from_compiled(create_schema(*width), &store.get("Wide").unwrap()).unwrap();
        let object = create_object(*width);

        group.throughput(Throughput::Elements(rules.rules().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| validator.validate(black_box(&rules), black_box(&object)))
        });
    }

    group.finish();
}

/// 开启追踪的额外开销
fn bench_trace_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_overhead");
    let width = 20;
    let store = RuleStore::new();
    store.load_from_json(&create_rules_json(width)).unwrap();
    let rules = ModelRules::from_compiled(create_schema(width), &store.get("Wide").unwrap()).unwrap();
    let object = create_object(width);

    let plain = ModelValidator::default();
    let traced = ModelValidator::default().with_trace();

    group.bench_function("without_trace", |b| {
        b.iter(|| plain.validate(black_box(&rules), black_box(&object)))
    });
    group.bench_function("with_trace", |b| {
        b.iter(|| traced.validate(black_box(&rules), black_box(&object)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_validate_scaling,
    bench_trace_overhead,
);

criterion_main!(benches);
