//! 规则评估器性能基准测试
//!
//! 针对 RuleEvaluator 的各类规则和规范化路径进行细粒度的性能测试。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rule_engine::{
    Comparison, ContainerShape, FieldDescriptor, FieldType, InstantMilestone, ModelSchema,
    NumericKind, NumericNormalizer, Rule, RuleEvaluator, StringComparison, TextRelation, Value,
};
use rust_decimal::Decimal;
use std::hint::black_box;

struct Pair {
    low: i64,
    high: Option<i64>,
    prefix: String,
    greeting: String,
}

fn create_schema() -> ModelSchema<Pair> {
    let mut schema = ModelSchema::new("Pair");
    let fields = [
        FieldDescriptor::new("low", FieldType::Numeric { kind: NumericKind::I64 }, |p: &Pair| {
            Value::from(p.low)
        }),
        FieldDescriptor::new("high", FieldType::Numeric { kind: NumericKind::I64 }, |p: &Pair| {
            Value::from(p.high)
        })
        .with_display("High"),
        FieldDescriptor::new("prefix", FieldType::Text, |p: &Pair| {
            Value::from(p.prefix.as_str())
        }),
        FieldDescriptor::new("greeting", FieldType::Text, |p: &Pair| {
            Value::from(p.greeting.as_str())
        }),
    ];
    for field in fields {
        schema.register(field).unwrap();
    }
    schema
}

fn create_pair() -> Pair {
    Pair {
        low: 10,
        high: Some(100),
        prefix: "hello".to_string(),
        greeting: "HELLO world".to_string(),
    }
}

/// 数值规范化基准
fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    let values = [
        ("i8", Value::from(5i8)),
        ("u64", Value::from(5u64)),
        ("f32", Value::from(5.0f32)),
        ("decimal", Value::from(Decimal::new(5, 0))),
    ];
    for (name, value) in &values {
        group.bench_function(*name, |b| {
            b.iter(|| NumericNormalizer::to_canonical(black_box(value)))
        });
    }

    let array = Value::numbers(ContainerShape::Array, (0..64).collect::<Vec<i32>>());
    group.bench_function("sequence_64", |b| {
        b.iter(|| NumericNormalizer::to_canonical_sequence(black_box(&array)))
    });

    group.finish();
}

/// 各类规则评估基准
fn bench_rule_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_kinds");
    let schema = create_schema();
    let pair = create_pair();
    let instance = schema.instance(&pair);
    let evaluator = RuleEvaluator::new();

    let milestone = InstantMilestone::end_of_year(2030).unwrap();
    let rules = [
        ("numeric_compare", Rule::numeric_compare("low", Comparison::Lower, 50), Value::from(10i64)),
        (
            "numeric_field_compare",
            Rule::numeric_field_compare("low", Comparison::Lower, "high"),
            Value::from(10i64),
        ),
        (
            "instant_compare",
            Rule::instant_compare("low", Comparison::Lower, milestone),
            Value::from(chrono::Utc::now()),
        ),
        (
            "text_field_relation",
            Rule::text_field_relation(
                "greeting",
                TextRelation::StartsWith,
                "prefix",
                StringComparison::OrdinalIgnoreCase,
            ),
            Value::from("HELLO world"),
        ),
        ("upper_case", Rule::upper_case("prefix"), Value::from("HELLO")),
    ];

    for (name, rule, value) in &rules {
        group.bench_function(*name, |b| {
            b.iter(|| evaluator.evaluate(black_box(rule), black_box(value), &instance, "Field"))
        });
    }

    group.finish();
}

/// 包含判断随集合大小的扩展性
fn bench_containment_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("containment_scaling");
    let schema = create_schema();
    let pair = create_pair();
    let instance = schema.instance(&pair);
    let evaluator = RuleEvaluator::new();

    for size in [8usize, 64, 512].iter() {
        let rule = Rule::contains_numerics("low", (0..*size as i64).step_by(2)).unwrap();
        let collection = Value::from((0..*size as i64).rev().collect::<Vec<_>>());

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| evaluator.evaluate(&rule, black_box(&collection), &instance, "Field"))
        });
    }

    group.finish();
}

/// 值缺失时的软跳过路径
fn bench_skip_path(c: &mut Criterion) {
    let schema = create_schema();
    let pair = Pair {
        high: None,
        ..create_pair()
    };
    let instance = schema.instance(&pair);
    let evaluator = RuleEvaluator::new();
    let rule = Rule::numeric_field_compare("low", Comparison::Lower, "high");
    let value = Value::from(10i64);

    c.bench_function("skip_sibling_absent", |b| {
        b.iter(|| evaluator.evaluate(&rule, black_box(&value), &instance, "Field"))
    });
}

criterion_group!(
    benches,
    bench_normalization,
    bench_rule_kinds,
    bench_containment_scaling,
    bench_skip_path,
);

criterion_main!(benches);
