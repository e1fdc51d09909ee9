//! 规则引擎指标模块
//!
//! 基于 metrics crate 门面记录指标，未安装 recorder 时记录操作为空操作。

/// 注册指标描述
///
/// 这些描述会出现在导出端点的 HELP 注释中。
pub fn describe_metrics() {
    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );

    metrics::describe_counter!(
        "rule_skips_total",
        "Total number of rule evaluations skipped because data was missing"
    );

    metrics::describe_counter!(
        "model_validations_total",
        "Total number of whole-object validations"
    );
    metrics::describe_histogram!(
        "model_validation_duration_seconds",
        "Whole-object validation duration in seconds"
    );

    metrics::describe_gauge!("rule_sets_loaded", "Number of rule sets held by the rule store");
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录规则评估
#[inline]
pub fn record_rule_evaluation(kind: &str, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "rule_evaluations_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "rule_evaluation_duration_seconds",
        "kind" => kind.to_string()
    )
    .record(duration_secs);
}

/// 记录软跳过
#[inline]
pub fn record_rule_skip(kind: &str, reason: &str) {
    metrics::counter!(
        "rule_skips_total",
        "kind" => kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录整体校验
#[inline]
pub fn record_model_validation(model: &str, valid: bool, duration_secs: f64) {
    metrics::counter!(
        "model_validations_total",
        "model" => model.to_string(),
        "valid" => valid.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "model_validation_duration_seconds",
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// 更新已加载的规则集数量
#[inline]
pub fn set_rule_sets_loaded(count: usize) {
    metrics::gauge!("rule_sets_loaded").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        describe_metrics();
        record_rule_evaluation("numeric_compare", "pass", 0.0001);
        record_rule_skip("numeric_field_compare", "sibling_value_absent");
        record_model_validation("Account", false, 0.002);
        set_rule_sets_loaded(3);
    }
}
