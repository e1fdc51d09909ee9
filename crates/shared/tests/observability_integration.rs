//! 可观测性与配置模块集成测试

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use rule_shared::observability::metrics::{
        describe_metrics, record_model_validation, record_rule_evaluation, record_rule_skip,
        set_rule_sets_loaded,
    };

    #[test]
    fn test_record_rule_evaluation() {
        record_rule_evaluation("numeric_compare", "pass", 0.0001);
        record_rule_evaluation("numeric_compare", "fail", 0.0002);
        record_rule_evaluation("contains_numerics", "pass", 0.0005);
        record_rule_evaluation("text_field_relation", "error", 0.0001);
    }

    #[test]
    fn test_record_rule_skip() {
        record_rule_skip("numeric_compare", "value_absent");
        record_rule_skip("numeric_field_compare", "sibling_field_missing");
        record_rule_skip("text_field_relation", "sibling_value_absent");
    }

    #[test]
    fn test_record_model_validation() {
        describe_metrics();
        record_model_validation("Account", true, 0.001);
        record_model_validation("Order", false, 0.003);
        set_rule_sets_loaded(2);
    }
}

// ============================================================================
// 配置加载测试
// ============================================================================

mod config_tests {
    use rule_shared::config::{AppConfig, EngineConfig, ObservabilityConfig};
    use rule_shared::observability;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.default_comparison, "ordinal");
        assert_eq!(engine.skip_log_level, "debug");
        assert!(engine.message_overrides.is_empty());
    }

    #[test]
    fn test_json_log_format_detection() {
        let json = ObservabilityConfig {
            log_format: "JSON".to_string(),
            ..Default::default()
        };
        assert!(json.json_logs());
        assert!(!ObservabilityConfig::default().json_logs());
    }

    #[test]
    fn test_second_init_reports_error() {
        let config = ObservabilityConfig::default();
        let _ = observability::init("field-rules", &config);

        // 全局 subscriber 只能设置一次
        assert!(observability::init("field-rules", &config).is_err());
    }

    #[test]
    fn test_load_from_missing_directory() {
        let dir = std::env::temp_dir().join("rule-shared-integration-missing");
        let config = AppConfig::load_from(&dir, "field-rules", "development").unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.observability.log_level, "info");
    }
}
