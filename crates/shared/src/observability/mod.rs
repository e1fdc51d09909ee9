//! 统一可观测性模块
//!
//! 提供 tracing 日志与 metrics 指标的统一初始化。
//! 指标只通过 metrics 门面记录，导出器（Prometheus 等）由宿主安装。

pub mod metrics;
pub mod tracing;

use crate::config::ObservabilityConfig;
use ::tracing::info;
use anyhow::Result;

/// 统一初始化可观测性
///
/// 初始化顺序：
/// 1. Tracing（日志）
/// 2. Metrics（指标描述）
///
/// # Example
///
/// ```ignore
/// use rule_shared::config::AppConfig;
/// use rule_shared::observability;
///
/// fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("field-rules")?;
///     observability::init(&config.service_name, &config.observability)?;
///
///     // 应用逻辑...
///
///     Ok(())
/// }
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    if config.metrics_enabled {
        metrics::describe_metrics();
    }

    info!(
        service = %service_name,
        log_format = %config.log_format,
        metrics_enabled = config.metrics_enabled,
        "Observability initialized"
    );

    Ok(())
}
