//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use crate::error::{Result, SharedError};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 规则定义未指定文本比较模式时使用的默认模式
    pub default_comparison: String,
    /// 软跳过诊断事件的日志级别（trace/debug/info/warn）
    pub skip_log_level: String,
    /// 整体校验时是否记录每条规则的执行轨迹
    pub trace_enabled: bool,
    /// 按规则种类覆盖默认失败消息模板
    pub message_overrides: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_comparison: "ordinal".to_string(),
            skip_log_level: "debug".to_string(),
            trace_enabled: false,
            message_overrides: HashMap::new(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（RULES_ 前缀，层级用双下划线分隔，如 RULES_ENGINE__TRACE_ENABLED -> engine.trace_enabled）
    pub fn load(service_name: &str) -> Result<Self> {
        let env = std::env::var("RULES_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, service_name: &str, env: &str) -> Result<Self> {
        let builder = Config::builder()
            // 默认配置
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            // 加载默认配置文件
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // 加载环境特定配置
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            // 环境变量覆盖
            .add_source(
                Environment::with_prefix("RULES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

        let level = self.engine.skip_log_level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(SharedError::InvalidConfig {
                field: "engine.skip_log_level".to_string(),
                message: format!("未知的日志级别: {}", self.engine.skip_log_level),
            });
        }

        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_config_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rule-shared-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.engine.default_comparison, "ordinal");
        assert!(!config.engine.trace_enabled);
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = temp_config_dir("empty");
        let config = AppConfig::load_from(&dir, "field-rules", "test").unwrap();

        assert_eq!(config.service_name, "field-rules");
        assert_eq!(config.environment, "test");
        assert_eq!(config.engine.skip_log_level, "debug");
        assert!(!config.is_production());
    }

    #[test]
    fn test_environment_file_overrides_default() {
        let dir = temp_config_dir("layered");
        fs::write(
            dir.join("default.toml"),
            r#"
[engine]
default_comparison = "culture"
trace_enabled = false

[engine.message_overrides]
upper_case = "{field} 必须大写"
"#,
        )
        .unwrap();
        fs::write(
            dir.join("production.toml"),
            r#"
[engine]
trace_enabled = true

[observability]
log_format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir, "field-rules", "production").unwrap();
        assert!(config.is_production());
        assert!(config.engine.trace_enabled);
        assert_eq!(config.engine.default_comparison, "culture");
        assert_eq!(
            config.engine.message_overrides.get("upper_case").map(String::as_str),
            Some("{field} 必须大写")
        );
        assert!(config.observability.json_logs());
    }

    #[test]
    fn test_invalid_skip_level_rejected() {
        let dir = temp_config_dir("invalid");
        fs::write(dir.join("staging.toml"), "[engine]\nskip_log_level = \"loud\"\n").unwrap();

        let err = AppConfig::load_from(&dir, "field-rules", "staging").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
