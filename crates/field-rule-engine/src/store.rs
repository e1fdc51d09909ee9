//! 规则集存储管理
//!
//! 使用 DashMap 提供线程安全的规则集缓存，按模型名称索引，支持加载、更新、删除和批量操作。

use crate::compiler::{CompiledRuleSet, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::models::RuleSetDefinition;
use dashmap::DashMap;
use rule_shared::observability::metrics::set_rule_sets_loaded;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 规则集存储
#[derive(Clone)]
pub struct RuleStore {
    /// 编译后的规则集缓存
    sets: Arc<DashMap<String, Arc<CompiledRuleSet>>>,
    /// 规则编译器
    compiler: Arc<parking_lot::Mutex<RuleCompiler>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::with_compiler(RuleCompiler::new())
    }

    /// 使用指定编译器创建存储
    pub fn with_compiler(compiler: RuleCompiler) -> Self {
        Self {
            sets: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(compiler)),
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// 加载规则集，同名模型的旧规则集被替换
    #[instrument(skip(self, definition), fields(model = %definition.model))]
    pub fn load(&self, definition: RuleSetDefinition) -> Result<Arc<CompiledRuleSet>> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile_set(definition)?
        };
        Ok(self.insert(compiled))
    }

    /// 从 JSON 字符串加载规则集，返回模型名称
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<String> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile_from_json(json)?
        };
        let model = compiled.model.clone();
        self.insert(compiled);
        Ok(model)
    }

    fn insert(&self, compiled: CompiledRuleSet) -> Arc<CompiledRuleSet> {
        let compiled = Arc::new(compiled);
        self.sets.insert(compiled.model.clone(), compiled.clone());
        set_rule_sets_loaded(self.sets.len());

        info!(
            "规则集已加载: {} ({} 条规则, 编译版本 {})",
            compiled.model,
            compiled.len(),
            compiled.compile_version
        );
        compiled
    }

    /// 更新已存在的规则集
    #[instrument(skip(self, definition), fields(model = %definition.model))]
    pub fn update(&self, definition: RuleSetDefinition) -> Result<Arc<CompiledRuleSet>> {
        if !self.sets.contains_key(&definition.model) {
            warn!("更新不存在的规则集: {}", definition.model);
            return Err(RuleError::RuleSetNotFound(definition.model));
        }

        self.load(definition)
    }

    /// 删除规则集
    #[instrument(skip(self))]
    pub fn delete(&self, model: &str) -> Result<()> {
        if self.sets.remove(model).is_some() {
            set_rule_sets_loaded(self.sets.len());
            info!("规则集已删除: {}", model);
            Ok(())
        } else {
            warn!("删除不存在的规则集: {}", model);
            Err(RuleError::RuleSetNotFound(model.to_string()))
        }
    }

    /// 获取规则集
    pub fn get(&self, model: &str) -> Result<Arc<CompiledRuleSet>> {
        self.sets
            .get(model)
            .map(|s| s.value().clone())
            .ok_or_else(|| RuleError::RuleSetNotFound(model.to_string()))
    }

    pub fn contains(&self, model: &str) -> bool {
        self.sets.contains_key(model)
    }

    /// 获取所有模型名称
    pub fn list_ids(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.key().clone()).collect()
    }

    /// 批量加载规则集，失败的规则集记录警告后跳过
    #[instrument(skip(self, definitions))]
    pub fn load_batch(&self, definitions: Vec<RuleSetDefinition>) -> Vec<String> {
        let mut loaded = Vec::with_capacity(definitions.len());
        let mut errors = Vec::new();

        for definition in definitions {
            let model = definition.model.clone();
            match self.load(definition) {
                Ok(_) => loaded.push(model),
                Err(e) => errors.push((model, e)),
            }
        }

        if !errors.is_empty() {
            warn!("批量加载部分失败: {:?}", errors);
        }

        info!("批量加载完成: {} 成功, {} 失败", loaded.len(), errors.len());
        loaded
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.sets.len();
        self.sets.clear();
        set_rule_sets_loaded(0);
        info!("已清空 {} 个规则集", count);
    }

    /// 获取存储统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let sets_count = self.sets.len();
        let (rules_count, total_fields) = self
            .sets
            .iter()
            .fold((0, 0), |(rules, fields), s| {
                (rules + s.len(), fields + s.required_fields.len())
            });

        RuleStoreStats {
            sets_count,
            rules_count,
            avg_fields_per_set: if sets_count > 0 {
                total_fields as f64 / sets_count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 规则集存储统计信息
#[derive(Debug, Clone)]
pub struct RuleStoreStats {
    /// 规则集总数
    pub sets_count: usize,
    /// 所有规则集的规则总数
    pub rules_count: usize,
    /// 平均每个规则集引用的字段数
    pub avg_fields_per_set: f64,
}
