// ==========================================
// O2O 门店商品分析 - 应用状态
// ==========================================
// 职责: 进程内门店结果缓存 + 分析/导出入口
// 调用方串行调用，不做加锁
// ==========================================

use crate::config::AnalysisConfig;
use crate::engine::{run_store_pipeline, StoreRun};
use crate::importer::{ImportError, ImportResult};
use crate::report::{ReportError, ReportExporter, ReportResult};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

// ==========================================
// ResultStore - 门店结果缓存
// ==========================================

/// 以门店名为键的结果缓存
///
/// 覆盖策略: 同名门店再次分析时新结果替换旧结果，保持首次插入的位置
#[derive(Debug, Default)]
pub struct ResultStore {
    runs: IndexMap<String, StoreRun>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入结果，返回被替换的旧结果
    pub fn insert(&mut self, run: StoreRun) -> Option<StoreRun> {
        let replaced = self.runs.insert(run.store.clone(), run);
        if let Some(old) = &replaced {
            debug!(store = %old.store, old_run_id = %old.run_id, "覆盖旧分析结果");
        }
        replaced
    }

    pub fn get(&self, store: &str) -> Option<&StoreRun> {
        self.runs.get(store)
    }

    pub fn remove(&mut self, store: &str) -> Option<StoreRun> {
        self.runs.shift_remove(store)
    }

    /// 已缓存的门店（插入顺序）
    pub fn stores(&self) -> Vec<&str> {
        self.runs.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// 导出范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSelection {
    All,
    Store(String),
    Stores(Vec<String>),
}

// ==========================================
// StoreAnalyzer
// ==========================================
pub struct StoreAnalyzer {
    config: AnalysisConfig,
    results: ResultStore,
    exporter: ReportExporter,
}

impl StoreAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            results: ResultStore::new(),
            exporter: ReportExporter::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    /// 分析单个门店文件并写入缓存
    ///
    /// # 返回
    /// - Ok(&StoreRun): 缓存中的最新结果
    /// - Err(ImportError): 该门店失败，缓存不变
    pub fn try_analyze_file<P: AsRef<Path>>(&mut self, path: P, store: &str) -> ImportResult<&StoreRun> {
        let run = run_store_pipeline(path, store, &self.config)?;
        self.results.insert(run);
        self.results
            .get(store)
            .ok_or_else(|| ImportError::InternalError(format!("缓存写入失败: {}", store)))
    }

    /// 分析单个门店文件；失败时记录错误并返回 None
    pub fn analyze_file<P: AsRef<Path>>(&mut self, path: P, store: &str) -> Option<&StoreRun> {
        let path = path.as_ref();
        match run_store_pipeline(path, store, &self.config) {
            Ok(run) => {
                self.results.insert(run);
                self.results.get(store)
            }
            Err(e) => {
                error!(store, file = %path.display(), error = %e, "门店分析失败");
                None
            }
        }
    }

    /// 导出报表
    ///
    /// # 参数
    /// - selection: 导出范围（全部 / 单店 / 多店）
    /// - path: 目标 xlsx 路径
    pub fn export_report(&self, selection: &ReportSelection, path: &Path) -> ReportResult<PathBuf> {
        let runs: Vec<&StoreRun> = match selection {
            ReportSelection::All => self.results.runs.values().collect(),
            ReportSelection::Store(name) => vec![self.lookup(name)?],
            ReportSelection::Stores(names) => names
                .iter()
                .map(|n| self.lookup(n))
                .collect::<ReportResult<Vec<_>>>()?,
        };

        let written = self.exporter.export(&runs, path)?;
        info!(stores = runs.len(), path = %written.display(), "报表已生成");
        Ok(written)
    }

    fn lookup(&self, store: &str) -> ReportResult<&StoreRun> {
        self.results
            .get(store)
            .ok_or_else(|| ReportError::UnknownStore(store.to_string()))
    }
}
