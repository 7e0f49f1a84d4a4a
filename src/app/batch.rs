// ==========================================
// O2O 门店商品分析 - 批量分析
// ==========================================
// 流程: 逐个门店分析 → 汇总成功门店 → 导出一份报表
// 单店失败只记录告警，不中断其余门店
// ==========================================

use crate::app::state::{ReportSelection, StoreAnalyzer};
use crate::config::AnalysisConfig;
use crate::report::ReportResult;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const DEFAULT_OUTPUT_DIR: &str = "reports";
pub const DEFAULT_OUTPUT_NAME: &str = "门店分析报告.xlsx";

/// 批量分析参数
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// 门店文件（与 stores 按位置对应）
    pub inputs: Vec<PathBuf>,
    /// 门店名称；缺省取文件名（不含扩展名）
    pub stores: Vec<String>,
    /// 输出文件名或路径
    pub output: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub config: AnalysisConfig,
}

/// 失败门店
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFailure {
    pub store: String,
    pub input: PathBuf,
    pub reason: String,
}

/// 批量结果
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<StoreFailure>,
    /// 无成功门店时为 None
    pub report_path: Option<PathBuf>,
}

impl BatchSummary {
    pub fn has_success(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

/// 门店名: 显式名称优先，其次文件名
pub fn store_name_for(index: usize, input: &Path, stores: &[String]) -> String {
    stores
        .get(index)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| format!("门店{}", index + 1))
}

/// 计算报表输出路径
///
/// # 规则
/// - 未指定 output: `<output_dir 或 reports>/门店分析报告.xlsx`
/// - 指定 output_dir: 只取 output 的文件名放入该目录
/// - 仅指定 output: output 含目录时原样使用，否则放入 reports/
/// - 无扩展名时补 .xlsx
pub fn resolve_report_path(output: Option<&str>, output_dir: Option<&Path>) -> PathBuf {
    let requested = PathBuf::from(output.unwrap_or(DEFAULT_OUTPUT_NAME));
    let mut path = match output_dir {
        Some(dir) => dir.join(requested.file_name().unwrap_or(requested.as_os_str())),
        None if requested.parent().is_some_and(|p| !p.as_os_str().is_empty()) => requested,
        None => Path::new(DEFAULT_OUTPUT_DIR).join(requested),
    };
    if path.extension().is_none() {
        path.set_extension("xlsx");
    }
    path
}

/// 批量分析并导出
#[instrument(skip(options), fields(inputs = options.inputs.len()))]
pub fn run_batch(options: BatchOptions) -> ReportResult<BatchSummary> {
    let BatchOptions {
        inputs,
        stores,
        output,
        output_dir,
        config,
    } = options;

    if stores.len() > inputs.len() {
        warn!(stores = stores.len(), inputs = inputs.len(), "门店名称多于输入文件，多余名称忽略");
    }

    let mut analyzer = StoreAnalyzer::new(config);
    let mut summary = BatchSummary::default();

    for (index, input) in inputs.iter().enumerate() {
        let store = store_name_for(index, input, &stores);
        match analyzer.try_analyze_file(input, &store) {
            Ok(run) => {
                info!(store = %run.store, dedup_sku = run.analysis.kpi.dedup_sku, "门店分析成功");
                if !summary.succeeded.contains(&store) {
                    summary.succeeded.push(store);
                }
            }
            Err(e) => {
                warn!(store = %store, file = %input.display(), error = %e, "门店分析失败，跳过");
                summary.failed.push(StoreFailure {
                    store,
                    input: input.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if !summary.has_success() {
        warn!(failed = summary.failed.len(), "没有成功分析的门店，不生成报表");
        return Ok(summary);
    }

    let target = resolve_report_path(output.as_deref(), output_dir.as_deref());
    let written = analyzer.export_report(&ReportSelection::Stores(summary.succeeded.clone()), &target)?;

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        report = %written.display(),
        "批量分析完成"
    );
    summary.report_path = Some(written);
    Ok(summary)
}
