// ==========================================
// O2O 门店商品分析 - 应用层
// ==========================================
// 职责: 结果缓存、单店分析/导出入口、批量流程
// ==========================================

pub mod batch;
pub mod state;

// 重导出
pub use batch::{resolve_report_path, run_batch, BatchOptions, BatchSummary, StoreFailure};
pub use state::{ReportSelection, ResultStore, StoreAnalyzer};
