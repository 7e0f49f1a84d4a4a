// ==========================================
// O2O 门店商品分析 - 引擎层
// ==========================================
// 职责: 规格信号 → 多规格识别 → 去重 → 指标聚合
// 红线: 纯计算，不做文件 I/O（流水线入口除外）
// ==========================================

pub mod analyzer;
pub mod dedup;
pub mod kpi;
pub mod multi_spec;
pub mod variant_signal;

// 重导出核心类型
pub use analyzer::{analyze_store_performance, run_store_pipeline, StoreAnalysis, StoreRun};
pub use dedup::{build_datasets, build_sku_units, canonical_order, deduplicate, SkuUnit, StoreDatasets};
pub use multi_spec::{
    barcode_signal, inferred_spec_signal, resolve_multi_spec, spec_column_signal, variant_key,
    MultiSpecRecord, MultiSpecResolution,
};
pub use variant_signal::{infer_spec, normalize_base_name, RowSignals};
