// ==========================================
// O2O 门店商品分析 - 指标聚合器
// ==========================================
// 职责: 门店级 / 分类级 / 成本 / 多规格结构 / 一致性校验
// 输入: StoreDatasets + MultiSpecResolution + SKU 单元
// ==========================================

pub mod category;
pub mod consistency;
pub mod cost;
pub mod store;
pub mod structure;

pub use category::{compute_category_detail, has_level_data, CategoryAggregate, CategoryCost};
pub use consistency::{run_consistency_checks, CheckInputs, ConsistencyCheck};
pub use cost::{compute_cost_analysis, CostAnalysis, CostSummaryRow, ALL_CATEGORIES_LABEL};
pub use store::{
    compute_price_band_analysis, compute_role_analysis, compute_store_kpi, BreakdownRow,
    StoreCostKpi, StoreKpi,
};
pub use structure::{
    sku_structure_overview, unique_multi_spec_products, SkuStructureRow, UniqueMultiSpecProduct,
};
