// ==========================================
// O2O 门店商品分析 - 门店分析流水线
// ==========================================
// 流程:
// 1. 加载与清洗 (importer)
// 2. 三套数据集 (dedup)
// 3. 多规格识别 (multi_spec)
// 4. 指标聚合 + 一致性校验 (kpi)
// 单线程同步执行；单个门店的所有中间结果不跨门店共享
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::types::CategoryLevel;
use crate::engine::dedup::{build_datasets, build_sku_units, StoreDatasets};
use crate::engine::kpi::{
    compute_category_detail, compute_cost_analysis, compute_price_band_analysis,
    compute_role_analysis, compute_store_kpi, has_level_data, run_consistency_checks,
    sku_structure_overview, unique_multi_spec_products, BreakdownRow, CategoryAggregate,
    CheckInputs, ConsistencyCheck, CostAnalysis, SkuStructureRow, StoreKpi,
    UniqueMultiSpecProduct,
};
use crate::engine::multi_spec::{resolve_multi_spec, MultiSpecResolution};
use crate::importer::{load_store_rows, ImportResult};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{info, info_span};
use uuid::Uuid;

// ==========================================
// StoreAnalysis - 单门店分析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct StoreAnalysis {
    pub store: String,
    pub kpi: StoreKpi,
    pub role_analysis: Vec<BreakdownRow>,
    pub price_band_analysis: Vec<BreakdownRow>,
    pub category_l1: Vec<CategoryAggregate>,
    /// 无三级分类数据时为 None
    pub category_l3: Option<Vec<CategoryAggregate>>,
    /// 无成本数据时为 None
    pub cost: Option<CostAnalysis>,
    pub unique_multi_spec: Vec<UniqueMultiSpecProduct>,
    pub sku_structure: Vec<SkuStructureRow>,
    pub checks: Vec<ConsistencyCheck>,
}

impl StoreAnalysis {
    pub fn failed_checks(&self) -> impl Iterator<Item = &ConsistencyCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// 门店分析
///
/// # 参数
/// - datasets: 三套数据集
/// - resolution: 多规格识别结果（由 datasets.all_rows 计算）
/// - config: 分析参数
pub fn analyze_store_performance(
    datasets: &StoreDatasets,
    resolution: &MultiSpecResolution,
    config: &AnalysisConfig,
) -> StoreAnalysis {
    let units = build_sku_units(&datasets.all_rows, resolution);

    let kpi = compute_store_kpi(datasets, resolution, &units, config);
    let role_analysis = compute_role_analysis(&datasets.active);
    let price_band_analysis = compute_price_band_analysis(&datasets.active);

    let category_l1 =
        compute_category_detail(datasets, resolution, &units, CategoryLevel::L1, config);
    let category_l3 = has_level_data(&datasets.all_rows, CategoryLevel::L3).then(|| {
        compute_category_detail(datasets, resolution, &units, CategoryLevel::L3, config)
    });

    let cost = compute_cost_analysis(&datasets.all_rows, &category_l1, config);
    let unique_multi_spec = unique_multi_spec_products(&datasets.all_rows, resolution);
    let sku_structure = sku_structure_overview(&datasets.all_rows, resolution);

    let checks = run_consistency_checks(
        &CheckInputs {
            kpi: &kpi,
            roles: &role_analysis,
            price_bands: &price_band_analysis,
            category_l1: &category_l1,
            multi_spec_report_rows: resolution.records.len(),
            unique_multi_spec_rows: unique_multi_spec.len(),
        },
        config.revenue_tolerance,
    );

    StoreAnalysis {
        store: datasets.store.clone(),
        kpi,
        role_analysis,
        price_band_analysis,
        category_l1,
        category_l3,
        cost,
        unique_multi_spec,
        sku_structure,
        checks,
    }
}

// ==========================================
// StoreRun - 单次分析运行（结果缓存单元）
// ==========================================
#[derive(Debug, Clone)]
pub struct StoreRun {
    pub store: String,
    /// 日志关联 ID（不写入报表）
    pub run_id: String,
    pub analyzed_at: DateTime<Local>,
    pub datasets: StoreDatasets,
    pub resolution: MultiSpecResolution,
    pub analysis: StoreAnalysis,
}

/// 单门店完整流水线：文件 → 分析结果
///
/// # 返回
/// - Ok(StoreRun): 分析成功
/// - Err(ImportError): 文件/列/空结果错误（仅影响当前门店）
pub fn run_store_pipeline<P: AsRef<Path>>(
    path: P,
    store: &str,
    config: &AnalysisConfig,
) -> ImportResult<StoreRun> {
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("analyze_store", store, run_id = %run_id);
    let _guard = span.enter();

    info!(file = %path.as_ref().display(), "开始分析门店");

    let rows = load_store_rows(path.as_ref(), store, config)?;
    let datasets = build_datasets(rows);
    let resolution = resolve_multi_spec(&datasets.all_rows);
    let analysis = analyze_store_performance(&datasets, &resolution, config);

    info!(
        failed_checks = analysis.failed_checks().count(),
        "门店分析完成"
    );

    Ok(StoreRun {
        store: store.to_string(),
        run_id,
        analyzed_at: Local::now(),
        datasets,
        resolution,
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_pipeline_from_csv() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "商品名称,售价,原价,月售,美团一级分类,美团三级分类,库存\n\
             可乐(300ml),3,3,20,饮料,碳酸饮料,5\n\
             可乐(500ml),4,5,12,饮料,碳酸饮料,0\n\
             矿泉水,2,2,0,饮料,,3\n\
             薯片,12,20,8,零食,膨化,2\n"
        )
        .unwrap();

        let run = run_store_pipeline(file.path(), "门店A", &AnalysisConfig::default()).unwrap();

        assert_eq!(run.store, "门店A");
        assert_eq!(run.analysis.kpi.multi_spec_sku_total, 2);
        assert_eq!(run.analysis.kpi.total_sku_with_specs, 4);
        assert!(run.analysis.category_l3.is_some());
        assert!(run.analysis.cost.is_none());
        assert_eq!(run.analysis.failed_checks().count(), 0);
    }
}
