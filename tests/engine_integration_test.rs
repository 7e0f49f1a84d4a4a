// ==========================================
// 引擎集成测试
// ==========================================
// 测试目标: 文件 → 三套数据集 → 多规格识别 → 指标聚合 的口径闭环
// ==========================================


use o2o_store_analyzer::config::AnalysisConfig;
use o2o_store_analyzer::engine::{deduplicate, run_store_pipeline, StoreRun};
use o2o_store_analyzer::logging;
use tempfile::TempDir;
use test_helpers::{store_a_rows, store_b_rows, write_csv, write_xlsx, FULL_HEADER, STORE_B_HEADER};

fn analyze_store_a(dir: &TempDir) -> StoreRun {
    let path = write_xlsx(dir.path(), "门店A.xlsx", FULL_HEADER, &store_a_rows());
    run_store_pipeline(&path, "门店A", &AnalysisConfig::default()).unwrap()
}

#[test]
fn test_store_a_headline_counts() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let run = analyze_store_a(&dir);
    let kpi = &run.analysis.kpi;

    // 店铺管理分类被过滤
    assert_eq!(run.datasets.all_rows.len(), 7);
    assert!(run.datasets.all_rows.iter().all(|r| r.category_l1 != "店铺管理"));

    assert_eq!(kpi.dedup_sku, 6);
    assert_eq!(kpi.active_sku, 5);
    assert_eq!(kpi.inactive_sku, 1);
    assert_eq!(kpi.multi_spec_sku_total, 4);
    assert_eq!(kpi.multi_spec_spu, 2);
    assert_eq!(kpi.total_sku_with_specs, 7);

    // 数量单位解析
    let milk = run
        .datasets
        .all_rows
        .iter()
        .find(|r| r.product_name == "牛奶")
        .unwrap();
    assert_eq!(milk.sales_qty, 12000);

    assert!(run.analysis.cost.is_some());
    assert!(run.analysis.category_l3.is_some());
}

#[test]
fn test_partition_and_monotonicity() {
    let dir = TempDir::new().unwrap();
    let a = analyze_store_a(&dir);
    let b_path = write_csv(dir.path(), "门店B.csv", STORE_B_HEADER, &store_b_rows());
    let b = run_store_pipeline(&b_path, "门店B", &AnalysisConfig::default()).unwrap();

    for run in [&a, &b] {
        let kpi = &run.analysis.kpi;
        assert_eq!(
            kpi.single_spec_sku + kpi.multi_spec_sku_total,
            kpi.total_sku_with_specs,
            "门店 {}",
            run.store
        );
        assert!(run.datasets.active.len() <= run.datasets.deduplicated.len());
        assert!(run.datasets.deduplicated.len() <= run.datasets.all_rows.len());
        assert_eq!(run.resolution.records.len(), kpi.multi_spec_sku_total);
    }

    // 门店B 的重复行只计一次，且不构成多规格
    assert_eq!(b.analysis.kpi.dedup_sku, 3);
    assert_eq!(b.analysis.kpi.multi_spec_sku_total, 0);
    assert_eq!(b.analysis.kpi.active_sku, 2);
}

#[test]
fn test_dedup_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let run = analyze_store_a(&dir);

    let again = deduplicate(&run.datasets.deduplicated);
    assert_eq!(again, run.datasets.deduplicated);
}

#[test]
fn test_cross_footing() {
    let dir = TempDir::new().unwrap();
    let run = analyze_store_a(&dir);
    let analysis = &run.analysis;

    let category_active: usize = analysis.category_l1.iter().map(|c| c.active_sku).sum();
    assert_eq!(category_active, analysis.kpi.active_sku);

    let role_skus: usize = analysis.role_analysis.iter().map(|r| r.sku_count).sum();
    assert_eq!(role_skus, analysis.kpi.active_sku);

    let role_revenue: f64 = analysis.role_analysis.iter().map(|r| r.revenue).sum();
    assert!((role_revenue - analysis.kpi.dedup_revenue).abs() <= 0.01);

    let band_skus: usize = analysis.price_band_analysis.iter().map(|r| r.sku_count).sum();
    assert_eq!(band_skus, analysis.kpi.active_sku);

    assert_eq!(analysis.failed_checks().count(), 0);
}

#[test]
fn test_identical_input_gives_identical_analysis() {
    let dir = TempDir::new().unwrap();
    let first = analyze_store_a(&dir);
    let second = analyze_store_a(&dir);

    assert_eq!(first.datasets.deduplicated, second.datasets.deduplicated);
    assert_eq!(first.resolution.records, second.resolution.records);
    assert_eq!(first.analysis.category_l1, second.analysis.category_l1);
    assert_ne!(first.run_id, second.run_id);
}
