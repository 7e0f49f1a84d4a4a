// ==========================================
// 批量分析端到端测试
// ==========================================
// 测试目标: 多门店批量分析 → 单店失败隔离 → 报表导出与回读
// ==========================================


use o2o_store_analyzer::app::{run_batch, BatchOptions, ReportSelection, StoreAnalyzer};
use o2o_store_analyzer::config::AnalysisConfig;
use o2o_store_analyzer::logging;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use test_helpers::{
    column, read_sheet, sheet_names, store_a_rows, store_b_rows, write_csv, write_xlsx,
    FULL_HEADER, STORE_B_HEADER,
};

/// 门店A(xlsx) + 门店B(csv) + 缺原价列的门店C
fn prepare_inputs(dir: &Path) -> Vec<PathBuf> {
    vec![
        write_xlsx(dir, "a.xlsx", FULL_HEADER, &store_a_rows()),
        write_csv(dir, "b.csv", STORE_B_HEADER, &store_b_rows()),
        write_csv(
            dir,
            "c.csv",
            "商品名称,售价,月售,美团一级分类,库存",
            &["可乐,3,10,饮料,5"],
        ),
    ]
}

fn batch_options(dir: &Path, output: &str) -> BatchOptions {
    BatchOptions {
        inputs: prepare_inputs(dir),
        stores: vec!["门店A".to_string(), "门店B".to_string(), "门店C".to_string()],
        output: Some(output.to_string()),
        output_dir: Some(dir.join("reports")),
        config: AnalysisConfig::default(),
    }
}

#[test]
fn test_batch_isolates_missing_column_store() {
    logging::init_test();
    let dir = TempDir::new().unwrap();

    let summary = run_batch(batch_options(dir.path(), "报告")).unwrap();

    assert_eq!(summary.succeeded, vec!["门店A", "门店B"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].store, "门店C");
    assert!(summary.failed[0].reason.contains("original_price"));

    let report = summary.report_path.unwrap();
    assert_eq!(report, dir.path().join("reports").join("报告.xlsx"));
    assert!(report.exists());
}

#[test]
fn test_exported_workbook_contents() {
    let dir = TempDir::new().unwrap();
    let summary = run_batch(batch_options(dir.path(), "报告.xlsx")).unwrap();
    let report = summary.report_path.unwrap();

    let names = sheet_names(&report).unwrap();
    for expected in [
        "核心指标对比",
        "商品角色分析",
        "价格带分析",
        "美团一级分类详细指标",
        "美团三级分类详细指标",
        "详细SKU报告(去重后)",
        "多规格商品报告(全)",
        "唯一多规格商品列表",
        "SKU结构概览",
        "数据一致性校验",
        "成本分析汇总",
    ] {
        assert!(names.iter().any(|n| n == expected), "缺少工作表 {}", expected);
    }

    let core = read_sheet(&report, "核心指标对比").unwrap();
    assert_eq!(column(&core, "门店"), vec!["门店A", "门店B"]);
    assert_eq!(column(&core, "总SKU数(去重后)"), vec!["6", "3"]);
    assert_eq!(column(&core, "多规格SKU总数"), vec!["4", "0"]);

    // 多规格商品报告行数 = 多规格SKU总数
    let multi = read_sheet(&report, "多规格商品报告(全)").unwrap();
    assert_eq!(multi.len() - 1, 4);
    assert!(column(&multi, "规格种类数").iter().all(|v| *v == "2"));

    let detail = read_sheet(&report, "详细SKU报告(去重后)").unwrap();
    assert_eq!(detail.len() - 1, 9);

    let checks = read_sheet(&report, "数据一致性校验").unwrap();
    assert!(column(&checks, "是否通过").iter().all(|v| *v == "通过"));

    let category = read_sheet(&report, "美团一级分类详细指标").unwrap();
    assert_eq!(category[0][0], "门店");
    assert_eq!(category[0][1], "美团一级分类");
    assert!(category[0].iter().any(|h| h == "美团一级分类折扣"));
}

#[test]
fn test_export_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = run_batch(batch_options(dir.path(), "first")).unwrap();
    let second = run_batch(batch_options(dir.path(), "second")).unwrap();

    let first = first.report_path.unwrap();
    let second = second.report_path.unwrap();
    let names = sheet_names(&first).unwrap();
    assert_eq!(names, sheet_names(&second).unwrap());

    for name in &names {
        assert_eq!(
            read_sheet(&first, name).unwrap(),
            read_sheet(&second, name).unwrap(),
            "工作表 {} 不一致",
            name
        );
    }
}

#[test]
fn test_batch_without_success_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let summary = run_batch(BatchOptions {
        inputs: vec![dir.path().join("不存在.csv")],
        output_dir: Some(dir.path().join("reports")),
        ..BatchOptions::default()
    })
    .unwrap();

    assert!(!summary.has_success());
    assert_eq!(summary.failed[0].store, "不存在");
    assert!(summary.report_path.is_none());
    assert!(!dir.path().join("reports").exists());
}

#[test]
fn test_analyzer_exports_single_store_selection() {
    let dir = TempDir::new().unwrap();
    let inputs = prepare_inputs(dir.path());

    let mut analyzer = StoreAnalyzer::new(AnalysisConfig::default());
    assert!(analyzer.analyze_file(&inputs[0], "门店A").is_some());
    assert!(analyzer.analyze_file(&inputs[1], "门店B").is_some());
    assert!(analyzer.analyze_file(&inputs[2], "门店C").is_none());

    let written = analyzer
        .export_report(
            &ReportSelection::Store("门店B".to_string()),
            &dir.path().join("单店.xlsx"),
        )
        .unwrap();

    let core = read_sheet(&written, "核心指标对比").unwrap();
    assert_eq!(column(&core, "门店"), vec!["门店B"]);
    // 门店B 无成本数据，不输出成本工作表
    let names = sheet_names(&written).unwrap();
    assert!(!names.iter().any(|n| n == "成本分析汇总"));
}
