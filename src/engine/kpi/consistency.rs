// ==========================================
// O2O 门店商品分析 - 一致性校验
// ==========================================
// 职责: 聚合阶段交叉核对（计数容差 0，金额容差可配置）
// 红线: 不一致只记录 + 告警，不自动修正，不阻断导出
// ==========================================

use crate::engine::kpi::category::CategoryAggregate;
use crate::engine::kpi::store::{BreakdownRow, StoreKpi};
use serde::Serialize;
use tracing::{info, warn};

/// 单项校验结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyCheck {
    pub store: String,
    pub name: String,
    pub expected: f64,
    pub actual: f64,
    pub tolerance: f64,
    pub passed: bool,
}

impl ConsistencyCheck {
    fn new(store: &str, name: &str, expected: f64, actual: f64, tolerance: f64) -> Self {
        Self {
            store: store.to_string(),
            name: name.to_string(),
            expected,
            actual,
            tolerance,
            passed: (expected - actual).abs() <= tolerance,
        }
    }

    pub fn difference(&self) -> f64 {
        self.actual - self.expected
    }
}

/// 校验所需的聚合结果
pub struct CheckInputs<'a> {
    pub kpi: &'a StoreKpi,
    pub roles: &'a [BreakdownRow],
    pub price_bands: &'a [BreakdownRow],
    pub category_l1: &'a [CategoryAggregate],
    /// 多规格商品报告行数
    pub multi_spec_report_rows: usize,
    /// 唯一多规格商品列表行数
    pub unique_multi_spec_rows: usize,
}

/// 执行一致性校验
///
/// # 参数
/// - inputs: 聚合结果
/// - revenue_tolerance: 金额容差
///
/// # 返回
/// - 全部校验项（含通过项），不一致项已 warn 记录
pub fn run_consistency_checks(inputs: &CheckInputs<'_>, revenue_tolerance: f64) -> Vec<ConsistencyCheck> {
    let kpi = inputs.kpi;
    let store = kpi.store.as_str();
    let count = |rows: &[BreakdownRow]| rows.iter().map(|r| r.sku_count).sum::<usize>() as f64;
    let revenue = |rows: &[BreakdownRow]| rows.iter().map(|r| r.revenue).sum::<f64>();

    let checks = vec![
        ConsistencyCheck::new(store, "角色SKU数合计 = 动销SKU数", kpi.active_sku as f64, count(inputs.roles), 0.0),
        ConsistencyCheck::new(
            store,
            "角色销售额合计 = 总销售额(去重后)",
            kpi.dedup_revenue,
            revenue(inputs.roles),
            revenue_tolerance,
        ),
        ConsistencyCheck::new(store, "价格带SKU数合计 = 动销SKU数", kpi.active_sku as f64, count(inputs.price_bands), 0.0),
        ConsistencyCheck::new(
            store,
            "价格带销售额合计 = 总销售额(去重后)",
            kpi.dedup_revenue,
            revenue(inputs.price_bands),
            revenue_tolerance,
        ),
        ConsistencyCheck::new(
            store,
            "一级分类动销SKU数合计 = 动销SKU数",
            kpi.active_sku as f64,
            inputs.category_l1.iter().map(|c| c.active_sku).sum::<usize>() as f64,
            0.0,
        ),
        ConsistencyCheck::new(
            store,
            "一级分类sku数合计 = 总SKU数(含规格)",
            kpi.total_sku_with_specs as f64,
            inputs.category_l1.iter().map(|c| c.sku_count).sum::<usize>() as f64,
            0.0,
        ),
        ConsistencyCheck::new(
            store,
            "单规格SKU数 + 多规格SKU总数 = 总SKU数(含规格)",
            kpi.total_sku_with_specs as f64,
            (kpi.single_spec_sku + kpi.multi_spec_sku_total) as f64,
            0.0,
        ),
        ConsistencyCheck::new(
            store,
            "多规格SKU总数 = 多规格商品报告行数",
            kpi.multi_spec_sku_total as f64,
            inputs.multi_spec_report_rows as f64,
            0.0,
        ),
        ConsistencyCheck::new(
            store,
            "唯一多规格商品数 = 唯一多规格商品列表行数",
            kpi.unique_multi_spec_products as f64,
            inputs.unique_multi_spec_rows as f64,
            0.0,
        ),
        ConsistencyCheck::new(
            store,
            "一级分类0库存数合计 = 0库存SKU数",
            kpi.zero_stock_sku as f64,
            inputs.category_l1.iter().map(|c| c.zero_stock_sku).sum::<usize>() as f64,
            0.0,
        ),
    ];

    let failed = checks.iter().filter(|c| !c.passed).count();
    for check in checks.iter().filter(|c| !c.passed) {
        warn!(
            store,
            check = %check.name,
            expected = check.expected,
            actual = check.actual,
            "一致性校验不通过"
        );
    }
    info!(store, total = checks.len(), failed, "一致性校验完成");

    checks
}
