// ==========================================
// O2O 门店商品分析 - 成本分析
// ==========================================
// 职责: 成本分析汇总 / 高毛利商品 / 低毛利预警
// 前提: 源数据存在成本列且至少一行有值，否则不生成
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::product::{safe_ratio, RawRow};
use crate::engine::dedup::canonical_order;
use crate::engine::kpi::category::CategoryAggregate;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;

/// 汇总行的分类名
pub const ALL_CATEGORIES_LABEL: &str = "全部分类汇总";

/// 成本分析汇总的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummaryRow {
    pub category: String,
    pub cost_revenue: f64,
    pub revenue: f64,
    pub original_revenue: f64,
    pub gross_profit: f64,
    pub list_gross_profit: f64,
    pub sale_margin_rate: f64,
    pub list_margin_rate: f64,
    pub profit_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAnalysis {
    /// 首行为全部分类汇总，其余按售价毛利率降序
    pub summary: Vec<CostSummaryRow>,
    /// 高毛利商品（按毛利降序）
    pub high_margin: Vec<RawRow>,
    /// 低毛利预警商品（按售价销售额降序）
    pub low_margin: Vec<RawRow>,
}

/// 成本分析
///
/// # 参数
/// - all_rows: 全部商品行
/// - category_l1: 一级分类汇总（含成本指标）
/// - config: 毛利门槛与输出上限
///
/// # 返回
/// - None: 无成本数据
pub fn compute_cost_analysis(
    all_rows: &[RawRow],
    category_l1: &[CategoryAggregate],
    config: &AnalysisConfig,
) -> Option<CostAnalysis> {
    if !all_rows.iter().any(|r| r.cost.is_some()) {
        return None;
    }

    let mut rows: Vec<CostSummaryRow> = category_l1
        .iter()
        .filter_map(|agg| {
            agg.cost.as_ref().map(|c| CostSummaryRow {
                category: agg.category.clone(),
                cost_revenue: c.cost_revenue,
                revenue: agg.revenue,
                original_revenue: agg.original_revenue,
                gross_profit: c.gross_profit,
                list_gross_profit: c.list_gross_profit,
                sale_margin_rate: c.sale_margin_rate,
                list_margin_rate: c.list_margin_rate,
                profit_contribution: c.profit_contribution,
            })
        })
        .collect();
    // 稳定排序：同毛利率保持分类名顺序
    rows.sort_by(|a, b| b.sale_margin_rate.total_cmp(&a.sale_margin_rate));

    let revenue: f64 = rows.iter().map(|r| r.revenue).sum();
    let original_revenue: f64 = rows.iter().map(|r| r.original_revenue).sum();
    let gross_profit: f64 = rows.iter().map(|r| r.gross_profit).sum();
    let list_gross_profit: f64 = rows.iter().map(|r| r.list_gross_profit).sum();
    let total = CostSummaryRow {
        category: ALL_CATEGORIES_LABEL.to_string(),
        cost_revenue: rows.iter().map(|r| r.cost_revenue).sum(),
        revenue,
        original_revenue,
        gross_profit,
        list_gross_profit,
        sale_margin_rate: safe_ratio(gross_profit, revenue),
        list_margin_rate: safe_ratio(list_gross_profit, original_revenue),
        profit_contribution: 1.0,
    };

    let mut summary = Vec::with_capacity(rows.len() + 1);
    summary.push(total);
    summary.extend(rows);

    let with_cost: Vec<&RawRow> = all_rows.iter().filter(|r| r.cost.is_some()).collect();

    let mut high: Vec<&RawRow> = with_cost
        .iter()
        .copied()
        .filter(|r| r.sale_margin_rate().unwrap_or(0.0) >= config.high_margin_threshold)
        .collect();
    high.sort_by(|a, b| {
        desc_f64(a.gross_profit(), b.gross_profit()).then_with(|| canonical_order(a, b))
    });
    high.truncate(config.high_margin_limit);

    let mut low: Vec<&RawRow> = with_cost
        .iter()
        .copied()
        .filter(|r| r.sale_margin_rate().unwrap_or(0.0) < config.low_margin_threshold)
        .collect();
    low.sort_by(|a, b| desc_f64(Some(a.revenue), Some(b.revenue)).then_with(|| canonical_order(a, b)));
    low.truncate(config.low_margin_limit);

    info!(
        categories = summary.len() - 1,
        high_margin = high.len(),
        low_margin = low.len(),
        total_profit = gross_profit,
        "成本分析汇总完成"
    );

    Some(CostAnalysis {
        summary,
        high_margin: high.into_iter().cloned().collect(),
        low_margin: low.into_iter().cloned().collect(),
    })
}

fn desc_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::RowFields;
    use crate::domain::types::CategoryLevel;
    use crate::engine::dedup::{build_datasets, build_sku_units};
    use crate::engine::kpi::category::compute_category_detail;
    use crate::engine::multi_spec::resolve_multi_spec;

    fn row(n: usize, name: &str, l1: &str, price: f64, qty: u64, cost: Option<f64>) -> RawRow {
        RawRow::from_fields(
            RowFields {
                store: "门店A".to_string(),
                row_number: n,
                product_name: name.to_string(),
                category_l1: l1.to_string(),
                price,
                original_price: price,
                sales_qty: qty,
                stock: 1,
                cost,
                ..Default::default()
            },
            &[],
        )
    }

    fn analyze(rows: Vec<RawRow>) -> Option<CostAnalysis> {
        let config = AnalysisConfig::default();
        let ds = build_datasets(rows);
        let res = resolve_multi_spec(&ds.all_rows);
        let units = build_sku_units(&ds.all_rows, &res);
        let l1 = compute_category_detail(&ds, &res, &units, CategoryLevel::L1, &config);
        compute_cost_analysis(&ds.all_rows, &l1, &config)
    }

    #[test]
    fn test_no_cost_data() {
        assert!(analyze(vec![row(1, "可乐", "饮料", 3.0, 1, None)]).is_none());
    }

    #[test]
    fn test_summary_and_margin_lists() {
        let analysis = analyze(vec![
            row(1, "薯片", "零食", 10.0, 10, Some(5.0)),   // 毛利率 0.5
            row(2, "饼干", "零食", 10.0, 2, Some(9.5)),    // 毛利率 0.05
            row(3, "可乐", "饮料", 4.0, 10, Some(3.0)),    // 毛利率 0.25
        ])
        .unwrap();

        assert_eq!(analysis.summary[0].category, ALL_CATEGORIES_LABEL);
        assert!((analysis.summary[0].gross_profit - (50.0 + 1.0 + 10.0)).abs() < 1e-9);
        assert_eq!(analysis.summary[0].profit_contribution, 1.0);
        assert_eq!(analysis.summary.len(), 3);

        let contribution: f64 = analysis.summary[1..].iter().map(|r| r.profit_contribution).sum();
        assert!((contribution - 1.0).abs() < 1e-9);

        assert_eq!(analysis.high_margin.len(), 1);
        assert_eq!(analysis.high_margin[0].product_name, "薯片");
        assert_eq!(analysis.low_margin.len(), 1);
        assert_eq!(analysis.low_margin[0].product_name, "饼干");
    }
}
