// ==========================================
// O2O 门店商品分析 - 门店级指标
// ==========================================
// 职责: 核心指标 (StoreKpi) + 商品角色分析 + 价格带分析
// 口径:
//   总SKU数(含规格) = SKU 单元数 (门店, 商品名, 规格键)
//   总SKU数(去重后) / 动销 / 滞销 = deduplicated / active
//   角色与价格带只统计动销商品
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::product::{safe_ratio, RawRow};
use crate::domain::types::{PriceBand, ProductRole};
use crate::engine::dedup::{SkuUnit, StoreDatasets};
use crate::engine::multi_spec::MultiSpecResolution;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// 门店成本汇总（去重商品中含成本的部分）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCostKpi {
    pub cost_revenue: f64,
    pub gross_profit: f64,
    pub sale_margin_rate: f64,
}

// ==========================================
// StoreKpi - 门店核心指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreKpi {
    pub store: String,

    // ===== SKU 结构 =====
    pub total_sku_with_specs: usize,     // 总SKU数(含规格)
    pub single_spec_spu: usize,          // 单规格SPU数
    pub single_spec_sku: usize,          // 单规格SKU数
    pub multi_spec_spu: usize,           // 多规格SPU数
    pub multi_spec_sku_total: usize,     // 多规格SKU总数
    pub unique_multi_spec_products: usize, // 唯一多规格商品数

    // ===== 动销 =====
    pub dedup_sku: usize,                // 总SKU数(去重后)
    pub active_sku: usize,               // 动销SKU数
    pub inactive_sku: usize,             // 滞销SKU数
    pub active_rate: f64,                // 动销率
    pub inactive_rate: f64,              // 滞销率

    // ===== 销售额 =====
    pub dedup_revenue: f64,              // 总销售额(去重后)
    pub dedup_original_revenue: f64,     // 原价销售额(去重后)
    pub avg_active_price: f64,           // 动销商品平均售价

    // ===== 活动 / 库存 =====
    pub activity_sku: usize,             // 活动SKU数
    pub activity_rate: f64,              // 活动SKU占比
    pub discounted_sku: usize,           // 折扣SKU数
    pub hot_sku: usize,                  // 爆品SKU数
    pub zero_stock_sku: usize,           // 0库存SKU数
    pub cross_category_products: usize,  // 跨分类商品数

    pub cost: Option<StoreCostKpi>,
}

/// 计算门店核心指标
///
/// # 参数
/// - datasets: 三套数据集
/// - resolution: 多规格识别结果
/// - units: SKU 单元
/// - config: 活动/爆品阈值
pub fn compute_store_kpi(
    datasets: &StoreDatasets,
    resolution: &MultiSpecResolution,
    units: &[SkuUnit],
    config: &AnalysisConfig,
) -> StoreKpi {
    let total_sku_with_specs = units.len();
    let multi_spec_sku_total = resolution.multi_spec_sku_total();
    let single_spec_sku = units.iter().filter(|u| !u.is_multi_spec).count();

    let unique_multi_spec_products = resolution
        .records
        .iter()
        .map(|r| datasets.all_rows[r.row_index].product_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    let dedup_sku = datasets.deduplicated.len();
    let active_sku = datasets.active.len();
    let inactive_sku = dedup_sku - active_sku;

    let dedup_revenue: f64 = datasets.deduplicated.iter().map(|r| r.revenue).sum();
    let dedup_original_revenue: f64 = datasets
        .deduplicated
        .iter()
        .map(|r| r.original_price_revenue)
        .sum();
    let avg_active_price = safe_ratio(
        datasets.active.iter().map(|r| r.price).sum(),
        active_sku as f64,
    );

    let activity_sku = datasets
        .deduplicated
        .iter()
        .filter(|r| r.discount >= config.activity_discount_threshold)
        .count();
    let discounted_sku = datasets.deduplicated.iter().filter(|r| r.discount > 0.0).count();
    let hot_sku = datasets
        .deduplicated
        .iter()
        .filter(|r| r.discount >= config.hot_discount_threshold)
        .count();

    let kpi = StoreKpi {
        store: datasets.store.clone(),
        total_sku_with_specs,
        single_spec_spu: dedup_sku.saturating_sub(unique_multi_spec_products),
        single_spec_sku,
        multi_spec_spu: resolution.multi_spec_spu_count(),
        multi_spec_sku_total,
        unique_multi_spec_products,
        dedup_sku,
        active_sku,
        inactive_sku,
        active_rate: safe_ratio(active_sku as f64, dedup_sku as f64),
        inactive_rate: safe_ratio(inactive_sku as f64, dedup_sku as f64),
        dedup_revenue,
        dedup_original_revenue,
        avg_active_price,
        activity_sku,
        activity_rate: safe_ratio(activity_sku as f64, dedup_sku as f64),
        discounted_sku,
        hot_sku,
        zero_stock_sku: units.iter().filter(|u| u.stock == 0).count(),
        cross_category_products: count_cross_category_products(&datasets.all_rows),
        cost: store_cost(&datasets.deduplicated),
    };

    info!(
        store = %kpi.store,
        total_sku_with_specs = kpi.total_sku_with_specs,
        dedup_sku = kpi.dedup_sku,
        active_sku = kpi.active_sku,
        inactive_sku = kpi.inactive_sku,
        single_spec_sku = kpi.single_spec_sku,
        multi_spec_sku_total = kpi.multi_spec_sku_total,
        unique_multi_spec_products = kpi.unique_multi_spec_products,
        dedup_revenue = kpi.dedup_revenue,
        active_rate = kpi.active_rate,
        "KPI 汇总"
    );

    kpi
}

/// 跨分类商品数：同一商品名出现在多个一级分类
fn count_cross_category_products(rows: &[RawRow]) -> usize {
    let mut categories: HashMap<(&str, &str), BTreeSet<&str>> = HashMap::new();
    for row in rows {
        categories
            .entry((row.store.as_str(), row.product_name.as_str()))
            .or_default()
            .insert(row.category_l1.as_str());
    }
    categories.values().filter(|c| c.len() > 1).count()
}

fn store_cost(deduplicated: &[RawRow]) -> Option<StoreCostKpi> {
    let with_cost: Vec<&RawRow> = deduplicated.iter().filter(|r| r.cost.is_some()).collect();
    if with_cost.is_empty() {
        return None;
    }
    let revenue: f64 = with_cost.iter().map(|r| r.revenue).sum();
    let cost_revenue: f64 = with_cost.iter().filter_map(|r| r.cost_revenue()).sum();
    let gross_profit = revenue - cost_revenue;
    Some(StoreCostKpi {
        cost_revenue,
        gross_profit,
        sale_margin_rate: safe_ratio(gross_profit, revenue),
    })
}

// ==========================================
// 角色 / 价格带分析
// ==========================================

/// 分组分析的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub sku_count: usize,
    pub revenue: f64,
    pub revenue_share: f64,
    pub sku_share: f64,
}

fn breakdown<K, F>(active: &[RawRow], order: &[K], label: impl Fn(&K) -> String, key_of: F) -> Vec<BreakdownRow>
where
    K: Eq + std::hash::Hash + Copy,
    F: Fn(&RawRow) -> K,
{
    let mut groups: HashMap<K, (usize, f64)> = HashMap::new();
    for row in active {
        let entry = groups.entry(key_of(row)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += row.revenue;
    }

    let total_revenue: f64 = active.iter().map(|r| r.revenue).sum();
    let total_sku = active.len() as f64;

    // 只输出实际出现的分组，按固定顺序
    order
        .iter()
        .filter_map(|k| {
            groups.get(k).map(|(count, revenue)| BreakdownRow {
                label: label(k),
                sku_count: *count,
                revenue: *revenue,
                revenue_share: safe_ratio(*revenue, total_revenue),
                sku_share: safe_ratio(*count as f64, total_sku),
            })
        })
        .collect()
}

/// 商品角色分析（动销商品）
pub fn compute_role_analysis(active: &[RawRow]) -> Vec<BreakdownRow> {
    breakdown(active, &ProductRole::ALL, |r| r.label().to_string(), |row| row.role)
}

/// 价格带分析（动销商品）
pub fn compute_price_band_analysis(active: &[RawRow]) -> Vec<BreakdownRow> {
    breakdown(active, &PriceBand::ALL, |b| b.label().to_string(), |row| row.price_band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::RowFields;
    use crate::engine::dedup::{build_datasets, build_sku_units};
    use crate::engine::multi_spec::resolve_multi_spec;

    fn row(n: usize, name: &str, category: &str, price: f64, original: f64, qty: u64, stock: u64) -> RawRow {
        RawRow::from_fields(
            RowFields {
                store: "门店A".to_string(),
                row_number: n,
                product_name: name.to_string(),
                category_l1: category.to_string(),
                price,
                original_price: original,
                sales_qty: qty,
                stock,
                ..Default::default()
            },
            &[],
        )
    }

    fn sample() -> Vec<RawRow> {
        vec![
            row(1, "可乐(300ml)", "饮料", 3.0, 3.0, 20, 5),
            row(2, "可乐(500ml)", "饮料", 4.0, 5.0, 12, 0),
            row(3, "矿泉水", "饮料", 2.0, 2.0, 0, 3),
            row(4, "薯片", "零食", 12.0, 20.0, 8, 2),
            row(5, "薯片", "零食", 12.0, 20.0, 2, 2),
            row(6, "红酒", "酒水", 128.0, 128.0, 1, 0),
        ]
    }

    #[test]
    fn test_store_kpi_partition_and_counts() {
        let ds = build_datasets(sample());
        let res = resolve_multi_spec(&ds.all_rows);
        let units = build_sku_units(&ds.all_rows, &res);

        let kpi = compute_store_kpi(&ds, &res, &units, &AnalysisConfig::default());

        assert_eq!(kpi.multi_spec_sku_total, 2);
        assert_eq!(kpi.single_spec_sku + kpi.multi_spec_sku_total, kpi.total_sku_with_specs);
        assert_eq!(kpi.total_sku_with_specs, 5);
        assert_eq!(kpi.dedup_sku, 5);
        assert_eq!(kpi.active_sku, 4);
        assert_eq!(kpi.inactive_sku, 1);
        assert!((kpi.active_rate - 0.8).abs() < 1e-9);
        assert_eq!(kpi.unique_multi_spec_products, 2);
        assert_eq!(kpi.single_spec_spu, 3);
        assert_eq!(kpi.multi_spec_spu, 1);
        // 可乐500ml 折扣 0.2，薯片 0.4
        assert_eq!(kpi.activity_sku, 2);
        assert_eq!(kpi.hot_sku, 0);
        assert_eq!(kpi.zero_stock_sku, 2);
        assert!(kpi.cost.is_none());
    }

    #[test]
    fn test_role_revenue_foots_to_dedup_revenue() {
        let ds = build_datasets(sample());
        let roles = compute_role_analysis(&ds.active);
        let bands = compute_price_band_analysis(&ds.active);

        let dedup_revenue: f64 = ds.deduplicated.iter().map(|r| r.revenue).sum();
        let role_revenue: f64 = roles.iter().map(|r| r.revenue).sum();
        let band_revenue: f64 = bands.iter().map(|r| r.revenue).sum();
        assert!((role_revenue - dedup_revenue).abs() < 0.01);
        assert!((band_revenue - dedup_revenue).abs() < 0.01);

        let role_skus: usize = roles.iter().map(|r| r.sku_count).sum();
        assert_eq!(role_skus, ds.active.len());
    }

    #[test]
    fn test_role_order_and_labels() {
        let ds = build_datasets(sample());
        let roles = compute_role_analysis(&ds.active);
        let labels: Vec<&str> = roles.iter().map(|r| r.label.as_str()).collect();
        // 可乐 ×2 引流品，薯片 利润品，红酒 形象品
        assert_eq!(labels, vec!["引流品", "利润品", "形象品"]);
        assert_eq!(roles[0].sku_count, 2);
    }

    #[test]
    fn test_empty_active_set() {
        assert!(compute_role_analysis(&[]).is_empty());
        assert!(compute_price_band_analysis(&[]).is_empty());
    }
}
