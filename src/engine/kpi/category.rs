// ==========================================
// O2O 门店商品分析 - 分类详细指标
// ==========================================
// 职责: 一级/三级分类的 CategoryAggregate
// 口径:
//   sku数 / 多规格 / 0库存      → SKU 单元（跨分类归属到字典序最小分类）
//   去重 / 动销 / 活动 / 折扣 / 爆品 → deduplicated / active
//   月售 / 销售额 / 成本          → 分类内 SPU 代表行 (分类, 基名)
// 红线: Σ 分类动销SKU数 = 门店动销SKU数（一级分类口径）
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::product::{safe_ratio, RawRow};
use crate::domain::types::CategoryLevel;
use crate::engine::dedup::{canonical_order, SkuUnit, StoreDatasets};
use crate::engine::multi_spec::MultiSpecResolution;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// 分类成本指标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCost {
    pub cost_revenue: f64,        // 成本销售额
    pub gross_profit: f64,        // 毛利（售价）
    pub list_gross_profit: f64,   // 定价毛利（原价）
    pub sale_margin_rate: f64,    // 售价毛利率
    pub list_margin_rate: f64,    // 定价毛利率
    pub profit_contribution: f64, // 毛利贡献度
}

// ==========================================
// CategoryAggregate - 分类汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,

    // ===== SKU 单元口径 =====
    pub sku_count: usize,
    pub multi_spec_sku: usize,
    pub multi_spec_spu: usize,
    pub zero_stock_sku: usize,
    pub zero_stock_rate: f64,
    pub sku_share: f64,

    // ===== 去重口径 =====
    pub dedup_sku: usize,
    pub active_sku: usize,
    pub active_rate: f64,      // 类内
    pub active_share: f64,     // 跨类
    pub activity_sku: usize,
    pub activity_rate: f64,    // 类内
    pub activity_share: f64,   // 跨类
    pub discounted_sku: usize,
    pub hot_sku: usize,

    // ===== SPU 口径 =====
    pub monthly_sales: u64,
    pub monthly_sales_share: f64,
    pub original_revenue: f64,
    pub revenue: f64,
    pub original_revenue_share: f64,
    pub revenue_share: f64,
    pub original_unit_price: f64, // 原价销售件单价
    pub discount_zhe: f64,        // 折扣（折，0~10）

    pub cost: Option<CategoryCost>,
}

#[derive(Default)]
struct Accumulator<'a> {
    sku_count: usize,
    multi_spec_sku: usize,
    multi_spec_bases: HashSet<&'a str>,
    zero_stock_sku: usize,
    dedup_sku: usize,
    active_sku: usize,
    activity_sku: usize,
    discounted_sku: usize,
    hot_sku: usize,
    monthly_sales: u64,
    original_revenue: f64,
    revenue: f64,
    cost_revenue: f64,
    gross_profit: f64,
    list_gross_profit: f64,
}

fn row_category(row: &RawRow, level: CategoryLevel) -> Option<&str> {
    match level {
        CategoryLevel::L1 => Some(row.category_l1.as_str()),
        CategoryLevel::L3 => row.category_l3.as_deref(),
    }
}

fn unit_category(unit: &SkuUnit, level: CategoryLevel) -> Option<&str> {
    match level {
        CategoryLevel::L1 => Some(unit.category_l1.as_str()),
        CategoryLevel::L3 => unit.category_l3.as_deref(),
    }
}

/// 是否存在三级分类数据
pub fn has_level_data(rows: &[RawRow], level: CategoryLevel) -> bool {
    rows.iter().any(|r| row_category(r, level).is_some())
}

/// 计算分类详细指标
///
/// # 参数
/// - datasets: 三套数据集
/// - resolution: 多规格识别结果（提供基名）
/// - units: SKU 单元
/// - level: 一级 / 三级分类
/// - config: 活动/爆品阈值
///
/// # 返回
/// - 按分类名排序的汇总行；三级分类缺失值的行不参与
pub fn compute_category_detail(
    datasets: &StoreDatasets,
    resolution: &MultiSpecResolution,
    units: &[SkuUnit],
    level: CategoryLevel,
    config: &AnalysisConfig,
) -> Vec<CategoryAggregate> {
    let rows = &datasets.all_rows;
    let mut acc: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for row in rows {
        if let Some(c) = row_category(row, level) {
            acc.entry(c).or_default();
        }
    }

    // ===== SKU 单元口径 =====
    for unit in units {
        if let Some(a) = unit_category(unit, level).and_then(|c| acc.get_mut(c)) {
            a.sku_count += 1;
            if unit.is_multi_spec {
                a.multi_spec_sku += 1;
                a.multi_spec_bases.insert(unit.base_name.as_str());
            }
            if unit.stock == 0 {
                a.zero_stock_sku += 1;
            }
        }
    }

    // ===== 去重口径 =====
    for row in &datasets.deduplicated {
        if let Some(a) = row_category(row, level).and_then(|c| acc.get_mut(c)) {
            a.dedup_sku += 1;
            if row.is_active() {
                a.active_sku += 1;
            }
            if row.discount >= config.activity_discount_threshold {
                a.activity_sku += 1;
            }
            if row.discount > 0.0 {
                a.discounted_sku += 1;
            }
            if row.discount >= config.hot_discount_threshold {
                a.hot_sku += 1;
            }
        }
    }

    // ===== SPU 口径：每个 (分类, 基名) 取规范排序第一行 =====
    let mut indices: Vec<usize> = (0..rows.len())
        .filter(|i| row_category(&rows[*i], level).is_some())
        .collect();
    indices.sort_by(|a, b| canonical_order(&rows[*a], &rows[*b]));

    let mut seen_spu: HashSet<(&str, &str)> = HashSet::new();
    let mut raw_monthly_sales: u64 = 0;
    for idx in indices {
        let row = &rows[idx];
        raw_monthly_sales += row.sales_qty;
        let Some(category) = row_category(row, level) else {
            continue;
        };
        if !seen_spu.insert((category, resolution.signals[idx].base_name.as_str())) {
            continue;
        }
        if let Some(a) = acc.get_mut(category) {
            a.monthly_sales += row.sales_qty;
            a.original_revenue += row.original_price_revenue;
            a.revenue += row.revenue;
            a.cost_revenue += row.cost_revenue().unwrap_or(0.0);
            a.gross_profit += row.gross_profit().unwrap_or(0.0);
            a.list_gross_profit += row.list_gross_profit().unwrap_or(0.0);
        }
    }

    // ===== 跨类分母 =====
    let total_units: usize = acc.values().map(|a| a.sku_count).sum();
    let total_active: usize = acc.values().map(|a| a.active_sku).sum();
    let total_activity: usize = acc.values().map(|a| a.activity_sku).sum();
    let total_monthly: u64 = acc.values().map(|a| a.monthly_sales).sum();
    let total_original_revenue: f64 = acc.values().map(|a| a.original_revenue).sum();
    let total_revenue: f64 = acc.values().map(|a| a.revenue).sum();
    let total_profit: f64 = acc.values().map(|a| a.gross_profit).sum();
    let has_cost = rows.iter().any(|r| r.cost.is_some());

    debug!(
        level = %level,
        raw_monthly_sales,
        spu_monthly_sales = total_monthly,
        "月售口径对比"
    );

    let result: Vec<CategoryAggregate> = acc
        .into_iter()
        .map(|(category, a)| CategoryAggregate {
            category: category.to_string(),
            sku_count: a.sku_count,
            multi_spec_sku: a.multi_spec_sku,
            multi_spec_spu: a.multi_spec_bases.len(),
            zero_stock_sku: a.zero_stock_sku,
            zero_stock_rate: safe_ratio(a.zero_stock_sku as f64, a.sku_count as f64),
            sku_share: safe_ratio(a.sku_count as f64, total_units as f64),
            dedup_sku: a.dedup_sku,
            active_sku: a.active_sku,
            active_rate: safe_ratio(a.active_sku as f64, a.dedup_sku as f64),
            active_share: safe_ratio(a.active_sku as f64, total_active as f64),
            activity_sku: a.activity_sku,
            activity_rate: safe_ratio(a.activity_sku as f64, a.dedup_sku as f64),
            activity_share: safe_ratio(a.activity_sku as f64, total_activity as f64),
            discounted_sku: a.discounted_sku,
            hot_sku: a.hot_sku,
            monthly_sales: a.monthly_sales,
            monthly_sales_share: safe_ratio(a.monthly_sales as f64, total_monthly as f64),
            original_revenue: a.original_revenue,
            revenue: a.revenue,
            original_revenue_share: safe_ratio(a.original_revenue, total_original_revenue),
            revenue_share: safe_ratio(a.revenue, total_revenue),
            original_unit_price: safe_ratio(a.original_revenue, a.monthly_sales as f64),
            discount_zhe: (safe_ratio(a.revenue, a.original_revenue) * 10.0).clamp(0.0, 10.0),
            cost: has_cost.then(|| CategoryCost {
                cost_revenue: a.cost_revenue,
                gross_profit: a.gross_profit,
                list_gross_profit: a.list_gross_profit,
                sale_margin_rate: safe_ratio(a.gross_profit, a.revenue),
                list_margin_rate: safe_ratio(a.list_gross_profit, a.original_revenue),
                profit_contribution: if total_profit > 0.0 {
                    a.gross_profit / total_profit
                } else {
                    0.0
                },
            }),
        })
        .collect();

    info!(level = %level, categories = result.len(), "分类指标计算完成");
    result
}

/// 分类集合（用于测试与校验）
pub fn category_names(aggregates: &[CategoryAggregate]) -> BTreeSet<&str> {
    aggregates.iter().map(|a| a.category.as_str()).collect()
}
