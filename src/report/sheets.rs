// ==========================================
// O2O 门店商品分析 - 报表工作表构建
// ==========================================
// 职责: 把各门店分析结果展开为工作表（表头为中文业务名）
// 红线: 不做文件 I/O；门店顺序与传入顺序一致
// ==========================================

use crate::domain::types::{CategoryLevel, MultiSpecTrigger};
use crate::domain::RawRow;
use crate::engine::kpi::{BreakdownRow, CategoryAggregate, CostSummaryRow};
use crate::engine::StoreRun;
use crate::report::table::{headers, CellValue, SheetTable};

// ==========================================
// 工作表名称
// ==========================================
pub const SHEET_CORE_KPI: &str = "核心指标对比";
pub const SHEET_ROLE: &str = "商品角色分析";
pub const SHEET_PRICE_BAND: &str = "价格带分析";
pub const SHEET_CATEGORY_L1: &str = "美团一级分类详细指标";
pub const SHEET_CATEGORY_L3: &str = "美团三级分类详细指标";
pub const SHEET_SKU_DETAIL: &str = "详细SKU报告(去重后)";
pub const SHEET_MULTI_SPEC: &str = "多规格商品报告(全)";
pub const SHEET_UNIQUE_MULTI_SPEC: &str = "唯一多规格商品列表";
pub const SHEET_SKU_STRUCTURE: &str = "SKU结构概览";
pub const SHEET_CONSISTENCY: &str = "数据一致性校验";
pub const SHEET_COST_SUMMARY: &str = "成本分析汇总";
pub const SHEET_HIGH_MARGIN: &str = "高毛利商品TOP50";
pub const SHEET_LOW_MARGIN: &str = "低毛利预警商品";

/// 构建整本工作簿的全部工作表
///
/// 成本相关工作表仅在至少一个门店有成本数据时输出；
/// 三级分类工作表仅在至少一个门店有三级分类数据时输出
pub fn build_workbook_tables(runs: &[&StoreRun]) -> Vec<SheetTable> {
    let has_cost = runs.iter().any(|r| r.analysis.cost.is_some());
    let has_l3 = runs.iter().any(|r| r.analysis.category_l3.is_some());

    let mut sheets = vec![
        core_kpi_sheet(runs, has_cost),
        breakdown_sheet(SHEET_ROLE, "商品角色", runs, |r| &r.analysis.role_analysis),
        breakdown_sheet(SHEET_PRICE_BAND, "价格带", runs, |r| &r.analysis.price_band_analysis),
        category_sheet(CategoryLevel::L1, runs, has_cost),
    ];
    if has_l3 {
        sheets.push(category_sheet(CategoryLevel::L3, runs, has_cost));
    }
    sheets.push(sku_detail_sheet(runs, has_cost));
    sheets.push(multi_spec_sheet(runs));
    sheets.push(unique_multi_spec_sheet(runs));
    sheets.push(sku_structure_sheet(runs));
    sheets.push(consistency_sheet(runs));

    if has_cost {
        sheets.push(cost_summary_sheet(runs));
        let high = margin_list_sheet(SHEET_HIGH_MARGIN, runs, |r| {
            r.analysis.cost.as_ref().map(|c| c.high_margin.as_slice())
        });
        let low = margin_list_sheet(SHEET_LOW_MARGIN, runs, |r| {
            r.analysis.cost.as_ref().map(|c| c.low_margin.as_slice())
        });
        sheets.extend([high, low].into_iter().filter(|s| !s.rows.is_empty()));
    }

    sheets
}

fn triggers_text(triggers: &[MultiSpecTrigger]) -> String {
    triggers
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join("+")
}

// ==========================================
// 核心指标对比
// ==========================================
fn core_kpi_sheet(runs: &[&StoreRun], has_cost: bool) -> SheetTable {
    let mut cols = headers(&[
        "门店",
        "总SKU数(含规格)",
        "单规格SPU数",
        "单规格SKU数",
        "多规格SPU数",
        "多规格SKU总数",
        "唯一多规格商品数",
        "总SKU数(去重后)",
        "动销SKU数",
        "滞销SKU数",
        "动销率",
        "滞销率",
        "总销售额(去重后)",
        "原价销售额(去重后)",
        "动销商品平均售价",
        "活动SKU数",
        "活动SKU占比",
        "折扣SKU数",
        "爆品SKU数",
        "0库存SKU数",
        "跨分类商品数",
    ]);
    if has_cost {
        cols.extend(headers(&["成本销售额", "毛利", "售价毛利率"]));
    }

    let mut sheet = SheetTable::new(SHEET_CORE_KPI, cols);
    for run in runs {
        let k = &run.analysis.kpi;
        let mut row = vec![
            CellValue::text(&k.store),
            CellValue::count(k.total_sku_with_specs),
            CellValue::count(k.single_spec_spu),
            CellValue::count(k.single_spec_sku),
            CellValue::count(k.multi_spec_spu),
            CellValue::count(k.multi_spec_sku_total),
            CellValue::count(k.unique_multi_spec_products),
            CellValue::count(k.dedup_sku),
            CellValue::count(k.active_sku),
            CellValue::count(k.inactive_sku),
            CellValue::Float(k.active_rate),
            CellValue::Float(k.inactive_rate),
            CellValue::Float(k.dedup_revenue),
            CellValue::Float(k.dedup_original_revenue),
            CellValue::Float(k.avg_active_price),
            CellValue::count(k.activity_sku),
            CellValue::Float(k.activity_rate),
            CellValue::count(k.discounted_sku),
            CellValue::count(k.hot_sku),
            CellValue::count(k.zero_stock_sku),
            CellValue::count(k.cross_category_products),
        ];
        if has_cost {
            match &k.cost {
                Some(c) => row.extend([
                    CellValue::Float(c.cost_revenue),
                    CellValue::Float(c.gross_profit),
                    CellValue::Float(c.sale_margin_rate),
                ]),
                None => row.extend([CellValue::Empty, CellValue::Empty, CellValue::Empty]),
            }
        }
        sheet.push(row);
    }
    sheet
}

// ==========================================
// 商品角色 / 价格带
// ==========================================
fn breakdown_sheet<F>(name: &str, label_header: &str, runs: &[&StoreRun], pick: F) -> SheetTable
where
    F: Fn(&StoreRun) -> &Vec<BreakdownRow>,
{
    let mut sheet = SheetTable::new(
        name,
        headers(&["门店", label_header, "SKU数量", "销售额", "销售额占比", "SKU占比"]),
    );
    for run in runs {
        for b in pick(run) {
            sheet.push(vec![
                CellValue::text(&run.store),
                CellValue::text(&b.label),
                CellValue::count(b.sku_count),
                CellValue::Float(b.revenue),
                CellValue::Float(b.revenue_share),
                CellValue::Float(b.sku_share),
            ]);
        }
    }
    sheet
}

// ==========================================
// 分类详细指标
// ==========================================

/// 分类详细指标的列顺序
///
/// 带前缀的列名形如 "美团一级分类sku数"；月售、销售额等列不带前缀
pub fn category_headers(level: CategoryLevel, has_cost: bool) -> Vec<String> {
    let p = level.column_prefix();
    let mut cols: Vec<String> = vec!["门店".to_string(), p.to_string()];
    let prefixed = |s: &str| format!("{}{}", p, s);

    cols.extend(
        [
            "sku数",
            "多规格SKU数",
            "多规格SPU数",
            "去重SKU数(口径同动销率)",
            "动销sku数",
            "动销率(类内)",
            "动销SKU占比(跨类)",
            "活动去重SKU数(口径同占比)",
            "活动sku数",
            "活动SKU占比(类内)",
            "活动SKU占比(跨类)",
            "0库存数",
            "0库存率",
            "sku占比",
        ]
        .iter()
        .map(|s| prefixed(s)),
    );
    cols.push("月售".to_string());
    cols.push(prefixed("月售占比"));
    cols.push("原价销售额".to_string());
    cols.push("售价销售额".to_string());
    if has_cost {
        cols.extend(headers(&["成本销售额", "毛利", "定价毛利"]));
    }
    cols.push(prefixed("原价销售额占比"));
    cols.push(prefixed("售价销售额占比"));
    if has_cost {
        cols.push(prefixed("售价毛利率"));
        cols.push(prefixed("定价毛利率"));
        cols.push(prefixed("毛利贡献度"));
    }
    cols.push(prefixed("原价销售件单价"));
    cols.push(prefixed("折扣sku数"));
    cols.push(prefixed("爆品sku数"));
    cols.push(prefixed("折扣"));
    cols
}

fn category_row(store: &str, c: &CategoryAggregate, has_cost: bool) -> Vec<CellValue> {
    let mut row = vec![
        CellValue::text(store),
        CellValue::text(&c.category),
        CellValue::count(c.sku_count),
        CellValue::count(c.multi_spec_sku),
        CellValue::count(c.multi_spec_spu),
        CellValue::count(c.dedup_sku),
        CellValue::count(c.active_sku),
        CellValue::Float(c.active_rate),
        CellValue::Float(c.active_share),
        CellValue::count(c.dedup_sku),
        CellValue::count(c.activity_sku),
        CellValue::Float(c.activity_rate),
        CellValue::Float(c.activity_share),
        CellValue::count(c.zero_stock_sku),
        CellValue::Float(c.zero_stock_rate),
        CellValue::Float(c.sku_share),
        CellValue::Int(c.monthly_sales as i64),
        CellValue::Float(c.monthly_sales_share),
        CellValue::Float(c.original_revenue),
        CellValue::Float(c.revenue),
    ];
    if has_cost {
        match &c.cost {
            Some(cost) => row.extend([
                CellValue::Float(cost.cost_revenue),
                CellValue::Float(cost.gross_profit),
                CellValue::Float(cost.list_gross_profit),
            ]),
            None => row.extend([CellValue::Empty, CellValue::Empty, CellValue::Empty]),
        }
    }
    row.push(CellValue::Float(c.original_revenue_share));
    row.push(CellValue::Float(c.revenue_share));
    if has_cost {
        match &c.cost {
            Some(cost) => row.extend([
                CellValue::Float(cost.sale_margin_rate),
                CellValue::Float(cost.list_margin_rate),
                CellValue::Float(cost.profit_contribution),
            ]),
            None => row.extend([CellValue::Empty, CellValue::Empty, CellValue::Empty]),
        }
    }
    row.push(CellValue::Float(c.original_unit_price));
    row.push(CellValue::count(c.discounted_sku));
    row.push(CellValue::count(c.hot_sku));
    row.push(CellValue::Float(c.discount_zhe));
    row
}

fn category_sheet(level: CategoryLevel, runs: &[&StoreRun], has_cost: bool) -> SheetTable {
    let name = match level {
        CategoryLevel::L1 => SHEET_CATEGORY_L1,
        CategoryLevel::L3 => SHEET_CATEGORY_L3,
    };
    let mut sheet = SheetTable::new(name, category_headers(level, has_cost));
    for run in runs {
        let aggregates = match level {
            CategoryLevel::L1 => Some(&run.analysis.category_l1),
            CategoryLevel::L3 => run.analysis.category_l3.as_ref(),
        };
        for c in aggregates.into_iter().flatten() {
            sheet.push(category_row(&run.store, c, has_cost));
        }
    }
    sheet
}

// ==========================================
// 详细SKU报告(去重后)
// ==========================================
fn sku_detail_sheet(runs: &[&StoreRun], has_cost: bool) -> SheetTable {
    let mut cols = headers(&[
        "门店",
        "商品名称",
        "美团一级分类",
        "美团三级分类",
        "商家分类",
        "规格名称",
        "条码",
        "店内码",
        "售价",
        "原价",
        "月售",
        "库存",
        "售价销售额",
        "原价销售额",
        "折扣力度",
        "价格带",
        "商品角色",
        "消费场景",
    ]);
    if has_cost {
        cols.extend(headers(&[
            "成本",
            "毛利",
            "售价毛利率",
            "定价毛利率",
            "售价倍率",
            "加价率",
        ]));
    }

    let mut sheet = SheetTable::new(SHEET_SKU_DETAIL, cols);
    for run in runs {
        for r in &run.datasets.deduplicated {
            let mut row = vec![
                CellValue::text(&r.store),
                CellValue::text(&r.product_name),
                CellValue::text(&r.category_l1),
                CellValue::opt_text(r.category_l3.as_deref()),
                CellValue::opt_text(r.merchant_category.as_deref()),
                CellValue::opt_text(r.spec_name.as_deref()),
                CellValue::opt_text(r.barcode.as_deref()),
                CellValue::opt_text(r.store_code.as_deref()),
                CellValue::Float(r.price),
                CellValue::Float(r.original_price),
                CellValue::Int(r.sales_qty as i64),
                CellValue::Int(r.stock as i64),
                CellValue::Float(r.revenue),
                CellValue::Float(r.original_price_revenue),
                CellValue::Float(r.discount),
                CellValue::text(r.price_band.label()),
                CellValue::text(r.role.label()),
                CellValue::text(r.scenarios.join("、")),
            ];
            if has_cost {
                row.extend([
                    CellValue::opt_float(r.cost),
                    CellValue::opt_float(r.gross_profit()),
                    CellValue::opt_float(r.sale_margin_rate()),
                    CellValue::opt_float(r.list_margin_rate()),
                    CellValue::opt_float(r.price_multiple()),
                    CellValue::opt_float(r.markup_rate()),
                ]);
            }
            sheet.push(row);
        }
    }
    sheet
}

// ==========================================
// 多规格商品报告(全) / 唯一多规格商品列表
// ==========================================
fn multi_spec_sheet(runs: &[&StoreRun]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SHEET_MULTI_SPEC,
        headers(&[
            "门店",
            "商品名称",
            "基础名称",
            "美团一级分类",
            "美团三级分类",
            "规格名称",
            "推断规格",
            "规格键",
            "条码",
            "售价",
            "原价",
            "月售",
            "库存",
            "售价销售额",
            "规格种类数",
            "多规格依据",
        ]),
    );
    for run in runs {
        for rec in &run.resolution.records {
            let r = &run.datasets.all_rows[rec.row_index];
            sheet.push(vec![
                CellValue::text(&r.store),
                CellValue::text(&r.product_name),
                CellValue::text(&rec.base_name),
                CellValue::text(&r.category_l1),
                CellValue::opt_text(r.category_l3.as_deref()),
                CellValue::opt_text(r.spec_name.as_deref()),
                CellValue::text(&rec.inferred_spec),
                CellValue::opt_text(rec.variant_key.as_deref()),
                CellValue::opt_text(r.barcode.as_deref()),
                CellValue::Float(r.price),
                CellValue::Float(r.original_price),
                CellValue::Int(r.sales_qty as i64),
                CellValue::Int(r.stock as i64),
                CellValue::Float(r.revenue),
                CellValue::count(rec.variant_count),
                CellValue::text(triggers_text(&rec.triggers)),
            ]);
        }
    }
    sheet
}

fn unique_multi_spec_sheet(runs: &[&StoreRun]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SHEET_UNIQUE_MULTI_SPEC,
        headers(&[
            "门店",
            "商品名称",
            "基础名称",
            "美团一级分类",
            "代表规格",
            "售价",
            "原价",
            "月售",
            "库存合计",
            "规格数",
            "多规格依据",
        ]),
    );
    for run in runs {
        for p in &run.analysis.unique_multi_spec {
            let r = &run.datasets.all_rows[p.row_index];
            let rep_key = run.resolution.variant_keys[p.row_index].as_deref();
            sheet.push(vec![
                CellValue::text(&run.store),
                CellValue::text(&p.product_name),
                CellValue::text(&p.base_name),
                CellValue::text(&r.category_l1),
                CellValue::opt_text(rep_key),
                CellValue::Float(r.price),
                CellValue::Float(r.original_price),
                CellValue::Int(r.sales_qty as i64),
                CellValue::Int(p.total_stock as i64),
                CellValue::count(p.variant_count),
                CellValue::text(triggers_text(&p.triggers)),
            ]);
        }
    }
    sheet
}

// ==========================================
// SKU结构概览 / 数据一致性校验
// ==========================================
fn sku_structure_sheet(runs: &[&StoreRun]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SHEET_SKU_STRUCTURE,
        headers(&["门店", "基础名称", "美团一级分类", "结构类型", "变体数", "规格示例"]),
    );
    for run in runs {
        for s in &run.analysis.sku_structure {
            sheet.push(vec![
                CellValue::text(&run.store),
                CellValue::text(&s.base_name),
                CellValue::text(&s.category_l1),
                CellValue::text(s.structure_type()),
                CellValue::count(s.variant_count),
                CellValue::text(s.examples.join("、")),
            ]);
        }
    }
    sheet
}

fn consistency_sheet(runs: &[&StoreRun]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SHEET_CONSISTENCY,
        headers(&["门店", "校验项", "期望值", "实际值", "差异", "容差", "是否通过"]),
    );
    for run in runs {
        for c in &run.analysis.checks {
            sheet.push(vec![
                CellValue::text(&c.store),
                CellValue::text(&c.name),
                CellValue::Float(c.expected),
                CellValue::Float(c.actual),
                CellValue::Float(c.difference()),
                CellValue::Float(c.tolerance),
                CellValue::text(if c.passed { "通过" } else { "不通过" }),
            ]);
        }
    }
    sheet
}

// ==========================================
// 成本分析
// ==========================================
fn cost_summary_sheet(runs: &[&StoreRun]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SHEET_COST_SUMMARY,
        headers(&[
            "门店",
            "美团一级分类",
            "成本销售额",
            "售价销售额",
            "原价销售额",
            "毛利",
            "定价毛利",
            "美团一级分类售价毛利率",
            "美团一级分类定价毛利率",
            "美团一级分类毛利贡献度",
        ]),
    );
    for run in runs {
        let Some(cost) = &run.analysis.cost else {
            continue;
        };
        for s in &cost.summary {
            sheet.push(cost_summary_row(&run.store, s));
        }
    }
    sheet
}

fn cost_summary_row(store: &str, s: &CostSummaryRow) -> Vec<CellValue> {
    vec![
        CellValue::text(store),
        CellValue::text(&s.category),
        CellValue::Float(s.cost_revenue),
        CellValue::Float(s.revenue),
        CellValue::Float(s.original_revenue),
        CellValue::Float(s.gross_profit),
        CellValue::Float(s.list_gross_profit),
        CellValue::Float(s.sale_margin_rate),
        CellValue::Float(s.list_margin_rate),
        CellValue::Float(s.profit_contribution),
    ]
}

fn margin_list_sheet<F>(name: &str, runs: &[&StoreRun], pick: F) -> SheetTable
where
    F: Fn(&StoreRun) -> Option<&[RawRow]>,
{
    let mut sheet = SheetTable::new(
        name,
        headers(&[
            "门店",
            "商品名称",
            "美团一级分类",
            "售价",
            "原价",
            "成本",
            "毛利",
            "售价毛利率",
            "定价毛利率",
            "月售",
            "售价销售额",
            "成本销售额",
        ]),
    );
    for run in runs {
        for r in pick(run).unwrap_or_default() {
            sheet.push(vec![
                CellValue::text(&r.store),
                CellValue::text(&r.product_name),
                CellValue::text(&r.category_l1),
                CellValue::Float(r.price),
                CellValue::Float(r.original_price),
                CellValue::opt_float(r.cost),
                CellValue::opt_float(r.gross_profit()),
                CellValue::opt_float(r.sale_margin_rate()),
                CellValue::opt_float(r.list_margin_rate()),
                CellValue::Int(r.sales_qty as i64),
                CellValue::Float(r.revenue),
                CellValue::opt_float(r.cost_revenue()),
            ]);
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_headers_prefix_and_cost_columns() {
        let plain = category_headers(CategoryLevel::L1, false);
        assert_eq!(plain[0], "门店");
        assert_eq!(plain[1], "美团一级分类");
        assert_eq!(plain[2], "美团一级分类sku数");
        assert!(plain.contains(&"月售".to_string()));
        assert!(!plain.contains(&"成本销售额".to_string()));
        assert_eq!(plain.last().map(String::as_str), Some("美团一级分类折扣"));

        let with_cost = category_headers(CategoryLevel::L3, true);
        assert_eq!(with_cost[1], "美团三级分类");
        assert!(with_cost.contains(&"美团三级分类毛利贡献度".to_string()));
        assert_eq!(with_cost.len(), plain.len() + 6);
    }

    #[test]
    fn test_triggers_text() {
        let text = triggers_text(&[MultiSpecTrigger::SpecColumn, MultiSpecTrigger::Barcode]);
        assert_eq!(text, "规格列+条码多值");
    }
}
