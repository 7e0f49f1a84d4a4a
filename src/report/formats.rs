// ==========================================
// O2O 门店商品分析 - 报表数字格式
// ==========================================
// 规则:
// 1. 白名单内的工作表按列名指定格式
// 2. 不在白名单的工作表: 浮点列且取值全部落在 [0,1] 视为百分比
//    （列名含"单价"的除外）
// ==========================================

use crate::domain::types::CategoryLevel;
use crate::report::sheets::*;
use crate::report::table::{CellValue, SheetTable};

/// Excel 数字格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Thousands, // 千分位整数
    Integer,   // 整数
    Currency,  // 千分位两位小数
    Decimal,   // 两位小数
    Percent,   // 百分比
    Zhe,       // 折扣（x.x折）
}

impl NumberFormat {
    pub fn code(&self) -> &'static str {
        match self {
            NumberFormat::Thousands => "#,##0",
            NumberFormat::Integer => "0",
            NumberFormat::Currency => "#,##0.00",
            NumberFormat::Decimal => "0.00",
            NumberFormat::Percent => "0.00%",
            NumberFormat::Zhe => "0.0\"折\"",
        }
    }
}

use NumberFormat::*;

fn entries(list: &[(&str, NumberFormat)]) -> Vec<(String, NumberFormat)> {
    list.iter().map(|(h, f)| (h.to_string(), *f)).collect()
}

fn category_whitelist(level: CategoryLevel) -> Vec<(String, NumberFormat)> {
    let p = level.column_prefix();
    let prefixed: &[(&str, NumberFormat)] = &[
        ("sku数", Integer),
        ("多规格SKU数", Integer),
        ("多规格SPU数", Integer),
        ("去重SKU数(口径同动销率)", Integer),
        ("动销sku数", Integer),
        ("动销率(类内)", Percent),
        ("动销SKU占比(跨类)", Percent),
        ("活动去重SKU数(口径同占比)", Integer),
        ("活动sku数", Integer),
        ("活动SKU占比(类内)", Percent),
        ("活动SKU占比(跨类)", Percent),
        ("0库存数", Integer),
        ("0库存率", Percent),
        ("sku占比", Percent),
        ("月售占比", Percent),
        ("原价销售额占比", Percent),
        ("售价销售额占比", Percent),
        ("售价毛利率", Percent),
        ("定价毛利率", Percent),
        ("毛利贡献度", Percent),
        ("原价销售件单价", Decimal),
        ("折扣sku数", Integer),
        ("爆品sku数", Integer),
        ("折扣", Zhe),
    ];
    let mut list: Vec<(String, NumberFormat)> = prefixed
        .iter()
        .map(|(h, f)| (format!("{}{}", p, h), *f))
        .collect();
    list.extend(entries(&[
        ("月售", Thousands),
        ("原价销售额", Currency),
        ("售价销售额", Currency),
        ("成本销售额", Currency),
        ("毛利", Currency),
        ("定价毛利", Currency),
    ]));
    list
}

/// 工作表白名单；None 表示该表走区间探测
fn sheet_whitelist(sheet: &str) -> Option<Vec<(String, NumberFormat)>> {
    let list = match sheet {
        SHEET_CORE_KPI => entries(&[
            ("总SKU数(含规格)", Thousands),
            ("单规格SPU数", Thousands),
            ("单规格SKU数", Thousands),
            ("多规格SPU数", Thousands),
            ("多规格SKU总数", Thousands),
            ("唯一多规格商品数", Thousands),
            ("总SKU数(去重后)", Thousands),
            ("动销SKU数", Thousands),
            ("滞销SKU数", Thousands),
            ("动销率", Percent),
            ("滞销率", Percent),
            ("总销售额(去重后)", Currency),
            ("原价销售额(去重后)", Currency),
            ("动销商品平均售价", Decimal),
            ("活动SKU数", Thousands),
            ("活动SKU占比", Percent),
            ("折扣SKU数", Thousands),
            ("爆品SKU数", Thousands),
            ("0库存SKU数", Thousands),
            ("跨分类商品数", Thousands),
            ("成本销售额", Currency),
            ("毛利", Currency),
            ("售价毛利率", Percent),
        ]),
        SHEET_ROLE | SHEET_PRICE_BAND => entries(&[
            ("SKU数量", Thousands),
            ("销售额", Currency),
            ("销售额占比", Percent),
            ("SKU占比", Percent),
        ]),
        SHEET_CATEGORY_L1 => category_whitelist(CategoryLevel::L1),
        SHEET_CATEGORY_L3 => category_whitelist(CategoryLevel::L3),
        SHEET_SKU_DETAIL => entries(&[
            ("售价", Decimal),
            ("原价", Decimal),
            ("月售", Integer),
            ("库存", Integer),
            ("售价销售额", Currency),
            ("原价销售额", Currency),
            ("折扣力度", Percent),
            ("成本", Decimal),
            ("毛利", Decimal),
            ("售价毛利率", Percent),
            ("定价毛利率", Percent),
            ("售价倍率", Decimal),
            ("加价率", Percent),
        ]),
        SHEET_MULTI_SPEC => entries(&[
            ("售价", Decimal),
            ("原价", Decimal),
            ("月售", Integer),
            ("库存", Integer),
            ("售价销售额", Currency),
            ("规格种类数", Integer),
        ]),
        SHEET_UNIQUE_MULTI_SPEC => entries(&[
            ("售价", Decimal),
            ("原价", Decimal),
            ("月售", Integer),
            ("库存合计", Integer),
            ("规格数", Integer),
        ]),
        SHEET_CONSISTENCY => entries(&[
            ("期望值", Decimal),
            ("实际值", Decimal),
            ("差异", Decimal),
            ("容差", Decimal),
        ]),
        SHEET_COST_SUMMARY => entries(&[
            ("成本销售额", Currency),
            ("售价销售额", Currency),
            ("原价销售额", Currency),
            ("毛利", Currency),
            ("定价毛利", Currency),
            ("美团一级分类售价毛利率", Percent),
            ("美团一级分类定价毛利率", Percent),
            ("美团一级分类毛利贡献度", Percent),
        ]),
        SHEET_HIGH_MARGIN | SHEET_LOW_MARGIN => entries(&[
            ("售价", Decimal),
            ("原价", Decimal),
            ("成本", Decimal),
            ("毛利", Decimal),
            ("售价毛利率", Percent),
            ("定价毛利率", Percent),
            ("月售", Integer),
            ("售价销售额", Currency),
            ("成本销售额", Currency),
        ]),
        _ => return None,
    };
    Some(list)
}

/// 区间探测: 非空取值全部为 [0,1] 内的浮点数
fn looks_like_ratio(sheet: &SheetTable, col: usize) -> bool {
    if sheet.headers[col].contains("单价") {
        return false;
    }
    let mut seen = false;
    for row in &sheet.rows {
        match row.get(col) {
            Some(CellValue::Float(v)) => {
                if !(0.0..=1.0).contains(v) {
                    return false;
                }
                seen = true;
            }
            Some(CellValue::Empty) | None => {}
            Some(_) => return false,
        }
    }
    seen
}

/// 计算工作表每一列的数字格式
///
/// # 返回
/// 与表头等长；None 表示保持默认格式
pub fn resolve_number_formats(sheet: &SheetTable) -> Vec<Option<NumberFormat>> {
    match sheet_whitelist(&sheet.name) {
        Some(list) => sheet
            .headers
            .iter()
            .map(|h| list.iter().find(|(name, _)| name == h).map(|(_, f)| *f))
            .collect(),
        None => (0..sheet.headers.len())
            .map(|col| looks_like_ratio(sheet, col).then_some(Percent))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::table::headers;

    #[test]
    fn test_whitelisted_sheet_uses_named_formats() {
        let mut sheet = SheetTable::new(SHEET_ROLE, headers(&["门店", "商品角色", "SKU数量", "销售额占比"]));
        sheet.push(vec![
            CellValue::text("A"),
            CellValue::text("引流品"),
            CellValue::Int(3),
            CellValue::Float(0.4),
        ]);

        let formats = resolve_number_formats(&sheet);
        assert_eq!(formats, vec![None, None, Some(Thousands), Some(Percent)]);
    }

    #[test]
    fn test_category_discount_uses_zhe_format() {
        let sheet = SheetTable::new(
            SHEET_CATEGORY_L1,
            headers(&["美团一级分类", "月售", "美团一级分类折扣", "美团一级分类动销率(类内)"]),
        );
        let formats = resolve_number_formats(&sheet);
        assert_eq!(formats, vec![None, Some(Thousands), Some(Zhe), Some(Percent)]);
        assert_eq!(Zhe.code(), "0.0\"折\"");
    }

    #[test]
    fn test_fallback_detects_ratio_columns() {
        let mut sheet = SheetTable::new(
            "其它",
            headers(&["名称", "占比", "金额", "平均单价", "数量"]),
        );
        sheet.push(vec![
            CellValue::text("x"),
            CellValue::Float(0.25),
            CellValue::Float(12.5),
            CellValue::Float(0.5),
            CellValue::Int(1),
        ]);
        sheet.push(vec![
            CellValue::text("y"),
            CellValue::Empty,
            CellValue::Float(0.5),
            CellValue::Float(0.8),
            CellValue::Int(0),
        ]);

        let formats = resolve_number_formats(&sheet);
        assert_eq!(formats, vec![None, Some(Percent), None, None, None]);
    }

    #[test]
    fn test_fallback_ignores_empty_column() {
        let mut sheet = SheetTable::new("其它", headers(&["占比"]));
        sheet.push(vec![CellValue::Empty]);
        assert_eq!(resolve_number_formats(&sheet), vec![None]);
    }
}
