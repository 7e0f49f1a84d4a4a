// ==========================================
// O2O 门店商品分析 - 门店数据加载器
// ==========================================
// 导入流程:
// 1. 文件读取与解析
// 2. 列映射解析（必要列缺失立即失败）
// 3. 字段映射 + 数值清洗（NaN/负数回落为 0）
// 4. 过滤: 缺商品名/一级分类、店铺管理类
// 5. 派生字段计算（销售额/折扣/价格带/角色/场景）
// ==========================================

use crate::config::AnalysisConfig;
use crate::domain::product::{RawRow, RowFields};
use crate::importer::data_cleaner::{
    coerce_amount, coerce_count, parse_amount, CleaningStats,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, MappedRow};
use crate::importer::file_parser::UniversalFileParser;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// 加载并清洗单个门店的商品数据
///
/// # 参数
/// - path: 源文件路径（.xlsx/.xls/.csv）
/// - store: 门店名称
/// - config: 分析配置（列映射、排除分类、消费场景）
///
/// # 返回
/// - Ok(Vec<RawRow>): 按源文件行序排列的清洗后商品行
/// - Err(ImportError): 文件错误 / 必要列缺失 / 清洗后为空
#[instrument(skip(path, config))]
pub fn load_store_rows<P: AsRef<Path>>(
    path: P,
    store: &str,
    config: &AnalysisConfig,
) -> ImportResult<Vec<RawRow>> {
    let table = UniversalFileParser.parse(path.as_ref())?;
    let resolved = config.column_mapping.resolve(&table.headers)?;

    let scenarios = config.scenario_keywords();
    let mapper = FieldMapper;
    let mut stats = CleaningStats::default();
    let mut rows = Vec::with_capacity(table.rows.len());

    for parsed in &table.rows {
        let mapped = mapper.map_row(&parsed.values, parsed.row_number, &resolved);
        if let Some(fields) = clean_row(mapped, store, &config.excluded_category, &mut stats) {
            rows.push(RawRow::from_fields(fields, &scenarios));
        }
    }

    if stats.unparsable_values > 0 || stats.clamped_values > 0 {
        warn!(
            store,
            unparsable = stats.unparsable_values,
            clamped = stats.clamped_values,
            "数值字段存在回落为 0 的取值"
        );
    }
    debug!(
        store,
        dropped_missing_key = stats.dropped_missing_key,
        dropped_excluded = stats.dropped_excluded_category,
        "行过滤统计"
    );

    if rows.is_empty() {
        return Err(ImportError::EmptyResult(format!(
            "门店 {} 清洗后无有效商品行（原始 {} 行）",
            store,
            table.rows.len()
        )));
    }

    info!(store, source_rows = table.rows.len(), kept_rows = rows.len(), "门店数据加载完成");
    Ok(rows)
}

/// 清洗单行；返回 None 表示该行被过滤
fn clean_row(
    mapped: MappedRow,
    store: &str,
    excluded_category: &str,
    stats: &mut CleaningStats,
) -> Option<RowFields> {
    let (product_name, category_l1) = match (mapped.product_name, mapped.category_l1) {
        (Some(name), Some(category)) => (name, category),
        _ => {
            stats.dropped_missing_key += 1;
            return None;
        }
    };

    if category_l1 == excluded_category {
        stats.dropped_excluded_category += 1;
        return None;
    }

    let price = coerce_amount(mapped.price.as_deref());
    let original_price = coerce_amount(mapped.original_price.as_deref());
    let sales_qty = coerce_count(mapped.sales_qty.as_deref());
    let stock = coerce_count(mapped.stock.as_deref());
    for c in [&price, &original_price] {
        stats.record(c);
    }
    for c in [&sales_qty, &stock] {
        stats.record(c);
    }

    // 成本缺失或无法解析时保持 None，不参与毛利计算
    let cost = mapped
        .cost
        .as_deref()
        .and_then(parse_amount)
        .map(|c| c.max(0.0));

    Some(RowFields {
        store: store.to_string(),
        row_number: mapped.row_number,
        product_name,
        category_l1,
        category_l3: mapped.category_l3,
        merchant_category: mapped.merchant_category,
        spec_name: mapped.spec_name,
        barcode: mapped.barcode,
        store_code: mapped.store_code,
        price: price.value,
        original_price: original_price.value,
        sales_qty: sales_qty.value,
        stock: stock.value,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_filters_and_coerces() {
        let file = csv(
            "商品名称,售价,原价,月售,美团一级分类,库存\n\
             可乐(300ml),3,3.5,1.2万,饮料,10\n\
             ,2,2,5,饮料,1\n\
             打包袋,0.5,0.5,100,店铺管理,999\n\
             雪碧,abc,4,500+,饮料,-2\n",
        );

        let rows = load_store_rows(file.path(), "门店A", &AnalysisConfig::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "可乐(300ml)");
        assert_eq!(rows[0].sales_qty, 12000);
        assert_eq!(rows[0].store, "门店A");
        assert_eq!(rows[1].price, 0.0);
        assert_eq!(rows[1].sales_qty, 500);
        assert_eq!(rows[1].stock, 0);
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_missing_original_price_column() {
        let file = csv("商品名称,售价,月售,美团一级分类,库存\n可乐,3,1,饮料,1\n");

        let err = load_store_rows(file.path(), "门店A", &AnalysisConfig::default()).unwrap_err();
        match err {
            ImportError::MissingColumn { field, .. } => assert_eq!(field, "original_price"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_after_cleaning() {
        let file = csv("商品名称,售价,原价,月售,美团一级分类,库存\n打包袋,1,1,1,店铺管理,1\n");

        let err = load_store_rows(file.path(), "门店A", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyResult(_)));
    }

    #[test]
    fn test_optional_cost_column() {
        let file = csv(
            "商品名称,售价,原价,月售,美团一级分类,库存,成本\n\
             薯片,10,12,5,零食,3,6\n\
             饼干,8,8,2,零食,3,\n",
        );

        let rows = load_store_rows(file.path(), "门店A", &AnalysisConfig::default()).unwrap();
        assert_eq!(rows[0].cost, Some(6.0));
        assert_eq!(rows[1].cost, None);
    }
}
