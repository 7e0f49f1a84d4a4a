// ==========================================
// O2O 门店商品分析 - 字段映射器实现
// ==========================================
// 职责: 源列 → 逻辑字段（仅取值，不做类型转换）
// 列名解析由 ColumnMapping::resolve 在加载时一次性完成
// ==========================================

use crate::config::column_mapping::{LogicalField, ResolvedColumns};
use crate::importer::data_cleaner::normalize_null;
use std::collections::HashMap;

/// 映射后的一行（逻辑字段 → 已 TRIM 的文本，空值为 None）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRow {
    pub row_number: usize,
    pub product_name: Option<String>,
    pub category_l1: Option<String>,
    pub category_l3: Option<String>,
    pub merchant_category: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub sales_qty: Option<String>,
    pub stock: Option<String>,
    pub spec_name: Option<String>,
    pub barcode: Option<String>,
    pub cost: Option<String>,
    pub store_code: Option<String>,
}

pub struct FieldMapper;

impl FieldMapper {
    /// 将一行源数据映射到逻辑字段
    ///
    /// # 参数
    /// - row: 列名 → 单元格文本
    /// - row_number: 源文件数据行号
    /// - resolved: 已解析的列映射
    pub fn map_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
        resolved: &ResolvedColumns,
    ) -> MappedRow {
        let get = |field: LogicalField| -> Option<String> {
            resolved
                .column(field)
                .and_then(|col| normalize_null(row.get(col).map(|s| s.as_str())))
        };

        MappedRow {
            row_number,
            product_name: get(LogicalField::ProductName),
            category_l1: get(LogicalField::CategoryL1),
            category_l3: get(LogicalField::CategoryL3),
            merchant_category: get(LogicalField::MerchantCategory),
            price: get(LogicalField::Price),
            original_price: get(LogicalField::OriginalPrice),
            sales_qty: get(LogicalField::SalesQty),
            stock: get(LogicalField::Stock),
            spec_name: get(LogicalField::SpecName),
            barcode: get(LogicalField::Barcode).map(clean_barcode),
            cost: get(LogicalField::Cost),
            store_code: get(LogicalField::StoreCode),
        }
    }
}

/// 条码清洗：Excel 数值单元格读出的 "6901234567890.0" 去掉小数尾巴
fn clean_barcode(value: String) -> String {
    match value.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => {
            head.to_string()
        }
        _ => value,
    }
}
