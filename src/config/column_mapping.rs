// ==========================================
// O2O 门店商品分析 - 列映射配置
// ==========================================
// 职责: 逻辑字段 → 有序候选列名；加载时一次性解析
// 红线: 必要列缺失立即失败，不把缺列问题推迟到聚合阶段
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

// ==========================================
// 逻辑字段 (Logical Field)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    ProductName,
    Price,
    OriginalPrice,
    SalesQty,
    CategoryL1,
    CategoryL3,
    MerchantCategory,
    Stock,
    SpecName,
    Barcode,
    Cost,
    StoreCode,
}

impl LogicalField {
    /// 必要字段（报错时按此顺序报告第一个缺失项）
    pub const ESSENTIAL: [LogicalField; 6] = [
        LogicalField::ProductName,
        LogicalField::Price,
        LogicalField::SalesQty,
        LogicalField::CategoryL1,
        LogicalField::OriginalPrice,
        LogicalField::Stock,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LogicalField::ProductName => "product_name",
            LogicalField::Price => "price",
            LogicalField::OriginalPrice => "original_price",
            LogicalField::SalesQty => "sales_qty",
            LogicalField::CategoryL1 => "category_l1",
            LogicalField::CategoryL3 => "category_l3",
            LogicalField::MerchantCategory => "merchant_category",
            LogicalField::Stock => "stock",
            LogicalField::SpecName => "spec_name",
            LogicalField::Barcode => "barcode",
            LogicalField::Cost => "cost",
            LogicalField::StoreCode => "store_code",
        }
    }

    pub fn is_essential(&self) -> bool {
        Self::ESSENTIAL.contains(self)
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// 单个逻辑字段的候选列名（按优先级排列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidates {
    pub field: LogicalField,
    pub candidates: Vec<String>,
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub fields: Vec<FieldCandidates>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        fn entry(field: LogicalField, names: &[&str]) -> FieldCandidates {
            FieldCandidates {
                field,
                candidates: names.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            fields: vec![
                entry(
                    LogicalField::CategoryL1,
                    &["l1_category", "一级分类", "美团一级分类", "大类", "分类", "一级品类"],
                ),
                entry(
                    LogicalField::CategoryL3,
                    &["l3_category", "美团三级分类", "三级分类", "子类", "细类", "三级品类"],
                ),
                entry(LogicalField::MerchantCategory, &["商家分类"]),
                entry(LogicalField::ProductName, &["product_name", "商品名称", "品名", "名称"]),
                entry(LogicalField::Barcode, &["barcode", "条码", "条形码", "EAN", "UPC"]),
                entry(LogicalField::Price, &["price", "售价", "现价", "销售价", "价格"]),
                entry(LogicalField::OriginalPrice, &["original_price", "原价", "划线价", "参考价"]),
                entry(LogicalField::SalesQty, &["sales_qty", "月售", "销量", "月销量", "销售数量"]),
                entry(
                    LogicalField::Stock,
                    &["库存", "剩余库存", "库存数", "库存数量", "stock", "Stock"],
                ),
                entry(
                    LogicalField::SpecName,
                    &["规格名称", "规格", "规格名", "规格型号", "规格值", "spec", "spec_name", "variant"],
                ),
                entry(
                    LogicalField::Cost,
                    &["cost", "成本", "成本价", "进价", "进货价", "采购价", "商品成本"],
                ),
                entry(
                    LogicalField::StoreCode,
                    &["store_code", "店内码", "商品编码", "内部编码", "商品代码", "门店编码", "店铺编码"],
                ),
            ],
        }
    }
}

impl ColumnMapping {
    /// 查询某个逻辑字段的候选列名
    pub fn candidates(&self, field: LogicalField) -> &[String] {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// 按表头解析列映射
    ///
    /// # 参数
    /// - headers: 源文件表头（已 trim）
    ///
    /// # 返回
    /// - Ok(ResolvedColumns): 逻辑字段 → 实际列名
    /// - Err(MissingColumn): 第一个缺失的必要字段及其尝试过的候选列名
    pub fn resolve(&self, headers: &[String]) -> ImportResult<ResolvedColumns> {
        let mut columns = HashMap::new();

        for entry in &self.fields {
            // 第一个命中的候选列胜出
            if let Some(hit) = entry
                .candidates
                .iter()
                .find(|c| headers.iter().any(|h| h == *c))
            {
                debug!(field = %entry.field, column = %hit, "列映射命中");
                columns.insert(entry.field, hit.clone());
            }
        }

        let missing: Vec<LogicalField> = LogicalField::ESSENTIAL
            .iter()
            .copied()
            .filter(|f| !columns.contains_key(f))
            .collect();

        for field in &missing {
            warn!(
                field = %field,
                tried = ?self.candidates(*field),
                "必要列缺失"
            );
        }

        if let Some(first) = missing.first() {
            return Err(ImportError::MissingColumn {
                field: first.key().to_string(),
                tried: self.candidates(*first).to_vec(),
            });
        }

        Ok(ResolvedColumns { columns })
    }
}

/// 解析后的列映射
#[derive(Debug, Clone, Default)]
pub struct ResolvedColumns {
    columns: HashMap<LogicalField, String>,
}

impl ResolvedColumns {
    /// 逻辑字段对应的实际列名
    pub fn column(&self, field: LogicalField) -> Option<&str> {
        self.columns.get(&field).map(|s| s.as_str())
    }

    pub fn has(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }
}
