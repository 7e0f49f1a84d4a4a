// ==========================================
// O2O 门店商品分析 - 多规格商品结构
// ==========================================
// 职责: 唯一多规格商品列表 + SKU 结构概览
// ==========================================

use crate::domain::product::RawRow;
use crate::domain::types::MultiSpecTrigger;
use crate::engine::multi_spec::MultiSpecResolution;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// 唯一多规格商品（每个 (门店, 商品名) 一行）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueMultiSpecProduct {
    /// 代表规格在 all_rows 中的下标
    pub row_index: usize,
    pub product_name: String,
    pub base_name: String,
    /// 该商品的规格数（报告行数）
    pub variant_count: usize,
    /// 各规格库存合计
    pub total_stock: u64,
    pub triggers: Vec<MultiSpecTrigger>,
}

/// 由多规格商品报告生成唯一商品列表
///
/// 报告行已按簇内规范排序，第一次出现的规格即代表规格
pub fn unique_multi_spec_products(
    rows: &[RawRow],
    resolution: &MultiSpecResolution,
) -> Vec<UniqueMultiSpecProduct> {
    let mut position: HashMap<(&str, &str), usize> = HashMap::new();
    let mut products: Vec<UniqueMultiSpecProduct> = Vec::new();

    for record in &resolution.records {
        let row = &rows[record.row_index];
        let key = (row.store.as_str(), row.product_name.as_str());
        match position.get(&key) {
            Some(pos) => {
                let p = &mut products[*pos];
                p.variant_count += 1;
                p.total_stock += row.stock;
            }
            None => {
                position.insert(key, products.len());
                products.push(UniqueMultiSpecProduct {
                    row_index: record.row_index,
                    product_name: row.product_name.clone(),
                    base_name: record.base_name.clone(),
                    variant_count: 1,
                    total_stock: row.stock,
                    triggers: record.triggers.clone(),
                });
            }
        }
    }

    products
}

/// SKU 结构概览的一行（每个 (门店, 基名)）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuStructureRow {
    pub base_name: String,
    pub category_l1: String,
    pub variant_count: usize,
    pub is_multi_spec: bool,
    /// 最多 5 个规格示例（源行序）
    pub examples: Vec<String>,
}

impl SkuStructureRow {
    pub fn structure_type(&self) -> &'static str {
        if self.is_multi_spec {
            "多规格"
        } else {
            "单规格"
        }
    }
}

const MAX_EXAMPLES: usize = 5;

/// SKU 结构概览
pub fn sku_structure_overview(
    rows: &[RawRow],
    resolution: &MultiSpecResolution,
) -> Vec<SkuStructureRow> {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        groups
            .entry((row.store.as_str(), resolution.signals[idx].base_name.as_str()))
            .or_default()
            .push(idx);
    }

    let cluster_counts: HashMap<&str, usize> = resolution
        .records
        .iter()
        .map(|r| (r.base_name.as_str(), r.variant_count))
        .collect();

    groups
        .into_iter()
        .map(|((_, base_name), indices)| {
            let mut variants: Vec<&str> = Vec::new();
            for idx in &indices {
                if let Some(vk) = resolution.variant_keys[*idx].as_deref() {
                    if !variants.contains(&vk) {
                        variants.push(vk);
                    }
                }
            }

            let is_multi_spec = resolution.is_member[indices[0]];
            let variant_count = if is_multi_spec {
                cluster_counts.get(base_name).copied().unwrap_or(variants.len()).max(2)
            } else {
                variants.len().max(1)
            };

            SkuStructureRow {
                base_name: base_name.to_string(),
                category_l1: rows[indices[0]].category_l1.clone(),
                variant_count,
                is_multi_spec,
                examples: variants
                    .iter()
                    .take(MAX_EXAMPLES)
                    .map(|s| s.to_string())
                    .collect(),
            }
        })
        .collect()
}
