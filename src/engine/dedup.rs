// ==========================================
// O2O 门店商品分析 - 去重引擎
// ==========================================
// 职责: 规范排序 + 三套对齐数据集 + SKU 单元划分
// 排序键: 销量降序 → 售价升序 → 库存降序 → 规格名称升序(空值最后) → 源行号升序
// 红线: 排序为全序，同一输入重复运行结果一致
// ==========================================

use crate::domain::product::RawRow;
use crate::engine::multi_spec::MultiSpecResolution;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// 规范排序（用于选取代表行）
pub fn canonical_order(a: &RawRow, b: &RawRow) -> Ordering {
    b.sales_qty
        .cmp(&a.sales_qty)
        .then_with(|| a.price.total_cmp(&b.price))
        .then_with(|| b.stock.cmp(&a.stock))
        .then_with(|| match (&a.spec_name, &b.spec_name) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.store.cmp(&b.store))
        .then_with(|| a.row_number.cmp(&b.row_number))
}

/// 按 (门店, 商品名) 去重，每个商品保留规范排序第一行
///
/// 输出保持规范排序；对输出再次去重结果不变
pub fn deduplicate(rows: &[RawRow]) -> Vec<RawRow> {
    let mut sorted: Vec<&RawRow> = rows.iter().collect();
    sorted.sort_by(|a, b| canonical_order(a, b));

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    sorted
        .into_iter()
        .filter(|row| seen.insert((row.store.as_str(), row.product_name.as_str())))
        .cloned()
        .collect()
}

// ==========================================
// StoreDatasets - 三套对齐数据集
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StoreDatasets {
    /// 门店名称（取自首行）
    pub store: String,
    /// 全部商品行（清洗后，源文件行序）
    pub all_rows: Vec<RawRow>,
    /// 每个商品一行（规范排序）
    pub deduplicated: Vec<RawRow>,
    /// 去重后销量 > 0 的行
    pub active: Vec<RawRow>,
}

impl StoreDatasets {
    pub fn inactive_count(&self) -> usize {
        self.deduplicated.len() - self.active.len()
    }
}

/// 由清洗后的商品行构建三套数据集
pub fn build_datasets(rows: Vec<RawRow>) -> StoreDatasets {
    let deduplicated = deduplicate(&rows);
    let active: Vec<RawRow> = deduplicated.iter().filter(|r| r.is_active()).cloned().collect();

    info!(
        store = rows.first().map(|r| r.store.as_str()).unwrap_or(""),
        all_rows = rows.len(),
        deduplicated = deduplicated.len(),
        active = active.len(),
        "去重完成"
    );

    StoreDatasets {
        store: rows.first().map(|r| r.store.clone()).unwrap_or_default(),
        all_rows: rows,
        deduplicated,
        active,
    }
}

// ==========================================
// SkuUnit - SKU 单元 (门店, 商品名, 规格键)
// ==========================================
// 总SKU数(含规格) 的计数口径；跨分类商品归属到字典序最小的分类
#[derive(Debug, Clone, PartialEq)]
pub struct SkuUnit {
    /// 代表行在 all_rows 中的下标
    pub rep_index: usize,
    pub product_name: String,
    pub base_name: String,
    pub variant_key: Option<String>,
    /// 归属一级分类
    pub category_l1: String,
    /// 归属三级分类（单元内无三级分类时为 None）
    pub category_l3: Option<String>,
    pub is_multi_spec: bool,
    /// 代表行库存
    pub stock: u64,
}

/// 划分 SKU 单元
///
/// # 参数
/// - rows: all_rows
/// - resolution: 多规格识别结果（提供规格键与成员标记）
pub fn build_sku_units(rows: &[RawRow], resolution: &MultiSpecResolution) -> Vec<SkuUnit> {
    let mut groups: BTreeMap<(&str, &str, Option<&str>), Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        groups
            .entry((
                row.store.as_str(),
                row.product_name.as_str(),
                resolution.variant_keys[idx].as_deref(),
            ))
            .or_default()
            .push(idx);
    }

    groups
        .into_values()
        .filter_map(|indices| {
            let rep_index = *indices
                .iter()
                .min_by(|a, b| canonical_order(&rows[**a], &rows[**b]))?;
            let category_l1 = indices.iter().map(|i| rows[*i].category_l1.as_str()).min()?;
            let category_l3 = indices
                .iter()
                .filter_map(|i| rows[*i].category_l3.as_deref())
                .min();
            let rep = &rows[rep_index];

            Some(SkuUnit {
                rep_index,
                product_name: rep.product_name.clone(),
                base_name: resolution.signals[rep_index].base_name.clone(),
                variant_key: resolution.variant_keys[rep_index].clone(),
                category_l1: category_l1.to_string(),
                category_l3: category_l3.map(|s| s.to_string()),
                is_multi_spec: resolution.is_member[rep_index],
                stock: rep.stock,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::RowFields;
    use crate::engine::multi_spec::resolve_multi_spec;

    fn row(n: usize, name: &str, category: &str, price: f64, qty: u64, stock: u64, spec: Option<&str>) -> RawRow {
        RawRow::from_fields(
            RowFields {
                store: "门店A".to_string(),
                row_number: n,
                product_name: name.to_string(),
                category_l1: category.to_string(),
                spec_name: spec.map(|s| s.to_string()),
                price,
                original_price: price,
                sales_qty: qty,
                stock,
                ..Default::default()
            },
            &[],
        )
    }

    #[test]
    fn test_canonical_order_keys() {
        let high_sales = row(1, "A", "饮料", 5.0, 10, 0, None);
        let low_sales = row(2, "A", "饮料", 1.0, 5, 9, None);
        assert_eq!(canonical_order(&high_sales, &low_sales), Ordering::Less);

        let cheap = row(3, "A", "饮料", 2.0, 5, 0, None);
        assert_eq!(canonical_order(&cheap, &low_sales), Ordering::Greater);

        let with_spec = row(4, "A", "饮料", 1.0, 5, 9, Some("大"));
        assert_eq!(canonical_order(&with_spec, &low_sales), Ordering::Less);

        let later = row(5, "A", "饮料", 1.0, 5, 9, None);
        assert_eq!(canonical_order(&low_sales, &later), Ordering::Less);
    }

    #[test]
    fn test_deduplicate_picks_canonical_row() {
        let rows = vec![
            row(1, "薯片", "零食", 6.0, 3, 1, Some("原味")),
            row(2, "薯片", "零食", 5.0, 3, 1, Some("番茄")),
            row(3, "可乐", "饮料", 3.0, 0, 4, None),
        ];

        let dedup = deduplicate(&rows);

        assert_eq!(dedup.len(), 2);
        assert_eq!(dedup[0].product_name, "薯片");
        assert_eq!(dedup[0].row_number, 2);
    }

    #[test]
    fn test_deduplicate_idempotent() {
        let rows = vec![
            row(1, "薯片", "零食", 6.0, 3, 1, Some("原味")),
            row(2, "薯片", "零食", 6.0, 3, 1, Some("番茄")),
            row(3, "可乐", "饮料", 3.0, 7, 4, None),
            row(4, "可乐", "饮料", 3.0, 7, 4, None),
        ];

        let once = deduplicate(&rows);
        let twice = deduplicate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_build_datasets_monotonic() {
        let rows = vec![
            row(1, "薯片", "零食", 6.0, 3, 1, None),
            row(2, "薯片", "零食", 6.0, 1, 1, None),
            row(3, "可乐", "饮料", 3.0, 0, 4, None),
        ];

        let ds = build_datasets(rows);
        assert_eq!(ds.all_rows.len(), 3);
        assert_eq!(ds.deduplicated.len(), 2);
        assert_eq!(ds.active.len(), 1);
        assert_eq!(ds.inactive_count(), 1);
    }

    #[test]
    fn test_sku_unit_cross_category_attribution() {
        let rows = vec![
            row(1, "纸巾", "日用", 5.0, 3, 0, None),
            row(2, "纸巾", "百货", 5.0, 3, 2, None),
        ];
        let res = resolve_multi_spec(&rows);

        let units = build_sku_units(&rows, &res);
        assert_eq!(units.len(), 1);
        // 字典序最小的分类
        let expected = ["日用", "百货"].into_iter().min().unwrap();
        assert_eq!(units[0].category_l1, expected);
        assert_eq!(units[0].stock, 2);
    }
}
