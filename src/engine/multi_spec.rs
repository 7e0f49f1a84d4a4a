// ==========================================
// O2O 门店商品分析 - 多规格识别引擎
// ==========================================
// 职责: 三路独立信号 → 集合并集 → 多规格簇
//   信号1: 同一 (门店, 商品名) 下非空规格名称 > 1
//   信号2: 同一 (门店, 基名) 下名称推断规格 > 1
//   信号3: 同一 (门店, 基名) 下非空条码 > 1
// 红线: 成员行按 (门店, 商品名, 规格键) 去重后的条数 = 多规格SKU总数
//       = 多规格商品报告行数
// ==========================================

use crate::domain::product::RawRow;
use crate::domain::types::MultiSpecTrigger;
use crate::engine::dedup::canonical_order;
use crate::engine::variant_signal::{compute_signals, RowSignals};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// 簇键: (门店, 基名)
pub type ClusterKey = (String, String);

/// 商品键: (门店, 商品名)
pub type ProductKey = (String, String);

// ==========================================
// 三路信号（纯函数，可独立验证）
// ==========================================

/// 信号1: 规格列多值，返回命中的 (门店, 商品名)
pub fn spec_column_signal(rows: &[RawRow]) -> BTreeSet<ProductKey> {
    let mut specs: HashMap<ProductKey, HashSet<&str>> = HashMap::new();
    for row in rows {
        if let Some(spec) = row.spec_name.as_deref() {
            specs
                .entry((row.store.clone(), row.product_name.clone()))
                .or_default()
                .insert(spec);
        }
    }
    specs
        .into_iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, _)| key)
        .collect()
}

/// 信号2: 名称推断规格多值，返回命中的 (门店, 基名)
pub fn inferred_spec_signal(rows: &[RawRow], signals: &[RowSignals]) -> BTreeSet<ClusterKey> {
    distinct_per_base(rows, signals, |_, sig| {
        (!sig.inferred_spec.is_empty()).then_some(sig.inferred_spec.as_str())
    })
}

/// 信号3: 条码多值（仅统计非空条码），返回命中的 (门店, 基名)
pub fn barcode_signal(rows: &[RawRow], signals: &[RowSignals]) -> BTreeSet<ClusterKey> {
    distinct_per_base(rows, signals, |row, _| row.barcode.as_deref())
}

/// 按 (门店, 基名) 统计取值去重数，返回 > 1 的键
fn distinct_per_base<'a, F>(
    rows: &'a [RawRow],
    signals: &'a [RowSignals],
    value_of: F,
) -> BTreeSet<ClusterKey>
where
    F: Fn(&'a RawRow, &'a RowSignals) -> Option<&'a str>,
{
    let mut values: HashMap<ClusterKey, HashSet<&str>> = HashMap::new();
    for (row, sig) in rows.iter().zip(signals) {
        if let Some(v) = value_of(row, sig) {
            values
                .entry((row.store.clone(), sig.base_name.clone()))
                .or_default()
                .insert(v);
        }
    }
    values
        .into_iter()
        .filter(|(_, set)| set.len() > 1)
        .map(|(key, _)| key)
        .collect()
}

/// 规格键: 规格名称 → 名称推断规格 → 条码
pub fn variant_key(row: &RawRow, signal: &RowSignals) -> Option<String> {
    if let Some(spec) = row.spec_name.as_deref().filter(|s| !s.is_empty()) {
        return Some(spec.to_string());
    }
    if !signal.inferred_spec.is_empty() {
        return Some(signal.inferred_spec.clone());
    }
    row.barcode.clone().filter(|b| !b.is_empty())
}

// ==========================================
// 识别结果
// ==========================================

/// 多规格商品报告的一行
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSpecRecord {
    /// 代表行在 all_rows 中的下标
    pub row_index: usize,
    pub base_name: String,
    pub inferred_spec: String,
    pub variant_key: Option<String>,
    /// 同基名下的规格种类数（至少 2）
    pub variant_count: usize,
    /// 触发该簇的信号
    pub triggers: Vec<MultiSpecTrigger>,
}

#[derive(Debug, Clone, Default)]
pub struct MultiSpecResolution {
    /// 每行的规格信号（与 all_rows 对齐）
    pub signals: Vec<RowSignals>,
    /// 每行的规格键（与 all_rows 对齐）
    pub variant_keys: Vec<Option<String>>,
    /// 每行是否属于多规格簇（与 all_rows 对齐）
    pub is_member: Vec<bool>,
    /// 多规格簇 → 触发信号
    pub clusters: BTreeMap<ClusterKey, Vec<MultiSpecTrigger>>,
    /// 多规格商品报告（按 (门店, 商品名, 规格键) 去重）
    pub records: Vec<MultiSpecRecord>,
}

impl MultiSpecResolution {
    /// 多规格SKU总数
    pub fn multi_spec_sku_total(&self) -> usize {
        self.records.len()
    }

    /// 多规格SPU数（去重基名）
    pub fn multi_spec_spu_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.base_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// 成员行所属的簇
    pub fn cluster_of(&self, row_index: usize, rows: &[RawRow]) -> Option<ClusterKey> {
        if !self.is_member.get(row_index).copied().unwrap_or(false) {
            return None;
        }
        Some((
            rows[row_index].store.clone(),
            self.signals[row_index].base_name.clone(),
        ))
    }
}

/// 多规格识别
///
/// # 参数
/// - rows: 单次分析的全部商品行 (all_rows)
///
/// # 返回
/// - MultiSpecResolution: 行级信号/成员标记 + 簇 + 去重后的报告行
pub fn resolve_multi_spec(rows: &[RawRow]) -> MultiSpecResolution {
    let signals = compute_signals(rows);
    let variant_keys: Vec<Option<String>> = rows
        .iter()
        .zip(&signals)
        .map(|(row, sig)| variant_key(row, sig))
        .collect();

    let spec_hits = spec_column_signal(rows);
    let inferred_hits = inferred_spec_signal(rows, &signals);
    let barcode_hits = barcode_signal(rows, &signals);

    // 信号1 的 (门店, 商品名) 回映到 (门店, 基名)
    let mut clusters: BTreeMap<ClusterKey, BTreeSet<MultiSpecTrigger>> = BTreeMap::new();
    for (row, sig) in rows.iter().zip(&signals) {
        if spec_hits.contains(&(row.store.clone(), row.product_name.clone())) {
            clusters
                .entry((row.store.clone(), sig.base_name.clone()))
                .or_default()
                .insert(MultiSpecTrigger::SpecColumn);
        }
    }
    for key in inferred_hits {
        clusters.entry(key).or_default().insert(MultiSpecTrigger::NameInferred);
    }
    for key in barcode_hits {
        clusters.entry(key).or_default().insert(MultiSpecTrigger::Barcode);
    }

    let is_member: Vec<bool> = rows
        .iter()
        .zip(&signals)
        .map(|(row, sig)| clusters.contains_key(&(row.store.clone(), sig.base_name.clone())))
        .collect();

    // 规格种类数: 同簇内非空规格键去重数
    let mut variant_counts: HashMap<ClusterKey, HashSet<&str>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if !is_member[idx] {
            continue;
        }
        let entry = variant_counts
            .entry((row.store.clone(), signals[idx].base_name.clone()))
            .or_default();
        if let Some(vk) = variant_keys[idx].as_deref() {
            entry.insert(vk);
        }
    }

    // 成员行按 (簇, 规范排序) 排列，按 (门店, 商品名, 规格键) 保留第一行
    let mut member_indices: Vec<usize> = (0..rows.len()).filter(|i| is_member[*i]).collect();
    member_indices.sort_by(|a, b| {
        (&rows[*a].store, &signals[*a].base_name)
            .cmp(&(&rows[*b].store, &signals[*b].base_name))
            .then_with(|| canonical_order(&rows[*a], &rows[*b]))
    });

    let mut seen: HashSet<(&str, &str, Option<&str>)> = HashSet::new();
    let mut records = Vec::new();
    for idx in member_indices {
        let row = &rows[idx];
        let key = (
            row.store.as_str(),
            row.product_name.as_str(),
            variant_keys[idx].as_deref(),
        );
        if !seen.insert(key) {
            continue;
        }
        let cluster_key = (row.store.clone(), signals[idx].base_name.clone());
        let variant_count = variant_counts
            .get(&cluster_key)
            .map(|set| set.len())
            .unwrap_or(0)
            .max(2);
        // 规格列依据只归属命中信号1 的商品名，其余依据按簇共享
        let own_spec_column = spec_hits.contains(&(row.store.clone(), row.product_name.clone()));
        let triggers = clusters
            .get(&cluster_key)
            .map(|t| {
                t.iter()
                    .copied()
                    .filter(|tr| *tr != MultiSpecTrigger::SpecColumn || own_spec_column)
                    .collect()
            })
            .unwrap_or_default();

        records.push(MultiSpecRecord {
            row_index: idx,
            base_name: signals[idx].base_name.clone(),
            inferred_spec: signals[idx].inferred_spec.clone(),
            variant_key: variant_keys[idx].clone(),
            variant_count,
            triggers,
        });
    }

    let member_rows = is_member.iter().filter(|m| **m).count();
    debug!(
        member_rows,
        duplicates_removed = member_rows - records.len(),
        "多规格成员行去重"
    );
    info!(
        clusters = clusters.len(),
        multi_spec_sku_total = records.len(),
        "多规格识别完成"
    );

    MultiSpecResolution {
        signals,
        variant_keys,
        is_member,
        clusters: clusters
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        records,
    }
}
