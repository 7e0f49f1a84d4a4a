// ==========================================
// O2O 门店商品分析 - 规格信号提取
// ==========================================
// 职责: 从商品名称推断规格 (inferred spec) + 归一化基名 (base name)
// 输入: product_name
// 输出: 纯函数，无状态
// ==========================================

use crate::domain::product::RawRow;
use once_cell::sync::Lazy;
use regex::Regex;

// ===== 规格文本模式（推断与剥离共用） =====

/// 数量×规格，如 12*50g、6×500ml
static COUNT_TIMES_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*[x×*]\s*\d+\s*(?:g|kg|ml|l|片|包|袋|支|枚|瓶|听|卷)?")
        .expect("数量×规格正则非法")
});

/// 体积/重量，如 500ml、1.5l、300g、2kg
static VOLUME_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?\s*(?:ml|l|g|kg)").expect("体积重量正则非法"));

/// 计数单位，如 12片、6包、24支
static COUNT_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*(?:片|包|袋|支|枚|瓶|听|盒|卷|块|片装|袋装|支装)").expect("计数单位正则非法")
});

/// 括号内容（常为口味/规格）
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(（\[][^\)）\]]*[\)）\]]").expect("括号正则非法"));

/// 非中文/字母/数字的连续片段
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\u{4e00}-\u{9fff}0-9a-zA-Z]+").expect("标点正则非法"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("空白正则非法"));

/// 推断规格时识别的口味/尺寸关键词
const FLAVOR_SIZE_KEYWORDS: [&str; 45] = [
    "原味", "草莓", "香草", "巧克力", "柠檬", "芒果", "橙", "蓝莓", "青柠", "葡萄", "可乐", "零度",
    "乌龙", "茉莉", "奶绿", "微辣", "中辣", "特辣", "麻辣", "清爽", "无糖", "低糖", "0糖", "少糖",
    "无盐", "低盐", "海盐", "黑糖", "红糖", "燕麦", "全麦", "低脂", "高钙", "高蛋白", "大", "中",
    "小", "迷你", "mini", "家庭装", "分享装", "量贩", "加大", "加厚", "便携",
];

/// 归一化基名时剥离的变体关键词（比推断列表更保守）
const VARIANT_KEYWORDS: [&str; 20] = [
    "原味", "草莓", "香草", "巧克力", "柠檬", "芒果", "微辣", "中辣", "特辣", "无糖", "低糖", "0糖",
    "家庭装", "分享装", "量贩", "迷你", "mini", "大", "中", "小",
];

/// 从商品名称推断规格
///
/// 依次提取: 数量×规格 → 体积/重量 → 计数单位 → 口味/尺寸关键词，
/// 去重后以空格拼接；无命中返回空串
pub fn infer_spec(name: &str) -> String {
    let s = name.to_lowercase();
    let mut specs: Vec<String> = Vec::new();

    for pattern in [&*COUNT_TIMES_UNIT, &*VOLUME_WEIGHT, &*COUNT_UNIT] {
        specs.extend(
            pattern
                .find_iter(&s)
                .map(|m| WHITESPACE.replace_all(m.as_str(), "").into_owned()),
        );
    }

    specs.extend(
        FLAVOR_SIZE_KEYWORDS
            .iter()
            .filter(|kw| s.contains(*kw))
            .map(|kw| kw.to_string()),
    );

    let mut uniq: Vec<String> = Vec::with_capacity(specs.len());
    for token in specs {
        if !token.is_empty() && !uniq.contains(&token) {
            uniq.push(token);
        }
    }
    uniq.join(" ")
}

/// 归一化商品基名
///
/// 剥离括号内容、规格文本与变体关键词，标点折叠为单个空格
pub fn normalize_base_name(name: &str) -> String {
    let mut s = name.to_lowercase();
    s = BRACKETED.replace_all(&s, "").into_owned();
    for pattern in [&*COUNT_TIMES_UNIT, &*VOLUME_WEIGHT, &*COUNT_UNIT] {
        s = pattern.replace_all(&s, "").into_owned();
    }
    for kw in VARIANT_KEYWORDS {
        s = s.replace(kw, "");
    }
    s = NON_WORD.replace_all(&s, " ").into_owned();
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

// ==========================================
// RowSignals - 单行的规格信号
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSignals {
    /// 归一化基名；名称被完全剥离时回落为小写原名，避免无关商品合并
    pub base_name: String,
    /// 名称推断规格（可能为空串）
    pub inferred_spec: String,
}

impl RowSignals {
    pub fn from_row(row: &RawRow) -> Self {
        let base = normalize_base_name(&row.product_name);
        let base_name = if base.is_empty() {
            row.product_name.trim().to_lowercase()
        } else {
            base
        };
        Self {
            base_name,
            inferred_spec: infer_spec(&row.product_name),
        }
    }
}

/// 批量计算信号（与输入行一一对应）
pub fn compute_signals(rows: &[RawRow]) -> Vec<RowSignals> {
    rows.iter().map(RowSignals::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_volume_in_brackets() {
        assert_eq!(infer_spec("可乐(300ml)"), "300ml 可乐");
        assert_eq!(infer_spec("可乐(500ml)"), "500ml 可乐");
    }

    #[test]
    fn test_infer_count_times_unit() {
        let spec = infer_spec("奥利奥饼干 12 * 50g");
        assert!(spec.starts_with("12*50g"));
        assert!(spec.contains("50g"));
    }

    #[test]
    fn test_infer_count_unit_and_keywords() {
        assert_eq!(infer_spec("维达抽纸 6包"), "6包");
        assert_eq!(infer_spec("乐事薯片 原味"), "原味");
        assert_eq!(infer_spec("农夫山泉"), "");
    }

    #[test]
    fn test_normalize_base_name() {
        assert_eq!(normalize_base_name("可乐(300ml)"), "可乐");
        assert_eq!(normalize_base_name("可乐（500ml）"), "可乐");
        assert_eq!(normalize_base_name("乐事薯片 原味 75g"), "乐事薯片");
        assert_eq!(normalize_base_name("维达抽纸 6包"), "维达抽纸");
        assert_eq!(normalize_base_name("Coca-Cola 1.5L"), "coca cola");
    }

    #[test]
    fn test_signals_fallback_when_name_fully_stripped() {
        use crate::domain::product::{RawRow, RowFields};
        let row = RawRow::from_fields(
            RowFields {
                product_name: "大号".to_string(),
                category_l1: "日用".to_string(),
                ..Default::default()
            },
            &[],
        );
        // "大" 被剥离后仍剩 "号"
        assert_eq!(RowSignals::from_row(&row).base_name, "号");

        let row = RawRow::from_fields(
            RowFields {
                product_name: "(小)".to_string(),
                category_l1: "日用".to_string(),
                ..Default::default()
            },
            &[],
        );
        assert_eq!(RowSignals::from_row(&row).base_name, "(小)");
    }
}
