// ==========================================
// O2O 门店商品分析 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 数量与金额解析 / 非负约束
// 红线: 数值解析失败不致命，统一回落为 0 并计数
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;

/// 带量级单位的数量文本，例如 "1.2万"、"3k"
static QUANTITY_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([万亿千百wWkK]?)$").expect("数量正则非法")
});

/// 空值占位文本
const NULL_TOKENS: [&str; 6] = ["nan", "none", "null", "n/a", "-", "--"];

/// 数量单位 → 倍数
fn unit_factor(unit: &str) -> f64 {
    match unit {
        "万" | "w" | "W" => 1e4,
        "千" | "k" | "K" => 1e3,
        "百" => 1e2,
        "亿" => 1e8,
        _ => 1.0,
    }
}

/// 解析数量文本
///
/// 支持普通数字、千分位、"+" 后缀、中文量级单位
///
/// # 返回
/// - Some(v): 解析成功
/// - None: 无法解析（视为 NaN，由调用方回落为 0）
pub fn parse_quantity(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '，' && *c != '+')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = QUANTITY_WITH_UNIT.captures(&cleaned) {
        let number: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return Some(number * unit_factor(unit));
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析金额文本（去除 ¥/￥/元 与千分位）
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '¥' | '￥' | ',' | '，' | '元') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 空值标准化：TRIM 后为空或为占位文本时返回 None
pub fn normalize_null(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 清洗结果：数值 + 是否发生了回落
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    /// 原值无法解析（回落为 0）
    pub unparsable: bool,
    /// 原值为负（截断为 0）
    pub clamped: bool,
}

/// 数量类字段（月售/库存）：NaN → 0，负数 → 0，四舍五入为整数
pub fn coerce_count(value: Option<&str>) -> Coerced<u64> {
    let raw = normalize_null(value);
    let parsed = raw.as_deref().and_then(parse_quantity);
    let unparsable = raw.is_some() && parsed.is_none();
    let v = parsed.unwrap_or(0.0);
    let clamped = v < 0.0;

    Coerced {
        value: if clamped { 0 } else { v.round() as u64 },
        unparsable,
        clamped,
    }
}

/// 金额类字段（售价/原价）：NaN → 0，负数 → 0
pub fn coerce_amount(value: Option<&str>) -> Coerced<f64> {
    let raw = normalize_null(value);
    let parsed = raw.as_deref().and_then(parse_amount);
    let unparsable = raw.is_some() && parsed.is_none();
    let v = parsed.unwrap_or(0.0);
    let clamped = v < 0.0;

    Coerced {
        value: if clamped { 0.0 } else { v },
        unparsable,
        clamped,
    }
}

/// 清洗统计（按字段计数，用于 DQ 日志）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub unparsable_values: usize,
    pub clamped_values: usize,
    pub dropped_missing_key: usize,
    pub dropped_excluded_category: usize,
}

impl CleaningStats {
    pub fn record<T>(&mut self, coerced: &Coerced<T>) {
        if coerced.unparsable {
            self.unparsable_values += 1;
        }
        if coerced.clamped {
            self.clamped_values += 1;
        }
    }
}
