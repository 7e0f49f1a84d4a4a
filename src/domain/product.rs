// ==========================================
// O2O 门店商品分析 - 商品行实体
// ==========================================
// 职责: 定义清洗后的商品行 (RawRow) 及其派生指标
// 生命周期: 单次分析内创建，解析后不可变
// ==========================================

use crate::domain::types::{PriceBand, ProductRole};
use serde::{Deserialize, Serialize};

// ==========================================
// RawRow - 清洗后的商品行
// ==========================================
// 一行 = 平台展示的一个 SKU/规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    // ===== 元信息 =====
    pub store: String,      // 门店名称
    pub row_number: usize,  // 源文件行号（数据行从 1 开始，用于稳定排序）

    // ===== 商品标识 =====
    pub product_name: String,
    pub category_l1: String,
    pub category_l3: Option<String>,
    pub merchant_category: Option<String>, // 商家分类
    pub spec_name: Option<String>,
    pub barcode: Option<String>,
    pub store_code: Option<String>,

    // ===== 数值字段（已清洗，非负） =====
    pub price: f64,
    pub original_price: f64,
    pub sales_qty: u64,
    pub stock: u64,
    pub cost: Option<f64>,

    // ===== 派生字段 =====
    pub revenue: f64,                // 售价销售额 = price × sales_qty
    pub original_price_revenue: f64, // 原价销售额 = original_price × sales_qty
    pub discount: f64,               // 折扣力度 = (原价 - 售价) / 原价
    pub price_band: PriceBand,
    pub role: ProductRole,
    pub scenarios: Vec<String>,      // 消费场景标签
}

/// 构造 RawRow 所需的已清洗字段
///
/// 派生字段由 [`RawRow::from_fields`] 统一计算
#[derive(Debug, Clone, Default)]
pub struct RowFields {
    pub store: String,
    pub row_number: usize,
    pub product_name: String,
    pub category_l1: String,
    pub category_l3: Option<String>,
    pub merchant_category: Option<String>,
    pub spec_name: Option<String>,
    pub barcode: Option<String>,
    pub store_code: Option<String>,
    pub price: f64,
    pub original_price: f64,
    pub sales_qty: u64,
    pub stock: u64,
    pub cost: Option<f64>,
}

impl RawRow {
    /// 由已清洗字段构造商品行并计算派生指标
    ///
    /// # 参数
    /// - fields: 已清洗字段
    /// - scenarios: 消费场景关键词表（场景名 → 关键词）
    pub fn from_fields(fields: RowFields, scenarios: &[(String, Vec<String>)]) -> Self {
        let qty = fields.sales_qty as f64;
        let revenue = fields.price * qty;
        let original_price_revenue = fields.original_price * qty;
        let discount = compute_discount(fields.price, fields.original_price);
        let price_band = PriceBand::from_price(fields.price);
        let role = ProductRole::classify(price_band, fields.sales_qty, revenue);

        // 场景匹配文本: 商品名 + 一级分类（忽略大小写）
        let haystack = format!("{}{}", fields.product_name, fields.category_l1).to_lowercase();
        let tags = scenarios
            .iter()
            .filter(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|kw| !kw.is_empty() && haystack.contains(&kw.to_lowercase()))
            })
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            store: fields.store,
            row_number: fields.row_number,
            product_name: fields.product_name,
            category_l1: fields.category_l1,
            category_l3: fields.category_l3,
            merchant_category: fields.merchant_category,
            spec_name: fields.spec_name,
            barcode: fields.barcode,
            store_code: fields.store_code,
            price: fields.price,
            original_price: fields.original_price,
            sales_qty: fields.sales_qty,
            stock: fields.stock,
            cost: fields.cost,
            revenue,
            original_price_revenue,
            discount,
            price_band,
            role,
            scenarios: tags,
        }
    }

    /// 是否动销
    pub fn is_active(&self) -> bool {
        self.sales_qty > 0
    }

    // ==========================================
    // 成本派生指标（无成本时返回 None）
    // ==========================================

    /// 成本销售额 = cost × sales_qty
    pub fn cost_revenue(&self) -> Option<f64> {
        self.cost.map(|c| c * self.sales_qty as f64)
    }

    /// 售价毛利 = 售价销售额 - 成本销售额
    pub fn gross_profit(&self) -> Option<f64> {
        self.cost_revenue().map(|c| self.revenue - c)
    }

    /// 定价毛利 = 原价销售额 - 成本销售额
    pub fn list_gross_profit(&self) -> Option<f64> {
        self.cost_revenue().map(|c| self.original_price_revenue - c)
    }

    /// 售价毛利率 = (售价 - 成本) / 售价
    pub fn sale_margin_rate(&self) -> Option<f64> {
        self.cost.map(|c| safe_ratio(self.price - c, self.price))
    }

    /// 定价毛利率 = (原价 - 成本) / 原价
    pub fn list_margin_rate(&self) -> Option<f64> {
        self.cost.map(|c| safe_ratio(self.original_price - c, self.original_price))
    }

    /// 售价倍率 = 售价 / 成本
    pub fn price_multiple(&self) -> Option<f64> {
        self.cost.map(|c| safe_ratio(self.price, c))
    }

    /// 加价率 = (售价 - 成本) / 成本
    pub fn markup_rate(&self) -> Option<f64> {
        self.cost.map(|c| safe_ratio(self.price - c, c))
    }
}

/// 折扣力度，原价 ≤ 0 时为 0，不出现负折扣
pub fn compute_discount(price: f64, original_price: f64) -> f64 {
    if original_price > 0.0 {
        ((original_price - price) / original_price).max(0.0)
    } else {
        0.0
    }
}

/// 安全除法：分母为 0 或结果非有限时返回 0
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let v = numerator / denominator;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, price: f64, original: f64, qty: u64) -> RowFields {
        RowFields {
            store: "测试店".to_string(),
            row_number: 1,
            product_name: name.to_string(),
            category_l1: "饮料".to_string(),
            price,
            original_price: original,
            sales_qty: qty,
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_fields() {
        let row = RawRow::from_fields(fields("可乐", 3.0, 4.0, 20), &[]);
        assert_eq!(row.revenue, 60.0);
        assert_eq!(row.original_price_revenue, 80.0);
        assert!((row.discount - 0.25).abs() < 1e-9);
        assert_eq!(row.price_band, PriceBand::Under5);
        assert_eq!(row.role, ProductRole::Traffic);
        assert!(row.is_active());
    }

    #[test]
    fn test_discount_never_negative() {
        assert_eq!(compute_discount(5.0, 4.0), 0.0);
        assert_eq!(compute_discount(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_scenario_tags() {
        let scenarios = vec![
            ("早餐快手".to_string(), vec!["牛奶".to_string(), "面包".to_string()]),
            ("聚会零食".to_string(), vec!["薯片".to_string()]),
        ];
        let row = RawRow::from_fields(fields("纯牛奶 250ml", 3.0, 3.0, 1), &scenarios);
        assert_eq!(row.scenarios, vec!["早餐快手".to_string()]);
    }

    #[test]
    fn test_scenario_tags_match_category_and_ignore_case() {
        let scenarios = crate::config::AnalysisConfig::default().scenario_keywords();

        let mut chips = fields("乐事原味", 6.0, 6.0, 3);
        chips.category_l1 = "膨化食品".to_string();
        let row = RawRow::from_fields(chips, &scenarios);
        assert_eq!(row.scenarios, vec!["聚会零食".to_string()]);

        let custom = vec![("加班能量补给".to_string(), vec!["Red Bull".to_string()])];
        let row = RawRow::from_fields(fields("RED BULL 250ml", 6.0, 6.0, 3), &custom);
        assert_eq!(row.scenarios, vec!["加班能量补给".to_string()]);
    }

    #[test]
    fn test_cost_metrics() {
        let mut f = fields("薯片", 10.0, 12.0, 5);
        f.cost = Some(6.0);
        let row = RawRow::from_fields(f, &[]);
        assert_eq!(row.cost_revenue(), Some(30.0));
        assert_eq!(row.gross_profit(), Some(20.0));
        assert_eq!(row.list_gross_profit(), Some(30.0));
        assert!((row.sale_margin_rate().unwrap() - 0.4).abs() < 1e-9);
        assert!((row.list_margin_rate().unwrap() - 0.5).abs() < 1e-9);

        let no_cost = RawRow::from_fields(fields("薯片", 10.0, 12.0, 5), &[]);
        assert_eq!(no_cost.gross_profit(), None);
    }

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_eq!(safe_ratio(3.0, 4.0), 0.75);
    }
}
