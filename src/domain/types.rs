// ==========================================
// O2O 门店商品分析 - 领域类型定义
// ==========================================
// 职责: 价格带 / 商品角色 / 分类层级 / 多规格依据
// 红线: 枚举的显示文本即报表列值，修改需同步下游
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 价格带 (Price Band)
// ==========================================
// 左闭右开区间；最高档覆盖 [90, +∞)，沿用下游报表的 "100 元以上" 标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceBand {
    Under5,
    From5To10,
    From10To20,
    From20To30,
    From30To40,
    From40To50,
    From50To60,
    From60To70,
    From70To80,
    From80To90,
    Above90,
}

impl PriceBand {
    /// 全部价格带（报表输出顺序）
    pub const ALL: [PriceBand; 11] = [
        PriceBand::Under5,
        PriceBand::From5To10,
        PriceBand::From10To20,
        PriceBand::From20To30,
        PriceBand::From30To40,
        PriceBand::From40To50,
        PriceBand::From50To60,
        PriceBand::From60To70,
        PriceBand::From70To80,
        PriceBand::From80To90,
        PriceBand::Above90,
    ];

    /// 根据售价划分价格带
    ///
    /// 非有限值与负数按 0 处理
    pub fn from_price(price: f64) -> Self {
        let p = if price.is_finite() && price > 0.0 { price } else { 0.0 };
        if p < 5.0 {
            PriceBand::Under5
        } else if p < 10.0 {
            PriceBand::From5To10
        } else if p >= 90.0 {
            PriceBand::Above90
        } else {
            // 10 元以上按 10 元一档
            match (p / 10.0).floor() as u32 {
                1 => PriceBand::From10To20,
                2 => PriceBand::From20To30,
                3 => PriceBand::From30To40,
                4 => PriceBand::From40To50,
                5 => PriceBand::From50To60,
                6 => PriceBand::From60To70,
                7 => PriceBand::From70To80,
                _ => PriceBand::From80To90,
            }
        }
    }

    /// 报表标签
    pub fn label(&self) -> &'static str {
        match self {
            PriceBand::Under5 => "0-5 元",
            PriceBand::From5To10 => "5-10 元",
            PriceBand::From10To20 => "10-20 元",
            PriceBand::From20To30 => "20-30 元",
            PriceBand::From30To40 => "30-40 元",
            PriceBand::From40To50 => "40-50 元",
            PriceBand::From50To60 => "50-60 元",
            PriceBand::From60To70 => "60-70 元",
            PriceBand::From70To80 => "70-80 元",
            PriceBand::From80To90 => "80-90 元",
            PriceBand::Above90 => "100 元以上",
        }
    }

    /// 是否为低价引流区间（10 元以下）
    pub fn is_low_price(&self) -> bool {
        matches!(self, PriceBand::Under5 | PriceBand::From5To10)
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 商品角色 (Product Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductRole {
    Traffic,   // 引流品
    Profit,    // 利润品
    Image,     // 形象品
    Weak,      // 劣势品
}

impl ProductRole {
    pub const ALL: [ProductRole; 4] = [
        ProductRole::Traffic,
        ProductRole::Profit,
        ProductRole::Image,
        ProductRole::Weak,
    ];

    /// 引流品销量门槛（严格大于）
    pub const TRAFFIC_MIN_SALES: u64 = 10;
    /// 利润品销售额门槛（严格大于）
    pub const PROFIT_MIN_REVENUE: f64 = 50.0;

    /// 按价格带 + 销量/销售额判定角色
    pub fn classify(band: PriceBand, sales_qty: u64, revenue: f64) -> Self {
        match band {
            PriceBand::Above90 => ProductRole::Image,
            b if b.is_low_price() && sales_qty > Self::TRAFFIC_MIN_SALES => ProductRole::Traffic,
            b if !b.is_low_price() && revenue > Self::PROFIT_MIN_REVENUE => ProductRole::Profit,
            _ => ProductRole::Weak,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductRole::Traffic => "引流品",
            ProductRole::Profit => "利润品",
            ProductRole::Image => "形象品",
            ProductRole::Weak => "劣势品",
        }
    }
}

impl fmt::Display for ProductRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 分类层级 (Category Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryLevel {
    L1,
    L3,
}

impl CategoryLevel {
    /// 报表列名前缀
    pub fn column_prefix(&self) -> &'static str {
        match self {
            CategoryLevel::L1 => "美团一级分类",
            CategoryLevel::L3 => "美团三级分类",
        }
    }
}

impl fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryLevel::L1 => write!(f, "L1"),
            CategoryLevel::L3 => write!(f, "L3"),
        }
    }
}

// ==========================================
// 多规格判定依据 (Multi-spec Trigger)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MultiSpecTrigger {
    SpecColumn,   // 规格列多值
    NameInferred, // 名称解析出多种规格
    Barcode,      // 同名多条码
}

impl MultiSpecTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            MultiSpecTrigger::SpecColumn => "规格列",
            MultiSpecTrigger::NameInferred => "名称解析",
            MultiSpecTrigger::Barcode => "条码多值",
        }
    }
}

impl fmt::Display for MultiSpecTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_band_boundaries() {
        assert_eq!(PriceBand::from_price(0.0), PriceBand::Under5);
        assert_eq!(PriceBand::from_price(4.99), PriceBand::Under5);
        assert_eq!(PriceBand::from_price(5.0), PriceBand::From5To10);
        assert_eq!(PriceBand::from_price(10.0), PriceBand::From10To20);
        assert_eq!(PriceBand::from_price(89.9), PriceBand::From80To90);
        assert_eq!(PriceBand::from_price(90.0), PriceBand::Above90);
        assert_eq!(PriceBand::from_price(-3.0), PriceBand::Under5);
        assert_eq!(PriceBand::from_price(f64::NAN), PriceBand::Under5);
    }

    #[test]
    fn test_role_classification() {
        assert_eq!(ProductRole::classify(PriceBand::Under5, 11, 30.0), ProductRole::Traffic);
        assert_eq!(ProductRole::classify(PriceBand::Under5, 10, 30.0), ProductRole::Weak);
        assert_eq!(ProductRole::classify(PriceBand::From20To30, 3, 75.0), ProductRole::Profit);
        assert_eq!(ProductRole::classify(PriceBand::From20To30, 2, 50.0), ProductRole::Weak);
        assert_eq!(ProductRole::classify(PriceBand::Above90, 0, 0.0), ProductRole::Image);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PriceBand::Above90.to_string(), "100 元以上");
        assert_eq!(ProductRole::Profit.to_string(), "利润品");
        assert_eq!(CategoryLevel::L3.column_prefix(), "美团三级分类");
        assert_eq!(MultiSpecTrigger::Barcode.label(), "条码多值");
    }
}
