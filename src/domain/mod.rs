// ==========================================
// O2O 门店商品分析 - 领域模型层
// ==========================================
// 职责: 定义商品行实体与领域枚举
// 红线: 不含文件读取逻辑，不含聚合逻辑
// ==========================================

pub mod product;
pub mod types;

// 重导出核心类型
pub use product::{compute_discount, safe_ratio, RawRow, RowFields};
pub use types::{CategoryLevel, MultiSpecTrigger, PriceBand, ProductRole};
