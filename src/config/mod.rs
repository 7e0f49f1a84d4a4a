// ==========================================
// O2O 门店商品分析 - 配置层
// ==========================================
// 职责: 列映射 + 分析参数，支持 JSON 文件覆写
// ==========================================

pub mod analysis_config;
pub mod column_mapping;

// 重导出核心配置
pub use analysis_config::{AnalysisConfig, ConfigError, ConsumptionScenario};
pub use column_mapping::{ColumnMapping, FieldCandidates, LogicalField, ResolvedColumns};
