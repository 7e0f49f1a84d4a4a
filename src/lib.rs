// ==========================================
// O2O 门店商品分析 - 核心库
// ==========================================
// 输入: 各门店商品导出表（xlsx / csv）
// 输出: 多门店对比报表（xlsx）
// 执行模型: 单线程同步批处理，门店之间互不共享中间结果
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 列名映射与分析参数
pub mod config;

// 导入层 - 文件解析与清洗
pub mod importer;

// 引擎层 - 多规格识别、去重、指标聚合
pub mod engine;

// 报表层 - 工作表与 xlsx 导出
pub mod report;

// 应用层 - 结果缓存与批量入口
pub mod app;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryLevel, MultiSpecTrigger, PriceBand, ProductRole};

// 领域实体
pub use domain::RawRow;

// 配置
pub use config::{AnalysisConfig, ColumnMapping, ConfigError, LogicalField};

// 导入
pub use importer::{load_store_rows, ImportError, ImportResult};

// 引擎
pub use engine::{analyze_store_performance, run_store_pipeline, StoreAnalysis, StoreRun};

// 报表
pub use report::{ReportError, ReportExporter, ReportResult};

// 应用
pub use app::{run_batch, BatchOptions, BatchSummary, ReportSelection, ResultStore, StoreAnalyzer};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "O2O门店商品分析";
