// ==========================================
// O2O 门店商品分析 - 导入层
// ==========================================
// 职责: 外部文件 → 清洗后的商品行 (RawRow)
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod store_loader;

// 重导出核心类型
pub use data_cleaner::{coerce_amount, coerce_count, normalize_null, parse_amount, parse_quantity};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, MappedRow};
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedRow, ParsedTable, UniversalFileParser};
pub use store_loader::load_store_rows;
