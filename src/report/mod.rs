// ==========================================
// O2O 门店商品分析 - 报表层
// ==========================================
// 职责: 分析结果 → 工作表 → xlsx
// ==========================================

pub mod error;
pub mod exporter;
pub mod formats;
pub mod sheets;
pub mod table;

// 重导出核心类型
pub use error::{ReportError, ReportResult};
pub use exporter::{resolve_output_path, write_then_replace, ReportExporter};
pub use formats::{resolve_number_formats, NumberFormat};
pub use sheets::build_workbook_tables;
pub use table::{CellValue, SheetTable};
