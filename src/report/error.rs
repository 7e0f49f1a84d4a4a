// ==========================================
// O2O 门店商品分析 - 报表模块错误类型
// ==========================================

use thiserror::Error;

/// 报表导出错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("没有可导出的分析结果")]
    NoResults,

    #[error("门店未分析或结果已移除: {0}")]
    UnknownStore(String),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel 写入失败: {0}")]
    Xlsx(String),

    #[error("工作表创建失败: {0}")]
    Sheet(String),
}

/// Result 类型别名
pub type ReportResult<T> = Result<T, ReportError>;
