// ==========================================
// O2O 门店商品分析 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略: 文件/列错误仅中止当前门店，批量模式继续其他门店
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("检测到 Office 锁文件，请关闭后重试: {0}")]
    LockedFile(String),

    // ===== 数据映射错误 =====
    #[error("缺少必要列 {field}，已尝试: {}", tried.join(", "))]
    MissingColumn { field: String, tried: Vec<String> },

    // ===== 数据质量错误 =====
    #[error("清洗后无有效数据: {0}")]
    EmptyResult(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
