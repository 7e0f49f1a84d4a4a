// ==========================================
// O2O 门店商品分析 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析（表头 trim，跳过空白行）
// 支持: Excel (.xlsx/.xls) / CSV (.csv，UTF-8 优先，GBK 回退)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// 解析后的一行（列名 → 单元格文本）
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 数据行号（表头之后从 1 开始，空白行也计数）
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

/// 解析后的整张表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

impl ParsedTable {
    fn push_row(&mut self, row_number: usize, cells: impl Iterator<Item = String>) {
        let mut values = HashMap::new();
        for (col_idx, value) in cells.enumerate() {
            if let Some(header) = self.headers.get(col_idx) {
                // 重名列保留第一列
                values
                    .entry(header.clone())
                    .or_insert_with(|| value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if values.values().all(|v| v.is_empty()) {
            return;
        }

        self.rows.push(ParsedRow { row_number, values });
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 解析文件为表头 + 行集合
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable>;
}

/// 读取前检查：存在性 / Office 锁文件 / 扩展名
fn precheck(path: &Path, allowed: &[&str]) -> ImportResult<String> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if file_name.starts_with("~$") {
        return Err(ImportError::LockedFile(path.display().to_string()));
    }

    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    Ok(ext)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 字节流解码：UTF-8（去 BOM）优先，失败回退 GBK
    fn decode(bytes: &[u8]) -> String {
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(body) {
            Ok(text) => text.to_string(),
            Err(_) => {
                let (text, _, had_errors) = encoding_rs::GBK.decode(body);
                if had_errors {
                    warn!("CSV 非 UTF-8 且 GBK 解码存在替换字符");
                } else {
                    debug!("CSV 使用 GBK 解码");
                }
                text.into_owned()
            }
        }
    }
}

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        precheck(file_path, &["csv"])?;

        let bytes = std::fs::read(file_path)?;
        let text = Self::decode(&bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = ParsedTable {
            headers,
            rows: Vec::new(),
        };

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            table.push_row(row_idx + 1, record.iter().map(|v| v.to_string()));
        }

        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        precheck(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut table = ParsedTable {
            headers,
            rows: Vec::new(),
        };

        for (row_idx, data_row) in rows.enumerate() {
            table.push_row(row_idx + 1, data_row.iter().map(|cell| cell.to_string()));
        }

        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedTable> {
        let path = file_path.as_ref();
        let ext = precheck(path, &["csv", "xlsx", "xls"])?;

        let table = match ext.as_str() {
            "csv" => CsvParser.parse(path)?,
            _ => ExcelParser.parse(path)?,
        };

        info!(
            file = %path.display(),
            columns = table.headers.len(),
            total_rows = table.rows.len(),
            "文件解析完成"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, Builder};

    fn csv_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = csv_file(" 商品名称 ,售价\n可乐,3.5\n雪碧,3.0\n".as_bytes());

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.headers, vec!["商品名称".to_string(), "售价".to_string()]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].values.get("商品名称"), Some(&"可乐".to_string()));
        assert_eq!(table.rows[1].row_number, 2);
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_keeps_numbering() {
        let file = csv_file("商品名称,售价\n可乐,3.5\n,\n雪碧,3.0\n".as_bytes());

        let table = CsvParser.parse(file.path()).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_gbk_fallback() {
        let (encoded, _, _) = encoding_rs::GBK.encode("商品名称,售价\n可乐,3.5\n");
        let file = csv_file(&encoded);

        let table = CsvParser.parse(file.path()).unwrap();
        assert_eq!(table.headers[0], "商品名称");
        assert_eq!(table.rows[0].values.get("商品名称"), Some(&"可乐".to_string()));
    }

    #[test]
    fn test_csv_parser_utf8_bom() {
        let file = csv_file("\u{feff}商品名称,售价\n可乐,3.5\n".as_bytes());
        let table = CsvParser.parse(file.path()).unwrap();
        assert_eq!(table.headers[0], "商品名称");
    }

    #[test]
    fn test_file_not_found() {
        let err = UniversalFileParser.parse("non_existent.csv").unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_lock_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("~$门店A.xlsx");
        std::fs::write(&path, b"lock").unwrap();

        let err = UniversalFileParser.parse(&path).unwrap_err();
        assert!(matches!(err, ImportError::LockedFile(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"a,b").unwrap();

        let err = UniversalFileParser.parse(&path).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
