// ==========================================
// O2O 门店商品分析 - 报表表格模型
// ==========================================
// 职责: 与 xlsx 写入解耦的工作表数据（表头 + 单元格）
// ==========================================

/// 单元格取值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn count(v: usize) -> Self {
        CellValue::Int(v as i64)
    }

    pub fn text(v: impl Into<String>) -> Self {
        CellValue::Text(v.into())
    }

    pub fn opt_text(v: Option<&str>) -> Self {
        v.map(CellValue::text).unwrap_or(CellValue::Empty)
    }

    pub fn opt_float(v: Option<f64>) -> Self {
        v.map(CellValue::Float).unwrap_or(CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// 一张工作表
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn new(name: &str, headers: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.headers.len(), "列数与表头不一致: {}", self.name);
        self.rows.push(row);
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// 某列的全部取值
    pub fn column(&self, header: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(header)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}

/// 表头构造辅助
pub fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
