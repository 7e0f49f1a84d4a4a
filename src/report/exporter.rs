// ==========================================
// O2O 门店商品分析 - Excel 报表导出
// ==========================================
// 职责: SheetTable → xlsx（umya-spreadsheet）
// 先写同目录临时文件再替换；目标被占用时改写为带时间戳的新文件名
// ==========================================

use crate::engine::StoreRun;
use crate::report::error::{ReportError, ReportResult};
use crate::report::formats::resolve_number_formats;
use crate::report::sheets::build_workbook_tables;
use crate::report::table::{CellValue, SheetTable};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// 带时间戳的备用文件名: 报告_20260101_120000.xlsx
fn timestamped_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "门店分析报告".to_string());
    let suffix = Local::now().format("%Y%m%d_%H%M%S");
    path.with_file_name(format!("{}_{}.xlsx", stem, suffix))
}

/// Office 锁文件（~$报告.xlsx）
fn lock_sibling(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy();
    Some(path.with_file_name(format!("~${}", name)))
}

/// 同目录临时文件: .报告.xlsx.tmp
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "门店分析报告.xlsx".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// 决定实际写入路径（不改动已有文件）
///
/// # 规则
/// - 存在 Office 锁文件: 追加 `_YYYYMMDD_HHMMSS`
/// - 其余情况: 原路径，旧文件在新报表写成后才被替换
pub fn resolve_output_path(path: &Path) -> ReportResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if path.exists() && lock_sibling(path).is_some_and(|lock| lock.exists()) {
        let alt = timestamped_path(path);
        warn!(target_path = %path.display(), alt_path = %alt.display(), "目标文件被打开，改用新文件名");
        return Ok(alt);
    }

    Ok(path.to_path_buf())
}

/// 先写临时文件，成功后替换目标
///
/// # 参数
/// - target: 目标路径
/// - write: 向给定路径写出完整文件
///
/// # 返回
/// 实际落盘的路径；目标无法替换时为带时间戳的新文件
pub fn write_then_replace<F>(target: &Path, write: F) -> ReportResult<PathBuf>
where
    F: Fn(&Path) -> ReportResult<()>,
{
    let tmp = temp_sibling(target);
    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    match fs::rename(&tmp, target) {
        Ok(()) => Ok(target.to_path_buf()),
        Err(e) => {
            let alt = timestamped_path(target);
            warn!(target_path = %target.display(), alt_path = %alt.display(), error = %e, "旧文件无法覆盖，改用新文件名");
            fs::rename(&tmp, &alt).map_err(|e| {
                let _ = fs::remove_file(&tmp);
                ReportError::from(e)
            })?;
            Ok(alt)
        }
    }
}

fn write_sheet(ws: &mut Worksheet, table: &SheetTable) {
    for (i, header) in table.headers.iter().enumerate() {
        let col = i as u32 + 1;
        ws.get_cell_mut((col, 1)).set_value(header.clone());
        ws.get_style_mut((col, 1)).get_font_mut().set_bold(true);
    }

    let formats = resolve_number_formats(table);
    for (r, row) in table.rows.iter().enumerate() {
        let row_no = r as u32 + 2;
        for (i, value) in row.iter().enumerate() {
            let col = i as u32 + 1;
            match value {
                CellValue::Int(v) => {
                    ws.get_cell_mut((col, row_no)).set_value_number(*v as f64);
                }
                CellValue::Float(v) => {
                    ws.get_cell_mut((col, row_no)).set_value_number(*v);
                }
                CellValue::Text(s) => {
                    ws.get_cell_mut((col, row_no)).set_value(s.clone());
                    continue;
                }
                CellValue::Empty => continue,
            }
            if let Some(Some(fmt)) = formats.get(i) {
                ws.get_style_mut((col, row_no))
                    .get_number_format_mut()
                    .set_format_code(fmt.code());
            }
        }
    }
}

fn build_book(tables: &[SheetTable]) -> ReportResult<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for table in tables {
        let ws = book
            .new_sheet(&table.name)
            .map_err(|e| ReportError::Sheet(format!("{}: {}", table.name, e)))?;
        write_sheet(ws, table);
    }
    Ok(book)
}

// ==========================================
// ReportExporter
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportExporter;

impl ReportExporter {
    pub fn new() -> Self {
        Self
    }

    /// 导出多门店报表
    ///
    /// # 参数
    /// - runs: 门店分析结果（按传入顺序写入各表）
    /// - path: 目标 xlsx 路径
    ///
    /// # 返回
    /// 实际写入的路径（可能带时间戳后缀）
    #[instrument(skip(self, runs, path), fields(stores = runs.len(), target = %path.display()))]
    pub fn export(&self, runs: &[&StoreRun], path: &Path) -> ReportResult<PathBuf> {
        if runs.is_empty() {
            return Err(ReportError::NoResults);
        }

        let tables = build_workbook_tables(runs);
        let book = build_book(&tables)?;

        let target = resolve_output_path(path)?;
        let written = write_then_replace(&target, |tmp| {
            umya_spreadsheet::writer::xlsx::write(&book, tmp).map_err(|e| ReportError::Xlsx(e.to_string()))
        })?;

        info!(sheets = tables.len(), written = %written.display(), "报表导出完成");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_output_path_new_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("报告.xlsx");

        let resolved = resolve_output_path(&target).unwrap();
        assert_eq!(resolved, target);
        assert!(target.parent().unwrap().exists());
    }

    #[test]
    fn test_resolve_output_path_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("报告.xlsx");
        fs::write(&target, b"old").unwrap();

        let resolved = resolve_output_path(&target).unwrap();
        assert_eq!(resolved, target);
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_failed_write_keeps_existing_report() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("报告.xlsx");
        fs::write(&target, b"old").unwrap();

        let result = write_then_replace(&target, |tmp| {
            fs::write(tmp, b"partial")?;
            Err(ReportError::Xlsx("磁盘已满".to_string()))
        });

        assert!(matches!(result, Err(ReportError::Xlsx(_))));
        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(!temp_sibling(&target).exists());
    }

    #[test]
    fn test_successful_write_replaces_existing_report() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("报告.xlsx");
        fs::write(&target, b"old").unwrap();

        let written = write_then_replace(&target, |tmp| Ok(fs::write(tmp, b"new")?)).unwrap();

        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!temp_sibling(&target).exists());
    }

    #[test]
    fn test_resolve_output_path_locked_gets_timestamp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("报告.xlsx");
        fs::write(&target, b"old").unwrap();
        fs::write(dir.path().join("~$报告.xlsx"), b"lock").unwrap();

        let resolved = resolve_output_path(&target).unwrap();
        assert_ne!(resolved, target);
        let name = resolved.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("报告_"));
        assert!(name.ends_with(".xlsx"));
        // 原文件保持不动
        assert!(target.exists());
    }

    #[test]
    fn test_export_without_runs() {
        let dir = TempDir::new().unwrap();
        let result = ReportExporter::new().export(&[], &dir.path().join("x.xlsx"));
        assert!(matches!(result, Err(ReportError::NoResults)));
    }
}
