//! 系統列管資料（試算表）的讀取
//!
//! xls / xlsx / xlsm / ods 以 calamine 讀取第一張工作表，csv 以 csv crate 讀取。
//! 標題列位置可設定（1 起算），標題列以上的列略過。

use crate::error::{ReconError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use fire_recon_common::reference::{FieldAliases, ReferenceRow};
use fire_recon_common::Field;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// 讀取列管資料
///
/// # Arguments
/// * `path` - 試算表或 CSV 檔
/// * `header_row` - 標題列（1 起算；0 視為 1）
pub fn load_reference_rows(path: &Path, header_row: usize) -> Result<Vec<ReferenceRow>> {
    if !path.exists() {
        return Err(ReconError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let records = if ext == "csv" {
        read_csv(path)?
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        read_spreadsheet(path)?
    } else {
        return Err(ReconError::UnsupportedFormat(path.display().to_string()));
    };

    let rows = rows_from_records(records, header_row);
    if rows.is_empty() {
        return Err(ReconError::Reference(format!("沒有資料列: {}", path.display())));
    }
    tracing::debug!("列管資料 {} 筆: {}", rows.len(), path.display());
    Ok(rows)
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(|v| v.trim().to_string()).collect());
    }
    Ok(records)
}

fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReconError::Reference(format!("沒有工作表: {}", path.display())))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // 電話、門牌等整數不要帶小數點
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// 原始列 → 以標題為鍵的資料列
///
/// 空白標題的欄位略過；標題重複時取第一欄；整列空白的資料列略過。
pub fn rows_from_records(records: Vec<Vec<String>>, header_row: usize) -> Vec<ReferenceRow> {
    let header_index = header_row.max(1) - 1;
    let mut iter = records.into_iter().skip(header_index);

    let headers: Vec<String> = match iter.next() {
        Some(headers) => headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect(),
        None => return Vec::new(),
    };

    iter.filter(|values| values.iter().any(|v| !v.trim().is_empty()))
        .map(|values| {
            let mut row = ReferenceRow::new();
            for (header, value) in headers.iter().zip(values) {
                if header.is_empty() {
                    continue;
                }
                row.entry(header.clone()).or_insert(value);
            }
            row
        })
        .collect()
}

/// 各列的場所名稱（互動選擇用）
pub fn site_names(rows: &[ReferenceRow], aliases: &FieldAliases) -> Vec<String> {
    rows.iter()
        .map(|row| {
            aliases
                .lookup(row, Field::SiteName)
                .unwrap_or("（無場所名稱）")
                .to_string()
        })
        .collect()
}
