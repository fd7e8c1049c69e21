//! CSV 匯出
//!
//! Excel 開啟 UTF-8 CSV 時需要 BOM，否則中文會亂碼。

use crate::error::Result;
use crate::pipeline::{ComparisonOutcome, DocumentResult};
use fire_recon_common::join_items;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn writer(path: &Path) -> Result<::csv::Writer<BufWriter<File>>> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;
    Ok(::csv::Writer::from_writer(file))
}

/// 擷取結果一覽（一份申報書一列）
pub fn write_extraction_csv(results: &[DocumentResult], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["檔案", "場所名稱", "場所地址", "管理權人", "場所電話", "消防設備種類", "缺少附件", "錯誤"])?;

    for result in results {
        let record = &result.record;
        wtr.write_record([
            result.file_name.as_str(),
            record.site_name.as_deref().unwrap_or(""),
            record.address.as_deref().unwrap_or(""),
            record.manager_name.as_deref().unwrap_or(""),
            record.phone.as_deref().unwrap_or(""),
            join_items(&record.equipment_list).as_str(),
            result.missing_attachments().join("、").as_str(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// 比對明細（一份申報書五列）
pub fn write_comparison_csv(outcomes: &[ComparisonOutcome], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["檔案", "欄位", "申報資料", "系統資料", "比對結果", "相似度", "說明"])?;

    for outcome in outcomes {
        let Some(report) = &outcome.report else {
            wtr.write_record([outcome.file_name.as_str(), "", "", "", "", "", "找不到對應的列管資料"])?;
            continue;
        };
        for flat in report.flat_records() {
            wtr.write_record([
                outcome.file_name.as_str(),
                flat.field_name.as_str(),
                flat.extracted_value.as_str(),
                flat.reference_value.as_str(),
                flat.match_type.as_str(),
                format!("{:.4}", flat.similarity).as_str(),
                flat.details.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
