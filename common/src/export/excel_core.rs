//! Excel 報表產生
//!
//! 擷取結果一覽與比對報告（摘要、明細兩張工作表）。

use rust_xlsxwriter::*;

use crate::diff::{ComparisonReport, MatchType};
use crate::normalizer::join_items;
use crate::types::ExtractedRecord;

/// 報表中的一份申報書
pub struct ReportEntry<'a> {
    /// 檔名或案件編號
    pub document: &'a str,
    pub report: &'a ComparisonReport,
}

struct Formats {
    header: Format,
    text: Format,
    percent: Format,
    ok: Format,
    ng: Format,
}

impl Formats {
    fn new() -> Self {
        let base = Format::new()
            .set_font_size(10.0)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Hair)
            .set_border_color(Color::RGB(0xCCCCCC));

        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(10.0)
                .set_font_color(Color::RGB(0x333333))
                .set_background_color(Color::RGB(0xF5F5F5))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(Color::RGB(0xAAAAAA)),
            text: base.clone().set_text_wrap(),
            percent: base.clone().set_num_format("0.0%"),
            ok: base.clone().set_font_color(Color::RGB(0x1B7F3B)),
            ng: base.set_bold().set_font_color(Color::RGB(0xC62828)),
        }
    }

    fn for_match(&self, match_type: &str) -> &Format {
        if match_type == MatchType::Exact.as_str() || match_type == MatchType::Similar.as_str() {
            &self.ok
        } else {
            &self.ng
        }
    }
}

fn write_header(worksheet: &mut Worksheet, headers: &[(&str, f64)], format: &Format) -> Result<(), String> {
    for (col, (title, width)) in headers.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *title, format)
            .map_err(|e| format!("標題寫入錯誤: {}", e))?;
        worksheet
            .set_column_width(col, *width)
            .map_err(|e| format!("欄寬設定錯誤: {}", e))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("凍結窗格設定錯誤: {}", e))?;
    Ok(())
}

/// 擷取結果一覽
///
/// # Arguments
/// * `records` - (檔名, 擷取結果)
/// * `generated_at` - 產生時間（寫在表格下方）
pub fn generate_extraction_buffer(
    records: &[(&str, &ExtractedRecord)],
    generated_at: &str,
) -> Result<Vec<u8>, String> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("擷取結果")
        .map_err(|e| format!("工作表名稱設定錯誤: {}", e))?;

    write_header(
        worksheet,
        &[
            ("檔案", 28.0),
            ("場所名稱", 24.0),
            ("場所地址", 36.0),
            ("管理權人", 14.0),
            ("場所電話", 16.0),
            ("消防設備種類", 48.0),
            ("設備來源頁", 12.0),
        ],
        &formats.header,
    )?;

    for (i, (document, record)) in records.iter().enumerate() {
        let row = i as u32 + 1;
        let pages = record
            .source_page_hints
            .iter()
            .map(|p| (p + 1).to_string())
            .collect::<Vec<_>>()
            .join(",");
        let cells = [
            document.to_string(),
            record.site_name.clone().unwrap_or_default(),
            record.address.clone().unwrap_or_default(),
            record.manager_name.clone().unwrap_or_default(),
            record.phone.clone().unwrap_or_default(),
            join_items(&record.equipment_list),
            pages,
        ];
        for (col, value) in cells.iter().enumerate() {
            worksheet
                .write_string_with_format(row, col as u16, value, &formats.text)
                .map_err(|e| format!("儲存格寫入錯誤: {}", e))?;
        }
    }

    let note_row = records.len() as u32 + 2;
    worksheet
        .write_string(note_row, 0, format!("產生時間: {}", generated_at))
        .map_err(|e| format!("儲存格寫入錯誤: {}", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel 儲存錯誤: {}", e))
}

/// 比對報告（摘要 + 明細）
pub fn generate_report_buffer(entries: &[ReportEntry<'_>], generated_at: &str) -> Result<Vec<u8>, String> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    // 摘要: 一份申報書一列
    let summary = workbook.add_worksheet();
    summary
        .set_name("摘要")
        .map_err(|e| format!("工作表名稱設定錯誤: {}", e))?;
    write_header(
        summary,
        &[("檔案", 28.0), ("結果", 10.0), ("相似度", 10.0), ("說明", 72.0)],
        &formats.header,
    )?;

    for (i, entry) in entries.iter().enumerate() {
        let row = i as u32 + 1;
        let (label, format) = if entry.report.overall_match {
            ("通過", &formats.ok)
        } else {
            ("待確認", &formats.ng)
        };
        summary
            .write_string_with_format(row, 0, entry.document, &formats.text)
            .and_then(|ws| ws.write_string_with_format(row, 1, label, format))
            .and_then(|ws| ws.write_number_with_format(row, 2, entry.report.overall_similarity, &formats.percent))
            .and_then(|ws| ws.write_string_with_format(row, 3, entry.report.summary(), &formats.text))
            .map_err(|e| format!("儲存格寫入錯誤: {}", e))?;
    }
    summary
        .write_string(entries.len() as u32 + 2, 0, format!("產生時間: {}", generated_at))
        .map_err(|e| format!("儲存格寫入錯誤: {}", e))?;

    // 明細: 每份申報書五列
    let detail = workbook.add_worksheet();
    detail
        .set_name("明細")
        .map_err(|e| format!("工作表名稱設定錯誤: {}", e))?;
    write_header(
        detail,
        &[
            ("檔案", 28.0),
            ("欄位", 14.0),
            ("申報資料", 36.0),
            ("系統資料", 36.0),
            ("比對結果", 12.0),
            ("相似度", 10.0),
            ("說明", 48.0),
        ],
        &formats.header,
    )?;

    let mut row: u32 = 1;
    for entry in entries {
        for flat in entry.report.flat_records() {
            detail
                .write_string_with_format(row, 0, entry.document, &formats.text)
                .and_then(|ws| ws.write_string_with_format(row, 1, &flat.field_name, &formats.text))
                .and_then(|ws| ws.write_string_with_format(row, 2, &flat.extracted_value, &formats.text))
                .and_then(|ws| ws.write_string_with_format(row, 3, &flat.reference_value, &formats.text))
                .and_then(|ws| ws.write_string_with_format(row, 4, &flat.match_type, formats.for_match(&flat.match_type)))
                .and_then(|ws| ws.write_number_with_format(row, 5, flat.similarity, &formats.percent))
                .and_then(|ws| ws.write_string_with_format(row, 6, &flat.details, &formats.text))
                .map_err(|e| format!("儲存格寫入錯誤: {}", e))?;
            row += 1;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel 儲存錯誤: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compare, CompareOptions};
    use crate::reference::ReferenceRecord;

    #[test]
    fn test_generate_extraction_buffer() {
        let record = ExtractedRecord {
            site_name: Some("鳳仙旅店".to_string()),
            equipment_list: vec!["滅火器".to_string()],
            source_page_hints: vec![1],
            ..Default::default()
        };
        let buffer = generate_extraction_buffer(&[("a.json", &record)], "2024-01-01 00:00").unwrap();
        // xlsx 為 zip 格式
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_generate_report_buffer() {
        let extracted = ExtractedRecord {
            site_name: Some("鳳仙旅店".to_string()),
            ..Default::default()
        };
        let reference = ReferenceRecord {
            site_name: Some("鳳仙旅店".to_string()),
            equipment_list: vec!["滅火器".to_string()],
            ..Default::default()
        };
        let report = compare(&extracted, &reference, &CompareOptions::default());
        let entries = [ReportEntry { document: "a.json", report: &report }];
        let buffer = generate_report_buffer(&entries, "2024-01-01 00:00").unwrap();
        assert_eq!(&buffer[..2], b"PK");
    }
}
