//! Excel 匯出

use crate::error::{ReconError, Result};
use crate::pipeline::{ComparisonOutcome, DocumentResult};
use fire_recon_common::export::excel_core::{generate_extraction_buffer, generate_report_buffer, ReportEntry};
use std::path::Path;

pub fn write_extraction_excel(results: &[DocumentResult], output_path: &Path, generated_at: &str) -> Result<()> {
    let records: Vec<(&str, &fire_recon_common::ExtractedRecord)> = results
        .iter()
        .map(|r| (r.file_name.as_str(), &r.record))
        .collect();

    let buffer = generate_extraction_buffer(&records, generated_at).map_err(ReconError::ExcelGeneration)?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}

/// 對應不到列管資料的申報書不列入報表
pub fn write_comparison_excel(outcomes: &[ComparisonOutcome], output_path: &Path, generated_at: &str) -> Result<()> {
    let entries: Vec<ReportEntry<'_>> = outcomes
        .iter()
        .filter_map(|o| {
            o.report.as_ref().map(|report| ReportEntry {
                document: o.file_name.as_str(),
                report,
            })
        })
        .collect();

    let buffer = generate_report_buffer(&entries, generated_at).map_err(ReconError::ExcelGeneration)?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}
