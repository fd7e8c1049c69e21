//! 結果匯出（JSON / CSV / Excel）

pub mod csv;
pub mod excel;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::pipeline::{ComparisonOutcome, DocumentResult};
use crate::scanner::OUTPUT_PREFIX;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 產生時間（報表標示用）
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T: Serialize> {
    generated_at: &'a str,
    documents: &'a [T],
}

/// 輸出檔路徑
///
/// `output` 為資料夾（或沒有副檔名）時以 `fire-recon-{kind}.{ext}` 放在其下；
/// 指定檔名時沿用其主檔名，只換副檔名。
pub fn output_path_for_format(output: &Path, kind: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}{}.{}", OUTPUT_PREFIX, kind, extension))
    } else {
        output.with_extension(extension)
    }
}

fn write_json<T: Serialize>(items: &[T], path: &Path, generated_at: &str) -> Result<()> {
    let envelope = Envelope {
        generated_at,
        documents: items,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn formats(format: &OutputFormat) -> Vec<&'static str> {
    match format {
        OutputFormat::Json => vec!["json"],
        OutputFormat::Csv => vec!["csv"],
        OutputFormat::Excel => vec!["xlsx"],
        OutputFormat::All => vec!["json", "csv", "xlsx"],
    }
}

/// 擷取結果的匯出
pub fn export_extraction(results: &[DocumentResult], format: &OutputFormat, output: &Path) -> Result<Vec<PathBuf>> {
    let generated_at = timestamp();
    let mut written = Vec::new();

    for extension in formats(format) {
        let path = output_path_for_format(output, "extract", extension);
        match extension {
            "json" => write_json(results, &path, &generated_at)?,
            "csv" => csv::write_extraction_csv(results, &path)?,
            _ => excel::write_extraction_excel(results, &path, &generated_at)?,
        }
        written.push(path);
    }

    Ok(written)
}

/// 比對結果的匯出
pub fn export_comparison(outcomes: &[ComparisonOutcome], format: &OutputFormat, output: &Path) -> Result<Vec<PathBuf>> {
    let generated_at = timestamp();
    let mut written = Vec::new();

    for extension in formats(format) {
        let path = output_path_for_format(output, "compare", extension);
        match extension {
            "json" => write_json(outcomes, &path, &generated_at)?,
            "csv" => csv::write_comparison_csv(outcomes, &path)?,
            _ => excel::write_comparison_excel(outcomes, &path, &generated_at)?,
        }
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_format() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert_eq!(
            output_path_for_format(dir.path(), "extract", "json"),
            dir.path().join("fire-recon-extract.json")
        );
        assert_eq!(
            output_path_for_format(&dir.path().join("report.json"), "compare", "xlsx"),
            dir.path().join("report.xlsx")
        );
    }
}
