//! 列管資料的互動選擇
//!
//! 場所名稱自動對應失敗時，列出列管資料的場所名稱讓使用者選擇。

use crate::error::{ReconError, Result};
use crate::pipeline::DocumentResult;
use dialoguer::Select;

/// 選單最後一項（不比對）
pub const SKIP_LABEL: &str = "（略過，不比對）";

/// 選單項目：列管資料的場所名稱，最後加上略過
pub fn menu_items(site_names: &[String]) -> Vec<String> {
    site_names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>3}) {}", i + 1, name))
        .chain(std::iter::once(SKIP_LABEL.to_string()))
        .collect()
}

/// 選單的選擇位置 → 列管資料列（略過時為 `None`）
pub fn selection_to_row(selection: Option<usize>, row_count: usize) -> Option<usize> {
    selection.filter(|i| *i < row_count)
}

/// 讓使用者為申報書選擇對應的列管資料列
///
/// # Arguments
/// * `document` - 自動對應失敗的申報書
/// * `site_names` - 列管資料各列的場所名稱
pub fn select_reference_row(document: &DocumentResult, site_names: &[String]) -> Result<Option<usize>> {
    if site_names.is_empty() {
        return Ok(None);
    }

    let extracted = document.record.site_name.as_deref().unwrap_or("（未判讀）");
    println!("\n⚠ {}: 找不到場所名稱「{}」", document.file_name, extracted);

    let items = menu_items(site_names);
    let selection = Select::new()
        .with_prompt("請選擇對應的列管資料")
        .items(&items)
        .default(items.len() - 1)
        .interact_opt()
        .map_err(|e| ReconError::Prompt(e.to_string()))?;

    Ok(selection_to_row(selection, site_names.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_items() {
        let items = menu_items(&["鳳仙旅店".to_string(), "臺東大飯店".to_string()]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], "  1) 鳳仙旅店");
        assert_eq!(items[2], SKIP_LABEL);
    }

    #[test]
    fn test_selection_to_row() {
        assert_eq!(selection_to_row(Some(1), 2), Some(1));
        // 略過與取消
        assert_eq!(selection_to_row(Some(2), 2), None);
        assert_eq!(selection_to_row(None, 2), None);
    }

    #[test]
    fn test_no_rows_skips_prompt() {
        let document = DocumentResult::default();
        assert_eq!(select_reference_row(&document, &[]).unwrap(), None);
    }
}
