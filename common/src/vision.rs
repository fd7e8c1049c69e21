//! 視覺模型回應解析
//!
//! 視覺模型（勾選項目偵測、頁面分類）的回應常夾雜說明文字或 Markdown，
//! 這裡只負責從中取出結構化結果；模型呼叫本身在外部。

use crate::error::{Error, Result};

/// 無法判斷時的頁面名稱
pub const UNKNOWN_PAGE: &str = "未知頁面";

/// 從回應中取出 JSON 陣列
///
/// 抽取優先順序:
/// 1. ```json ... ``` 區塊
/// 2. 第一個 `[` 到最後一個 `]`
///
/// # Examples
/// ```
/// use fire_recon_common::vision::extract_json_array;
///
/// let response = "勾選項目如下：[\"滅火器\"]";
/// assert_eq!(extract_json_array(response), Some("[\"滅火器\"]"));
/// ```
pub fn extract_json_array(response: &str) -> Option<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + "```json".len();
        if let Some(end_offset) = response[start..].find("```") {
            let block = response[start..start + end_offset].trim();
            if block.starts_with('[') {
                return Some(block);
            }
        }
    }

    let start = response.find('[')?;
    let end = response.rfind(']')?;
    (end > start).then(|| &response[start..=end])
}

/// 勾選項目偵測的回應 → 項目名稱（未正規化）
pub fn parse_checked_items(response: &str) -> Result<Vec<String>> {
    let json = extract_json_array(response)
        .ok_or_else(|| Error::Parse("回應中找不到 JSON 陣列".into()))?;
    let items: Vec<String> = serde_json::from_str(json)?;

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// 頁面分類的回應 → 頁面名稱
pub fn parse_page_label(response: &str) -> String {
    let label = response
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '「' | '」' | '`'))
        .trim();
    if label.is_empty() {
        UNKNOWN_PAGE.to_string()
    } else {
        label.to_string()
    }
}
