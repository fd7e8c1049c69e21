//! 申報書附件完整性檢查
//!
//! 每頁依頁首文字判定文件類型，再對照目錄上要求的附件，
//! 找出缺少的頁面。

use serde::{Deserialize, Serialize};

use crate::normalizer::clean_text;
use crate::vision::UNKNOWN_PAGE;

/// 無法對應任何關鍵字時的頁面名稱
pub const OTHER_DOCUMENT: &str = "其他文件";

/// 頁首判讀的字數
const HEADER_CHARS: usize = 30;

/// 頁首關鍵字 → 文件名稱（依序比對，先命中者為準）
pub const PAGE_KEYWORDS: &[(&str, &str)] = &[
    ("目錄", "目錄"),
    ("檢修申報表", "消防安全設備檢修申報表"),
    ("檢修報告書", "消防安全設備檢修報告書"),
    ("改善計畫書", "消防安全設備改善計畫書"),
    ("種類及數量表", "消防安全設備種類及數量表"),
    ("滅火器", "滅火器檢查表"),
    ("室內消防栓", "室內消防栓設備檢查表"),
    ("自動撒水", "自動撒水設備檢查表"),
    ("泡沫", "泡沫滅火設備檢查表"),
    ("火警自動警報", "火警自動警報設備檢查表"),
    ("緊急廣播", "緊急廣播設備檢查表"),
    ("標示設備", "標示設備檢查表"),
    ("避難設備", "避難設備檢查表"),
    ("緊急照明", "緊急照明設備檢查表"),
    ("連結送水管", "連結送水管檢查表"),
    ("排煙", "排煙設備檢查表"),
    ("無線電", "無線電通信輔助設備檢查表"),
    ("使用執照", "建築物使用執照影本"),
    ("營利事業", "營利事業登記證影本"),
    ("開業證書", "專業機構合格證書影本"),
    ("設備師", "消防設備師(士)證書影本"),
    ("身分證", "管理權人身分證影本"),
];

/// 目錄頁的頁面名稱關鍵字
const TOC_LABEL_KEYWORDS: &[&str] = &["目錄", "檢修項目", "申報項目", "清單"];

/// 依頁首文字判定文件類型
///
/// # Arguments
/// * `header_text` - 頁面 OCR 文字（只看去除空白後的前 30 字）
pub fn identify_page_type(header_text: &str) -> String {
    let cleaned = clean_text(header_text);
    if cleaned.is_empty() {
        return UNKNOWN_PAGE.to_string();
    }

    let header: String = cleaned.chars().take(HEADER_CHARS).collect();
    PAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| header.contains(keyword))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| OTHER_DOCUMENT.to_string())
}

/// 頁面名稱是否代表目錄頁
pub fn is_toc_label(label: &str) -> bool {
    TOC_LABEL_KEYWORDS.iter().any(|k| label.contains(k))
}

/// 單一附件的檢查結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentStatus {
    pub item: String,
    /// 對應的頁面（0 起算）
    pub pages: Vec<usize>,
    pub present: bool,
}

/// 對照要求的附件與各頁名稱
///
/// 頁面名稱包含附件名稱、或附件名稱包含頁面名稱，皆視為對應。
/// 空白頁面名稱不參與比對。
pub fn check_attachments(required_items: &[String], page_labels: &[String]) -> Vec<AttachmentStatus> {
    required_items
        .iter()
        .map(|item| {
            let pages: Vec<usize> = page_labels
                .iter()
                .enumerate()
                .filter(|(_, label)| {
                    let label = label.trim();
                    !label.is_empty() && (label.contains(item.as_str()) || item.contains(label))
                })
                .map(|(i, _)| i)
                .collect();
            AttachmentStatus {
                item: item.clone(),
                present: !pages.is_empty(),
                pages,
            }
        })
        .collect()
}

/// 缺少的附件
pub fn missing_attachments(statuses: &[AttachmentStatus]) -> Vec<&str> {
    statuses
        .iter()
        .filter(|s| !s.present)
        .map(|s| s.item.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identify_page_type() {
        assert_eq!(identify_page_type("消防安全設備檢修申報書 目錄"), "目錄");
        assert_eq!(identify_page_type("滅 火 器 檢 查 表\n1. 外觀"), "滅火器檢查表");
        assert_eq!(identify_page_type("室內消防栓設備檢查表"), "室內消防栓設備檢查表");
        assert_eq!(identify_page_type("管理權人身分證 正面"), "管理權人身分證影本");
    }

    #[test]
    fn test_identify_page_type_only_reads_header() {
        let text = format!("{}排煙", "一".repeat(40));
        assert_eq!(identify_page_type(&text), OTHER_DOCUMENT);
    }

    #[test]
    fn test_identify_page_type_empty() {
        assert_eq!(identify_page_type(""), UNKNOWN_PAGE);
        assert_eq!(identify_page_type(" \n\u{3000}"), UNKNOWN_PAGE);
        assert_eq!(identify_page_type("其他說明"), OTHER_DOCUMENT);
    }

    #[test]
    fn test_is_toc_label() {
        assert!(is_toc_label("目錄"));
        assert!(is_toc_label("申報項目清單"));
        assert!(!is_toc_label("滅火器檢查表"));
    }

    #[test]
    fn test_check_attachments() {
        let required = strings(&["滅火器檢查表", "標示設備檢查表", "排煙設備檢查表"]);
        let labels = strings(&["目錄", "滅火器檢查表", "", "標示設備檢查表(續)", "滅火器"]);
        let statuses = check_attachments(&required, &labels);

        assert_eq!(statuses[0].pages, vec![1, 4]);
        assert!(statuses[0].present);
        assert_eq!(statuses[1].pages, vec![3]);
        assert!(!statuses[2].present);
        assert_eq!(missing_attachments(&statuses), vec!["排煙設備檢查表"]);
    }

    #[test]
    fn test_check_attachments_no_pages() {
        let required = strings(&["滅火器檢查表"]);
        let statuses = check_attachments(&required, &[]);
        assert!(!statuses[0].present);
        assert!(statuses[0].pages.is_empty());
    }
}
