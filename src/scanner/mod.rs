//! 申報書 OCR 結果的讀取
//!
//! 支援兩種格式:
//! - `.json`: `{ "pages": [...], "page_labels": [...], "vision_checked_items": [...], "vision_response": "..." }`
//! - `.txt`: tesseract 輸出，頁與頁之間以換頁字元（`\x0C`）分隔

use crate::error::{ReconError, Result};
use fire_recon_common::integrity::identify_page_type;
use fire_recon_common::vision::{parse_checked_items, parse_page_label};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 本工具輸出檔的檔名前綴（掃描時略過）
pub const OUTPUT_PREFIX: &str = "fire-recon-";

const PAGE_SEPARATOR: char = '\u{000C}';

const DOCUMENT_EXTENSIONS: &[&str] = &["json", "txt"];

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub file_name: String,
}

impl DocumentInfo {
    pub fn from_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

/// 單份申報書的 OCR 結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrDocument {
    /// 各頁 OCR 文字（依頁序）
    #[serde(default)]
    pub pages: Vec<String>,

    /// 各頁的文件類型（頁面分類結果）
    #[serde(default)]
    pub page_labels: Vec<String>,

    /// 視覺模型判定的勾選項目
    #[serde(default)]
    pub vision_checked_items: Option<Vec<String>>,

    /// 視覺模型的原始回應（`vision_checked_items` 未提供時解析）
    #[serde(default)]
    pub vision_response: Option<String>,
}

impl OcrDocument {
    /// 由 tesseract 文字輸出建立
    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<String> = text.split(PAGE_SEPARATOR).map(str::to_string).collect();
        // 去掉最後一頁之後的空白頁
        if pages.len() > 1 && pages.last().map_or(false, |p| p.trim().is_empty()) {
            pages.pop();
        }
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn page_one(&self) -> &str {
        self.pages.first().map(String::as_str).unwrap_or("")
    }

    /// 視覺模型的勾選結果
    ///
    /// 回應無法解析時視為沒有結果（記錄警告，不中斷）。
    pub fn vision_items(&self) -> Option<Vec<String>> {
        if let Some(items) = &self.vision_checked_items {
            return Some(items.clone());
        }
        let response = self.vision_response.as_deref()?;
        match parse_checked_items(response) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!("視覺模型回應無法解析，改用文字規則: {}", e);
                None
            }
        }
    }

    /// 各頁的文件類型（未提供時由頁首文字判定）
    ///
    /// 提供的名稱是頁面分類模型的回應，去除引號，空白視為未知頁面。
    pub fn labels(&self) -> Vec<String> {
        if self.page_labels.len() == self.pages.len() && !self.page_labels.is_empty() {
            return self.page_labels.iter().map(|label| parse_page_label(label)).collect();
        }
        self.pages.iter().map(|p| identify_page_type(p)).collect()
    }
}

pub fn is_document_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    DOCUMENT_EXTENSIONS.contains(&ext.as_str())
}

/// 讀取單份申報書
pub fn load_document(path: &Path) -> Result<OcrDocument> {
    if !path.exists() {
        return Err(ReconError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;

    match ext.as_str() {
        "json" => serde_json::from_str(&content)
            .map_err(|e| ReconError::DocumentLoad(format!("{}: {}", path.display(), e))),
        "txt" => Ok(OcrDocument::from_text(&content)),
        _ => Err(ReconError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn scan_folder(folder: &Path) -> Result<Vec<DocumentInfo>> {
    if !folder.exists() {
        return Err(ReconError::FolderNotFound(folder.display().to_string()));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 只掃描第一層
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let info = DocumentInfo::from_path(path);
        // 隱藏檔（快取）與本工具的輸出
        if info.file_name.starts_with('.') || info.file_name.starts_with(OUTPUT_PREFIX) {
            continue;
        }

        if let Some(ext) = path.extension() {
            if is_document_extension(&ext.to_string_lossy()) {
                documents.push(info);
            }
        }
    }

    // 依檔名排序
    documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(documents)
}

/// 檔案或資料夾 → 申報書清單
pub fn collect_documents(input: &Path) -> Result<Vec<DocumentInfo>> {
    if input.is_file() {
        return Ok(vec![DocumentInfo::from_path(input)]);
    }

    let documents = scan_folder(input)?;
    if documents.is_empty() {
        return Err(ReconError::NoDocumentsFound(input.display().to_string()));
    }
    Ok(documents)
}

/// 快取與輸出的預設位置
pub fn working_folder(input: &Path) -> PathBuf {
    if input.is_file() {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        input.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_document_extension() {
        assert!(is_document_extension("json"));
        assert!(is_document_extension("TXT"));
        assert!(!is_document_extension("pdf"));
        assert!(!is_document_extension("xlsx"));
    }

    #[test]
    fn test_from_text_splits_pages() {
        let doc = OcrDocument::from_text("第一頁\u{000C}第二頁\u{000C}");
        assert_eq!(doc.pages, vec!["第一頁", "第二頁"]);
        assert_eq!(doc.page_one(), "第一頁");
    }

    #[test]
    fn test_from_text_single_page() {
        let doc = OcrDocument::from_text("");
        assert_eq!(doc.pages, vec![""]);
        assert_eq!(doc.page_one(), "");
    }

    #[test]
    fn test_vision_items() {
        let doc = OcrDocument {
            vision_response: Some("```json\n[\"滅火器\"]\n```".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.vision_items(), Some(vec!["滅火器".to_string()]));

        let doc = OcrDocument {
            vision_response: Some("看不清楚".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.vision_items(), None);

        let doc = OcrDocument {
            vision_checked_items: Some(vec![]),
            vision_response: Some("[\"滅火器\"]".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.vision_items(), Some(vec![]));
    }

    #[test]
    fn test_labels_derived_when_missing() {
        let doc = OcrDocument {
            pages: vec!["檢修申報表".to_string(), "滅火器檢查表".to_string()],
            ..Default::default()
        };
        assert_eq!(doc.labels(), vec!["消防安全設備檢修申報表", "滅火器檢查表"]);
    }

    #[test]
    fn test_provided_labels_cleaned() {
        let doc = OcrDocument {
            pages: vec!["a".to_string(), "b".to_string()],
            page_labels: vec!["「目錄」".to_string(), "  ".to_string()],
            ..Default::default()
        };
        assert_eq!(doc.labels(), vec!["目錄", "未知頁面"]);
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.TXT"), "text").unwrap();
        fs::write(dir.path().join("c.pdf"), "pdf").unwrap();
        fs::write(dir.path().join(".fire-recon-cache.json"), "{}").unwrap();
        fs::write(dir.path().join("fire-recon-extract.json"), "[]").unwrap();

        let result = scan_folder(dir.path()).unwrap();
        let names: Vec<&str> = result.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.TXT", "b.json"]);
    }

    #[test]
    fn test_load_document() {
        let dir = tempdir().expect("Failed to create temp dir");
        let json_path = dir.path().join("doc.json");
        fs::write(&json_path, r#"{"pages": ["場所名稱:鳳仙旅店", "目錄"]}"#).unwrap();
        let doc = load_document(&json_path).unwrap();
        assert_eq!(doc.pages.len(), 2);

        let bad_path = dir.path().join("bad.json");
        fs::write(&bad_path, "not json").unwrap();
        assert!(matches!(load_document(&bad_path), Err(ReconError::DocumentLoad(_))));

        assert!(matches!(
            load_document(&dir.path().join("missing.json")),
            Err(ReconError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_collect_documents_empty_folder() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(
            collect_documents(dir.path()),
            Err(ReconError::NoDocumentsFound(_))
        ));
    }
}
