//! 批次處理
//!
//! ## 處理流程
//! 1. 讀取各申報書（JSON / 文字）
//! 2. 擷取基本資料與設備清單（可改用目錄頁勾選判定）
//! 3. 對照附件頁面
//! 4. 與列管資料比對
//!
//! 申報書之間互不相依，以 rayon 平行處理；
//! 單份讀取失敗時以全部欄位空白的結果代替，不中斷整批處理。

use crate::cache::CacheFile;
use crate::config::Config;
use crate::error::Result;
use crate::scanner::{load_document, DocumentInfo, OcrDocument};
use fire_recon_common::checked::{collect_evidence, resolve_checked, CheckedPolicy, CheckedResolution, CheckedSource};
use fire_recon_common::diff::{compare, CompareOptions, ComparisonReport};
use fire_recon_common::integrity::{check_attachments, AttachmentStatus};
use fire_recon_common::reference::{find_reference_row, FieldAliases, ReferenceRecord, ReferenceRow};
use fire_recon_common::{ControlledVocabulary, ExtractedRecord, FieldExtractor, TocStrategy};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設備清單的來源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentSource {
    /// 目錄頁「消防安全設備檢查表」之後列出的全部項目
    #[default]
    Listed,
    /// 只取有勾選證據的項目
    Checked,
}

impl std::str::FromStr for EquipmentSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listed" | "list" => Ok(EquipmentSource::Listed),
            "checked" | "check" => Ok(EquipmentSource::Checked),
            _ => Err(format!("Unknown equipment source: {}. Use listed or checked", s)),
        }
    }
}

impl std::fmt::Display for EquipmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquipmentSource::Listed => write!(f, "listed"),
            EquipmentSource::Checked => write!(f, "checked"),
        }
    }
}

/// 擷取設定
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub vocabulary: ControlledVocabulary,
    pub toc_strategy: TocStrategy,
    pub checked_policy: CheckedPolicy,
    pub equipment_source: EquipmentSource,
}

impl ExtractionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            vocabulary: config.vocabulary(),
            toc_strategy: config.toc_strategy,
            checked_policy: config.checked_policy,
            equipment_source: config.equipment_source,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 單份申報書的處理結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    pub file_name: String,
    pub record: ExtractedRecord,
    /// 勾選判定（設備來源為 checked 時）
    #[serde(default)]
    pub checked: Option<CheckedResolution>,
    /// 目錄頁的頁碼（0 起算）
    #[serde(default)]
    pub toc_page: Option<usize>,
    #[serde(default)]
    pub attachments: Vec<AttachmentStatus>,
    /// 讀取失敗時的訊息（此時 record 全部欄位空白）
    #[serde(default)]
    pub error: Option<String>,
}

impl DocumentResult {
    pub fn failed(file_name: &str, message: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            error: Some(message),
            ..Default::default()
        }
    }

    pub fn missing_attachments(&self) -> Vec<&str> {
        self.attachments
            .iter()
            .filter(|a| !a.present)
            .map(|a| a.item.as_str())
            .collect()
    }
}

/// 單份申報書的擷取
pub fn extract_document(file_name: &str, doc: &OcrDocument, settings: &ExtractionSettings) -> DocumentResult {
    let extractor = FieldExtractor::new(&settings.vocabulary).with_toc_strategy(settings.toc_strategy);
    let mut record = extractor.extract(doc.page_one(), &doc.pages);
    let toc_page = extractor.locate_toc_page(&doc.pages);

    let checked = match settings.equipment_source {
        EquipmentSource::Listed => None,
        EquipmentSource::Checked => {
            let toc_text = toc_page
                .and_then(|i| doc.pages.get(i))
                .map(String::as_str)
                .unwrap_or("");
            let inference = collect_evidence(toc_text, &settings.vocabulary);
            let vision = doc.vision_items();
            let resolution = resolve_checked(
                settings.checked_policy,
                &inference,
                vision.as_deref(),
                &settings.vocabulary,
            );

            tracing::debug!(
                file = file_name,
                source = ?resolution.source,
                unchecked = inference.unchecked.len(),
                "勾選判定"
            );

            record.equipment_list = resolution.items.clone();
            record.source_page_hints = match (resolution.source, toc_page) {
                (CheckedSource::None, _) | (_, None) => Vec::new(),
                (_, Some(page)) => vec![page],
            };
            Some(resolution)
        }
    };

    let attachments = if record.equipment_list.is_empty() {
        Vec::new()
    } else {
        check_attachments(&record.equipment_list, &doc.labels())
    };

    DocumentResult {
        file_name: file_name.to_string(),
        record,
        checked,
        toc_page,
        attachments,
        error: None,
    }
}

/// 讀取並擷取（失敗時回傳空白結果）
pub fn process_document(info: &DocumentInfo, settings: &ExtractionSettings) -> DocumentResult {
    match load_document(&info.path) {
        Ok(doc) => extract_document(&info.file_name, &doc, settings),
        Err(e) => {
            tracing::warn!("{} 無法讀取: {}", info.file_name, e);
            DocumentResult::failed(&info.file_name, e.to_string())
        }
    }
}

/// 平行處理多份申報書（結果依輸入順序）
pub fn process_documents(
    documents: &[DocumentInfo],
    settings: &ExtractionSettings,
    show_progress: bool,
) -> Vec<DocumentResult> {
    let progress = if show_progress {
        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<DocumentResult> = documents
        .par_iter()
        .map(|info| {
            let result = process_document(info, settings);
            progress.set_message(info.file_name.clone());
            progress.inc(1);
            result
        })
        .collect();

    progress.finish_and_clear();
    results
}

/// 使用快取的批次處理
///
/// 快取檔放在 `folder`。讀取失敗的結果不寫入快取。
pub fn process_documents_with_cache(
    documents: &[DocumentInfo],
    folder: &Path,
    config: &Config,
    show_progress: bool,
) -> Result<Vec<DocumentResult>> {
    let settings = ExtractionSettings::from_config(config);
    let mut cache = CacheFile::load(folder);
    cache.ensure_settings(&config.extraction_fingerprint());

    let (cached, uncached) = crate::cache::filter_cached_documents(documents, &cache);
    if !cached.is_empty() {
        tracing::info!("快取命中 {} 份，需處理 {} 份", cached.len(), uncached.len());
    }

    let pending: Vec<DocumentInfo> = uncached.iter().map(|(_, info, _)| info.clone()).collect();
    let fresh = process_documents(&pending, &settings, show_progress);

    let mut slots: Vec<Option<DocumentResult>> = vec![None; documents.len()];
    for (index, result) in cached {
        slots[index] = Some(result);
    }
    for ((index, info, hash), result) in uncached.into_iter().zip(fresh) {
        if !hash.is_empty() && result.error.is_none() {
            let file_size = std::fs::metadata(&info.path).map(|m| m.len()).unwrap_or(0);
            cache.insert(hash, info.file_name.clone(), file_size, result.clone());
        }
        slots[index] = Some(result);
    }

    cache.save(folder)?;
    Ok(slots.into_iter().flatten().collect())
}

/// 比對時的參數
pub struct CompareContext<'a> {
    pub rows: &'a [ReferenceRow],
    pub aliases: &'a FieldAliases,
    pub vocabulary: &'a ControlledVocabulary,
    pub options: &'a CompareOptions,
}

/// 單份申報書的比對結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    pub file_name: String,
    /// 對應的列管資料列（0 起算，不含標題列）
    pub reference_row: Option<usize>,
    pub report: Option<ComparisonReport>,
    pub document: DocumentResult,
}

/// 與列管資料比對
///
/// 以場所名稱自動對應；對應不到時呼叫 `select` 讓使用者選擇（回傳 `None` 表示略過）。
pub fn compare_results<F>(
    results: Vec<DocumentResult>,
    context: &CompareContext<'_>,
    mut select: F,
) -> Result<Vec<ComparisonOutcome>>
where
    F: FnMut(&DocumentResult) -> Result<Option<usize>>,
{
    let mut outcomes = Vec::with_capacity(results.len());

    for document in results {
        let site_name = document.record.site_name.as_deref().unwrap_or("");
        let matched = find_reference_row(context.rows, site_name, context.aliases).map(|(i, _)| i);

        let reference_row = match matched {
            Some(index) => Some(index),
            None => select(&document)?.filter(|i| *i < context.rows.len()),
        };

        let report = reference_row.map(|index| {
            let reference = ReferenceRecord::from_row(&context.rows[index], context.aliases, context.vocabulary);
            compare(&document.record, &reference, context.options)
        });

        if report.is_none() {
            tracing::warn!("{}: 找不到對應的列管資料（場所名稱: {}）", document.file_name, site_name);
        }

        outcomes.push(ComparisonOutcome {
            file_name: document.file_name.clone(),
            reference_row,
            report,
            document,
        });
    }

    Ok(outcomes)
}
