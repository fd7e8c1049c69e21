//! 申報資料與列管資料的比對
//!
//! ## 處理流程
//! 1. 單值欄位（場所名稱、地址、管理權人、電話）依判定表分類
//! 2. 設備清單以集合差異比對（漏報 / 多報 / 相符）
//! 3. 彙整整體結果與平均相似度

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::normalizer::{clean_text, join_items};
use crate::reference::ReferenceRecord;
use crate::types::{ExtractedRecord, Field};

/// 比對結果類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Similar,
    Mismatch,
    Missing,
    Extra,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Similar => "SIMILAR",
            MatchType::Mismatch => "MISMATCH",
            MatchType::Missing => "MISSING",
            MatchType::Extra => "EXTRA",
        }
    }

    /// 視為通過的類型
    pub fn is_match(&self) -> bool {
        matches!(self, MatchType::Exact | MatchType::Similar)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 比對選項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOptions {
    /// 地址比對前去除的縣市前綴
    pub address_prefix: String,
    /// 系統無資料而申報有值時判為 MISMATCH（否則為 EXTRA）
    pub flag_unbaselined: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            address_prefix: "臺東縣".to_string(),
            flag_unbaselined: true,
        }
    }
}

/// 單一欄位的比對結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComparison {
    pub field: Field,
    pub extracted_value: Option<String>,
    pub reference_value: Option<String>,
    pub match_type: MatchType,
    pub similarity: f64,
    pub details: String,
}

/// 設備清單的集合差異
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDiff {
    pub matched: BTreeSet<String>,
    /// 系統有、申報未列出（漏報）
    pub missing_in_extracted: BTreeSet<String>,
    /// 申報有、系統未列管（需人工確認）
    pub extra_in_extracted: BTreeSet<String>,
    pub similarity: f64,
}

impl EquipmentDiff {
    pub fn is_equal(&self) -> bool {
        self.missing_in_extracted.is_empty() && self.extra_in_extracted.is_empty()
    }

    pub fn match_type(&self) -> MatchType {
        match (self.missing_in_extracted.is_empty(), self.extra_in_extracted.is_empty()) {
            (true, true) => MatchType::Exact,
            (false, true) => MatchType::Missing,
            (true, false) => MatchType::Extra,
            (false, false) => MatchType::Mismatch,
        }
    }

    fn details(&self) -> String {
        if self.is_equal() {
            return "設備項目一致".to_string();
        }
        let mut parts = Vec::new();
        if !self.missing_in_extracted.is_empty() {
            parts.push(format!("系統有但申報未列出: {}", join_set(&self.missing_in_extracted)));
        }
        if !self.extra_in_extracted.is_empty() {
            parts.push(format!("申報多出: {}", join_set(&self.extra_in_extracted)));
        }
        parts.join("；")
    }
}

/// 匯出用的扁平列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub field_name: String,
    pub extracted_value: String,
    pub reference_value: String,
    pub match_type: String,
    pub similarity: f64,
    pub details: String,
}

/// 單份申報書的比對報告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub fields: Vec<FieldComparison>,
    pub equipment: EquipmentDiff,
    pub extracted_equipment: Vec<String>,
    pub reference_equipment: Vec<String>,
    pub overall_match: bool,
    pub overall_similarity: f64,
}

impl ComparisonReport {
    /// 每個欄位一列（設備清單以頓號串接）
    pub fn flat_records(&self) -> Vec<FlatRecord> {
        let mut records: Vec<FlatRecord> = self
            .fields
            .iter()
            .map(|c| FlatRecord {
                field_name: c.field.label().to_string(),
                extracted_value: c.extracted_value.clone().unwrap_or_default(),
                reference_value: c.reference_value.clone().unwrap_or_default(),
                match_type: c.match_type.to_string(),
                similarity: c.similarity,
                details: c.details.clone(),
            })
            .collect();

        records.push(FlatRecord {
            field_name: Field::Equipment.label().to_string(),
            extracted_value: join_items(&self.extracted_equipment),
            reference_value: join_items(&self.reference_equipment),
            match_type: self.equipment.match_type().to_string(),
            similarity: self.equipment.similarity,
            details: self.equipment.details(),
        });
        records
    }

    /// 一句話摘要
    pub fn summary(&self) -> String {
        if self.overall_match {
            return "所有欄位比對通過".to_string();
        }

        let labels = |kind: MatchType| -> Vec<&'static str> {
            self.fields
                .iter()
                .filter(|c| c.match_type == kind)
                .map(|c| c.field.label())
                .collect()
        };

        let mut issues = Vec::new();
        let mismatch = labels(MatchType::Mismatch);
        if !mismatch.is_empty() {
            issues.push(format!("不符欄位: {}", mismatch.join(", ")));
        }
        let missing = labels(MatchType::Missing);
        if !missing.is_empty() {
            issues.push(format!("缺失欄位: {}", missing.join(", ")));
        }
        let extra = labels(MatchType::Extra);
        if !extra.is_empty() {
            issues.push(format!("系統無資料: {}", extra.join(", ")));
        }
        if !self.equipment.is_equal() {
            issues.push(self.equipment.details());
        }
        issues.join("; ")
    }
}

/// 比對申報資料與列管資料
pub fn compare(extracted: &ExtractedRecord, reference: &ReferenceRecord, options: &CompareOptions) -> ComparisonReport {
    let fields: Vec<FieldComparison> = Field::SCALAR
        .iter()
        .map(|&field| compare_field(field, extracted.scalar(field), reference.scalar(field), options))
        .collect();

    let equipment = diff_equipment(&extracted.equipment_list, &reference.equipment_list);

    let overall_match = fields.iter().all(|c| c.match_type.is_match()) && equipment.is_equal();
    let total: f64 = fields.iter().map(|c| c.similarity).sum::<f64>() + equipment.similarity;
    let overall_similarity = total / (fields.len() + 1) as f64;

    tracing::debug!(
        "比對完成: overall_match={}, similarity={:.3}",
        overall_match,
        overall_similarity
    );

    ComparisonReport {
        fields,
        equipment,
        extracted_equipment: extracted.equipment_list.clone(),
        reference_equipment: reference.equipment_list.clone(),
        overall_match,
        overall_similarity,
    }
}

/// 單一欄位比對
///
/// 判定順序:
/// 1. 系統無資料、申報有值 → MISMATCH（`flag_unbaselined = false` 時為 EXTRA）
/// 2. 兩者皆空 → EXACT
/// 3. 系統有值、申報空白 → MISSING
/// 4. 正規化後相同 → EXACT；互相包含 → SIMILAR；其餘 → MISMATCH
pub fn compare_field(
    field: Field,
    extracted: Option<&str>,
    reference: Option<&str>,
    options: &CompareOptions,
) -> FieldComparison {
    let extracted = extracted.map(str::trim).filter(|v| !v.is_empty());
    let reference = reference.map(str::trim).filter(|v| !v.is_empty());

    let (match_type, similarity_score, details) = match (reference, extracted) {
        (None, Some(_)) => {
            if options.flag_unbaselined {
                (MatchType::Mismatch, 0.0, "系統無資料".to_string())
            } else {
                (MatchType::Extra, 0.0, "系統無資料，申報值待人工確認".to_string())
            }
        }
        (None, None) => (MatchType::Exact, 1.0, "兩者皆為空值".to_string()),
        (Some(_), None) => (MatchType::Missing, 0.0, "申報書未填寫或無法判讀".to_string()),
        (Some(reference), Some(extracted)) => {
            let (norm_ref, norm_ext) = match field {
                Field::Address => (
                    normalize_address(reference, &options.address_prefix),
                    normalize_address(extracted, &options.address_prefix),
                ),
                _ => (clean_text(reference), clean_text(extracted)),
            };
            let score = similarity(&norm_ref, &norm_ext);

            // 只剩縣市前綴的地址視為空白
            if norm_ext.is_empty() && !norm_ref.is_empty() {
                (MatchType::Missing, 0.0, "申報書僅有縣市，無法比對".to_string())
            } else if norm_ref.is_empty() && !norm_ext.is_empty() {
                let kind = if options.flag_unbaselined { MatchType::Mismatch } else { MatchType::Extra };
                (kind, 0.0, "系統僅有縣市，申報值待人工確認".to_string())
            } else if norm_ref == norm_ext {
                (MatchType::Exact, 1.0, "完全相符".to_string())
            } else if norm_ref.contains(&norm_ext) || norm_ext.contains(&norm_ref) {
                (MatchType::Similar, score, "部分相符 (模糊比對)".to_string())
            } else {
                (
                    MatchType::Mismatch,
                    score,
                    format!("不符，請人工確認 (系統: {} / 申報: {})", norm_ref, norm_ext),
                )
            }
        }
    };

    FieldComparison {
        field,
        extracted_value: extracted.map(str::to_string),
        reference_value: reference.map(str::to_string),
        match_type,
        similarity: similarity_score,
        details,
    }
}

/// 設備清單的集合差異
pub fn diff_equipment(extracted: &[String], reference: &[String]) -> EquipmentDiff {
    let extracted: BTreeSet<String> = extracted.iter().cloned().collect();
    let reference: BTreeSet<String> = reference.iter().cloned().collect();

    let matched: BTreeSet<String> = reference.intersection(&extracted).cloned().collect();
    let missing_in_extracted: BTreeSet<String> = reference.difference(&extracted).cloned().collect();
    let extra_in_extracted: BTreeSet<String> = extracted.difference(&reference).cloned().collect();

    let union = reference.union(&extracted).count();
    let similarity = if union == 0 {
        1.0
    } else {
        matched.len() as f64 / union as f64
    };

    EquipmentDiff {
        matched,
        missing_in_extracted,
        extra_in_extracted,
        similarity,
    }
}

/// 地址正規化（台→臺、去空白、去縣市前綴）
pub fn normalize_address(address: &str, prefix: &str) -> String {
    let address = clean_text(address).replace('台', "臺");
    let prefix = clean_text(prefix).replace('台', "臺");
    if prefix.is_empty() {
        return address;
    }
    address.strip_prefix(prefix.as_str()).unwrap_or(&address).to_string()
}

/// 字串相似度（0.0～1.0，以編輯距離計算）
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    let max_len = a.chars().count().max(b.chars().count());

    1.0 - (distance as f64 / max_len as f64)
}

/// 編輯距離
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join("、")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decision_table_empty_combinations() {
        let options = CompareOptions::default();
        let field = Field::ManagerName;

        let c = compare_field(field, Some("王小明"), Some(""), &options);
        assert_eq!(c.match_type, MatchType::Mismatch);

        let c = compare_field(field, Some(""), Some(""), &options);
        assert_eq!(c.match_type, MatchType::Exact);
        assert_eq!(c.similarity, 1.0);

        let c = compare_field(field, None, Some("王小明"), &options);
        assert_eq!(c.match_type, MatchType::Missing);

        let c = compare_field(field, Some("王小明"), Some("王小明"), &options);
        assert_eq!(c.match_type, MatchType::Exact);
    }

    #[test]
    fn test_unbaselined_as_extra() {
        let options = CompareOptions {
            flag_unbaselined: false,
            ..Default::default()
        };
        let c = compare_field(Field::Phone, Some("089-322112"), None, &options);
        assert_eq!(c.match_type, MatchType::Extra);
    }

    #[test]
    fn test_address_normalization() {
        let options = CompareOptions::default();
        let c = compare_field(
            Field::Address,
            Some("台東市中華路一段 684號"),
            Some("臺東縣臺東市中華路一段684號"),
            &options,
        );
        assert_eq!(c.match_type, MatchType::Exact);
        assert_eq!(normalize_address("台東縣 台東市", "臺東縣"), "臺東市");
        assert_eq!(normalize_address("臺東市", ""), "臺東市");
    }

    #[test]
    fn test_prefix_only_address() {
        let options = CompareOptions::default();
        let c = compare_field(Field::Address, Some("臺東縣"), Some("臺東縣臺東市中華路1號"), &options);
        assert_eq!(c.match_type, MatchType::Missing);
        assert_eq!(c.similarity, 0.0);

        let c = compare_field(Field::Address, Some("臺東市中華路1號"), Some("台東縣"), &options);
        assert_eq!(c.match_type, MatchType::Mismatch);

        let c = compare_field(Field::Address, Some("台東縣"), Some("臺東縣"), &options);
        assert_eq!(c.match_type, MatchType::Exact);
    }

    #[test]
    fn test_similar_by_containment() {
        let options = CompareOptions::default();
        let c = compare_field(Field::SiteName, Some("鳳仙旅店"), Some("鳳仙旅店二館"), &options);
        assert_eq!(c.match_type, MatchType::Similar);
        assert!(c.similarity > 0.5 && c.similarity < 1.0);
    }

    #[test]
    fn test_mismatch_keeps_similarity() {
        let options = CompareOptions::default();
        let c = compare_field(Field::ManagerName, Some("王小名"), Some("王小明"), &options);
        assert_eq!(c.match_type, MatchType::Mismatch);
        assert!((c.similarity - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_whitespace_ignored_for_plain_fields() {
        let options = CompareOptions::default();
        let c = compare_field(Field::SiteName, Some("鳳 仙旅店"), Some("鳳仙旅店"), &options);
        assert_eq!(c.match_type, MatchType::Exact);
    }

    #[test]
    fn test_equipment_set_algebra() {
        let diff = diff_equipment(&strings(&["滅火器", "標示設備"]), &strings(&["滅火器", "避難器具"]));
        assert_eq!(diff.matched, set(&["滅火器"]));
        assert_eq!(diff.missing_in_extracted, set(&["避難器具"]));
        assert_eq!(diff.extra_in_extracted, set(&["標示設備"]));
        assert!(!diff.is_equal());
        assert_eq!(diff.match_type(), MatchType::Mismatch);
        assert!((diff.similarity - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_equipment_both_empty() {
        let diff = diff_equipment(&[], &[]);
        assert!(diff.is_equal());
        assert_eq!(diff.similarity, 1.0);
    }

    #[test]
    fn test_compare_overall() {
        let extracted = ExtractedRecord {
            site_name: Some("鳳仙旅店".to_string()),
            address: Some("臺東市中華路1號".to_string()),
            manager_name: Some("王小明".to_string()),
            phone: Some("(089) 322112".to_string()),
            equipment_list: strings(&["滅火器", "標示設備"]),
            source_page_hints: vec![1],
        };
        let reference = ReferenceRecord {
            site_name: Some("鳳仙旅店".to_string()),
            address: Some("臺東縣臺東市中華路1號".to_string()),
            manager_name: Some("王小明".to_string()),
            phone: Some("(089)322112".to_string()),
            equipment_list: strings(&["滅火器", "避難器具"]),
        };

        let report = compare(&extracted, &reference, &CompareOptions::default());
        assert!(report.fields.iter().all(|c| c.match_type == MatchType::Exact));
        assert!(!report.overall_match);
        assert!((report.overall_similarity - (4.0 + 1.0 / 3.0) / 5.0).abs() < 1e-9);

        let flat = report.flat_records();
        assert_eq!(flat.len(), 5);
        assert_eq!(flat[4].field_name, "消防設備種類");
        assert_eq!(flat[4].extracted_value, "滅火器、標示設備");
        assert_eq!(flat[4].match_type, "MISMATCH");
        assert!(report.summary().contains("避難器具"));
    }

    #[test]
    fn test_all_absent_record_reports_missing() {
        let reference = ReferenceRecord {
            site_name: Some("鳳仙旅店".to_string()),
            address: Some("臺東市".to_string()),
            manager_name: Some("王小明".to_string()),
            phone: Some("089".to_string()),
            equipment_list: strings(&["滅火器"]),
        };
        let report = compare(&ExtractedRecord::default(), &reference, &CompareOptions::default());
        assert!(report.fields.iter().all(|c| c.match_type == MatchType::Missing));
        assert_eq!(report.equipment.match_type(), MatchType::Missing);
        assert!(report.summary().starts_with("缺失欄位"));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(similarity("滅火器", "滅火器"), 1.0);
        assert_eq!(similarity("", "滅火器"), 0.0);
    }
}
