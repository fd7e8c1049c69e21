//! 目錄頁勾選判定
//!
//! 目錄頁會印出所有設備項目與方框，只有勾選的項目才是實際申報內容。
//! 單純的名稱比對會把「有印出但未勾選」的項目也算進去，
//! 因此逐行收集勾選證據：
//!
//! 1. 行內有 `2-13` 之類的頁碼（有檢查表才有頁碼，最可靠）
//! 2. 引導點／底線後接數字（另一種頁碼排版）
//! 3. 項目名稱之前出現勾選符號（✓ ☑ √ ✔ ■ ●）
//!
//! 逐行判定失敗時，再以整頁文字搜尋「名稱…頁碼」作為備援（可跨行，到下一個項目為止）。

use crate::normalizer::{clean_text, fold_variants, join_items, normalize_with, MASK};
use crate::vocabulary::ControlledVocabulary;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 視為已勾選的符號（不含空方框 ☐ □）
pub const CHECK_GLYPHS: &[char] = &['✓', '☑', '√', '✔', '■', '●'];

lazy_static::lazy_static! {
    static ref PAGE_NUMBER_RE: Regex = Regex::new(r"\d+-\d+").unwrap();
    static ref LEADER_PAGE_RE: Regex = Regex::new(r"(?:[.．_·]{2,}|…+)\s*\d+").unwrap();
}

/// 勾選證據種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    TrailingPageNumber,
    CheckboxGlyph,
    VisionModelAffirmative,
}

/// 單一項目的勾選證據（僅用於本次判定，不保存）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedEvidence {
    pub item: String,
    pub kind: EvidenceKind,
    pub snippet: String,
}

/// 勾選判定結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckedInference {
    /// 已勾選項目（名稱表順序）
    pub items: Vec<String>,
    pub evidence: Vec<CheckedEvidence>,
    /// 有出現但沒有勾選證據的項目
    pub unchecked: Vec<String>,
}

/// 以勾選證據判定目錄頁申報的設備
pub fn infer_checked(toc_page_text: &str, vocabulary: &ControlledVocabulary) -> Vec<String> {
    collect_evidence(toc_page_text, vocabulary).items
}

/// 收集勾選證據
pub fn collect_evidence(toc_page_text: &str, vocabulary: &ControlledVocabulary) -> CheckedInference {
    let mut inference = CheckedInference::default();
    let mut lines: Vec<String> = toc_page_text
        .lines()
        .map(|line| fold_variants(&clean_text(line)))
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return inference;
    }

    let mask = MASK.to_string();
    for item in vocabulary.iter() {
        let bare = bare_name(item);
        let mut mentioned = false;
        let mut evidence = None;

        for line in &lines {
            let Some(position) = line.find(item).or_else(|| bare.and_then(|b| line.find(b))) else {
                continue;
            };
            mentioned = true;
            if let Some(kind) = line_evidence(line, position) {
                evidence = Some(CheckedEvidence {
                    item: item.to_string(),
                    kind,
                    snippet: line.clone(),
                });
                break;
            }
        }

        if evidence.is_none() && mentioned {
            evidence = whole_text_evidence(&lines.join("\n"), item, bare, vocabulary);
        }

        match evidence {
            Some(found) => {
                tracing::debug!(item, kind = ?found.kind, "勾選項目");
                inference.items.push(item.to_string());
                inference.evidence.push(found);
            }
            None if mentioned => inference.unchecked.push(item.to_string()),
            None => {}
        }

        // 已判定的名稱遮蔽掉，較短的名稱不再從中比對
        if mentioned {
            for line in lines.iter_mut() {
                let mut masked = line.replace(item, &mask);
                if let Some(b) = bare {
                    masked = masked.replace(b, &mask);
                }
                *line = masked;
            }
        }
    }

    inference
}

/// 去掉「設備」後的名稱（目錄常印成「室內消防栓檢查表」）
fn bare_name(item: &str) -> Option<&str> {
    item.strip_suffix("設備").filter(|b| !b.is_empty())
}

fn line_evidence(line: &str, position: usize) -> Option<EvidenceKind> {
    if PAGE_NUMBER_RE.is_match(line) || LEADER_PAGE_RE.is_match(line) {
        return Some(EvidenceKind::TrailingPageNumber);
    }
    if line[..position].chars().any(|c| CHECK_GLYPHS.contains(&c)) {
        return Some(EvidenceKind::CheckboxGlyph);
    }
    None
}

/// 整頁備援：名稱之後跨行接頁碼（OCR 把頁碼拆到下一行）
///
/// 搜尋範圍到下一個名稱表項目或已遮蔽的名稱為止，頁碼不會借給後面的項目。
fn whole_text_evidence(
    text: &str,
    item: &str,
    bare: Option<&str>,
    vocabulary: &ControlledVocabulary,
) -> Option<CheckedEvidence> {
    for name in std::iter::once(item).chain(bare) {
        for (start, _) in text.match_indices(name) {
            let from = start + name.len();
            let tail = &text[from..];
            let window = &tail[..section_end(tail, item, vocabulary)];
            if let Some(m) = PAGE_NUMBER_RE.find(window) {
                return Some(CheckedEvidence {
                    item: item.to_string(),
                    kind: EvidenceKind::TrailingPageNumber,
                    snippet: text[start..from + m.end()].to_string(),
                });
            }
        }
    }
    None
}

/// 下一個其他項目（含去掉「設備」的名稱）或遮蔽字元的位置
fn section_end(tail: &str, item: &str, vocabulary: &ControlledVocabulary) -> usize {
    let mut end = tail.find(MASK).unwrap_or(tail.len());
    for other in vocabulary.iter().filter(|other| *other != item) {
        for name in std::iter::once(other).chain(bare_name(other)) {
            if let Some(position) = tail[..end].find(name) {
                end = position;
            }
        }
    }
    end
}

/// 勾選來源的優先順序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckedPolicy {
    /// 視覺模型有結果就採用，否則用文字規則
    #[default]
    VisionFirst,
    /// 文字規則有結果就採用，否則用視覺模型
    PatternFirst,
    PatternOnly,
    VisionOnly,
    /// 兩者聯集
    Union,
}

impl std::str::FromStr for CheckedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vision-first" | "vision" => Ok(CheckedPolicy::VisionFirst),
            "pattern-first" | "pattern" => Ok(CheckedPolicy::PatternFirst),
            "pattern-only" => Ok(CheckedPolicy::PatternOnly),
            "vision-only" => Ok(CheckedPolicy::VisionOnly),
            "union" => Ok(CheckedPolicy::Union),
            _ => Err(format!(
                "Unknown policy: {}. Use vision-first, pattern-first, pattern-only, vision-only, or union",
                s
            )),
        }
    }
}

impl std::fmt::Display for CheckedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckedPolicy::VisionFirst => write!(f, "vision-first"),
            CheckedPolicy::PatternFirst => write!(f, "pattern-first"),
            CheckedPolicy::PatternOnly => write!(f, "pattern-only"),
            CheckedPolicy::VisionOnly => write!(f, "vision-only"),
            CheckedPolicy::Union => write!(f, "union"),
        }
    }
}

/// 最終採用的勾選來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckedSource {
    Pattern,
    Vision,
    Union,
    None,
}

/// 勾選結果（依政策合併後）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedResolution {
    pub items: Vec<String>,
    pub source: CheckedSource,
    pub evidence: Vec<CheckedEvidence>,
}

/// 視覺模型回傳的名稱正規化
///
/// 名稱對不上時補上「設備」再試一次（模型常省略）。
pub fn normalize_vision_items(items: &[String], vocabulary: &ControlledVocabulary) -> Vec<String> {
    let mut found = Vec::new();
    for raw in items {
        let mut normalized = normalize_with(vocabulary, raw);
        if normalized.is_empty() {
            normalized = normalize_with(vocabulary, &format!("{}設備", clean_text(raw)));
        }
        found.extend(normalized);
    }
    normalize_with(vocabulary, &join_items(&found))
}

/// 依政策合併文字規則與視覺模型的勾選結果
///
/// # Arguments
/// * `policy` - 優先順序
/// * `pattern` - 文字規則的判定結果
/// * `vision_items` - 視覺模型回傳的名稱（未正規化），沒有呼叫時為 `None`
pub fn resolve_checked(
    policy: CheckedPolicy,
    pattern: &CheckedInference,
    vision_items: Option<&[String]>,
    vocabulary: &ControlledVocabulary,
) -> CheckedResolution {
    let vision = vision_items
        .map(|items| normalize_vision_items(items, vocabulary))
        .unwrap_or_default();
    let vision_evidence: Vec<CheckedEvidence> = vision
        .iter()
        .map(|item| CheckedEvidence {
            item: item.clone(),
            kind: EvidenceKind::VisionModelAffirmative,
            snippet: item.clone(),
        })
        .collect();

    let use_pattern = || CheckedResolution {
        items: pattern.items.clone(),
        source: if pattern.items.is_empty() { CheckedSource::None } else { CheckedSource::Pattern },
        evidence: pattern.evidence.clone(),
    };
    let use_vision = || CheckedResolution {
        items: vision.clone(),
        source: if vision.is_empty() { CheckedSource::None } else { CheckedSource::Vision },
        evidence: vision_evidence.clone(),
    };

    match policy {
        CheckedPolicy::VisionFirst if !vision.is_empty() => use_vision(),
        CheckedPolicy::VisionFirst => use_pattern(),
        CheckedPolicy::PatternFirst if !pattern.items.is_empty() => use_pattern(),
        CheckedPolicy::PatternFirst => use_vision(),
        CheckedPolicy::PatternOnly => use_pattern(),
        CheckedPolicy::VisionOnly => use_vision(),
        CheckedPolicy::Union => {
            let mut merged = pattern.items.clone();
            merged.extend(vision.iter().cloned());
            let items = vocabulary.sort_items(&merged);
            let mut evidence = pattern.evidence.clone();
            evidence.extend(vision_evidence.iter().cloned());
            CheckedResolution {
                source: if items.is_empty() { CheckedSource::None } else { CheckedSource::Union },
                items,
                evidence,
            }
        }
    }
}
