//! 申報書欄位擷取
//!
//! 第 1 頁：逐行套用欄位標籤規則，取出場所名稱、地址、管理權人、電話。
//! 多頁：找出「消防安全設備檢修申報書目錄」頁，取出申報的設備清單。
//!
//! 擷取永不失敗，判讀不到的欄位保持空白。

use crate::integrity::{identify_page_type, is_toc_label};
use crate::normalizer::{clean_text, normalize_with};
use crate::types::ExtractedRecord;
use crate::vocabulary::ControlledVocabulary;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 目錄頁標題
pub const TOC_PHRASE: &str = "消防安全設備檢修申報書目錄";

/// 目錄頁中設備檢查表區段的起點
pub const CHECKLIST_PHRASE: &str = "消防安全設備檢查表";

lazy_static::lazy_static! {
    // 標籤字元之間容許 OCR 插入的空白
    static ref MANAGER_RE: Regex = Regex::new(r"管\s*理\s*權\s*人\s*[:：|]\s*(.*)").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"姓\s*名\s*[:：|]\s*(.*)").unwrap();
    static ref SITE_ADDRESS_RE: Regex = Regex::new(r"場\s*所\s*地\s*址\s*[:：|]\s*(.*)").unwrap();
    static ref ADDRESS_RE: Regex = Regex::new(r"地\s*址\s*[:：|]\s*(.*)").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"電\s*話\s*[:：|]\s*([\d\-()（）\s]+)").unwrap();
    static ref SITE_NAME_RE: Regex = Regex::new(r"場\s*所\s*名\s*稱\s*[:：|]\s*(.*)").unwrap();
    static ref ITEMS_RE: Regex = Regex::new(r"(?:申\s*報|檢\s*修)\s*項\s*目\s*[:：|]\s*(.*)").unwrap();
    static ref ID_CARD_RE: Regex = Regex::new(r"身\s*分\s*證").unwrap();
}

/// 目錄頁定位方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocStrategy {
    /// 含目錄標題的頁面 → 第 2 頁
    #[default]
    Phrase,
    /// 頁首判定為目錄的頁面 → 含目錄標題 → 含「目錄」 → 第 2 頁
    Heading,
}

impl std::str::FromStr for TocStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phrase" => Ok(TocStrategy::Phrase),
            "heading" => Ok(TocStrategy::Heading),
            _ => Err(format!("Unknown TOC strategy: {}. Use phrase or heading", s)),
        }
    }
}

impl std::fmt::Display for TocStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TocStrategy::Phrase => write!(f, "phrase"),
            TocStrategy::Heading => write!(f, "heading"),
        }
    }
}

/// 欄位擷取器
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'a> {
    vocabulary: &'a ControlledVocabulary,
    toc_strategy: TocStrategy,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(vocabulary: &'a ControlledVocabulary) -> Self {
        Self {
            vocabulary,
            toc_strategy: TocStrategy::default(),
        }
    }

    pub fn with_toc_strategy(mut self, toc_strategy: TocStrategy) -> Self {
        self.toc_strategy = toc_strategy;
        self
    }

    /// 申報書擷取
    ///
    /// # Arguments
    /// * `page_one_text` - 第 1 頁 OCR 文字（基本資料）
    /// * `all_pages_text` - 全部頁面 OCR 文字（依頁序）
    pub fn extract(&self, page_one_text: &str, all_pages_text: &[String]) -> ExtractedRecord {
        let mut record = ExtractedRecord::default();

        for line in page_one_text.lines() {
            self.apply_line_rules(line, all_pages_text.is_empty(), &mut record);
        }

        if let Some(index) = self.locate_toc_page(all_pages_text) {
            let equipment = self.equipment_from_toc(&all_pages_text[index]);
            if !equipment.is_empty() {
                tracing::debug!(page = index, count = equipment.len(), "目錄頁設備清單");
                record.equipment_list = equipment;
                record.source_page_hints = vec![index];
            }
        }

        record
    }

    /// 找出目錄頁（0 起算）
    pub fn locate_toc_page(&self, pages: &[String]) -> Option<usize> {
        let cleaned: Vec<String> = pages.iter().map(|p| clean_text(p)).collect();

        let found = match self.toc_strategy {
            TocStrategy::Phrase => cleaned.iter().position(|p| p.contains(TOC_PHRASE)),
            TocStrategy::Heading => cleaned
                .iter()
                .position(|p| is_toc_label(&identify_page_type(p)))
                .or_else(|| cleaned.iter().position(|p| p.contains(TOC_PHRASE)))
                .or_else(|| cleaned.iter().position(|p| p.contains("目錄"))),
        };

        // 找不到時假設目錄在第 2 頁
        found.or(if pages.len() > 1 { Some(1) } else { None })
    }

    /// 目錄頁中「消防安全設備檢查表」之後的設備清單
    pub fn equipment_from_toc(&self, toc_page_text: &str) -> Vec<String> {
        let cleaned = clean_text(toc_page_text);
        match cleaned.split_once(CHECKLIST_PHRASE) {
            Some((_, listing)) => normalize_with(self.vocabulary, listing),
            None => Vec::new(),
        }
    }

    fn apply_line_rules(&self, line: &str, page_one_only: bool, record: &mut ExtractedRecord) {
        let line = line.trim();
        let compact = clean_text(line);
        if compact.is_empty() {
            return;
        }

        // 管理權人（「通訊處」表示抓到的是地址欄）
        if compact.contains("管理權人") {
            if let Some(value) = capture(&MANAGER_RE, line) {
                if !clean_text(&value).contains("通訊處") {
                    record.manager_name = Some(value);
                }
            }
        }

        // 備用：姓名（排除檢修人員）
        if compact.contains("姓名") && !compact.contains("檢修人員") && record.manager_name.is_none() {
            if let Some(value) = capture(&NAME_RE, line) {
                let value = match ID_CARD_RE.find(&value) {
                    Some(m) => value[..m.start()].trim().to_string(),
                    None => value,
                };
                if !value.is_empty() {
                    record.manager_name = Some(value);
                }
            }
        }

        // 地址：場所地址優先，其他「地址」欄只在尚未取得時採用
        if compact.contains("場所地址") {
            if let Some(value) = capture(&SITE_ADDRESS_RE, line) {
                record.address = Some(value);
            }
        } else if compact.contains("地址") && record.address.is_none() {
            if let Some(value) = capture(&ADDRESS_RE, line) {
                record.address = Some(value);
            }
        }

        // 電話：第一筆為準，避免檢修公司電話覆蓋
        if compact.contains("電話") && record.phone.is_none() {
            if let Some(value) = capture(&PHONE_RE, line) {
                if value.chars().any(char::is_numeric) {
                    record.phone = Some(value);
                }
            }
        }

        if compact.contains("場所名稱") {
            if let Some(value) = capture(&SITE_NAME_RE, line) {
                record.site_name = Some(value);
            }
        }

        // 無多頁資料時，以第 1 頁的申報項目欄備用
        if page_one_only && (compact.contains("申報項目") || compact.contains("檢修項目")) {
            if let Some(value) = capture(&ITEMS_RE, line) {
                record.equipment_list = normalize_with(self.vocabulary, &value);
                record.source_page_hints = vec![0];
            }
        }
    }
}

/// 以預設名稱表擷取
pub fn extract(page_one_text: &str, all_pages_text: &[String]) -> ExtractedRecord {
    FieldExtractor::new(crate::normalizer::default_vocabulary()).extract(page_one_text, all_pages_text)
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_basic_fields() {
        let page_one = "消防安全設備檢修申報書\n場所名稱:鳳 仙旅店\n場所地址：臺東縣臺東市中正路1號\n管理權人|王小明\n電話:(089) 322112";
        let record = extract(page_one, &[]);

        let site_name = record.site_name.unwrap();
        assert!(site_name.contains('鳳'));
        assert!(site_name.contains('仙'));
        assert_eq!(record.address.as_deref(), Some("臺東縣臺東市中正路1號"));
        assert_eq!(record.manager_name.as_deref(), Some("王小明"));
        assert_eq!(record.phone.as_deref(), Some("(089) 322112"));
    }

    #[test]
    fn test_manager_rejects_mailing_address() {
        let page_one = "管理權人:通訊處臺東市\n姓名:李大華 身分證字號:A123456789";
        let record = extract(page_one, &[]);
        assert_eq!(record.manager_name.as_deref(), Some("李大華"));
    }

    #[test]
    fn test_name_fallback_skips_inspector() {
        let page_one = "檢修人員姓名:陳技師\n姓名：林小美";
        let record = extract(page_one, &[]);
        assert_eq!(record.manager_name.as_deref(), Some("林小美"));
    }

    #[test]
    fn test_name_fallback_does_not_override_manager() {
        let page_one = "管理權人:王小明\n姓名:張三";
        let record = extract(page_one, &[]);
        assert_eq!(record.manager_name.as_deref(), Some("王小明"));
    }

    #[test]
    fn test_generic_address_does_not_override_site_address() {
        let page_one = "場所地址:臺東市中正路1號\n檢修機構地址:高雄市前鎮區1號";
        let record = extract(page_one, &[]);
        assert_eq!(record.address.as_deref(), Some("臺東市中正路1號"));
    }

    #[test]
    fn test_site_address_overrides_generic_address() {
        let page_one = "地址:高雄市前鎮區1號\n場所地址:臺東市中正路1號";
        let record = extract(page_one, &[]);
        assert_eq!(record.address.as_deref(), Some("臺東市中正路1號"));
    }

    #[test]
    fn test_first_phone_wins() {
        let page_one = "場所電話:089-322112\n檢修機構電話:07-1234567";
        let record = extract(page_one, &[]);
        assert_eq!(record.phone.as_deref(), Some("089-322112"));
    }

    #[test]
    fn test_full_width_phone() {
        let record = extract("電話：（０８９）３２２１１２", &[]);
        assert_eq!(record.phone.as_deref(), Some("（０８９）３２２１１２"));
    }

    #[test]
    fn test_phone_without_digits_is_discarded() {
        let page_one = "電話:( )\n電話: 089 123456";
        let record = extract(page_one, &[]);
        assert_eq!(record.phone.as_deref(), Some("089 123456"));
    }

    #[test]
    fn test_page_one_equipment_fallback() {
        let page_one = "申報項目:滅火器、標示設備 避難器具";
        let record = extract(page_one, &[]);
        assert_eq!(record.equipment_list, vec!["標示設備", "避難器具", "滅火器"]);
        assert_eq!(record.source_page_hints, vec![0]);
    }

    #[test]
    fn test_page_one_fallback_ignored_with_pages() {
        let page_one = "申報項目:滅火器";
        let all = pages(&[page_one, "無目錄內容"]);
        let record = extract(page_one, &all);
        assert!(record.equipment_list.is_empty());
    }

    #[test]
    fn test_toc_page_by_phrase() {
        let all = pages(&[
            "場所名稱:鳳仙旅店",
            "附件",
            "消防安全設備檢修申報書目錄\n一、檢修申報表 1-1\n二、消防安全設備檢查表\n滅火器檢查表 2-1\n緊急照明設備檢查表 2-19",
        ]);
        let record = extract(&all[0], &all);
        assert_eq!(record.equipment_list, vec!["緊急照明設備", "滅火器"]);
        assert_eq!(record.source_page_hints, vec![2]);
    }

    #[test]
    fn test_toc_front_matter_ignored() {
        let toc = "消防安全設備檢修申報書目錄 標示設備說明\n消防安全設備檢查表\n滅火器檢查表 2-1";
        let all = pages(&["", toc]);
        let record = extract("", &all);
        assert_eq!(record.equipment_list, vec!["滅火器"]);
    }

    #[test]
    fn test_toc_defaults_to_second_page() {
        let vocabulary = ControlledVocabulary::default();
        let extractor = FieldExtractor::new(&vocabulary);
        assert_eq!(extractor.locate_toc_page(&pages(&["a", "b", "c"])), Some(1));
        assert_eq!(extractor.locate_toc_page(&pages(&["a"])), None);
        assert_eq!(extractor.locate_toc_page(&[]), None);
    }

    #[test]
    fn test_toc_phrase_with_spaces() {
        let vocabulary = ControlledVocabulary::default();
        let extractor = FieldExtractor::new(&vocabulary);
        let all = pages(&["a", "b", "消防安全設備 檢修申報書 目錄"]);
        assert_eq!(extractor.locate_toc_page(&all), Some(2));
    }

    #[test]
    fn test_heading_strategy() {
        let vocabulary = ControlledVocabulary::default();
        let extractor = FieldExtractor::new(&vocabulary).with_toc_strategy(TocStrategy::Heading);
        let all = pages(&["封面", "附表", " 目 錄\n消防安全設備檢查表"]);
        assert_eq!(extractor.locate_toc_page(&all), Some(2));

        let all = pages(&["封面", "附表", "本申報書目錄如下"]);
        assert_eq!(extractor.locate_toc_page(&all), Some(2));

        // 頁首以外的「目錄」只在最後才採用
        let body = format!("{}目錄", "說明".repeat(20));
        let all = pages(&["封面", body.as_str(), "114年度 目錄\n滅火器"]);
        assert_eq!(extractor.locate_toc_page(&all), Some(2));
    }

    #[test]
    fn test_toc_strategy_from_str() {
        assert_eq!("Heading".parse::<TocStrategy>().unwrap(), TocStrategy::Heading);
        assert!("unknown".parse::<TocStrategy>().is_err());
    }

    #[test]
    fn test_empty_input_yields_empty_record() {
        let record = extract("", &[]);
        assert!(record.is_empty());
        assert!(record.source_page_hints.is_empty());
    }
}
