//! 消防安全設備標準名稱表
//!
//! 所有 OCR 文字最終都要對應到這份人工維護的標準名稱。
//! 比對時一律長名稱優先，避免「火警自動警報設備」被誤報為「警報設備」。

use serde::{Deserialize, Serialize};

/// 預設標準設備清單（申報書目錄上印出的所有項目，含分類標題）
pub const DEFAULT_EQUIPMENT: &[&str] = &[
    "滅火器",
    "自動撒水設備",
    "惰性氣體滅火設備",
    "簡易自動滅火設備",
    "警報設備",
    "火警自動警報設備",
    "一一九火災通報裝置",
    "避難逃生設備",
    "標示設備",
    "消防搶救上之必要設備",
    "連結送水管",
    "無線電通信輔助設備",
    "其他",
    "冷卻撒水設備",
    "室內消防栓設備",
    "水霧滅火設備",
    "乾粉滅火設備",
    "鹵化烴滅火設備",
    "瓦斯漏氣火警自動警報設備",
    "避難器具",
    "消防專用蓄水池",
    "緊急電源插座",
    "室外消防栓設備",
    "泡沫滅火設備",
    "海龍滅火設備",
    "緊急廣播設備",
    "緊急照明設備",
    "排煙設備",
    "防災監控系統綜合操作裝置",
    "射水設備",
    "配線",
];

/// 設備分類（分類名稱, 所屬設備）
pub const EQUIPMENT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "滅火設備",
        &[
            "滅火器",
            "室內消防栓設備",
            "室外消防栓設備",
            "自動撒水設備",
            "水霧滅火設備",
            "泡沫滅火設備",
            "惰性氣體滅火設備",
            "乾粉滅火設備",
            "海龍滅火設備",
            "簡易自動滅火設備",
            "鹵化烴滅火設備",
        ],
    ),
    (
        "警報設備",
        &[
            "火警自動警報設備",
            "瓦斯漏氣火警自動警報設備",
            "緊急廣播設備",
            "一一九火災通報裝置",
        ],
    ),
    ("避難逃生設備", &["標示設備", "避難器具", "緊急照明設備"]),
    (
        "消防搶救上之必要設備",
        &[
            "連結送水管",
            "消防專用蓄水池",
            "排煙設備",
            "無線電通信輔助設備",
            "緊急電源插座",
            "防災監控系統綜合操作裝置",
        ],
    ),
    ("其他", &["冷卻撒水設備", "射水設備", "配線"]),
];

/// 標準名稱表
///
/// 建立後即不可變，依字數由長到短排列（同長度維持宣告順序）。
/// 多執行緒之間可直接共用參照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ControlledVocabulary {
    entries: Vec<String>,
}

impl ControlledVocabulary {
    /// 建立名稱表（去除前後空白、空字串與重複項目）
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for entry in entries {
            let entry: String = entry.into();
            let entry = entry.trim();
            if entry.is_empty() || unique.iter().any(|e| e == entry) {
                continue;
            }
            unique.push(entry.to_string());
        }

        // 穩定排序：同字數維持原順序
        unique.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        Self { entries: unique }
    }

    /// 比對順序（長名稱優先）
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.entries.iter().any(|e| e == item)
    }

    /// 設備所屬分類
    pub fn category_of(&self, item: &str) -> Option<&'static str> {
        EQUIPMENT_CATEGORIES
            .iter()
            .find(|(_, items)| items.contains(&item))
            .map(|(category, _)| *category)
    }

    /// 互相包含的名稱組合 (短, 長)
    ///
    /// 自訂名稱表時用來檢查哪些項目依賴長名稱優先與遮蔽才能正確判斷。
    pub fn overlapping_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (i, long) in self.entries.iter().enumerate() {
            for short in &self.entries[i + 1..] {
                if long.contains(short.as_str()) {
                    pairs.push((short.as_str(), long.as_str()));
                }
            }
        }
        pairs
    }

    /// 依名稱表順序排序並去除重複（不在表內的項目排在最後）
    pub fn sort_items(&self, items: &[String]) -> Vec<String> {
        let mut sorted: Vec<String> = self
            .iter()
            .filter(|entry| items.iter().any(|i| i == entry))
            .map(str::to_string)
            .collect();
        for item in items {
            if !sorted.contains(item) {
                sorted.push(item.clone());
            }
        }
        sorted
    }
}

impl Default for ControlledVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_EQUIPMENT.iter().copied())
    }
}

impl From<Vec<String>> for ControlledVocabulary {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<ControlledVocabulary> for Vec<String> {
    fn from(vocabulary: ControlledVocabulary) -> Self {
        vocabulary.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_size() {
        let vocabulary = ControlledVocabulary::default();
        assert_eq!(vocabulary.len(), DEFAULT_EQUIPMENT.len());
    }

    #[test]
    fn test_longest_first_order() {
        let vocabulary = ControlledVocabulary::default();
        let lengths: Vec<usize> = vocabulary.iter().map(|e| e.chars().count()).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(vocabulary.entries()[0], "瓦斯漏氣火警自動警報設備");
    }

    #[test]
    fn test_stable_for_equal_length() {
        let vocabulary = ControlledVocabulary::new(["乙乙", "甲甲", "丙丙丙"]);
        assert_eq!(vocabulary.entries(), &["丙丙丙", "乙乙", "甲甲"]);
    }

    #[test]
    fn test_new_drops_blank_and_duplicates() {
        let vocabulary = ControlledVocabulary::new([" 滅火器 ", "", "滅火器", "配線"]);
        assert_eq!(vocabulary.entries(), &["滅火器", "配線"]);
    }

    #[test]
    fn test_category_of() {
        let vocabulary = ControlledVocabulary::default();
        assert_eq!(vocabulary.category_of("避難器具"), Some("避難逃生設備"));
        assert_eq!(vocabulary.category_of("配線"), Some("其他"));
        assert_eq!(vocabulary.category_of("不存在"), None);
    }

    #[test]
    fn test_every_categorised_item_is_in_default_list() {
        let vocabulary = ControlledVocabulary::default();
        for (_, items) in EQUIPMENT_CATEGORIES {
            for item in *items {
                assert!(vocabulary.contains(item), "{} missing", item);
            }
        }
    }

    #[test]
    fn test_overlapping_pairs() {
        let vocabulary = ControlledVocabulary::default();
        let pairs = vocabulary.overlapping_pairs();
        assert!(pairs.contains(&("警報設備", "火警自動警報設備")));
        assert!(pairs.contains(&("火警自動警報設備", "瓦斯漏氣火警自動警報設備")));
    }

    #[test]
    fn test_serde_as_plain_array() {
        let vocabulary: ControlledVocabulary =
            serde_json::from_str(r#"["配線", "滅火器", "避難器具"]"#).unwrap();
        assert_eq!(vocabulary.entries(), &["避難器具", "滅火器", "配線"]);
        let json = serde_json::to_string(&vocabulary).unwrap();
        assert_eq!(json, r#"["避難器具","滅火器","配線"]"#);
    }

    #[test]
    fn test_sort_items() {
        let vocabulary = ControlledVocabulary::default();
        let items = vec!["配線".to_string(), "火警自動警報設備".to_string(), "未知".to_string()];
        assert_eq!(
            vocabulary.sort_items(&items),
            vec!["火警自動警報設備", "配線", "未知"]
        );
    }
}
