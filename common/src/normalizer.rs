//! 設備名稱正規化
//!
//! 任意 OCR 文字 → 標準設備名稱清單。
//!
//! ## 處理流程
//! 1. 去除所有空白（半形、全形、換行）
//! 2. 簡體字與常見 OCR 誤認字轉為標準繁體
//! 3. 依名稱表順序（長名稱優先）檢查是否包含，命中的片段隨即遮蔽

use crate::vocabulary::ControlledVocabulary;

lazy_static::lazy_static! {
    static ref DEFAULT_VOCABULARY: ControlledVocabulary = ControlledVocabulary::default();
}

/// 已命中片段的遮蔽字元（不會出現在任何標準名稱中）
pub const MASK: char = '\u{FFFC}';

/// 清單分隔符號（系統列管資料使用頓號）
pub const ITEM_SEPARATOR: &str = "、";

/// 異體字對照（來源字, 標準字）
///
/// 標準字不得再出現在來源欄，確保轉換結果重複套用不變。
const VARIANT_FOLDS: &[(char, char)] = &[
    // OCR 誤認
    ('内', '內'),
    ('拴', '栓'),
    // 簡體 → 繁體
    ('灭', '滅'),
    ('设', '設'),
    ('备', '備'),
    ('动', '動'),
    ('报', '報'),
    ('难', '難'),
    ('标', '標'),
    ('紧', '緊'),
    ('广', '廣'),
    ('连', '連'),
    ('结', '結'),
    ('专', '專'),
    ('烟', '煙'),
    ('无', '無'),
    ('线', '線'),
    ('电', '電'),
    ('辅', '輔'),
    ('雾', '霧'),
    ('气', '氣'),
    ('体', '體'),
    ('简', '簡'),
    ('卤', '鹵'),
    ('烃', '烴'),
    ('却', '卻'),
    ('灾', '災'),
    ('监', '監'),
    ('统', '統'),
    ('综', '綜'),
    ('装', '裝'),
    ('抢', '搶'),
    ('龙', '龍'),
];

/// 去除所有空白字元（含全形空白與換行）
pub fn clean_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 異體字轉為標準繁體
pub fn fold_variants(text: &str) -> String {
    text.chars()
        .map(|c| {
            VARIANT_FOLDS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// 以預設名稱表正規化
///
/// # Examples
/// ```
/// use fire_recon_common::normalizer::normalize;
///
/// assert_eq!(normalize("火警自動警報設備檢查表"), vec!["火警自動警報設備"]);
/// assert!(normalize("").is_empty());
/// ```
pub fn normalize(text: &str) -> Vec<String> {
    normalize_with(&DEFAULT_VOCABULARY, text)
}

/// 以指定名稱表正規化
///
/// 結果依名稱表順序排列，每個名稱至多出現一次；
/// 與輸入中的出現順序無關。
pub fn normalize_with(vocabulary: &ControlledVocabulary, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut remaining = fold_variants(&clean_text(text));

    if remaining.is_empty() {
        return found;
    }

    let mask = MASK.to_string();
    for item in vocabulary.iter() {
        if !remaining.contains(item) {
            continue;
        }
        if !found.iter().any(|f| f == item) {
            found.push(item.to_string());
        }
        remaining = remaining.replace(item, &mask);
    }

    found
}

/// 清單以頓號串接
pub fn join_items(items: &[String]) -> String {
    items.join(ITEM_SEPARATOR)
}

/// 預設名稱表
pub fn default_vocabulary() -> &'static ControlledVocabulary {
    &DEFAULT_VOCABULARY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(" 滅 火\u{3000}器\n\r\t"), "滅火器");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_fold_variants() {
        assert_eq!(fold_variants("室内消防拴设备"), "室內消防栓設備");
        assert_eq!(fold_variants("灭火器"), "滅火器");
    }

    #[test]
    fn test_fold_variants_idempotent() {
        for (_, to) in VARIANT_FOLDS {
            assert!(
                VARIANT_FOLDS.iter().all(|(from, _)| from != to),
                "fold target {} is also a source",
                to
            );
        }
        let once = fold_variants("火警自动报警设备");
        assert_eq!(fold_variants(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \u{3000}\n").is_empty());
        assert!(normalize("完全無關的文字").is_empty());
    }

    #[test]
    fn test_longest_match_priority() {
        assert_eq!(normalize("火警自動警報設備檢查表"), vec!["火警自動警報設備"]);
        assert_eq!(
            normalize("瓦斯漏氣火警自動警報設備"),
            vec!["瓦斯漏氣火警自動警報設備"]
        );
    }

    #[test]
    fn test_short_entry_outside_long_entry_still_reported() {
        let result = normalize("火警自動警報設備、警報設備");
        assert_eq!(result, vec!["火警自動警報設備", "警報設備"]);
    }

    #[test]
    fn test_output_follows_vocabulary_order() {
        let a = normalize("滅火器、避難器具、緊急照明設備");
        let b = normalize("緊急照明設備 避難器具 滅火器");
        assert_eq!(a, b);
        assert_eq!(a, vec!["緊急照明設備", "避難器具", "滅火器"]);
    }

    #[test]
    fn test_duplicates_reported_once() {
        assert_eq!(normalize("滅火器 滅火器 滅火器"), vec!["滅火器"]);
    }

    #[test]
    fn test_whitespace_invariance() {
        let plain = "滅火器檢查表、室內消防栓設備、標示設備";
        let spaced = "滅 火 器 檢查表、\u{3000}室 內 消\u{3000}防 栓 設 備\n標示 設備";
        assert_eq!(normalize(plain), normalize(spaced));
    }

    #[test]
    fn test_variant_characters() {
        assert_eq!(normalize("室 内 消 防 拴 設備"), vec!["室內消防栓設備"]);
        assert_eq!(normalize("灭火器"), vec!["滅火器"]);
    }

    #[test]
    fn test_idempotence() {
        let texts = [
            "二、消防安全設備檢查表 滅火器檢查表 火警自動警報設備檢查表 警報設備 配線",
            "瓦斯漏氣火警自動警報設備 緊急廣播設備 其他",
            "避難逃生設備：標示設備、避難器具、緊急照明設備",
        ];
        for text in texts {
            let once = normalize(text);
            let twice = normalize(&join_items(&once));
            assert_eq!(once, twice, "text: {}", text);
        }
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = ControlledVocabulary::new(["乙", "甲乙"]);
        assert_eq!(normalize_with(&vocabulary, "甲乙"), vec!["甲乙"]);
        assert_eq!(normalize_with(&vocabulary, "乙 甲乙"), vec!["甲乙", "乙"]);
    }
}
