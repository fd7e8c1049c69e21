//! 消防安全設備檢修申報書 OCR 比對核心
//!
//! OCR 文字 → 結構化擷取結果 → 與系統列管資料比對。
//! 所有處理皆為純函式，不做任何 I/O，可跨文件平行執行。

pub mod checked;
pub mod diff;
pub mod error;
pub mod export;
pub mod extractor;
pub mod integrity;
pub mod normalizer;
pub mod reference;
pub mod types;
pub mod vision;
pub mod vocabulary;

pub use checked::{infer_checked, resolve_checked, CheckedPolicy, CheckedResolution, CheckedSource};
pub use diff::{compare, CompareOptions, ComparisonReport, EquipmentDiff, FieldComparison, FlatRecord, MatchType};
pub use error::{Error, Result};
pub use extractor::{FieldExtractor, TocStrategy};
pub use normalizer::{join_items, normalize, normalize_with};
pub use reference::{find_reference_row, FieldAliases, ReferenceRecord, ReferenceRow};
pub use types::{ExtractedRecord, Field};
pub use vocabulary::ControlledVocabulary;
