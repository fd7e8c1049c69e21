//! 系統列管資料（比對基準）
//!
//! 列管資料來自試算表，一列一個場所。欄位標題依各單位試算表而異，
//! 以 [`FieldAliases`] 指定對應。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalizer::{clean_text, normalize_with};
use crate::types::Field;
use crate::vocabulary::ControlledVocabulary;

/// 試算表的一列（欄位標題 → 儲存格文字）
pub type ReferenceRow = HashMap<String, String>;

/// 欄位 → 試算表欄位標題
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAliases {
    pub site_name: String,
    pub address: String,
    pub manager_name: String,
    pub phone: String,
    pub equipment: String,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            site_name: "場所名稱".to_string(),
            address: "場所地址".to_string(),
            manager_name: "管理權人姓名".to_string(),
            phone: "場所電話".to_string(),
            equipment: "消防安全設備".to_string(),
        }
    }
}

impl FieldAliases {
    pub fn column(&self, field: Field) -> &str {
        match field {
            Field::SiteName => &self.site_name,
            Field::Address => &self.address,
            Field::ManagerName => &self.manager_name,
            Field::Phone => &self.phone,
            Field::Equipment => &self.equipment,
        }
    }

    /// 取得欄位值（標題完全相同，或去除空白後相同）
    pub fn lookup<'r>(&self, row: &'r ReferenceRow, field: Field) -> Option<&'r str> {
        let column = self.column(field);
        let value = row.get(column).or_else(|| {
            let wanted = clean_text(column);
            row.iter()
                .find(|(header, _)| clean_text(header) == wanted)
                .map(|(_, value)| value)
        })?;

        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// 系統列管的場所資料（載入後唯讀）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    #[serde(default)]
    pub site_name: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub manager_name: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    /// 已正規化的設備清單
    #[serde(default)]
    pub equipment_list: Vec<String>,
}

impl ReferenceRecord {
    /// 由試算表的一列建立
    ///
    /// 設備欄位的文字會經過名稱正規化，只留下標準設備名稱。
    pub fn from_row(row: &ReferenceRow, aliases: &FieldAliases, vocabulary: &ControlledVocabulary) -> Self {
        let get = |field| aliases.lookup(row, field).map(str::to_string);
        Self {
            site_name: get(Field::SiteName),
            address: get(Field::Address),
            manager_name: get(Field::ManagerName),
            phone: get(Field::Phone),
            equipment_list: aliases
                .lookup(row, Field::Equipment)
                .map(|text| normalize_with(vocabulary, text))
                .unwrap_or_default(),
        }
    }

    pub fn scalar(&self, field: Field) -> Option<&str> {
        match field {
            Field::SiteName => self.site_name.as_deref(),
            Field::Address => self.address.as_deref(),
            Field::ManagerName => self.manager_name.as_deref(),
            Field::Phone => self.phone.as_deref(),
            Field::Equipment => None,
        }
    }
}

/// 場所名稱比對用的正規化（去空白、台→臺）
pub fn normalize_site_name(name: &str) -> String {
    clean_text(name).replace('台', "臺")
}

/// 依場所名稱找出對應的列管資料
///
/// 先找完全相同的名稱，再找互相包含的名稱；皆無則回傳 `None`。
///
/// # Arguments
/// * `rows` - 試算表各列
/// * `site_name` - OCR 擷取的場所名稱
/// * `aliases` - 欄位對應
pub fn find_reference_row<'r>(
    rows: &'r [ReferenceRow],
    site_name: &str,
    aliases: &FieldAliases,
) -> Option<(usize, &'r ReferenceRow)> {
    let wanted = normalize_site_name(site_name);
    if wanted.is_empty() {
        return None;
    }

    let names: Vec<(usize, String)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            aliases
                .lookup(row, Field::SiteName)
                .map(|name| (i, normalize_site_name(name)))
        })
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let index = names
        .iter()
        .find(|(_, name)| *name == wanted)
        .or_else(|| {
            names
                .iter()
                .find(|(_, name)| name.contains(&wanted) || wanted.contains(name.as_str()))
        })
        .map(|(i, _)| *i)?;

    tracing::debug!("列管資料對應: {} -> 第 {} 列", site_name, index);
    Some((index, &rows[index]))
}
