use serde::{Deserialize, Serialize};

/// 比對欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SiteName,
    Address,
    ManagerName,
    Phone,
    Equipment,
}

impl Field {
    /// 單值欄位（設備清單另以集合差異比對）
    pub const SCALAR: [Field; 4] = [Field::SiteName, Field::Address, Field::ManagerName, Field::Phone];

    /// 申報書上的欄位名稱
    pub fn label(&self) -> &'static str {
        match self {
            Field::SiteName => "場所名稱",
            Field::Address => "場所地址",
            Field::ManagerName => "管理權人",
            Field::Phone => "場所電話",
            Field::Equipment => "消防設備種類",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 單份申報書的 OCR 擷取結果
///
/// 無法判讀的欄位保持 `None`（或空清單），不放入任何錯誤字串。
/// 重新執行 OCR 會產生新的紀錄，不在原紀錄上修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    #[serde(default)]
    pub site_name: Option<String>,    // 場所名稱

    #[serde(default)]
    pub address: Option<String>,      // 場所地址

    #[serde(default)]
    pub manager_name: Option<String>, // 管理權人

    #[serde(default)]
    pub phone: Option<String>,        // 場所電話

    #[serde(default)]
    pub equipment_list: Vec<String>,  // 消防設備種類

    /// 設備清單取自哪幾頁（0 起算）
    #[serde(default)]
    pub source_page_hints: Vec<usize>,
}

impl ExtractedRecord {
    /// 取得單值欄位
    pub fn scalar(&self, field: Field) -> Option<&str> {
        match field {
            Field::SiteName => self.site_name.as_deref(),
            Field::Address => self.address.as_deref(),
            Field::ManagerName => self.manager_name.as_deref(),
            Field::Phone => self.phone.as_deref(),
            Field::Equipment => None,
        }
    }

    /// 未能判讀的欄位
    pub fn missing_fields(&self) -> Vec<Field> {
        let mut missing: Vec<Field> = Field::SCALAR
            .iter()
            .copied()
            .filter(|f| self.scalar(*f).map_or(true, str::is_empty))
            .collect();
        if self.equipment_list.is_empty() {
            missing.push(Field::Equipment);
        }
        missing
    }

    /// 所有欄位皆未判讀
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 5
    }
}
