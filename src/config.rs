use crate::error::{ReconError, Result};
use crate::pipeline::EquipmentSource;
use fire_recon_common::{CheckedPolicy, CompareOptions, ControlledVocabulary, FieldAliases, TocStrategy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// 設備名稱表（省略時使用內建名稱表）
    pub vocabulary: Option<Vec<String>>,
    /// 列管試算表的欄位標題
    pub aliases: FieldAliases,
    pub checked_policy: CheckedPolicy,
    pub equipment_source: EquipmentSource,
    pub toc_strategy: TocStrategy,
    pub address_prefix: String,
    pub flag_unbaselined: bool,
    /// 標題列（1 起算）
    pub header_row: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// `config --set` 可設定的項目
pub const SETTABLE_KEYS: &[&str] = &[
    "checked-policy",
    "equipment-source",
    "toc-strategy",
    "address-prefix",
    "flag-unbaselined",
    "header-row",
];

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReconError::Config("找不到使用者家目錄".into()))?;
        Ok(home.join(".config").join("fire-recon").join("config.json"))
    }

    fn default_config() -> Self {
        let compare = CompareOptions::default();
        Self {
            vocabulary: None,
            aliases: FieldAliases::default(),
            checked_policy: CheckedPolicy::default(),
            equipment_source: EquipmentSource::default(),
            toc_strategy: TocStrategy::default(),
            address_prefix: compare.address_prefix,
            flag_unbaselined: compare.flag_unbaselined,
            header_row: 1,
        }
    }

    pub fn vocabulary(&self) -> ControlledVocabulary {
        match &self.vocabulary {
            Some(entries) => ControlledVocabulary::new(entries.iter().map(String::as_str)),
            None => ControlledVocabulary::default(),
        }
    }

    /// 自訂名稱表中互相包含的名稱（`短 ⊂ 長`）
    ///
    /// 預設名稱表不檢查。
    pub fn vocabulary_overlaps(&self) -> Vec<String> {
        if self.vocabulary.is_none() {
            return Vec::new();
        }
        self.vocabulary()
            .overlapping_pairs()
            .into_iter()
            .map(|(short, long)| format!("{} ⊂ {}", short, long))
            .collect()
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            address_prefix: self.address_prefix.clone(),
            flag_unbaselined: self.flag_unbaselined,
        }
    }

    /// 影響擷取結果的設定雜湊（設定變更時快取失效）
    pub fn extraction_fingerprint(&self) -> String {
        let material = serde_json::json!({
            "vocabulary": self.vocabulary().entries(),
            "checkedPolicy": self.checked_policy,
            "equipmentSource": self.equipment_source,
            "tocStrategy": self.toc_strategy,
        });
        hex::encode(Sha256::digest(material.to_string().as_bytes()))
    }

    /// 以 `KEY=VALUE` 修改設定
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ReconError::Config(format!("請以 KEY=VALUE 格式指定: {}", assignment)))?;
        let value = value.trim();

        match key.trim() {
            "checked-policy" => self.checked_policy = value.parse().map_err(ReconError::Config)?,
            "equipment-source" => self.equipment_source = value.parse().map_err(ReconError::Config)?,
            "toc-strategy" => self.toc_strategy = value.parse().map_err(ReconError::Config)?,
            "address-prefix" => self.address_prefix = value.to_string(),
            "flag-unbaselined" => {
                self.flag_unbaselined = value
                    .parse()
                    .map_err(|_| ReconError::Config(format!("請指定 true 或 false: {}", value)))?
            }
            "header-row" => {
                self.header_row = value
                    .parse::<usize>()
                    .ok()
                    .filter(|row| *row >= 1)
                    .ok_or_else(|| ReconError::Config(format!("請指定 1 以上的整數: {}", value)))?
            }
            other => {
                return Err(ReconError::Config(format!(
                    "未知的設定項目: {}（可用: {}）",
                    other,
                    SETTABLE_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}
