//! 擷取結果快取
//!
//! 以申報書檔案的 SHA-256 為鍵保存擷取結果，同一檔案不重複處理。
//! 檔案內容變更時雜湊不同，新的結果取代舊的；擷取設定變更時整份快取失效。

use crate::error::Result;
use crate::pipeline::DocumentResult;
use crate::scanner::DocumentInfo;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".fire-recon-cache.json";

/// 快取檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// 格式版本
    version: u32,
    /// 建立快取時的擷取設定雜湊
    #[serde(default)]
    settings: String,
    /// 檔案雜湊 → 擷取結果
    entries: HashMap<String, CacheEntry>,
}

/// 快取項目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_name: String,
    pub file_size: u64,
    pub result: DocumentResult,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// 讀取快取檔（不存在或格式不符時回傳空快取）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, CacheFile>(reader) {
            Ok(cache) => {
                if cache.version != Self::CURRENT_VERSION {
                    tracing::warn!("快取版本不符，重新建立: {}", cache_path.display());
                    return Self::default();
                }
                cache
            }
            Err(e) => {
                tracing::warn!("快取檔無法讀取，重新建立: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// 刪除快取檔（不存在時回傳 `false`）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(cache_path)?;
        Ok(true)
    }

    /// 擷取設定不同時清空
    pub fn ensure_settings(&mut self, fingerprint: &str) {
        if self.settings != fingerprint {
            if !self.entries.is_empty() {
                tracing::info!("擷取設定已變更，捨棄 {} 筆快取", self.entries.len());
            }
            self.entries.clear();
            self.settings = fingerprint.to_string();
        }
    }

    pub fn get(&self, hash: &str) -> Option<&DocumentResult> {
        self.entries.get(hash).map(|e| &e.result)
    }

    pub fn insert(&mut self, hash: String, file_name: String, file_size: u64, result: DocumentResult) {
        self.entries.insert(hash, CacheEntry {
            file_name,
            file_size,
            result,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            settings: String::new(),
            entries: HashMap::new(),
        }
    }
}

/// 檔案的 SHA-256（16 進位字串）
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// 分出已快取與未快取的申報書
///
/// 回傳 (索引, 快取結果) 與 (索引, 申報書, 雜湊)；索引為 `documents` 中的位置。
/// 雜湊計算失敗的檔案視為未快取（雜湊為空字串，不寫入快取）。
pub fn filter_cached_documents(
    documents: &[DocumentInfo],
    cache: &CacheFile,
) -> (Vec<(usize, DocumentResult)>, Vec<(usize, DocumentInfo, String)>) {
    let mut cached = Vec::new();
    let mut uncached = Vec::new();

    for (index, doc) in documents.iter().enumerate() {
        let hash = match compute_file_hash(&doc.path) {
            Ok(h) => h,
            Err(_) => {
                uncached.push((index, doc.clone(), String::new()));
                continue;
            }
        };

        match cache.get(&hash) {
            Some(result) => {
                let mut result = result.clone();
                result.file_name = doc.file_name.clone();
                cached.push((index, result));
            }
            None => uncached.push((index, doc.clone(), hash)),
        }
    }

    (cached, uncached)
}
