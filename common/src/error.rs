//! 錯誤型別定義
//!
//! 比對引擎本身（正規化、欄位擷取、勾選判定、差異比對）皆為全函數，
//! 不會回傳錯誤；此處的錯誤只出現在視覺模型回應的解析。

use thiserror::Error;

/// 共用錯誤型別
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result 型別別名
pub type Result<T> = std::result::Result<T, Error>;
