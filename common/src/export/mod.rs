//! 報表匯出（需要 `excel` feature）

#[cfg(feature = "excel")]
pub mod excel_core;
