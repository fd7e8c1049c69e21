use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("設定錯誤: {0}")]
    Config(String),

    #[error("找不到檔案: {0}")]
    FileNotFound(String),

    #[error("找不到資料夾: {0}")]
    FolderNotFound(String),

    #[error("找不到申報書檔案（.json / .txt）: {0}")]
    NoDocumentsFound(String),

    #[error("不支援的檔案格式: {0}")]
    UnsupportedFormat(String),

    #[error("申報書讀取錯誤: {0}")]
    DocumentLoad(String),

    #[error("列管資料讀取錯誤: {0}")]
    Reference(String),

    #[error("試算表讀取錯誤: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV 讀寫錯誤: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel 產生錯誤: {0}")]
    ExcelGeneration(String),

    #[error("互動輸入錯誤: {0}")]
    Prompt(String),

    #[error("{0}")]
    Engine(#[from] fire_recon_common::Error),

    #[error("JSON 解析錯誤: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconError>;
