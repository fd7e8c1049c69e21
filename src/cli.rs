use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::pipeline::EquipmentSource;
use fire_recon_common::{CheckedPolicy, TocStrategy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fire-recon")]
#[command(about = "消防安全設備檢修申報書 OCR 擷取與列管資料比對工具", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 輸出詳細記錄
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// 擷取設定（未指定時使用設定檔）
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ExtractionArgs {
    /// 設備清單來源 (listed/checked)
    #[arg(long)]
    pub equipment_source: Option<EquipmentSource>,

    /// 勾選來源優先順序 (vision-first/pattern-first/pattern-only/vision-only/union)
    #[arg(long)]
    pub policy: Option<CheckedPolicy>,

    /// 目錄頁判定方式 (phrase/heading)
    #[arg(long)]
    pub toc_strategy: Option<TocStrategy>,

    /// 使用快取（略過已處理的檔案）
    #[arg(long)]
    pub use_cache: bool,
}

impl ExtractionArgs {
    /// 指令列參數覆寫設定檔
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(source) = self.equipment_source {
            config.equipment_source = source;
        }
        if let Some(policy) = self.policy {
            config.checked_policy = policy;
        }
        if let Some(strategy) = self.toc_strategy {
            config.toc_strategy = strategy;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 申報書 OCR 結果 → 結構化資料
    Extract {
        /// 申報書檔案或資料夾（.json / .txt）
        #[arg(required = true)]
        input: PathBuf,

        /// 輸出檔或資料夾（預設: 輸入資料夾）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 輸出格式 (json/csv/excel/all)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// 擷取後與系統列管資料比對
    Compare {
        /// 申報書檔案或資料夾（.json / .txt）
        #[arg(required = true)]
        input: PathBuf,

        /// 列管資料（xlsx/xls/ods/csv）
        #[arg(short, long, required = true)]
        reference: PathBuf,

        /// 輸出檔或資料夾（預設: 輸入資料夾）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 輸出格式 (json/csv/excel/all)
        #[arg(short, long, default_value = "all")]
        format: OutputFormat,

        /// 標題列（1 起算，預設依設定檔）
        #[arg(long)]
        header_row: Option<usize>,

        /// 地址比對前去除的縣市前綴
        #[arg(long)]
        address_prefix: Option<String>,

        /// 自動對應失敗時手動選擇列管資料
        #[arg(short, long)]
        interactive: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// 文字 → 標準設備名稱
    Normalize {
        /// 要正規化的文字（省略時讀取 --file）
        text: Option<String>,

        /// 文字檔
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 目錄頁的勾選判定與證據
    Checked {
        /// 申報書檔案（.json / .txt）
        #[arg(required = true)]
        input: PathBuf,

        /// 目錄頁（1 起算，預設自動判定）
        #[arg(short, long)]
        page: Option<usize>,

        /// 勾選來源優先順序
        #[arg(long)]
        policy: Option<CheckedPolicy>,
    },

    /// 各頁文件類型與附件完整性
    Pages {
        /// 申報書檔案（.json / .txt）
        #[arg(required = true)]
        input: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// 顯示/修改設定
    Config {
        /// 顯示設定
        #[arg(long)]
        show: bool,

        /// 以預設值建立設定檔
        #[arg(long)]
        init: bool,

        /// 修改設定（KEY=VALUE，例如 checked-policy=union）
        #[arg(long)]
        set: Option<String>,
    },

    /// 快取管理
    Cache {
        /// 刪除快取
        #[arg(long)]
        clear: bool,

        /// 對象資料夾（省略時為目前資料夾）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// 顯示快取資訊
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Excel,
    All,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "excel" | "xlsx" => Ok(OutputFormat::Excel),
            "all" => Ok(OutputFormat::All),
            _ => Err(format!("Unknown format: {}. Use json, csv, excel, or all", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Excel => write!(f, "excel"),
            OutputFormat::All => write!(f, "all"),
        }
    }
}
