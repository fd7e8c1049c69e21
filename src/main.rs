use clap::Parser;
use fire_recon::{cache, cli, config, error, export, master, pipeline, scanner, selector};
use cli::{Cli, Commands};
use config::Config;
use error::{ReconError, Result};
use fire_recon_common::checked::collect_evidence;
use fire_recon_common::{join_items, normalize_with, resolve_checked, FieldExtractor};
use pipeline::{CompareContext, DocumentResult, ExtractionSettings};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .compact()
        .init();
}

/// 擷取（依需要使用快取）
fn run_extraction(input: &Path, config: &Config, use_cache: bool, steps: usize) -> Result<Vec<DocumentResult>> {
    let documents = scanner::collect_documents(input)?;
    println!("✔ {} 份申報書\n", documents.len());

    println!("[2/{}] 擷取中...{}", steps, if use_cache { "（使用快取）" } else { "" });
    let results = if use_cache {
        pipeline::process_documents_with_cache(&documents, &scanner::working_folder(input), config, true)?
    } else {
        pipeline::process_documents(&documents, &ExtractionSettings::from_config(config), true)
    };

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        println!("⚠ {} 份無法讀取（結果欄位空白）", failed);
    }
    println!("✔ 擷取完成\n");
    Ok(results)
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("✔ 已輸出: {}", path.display());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Extract { input, output, format, extraction } => {
            println!("🔥 fire-recon - 申報書擷取\n");
            let mut config = config;
            extraction.apply_to(&mut config);

            println!("[1/3] 讀取申報書...");
            let results = run_extraction(&input, &config, extraction.use_cache, 3)?;

            for result in &results {
                let missing = result.missing_attachments();
                if !missing.is_empty() {
                    println!("  ⚠ {}: 缺少附件 {}", result.file_name, missing.join("、"));
                }
            }

            println!("[3/3] 輸出中...");
            let output = output.unwrap_or_else(|| scanner::working_folder(&input));
            let written = export::export_extraction(&results, &format, &output)?;
            print_written(&written);

            println!("\n✅ 完成");
        }

        Commands::Compare {
            input,
            reference,
            output,
            format,
            header_row,
            address_prefix,
            interactive,
            extraction,
        } => {
            println!("🔥 fire-recon - 列管資料比對\n");
            let mut config = config;
            extraction.apply_to(&mut config);
            if let Some(prefix) = address_prefix {
                config.address_prefix = prefix;
            }
            let header_row = header_row.unwrap_or(config.header_row);

            println!("[1/4] 讀取申報書...");
            let results = run_extraction(&input, &config, extraction.use_cache, 4)?;

            println!("[3/4] 比對列管資料: {}", reference.display());
            let rows = master::load_reference_rows(&reference, header_row)?;
            println!("✔ 列管資料 {} 筆", rows.len());

            let vocabulary = config.vocabulary();
            let options = config.compare_options();
            let context = CompareContext {
                rows: &rows,
                aliases: &config.aliases,
                vocabulary: &vocabulary,
                options: &options,
            };
            let names = master::site_names(&rows, &config.aliases);
            let outcomes = pipeline::compare_results(results, &context, |document| {
                if interactive {
                    selector::select_reference_row(document, &names)
                } else {
                    Ok(None)
                }
            })?;

            println!();
            for outcome in &outcomes {
                match &outcome.report {
                    Some(report) => println!(
                        "  {} {}: {}（相似度 {:.0}%）",
                        if report.overall_match { "✔" } else { "✖" },
                        outcome.file_name,
                        report.summary(),
                        report.overall_similarity * 100.0
                    ),
                    None => println!("  ? {}: 無對應的列管資料", outcome.file_name),
                }
            }

            println!("\n[4/4] 輸出中...");
            let output = output.unwrap_or_else(|| scanner::working_folder(&input));
            let written = export::export_comparison(&outcomes, &format, &output)?;
            print_written(&written);

            println!("\n✅ 完成");
        }

        Commands::Normalize { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => {
                    if !path.exists() {
                        return Err(ReconError::FileNotFound(path.display().to_string()));
                    }
                    std::fs::read_to_string(&path)?
                }
                (None, None) => return Err(ReconError::Config("請指定文字或 --file".into())),
            };

            let items = normalize_with(&config.vocabulary(), &text);
            println!("{}", join_items(&items));
        }

        Commands::Checked { input, page, policy } => {
            let doc = scanner::load_document(&input)?;
            let vocabulary = config.vocabulary();
            let extractor = FieldExtractor::new(&vocabulary).with_toc_strategy(config.toc_strategy);

            let index = match page {
                Some(page) if page >= 1 && page <= doc.pages.len() => page - 1,
                Some(page) => {
                    return Err(ReconError::DocumentLoad(format!(
                        "頁碼超出範圍: {}（共 {} 頁）",
                        page,
                        doc.pages.len()
                    )))
                }
                None => extractor
                    .locate_toc_page(&doc.pages)
                    .ok_or_else(|| ReconError::DocumentLoad(format!("找不到目錄頁: {}", input.display())))?,
            };

            println!("📋 目錄頁: 第 {} 頁\n", index + 1);
            let inference = collect_evidence(&doc.pages[index], &vocabulary);

            println!("勾選證據:");
            for evidence in &inference.evidence {
                println!("  ✔ {}  [{:?}] {}", evidence.item, evidence.kind, evidence.snippet.trim());
            }
            if !inference.unchecked.is_empty() {
                println!("未勾選: {}", join_items(&inference.unchecked));
            }

            let vision = doc.vision_items();
            let policy = policy.unwrap_or(config.checked_policy);
            let resolution = resolve_checked(policy, &inference, vision.as_deref(), &vocabulary);

            println!("\n政策: {}", policy);
            println!("採用: {:?}", resolution.source);
            println!("設備: {}", join_items(&resolution.items));
        }

        Commands::Pages { input, extraction } => {
            let mut config = config;
            extraction.apply_to(&mut config);

            let doc = scanner::load_document(&input)?;
            let file_name = scanner::DocumentInfo::from_path(&input).file_name;
            let settings = ExtractionSettings::from_config(&config);
            let result = pipeline::extract_document(&file_name, &doc, &settings);

            println!("📄 {}（{} 頁）\n", file_name, doc.pages.len());
            for (i, label) in doc.labels().iter().enumerate() {
                let marker = if result.toc_page == Some(i) { "  ← 目錄" } else { "" };
                println!("  {:>3}: {}{}", i + 1, label, marker);
            }

            if result.attachments.is_empty() {
                println!("\n（沒有設備清單，不檢查附件）");
            } else {
                println!("\n附件:");
                for status in &result.attachments {
                    let category = settings.vocabulary.category_of(&status.item).unwrap_or("其他");
                    let pages: Vec<String> = status.pages.iter().map(|p| (p + 1).to_string()).collect();
                    if status.present {
                        println!("  ✔ [{}] {}（第 {} 頁）", category, status.item, pages.join(", "));
                    } else {
                        println!("  ✖ [{}] {}", category, status.item);
                    }
                }
            }
        }

        Commands::Config { show, init, set } => {
            let mut config = config;

            if init {
                config = Config::default();
                config.save()?;
                println!("✔ 已建立設定檔: {}", Config::config_path()?.display());
            }

            if let Some(assignment) = set.as_deref() {
                config.set(assignment)?;
                config.save()?;
                println!("✔ 已更新設定: {}", assignment);
            }

            if show || (!init && set.is_none()) {
                println!("設定檔: {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);

                let overlaps = config.vocabulary_overlaps();
                if !overlaps.is_empty() {
                    println!("\n名稱互相包含（長名稱優先比對）:");
                    for overlap in overlaps {
                        println!("  {}", overlap);
                    }
                }
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = cache::CacheFile::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache_file = cache::CacheFile::load(&target);
                    println!("快取資訊:");
                    println!("  路徑: {}", cache_path.display());
                    println!("  筆數: {}", cache_file.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  大小: {} bytes", meta.len());
                    }
                } else {
                    println!("沒有快取檔: {}", cache_path.display());
                }
            }

            if clear {
                match cache::CacheFile::clear(&target) {
                    Ok(true) => println!("✔ 已刪除快取: {}", cache_path.display()),
                    Ok(false) => println!("沒有快取檔"),
                    Err(e) => println!("快取刪除失敗: {}", e),
                }
            }
        }
    }

    Ok(())
}
