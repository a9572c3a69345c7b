use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use idml_translator::pipeline::{ExtractionRun, SkippedPackage, TranslationRun};
use idml_translator::{Extractor, Translator, TranslatorConfig};

#[derive(Parser)]
#[command(name = "idml_translator")]
#[command(about = "从InDesign IDML文件中提取可翻译文本，并将译文回注生成译本")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输入目录（每个包一个子目录）
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// 输出目录
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// 翻译字典目录
    #[arg(short, long, global = true)]
    dictionaries: Option<PathBuf>,

    /// 临时解压目录
    #[arg(long, global = true)]
    temp: Option<PathBuf>,

    /// 静默模式(仅输出警告和错误)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// 详细日志
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// 提取源语言文本，生成翻译字典
    Extract,
    /// 按字典回注译文，生成各语言的IDML
    Translate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;

    match cli.command {
        Command::Extract => handle_extract(&config, cli.quiet),
        Command::Translate => handle_translate(&config, cli.quiet),
    }
}

/// 初始化日志，RUST_LOG 优先
fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// 加载配置文件并应用命令行覆盖
fn load_config(cli: &Cli) -> Result<TranslatorConfig> {
    let mut config = match &cli.config {
        Some(path) => TranslatorConfig::from_file(path)
            .with_context(|| format!("加载配置文件失败: {:?}", path))?,
        None => TranslatorConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(dictionaries) = &cli.dictionaries {
        config.dictionary_dir = dictionaries.clone();
    }
    if let Some(temp) = &cli.temp {
        config.temp_dir = temp.clone();
    }

    config.validate().context("配置无效")?;
    Ok(config)
}

fn handle_extract(config: &TranslatorConfig, quiet: bool) -> Result<()> {
    let run = Extractor::new(config)
        .run()
        .context("提取失败")?;

    if !quiet {
        print_extraction_summary(&run);
    }
    print_skipped(&run.skipped);
    Ok(())
}

fn handle_translate(config: &TranslatorConfig, quiet: bool) -> Result<()> {
    let run = Translator::new(config)
        .run()
        .context("翻译回注失败")?;

    if !quiet {
        print_translation_summary(&run);
    }
    print_skipped(&run.skipped);
    Ok(())
}

/// 打印提取摘要信息
fn print_extraction_summary(run: &ExtractionRun) {
    if run.summaries.is_empty() {
        println!("没有找到可处理的包");
        return;
    }

    for summary in &run.summaries {
        println!("包 {} (源语言 {})", summary.package, summary.source_language);
        print!("{}", summary.stats);
        println!("字典已写入: {:?}", summary.dictionary_path);
        if let Some(backup) = &summary.backup_path {
            println!("原字典已备份到: {:?}", backup);
        }
        println!();
    }
}

/// 打印翻译摘要信息
fn print_translation_summary(run: &TranslationRun) {
    if run.summaries.is_empty() {
        println!("没有生成任何译本");
        return;
    }

    for summary in &run.summaries {
        let report = &summary.report;
        println!("包 {} -> {}", report.package, report.language);
        println!("  处理故事: {}", report.stories.len());
        println!("  替换片段: {}", report.applied());
        println!("  缺少译文: {}", report.missing());
        println!("  未定位片段: {}", report.not_found());
        println!("  输出文件: {:?}", summary.output_path);

        // 显示样例缺失键
        let missing: Vec<&String> = report.stories.iter().flat_map(|s| s.missing.iter()).collect();
        for (i, key) in missing.iter().take(3).enumerate() {
            println!("  {}. 缺少: \"{}\"", i + 1, preview(key));
        }
        if missing.len() > 3 {
            println!("  ... 还有 {} 个缺失片段", missing.len() - 3);
        }
    }
}

/// 打印被跳过的包（静默模式下也输出）
fn print_skipped(skipped: &[SkippedPackage]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!("跳过 {} 个包:", skipped.len());
    for entry in skipped {
        eprintln!("  {}: {}", entry.package, entry.reason);
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}
