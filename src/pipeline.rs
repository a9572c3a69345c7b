//! 提取与翻译流程
//!
//! 输入目录下每个子目录是一个包，包内的 `.idml` 文件名即源语言代码。
//! 所有包、语言、跨页均按顺序处理；任何致命错误都会终止整个运行。

use std::path::{Path, PathBuf};

use crate::archive::{extract_package, write_package};
use crate::config::TranslatorConfig;
use crate::dictionary::{build_dictionary, DictionaryStats, TranslationDictionary};
use crate::io::DirectoryPackage;
use crate::language::{dictionary_path, source_language_from_file_name, target_languages};
use crate::reinject::{ReinjectionReport, StoryReinjector};
use crate::utils::{IdmlError, Result};
use crate::IDML_EXTENSION;

/// 输入目录中的一个包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    pub name: String,
    pub idml_path: PathBuf,
    pub source_language: String,
}

impl PackageSource {
    /// 在 `<input>/<name>/` 中定位包
    ///
    /// 优先 `<name>.idml`，否则取目录中（按文件名排序）第一个 `.idml`。
    pub fn locate(input_dir: &Path, name: &str) -> Result<Self> {
        let package_dir = input_dir.join(name);
        let preferred = package_dir.join(format!("{}.{}", name, IDML_EXTENSION));

        let idml_path = if preferred.is_file() {
            preferred
        } else {
            let mut candidates: Vec<PathBuf> = match std::fs::read_dir(&package_dir) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file() && has_idml_extension(path))
                    .collect(),
                Err(_) => Vec::new(),
            };
            candidates.sort();
            candidates
                .into_iter()
                .next()
                .ok_or_else(|| IdmlError::PackageNotFound(package_dir.clone()))?
        };

        let source_language = source_language_from_file_name(&idml_path).ok_or_else(|| {
            IdmlError::InvalidPackage(format!("cannot detect source language from {:?}", idml_path))
        })?;

        Ok(Self {
            name: name.to_string(),
            idml_path,
            source_language,
        })
    }
}

/// 列出输入目录下的包目录名（排序）
pub fn discover_packages(input_dir: &Path) -> Result<Vec<String>> {
    if !input_dir.exists() {
        std::fs::create_dir_all(input_dir)?;
        log::info!("创建不存在的输入目录 {:?}", input_dir);
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn has_idml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(IDML_EXTENSION))
        .unwrap_or(false)
}

/// 清空并重建目录
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
        log::info!("已清空目录 {:?}", dir);
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// 被跳过的包及原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    pub package: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 包目录中没有 `.idml` 文件
    NoIdml(PathBuf),
    /// 字典目录中没有该包的子目录
    NoDictionaries(PathBuf),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoIdml(dir) => write!(f, "{:?} 中没有 IDML 文件", dir),
            SkipReason::NoDictionaries(dir) => write!(f, "字典目录 {:?} 不存在", dir),
        }
    }
}

/// 定位包；找不到 `.idml` 时返回跳过记录，其他错误照常返回
fn locate_or_skip(
    input_dir: &Path,
    name: &str,
) -> Result<std::result::Result<PackageSource, SkippedPackage>> {
    match PackageSource::locate(input_dir, name) {
        Ok(source) => Ok(Ok(source)),
        Err(IdmlError::PackageNotFound(dir)) => {
            log::warn!("找不到包 {} 的 IDML 文件: {:?}", name, dir);
            Ok(Err(SkippedPackage {
                package: name.to_string(),
                reason: SkipReason::NoIdml(dir),
            }))
        }
        Err(e) => Err(e),
    }
}

/// 单个包的提取结果
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    pub package: String,
    pub source_language: String,
    pub dictionary_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub stats: DictionaryStats,
}

/// 一次提取运行的结果
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    pub summaries: Vec<ExtractionSummary>,
    pub skipped: Vec<SkippedPackage>,
}

/// 源语言字典提取器
pub struct Extractor<'a> {
    config: &'a TranslatorConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a TranslatorConfig) -> Self {
        Self { config }
    }

    /// 处理输入目录下的全部包
    ///
    /// 找不到 `.idml` 的包目录被跳过，记入 [`ExtractionRun::skipped`]。
    pub fn run(&self) -> Result<ExtractionRun> {
        self.config.validate()?;
        reset_dir(&self.config.temp_dir)?;

        let mut run = ExtractionRun::default();
        for name in discover_packages(&self.config.input_dir)? {
            match locate_or_skip(&self.config.input_dir, &name)? {
                Ok(source) => run.summaries.push(self.extract(&source)?),
                Err(skipped) => run.skipped.push(skipped),
            }
        }
        Ok(run)
    }

    /// 提取单个包并保存源语言字典
    pub fn extract(&self, source: &PackageSource) -> Result<ExtractionSummary> {
        log::info!(
            "提取 {:?}（源语言 {}）",
            source.idml_path,
            source.source_language
        );

        let unpacked = self.config.temp_dir.join(&source.name).join(&source.name);
        extract_package(&source.idml_path, &unpacked)?;

        let package = DirectoryPackage::new(&unpacked, source.name.as_str());
        let dictionary = build_dictionary(&package)?;

        let path = dictionary_path(
            &self.config.dictionary_dir,
            &source.name,
            &source.source_language,
        );
        let backup_path = dictionary.save(&path)?;
        log::info!("字典已写入 {:?}", path);

        Ok(ExtractionSummary {
            package: source.name.clone(),
            source_language: source.source_language.clone(),
            dictionary_path: path,
            backup_path,
            stats: dictionary.stats(),
        })
    }
}

/// 单个包单个语言的翻译结果
#[derive(Debug, Clone)]
pub struct TranslationSummary {
    pub output_path: PathBuf,
    pub report: ReinjectionReport,
}

/// 一次翻译运行的结果
#[derive(Debug, Clone, Default)]
pub struct TranslationRun {
    pub summaries: Vec<TranslationSummary>,
    pub skipped: Vec<SkippedPackage>,
}

/// 译文回注器：为每个目标语言生成翻译后的 `.idml`
pub struct Translator<'a> {
    config: &'a TranslatorConfig,
    reinjector: StoryReinjector,
}

impl<'a> Translator<'a> {
    pub fn new(config: &'a TranslatorConfig) -> Self {
        Self {
            config,
            reinjector: StoryReinjector::new(),
        }
    }

    /// 处理输入目录下的全部包
    ///
    /// 运行前清空临时目录与输出目录。
    /// 没有 `.idml` 或没有字典目录的包被跳过，记入 [`TranslationRun::skipped`]。
    pub fn run(&self) -> Result<TranslationRun> {
        self.config.validate()?;
        reset_dir(&self.config.temp_dir)?;
        reset_dir(&self.config.output_dir)?;

        let mut run = TranslationRun::default();
        for name in discover_packages(&self.config.input_dir)? {
            let source = match locate_or_skip(&self.config.input_dir, &name)? {
                Ok(source) => source,
                Err(skipped) => {
                    run.skipped.push(skipped);
                    continue;
                }
            };

            let package_dictionaries = self.config.dictionary_dir.join(&source.name);
            if !package_dictionaries.is_dir() {
                log::warn!("包 {} 没有字典目录 {:?}", source.name, package_dictionaries);
                run.skipped.push(SkippedPackage {
                    package: source.name,
                    reason: SkipReason::NoDictionaries(package_dictionaries),
                });
                continue;
            }

            run.summaries.extend(self.translate(&source)?);
        }
        Ok(run)
    }

    /// 为单个包的所有目标语言生成译本
    ///
    /// 包的字典目录必须存在。
    pub fn translate(&self, source: &PackageSource) -> Result<Vec<TranslationSummary>> {
        let output_dir = self.config.output_dir.join(&source.name);
        std::fs::create_dir_all(&output_dir)?;

        if let Some(file_name) = source.idml_path.file_name() {
            std::fs::copy(&source.idml_path, output_dir.join(file_name))?;
        }

        let package_dictionaries = self.config.dictionary_dir.join(&source.name);
        let languages = target_languages(&package_dictionaries, &source.source_language)?;
        log::info!("包 {} 的目标语言: {}", source.name, languages.join(","));

        let mut summaries = Vec::new();
        for language in languages {
            summaries.push(self.translate_language(source, &language, &output_dir)?);
        }
        Ok(summaries)
    }

    fn translate_language(
        &self,
        source: &PackageSource,
        language: &str,
        output_dir: &Path,
    ) -> Result<TranslationSummary> {
        let path = dictionary_path(&self.config.dictionary_dir, &source.name, language);
        if !path.is_file() {
            log::error!(
                "In InDesign file {}: missing translation file {:?} for language {}",
                source.name,
                path,
                language
            );
            return Err(IdmlError::MissingDictionary {
                package: source.name.clone(),
                language: language.to_string(),
                path,
            });
        }
        log::info!("读取字典 {:?}", path);
        let dictionary = TranslationDictionary::load(&path)?;

        let unpacked = self.config.temp_dir.join(&source.name).join(language);
        log::info!("为语言 {} 解压源 IDML", language);
        extract_package(&source.idml_path, &unpacked)?;

        let package = DirectoryPackage::new(&unpacked, source.name.as_str());
        let report = self.reinjector.reinject_package(&package, &dictionary, language)?;

        let output_path = output_dir.join(format!("{}.{}", language, IDML_EXTENSION));
        log::info!("写入 {} 的 {} 译本: {:?}", source.name, language, output_path);
        write_package(&unpacked, &output_path)?;

        Ok(TranslationSummary {
            output_path,
            report,
        })
    }
}
