//! 故事回注
//!
//! 给定（可能经过人工编辑的）字典，按跨页重写解包目录中的故事文档。
//! 跨页与故事严格顺序处理：同一文件中后面的替换必须看到前面替换的结果。

pub mod patcher;

pub use patcher::{DocumentPatcher, FirstOccurrencePatcher};

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::dictionary::{PageEntries, TranslationDictionary};
use crate::hyperlink::decode_units;
use crate::io::{PackageReader, PackageWriter};
use crate::spread::{spread_id_from_file_name, story_ids_for_spread, SpreadOrder, SPREADS_DIR};
use crate::story::{story_file_name, story_key_map, STORIES_DIR};
use crate::string_types::TranslationUnit;
use crate::utils::{clean_display, IdmlError, Result};

/// 译文查找结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// 在所属故事中找到
    Story(&'a str),
    /// 只在页面的扁平映射中找到
    Fallback(&'a str),
    Missing,
}

/// 单个跨页的译文映射
#[derive(Debug, Clone, Default)]
pub struct SpreadTranslations {
    per_story: HashMap<String, HashMap<String, String>>,
    fallback: HashMap<String, String>,
}

impl SpreadTranslations {
    /// 由页面条目构建，编码片段先解码为逐片段条目
    pub fn from_page(page: &PageEntries) -> Self {
        let mut translations = Self::default();
        for unit in page.units() {
            if unit.is_html() {
                log::debug!("解码故事 {} 的超链接片段", unit.story_id);
                for sub_unit in decode_units(&unit.source_text, &unit.target_text, &unit.story_id) {
                    translations.insert(sub_unit);
                }
            } else {
                translations.insert(unit);
            }
        }
        translations
    }

    /// 空译文不进入映射，查找时按缺失处理
    fn insert(&mut self, unit: TranslationUnit) {
        if unit.is_untranslated() {
            return;
        }
        if !unit.story_id.is_empty() {
            self.per_story
                .entry(unit.story_id.clone())
                .or_default()
                .insert(unit.source_text.clone(), unit.target_text.clone());
        }
        self.fallback.insert(unit.source_text, unit.target_text);
    }

    /// 查找译文：所属故事优先，其次扁平映射
    pub fn lookup(&self, story_id: &str, key: &str) -> Lookup<'_> {
        let from_story = self
            .per_story
            .get(story_id)
            .and_then(|entries| entries.get(key));
        if let Some(target) = from_story {
            return Lookup::Story(target);
        }

        match self.fallback.get(key) {
            Some(target) => Lookup::Fallback(target),
            None => Lookup::Missing,
        }
    }

    /// 扁平映射中的条目数
    pub fn len(&self) -> usize {
        self.fallback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fallback.is_empty()
    }
}

/// 单个故事的回注结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryReport {
    pub story_id: String,
    /// 成功替换的键数量（含扁平映射）
    pub applied: usize,
    /// 使用扁平映射的键数量
    pub fallback_used: usize,
    /// 字典中没有译文的键（原文保留）
    pub missing: Vec<String>,
    /// 有译文但在文档文本中找不到的键
    pub not_found: Vec<String>,
}

/// 整个包的回注结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReinjectionReport {
    pub package: String,
    pub language: String,
    pub stories: Vec<StoryReport>,
}

impl ReinjectionReport {
    pub fn applied(&self) -> usize {
        self.stories.iter().map(|s| s.applied).sum()
    }

    pub fn missing(&self) -> usize {
        self.stories.iter().map(|s| s.missing.len()).sum()
    }

    pub fn not_found(&self) -> usize {
        self.stories.iter().map(|s| s.not_found.len()).sum()
    }
}

/// 故事回注引擎
#[derive(Debug, Clone, Default)]
pub struct StoryReinjector<T: DocumentPatcher = FirstOccurrencePatcher> {
    patcher: T,
}

impl StoryReinjector<FirstOccurrencePatcher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: DocumentPatcher> StoryReinjector<T> {
    /// 使用自定义修补策略
    pub fn with_patcher(patcher: T) -> Self {
        Self { patcher }
    }

    /// 回注整个包
    ///
    /// 跨页的页面ID在字典中不存在时立即返回 [`IdmlError::MissingPage`]，
    /// 之后的跨页都不会被处理。
    pub fn reinject_package<P>(
        &self,
        package: &P,
        dictionary: &TranslationDictionary,
        language: &str,
    ) -> Result<ReinjectionReport>
    where
        P: PackageReader + PackageWriter + ?Sized,
    {
        let order = SpreadOrder::resolve(package)?;
        let mut report = ReinjectionReport {
            package: package.name().to_string(),
            language: language.to_string(),
            stories: Vec::new(),
        };
        let mut rewritten: HashSet<String> = HashSet::new();

        for spread_file in package.list_spread_files()? {
            let spread_id = spread_id_from_file_name(&spread_file);
            let page_id = order.page_id(&spread_id);
            log::info!("跨页 {} 对应页面 {}", spread_id, page_id);

            let Some(page) = dictionary.page(&page_id) else {
                log::error!(
                    "In InDesign file {}: missing pageId {} in translation file for language {} (spread {})",
                    package.name(),
                    page_id,
                    language,
                    spread_id
                );
                return Err(IdmlError::MissingPage {
                    package: package.name().to_string(),
                    spread: spread_id,
                    page: page_id,
                    language: language.to_string(),
                });
            };
            let translations = SpreadTranslations::from_page(page);
            log::debug!("页面 {} 共 {} 个译文条目", page_id, translations.len());

            let spread_text = package.read_text(&Path::new(SPREADS_DIR).join(&spread_file))?;
            for story_id in story_ids_for_spread(&spread_text) {
                // 跨多个文本框或跨页串接的故事只重写一次
                if !rewritten.insert(story_id.clone()) {
                    log::debug!("故事 {} 已处理，跳过", story_id);
                    continue;
                }

                let story_path = Path::new(STORIES_DIR).join(story_file_name(&story_id));
                if !package.exists(&story_path) {
                    log::warn!("包 {} 缺少故事文件 {:?}", package.name(), story_path);
                    continue;
                }

                let original = package.read_text(&story_path)?;
                let (document, story_report) = self.reinject_story(
                    &original,
                    &story_id,
                    &translations,
                    package.name(),
                );
                package.write_text(&story_path, &document)?;
                report.stories.push(story_report);
            }
        }

        log::info!(
            "包 {} ({}) 回注完成: 替换 {} 处，缺失 {} 处，未定位 {} 处",
            report.package,
            language,
            report.applied(),
            report.missing(),
            report.not_found()
        );
        Ok(report)
    }

    /// 回注单个故事文档，返回新文档文本
    ///
    /// 先从整个文档中移除段落分隔符，再按当前文档的片段键逐一替换。
    pub fn reinject_story(
        &self,
        original: &str,
        story_id: &str,
        translations: &SpreadTranslations,
        package_name: &str,
    ) -> (String, StoryReport) {
        let mut document = clean_display(original);
        let mut report = StoryReport {
            story_id: story_id.to_string(),
            ..StoryReport::default()
        };

        for key in story_key_map(original).keys() {
            let target = match translations.lookup(story_id, key) {
                Lookup::Story(target) => target,
                Lookup::Fallback(target) => {
                    log::warn!("故事 {} 使用了不属于该故事的译文: {}", story_id, key);
                    report.fallback_used += 1;
                    target
                }
                Lookup::Missing => {
                    log::warn!("In InDesign file {}: missing translation for {:?}", package_name, key);
                    report.missing.push(key.clone());
                    continue;
                }
            };

            if self.patcher.patch(&mut document, key, target) {
                report.applied += 1;
            } else {
                log::warn!("故事 {} 的文本中找不到键: {:?}", story_id, key);
                report.not_found.push(key.clone());
            }
        }

        (document, report)
    }
}
