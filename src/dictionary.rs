//! 翻译字典
//!
//! 结构：页面ID → 故事ID → 源文本 → 译文。每一层都是保序映射，
//! JSON 输出顺序与提取顺序一致。
//!
//! 不变量：
//! - 同一故事内源文本键唯一，后出现的相同键覆盖前者（去重）；
//! - 键总是经过键过滤（移除 U+2028、U+2029），值只经过显示过滤（移除 U+2029），
//!   两者在翻译前也不保证相等。

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hyperlink::{encode_runs, is_encoded_blob};
use crate::io::PackageReader;
use crate::spread::{spread_id_from_file_name, story_ids_for_spread, SpreadOrder, SPREADS_DIR};
use crate::story::{extract_runs, story_file_name, Run, STORIES_DIR};
use crate::string_types::TranslationUnit;
use crate::utils::{clean_display, clean_key, create_backup, IdmlError, Result};

/// 字典文件名
pub const DICTIONARY_FILE: &str = "translation.json";

/// 单个故事的条目：源文本 -> 译文
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryEntries {
    entries: IndexMap<String, String>,
}

impl StoryEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目，相同键覆盖旧值
    pub fn insert(&mut self, source_text: String, target_text: String) {
        self.entries.insert(source_text, target_text);
    }

    /// 以片段原文插入一个恒等条目
    pub fn insert_run(&mut self, run: &Run) {
        self.insert(run.key(), run.content.clone());
    }

    /// 以编码片段插入一个恒等条目
    pub fn insert_blob(&mut self, blob: &str) {
        self.insert(clean_key(blob), clean_display(blob));
    }

    pub fn get(&self, source_text: &str) -> Option<&str> {
        self.entries.get(source_text).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 单个页面的条目：故事ID -> 故事条目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageEntries {
    stories: IndexMap<String, StoryEntries>,
}

impl PageEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为故事打开一个新的空映射，替换该故事已有的映射
    pub fn open_story(&mut self, story_id: &str) -> &mut StoryEntries {
        self.stories.insert(story_id.to_string(), StoryEntries::new());
        self.story_entry(story_id)
    }

    /// 获取故事映射，不存在时创建
    pub fn story_entry(&mut self, story_id: &str) -> &mut StoryEntries {
        self.stories.entry(story_id.to_string()).or_default()
    }

    pub fn story(&self, story_id: &str) -> Option<&StoryEntries> {
        self.stories.get(story_id)
    }

    pub fn stories(&self) -> impl Iterator<Item = (&str, &StoryEntries)> {
        self.stories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 展开为翻译条目列表（故事顺序、条目顺序）
    pub fn units(&self) -> Vec<TranslationUnit> {
        self.stories
            .iter()
            .flat_map(|(story_id, entries)| {
                entries
                    .iter()
                    .map(move |(source, target)| TranslationUnit::from_entry(source, target, story_id))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

/// 翻译字典：页面ID -> 页面条目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationDictionary {
    pages: IndexMap<String, PageEntries>,
}

/// 字典统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryStats {
    pub page_count: usize,
    pub story_count: usize,
    pub entry_count: usize,
    pub encoded_count: usize,
}

impl std::fmt::Display for DictionaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 翻译字典统计 ===")?;
        writeln!(f, "页面数量: {}", self.page_count)?;
        writeln!(f, "故事数量: {}", self.story_count)?;
        writeln!(f, "条目数量: {}", self.entry_count)?;
        writeln!(f, "超链接片段: {}", self.encoded_count)?;
        Ok(())
    }
}

impl TranslationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为页面打开一个新的空映射，替换该页面已有的映射
    pub fn open_page(&mut self, page_id: &str) -> &mut PageEntries {
        self.pages.insert(page_id.to_string(), PageEntries::new());
        self.pages.entry(page_id.to_string()).or_default()
    }

    pub fn page(&self, page_id: &str) -> Option<&PageEntries> {
        self.pages.get(page_id)
    }

    pub fn pages(&self) -> impl Iterator<Item = (&str, &PageEntries)> {
        self.pages.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 获取统计信息
    pub fn stats(&self) -> DictionaryStats {
        let mut stats = DictionaryStats {
            page_count: self.pages.len(),
            ..DictionaryStats::default()
        };
        for page in self.pages.values() {
            stats.story_count += page.len();
            for (_, entries) in page.stories() {
                stats.entry_count += entries.len();
                stats.encoded_count += entries.iter().filter(|(k, _)| is_encoded_blob(k)).count();
            }
        }
        stats
    }

    /// 序列化为 JSON（4 空格缩进）
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buffer)
            .map_err(|e| IdmlError::InvalidPackage(format!("字典序列化结果不是UTF-8: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从文件加载字典
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 保存字典到文件
    ///
    /// 已存在的字典（可能经过人工编辑）会先备份。
    /// 返回备份文件路径（如有）。
    pub fn save(&self, path: &Path) -> Result<Option<PathBuf>> {
        let backup = if path.exists() {
            let backup_path = create_backup(path)?;
            log::info!("已备份现有字典: {:?}", backup_path);
            Some(backup_path)
        } else {
            None
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(backup)
    }
}

/// 由解包目录构建翻译字典
///
/// 跨页按文件名顺序处理；每个跨页打开一个新的页面映射。
/// 同一跨页内连续出现的相同故事ID共用映射，不同的故事ID打开新映射。
/// 故事ID在同一跨页中不连续地重复出现时，之前的条目会被替换。
pub fn build_dictionary<P: PackageReader + ?Sized>(package: &P) -> Result<TranslationDictionary> {
    let order = SpreadOrder::resolve(package)?;
    let mut dictionary = TranslationDictionary::new();

    for spread_file in package.list_spread_files()? {
        log::info!("读取跨页文件 {}", spread_file);
        let spread_id = spread_id_from_file_name(&spread_file);
        let page_id = order.page_id(&spread_id);

        let spread_path = Path::new(SPREADS_DIR).join(&spread_file);
        let spread_text = package.read_text(&spread_path)?;
        let story_ids = story_ids_for_spread(&spread_text);
        log::debug!("跨页 {} ({}) 引用故事: {}", spread_id, page_id, story_ids.join(","));

        let page = dictionary.open_page(&page_id);
        let mut current_story: Option<String> = None;

        for story_id in &story_ids {
            let story_path = Path::new(STORIES_DIR).join(story_file_name(story_id));
            if !package.exists(&story_path) {
                log::warn!("包 {} 缺少故事文件 {:?}", package.name(), story_path);
                continue;
            }

            let extraction = extract_runs(&package.read_text(&story_path)?);
            if extraction.is_partial() {
                log::warn!("包 {} 的故事 {} 只提取了部分文本", package.name(), story_id);
            }
            if extraction.runs().is_empty() {
                continue;
            }

            let entries = if current_story.as_deref() == Some(story_id.as_str()) {
                page.story_entry(story_id)
            } else {
                current_story = Some(story_id.clone());
                page.open_story(story_id)
            };

            if extraction.has_hyperlinks() {
                entries.insert_blob(&encode_runs(extraction.runs()));
            } else {
                for run in extraction.runs() {
                    entries.insert_run(run);
                }
            }
        }
    }

    Ok(dictionary)
}
