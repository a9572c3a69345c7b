//! 故事文本提取
//!
//! 遍历路径：`idPkg:Story` → `Story` → `ParagraphStyleRange` →
//! `CharacterStyleRange` → (`HyperlinkTextSource` | `Content`)。
//! 每个字符样式范围产生零个或多个按文档顺序排列的 [`Run`]。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::markup::{self, XmlElement};
use crate::schema::{
    CHARACTER_STYLE_RANGES, CONTENT_FRAGMENTS, HYPERLINK_TEXT_SOURCES, PARAGRAPH_STYLE_RANGES,
    STORY_ROOT,
};
use crate::utils::{clean_display, clean_key};

/// 故事文件名前缀
pub const STORY_FILE_PREFIX: &str = "Story_";
/// 故事文件目录
pub const STORIES_DIR: &str = "Stories";

/// 故事 ID 对应的文件名：`u19f` -> `Story_u19f.xml`
pub fn story_file_name(story_id: &str) -> String {
    format!("{}{}.xml", STORY_FILE_PREFIX, story_id)
}

/// 文本片段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Text,
    Hyperlink,
}

/// 最小可翻译单元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// 显示文本（已解码、已做显示过滤）
    pub content: String,
    pub kind: RunKind,
    /// 源标记中的稳定 ID（超链接源的 `Self` 属性）
    pub identity: Option<String>,
    /// 链接标题（超链接源的 `Name` 属性）
    pub label: Option<String>,
}

impl Run {
    /// 创建普通文本片段
    pub fn text(raw: &str) -> Self {
        Run {
            content: clean_display(raw),
            kind: RunKind::Text,
            identity: None,
            label: None,
        }
    }

    /// 创建超链接片段
    pub fn hyperlink(raw: &str, identity: Option<String>, label: Option<String>) -> Self {
        Run {
            content: clean_display(raw),
            kind: RunKind::Hyperlink,
            identity,
            label,
        }
    }

    /// 字典键（键过滤）
    pub fn key(&self) -> String {
        clean_key(&self.content)
    }

    pub fn is_hyperlink(&self) -> bool {
        self.kind == RunKind::Hyperlink
    }
}

/// 故事提取结果
#[derive(Debug, Clone, PartialEq)]
pub enum StoryExtraction {
    /// 完整解析
    Complete(Vec<Run>),
    /// 结构异常，只包含异常之前已闭合的范围中的片段
    Partial { runs: Vec<Run>, diagnostic: String },
}

impl StoryExtraction {
    pub fn runs(&self) -> &[Run] {
        match self {
            StoryExtraction::Complete(runs) => runs,
            StoryExtraction::Partial { runs, .. } => runs,
        }
    }

    pub fn into_runs(self) -> Vec<Run> {
        match self {
            StoryExtraction::Complete(runs) => runs,
            StoryExtraction::Partial { runs, .. } => runs,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, StoryExtraction::Partial { .. })
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            StoryExtraction::Complete(_) => None,
            StoryExtraction::Partial { diagnostic, .. } => Some(diagnostic),
        }
    }

    /// 是否包含超链接片段
    pub fn has_hyperlinks(&self) -> bool {
        self.runs().iter().any(Run::is_hyperlink)
    }
}

/// 提取故事文档中的片段列表
///
/// 根节点或片段列表缺失时返回空列表，从不返回错误。
pub fn extract_runs(story_text: &str) -> StoryExtraction {
    let parsed = markup::parse(story_text);

    let runs = match parsed.root() {
        Some(root) if root.name == STORY_ROOT => collect_runs(root),
        _ => Vec::new(),
    };

    match parsed.diagnostic {
        None => StoryExtraction::Complete(runs),
        Some(diagnostic) => {
            log::warn!(
                "故事解析不完整（已提取 {} 个片段）: {}",
                runs.len(),
                diagnostic
            );
            StoryExtraction::Partial { runs, diagnostic }
        }
    }
}

fn collect_runs(root: &XmlElement) -> Vec<Run> {
    let mut runs = Vec::new();
    for psr in PARAGRAPH_STYLE_RANGES.select(root) {
        for csr in CHARACTER_STYLE_RANGES.select(psr) {
            // 解析中断处未闭合的范围内容不完整，跳过
            if !csr.closed {
                continue;
            }
            collect_character_range(csr, &mut runs);
        }
    }
    runs
}

fn collect_character_range(csr: &XmlElement, runs: &mut Vec<Run>) {
    if let Some(run) = hyperlink_run(csr) {
        runs.push(run);
        return;
    }

    for content in CONTENT_FRAGMENTS.select(csr) {
        let text = content.text_content();
        let text = text.trim();
        if !text.is_empty() {
            runs.push(Run::text(text));
        }
    }
}

/// 第一个超链接源且恰好包含一个非空内容时，产生超链接片段
fn hyperlink_run(csr: &XmlElement) -> Option<Run> {
    let source = HYPERLINK_TEXT_SOURCES.select(csr).into_iter().next()?;
    let contents = CONTENT_FRAGMENTS.select(source);
    let [content] = contents.as_slice() else {
        return None;
    };

    let text = content.text_content();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Run::hyperlink(
        text,
        source.attribute("Self").map(str::to_string),
        source.attribute("Name").map(str::to_string),
    ))
}

/// 当前文档的 键 -> 显示文本 映射（文档顺序，重复键后者覆盖前者的值）
pub fn story_key_map(story_text: &str) -> IndexMap<String, String> {
    extract_runs(story_text)
        .into_runs()
        .into_iter()
        .map(|run| (run.key(), run.content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<idPkg:Story xmlns:idPkg="http://ns.adobe.com/AdobeInDesign/idml/1.0/packaging" DOMVersion="15.0">
	<Story Self="u19f" AppliedTOCStyle="n">
{}
	</Story>
</idPkg:Story>"#,
            body
        )
    }

    #[test]
    fn test_plain_runs_in_order() {
        let text = story(
            r#"<ParagraphStyleRange AppliedParagraphStyle="ParagraphStyle/Body">
	<CharacterStyleRange AppliedCharacterStyle="CharacterStyle/$ID/[No character style]">
		<Content>A</Content>
	</CharacterStyleRange>
	<CharacterStyleRange AppliedCharacterStyle="CharacterStyle/Bold">
		<Content>B</Content>
		<Br />
		<Content>C</Content>
	</CharacterStyleRange>
</ParagraphStyleRange>"#,
        );
        let extraction = extract_runs(&text);
        assert!(!extraction.is_partial());

        let contents: Vec<_> = extraction.runs().iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B", "C"]);
        assert!(extraction.runs().iter().all(|r| r.kind == RunKind::Text));
    }

    #[test]
    fn test_hyperlink_run() {
        let text = story(
            r#"<ParagraphStyleRange>
	<CharacterStyleRange>
		<Content>Visit </Content>
	</CharacterStyleRange>
	<CharacterStyleRange>
		<HyperlinkTextSource Self="u1d2" Name="Home page" Hidden="false">
			<Content>our site</Content>
		</HyperlinkTextSource>
	</CharacterStyleRange>
</ParagraphStyleRange>"#,
        );
        let extraction = extract_runs(&text);
        assert!(extraction.has_hyperlinks());

        let runs = extraction.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], Run::text("Visit"));
        assert_eq!(runs[1].kind, RunKind::Hyperlink);
        assert_eq!(runs[1].content, "our site");
        assert_eq!(runs[1].identity.as_deref(), Some("u1d2"));
        assert_eq!(runs[1].label.as_deref(), Some("Home page"));
    }

    #[test]
    fn test_entities_are_decoded() {
        let text = story(
            "<ParagraphStyleRange><CharacterStyleRange><Content>Fish &amp; Chips</Content></CharacterStyleRange></ParagraphStyleRange>",
        );
        assert_eq!(extract_runs(&text).runs()[0].content, "Fish & Chips");
    }

    #[test]
    fn test_missing_structure_is_empty() {
        assert_eq!(extract_runs(""), StoryExtraction::Complete(vec![]));
        assert!(extract_runs(&story("")).runs().is_empty());
        assert!(extract_runs("<Other><Story/></Other>").runs().is_empty());
    }

    #[test]
    fn test_malformed_story_is_partial() {
        let text = r#"<idPkg:Story><Story><ParagraphStyleRange>
<CharacterStyleRange><Content>kept</Content></CharacterStyleRange>
<CharacterStyleRange><Content>lost</Content>
</ParagraphStyleRange></Story></idPkg:Story>"#;
        let extraction = extract_runs(text);
        assert!(extraction.is_partial());
        assert!(extraction.diagnostic().is_some());
        assert_eq!(extraction.runs(), &[Run::text("kept")]);
    }

    #[test]
    fn test_separators_are_filtered() {
        let text = story(
            "<ParagraphStyleRange><CharacterStyleRange><Content>one\u{2028}two\u{2029}three</Content></CharacterStyleRange></ParagraphStyleRange>",
        );
        let runs = extract_runs(&text).into_runs();
        assert_eq!(runs[0].content, "one\u{2028}twothree");
        assert_eq!(runs[0].key(), "onetwothree");
    }

    #[test]
    fn test_story_key_map_deduplicates() {
        let text = story(
            "<ParagraphStyleRange><CharacterStyleRange><Content>Same</Content><Content>Other</Content><Content>Same</Content></CharacterStyleRange></ParagraphStyleRange>",
        );
        let map = story_key_map(&text);
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Same", "Other"]);
    }
}
