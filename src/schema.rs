//! 结构路径声明
//!
//! IDML 中所有可重复的结构节点都在这里声明为"总是序列"的路径。
//! 遍历代码只通过这些路径取节点，单个出现的元素也得到一元素序列，
//! 节点缺失时得到空序列。

use crate::markup::XmlElement;

/// 设计清单根元素
pub const DESIGNMAP_ROOT: &str = "Document";
/// 故事文档根元素
pub const STORY_ROOT: &str = "idPkg:Story";

/// 从某个元素出发、逐级按名称选择子元素的路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePath {
    /// 路径名称（用于诊断）
    pub name: &'static str,
    /// 逐级元素名
    pub steps: &'static [&'static str],
}

/// 设计清单中的跨页列表：`Document/idPkg:Spread`
pub const DESIGNMAP_SPREADS: SequencePath = SequencePath {
    name: "Document.idPkg:Spread",
    steps: &["idPkg:Spread"],
};

/// 故事中的段落样式范围：`idPkg:Story/Story/ParagraphStyleRange`
pub const PARAGRAPH_STYLE_RANGES: SequencePath = SequencePath {
    name: "idPkg:Story.Story.ParagraphStyleRange",
    steps: &["Story", "ParagraphStyleRange"],
};

/// 段落样式范围中的字符样式范围
pub const CHARACTER_STYLE_RANGES: SequencePath = SequencePath {
    name: "ParagraphStyleRange.CharacterStyleRange",
    steps: &["CharacterStyleRange"],
};

/// 字符样式范围中的超链接源
pub const HYPERLINK_TEXT_SOURCES: SequencePath = SequencePath {
    name: "CharacterStyleRange.HyperlinkTextSource",
    steps: &["HyperlinkTextSource"],
};

/// 内容片段（字符样式范围或超链接源之下）
pub const CONTENT_FRAGMENTS: SequencePath = SequencePath {
    name: "Content",
    steps: &["Content"],
};

/// 所有声明为总是序列的路径
pub const ALWAYS_SEQUENCE: &[SequencePath] = &[
    DESIGNMAP_SPREADS,
    PARAGRAPH_STYLE_RANGES,
    CHARACTER_STYLE_RANGES,
    HYPERLINK_TEXT_SOURCES,
    CONTENT_FRAGMENTS,
];

impl SequencePath {
    /// 从 `from` 出发选择路径末端的所有元素（文档顺序）
    pub fn select<'a>(&self, from: &'a XmlElement) -> Vec<&'a XmlElement> {
        let mut current = vec![from];
        for step in self.steps {
            current = current
                .into_iter()
                .flat_map(|element| element.children_named(step))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}
