use serde::{Serialize, Deserialize};

use crate::hyperlink::is_encoded_blob;

/// 翻译条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// 普通文本
    Text,
    /// 编码后的超链接片段（需要解码为多个文本条目）
    Html,
}

/// 翻译条目
///
/// 此结构用于字典条目与故事文本之间的转换：
/// - 字典中的每个 源文本 -> 译文 对应一个条目
/// - Html 条目解码后得到若干 Text 条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// 源文本（键过滤后）
    pub source_text: String,
    /// 译文
    pub target_text: String,
    /// 所属故事 ID
    pub story_id: String,
    /// 备注（超链接标题）
    pub note: Option<String>,
    pub kind: UnitKind,
}

impl TranslationUnit {
    /// 由字典条目创建，根据源文本判断是否为编码片段
    pub fn from_entry(source_text: &str, target_text: &str, story_id: &str) -> Self {
        let kind = if is_encoded_blob(source_text) {
            UnitKind::Html
        } else {
            UnitKind::Text
        };
        TranslationUnit {
            source_text: source_text.to_string(),
            target_text: target_text.to_string(),
            story_id: story_id.to_string(),
            note: None,
            kind,
        }
    }

    pub fn is_html(&self) -> bool {
        self.kind == UnitKind::Html
    }

    /// 译文是否为空（空译文视为缺失）
    pub fn is_untranslated(&self) -> bool {
        self.target_text.is_empty()
    }
}
