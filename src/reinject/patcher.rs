/// 文档修补策略
///
/// 回注时直接修改文档原始文本而不是重新序列化 XML 树，
/// 以免扰动与翻译无关的标记。该策略被隔离在 [`DocumentPatcher`] 之后，
/// 可以换成结构化编辑器而不影响字典与提取逻辑。
///
/// 已知局限：键文本若恰好也出现在无关的属性值或其他片段中，
/// 第一次出现的位置可能不是目标片段。

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape};

/// 文档修补 trait
pub trait DocumentPatcher {
    /// 在文档中把 `key` 替换为 `replacement`
    ///
    /// # 参数
    /// * `document` - 文档原始文本（原地修改）
    /// * `key` - 已解码的源文本
    /// * `replacement` - 已解码的译文
    ///
    /// # 返回
    /// 找到并替换返回 true，文档中找不到键返回 false
    fn patch(&self, document: &mut String, key: &str, replacement: &str) -> bool;
}

/// 文档中字符数据的书写形式
///
/// 同一段文本在 XML 中可以有多种合法写法，修补时依次尝试，
/// 译文按匹配到的那种写法写入。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextForm {
    /// `&` `<` `>` 转义（写出 XML 时的常见形式）
    Escaped,
    /// 只转义 `&` `<`，`>` 保持原样
    Minimal,
    /// 引号也转义为 `&quot;` `&apos;`
    QuotesEscaped,
}

impl TextForm {
    const ALL: [TextForm; 3] = [TextForm::Escaped, TextForm::Minimal, TextForm::QuotesEscaped];

    fn render<'a>(self, text: &'a str) -> Cow<'a, str> {
        match self {
            TextForm::Escaped => partial_escape(text),
            TextForm::Minimal => {
                if text.contains(['&', '<']) {
                    Cow::Owned(text.replace('&', "&amp;").replace('<', "&lt;"))
                } else {
                    Cow::Borrowed(text)
                }
            }
            TextForm::QuotesEscaped => escape(text),
        }
    }
}

/// 默认修补器：替换键在文本中的第一次出现
///
/// 文档中的字符数据是转义后的形式，所以按 [`TextForm`] 的各种写法查找键，
/// 并以同一写法写入译文。
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstOccurrencePatcher;

impl DocumentPatcher for FirstOccurrencePatcher {
    fn patch(&self, document: &mut String, key: &str, replacement: &str) -> bool {
        if key.is_empty() {
            return false;
        }

        let mut tried: Vec<Cow<str>> = Vec::with_capacity(TextForm::ALL.len());
        for form in TextForm::ALL {
            let needle = form.render(key);
            if tried.contains(&needle) {
                continue;
            }
            if let Some(start) = document.find(needle.as_ref()) {
                let end = start + needle.len();
                document.replace_range(start..end, &form.render(replacement));
                return true;
            }
            tried.push(needle);
        }
        false
    }
}
