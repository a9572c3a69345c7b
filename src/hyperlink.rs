//! 超链接片段编解码
//!
//! 含超链接的故事被整体编码为一段内联标记，译者可以把整句作为一个单元处理：
//! 文本片段编码为 `<span id="…">`，超链接片段编码为 `<a id="…" title="…">`。
//! 解码时按 id 把译文中的元素与源片段中的元素对应起来。

use std::collections::HashMap;

use quick_xml::escape::escape;
use scraper::{Html, Selector};

use crate::story::{Run, RunKind};
use crate::string_types::{TranslationUnit, UnitKind};

const ANCHOR_OPEN: &str = "<a id=\"";
const ANCHOR_CLOSE: &str = "</a>";
const SPAN_OPEN: &str = "<span id=\"";
const SPAN_CLOSE: &str = "</span>";

/// 将片段列表编码为一段内联标记
///
/// 没有 `identity` 的片段使用位置生成的 `item-<index>`。
pub fn encode_runs(runs: &[Run]) -> String {
    runs.iter()
        .enumerate()
        .map(|(index, run)| {
            let id = run
                .identity
                .clone()
                .unwrap_or_else(|| format!("item-{}", index));
            let text = escape(&run.content);
            match run.kind {
                RunKind::Hyperlink => {
                    let title = run.label.as_deref().unwrap_or("");
                    format!(
                        "<a id=\"{}\" title=\"{}\">{}</a>",
                        escape(&id),
                        escape(title),
                        text
                    )
                }
                RunKind::Text => format!("<span id=\"{}\">{}</span>", escape(&id), text),
            }
        })
        .collect()
}

/// 判断字典键是否为编码后的超链接片段
///
/// 以 `<a id="` 或 `<span id="` 开头、以 `</a>` 或 `</span>` 结尾，并且至少包含一个链接。
pub fn is_encoded_blob(key: &str) -> bool {
    let opens = key.starts_with(ANCHOR_OPEN) || key.starts_with(SPAN_OPEN);
    let closes = key.ends_with(ANCHOR_CLOSE) || key.ends_with(SPAN_CLOSE);
    opens && closes && key.contains(ANCHOR_OPEN)
}

/// 将译文片段按 id 解码为逐片段的翻译条目
///
/// 片段是译者编辑过的 HTML，按 HTML 规则解析：完整的命名实体表、
/// `<br>` 等空元素都能正确处理。源片段中每个带 id 的 `a`/`span`（文档顺序）
/// 在译文中查找同 id 元素；找不到时跳过，该条目的翻译就此丢失。
pub fn decode_units(source: &str, translated: &str, story_id: &str) -> Vec<TranslationUnit> {
    let (Ok(identified), Ok(any_id)) = (Selector::parse("a[id], span[id]"), Selector::parse("[id]"))
    else {
        return Vec::new();
    };

    let source_doc = Html::parse_fragment(source);
    let translated_doc = Html::parse_fragment(translated);

    // 同一 id 出现多次时取第一个
    let mut targets: HashMap<&str, String> = HashMap::new();
    for element in translated_doc.select(&any_id) {
        if let Some(id) = element.value().id() {
            targets
                .entry(id)
                .or_insert_with(|| element.text().collect::<String>());
        }
    }

    let mut units = Vec::new();
    for element in source_doc.select(&identified) {
        let Some(id) = element.value().id() else {
            continue;
        };
        let Some(target_text) = targets.get(id) else {
            log::debug!("故事 {} 的译文缺少 id={} 的元素", story_id, id);
            continue;
        };

        let note = if element.value().name() == "a" {
            element.value().attr("title").map(str::to_string)
        } else {
            None
        };

        units.push(TranslationUnit {
            source_text: element.text().collect(),
            target_text: target_text.clone(),
            story_id: story_id.to_string(),
            note,
            kind: UnitKind::Text,
        });
    }

    units
}
