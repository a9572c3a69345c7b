//! 轻量 XML 树
//!
//! 基于 quick-xml 事件流构建只读元素树，供故事提取和设计清单解析共用。解析遇到结构错误时不会丢弃已解析内容：
//! 尚未闭合的元素会被折叠回父节点并标记为未闭合，同时返回诊断信息。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// XML 节点
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// XML 元素
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// 限定名（包含命名空间前缀，如 `idPkg:Story`）
    pub name: String,
    /// 属性列表（已解码），保持原始顺序
    pub attributes: Vec<(String, String)>,
    /// 子节点
    pub children: Vec<XmlNode>,
    /// 是否遇到了结束标签（解析中断时为 false）
    pub closed: bool,
}

impl XmlElement {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            closed: false,
        }
    }

    /// 获取属性值
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 按名称迭代直接子元素（总是返回序列，单个元素也不例外）
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// 迭代所有直接子元素
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// 元素的全部后代文本（等价于 DOM 的 textContent）
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct ParsedMarkup {
    /// 虚拟文档节点，其子节点为顶层节点
    pub document: XmlElement,
    /// 解析中断时的诊断信息
    pub diagnostic: Option<String>,
}

impl ParsedMarkup {
    /// 第一个顶层元素
    pub fn root(&self) -> Option<&XmlElement> {
        self.document.child_elements().next()
    }

    /// 是否完整解析
    pub fn is_complete(&self) -> bool {
        self.diagnostic.is_none()
    }
}

fn read_attributes(start: &BytesStart) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }
    attributes
}

/// 将文本追加到当前元素，合并相邻文本节点
fn push_text(parent: &mut XmlElement, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(XmlNode::Text(last)) = parent.children.last_mut() {
        last.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

/// 解析 XML 文本
///
/// 不会返回错误：结构异常时返回已解析的部分树和诊断信息。
pub fn parse(text: &str) -> ParsedMarkup {
    let mut reader = Reader::from_str(text);
    reader.trim_text(false);

    let mut stack: Vec<XmlElement> = vec![XmlElement::new(String::new(), Vec::new())];
    let mut diagnostic = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(XmlElement::new(name, read_attributes(&e)));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut element = XmlElement::new(name, read_attributes(&e));
                element.closed = true;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Element(element));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    diagnostic = Some(format!(
                        "unexpected end tag at byte {}",
                        reader.buffer_position()
                    ));
                    break;
                }
                if let Some(mut element) = stack.pop() {
                    element.closed = true;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Element(element));
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let decoded = match e.unescape() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &decoded);
                }
            }
            Ok(Event::CData(e)) => {
                let raw = String::from_utf8_lossy(&e).into_owned();
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &raw);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                diagnostic = Some(format!(
                    "XML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                ));
                break;
            }
            // 声明、注释、处理指令（如 <?ACE 7?>）不含可翻译文本
            Ok(_) => {}
        }
    }

    if stack.len() > 1 && diagnostic.is_none() {
        diagnostic = Some(format!("{} unclosed element(s) at end of input", stack.len() - 1));
    }

    // 折叠未闭合元素
    while stack.len() > 1 {
        if let Some(element) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(XmlNode::Element(element));
            }
        }
    }

    let document = stack
        .pop()
        .unwrap_or_else(|| XmlElement::new(String::new(), Vec::new()));

    ParsedMarkup {
        document,
        diagnostic,
    }
}
