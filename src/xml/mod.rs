//! XML 方言：项目持久化格式与按区域扁平化的导出格式
//!
//! 读取侧先把文档解析成通用元素树，子元素一律保存为列表，
//! 单个子元素与多个同名子元素因此按同一方式处理。

pub mod export;
pub mod project;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// 两种格式共用的文件头
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n\n";

/// 每级缩进（仅为可读性）
pub const INDENT_UNIT: &str = "  ";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("XML解析失败: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("UTF-8解码失败: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("根元素应为 <data>，实际为 <{0}>")]
    UnexpectedRoot(String),
    #[error("缺少元素: <{0}>")]
    MissingElement(&'static str),
    #[error("<{element}> 缺少属性 {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("元素未正确闭合")]
    Unbalanced,
}

/// 通用元素节点
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
    pub cdata: Option<String>,
}

impl XmlElement {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attr(
        &self,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<&str, DecodeError> {
        self.attr(attribute)
            .ok_or(DecodeError::MissingAttribute { element, attribute })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn required_child(&self, name: &'static str) -> Result<&XmlElement, DecodeError> {
        self.child(name).ok_or(DecodeError::MissingElement(name))
    }

    /// 同名子元素，没有时为空迭代
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// 元素值：有 CDATA 时取 CDATA，否则取反转义后的文本
    pub fn value(&self) -> &str {
        self.cdata.as_deref().unwrap_or(&self.text)
    }
}

/// 把 XML 文本解析为元素树，返回唯一的根元素
pub(crate) fn parse_document(xml: &str) -> Result<XmlElement, DecodeError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(DecodeError::Unbalanced)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    let raw = data.into_inner();
                    let content = std::str::from_utf8(&raw)?;
                    current
                        .cdata
                        .get_or_insert_with(String::new)
                        .push_str(content);
                }
            }
            Event::Eof => break,
            // 声明、注释、处理指令、DOCTYPE 均忽略
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::Unbalanced);
    }
    root.ok_or(DecodeError::MissingElement("data"))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, DecodeError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..XmlElement::default()
    })
}

/// 把已闭合元素挂到父元素下；没有父元素时成为根
fn close_element(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DecodeError::UnexpectedRoot(element.name)),
    }
    Ok(())
}

/// 属性值与普通文本的转义
pub(crate) fn escape(raw: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// 写入一行带缩进的内容
pub(crate) fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT_UNIT);
    }
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_collects_children_as_lists() {
        let xml = r#"<?xml version="1.0"?>
<data>
  <item id="a"/>
  <item id="b &amp; c"><![CDATA[<raw> & text]]></item>
  <other>plain &lt;text&gt;</other>
</data>"#;
        let root = parse_document(xml).expect("解析应该成功");
        assert_eq!(root.name, "data");
        let items: Vec<_> = root.children_named("item").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attr("id"), Some("a"));
        assert_eq!(items[1].attr("id"), Some("b & c"));
        assert_eq!(items[1].value(), "<raw> & text");
        assert_eq!(root.child("other").map(XmlElement::value), Some("plain <text>"));
        assert_eq!(root.children_named("missing").count(), 0);
    }

    #[test]
    fn test_parse_document_rejects_malformed_input() {
        assert!(parse_document("<data><group></data>").is_err());
        assert!(parse_document("<data>").is_err(), "未闭合的根元素应该报错");
        assert!(matches!(parse_document(""), Err(DecodeError::MissingElement("data"))));
        assert!(matches!(
            parse_document("<data/><data/>"),
            Err(DecodeError::UnexpectedRoot(_))
        ));
    }

    #[test]
    fn test_push_line_indents_by_depth() {
        let mut out = String::new();
        push_line(&mut out, 2, "<x/>");
        assert_eq!(out, "    <x/>\n");
    }
}
