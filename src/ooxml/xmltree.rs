//! A small, owned XML document tree built on top of `quick_xml`.
//!
//! The OPC layer (`opc::part::XmlPart`) keeps XML parts as raw bytes and
//! only streams through them for narrow tasks (relationship-id reference
//! counting). Schema and semantic validation need random access instead:
//! recursing into children, looking at a parent's in-scope namespace
//! prefixes, walking back up for context. [`XmlNode`] is the parsed tree
//! that recursion walks, with every tag and attribute name resolved to
//! Clark notation (`{namespace}local-name`) up front so the rest of the
//! validator never has to re-resolve a prefix.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ooxml::error::{OoxmlError, Result};

/// A parsed XML element, with its attributes and children resolved to
/// Clark notation using the namespace prefixes in scope at that point in
/// the document.
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Clark notation tag, e.g. `{http://schemas.openxmlformats.org/presentationml/2006/main}sld`.
    pub tag: String,
    /// Attributes, keyed by Clark notation name (unprefixed attributes carry no namespace).
    pub attrs: Vec<(String, String)>,
    /// Namespace prefixes in scope at this element: ancestors' declarations
    /// merged with any `xmlns`/`xmlns:p` made directly on this element.
    pub xmlns: HashMap<String, String>,
    /// Child elements, in document order.
    pub children: Vec<XmlNode>,
    /// Concatenated text content directly under this element (not from descendants).
    pub text: String,
    /// Byte offset of the element's start tag in the source document, for diagnostics.
    pub offset: usize,
}

impl XmlNode {
    /// Local name of [`Self::tag`] (the part after the last `}`, or the whole tag if unqualified).
    pub fn local_name(&self) -> &str {
        match self.tag.rfind('}') {
            Some(idx) => &self.tag[idx + 1..],
            None => &self.tag,
        }
    }

    /// Namespace URI of [`Self::tag`], or `None` if unqualified.
    pub fn namespace(&self) -> Option<&str> {
        if self.tag.starts_with('{') {
            self.tag.find('}').map(|idx| &self.tag[1..idx])
        } else {
            None
        }
    }

    /// Look up an attribute by its Clark notation name.
    pub fn attr(&self, qualified_name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == qualified_name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up an unprefixed (no-namespace) attribute by local name.
    pub fn attr_local(&self, local_name: &str) -> Option<&str> {
        self.attr(local_name)
    }

    /// Depth-first iterator over this node and all its descendants.
    pub fn iter(&self) -> XmlNodeIter<'_> {
        XmlNodeIter { stack: vec![self] }
    }
}

/// Depth-first, pre-order iterator over an [`XmlNode`] and its descendants.
pub struct XmlNodeIter<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for XmlNodeIter<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// A namespace scope: prefix -> URI, including the default (unprefixed) namespace under the empty prefix.
type NsScope = HashMap<String, String>;

/// Parse a full XML document into an [`XmlNode`] tree.
///
/// Returns an error if the document has no root element or contains
/// malformed markup. Comments and processing instructions are skipped;
/// CDATA and text are merged into [`XmlNode::text`].
pub fn parse(data: &[u8]) -> Result<XmlNode> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut scopes: Vec<NsScope> = vec![HashMap::new()];
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    let mut buf = Vec::new();

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let scope = push_scope(&scopes, e)?;
                let node = build_node(e, &scope, offset)?;
                scopes.push(scope);
                stack.push(node);
            },
            Ok(Event::Empty(ref e)) => {
                let scope = push_scope(&scopes, e)?;
                let node = build_node(e, &scope, offset)?;
                attach_or_set_root(&mut stack, &mut root, node);
            },
            Ok(Event::End(_)) => {
                scopes.pop();
                if let Some(node) = stack.pop() {
                    attach_or_set_root(&mut stack, &mut root, node);
                }
            },
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| OoxmlError::Xml(err.to_string()))?;
                    top.text.push_str(&unescaped);
                }
            },
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(err) => return Err(OoxmlError::Xml(err.to_string())),
        }
        buf.clear();
    }

    root.ok_or_else(|| OoxmlError::Xml("document has no root element".to_string()))
}

fn attach_or_set_root(stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>, node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else {
        *root = Some(node);
    }
}

fn push_scope(scopes: &[NsScope], start: &BytesStart) -> Result<NsScope> {
    let mut scope = scopes.last().cloned().unwrap_or_default();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| OoxmlError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" {
            let value = attr
                .unescape_value()
                .map_err(|err| OoxmlError::Xml(err.to_string()))?
                .into_owned();
            scope.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            let value = attr
                .unescape_value()
                .map_err(|err| OoxmlError::Xml(err.to_string()))?
                .into_owned();
            scope.insert(prefix.to_string(), value);
        }
    }
    Ok(scope)
}

fn build_node(start: &BytesStart, scope: &NsScope, offset: usize) -> Result<XmlNode> {
    let tag = qualify(&String::from_utf8_lossy(start.name().as_ref()), scope);

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| OoxmlError::Xml(err.to_string()))?;
        let raw_key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if raw_key == "xmlns" || raw_key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| OoxmlError::Xml(err.to_string()))?
            .into_owned();
        // Unprefixed attributes have no namespace in XML (unlike elements),
        // so only qualify names that actually carry a prefix.
        let qualified = if raw_key.contains(':') {
            qualify(&raw_key, scope)
        } else {
            raw_key
        };
        attrs.push((qualified, value));
    }

    Ok(XmlNode {
        tag,
        attrs,
        xmlns: scope.clone(),
        children: Vec::new(),
        text: String::new(),
        offset,
    })
}

/// Resolve a possibly-prefixed name to Clark notation using a namespace scope.
fn qualify(name: &str, scope: &NsScope) -> String {
    match name.split_once(':') {
        Some((prefix, local)) => match scope.get(prefix) {
            Some(uri) => format!("{{{uri}}}{local}"),
            None => name.to_string(),
        },
        None => match scope.get("") {
            Some(uri) if !uri.is_empty() => format!("{{{uri}}}{name}"),
            _ => name.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_namespaced_document() {
        let xml = br#"<p:sld xmlns:p="urn:p" xmlns:a="urn:a"><p:cSld name="Slide 1"><a:off x="1" y="2"/></p:cSld></p:sld>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.tag, "{urn:p}sld");
        assert_eq!(root.children.len(), 1);
        let c_sld = &root.children[0];
        assert_eq!(c_sld.tag, "{urn:p}cSld");
        assert_eq!(c_sld.attr("name"), Some("Slide 1"));
        let off = &c_sld.children[0];
        assert_eq!(off.tag, "{urn:a}off");
        assert_eq!(off.attr("x"), Some("1"));
    }

    #[test]
    fn default_namespace_applies_to_unprefixed_elements() {
        let xml = br#"<root xmlns="urn:default"><child/></root>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.tag, "{urn:default}root");
        assert_eq!(root.children[0].tag, "{urn:default}child");
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(parse(b"").is_err());
    }

    #[test]
    fn text_content_is_captured() {
        let xml = br#"<t>hello</t>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.text, "hello");
    }
}
