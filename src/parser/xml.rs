use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::ParseError;

/// Minimal owned element tree. NFe documents are small, so the whole document
/// is kept in memory and queried by local name.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First descendant (or self) named `name`: namespaced lookup first,
    /// any namespace when the namespaced lookup finds nothing.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.first_match(&|e| e.is(Some(namespace), name))
            .or_else(|| self.first_match(&|e| e.is(None, name)))
    }

    /// All descendants named `name`, with the same namespace fallback as [`Element::find`].
    pub fn find_all(&self, namespace: &str, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(&|e| e.is(Some(namespace), name), &mut found);
        if found.is_empty() {
            self.collect(&|e| e.is(None, name), &mut found);
        }
        found
    }

    /// Direct child named `name`, with namespace fallback.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.is(Some(namespace), name))
            .or_else(|| self.children.iter().find(|c| c.is(None, name)))
    }

    /// Trimmed text of a direct child, `None` when absent or empty.
    pub fn child_text(&self, namespace: &str, name: &str) -> Option<&str> {
        self.child(namespace, name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name
            && match namespace {
                Some(ns) => self.namespace.as_deref() == Some(ns),
                None => true,
            }
    }

    fn first_match(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.first_match(pred))
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for child in &self.children {
            child.collect(pred, out);
        }
    }
}

/// Parses `xml` into its root element.
pub fn parse_tree(xml: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(ref e))) => {
                let element = open_element(&ns, e)?;
                stack.push(element);
            }
            Ok((ns, Event::Empty(ref e))) => {
                let element = open_element(&ns, e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Text(ref t))) => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::Malformed(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(ref c))) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(c));
                }
            }
            Ok((_, Event::End(_))) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed(format!(
            "unexpected end of document, <{}> not closed",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }

    root.ok_or_else(|| ParseError::Malformed("document has no root element".into()))
}

fn open_element(ns: &ResolveResult, start: &BytesStart) -> Result<Element, ParseError> {
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    };
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Malformed(e.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Malformed(e.to_string()))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        ));
    }

    Ok(Element {
        namespace,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ParseError::Malformed("multiple root elements".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[test]
    fn builds_tree_with_namespaces_and_attributes() {
        let xml = r#"<a xmlns="urn:test" id="1"><b>hello</b><c/><x:d xmlns:x="urn:other">v</x:d></a>"#;
        let root = parse_tree(xml).unwrap();

        assert_eq!(root.name, "a");
        assert_eq!(root.namespace.as_deref(), Some(NS));
        assert_eq!(root.attribute("id"), Some("1"));
        assert_eq!(root.child_text(NS, "b"), Some("hello"));
        assert!(root.child(NS, "c").is_some());
        assert_eq!(root.child_text(NS, "c"), None);

        // d lives in another namespace: found only through the fallback
        let d = root.find(NS, "d").unwrap();
        assert_eq!(d.namespace.as_deref(), Some("urn:other"));
        assert_eq!(d.text, "v");
    }

    #[test]
    fn lookup_falls_back_to_unqualified_names() {
        let root = parse_tree("<a><b><c>1</c></b><c>2</c></a>").unwrap();
        assert_eq!(root.find(NS, "c").map(|c| c.text.as_str()), Some("1"));
        assert_eq!(root.find_all(NS, "c").len(), 2);
    }

    #[test]
    fn unescapes_text() {
        let root = parse_tree("<a>P&amp;B &lt;ok&gt;</a>").unwrap();
        assert_eq!(root.text, "P&B <ok>");
    }

    #[test]
    fn rejects_structurally_invalid_documents() {
        assert!(matches!(parse_tree(""), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_tree("<a><b></a>"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_tree("<a><b>"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_tree("<a/><b/>"), Err(ParseError::Malformed(_))));
    }
}
