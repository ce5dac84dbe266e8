use super::{Reader, into_mapping, read_to_string};
use crate::error::ReaderError;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use std::path::Path;

/// XML documents via `quick-xml` events.
///
/// The root element is dropped and its children become the mapping:
/// - child elements become keys, repeated names become sequences
/// - attributes are collected under `@attributes`
/// - a text-only element becomes a string (`@text` when it has attributes)
/// - an empty element becomes an empty mapping
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlReader;

impl Reader for XmlReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        parse(path, &content)
    }
}

struct Element {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(path: &Path, start: &BytesStart<'_>) -> Result<Self, ReaderError> {
        let mut attributes = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| ReaderError::syntax(path, err))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| ReaderError::syntax(path, err))?;
            attributes.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        // Element values are never sequences, so a sequence here means repetition.
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() && self.attributes.is_empty() {
            return if text.is_empty() {
                Value::Object(Map::new())
            } else {
                Value::String(text.to_string())
            };
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            map.insert("@attributes".to_string(), Value::Object(self.attributes));
        }
        if !text.is_empty() && self.children.is_empty() {
            map.insert("@text".to_string(), Value::String(text.to_string()));
        }
        map.extend(self.children);
        Value::Object(map)
    }
}

fn parse(path: &Path, content: &str) -> Result<Map<String, Value>, ReaderError> {
    let mut events = quick_xml::Reader::from_str(content);
    events.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = events.read_event().map_err(|err| {
            ReaderError::syntax(path, format!("{err} at byte {}", events.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(ReaderError::syntax(path, "multiple root elements"));
                }
                stack.push(Element::open(path, &start)?);
            }
            Event::Empty(start) => {
                let element = Element::open(path, &start)?;
                close(&mut stack, &mut root, element, path)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(ReaderError::syntax(path, "unexpected closing tag"));
                };
                close(&mut stack, &mut root, element, path)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.unescape().map_err(|err| ReaderError::syntax(path, err))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ReaderError::syntax(path, "unclosed element at end of document"));
    }
    let Some(root) = root else {
        return Err(ReaderError::syntax(path, "document has no root element"));
    };
    into_mapping(path, root)
}

fn close(
    stack: &mut [Element],
    root: &mut Option<Value>,
    element: Element,
    path: &Path,
) -> Result<(), ReaderError> {
    let name = element.name.clone();
    let value = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None if root.is_none() => *root = Some(value),
        None => return Err(ReaderError::syntax(path, "multiple root elements")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_str(content: &str) -> Result<Map<String, Value>, ReaderError> {
        parse(Path::new("xml.xml"), content)
    }

    #[test]
    fn test_root_is_dropped() {
        let map = parse_str("<?xml version=\"1.0\"?><config><foo><bar>baz</bar></foo></config>").unwrap();
        assert_eq!(Value::Object(map), json!({"foo": {"bar": "baz"}}));
    }

    #[test]
    fn test_repeated_elements_become_sequence() {
        let map = parse_str(
            "<config><hosts><host>a</host><host>b</host><host>c</host></hosts></config>",
        )
        .unwrap();
        assert_eq!(map["hosts"], json!({"host": ["a", "b", "c"]}));
    }

    #[test]
    fn test_attributes_and_empty_elements() {
        let map = parse_str(
            "<config><db driver=\"mysql\">primary</db><cache/><pool size=\"4\"/></config>",
        )
        .unwrap();
        assert_eq!(
            Value::Object(map),
            json!({
                "db": {"@attributes": {"driver": "mysql"}, "@text": "primary"},
                "cache": {},
                "pool": {"@attributes": {"size": "4"}}
            })
        );
    }

    #[test]
    fn test_entities_and_cdata_are_decoded() {
        let map = parse_str("<config><a>x &amp; y</a><b><![CDATA[<raw>]]></b></config>").unwrap();
        assert_eq!(map["a"], json!("x & y"));
        assert_eq!(map["b"], json!("<raw>"));
    }

    #[test]
    fn test_mismatched_tags_are_syntax_error() {
        let err = parse_str("<config><a>1</b></config>").unwrap_err();
        assert!(matches!(err, ReaderError::Syntax { .. }));
    }

    #[test]
    fn test_text_root_is_not_a_mapping() {
        let err = parse_str("<config>plain</config>").unwrap_err();
        assert!(matches!(err, ReaderError::NotAMapping { found: "string", .. }));
    }
}
