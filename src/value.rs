//! Builders for template context [`Value`]s. Templates don't escape their
//! output, so every value is tagged at construction: [`text`] escapes
//! user content while [`html`] is inserted verbatim.

use gtmpl::Value;
use quick_xml::escape::escape;
use std::collections::HashMap;

/// A string value with `&`, `<`, `>`, `"` and `'` entity-escaped.
pub fn text(s: &str) -> Value {
    Value::String(escape(s).into_owned())
}

/// A string value inserted verbatim. Only for markup we rendered ourselves.
pub fn html(s: String) -> Value {
    Value::String(s)
}

/// An optional string; `None` becomes [`Value::Nil`] so templates can test
/// it with `{{if}}`.
pub fn optional_text(s: Option<&str>) -> Value {
    s.map_or(Value::Nil, text)
}

pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Value {
    Value::Array(items.into_iter().collect())
}

/// A template object under construction.
#[derive(Clone, Debug, Default)]
pub struct Object(HashMap<String, Value>);

impl Object {
    pub fn new() -> Object {
        Object::default()
    }

    /// Adds an escaped string field.
    pub fn text(self, key: &str, s: &str) -> Object {
        self.value(key, text(s))
    }

    /// Adds a verbatim markup field.
    pub fn html(self, key: &str, s: String) -> Object {
        self.value(key, html(s))
    }

    pub fn value<V: Into<Value>>(mut self, key: &str, value: V) -> Object {
        self.0.insert(key.to_owned(), value.into());
        self
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Value {
        Value::Object(object.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        match text(r#"<b>"Tom" & 'Jerry'</b>"#) {
            Value::String(s) => assert_eq!(
                "&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;",
                s
            ),
            other => panic!("wanted a string, found {:?}", other),
        }
    }

    #[test]
    fn test_html_is_verbatim() {
        match html("<p>hi</p>".to_owned()) {
            Value::String(s) => assert_eq!("<p>hi</p>", s),
            other => panic!("wanted a string, found {:?}", other),
        }
    }

    #[test]
    fn test_object() {
        let value: Value = Object::new()
            .text("title", "A & B")
            .value("draft", false)
            .value("original", optional_text(None))
            .into();
        match value {
            Value::Object(map) => {
                assert_eq!(3, map.len());
                assert!(matches!(&map["title"], Value::String(s) if s == "A &amp; B"));
                assert!(matches!(map["draft"], Value::Bool(false)));
                assert!(matches!(map["original"], Value::Nil));
            }
            other => panic!("wanted an object, found {:?}", other),
        }
    }
}
