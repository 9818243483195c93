//! Minimal XML-RPC codec for the legacy index API
//!
//! Only what the `list_packages`, `search` and `browse` methods need: encoding a `methodCall`
//! and decoding a `methodResponse` (or its `fault`) into [`XmlRpcValue`].

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Number, Value};

use crate::version::error::RegistryError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlRpcValue {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(String),
    Base64(String),
    Array(Vec<XmlRpcValue>),
    Struct(IndexMap<String, XmlRpcValue>),
}

impl XmlRpcValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlRpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<XmlRpcValue>> {
        match self {
            XmlRpcValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            XmlRpcValue::Nil => Value::Null,
            XmlRpcValue::Bool(b) => Value::Bool(b),
            XmlRpcValue::Int(i) => Value::Number(i.into()),
            XmlRpcValue::Double(d) => Number::from_f64(d).map_or(Value::Null, Value::Number),
            XmlRpcValue::String(s) | XmlRpcValue::DateTime(s) | XmlRpcValue::Base64(s) => {
                Value::String(s)
            }
            XmlRpcValue::Array(items) => {
                Value::Array(items.into_iter().map(XmlRpcValue::into_json).collect())
            }
            XmlRpcValue::Struct(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(name, value)| (name, value.into_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl From<&str> for XmlRpcValue {
    fn from(s: &str) -> Self {
        XmlRpcValue::String(s.to_string())
    }
}

/// Render a `methodCall` document.
pub fn encode_call(method: &str, params: &[XmlRpcValue]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    escape_into(&mut out, method);
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn write_value(out: &mut String, value: &XmlRpcValue) {
    out.push_str("<value>");
    match value {
        XmlRpcValue::Nil => out.push_str("<nil/>"),
        XmlRpcValue::Bool(b) => {
            out.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" })
        }
        XmlRpcValue::Int(i) => out.push_str(&format!("<int>{i}</int>")),
        XmlRpcValue::Double(d) => out.push_str(&format!("<double>{d}</double>")),
        XmlRpcValue::String(s) => {
            out.push_str("<string>");
            escape_into(out, s);
            out.push_str("</string>");
        }
        XmlRpcValue::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            escape_into(out, s);
            out.push_str("</dateTime.iso8601>");
        }
        XmlRpcValue::Base64(s) => {
            out.push_str("<base64>");
            escape_into(out, s);
            out.push_str("</base64>");
        }
        XmlRpcValue::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        XmlRpcValue::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                escape_into(out, name);
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Element tree built from the response before interpreting it.
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn expect_child(&self, name: &str) -> Result<&Node, RegistryError> {
        self.child(name).ok_or_else(|| {
            invalid(format!("<{}> is missing a <{}> element", self.name, name))
        })
    }
}

fn invalid(message: impl Into<String>) -> RegistryError {
    RegistryError::InvalidResponse(message.into())
}

fn parse_tree(xml: &str) -> Result<Node, RegistryError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event().map_err(|e| invalid(e.to_string()))? {
            Event::Start(e) => stack.push(Node::named(e.name().as_ref())),
            Event::Empty(e) => {
                let node = Node::named(e.name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(invalid("unbalanced closing tag"));
                }
                if let Some(node) = stack.pop()
                    && let Some(parent) = stack.last_mut()
                {
                    parent.children.push(node);
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| invalid(e.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(invalid("unexpected end of document"));
    }
    stack.pop().ok_or_else(|| invalid("empty document"))
}

/// Decode a `methodResponse`, turning a `<fault>` into [`RegistryError::Fault`].
pub fn decode_response(xml: &str) -> Result<XmlRpcValue, RegistryError> {
    let root = parse_tree(xml)?;
    let response = root.expect_child("methodResponse")?;

    if let Some(fault) = response.child("fault") {
        let XmlRpcValue::Struct(members) = decode_value(fault.expect_child("value")?)? else {
            return Err(invalid("fault value is not a struct"));
        };
        let code = match members.get("faultCode") {
            Some(XmlRpcValue::Int(code)) => *code,
            _ => 0,
        };
        let message = members
            .get("faultString")
            .and_then(XmlRpcValue::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(RegistryError::Fault { code, message });
    }

    let value = response
        .expect_child("params")?
        .expect_child("param")?
        .expect_child("value")?;
    decode_value(value)
}

fn decode_value(node: &Node) -> Result<XmlRpcValue, RegistryError> {
    // A <value> without a type element is a string.
    let Some(typed) = node.children.first() else {
        return Ok(XmlRpcValue::String(node.text.clone()));
    };
    let text = typed.text.trim();

    let value = match typed.name.as_str() {
        "string" => XmlRpcValue::String(typed.text.clone()),
        "int" | "i4" | "i8" => XmlRpcValue::Int(
            text.parse()
                .map_err(|_| invalid(format!("invalid integer: {text}")))?,
        ),
        "boolean" => match text {
            "1" | "true" => XmlRpcValue::Bool(true),
            "0" | "false" => XmlRpcValue::Bool(false),
            other => return Err(invalid(format!("invalid boolean: {other}"))),
        },
        "double" => XmlRpcValue::Double(
            text.parse()
                .map_err(|_| invalid(format!("invalid double: {text}")))?,
        ),
        "dateTime.iso8601" => XmlRpcValue::DateTime(text.to_string()),
        "base64" => XmlRpcValue::Base64(text.to_string()),
        "nil" => XmlRpcValue::Nil,
        "array" => XmlRpcValue::Array(
            typed
                .expect_child("data")?
                .children
                .iter()
                .filter(|c| c.name == "value")
                .map(decode_value)
                .collect::<Result<_, _>>()?,
        ),
        "struct" => {
            let mut members = IndexMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.expect_child("name")?.text.clone();
                let value = decode_value(member.expect_child("value")?)?;
                members.insert(name, value);
            }
            XmlRpcValue::Struct(members)
        }
        other => return Err(invalid(format!("unsupported XML-RPC type <{other}>"))),
    };
    Ok(value)
}
