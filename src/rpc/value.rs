//
//  bugz-cli
//  rpc/value.rs
//

//! XML-RPC value model and wire codec.
//!
//! Bugzilla's web-service API speaks classic XML-RPC: every method takes a
//! single `<struct>` parameter and returns either one `<value>` or a
//! `<fault>`. This module models those values as the [`Value`] sum type,
//! renders method calls to XML, and parses `methodResponse` documents back
//! into values, turning faults into [`BugzError::Fault`].
//!
//! The parser is deliberately forgiving about insignificant whitespace
//! between elements but strict about the value types themselves; a response
//! that does not follow the XML-RPC grammar is a
//! [`BugzError::Protocol`] - malformed responses are never retried.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDateTime;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{BugzError, Result};

/// A Bugzilla method parameter set: the single top-level `<struct>` every
/// call carries. Keys are ordered so rendered requests are deterministic.
pub type Struct = BTreeMap<String, Value>;

/// One XML-RPC value.
///
/// The variants mirror the scalar and composite types the XML-RPC spec
/// defines and Bugzilla actually uses: `<int>`, `<boolean>`, `<string>`,
/// `<double>`, `<dateTime.iso8601>`, `<base64>`, `<array>` and `<struct>`.
/// An untyped `<value>text</value>` decodes as a string, per the spec.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>` / `<i4>`
    Int(i64),
    /// `<boolean>` - encoded as `0` / `1` on the wire.
    Bool(bool),
    /// `<string>`, or untyped value content.
    String(String),
    /// `<double>`
    Double(f64),
    /// `<dateTime.iso8601>` - Bugzilla sends `19980717T14:08:55` style
    /// timestamps, occasionally with dashes or a trailing `Z`.
    DateTime(NaiveDateTime),
    /// `<base64>` - used for attachment data.
    Base64(Vec<u8>),
    /// `<array>`
    Array(Vec<Value>),
    /// `<struct>`
    Struct(Struct),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Self {
        Value::Struct(v)
    }
}

impl Value {
    /// Builds an `<array>` of strings, the shape used for id lists, status
    /// lists and similar multi-valued search criteria.
    pub fn string_array<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Builds an `<array>` of ints (bug id lists).
    pub fn int_array<I: IntoIterator<Item = i64>>(items: I) -> Value {
        Value::Array(items.into_iter().map(Value::Int).collect())
    }

    /// Returns the integer content, coercing a numeric string if needed.
    /// Bugzilla is not consistent about whether ids come back typed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_base64(&self) -> Option<&[u8]> {
        match self {
            Value::Base64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a struct member. Returns `None` for non-structs too, so
    /// response walking can treat missing keys as the normal "not
    /// applicable" case.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|s| s.get(key))
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(v) => {
                out.push_str("<int>");
                out.push_str(&v.to_string());
                out.push_str("</int>");
            }
            Value::Bool(v) => {
                out.push_str("<boolean>");
                out.push(if *v { '1' } else { '0' });
                out.push_str("</boolean>");
            }
            Value::String(v) => {
                out.push_str("<string>");
                out.push_str(&escape(v));
                out.push_str("</string>");
            }
            Value::Double(v) => {
                out.push_str("<double>");
                out.push_str(&v.to_string());
                out.push_str("</double>");
            }
            Value::DateTime(v) => {
                out.push_str("<dateTime.iso8601>");
                out.push_str(&v.format("%Y%m%dT%H:%M:%S").to_string());
                out.push_str("</dateTime.iso8601>");
            }
            Value::Base64(v) => {
                out.push_str("<base64>");
                out.push_str(&BASE64.encode(v));
                out.push_str("</base64>");
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name));
                    out.push_str("</name>");
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
        }
        out.push_str("</value>");
    }
}

/// Renders a complete `<methodCall>` document for one Bugzilla method.
///
/// Bugzilla methods take exactly one struct argument, so the `<params>`
/// block always contains a single `<param>`.
pub fn format_request(method: &str, params: &Struct) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params><param>");
    Value::Struct(params.clone()).write_xml(&mut out);
    out.push_str("</param></params></methodCall>");
    out
}

fn bad_xml(err: quick_xml::Error) -> BugzError {
    BugzError::protocol(format!("malformed XML-RPC response: {err}"))
}

fn truncated() -> BugzError {
    BugzError::protocol("malformed XML-RPC response: unexpected end of document")
}

/// Parses a `<methodResponse>` document.
///
/// A `<fault>` response is converted into [`BugzError::Fault`] carrying the
/// server's `faultCode` and `faultString`. Anything that is not a
/// syntactically valid XML-RPC response is a [`BugzError::Protocol`].
pub fn parse_response(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    let mut in_fault = false;

    loop {
        match reader.read_event().map_err(bad_xml)? {
            Event::Start(e) => match e.name().as_ref() {
                b"methodResponse" | b"params" | b"param" => {}
                b"fault" => in_fault = true,
                b"value" => {
                    let value = read_value(&mut reader)?;
                    if in_fault {
                        return Err(fault_from_value(&value));
                    }
                    return Ok(value);
                }
                other => {
                    return Err(BugzError::protocol(format!(
                        "malformed XML-RPC response: unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                return Ok(Value::String(String::new()));
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Turns a parsed `<fault>` struct into the typed error.
fn fault_from_value(value: &Value) -> BugzError {
    let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("unknown fault")
        .to_string();
    BugzError::Fault { code, message }
}

/// Reads one value; the reader is positioned just after `<value>` and is
/// left just after the matching `</value>`.
fn read_value(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut text = String::new();
    let mut typed: Option<Value> = None;

    loop {
        match reader.read_event().map_err(bad_xml)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let value = match name.as_slice() {
                    b"int" | b"i4" => {
                        let body = read_scalar(reader, &name)?;
                        Value::Int(body.trim().parse().map_err(|_| {
                            BugzError::protocol(format!("invalid XML-RPC int: {body:?}"))
                        })?)
                    }
                    b"boolean" => {
                        let body = read_scalar(reader, &name)?;
                        match body.trim() {
                            "0" => Value::Bool(false),
                            "1" => Value::Bool(true),
                            other => {
                                return Err(BugzError::protocol(format!(
                                    "invalid XML-RPC boolean: {other:?}"
                                )));
                            }
                        }
                    }
                    b"string" => Value::String(read_scalar(reader, &name)?),
                    b"double" => {
                        let body = read_scalar(reader, &name)?;
                        Value::Double(body.trim().parse().map_err(|_| {
                            BugzError::protocol(format!("invalid XML-RPC double: {body:?}"))
                        })?)
                    }
                    b"dateTime.iso8601" => {
                        let body = read_scalar(reader, &name)?;
                        Value::DateTime(parse_datetime(body.trim())?)
                    }
                    b"base64" => {
                        let body = read_scalar(reader, &name)?;
                        let raw: String = body.split_whitespace().collect();
                        Value::Base64(BASE64.decode(raw.as_bytes()).map_err(|e| {
                            BugzError::protocol(format!("invalid XML-RPC base64: {e}"))
                        })?)
                    }
                    b"array" => read_array(reader)?,
                    b"struct" => read_struct(reader)?,
                    other => {
                        return Err(BugzError::protocol(format!(
                            "malformed XML-RPC response: unexpected element <{}>",
                            String::from_utf8_lossy(other)
                        )));
                    }
                };
                typed = Some(value);
            }
            Event::Empty(e) => {
                let value = match e.name().as_ref() {
                    b"string" | b"base64" => Value::String(String::new()),
                    b"array" => Value::Array(Vec::new()),
                    b"struct" => Value::Struct(Struct::new()),
                    other => {
                        return Err(BugzError::protocol(format!(
                            "malformed XML-RPC response: unexpected element <{}/>",
                            String::from_utf8_lossy(other)
                        )));
                    }
                };
                typed = Some(value);
            }
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(bad_xml)?);
            }
            Event::CData(t) => {
                let raw = String::from_utf8_lossy(t.as_ref()).into_owned();
                text.push_str(&raw);
            }
            Event::End(e) if e.name().as_ref() == b"value" => {
                // Untyped content defaults to a string.
                return Ok(typed.unwrap_or(Value::String(text)));
            }
            Event::End(_) => {}
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Collects the text content of a scalar element up to its end tag.
fn read_scalar(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut body = String::new();
    loop {
        match reader.read_event().map_err(bad_xml)? {
            Event::Text(t) => body.push_str(&t.unescape().map_err(bad_xml)?),
            Event::CData(t) => body.push_str(&String::from_utf8_lossy(t.as_ref())),
            Event::End(e) if e.name().as_ref() == end => return Ok(body),
            Event::Eof => return Err(truncated()),
            _ => {
                return Err(BugzError::protocol(
                    "malformed XML-RPC response: mixed content in scalar value",
                ));
            }
        }
    }
}

/// Reads `<data><value>..</value>..</data></array>`.
fn read_array(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(bad_xml)? {
            Event::Start(e) => match e.name().as_ref() {
                b"data" => {}
                b"value" => items.push(read_value(reader)?),
                other => {
                    return Err(BugzError::protocol(format!(
                        "malformed XML-RPC array: unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                items.push(Value::String(String::new()));
            }
            Event::End(e) if e.name().as_ref() == b"array" => return Ok(Value::Array(items)),
            Event::End(_) => {}
            Event::Text(_) => {}
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Reads `<member><name>..</name><value>..</value></member>..</struct>`.
fn read_struct(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut members = Struct::new();
    let mut name: Option<String> = None;
    loop {
        match reader.read_event().map_err(bad_xml)? {
            Event::Start(e) => match e.name().as_ref() {
                b"member" => name = None,
                b"name" => name = Some(read_scalar(reader, b"name")?),
                b"value" => {
                    let value = read_value(reader)?;
                    let key = name.take().ok_or_else(|| {
                        BugzError::protocol("malformed XML-RPC struct: value before name")
                    })?;
                    members.insert(key, value);
                }
                other => {
                    return Err(BugzError::protocol(format!(
                        "malformed XML-RPC struct: unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                let key = name.take().ok_or_else(|| {
                    BugzError::protocol("malformed XML-RPC struct: value before name")
                })?;
                members.insert(key, Value::String(String::new()));
            }
            Event::End(e) if e.name().as_ref() == b"struct" => {
                return Ok(Value::Struct(members));
            }
            Event::End(_) => {}
            Event::Text(_) => {}
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Parses the loose `dateTime.iso8601` dialect Bugzilla emits.
fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim_end_matches('Z');
    for format in ["%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    Err(BugzError::protocol(format!(
        "invalid XML-RPC dateTime: {raw:?}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_request_shape() {
        let mut params = Struct::new();
        params.insert("ids".to_string(), Value::int_array([123]));
        params.insert("summary".to_string(), Value::from("a <b> & c"));

        let xml = format_request("Bug.get", &params);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<methodName>Bug.get</methodName>"));
        assert!(xml.contains("<name>ids</name>"));
        assert!(xml.contains("<value><int>123</int></value>"));
        // Markup characters in strings must be escaped.
        assert!(xml.contains("<string>a &lt;b&gt; &amp; c</string>"));
    }

    #[test]
    fn test_parse_simple_response() {
        let xml = r#"<?xml version="1.0"?>
            <methodResponse><params><param>
              <value><struct>
                <member><name>id</name><value><int>42</int></value></member>
                <member><name>open</name><value><boolean>1</boolean></value></member>
              </struct></value>
            </param></params></methodResponse>"#;
        let value = parse_response(xml).unwrap();
        assert_eq!(value.get("id").and_then(Value::as_i64), Some(42));
        assert_eq!(value.get("open").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn test_parse_nested_arrays_and_untyped_strings() {
        let xml = r#"<methodResponse><params><param>
            <value><struct>
              <member><name>bugs</name>
                <value><array><data>
                  <value><struct>
                    <member><name>summary</name><value>plain text</value></member>
                  </struct></value>
                </data></array></value>
              </member>
            </struct></value>
        </param></params></methodResponse>"#;
        let value = parse_response(xml).unwrap();
        let bugs = value.get("bugs").and_then(Value::as_array).unwrap();
        assert_eq!(
            bugs[0].get("summary").and_then(Value::as_str),
            Some("plain text")
        );
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<methodResponse><fault>
            <value><struct>
              <member><name>faultCode</name><value><int>410</int></value></member>
              <member><name>faultString</name>
                <value><string>Log in to Bugzilla</string></value></member>
            </struct></value>
        </fault></methodResponse>"#;
        let err = parse_response(xml).unwrap_err();
        assert!(err.is_auth_required());
        assert!(err.to_string().contains("Log in to Bugzilla"));
    }

    #[test]
    fn test_parse_datetime_dialects() {
        for raw in ["20130221T18:22:37", "2013-02-21T18:22:37", "20130221T18:22:37Z"] {
            let dt = parse_datetime(raw).unwrap();
            assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2013-02-21 18:22");
        }
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_base64() {
        let xml = r#"<methodResponse><params><param>
            <value><base64>aGVsbG8=</base64></value>
        </param></params></methodResponse>"#;
        let value = parse_response(xml).unwrap();
        assert_eq!(value.as_base64(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut inner = Struct::new();
        inner.insert("token".to_string(), Value::from("abc-123"));
        let mut params = Struct::new();
        params.insert("creds".to_string(), Value::Struct(inner));
        params.insert("limit".to_string(), Value::Int(10));

        let xml = format_request("Bug.search", &params);
        // Reuse the value parser on the request body by swapping the wrapper
        // elements; the <value> grammar is identical on both sides.
        let body = xml
            .replace("methodCall", "methodResponse")
            .replace("<methodName>Bug.search</methodName>", "");
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed, Value::Struct(params));
    }

    #[test]
    fn test_truncated_response_is_protocol_error() {
        let err = parse_response("<methodResponse><params>").unwrap_err();
        assert!(matches!(err, BugzError::Protocol(_)));
    }
}
