//! XML-RPC wire format.
//!
//! Method calls are written as plain strings with escaped text; responses
//! are read with a `quick-xml` pull parser into an [`XmlRpcValue`] tree.
//! A `<fault>` response becomes [`RpcError::Fault`].

use super::RpcError;
use quick_xml::events::Event;
use quick_xml::escape::escape;
use quick_xml::Reader;

/// A decoded XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum XmlRpcValue {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    DateTime(String),
    Base64(String),
    Struct(Vec<(String, XmlRpcValue)>),
    Array(Vec<XmlRpcValue>),
    Nil,
}

impl XmlRpcValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlRpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form of scalar values (ids arrive as strings or ints depending on server)
    pub fn to_text(&self) -> Option<String> {
        match self {
            XmlRpcValue::String(s) | XmlRpcValue::DateTime(s) | XmlRpcValue::Base64(s) => Some(s.clone()),
            XmlRpcValue::Int(i) => Some(i.to_string()),
            XmlRpcValue::Bool(b) => Some(b.to_string()),
            XmlRpcValue::Double(d) => Some(d.to_string()),
            XmlRpcValue::Struct(_) | XmlRpcValue::Array(_) | XmlRpcValue::Nil => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&XmlRpcValue> {
        match self {
            XmlRpcValue::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for XmlRpcValue {
    fn from(s: &str) -> Self {
        XmlRpcValue::String(s.to_string())
    }
}

/// Serialize a method call
pub fn encode_call(method: &str, params: &[XmlRpcValue]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
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
        XmlRpcValue::Int(i) => out.push_str(&format!("<int>{}</int>", i)),
        XmlRpcValue::Bool(b) => out.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" }),
        XmlRpcValue::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        XmlRpcValue::Double(d) => out.push_str(&format!("<double>{}</double>", d)),
        XmlRpcValue::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</dateTime.iso8601>");
        }
        XmlRpcValue::Base64(s) => {
            out.push_str("<base64>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</base64>");
        }
        XmlRpcValue::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        XmlRpcValue::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        XmlRpcValue::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Parse a `<methodResponse>` document.
///
/// Returns the single result value, or `RpcError::Fault` for fault responses.
pub fn parse_response(xml: &str) -> Result<XmlRpcValue, RpcError> {
    let mut parser = Parser { reader: Reader::from_str(xml) };

    parser.expect_start("methodResponse")?;
    match parser.next_significant()? {
        Token::Start(name) if name == "params" => {
            parser.expect_start("param")?;
            parser.value()
        }
        Token::Start(name) if name == "fault" => {
            let value = parser.value()?;
            Err(fault_from_value(&value))
        }
        other => Err(unexpected("<params> or <fault>", &other)),
    }
}

fn fault_from_value(value: &XmlRpcValue) -> RpcError {
    let code = match value.member("faultCode") {
        Some(XmlRpcValue::Int(code)) => *code,
        Some(other) => other.to_text().and_then(|s| s.trim().parse().ok()).unwrap_or(0),
        None => 0,
    };
    let message = value.member("faultString").and_then(|v| v.to_text()).unwrap_or_default();
    RpcError::Fault { code, message }
}

#[derive(Debug)]
enum Token {
    Start(String),
    End(String),
    Empty(String),
    Text(String),
    Eof,
}

fn unexpected(wanted: &str, got: &Token) -> RpcError {
    RpcError::Malformed(format!("expected {}, found {:?}", wanted, got))
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn next_token(&mut self) -> Result<Token, RpcError> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| RpcError::Malformed(format!("invalid XML at byte {}: {}", self.reader.buffer_position(), e)))?;

            let token = match event {
                Event::Start(e) => Token::Start(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
                Event::End(e) => Token::End(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
                Event::Empty(e) => Token::Empty(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| RpcError::Malformed(format!("bad text: {}", e)))?;
                    Token::Text(text.into_owned())
                }
                Event::CData(c) => Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
                Event::Eof => Token::Eof,
                _ => continue,
            };
            return Ok(token);
        }
    }

    /// Next token that is not inter-element whitespace
    fn next_significant(&mut self) -> Result<Token, RpcError> {
        loop {
            match self.next_token()? {
                Token::Text(t) if t.trim().is_empty() => continue,
                token => return Ok(token),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<(), RpcError> {
        match self.next_significant()? {
            Token::Start(n) if n == name => Ok(()),
            other => Err(unexpected(&format!("<{}>", name), &other)),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<(), RpcError> {
        match self.next_significant()? {
            Token::End(n) if n == name => Ok(()),
            other => Err(unexpected(&format!("</{}>", name), &other)),
        }
    }

    /// Read a complete `<value>` element
    fn value(&mut self) -> Result<XmlRpcValue, RpcError> {
        match self.next_significant()? {
            Token::Start(n) if n == "value" => self.value_body(),
            Token::Empty(n) if n == "value" => Ok(XmlRpcValue::String(String::new())),
            other => Err(unexpected("<value>", &other)),
        }
    }

    /// Contents of a `<value>` after its start tag, through its end tag
    fn value_body(&mut self) -> Result<XmlRpcValue, RpcError> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(t) => text.push_str(&t),
                // untyped values are strings
                Token::End(n) if n == "value" => return Ok(XmlRpcValue::String(text)),
                Token::Empty(kind) => {
                    let value = empty_typed(&kind)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                Token::Start(kind) => {
                    let value = self.typed(&kind)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                other => return Err(unexpected("value contents", &other)),
            }
        }
    }

    fn typed(&mut self, kind: &str) -> Result<XmlRpcValue, RpcError> {
        match kind {
            "struct" => self.struct_body(),
            "array" => self.array_body(),
            "nil" => {
                self.expect_end("nil")?;
                Ok(XmlRpcValue::Nil)
            }
            _ => {
                let text = self.text_until_end(kind)?;
                scalar(kind, text)
            }
        }
    }

    fn text_until_end(&mut self, name: &str) -> Result<String, RpcError> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(t) => text.push_str(&t),
                Token::End(n) if n == name => return Ok(text),
                other => return Err(unexpected(&format!("text inside <{}>", name), &other)),
            }
        }
    }

    fn struct_body(&mut self) -> Result<XmlRpcValue, RpcError> {
        let mut members = Vec::new();
        loop {
            match self.next_significant()? {
                Token::Start(n) if n == "member" => members.push(self.member_body()?),
                Token::End(n) if n == "struct" => return Ok(XmlRpcValue::Struct(members)),
                other => return Err(unexpected("<member> or </struct>", &other)),
            }
        }
    }

    fn member_body(&mut self) -> Result<(String, XmlRpcValue), RpcError> {
        let mut name = None;
        let mut value = None;
        loop {
            match self.next_significant()? {
                Token::Start(n) if n == "name" => name = Some(self.text_until_end("name")?),
                Token::Start(n) if n == "value" => value = Some(self.value_body()?),
                Token::Empty(n) if n == "value" => value = Some(XmlRpcValue::String(String::new())),
                Token::End(n) if n == "member" => break,
                other => return Err(unexpected("<name>, <value> or </member>", &other)),
            }
        }
        match (name, value) {
            (Some(name), Some(value)) => Ok((name, value)),
            _ => Err(RpcError::Malformed("struct member without name or value".to_string())),
        }
    }

    fn array_body(&mut self) -> Result<XmlRpcValue, RpcError> {
        let mut items = Vec::new();
        match self.next_significant()? {
            Token::Empty(n) if n == "data" => {}
            Token::Start(n) if n == "data" => loop {
                match self.next_significant()? {
                    Token::Start(n) if n == "value" => items.push(self.value_body()?),
                    Token::Empty(n) if n == "value" => items.push(XmlRpcValue::String(String::new())),
                    Token::End(n) if n == "data" => break,
                    other => return Err(unexpected("<value> or </data>", &other)),
                }
            },
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_end("array")?;
        Ok(XmlRpcValue::Array(items))
    }
}

fn empty_typed(kind: &str) -> Result<XmlRpcValue, RpcError> {
    match kind {
        "nil" => Ok(XmlRpcValue::Nil),
        "struct" => Ok(XmlRpcValue::Struct(Vec::new())),
        "array" => Ok(XmlRpcValue::Array(Vec::new())),
        "string" => Ok(XmlRpcValue::String(String::new())),
        "base64" => Ok(XmlRpcValue::Base64(String::new())),
        other => Err(RpcError::Malformed(format!("empty <{}/> has no value", other))),
    }
}

fn scalar(kind: &str, text: String) -> Result<XmlRpcValue, RpcError> {
    let bad = |text: &str| RpcError::Malformed(format!("invalid <{}> value '{}'", kind, text));
    match kind {
        "string" => Ok(XmlRpcValue::String(text)),
        "int" | "i4" | "i8" => text.trim().parse().map(XmlRpcValue::Int).map_err(|_| bad(&text)),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(XmlRpcValue::Bool(true)),
            "0" | "false" => Ok(XmlRpcValue::Bool(false)),
            _ => Err(bad(&text)),
        },
        "double" => text.trim().parse().map(XmlRpcValue::Double).map_err(|_| bad(&text)),
        "dateTime.iso8601" => Ok(XmlRpcValue::DateTime(text.trim().to_string())),
        "base64" => Ok(XmlRpcValue::Base64(text.trim().to_string())),
        other => Err(RpcError::Malformed(format!("unknown value type <{}>", other))),
    }
}
