//! Small quick-xml helpers.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::UfoError;

/// Reader over an in-memory document. Text is not trimmed: callers skip
/// whitespace where they do not expect content.
pub(super) fn reader(bytes: &[u8]) -> Reader<&[u8]> {
    Reader::from_reader(bytes)
}

/// Read an attribute by name, unescaped.
pub(super) fn attr(elem: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    elem.attributes().flatten().find_map(|a| {
        if a.key.as_ref() != name {
            return None;
        }
        let raw = String::from_utf8_lossy(&a.value);
        let value = quick_xml::escape::unescape(&raw)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_string());
        Some(value)
    })
}

/// Read a numeric attribute; missing or unparsable values yield `None`.
pub(super) fn attr_f64(elem: &BytesStart<'_>, name: &[u8]) -> Option<f64> {
    attr(elem, name).and_then(|v| v.trim().parse().ok())
}

/// Resolve a general entity reference name (`amp`, `#x41`, ...).
pub(super) fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Collect character data up to the matching end tag.
pub(super) fn read_text(reader: &mut Reader<&[u8]>, path: &Path) -> Result<String, UfoError> {
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => text.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::CData(t)) => text.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::GeneralRef(r)) => {
                let name = String::from_utf8_lossy(&r);
                match resolve_entity(&name) {
                    Some(ch) => text.push(ch),
                    None => {
                        text.push('&');
                        text.push_str(&name);
                        text.push(';');
                    }
                }
            }
            Ok(Event::End(_)) => return Ok(text),
            Ok(Event::Eof) => return Err(UfoError::xml(path, "unexpected end of document")),
            Ok(_) => {}
            Err(e) => return Err(UfoError::xml(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#65"), Some('A'));
        assert_eq!(resolve_entity("#x41"), Some('A'));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[test]
    fn test_read_text_with_entities() {
        let mut r = reader(b"<string>Foo &amp; Bar</string>");
        let Ok(Event::Start(_)) = r.read_event() else {
            panic!("expected start")
        };
        let text = read_text(&mut r, Path::new("t.plist")).unwrap();
        assert_eq!(text, "Foo & Bar");
    }

    #[test]
    fn test_attr_unescaped() {
        let mut r = reader(br#"<source familyname="A &amp; B" xOffset="12.5"/>"#);
        let Ok(Event::Empty(e)) = r.read_event() else {
            panic!("expected empty element")
        };
        assert_eq!(attr(&e, b"familyname").as_deref(), Some("A & B"));
        assert_eq!(attr_f64(&e, b"xOffset"), Some(12.5));
        assert_eq!(attr(&e, b"missing"), None);
    }
}
