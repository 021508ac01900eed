//! XML property list reader.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::UfoError;
use super::xml::{read_text, reader};

/// A parsed property-list value.
#[derive(Debug, Clone, PartialEq)]
pub enum Plist {
    String(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Data(String),
    Date(String),
    Array(Vec<Plist>),
    /// Keys keep document order.
    Dict(Vec<(String, Plist)>),
}

impl Plist {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Plist]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(String, Plist)]> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary key.
    pub fn get(&self, key: &str) -> Option<&Plist> {
        self.as_dict()?
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Array of strings, skipping non-string items.
    pub fn string_list(&self) -> Vec<String> {
        self.as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Read and parse a plist file.
pub fn read_plist(path: &Path) -> Result<Plist, UfoError> {
    let bytes = fs::read(path).map_err(|e| UfoError::Io(path.to_path_buf(), e))?;
    parse_plist(&bytes, path)
}

/// Parse plist bytes. `path` is only used for error messages.
pub(super) fn parse_plist(bytes: &[u8], path: &Path) -> Result<Plist, UfoError> {
    let mut reader = reader(bytes);
    next_value(&mut reader, path)?
        .ok_or_else(|| UfoError::format(path, "property list has no root value"))
}

/// Read the next value; `None` when the enclosing container ends.
fn next_value(reader: &mut Reader<&[u8]>, path: &Path) -> Result<Option<Plist>, UfoError> {
    loop {
        let event = reader.read_event().map_err(|e| UfoError::xml(path, e))?;
        match event {
            Event::Start(e) => {
                let value = match e.name().as_ref() {
                    b"plist" => continue,
                    b"dict" => parse_dict(reader, path)?,
                    b"array" => parse_array(reader, path)?,
                    b"string" => Plist::String(read_text(reader, path)?),
                    b"data" => Plist::Data(read_text(reader, path)?.trim().to_owned()),
                    b"date" => Plist::Date(read_text(reader, path)?.trim().to_owned()),
                    b"integer" => {
                        let text = read_text(reader, path)?;
                        let n = text.trim().parse().map_err(|_| {
                            UfoError::format(path, format!("invalid integer `{}`", text.trim()))
                        })?;
                        Plist::Integer(n)
                    }
                    b"real" => {
                        let text = read_text(reader, path)?;
                        let n = text.trim().parse().map_err(|_| {
                            UfoError::format(path, format!("invalid real `{}`", text.trim()))
                        })?;
                        Plist::Real(n)
                    }
                    other => {
                        return Err(UfoError::format(
                            path,
                            format!("unexpected element <{}>", String::from_utf8_lossy(other)),
                        ));
                    }
                };
                return Ok(Some(value));
            }
            Event::Empty(e) => {
                let value = match e.name().as_ref() {
                    b"true" => Plist::Bool(true),
                    b"false" => Plist::Bool(false),
                    b"string" => Plist::String(String::new()),
                    b"array" => Plist::Array(Vec::new()),
                    b"dict" => Plist::Dict(Vec::new()),
                    b"data" => Plist::Data(String::new()),
                    other => {
                        return Err(UfoError::format(
                            path,
                            format!("unexpected element <{}/>", String::from_utf8_lossy(other)),
                        ));
                    }
                };
                return Ok(Some(value));
            }
            Event::End(_) | Event::Eof => return Ok(None),
            // Declarations, doctype, comments and whitespace between elements.
            _ => {}
        }
    }
}

fn parse_array(reader: &mut Reader<&[u8]>, path: &Path) -> Result<Plist, UfoError> {
    let mut items = Vec::new();
    while let Some(value) = next_value(reader, path)? {
        items.push(value);
    }
    Ok(Plist::Array(items))
}

fn parse_dict(reader: &mut Reader<&[u8]>, path: &Path) -> Result<Plist, UfoError> {
    let mut entries = Vec::new();
    loop {
        let event = reader.read_event().map_err(|e| UfoError::xml(path, e))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"key" => {
                let key = read_text(reader, path)?;
                let value = next_value(reader, path)?.ok_or_else(|| {
                    UfoError::format(path, format!("key `{key}` has no value"))
                })?;
                entries.push((key, value));
            }
            Event::Empty(e) if e.name().as_ref() == b"key" => {
                let value = next_value(reader, path)?
                    .ok_or_else(|| UfoError::format(path, "empty key has no value"))?;
                entries.push((String::new(), value));
            }
            Event::End(_) => return Ok(Plist::Dict(entries)),
            Event::Eof => return Err(UfoError::xml(path, "unterminated <dict>")),
            Event::Start(e) | Event::Empty(e) => {
                return Err(UfoError::format(
                    path,
                    format!(
                        "expected <key> in <dict>, found <{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ),
                ));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONTINFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>familyName</key>
    <string>Test &amp; Sans</string>
    <key>unitsPerEm</key>
    <integer>1000</integer>
    <key>italicAngle</key>
    <real>-12.5</real>
    <key>postscriptIsFixedPitch</key>
    <false/>
    <key>openTypeOS2Selection</key>
    <array/>
    <key>guidelines</key>
    <array>
      <dict>
        <key>x</key>
        <integer>10</integer>
      </dict>
    </array>
  </dict>
</plist>
"#;

    #[test]
    fn test_parse_fontinfo() {
        let plist = parse_plist(FONTINFO.as_bytes(), Path::new("fontinfo.plist")).unwrap();
        assert_eq!(plist.get("familyName").and_then(Plist::as_str), Some("Test & Sans"));
        assert_eq!(plist.get("unitsPerEm"), Some(&Plist::Integer(1000)));
        assert_eq!(plist.get("italicAngle"), Some(&Plist::Real(-12.5)));
        assert_eq!(plist.get("postscriptIsFixedPitch"), Some(&Plist::Bool(false)));
        assert_eq!(plist.get("openTypeOS2Selection"), Some(&Plist::Array(vec![])));

        let guides = plist.get("guidelines").and_then(Plist::as_array).unwrap();
        assert_eq!(guides[0].get("x"), Some(&Plist::Integer(10)));
    }

    #[test]
    fn test_string_list() {
        let src = "<plist><array><string>a</string><integer>1</integer><string>b</string></array></plist>";
        let plist = parse_plist(src.as_bytes(), Path::new("lib.plist")).unwrap();
        assert_eq!(plist.string_list(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_invalid_integer() {
        let src = "<plist><integer>abc</integer></plist>";
        let err = parse_plist(src.as_bytes(), Path::new("x.plist")).unwrap_err();
        assert!(matches!(err, UfoError::Format { .. }));
    }

    #[test]
    fn test_empty_document() {
        let err = parse_plist(b"<plist></plist>", Path::new("x.plist")).unwrap_err();
        assert!(matches!(err, UfoError::Format { .. }));
    }
}
