//! XML wire codec. Every message travels as a flat document under `<xml>`.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::error::Error;

const ROOT: &str = "xml";

/// Renders `value` as `<xml><field>..</field>..</xml>`.
pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(quick_xml::se::to_string_with_root(ROOT, value)?)
}

/// Parses a gateway document. The root tag name is not checked.
pub fn from_str<T: DeserializeOwned>(body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Err(Error::encoding("empty body"));
    }

    decode(body)
}

/// Like [`from_str`] for raw bytes off the wire.
pub fn from_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    from_str(std::str::from_utf8(body)?)
}

/// Tag/text pairs of the children of the root, with text kept exactly as
/// sent: surrounding whitespace survives and CDATA sections are unwrapped.
///
/// The serde decoder trims plain text, so signatures are checked over this
/// map rather than over the decoded struct.
pub fn text_fields(body: &str) -> Result<BTreeMap<String, String>> {
    let mut reader = Reader::from_str(body);
    let mut fields = BTreeMap::new();
    let mut current: Option<(String, String)> = None;
    let mut depth = 0_usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;
                if depth == 2 {
                    let name = std::str::from_utf8(start.local_name().as_ref())?.to_owned();
                    current = Some((name, String::new()));
                }
            }
            Event::Empty(empty) if depth == 1 => {
                let name = std::str::from_utf8(empty.local_name().as_ref())?.to_owned();
                fields.insert(name, String::new());
            }
            Event::Text(text) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(std::str::from_utf8(&data)?);
                }
            }
            Event::End(_) => {
                if depth == 2
                    && let Some((name, value)) = current.take()
                {
                    fields.insert(name, value);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

#[cfg(not(feature = "tracing"))]
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(quick_xml::de::from_str(body)?)
}

#[cfg(feature = "tracing")]
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let mut deserializer = quick_xml::de::Deserializer::from_str(body);
    let mut ignored = Vec::new();
    let mut record = |path: serde_ignored::Path<'_>| ignored.push(path.to_string());
    let tracked = serde_ignored::Deserializer::new(&mut deserializer, &mut record);

    let value = serde_path_to_error::deserialize(tracked).inspect_err(|e| {
        tracing::error!(path = %e.path(), error = %e.inner(), "failed to decode XML payload");
    })?;

    for path in ignored {
        tracing::warn!(%path, "unknown tag in XML payload");
    }

    Ok(value)
}
