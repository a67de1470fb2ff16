//! Small helpers shared by the event-driven GPX and TCX readers.

use super::ImportError;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::BytesStart;
use quick_xml::Reader;

/// Decode file bytes as UTF-8 text, dropping a leading byte order mark.
pub(crate) fn decode_text<'a>(content: &'a [u8], format: &str) -> Result<&'a str, ImportError> {
    let text = std::str::from_utf8(content)
        .map_err(|e| ImportError::MalformedInput(format!("{} is not valid UTF-8: {}", format, e)))?;
    Ok(text.trim_start_matches('\u{feff}'))
}

/// Reader configured the same way for every XML format.
pub(crate) fn reader(text: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    reader
}

/// Element name without namespace prefix.
pub(crate) fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Value of the attribute with the given local name.
pub(crate) fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a decimal number, tolerating surrounding whitespace.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an ISO-8601 timestamp; timestamps without offset are taken as UTC.
pub(crate) fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
