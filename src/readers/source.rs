use crate::error::{ProcessingError, Result};
use crate::models::RawObservation;
use crate::readers::{JsonDocument, XmlDocument};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Encoding of a source payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Xml,
}

impl SourceFormat {
    /// `.json` and `.txt` are JSON, `.xml` is XML; anything else is undecided.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" | "txt" => Some(SourceFormat::Json),
            "xml" => Some(SourceFormat::Xml),
            _ => None,
        }
    }

    /// Guess from the first non-blank character of the payload.
    pub fn sniff(text: &str) -> Option<Self> {
        match text.trim_start().chars().next()? {
            '{' | '[' => Some(SourceFormat::Json),
            '<' => Some(SourceFormat::Xml),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Json => write!(f, "JSON"),
            SourceFormat::Xml => write!(f, "XML"),
        }
    }
}

/// A parsed source payload that can list its observations in document order.
pub trait SourceDocument {
    fn format(&self) -> SourceFormat;

    fn extract_observations(&self) -> Result<Vec<RawObservation>>;
}

/// Read and parse a source file. `format` overrides detection when given.
pub fn load_document(path: &Path, format: Option<SourceFormat>) -> Result<Box<dyn SourceDocument>> {
    if !path.exists() {
        return Err(ProcessingError::InputNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let text = decode_payload(&bytes)?;
    let format = format.or_else(|| SourceFormat::from_extension(path));
    debug!(path = %path.display(), bytes = bytes.len(), ?format, "Loaded source payload");

    parse_payload(text, format)
}

/// Parse an in-memory payload, sniffing the format when none is given.
pub fn parse_payload(text: String, format: Option<SourceFormat>) -> Result<Box<dyn SourceDocument>> {
    match format.or_else(|| SourceFormat::sniff(&text)) {
        Some(SourceFormat::Json) => Ok(Box::new(JsonDocument::parse(&text)?)),
        Some(SourceFormat::Xml) => Ok(Box::new(XmlDocument::parse(text)?)),
        None => {
            if let Ok(document) = JsonDocument::parse(&text) {
                return Ok(Box::new(document));
            }
            XmlDocument::parse(text)
                .map(|document| Box::new(document) as Box<dyn SourceDocument>)
                .map_err(|_| {
                    ProcessingError::MalformedInput(
                        "payload is neither valid JSON nor valid XML".to_string(),
                    )
                })
        }
    }
}

/// Decode bytes honouring a byte-order mark; UTF-8 otherwise.
///
/// Undecodable bytes are rejected rather than replaced, so a mis-encoded feed never
/// reaches the store as mangled location names.
fn decode_payload(bytes: &[u8]) -> Result<String> {
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        return Err(ProcessingError::MalformedInput(format!(
            "payload is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_extension(Path::new("F-A0010-001.json")),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_extension(Path::new("feed.TXT")),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_extension(Path::new("F-A0010-001.xml")),
            Some(SourceFormat::Xml)
        );
        assert_eq!(SourceFormat::from_extension(Path::new("feed")), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(SourceFormat::sniff("  {\"records\": {}}"), Some(SourceFormat::Json));
        assert_eq!(SourceFormat::sniff("\n<?xml version=\"1.0\"?>"), Some(SourceFormat::Xml));
        assert_eq!(SourceFormat::sniff("records"), None);
        assert_eq!(SourceFormat::sniff(""), None);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = parse_payload("this is not a feed".to_string(), None);
        assert!(matches!(result, Err(ProcessingError::MalformedInput(_))));
    }

    #[test]
    fn test_declared_format_wins_over_content() {
        let result = parse_payload("<cwbopendata/>".to_string(), Some(SourceFormat::Json));
        assert!(matches!(result, Err(ProcessingError::MalformedInput(_))));
    }

    #[test]
    fn test_load_sniffs_unknown_extension() -> Result<()> {
        let mut file = Builder::new().suffix(".dat").tempfile()?;
        write!(
            file,
            "<cwbopendata><location><locationName>A</locationName></location></cwbopendata>"
        )?;

        let document = load_document(file.path(), None)?;
        assert_eq!(document.format(), SourceFormat::Xml);
        Ok(())
    }

    #[test]
    fn test_load_strips_utf8_bom() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        file.write_all(b"\xEF\xBB\xBF{\"records\":{\"location\":[]}}")?;

        let document = load_document(file.path(), None)?;
        assert_eq!(document.format(), SourceFormat::Json);
        Ok(())
    }

    #[test]
    fn test_undecodable_bytes_are_malformed() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        // "臺北" in Big5
        file.write_all(b"{\"records\":{\"location\":[{\"locationName\":\"\xBB\x4F\xA5\x5F\"}]}}")?;

        let result = load_document(file.path(), None);
        assert!(matches!(result, Err(ProcessingError::MalformedInput(_))));
        Ok(())
    }

    #[test]
    fn test_utf16_bom_is_decoded() -> Result<()> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<r><location/></r>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_payload(&bytes)?, "<r><location/></r>");
        Ok(())
    }

    #[test]
    fn test_missing_input_is_reported() {
        let result = load_document(Path::new("/nonexistent/F-A0010-001.json"), None);
        assert!(matches!(result, Err(ProcessingError::InputNotFound(_))));
    }
}
