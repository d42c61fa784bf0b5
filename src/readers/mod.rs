pub mod json_reader;
pub mod source;
pub mod xml_reader;

pub use json_reader::JsonDocument;
pub use source::{load_document, parse_payload, SourceDocument, SourceFormat};
pub use xml_reader::XmlDocument;
