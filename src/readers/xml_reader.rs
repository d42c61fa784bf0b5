use crate::error::{ProcessingError, Result};
use crate::models::{RawObservation, RawValue, TimeFields};
use crate::readers::source::{SourceDocument, SourceFormat};
use crate::utils::constants::PLAIN_VALUE_KEYS;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

/// F-A0010-001 payload in its XML encoding.
///
/// Tags are matched by local name only, so the feed's default namespace does not
/// matter. The tree is walked rather than addressed by fixed paths; optional tags
/// may be missing anywhere.
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    pub fn parse(text: String) -> Result<Self> {
        Document::parse(&text)
            .map_err(|e| ProcessingError::MalformedInput(format!("invalid XML: {}", e)))?;
        Ok(Self { text })
    }
}

impl SourceDocument for XmlDocument {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }

    fn extract_observations(&self) -> Result<Vec<RawObservation>> {
        let document = Document::parse(&self.text)
            .map_err(|e| ProcessingError::MalformedInput(format!("invalid XML: {}", e)))?;

        let locations: Vec<Node> = document
            .descendants()
            .filter(|node| is_tag(node, "location"))
            .collect();

        if locations.is_empty() {
            return Err(ProcessingError::MalformedInput(
                "no <location> element found in XML".to_string(),
            ));
        }

        let has_elements = locations.iter().any(|location| {
            children(*location, "weatherElement")
                .chain(children(*location, "weatherElements"))
                .next()
                .is_some()
        });
        if !has_elements {
            return Err(ProcessingError::MalformedInput(
                "no <location> carries a weatherElement list".to_string(),
            ));
        }

        let mut observations = Vec::new();
        for location in locations {
            extract_location(location, &mut observations);
        }
        Ok(observations)
    }
}

fn extract_location(location: Node, out: &mut Vec<RawObservation>) {
    let Some(name) = child_text(location, "locationName").or_else(|| child_text(location, "name"))
    else {
        warn!("Skipping <location> without a name");
        return;
    };

    let mut found_elements = false;
    for element in children(location, "weatherElement") {
        found_elements = true;
        extract_element(&name, element, out);
    }
    for elements in children(location, "weatherElements") {
        found_elements = true;
        extract_element_map(&name, elements, out);
    }

    if !found_elements {
        debug!(location = %name, "Location has no weather elements");
    }
}

fn extract_element(location: &str, element: Node, out: &mut Vec<RawObservation>) {
    let element_name = child_text(element, "elementName").unwrap_or_default();
    let entries: Vec<Node> = children(element, "time").collect();

    if entries.is_empty() {
        let (value, unit) = extract_value(element);
        out.push(
            RawObservation::new(location, element_name, value, time_fields(element)).with_unit(unit),
        );
        return;
    }

    for entry in entries {
        let (mut value, mut unit) = extract_value(entry);
        if value.is_missing() {
            (value, unit) = extract_value(element);
        }

        // Bare <time>2024-01-01T00:00:00</time> carries the timestamp as text.
        let mut time = time_fields(entry);
        if time.is_empty() {
            if let Some(text) = own_text(entry) {
                time = TimeFields::data_time(text);
            }
        }

        out.push(
            RawObservation::new(location, element_name.clone(), value, time).with_unit(unit),
        );
    }
}

/// `<weatherElements><MaxT><units/><daily><dataDate/><temperature/></daily></MaxT></weatherElements>`
fn extract_element_map(location: &str, elements: Node, out: &mut Vec<RawObservation>) {
    for element in elements.children().filter(Node::is_element) {
        let element_name = element.tag_name().name();
        let unit = child_text(element, "units");

        for daily in children(element, "daily") {
            let time = TimeFields {
                data_time: child_text(daily, "dataDate").or_else(|| child_text(daily, "dataTime")),
                ..TimeFields::default()
            };
            let explicit = child(daily, "temperature").is_some();
            let value = text_value(child_text(daily, "temperature"));

            out.push(
                RawObservation::new(location, element_name, value, time)
                    .with_unit(unit.clone())
                    .with_explicit_temperature(explicit),
            );
        }
    }
}

fn extract_value(node: Node) -> (RawValue, Option<String>) {
    if let Some(element_value) = child(node, "elementValue") {
        if has_element_children(element_value) {
            return (
                text_value(child_text(element_value, "value")),
                child_text(element_value, "measures"),
            );
        }
        return (text_value(own_text(element_value)), None);
    }

    if let Some(parameter) = child(node, "parameter") {
        let value = child_text(parameter, "parameterName")
            .or_else(|| child_text(parameter, "parameterValue"));
        return (text_value(value), child_text(parameter, "parameterUnit"));
    }

    let value = PLAIN_VALUE_KEYS.iter().find_map(|&key| child_text(node, key));
    (text_value(value), None)
}

fn time_fields(node: Node) -> TimeFields {
    TimeFields::from_lookup(|key| child_text(node, key))
}

fn text_value(text: Option<String>) -> RawValue {
    text.map(RawValue::Text).unwrap_or(RawValue::Missing)
}

fn is_tag(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| is_tag(child, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

fn has_element_children(node: Node) -> bool {
    node.children().any(|child| child.is_element())
}

/// Trimmed, non-empty text of the first child tag called `name`.
fn child_text(node: Node, name: &'static str) -> Option<String> {
    child(node, name).and_then(own_text)
}

fn own_text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
