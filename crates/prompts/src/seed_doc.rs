//! Reading designer output documents.
//!
//! A designer response is an XML document rooted at `<synai>`. Seed data can
//! appear in two shapes; a `<data>` element holding a JSON seed export wins
//! over `<concept>` elements:
//!
//! ```xml
//! <synai>
//!   <concept>
//!     <id>c1</id>
//!     <content>I avoid hard conversations</content>
//!     <act_dimension>experiential_avoidance</act_dimension>
//!     <harris_area>C</harris_area>
//!     <weight>0.8</weight>
//!     <links>["c2"]</links>
//!   </concept>
//! </synai>
//! ```

use roxmltree::{Document, Node};
use serde::Deserialize;
use spcf_core::{Error, FormulationArea, Result, SeedGraph, SeedNode};

/// Required root element of designer output.
pub const ROOT_ELEMENT: &str = "synai";

/// Parse `text` and check the root element.
pub fn parse(text: &str) -> Result<Document<'_>> {
    let doc = Document::parse(text)
        .map_err(|e| Error::Validation(format!("Designer output is not well-formed XML: {e}")))?;

    let root = doc.root_element().tag_name().name();
    if root != ROOT_ELEMENT {
        return Err(Error::Validation(format!(
            "Designer output must have root element '{ROOT_ELEMENT}', found '{root}'"
        )));
    }
    Ok(doc)
}

#[derive(Deserialize)]
struct SeedExport {
    nodes: Vec<SeedNode>,
}

/// Extract the seed graph carried by `doc`, if any.
///
/// Malformed concepts are validation errors. A `<data>` element whose JSON is
/// not a seed export is ignored in favour of the concepts.
pub fn extract(doc: &Document<'_>, fill_target: u32) -> Result<Option<SeedGraph>> {
    let root = doc.root_element();

    if let Some(nodes) = data_payload(root)? {
        return Ok(Some(SeedGraph::from_nodes(nodes, fill_target)));
    }

    let concepts: Vec<Node<'_, '_>> = root
        .descendants()
        .filter(|n| n.has_tag_name("concept"))
        .collect();
    if concepts.is_empty() {
        return Ok(None);
    }

    let nodes = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| parse_concept(*c, i + 1))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(SeedGraph::from_nodes(nodes, fill_target)))
}

fn data_payload(root: Node<'_, '_>) -> Result<Option<Vec<SeedNode>>> {
    let Some(data) = root.descendants().find(|n| n.has_tag_name("data")) else {
        return Ok(None);
    };
    let raw = text_of(data);
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return Ok(None);
    };
    if value.get("nodes").is_none() {
        return Ok(None);
    }
    let export: SeedExport = serde_json::from_value(value)
        .map_err(|e| Error::Validation(format!("Malformed seed export in <data>: {e}")))?;
    Ok(Some(export.nodes))
}

fn parse_concept(concept: Node<'_, '_>, position: usize) -> Result<SeedNode> {
    let invalid = |why: String| Error::Validation(format!("concept #{position}: {why}"));

    let id = child(concept, &["id"])
        .map(text_of)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing <id>".into()))?;

    let area_text = child(concept, &["area", "harris_area"])
        .map(text_of)
        .ok_or_else(|| invalid(format!("'{id}' is missing <area>")))?;
    let area: FormulationArea = area_text
        .parse()
        .map_err(|e: Error| invalid(format!("'{id}': {e}")))?;

    let weight = match child(concept, &["weight"]).map(text_of) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| invalid(format!("'{id}' has non-numeric weight '{raw}'")))?,
        _ => 0.0,
    };

    let dimensions = concept
        .children()
        .filter(|n| n.has_tag_name("act_dimension") || n.has_tag_name("dimension"))
        .flat_map(list_of)
        .collect();

    Ok(SeedNode {
        source_text: child(concept, &["source_text", "content", "text"])
            .map(text_of)
            .unwrap_or_default(),
        summary: child(concept, &["summary"])
            .map(text_of)
            .filter(|s| !s.is_empty()),
        keywords: child(concept, &["keywords"]).map(list_of).unwrap_or_default(),
        dimensions,
        area,
        weight,
        links: child(concept, &["links"]).map(list_of).unwrap_or_default(),
        id,
    })
}

fn child<'a, 'i>(node: Node<'a, 'i>, names: &[&str]) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && names.contains(&n.tag_name().name()))
}

/// All text below `node`, trimmed.
fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// A list value: child elements, a JSON array, or comma separated text.
fn list_of(node: Node<'_, '_>) -> Vec<String> {
    let items: Vec<String> = node
        .children()
        .filter(|n| n.is_element())
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }

    let raw = text_of(node);
    if raw.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(&raw) {
            return list;
        }
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Insert generation metadata into the document text.
///
/// The fields go into an existing `<metadata>` element when there is one,
/// otherwise a new block is appended to the root. The rest of the document
/// is kept byte for byte.
pub fn stamp_metadata(text: &str, doc: &Document<'_>, fields: &[(&str, &str)]) -> String {
    let body: String = fields
        .iter()
        .map(|(name, value)| format!("<{name}>{}</{name}>", escape(value)))
        .collect();

    let root = doc.root_element();
    let (target, inner) = match root.children().find(|n| n.has_tag_name("metadata")) {
        Some(meta) => (meta, body),
        None => (root, format!("<metadata>{body}</metadata>")),
    };

    let range = target.range();
    let element = &text[range.clone()];
    let mut out = String::with_capacity(text.len() + inner.len() + 32);
    out.push_str(&text[..range.start]);

    if let Some(open) = element.strip_suffix("/>") {
        // <tag attr="x"/> becomes <tag attr="x">...</tag>
        let tag = target.tag_name().name();
        out.push_str(open.trim_end());
        out.push('>');
        out.push_str(&inner);
        out.push_str(&format!("</{tag}>"));
    } else {
        let close = element.rfind("</").unwrap_or(element.len());
        out.push_str(&element[..close]);
        out.push_str(&inner);
        out.push_str(&element[close..]);
    }

    out.push_str(&text[range.end..]);
    out
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spcf_core::ErrorKind;

    const TWO_CONCEPTS: &str = r#"<?xml version="1.0"?>
<synai>
  <concept>
    <id>c1</id>
    <content>I avoid hard conversations</content>
    <act_dimension>experiential_avoidance</act_dimension>
    <harris_area>C</harris_area>
    <weight>0.8</weight>
    <links>["c2"]</links>
  </concept>
  <concept>
    <id>c2</id>
    <content>Family matters most</content>
    <area>d</area>
    <weight>0.5</weight>
    <keywords><keyword>family</keyword><keyword>values</keyword></keywords>
  </concept>
</synai>"#;

    fn graph(text: &str) -> Result<Option<SeedGraph>> {
        extract(&parse(text)?, 3)
    }

    #[test]
    fn concepts_become_nodes() {
        let g = graph(TWO_CONCEPTS).unwrap().unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.area_stats(FormulationArea::C).node_count, 1);
        assert_eq!(g.area_stats(FormulationArea::D).node_count, 1);

        let c1 = &g.nodes[0];
        assert_eq!(c1.source_text, "I avoid hard conversations");
        assert_eq!(c1.dimensions, vec!["experiential_avoidance"]);
        assert_eq!(c1.links, vec!["c2"]);
        assert_eq!(g.nodes[1].keywords, vec!["family", "values"]);
    }

    #[test]
    fn wrong_root_rejected() {
        let err = parse("<other/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn malformed_xml_rejected() {
        assert_eq!(parse("<synai><open></synai>").unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(parse("not xml at all").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn concept_needs_id_and_area() {
        let no_id = "<synai><concept><area>A</area></concept></synai>";
        assert_eq!(graph(no_id).unwrap_err().kind(), ErrorKind::Validation);

        let no_area = "<synai><concept><id>x</id></concept></synai>";
        assert_eq!(graph(no_area).unwrap_err().kind(), ErrorKind::Validation);

        let bad_area = "<synai><concept><id>x</id><area>Q</area></concept></synai>";
        assert_eq!(graph(bad_area).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn weight_must_be_numeric() {
        let doc = "<synai><concept><id>x</id><area>A</area><weight>heavy</weight></concept></synai>";
        assert_eq!(graph(doc).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn no_payload_is_none() {
        assert!(graph("<synai><note>hi</note></synai>").unwrap().is_none());
    }

    #[test]
    fn data_export_takes_precedence() {
        let doc = r#"<synai>
  <data>{"nodes":[{"id":"n1","area":"E","weight":0.4},{"id":"n2","area":"E"}]}</data>
  <concept><id>ignored</id><area>A</area></concept>
</synai>"#;
        let g = graph(doc).unwrap().unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.area_stats(FormulationArea::E).node_count, 2);
        assert_eq!(g.area_stats(FormulationArea::A).node_count, 0);
    }

    #[test]
    fn area_case_is_ignored_on_both_paths() {
        let from_data = graph(r#"<synai><data>{"nodes":[{"id":"n1","area":"c"}]}</data></synai>"#)
            .unwrap()
            .unwrap();
        let from_concepts = graph("<synai><concept><id>n1</id><area>c</area></concept></synai>")
            .unwrap()
            .unwrap();
        assert_eq!(from_data.nodes[0].area, FormulationArea::C);
        assert_eq!(from_concepts.nodes[0].area, FormulationArea::C);
    }

    #[test]
    fn unrelated_data_json_falls_back_to_concepts() {
        let doc = r#"<synai><data>{"summary":"x"}</data><concept><id>c</id><area>B</area></concept></synai>"#;
        let g = graph(doc).unwrap().unwrap();
        assert_eq!(g.nodes[0].id, "c");
    }

    #[test]
    fn list_forms() {
        let doc = r#"<synai><concept><id>x</id><area>A</area><links>a, b ,</links></concept></synai>"#;
        let g = graph(doc).unwrap().unwrap();
        assert_eq!(g.nodes[0].links, vec!["a", "b"]);
    }

    #[test]
    fn stamp_appends_block_to_root() {
        let text = "<?xml version=\"1.0\"?>\n<synai><x/></synai>\n";
        let doc = parse(text).unwrap();
        let out = stamp_metadata(text, &doc, &[("generated_by", "synai_designer")]);
        assert_eq!(
            out,
            "<?xml version=\"1.0\"?>\n<synai><x/><metadata><generated_by>synai_designer</generated_by></metadata></synai>\n"
        );
        parse(&out).unwrap();
    }

    #[test]
    fn stamp_fills_existing_metadata() {
        let text = "<synai><metadata><topic>t</topic></metadata></synai>";
        let doc = parse(text).unwrap();
        let out = stamp_metadata(text, &doc, &[("user_id", "u1")]);
        assert_eq!(
            out,
            "<synai><metadata><topic>t</topic><user_id>u1</user_id></metadata></synai>"
        );
    }

    #[test]
    fn stamp_expands_self_closing_elements() {
        let text = "<synai a=\"1\"/>";
        let doc = parse(text).unwrap();
        let out = stamp_metadata(text, &doc, &[("user_id", "u1")]);
        assert_eq!(out, "<synai a=\"1\"><metadata><user_id>u1</user_id></metadata></synai>");

        let text = "<synai><metadata /></synai>";
        let doc = parse(text).unwrap();
        let out = stamp_metadata(text, &doc, &[("user_id", "u1")]);
        assert_eq!(out, "<synai><metadata><user_id>u1</user_id></metadata></synai>");
    }

    #[test]
    fn stamped_document_keeps_its_concepts() {
        let doc = parse(TWO_CONCEPTS).unwrap();
        let out = stamp_metadata(TWO_CONCEPTS, &doc, &[("user_id", "u1")]);
        let again = graph(&out).unwrap().unwrap();
        assert_eq!(again, graph(TWO_CONCEPTS).unwrap().unwrap());
    }
}
