//! XMP packet discovery and property extraction.
//!
//! Packets are located by scanning raw bytes for the `x:xmpmeta` wrapper, which
//! works the same for JPEG APP1 segments, TIFF tags and MP4 `uuid` boxes.
//! Properties are keyed by namespace URI so prefix choices in the packet do not
//! matter.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::DecodeError;
use crate::metadata::{Directory, MetadataRecord, MetadataValue, TagKey};

const PACKET_STARTS: &[&[u8]] = &[b"<x:xmpmeta", b"<x:xapmeta"];
const PACKET_ENDS: &[&[u8]] = &[b"</x:xmpmeta>", b"</x:xapmeta>"];
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const META_NS: &str = "adobe:ns:meta/";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Locate the first XMP packet in raw file bytes.
pub fn find_packet(bytes: &[u8]) -> Option<&[u8]> {
    for (open, close) in PACKET_STARTS.iter().zip(PACKET_ENDS) {
        if let Some(start) = find(bytes, open) {
            let end = find(&bytes[start..], close)? + start + close.len();
            return Some(&bytes[start..end]);
        }
    }
    None
}

fn bound(ns: ResolveResult) -> Option<String> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn is_structural(ns: &str) -> bool {
    ns == RDF_NS || ns == META_NS
}

/// Parse one packet into an XMP record.
///
/// Simple properties are accepted in both attribute form
/// (`<rdf:Description xmp:CreateDate="...">`) and element form
/// (`<xmp:CreateDate>...</xmp:CreateDate>`). Values inside `rdf:Alt`/`rdf:Seq`
/// belong to the nearest enclosing property. The first value seen wins.
pub fn parse_packet(xml: &[u8]) -> Result<MetadataRecord, DecodeError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries: BTreeMap<TagKey, MetadataValue> = BTreeMap::new();
    let mut open: Vec<Option<TagKey>> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        let ns = bound(ns);

        match event {
            Event::Start(ref e) => {
                read_attributes(&reader, e, &mut entries)?;
                let key = ns
                    .filter(|ns| !is_structural(ns))
                    .map(|ns| TagKey::property(&ns, &String::from_utf8_lossy(e.local_name().as_ref())));
                open.push(key);
            }
            Event::Empty(ref e) => read_attributes(&reader, e, &mut entries)?,
            Event::Text(ref t) => {
                if let Some(key) = open.iter().rev().find_map(|k| k.clone()) {
                    let text = t.unescape()?.trim().to_string();
                    if !text.is_empty() {
                        entries.entry(key).or_insert(MetadataValue::Text(text));
                    }
                }
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(MetadataRecord::new(Directory::Xmp, entries))
}

fn read_attributes(
    reader: &NsReader<&[u8]>,
    element: &BytesStart,
    entries: &mut BTreeMap<TagKey, MetadataValue>,
) -> Result<(), DecodeError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let Some(ns) = bound(ns) else {
            continue;
        };
        if is_structural(&ns) {
            continue;
        }
        let value = attr.unescape_value()?.trim().to_string();
        let key = TagKey::property(&ns, &String::from_utf8_lossy(local.as_ref()));
        entries.entry(key).or_insert(MetadataValue::Text(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XMP_NS: &str = "http://ns.adobe.com/xap/1.0/";
    const PHOTOSHOP_NS: &str = "http://ns.adobe.com/photoshop/1.0/";

    fn text<'a>(record: &'a MetadataRecord, ns: &str, name: &str) -> Option<&'a str> {
        record.get(&TagKey::property(ns, name))?.as_text()
    }

    #[test]
    fn test_attribute_and_element_forms() {
        let xml = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:xmp="http://ns.adobe.com/xap/1.0/"
        xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"
        xmp:CreateDate="2021-04-05T06:07:08+02:00">
      <photoshop:DateCreated>2021-04-05</photoshop:DateCreated>
      <xmp:MetadataDate>
        <rdf:Alt>
          <rdf:li xml:lang="x-default">2022-01-01T00:00:00</rdf:li>
        </rdf:Alt>
      </xmp:MetadataDate>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#;

        let record = parse_packet(xml).unwrap();
        assert_eq!(record.directory(), Directory::Xmp);
        assert_eq!(text(&record, XMP_NS, "CreateDate"), Some("2021-04-05T06:07:08+02:00"));
        assert_eq!(text(&record, PHOTOSHOP_NS, "DateCreated"), Some("2021-04-05"));
        assert_eq!(text(&record, XMP_NS, "MetadataDate"), Some("2022-01-01T00:00:00"));
        assert!(record.get(&TagKey::property(RDF_NS, "about")).is_none());
    }

    #[test]
    fn test_prefix_is_irrelevant() {
        let xml = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description xmlns:xap="http://ns.adobe.com/xap/1.0/" xap:CreateDate="2010-10-10"/>
  </rdf:RDF>
</x:xmpmeta>"#;
        let record = parse_packet(xml).unwrap();
        assert_eq!(text(&record, XMP_NS, "CreateDate"), Some("2010-10-10"));
    }

    #[test]
    fn test_find_packet_in_binary() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10];
        bytes.extend_from_slice(b"http://ns.adobe.com/xap/1.0/\0<?xpacket begin=\"\"?>");
        bytes.extend_from_slice(b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"></x:xmpmeta>");
        bytes.extend_from_slice(b"<?xpacket end=\"w\"?>\xFF\xD9");

        let packet = find_packet(&bytes).unwrap();
        assert!(packet.starts_with(b"<x:xmpmeta"));
        assert!(packet.ends_with(b"</x:xmpmeta>"));
        assert!(find_packet(b"no packet here").is_none());
        assert!(find_packet(b"<x:xmpmeta truncated").is_none());
    }

    #[test]
    fn test_malformed_packet_is_an_error() {
        assert!(parse_packet(b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><a></b></x:xmpmeta>").is_err());
    }
}
