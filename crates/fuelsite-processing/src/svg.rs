//! Vector (SVG) path
//!
//! SVG files are inlined as-is after stripping executable content. Markup is
//! never rasterized or recompressed.

use fuelsite_core::{DataUrl, EncodedImage, ImageKind};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{HashMap, HashSet};

use crate::error::IngestError;

/// Elements removed together with their whole subtree
const BLOCKED_ELEMENTS: &[&str] = &["script", "foreignobject", "iframe", "embed", "object"];

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("Malformed SVG markup: {0}")]
    Parse(String),

    #[error("Failed to write sanitized SVG: {0}")]
    Write(String),

    #[error("Document has no <svg> element")]
    NotSvg,

    #[error("SVG references external entity '{0}', which cannot be inlined")]
    ExternalEntity(String),
}

/// General entities declared in a DOCTYPE internal subset.
///
/// Editors such as Illustrator declare namespace URIs this way
/// (`<!ENTITY ns_svg "http://www.w3.org/2000/svg">`). The DOCTYPE is dropped
/// from the output, so references are expanded in place.
#[derive(Debug, Default)]
struct DeclaredEntities {
    values: HashMap<String, String>,
    /// SYSTEM/PUBLIC entities; their content is never fetched.
    external: HashSet<String>,
}

impl DeclaredEntities {
    fn parse(doctype: &str) -> Self {
        let mut entities = Self::default();
        let mut rest = doctype;

        while let Some(pos) = rest.find("<!ENTITY") {
            rest = rest[pos + "<!ENTITY".len()..].trim_start();

            // Parameter entities only matter inside the DTD itself
            if rest.starts_with('%') {
                continue;
            }

            let name_end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            let name = rest[..name_end].to_string();
            rest = rest[name_end..].trim_start();

            match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &rest[1..];
                    if let Some(end) = body.find(quote) {
                        entities.values.insert(name, body[..end].to_string());
                        rest = &body[end + 1..];
                    }
                }
                _ => {
                    entities.external.insert(name);
                }
            }
        }

        entities
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn check_external(&self, raw: &[u8]) -> Result<(), SanitizeError> {
        let raw = String::from_utf8_lossy(raw);
        match self
            .external
            .iter()
            .find(|name| raw.contains(&format!("&{};", name)))
        {
            Some(name) => Err(SanitizeError::ExternalEntity(name.clone())),
            None => Ok(()),
        }
    }
}

/// Strips executable content from SVG markup
pub trait SvgSanitizer: Send + Sync {
    fn sanitize(&self, markup: &str) -> Result<String, SanitizeError>;
}

/// Streaming sanitizer built on quick-xml.
///
/// Removes `script`, `foreignObject`, `iframe`, `embed` and `object`
/// elements, every `on*` event-handler attribute, any attribute whose value is
/// a `javascript:` URL, and `href`/`xlink:href` values that point outside the
/// document (anything but `#fragment` or an inline `data:image/` URI).
/// Comments, processing instructions and DOCTYPE declarations are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlSanitizer;

impl QuickXmlSanitizer {
    fn is_blocked_element(local_name: &[u8]) -> bool {
        let name = String::from_utf8_lossy(local_name).to_ascii_lowercase();
        BLOCKED_ELEMENTS.contains(&name.as_str())
    }

    fn is_script_url(value: &str) -> bool {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.starts_with("javascript:") || compact.starts_with("vbscript:")
    }

    fn is_local_reference(value: &str) -> bool {
        let value = value.trim();
        value.starts_with('#') || value.to_ascii_lowercase().starts_with("data:image/")
    }

    /// Rebuild a start tag keeping only safe attributes.
    fn clean_start(
        start: &BytesStart<'_>,
        entities: &DeclaredEntities,
    ) -> Result<BytesStart<'static>, SanitizeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut cleaned = BytesStart::new(name);

        for attr in start.attributes() {
            let attr = attr.map_err(|e| SanitizeError::Parse(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let local = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
            entities.check_external(&attr.value)?;
            let value = attr
                .unescape_value_with(|name| entities.resolve(name))
                .map_err(|e| SanitizeError::Parse(e.to_string()))?;

            if local.starts_with("on") {
                tracing::debug!(attribute = %key, "Dropping event handler attribute");
                continue;
            }
            if Self::is_script_url(&value) {
                tracing::debug!(attribute = %key, "Dropping script URL attribute");
                continue;
            }
            if local == "href" && !Self::is_local_reference(&value) {
                tracing::debug!(attribute = %key, "Dropping external reference");
                continue;
            }

            cleaned.push_attribute((key.as_str(), value.as_ref()));
        }

        Ok(cleaned)
    }
}

impl SvgSanitizer for QuickXmlSanitizer {
    fn sanitize(&self, markup: &str) -> Result<String, SanitizeError> {
        let markup = markup.trim_start_matches('\u{feff}');
        let mut reader = Reader::from_str(markup);
        let mut writer = Writer::new(Vec::with_capacity(markup.len()));

        let mut skip_depth = 0usize;
        let mut saw_svg = false;
        let mut entities = DeclaredEntities::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| SanitizeError::Parse(e.to_string()))?;

            if skip_depth > 0 {
                match event {
                    Event::Start(_) => skip_depth += 1,
                    Event::End(_) => skip_depth -= 1,
                    Event::Eof => {
                        return Err(SanitizeError::Parse("Unexpected end of document".into()))
                    }
                    _ => {}
                }
                continue;
            }

            let output = match event {
                Event::Start(start) => {
                    if Self::is_blocked_element(start.local_name().as_ref()) {
                        skip_depth = 1;
                        continue;
                    }
                    saw_svg |= start.local_name().as_ref().eq_ignore_ascii_case(b"svg");
                    Event::Start(Self::clean_start(&start, &entities)?)
                }
                Event::Empty(start) => {
                    if Self::is_blocked_element(start.local_name().as_ref()) {
                        continue;
                    }
                    saw_svg |= start.local_name().as_ref().eq_ignore_ascii_case(b"svg");
                    Event::Empty(Self::clean_start(&start, &entities)?)
                }
                Event::Text(text) => {
                    entities.check_external(&text)?;
                    let expanded = text
                        .unescape_with(|name| entities.resolve(name))
                        .map_err(|e| SanitizeError::Parse(e.to_string()))?;
                    Event::Text(BytesText::new(&expanded).into_owned())
                }
                Event::DocType(doctype) => {
                    entities = DeclaredEntities::parse(&String::from_utf8_lossy(&doctype));
                    continue;
                }
                Event::Comment(_) | Event::PI(_) => continue,
                Event::Eof => break,
                other => other,
            };

            writer
                .write_event(output)
                .map_err(|e| SanitizeError::Write(e.to_string()))?;
        }

        if !saw_svg {
            return Err(SanitizeError::NotSvg);
        }

        String::from_utf8(writer.into_inner()).map_err(|e| SanitizeError::Write(e.to_string()))
    }
}

/// Produce an inline `data:image/svg+xml` encoding of an SVG file.
///
/// Without a sanitizer the markup is inlined unchanged and a warning is
/// logged.
pub fn encode_svg(
    bytes: &[u8],
    name: &str,
    sanitizer: Option<&dyn SvgSanitizer>,
) -> Result<EncodedImage, IngestError> {
    let markup = std::str::from_utf8(bytes)
        .map_err(|e| IngestError::Encoding(format!("SVG is not valid UTF-8: {}", e)))?;

    let markup = match sanitizer {
        Some(sanitizer) => {
            let cleaned = sanitizer
                .sanitize(markup)
                .map_err(|e| IngestError::Encoding(e.to_string()))?;
            tracing::debug!(
                original_bytes = markup.len(),
                sanitized_bytes = cleaned.len(),
                "SVG sanitized"
            );
            cleaned
        }
        None => {
            tracing::warn!(
                file_name = %name,
                "SVG sanitizer unavailable, inlining unsanitized markup"
            );
            markup.to_string()
        }
    };

    Ok(EncodedImage::new(
        DataUrl::encode(ImageKind::Svg.mime(), markup.as_bytes()),
        name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(markup: &str) -> String {
        QuickXmlSanitizer.sanitize(markup).unwrap()
    }

    #[test]
    fn test_removes_script_elements() {
        let out = sanitize(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script><circle r="4"/></svg>"#,
        );
        assert!(!out.to_lowercase().contains("script"));
        assert!(!out.contains("alert"));
        assert!(out.contains("<circle r=\"4\"/>"));
    }

    #[test]
    fn test_removes_nested_blocked_subtree() {
        let out = sanitize(
            r#"<svg><foreignObject><div><iframe src="https://evil"></iframe></div></foreignObject><g id="a"/></svg>"#,
        );
        assert!(!out.contains("foreignObject"));
        assert!(!out.contains("iframe"));
        assert!(out.contains(r#"<g id="a"/>"#));
    }

    #[test]
    fn test_removes_event_handlers() {
        let out = sanitize(r#"<svg onload="alert(1)"><rect ONCLICK="x()" width="2"/></svg>"#);
        assert!(!out.to_lowercase().contains("onload"));
        assert!(!out.to_lowercase().contains("onclick"));
        assert!(out.contains(r#"width="2""#));
    }

    #[test]
    fn test_filters_href_values() {
        let out = sanitize(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><a href=" JavaScript:alert(1)"><use xlink:href="#icon"/></a><image href="https://tracker.example/p.png"/><image href="data:image/png;base64,AAAA"/></svg>"##,
        );
        assert!(!out.to_lowercase().contains("javascript"));
        assert!(!out.contains("tracker.example"));
        assert!(out.contains(r##"xlink:href="#icon""##));
        assert!(out.contains("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_drops_script_urls_in_animation_values() {
        let out = sanitize(r#"<svg><a><set attributeName="href" to="javascript:alert(1)"/></a></svg>"#);
        assert!(!out.contains("javascript"));
    }

    #[test]
    fn test_keeps_text_and_declaration() {
        let out = sanitize(
            r#"<?xml version="1.0" encoding="UTF-8"?><svg><text x="1">Diesel &amp; Petrol</text></svg>"#,
        );
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("Diesel &amp; Petrol"));
    }

    #[test]
    fn test_expands_internal_entities() {
        let out = sanitize(concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" ["#,
            r#"<!ENTITY ns_svg "http://www.w3.org/2000/svg">"#,
            r#"<!ENTITY ns_xlink 'http://www.w3.org/1999/xlink'>"#,
            r#"<!ENTITY % local.param "ignored">"#,
            r#"]>"#,
            r#"<svg xmlns="&ns_svg;" xmlns:xlink="&ns_xlink;"><text>&ns_svg; &#169;</text></svg>"#,
        ));
        assert!(!out.contains("DOCTYPE"));
        assert!(!out.contains("&ns_"));
        assert!(out.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        assert!(out.contains("<text>http://www.w3.org/2000/svg \u{a9}</text>"));
    }

    #[test]
    fn test_expanded_entities_are_still_filtered() {
        let out = sanitize(
            r#"<!DOCTYPE svg [<!ENTITY js "javascript:alert(1)">]><svg><a href="&js;"><rect/></a></svg>"#,
        );
        assert!(!out.contains("javascript"));
        assert!(out.contains("<rect/>"));
    }

    #[test]
    fn test_rejects_external_entities() {
        let result = QuickXmlSanitizer.sanitize(
            r#"<!DOCTYPE svg [<!ENTITY logo SYSTEM "file:///etc/passwd">]><svg><text>&logo;</text></svg>"#,
        );
        assert!(matches!(result, Err(SanitizeError::ExternalEntity(ref name)) if name == "logo"));
    }

    #[test]
    fn test_rejects_malformed_markup() {
        assert!(matches!(
            QuickXmlSanitizer.sanitize("<svg><g></svg>"),
            Err(SanitizeError::Parse(_))
        ));
        assert!(matches!(
            QuickXmlSanitizer.sanitize("<html><body/></html>"),
            Err(SanitizeError::NotSvg)
        ));
    }

    #[test]
    fn test_encode_svg_with_sanitizer() {
        let svg = br#"<svg><script>alert(1)</script></svg>"#;
        let image = encode_svg(svg, "logo.svg", Some(&QuickXmlSanitizer)).unwrap();
        assert_eq!(image.title, "logo.svg");
        let decoded = DataUrl::parse(&image.src).unwrap();
        assert_eq!(decoded.mime, "image/svg+xml");
        assert!(!String::from_utf8(decoded.bytes).unwrap().contains("script"));
    }

    #[test]
    fn test_encode_svg_without_sanitizer_keeps_markup() {
        let svg = br#"<svg><script>alert(1)</script></svg>"#;
        let image = encode_svg(svg, "logo.svg", None).unwrap();
        let decoded = DataUrl::parse(&image.src).unwrap();
        assert_eq!(decoded.bytes, svg.to_vec());
    }

    #[test]
    fn test_encode_svg_rejects_invalid_utf8() {
        let result = encode_svg(&[0x3c, 0xff, 0xfe], "bad.svg", None);
        assert!(matches!(result, Err(IngestError::Encoding(_))));
    }
}
