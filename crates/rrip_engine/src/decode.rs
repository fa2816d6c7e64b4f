use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use engine_logging::engine_trace;

use crate::FetchOutput;

/// A scraped page whose bytes are not valid in the encoding it was read as.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url} is not valid {encoding}")]
pub struct DecodeError {
    pub url: String,
    pub encoding: &'static str,
}

/// Where a page's encoding was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    ByteOrderMark,
    ContentType,
    Sniffed,
}

/// Pick the encoding of `bytes`: BOM first, then the `charset` parameter,
/// then a chardetng guess.
pub fn page_encoding(
    bytes: &[u8],
    content_type: Option<&str>,
) -> (&'static Encoding, EncodingSource) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, EncodingSource::ByteOrderMark);
    }
    if let Some(encoding) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return (encoding, EncodingSource::ContentType);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), EncodingSource::Sniffed)
}

/// Text of a fetched page, ready for the `og:` scan.
pub fn decode_page(page: &FetchOutput) -> Result<String, DecodeError> {
    let (encoding, source) = page_encoding(&page.bytes, page.metadata.content_type.as_deref());
    engine_trace!("{} read as {} ({source:?})", page.metadata.final_url, encoding.name());
    let (text, malformed) = encoding.decode_with_bom_removal(&page.bytes);
    if malformed {
        return Err(DecodeError {
            url: page.metadata.final_url.clone(),
            encoding: encoding.name(),
        });
    }
    Ok(text.into_owned())
}

/// Resolve HTML character references (`&amp;`, `&#39;`, ...) in listing text.
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchMetadata;

    fn page(bytes: &[u8], content_type: &str) -> FetchOutput {
        FetchOutput {
            bytes: bytes.to_vec(),
            metadata: FetchMetadata {
                original_url: "https://gfycat.com/a".into(),
                final_url: "https://gfycat.com/a".into(),
                content_type: Some(content_type.into()),
                byte_len: bytes.len() as u64,
            },
        }
    }

    #[test]
    fn charset_from_content_type_wins_over_detection() {
        let bytes = b"<html><head><title>caf\xe9</title></head></html>";
        let (encoding, source) = page_encoding(bytes, Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(encoding.name(), "windows-1252");
        assert_eq!(source, EncodingSource::ContentType);

        let text = decode_page(&page(bytes, "text/html; charset=iso-8859-1")).unwrap();
        assert!(text.contains("café"));
    }

    #[test]
    fn bom_wins_over_header() {
        let bytes = b"\xEF\xBB\xBF<p>ok</p>";
        let (encoding, source) = page_encoding(bytes, Some("text/html; charset=iso-8859-1"));
        assert_eq!(encoding.name(), "UTF-8");
        assert_eq!(source, EncodingSource::ByteOrderMark);
        assert_eq!(decode_page(&page(bytes, "text/html")).unwrap(), "<p>ok</p>");
    }

    #[test]
    fn malformed_utf8_is_an_error() {
        let err = decode_page(&page(b"<p>\xff\xfe\xfd</p>", "text/html; charset=utf-8"))
            .unwrap_err();
        assert_eq!(err.encoding, "UTF-8");
    }

    #[test]
    fn unescapes_entities() {
        assert_eq!(unescape_html("Tom &amp; Jerry &#39;99"), "Tom & Jerry '99");
        assert_eq!(
            unescape_html("https://preview.redd.it/a.jpg?w=1&amp;s=2"),
            "https://preview.redd.it/a.jpg?w=1&s=2"
        );
        assert_eq!(unescape_html("plain <3"), "plain <3");
    }

    #[test]
    fn markup_like_text_survives_unescaping() {
        assert_eq!(unescape_html("x<y &amp; z"), "x<y & z");
        assert_eq!(
            unescape_html("<b>bold</b> &lt;tag&gt; &quot;q&quot;"),
            "<b>bold</b> <tag> \"q\""
        );
    }
}
