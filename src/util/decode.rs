use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decode a fetched feed body to text. The `Content-Type` charset parameter
/// wins when it names a known encoding; otherwise the bytes are sniffed.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let labelled = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let encoding = labelled.unwrap_or_else(|| {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    });

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}
