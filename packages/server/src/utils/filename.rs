//! Response header values derived from a file's display name.

/// `attr-char` from RFC 5987; everything else is percent-encoded in
/// `filename*`.
fn is_attr_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b)
}

/// Quoted `filename` for clients without RFC 5987 support. Non-ASCII and
/// header-breaking characters are dropped; a name left without a readable
/// stem becomes `download`, keeping its extension.
fn ascii_fallback(filename: &str) -> String {
    let kept: String = filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let kept = kept.trim();

    let (stem, extension) = match kept.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (kept, None),
    };
    if stem.chars().any(|c| c.is_ascii_alphanumeric()) {
        return kept.to_string();
    }
    match extension {
        Some(ext) => format!("download.{ext}"),
        None => "download".to_string(),
    }
}

/// `Content-Disposition` value asking the browser to save the body under the
/// display name.
pub fn content_disposition_value(filename: &str) -> String {
    let mut encoded = String::with_capacity(filename.len());
    for b in filename.bytes() {
        if is_attr_char(b) {
            encoded.push(char::from(b));
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{encoded}",
        ascii_fallback(filename)
    )
}

/// MIME type guessed from the display name's extension.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
