//! Minimal server-rendered pages for the public link endpoints.

use crate::resolver::ResolvedReference;

/// Escape text for HTML element content and quoted attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         {head_extra}<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        html_escape(title)
    )
}

/// Page for a resolved identifier. With `delay_seconds > 0` the download
/// link is held back and the browser is redirected once the wait is over.
pub fn file_page(reference: &ResolvedReference, delay_seconds: u64) -> String {
    let name = html_escape(&reference.display_name);
    let download = format!("/download?id={}", reference.identifier);

    let (head_extra, action) = if delay_seconds > 0 {
        (
            format!("<meta http-equiv=\"refresh\" content=\"{delay_seconds};url={download}\">\n"),
            format!(
                "<p class=\"wait\">Please wait {delay_seconds} seconds, your download will start automatically.</p>"
            ),
        )
    } else {
        (
            String::new(),
            format!("<p><a class=\"download\" href=\"{download}\">Download</a></p>"),
        )
    };

    let body = format!(
        "<h1>{name}</h1>\n<p>Size: {}</p>\n<p>Uploaded: {}</p>\n{action}",
        html_escape(&reference.human_size),
        reference.created_at.format("%Y-%m-%d %H:%M UTC"),
    );
    layout(&reference.display_name, &head_extra, &body)
}

pub fn not_found_page() -> String {
    layout(
        "File not found",
        "",
        "<h1>File not found</h1>\n<p>This link does not exist or has expired.</p>",
    )
}

pub fn error_page() -> String {
    layout(
        "Temporarily unavailable",
        "",
        "<h1>Something went wrong</h1>\n<p>Please try again in a moment.</p>",
    )
}
