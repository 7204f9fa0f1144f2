//! HTML escaping for forwarded field values.

/// Escape the five HTML-significant characters.
///
/// `&` becomes `&amp;`, `<` and `>` become `&lt;` and `&gt;`, `"` becomes
/// `&quot;` and `'` becomes `&#039;`. Everything else is copied unchanged.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
