mod macros;
mod path_ext;

pub use path_ext::*;
pub use macros::*;

/// Escapes `&`, `<`, `>`, `"` and `'` for safe inclusion in XML or HTML text
/// and attribute values.
pub fn escape_xml(input: &str) -> std::borrow::Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return input.into();
    }

    let mut output = String::with_capacity(input.len() + 16);
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(ch),
        }
    }

    output.into()
}
