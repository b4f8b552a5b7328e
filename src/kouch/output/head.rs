use crate::error::{KouchError, Result};
use std::io::Write;

/// Canonical MIME form of a header name: `content-type` → `Content-Type`.
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Writes `Key: Value\r\n` lines sorted by name. Repeated headers keep their
/// received order.
pub fn write_headers(headers: &[(String, String)], out: &mut dyn Write) -> Result<()> {
    let mut lines: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (canonical_name(name), value.as_str()))
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    let mut text = String::new();
    for (name, value) in lines {
        text.push_str(&name);
        text.push_str(": ");
        text.push_str(value);
        text.push_str("\r\n");
    }
    out.write_all(text.as_bytes()).map_err(KouchError::Write)?;
    out.flush().map_err(KouchError::Write)
}
