use super::stream::{Format, TransformSink};
use super::{Destination, OutputFlags, OutputMode, Sink};
use crate::error::{KouchError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

pub struct JsonMode;

impl OutputMode for JsonMode {
    fn name(&self) -> &'static str {
        "json"
    }

    fn description(&self) -> &'static str {
        "re-encoded JSON with sorted keys"
    }

    fn new_sink(&self, flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>> {
        let format = JsonFormat {
            prefix: flags.json_prefix.clone(),
            indent: flags.json_indent.clone(),
            escape_html: flags.json_escape_html,
        };
        Ok(Box::new(TransformSink::new(format, dest)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonFormat {
    /// Written at the start of every line after the first.
    pub prefix: String,
    /// One level of indentation. Output is compact when this and the prefix
    /// are both empty.
    pub indent: String,
    pub escape_html: bool,
}

impl JsonFormat {
    pub fn render(&self, value: &Value) -> Result<String> {
        let value = sorted(value);
        let mut text = if self.prefix.is_empty() && self.indent.is_empty() {
            serde_json::to_string(&value)?
        } else {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser)?;
            String::from_utf8(buf).map_err(|e| KouchError::Output(e.to_string()))?
        };

        // Serialized JSON has `<`, `>` and `&` only inside string literals
        // and raw newlines only between tokens.
        if self.escape_html {
            text = text
                .replace('<', "\\u003c")
                .replace('>', "\\u003e")
                .replace('&', "\\u0026");
        }
        if !self.prefix.is_empty() {
            text = text.replace('\n', &format!("\n{}", self.prefix));
        }
        text.push('\n');
        Ok(text)
    }
}

impl Format for JsonFormat {
    fn format(&self, value: &Value, out: &mut dyn Write) -> Result<()> {
        let text = self.render(value)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Rebuilds objects with their keys in lexicographic order.
pub(crate) fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
