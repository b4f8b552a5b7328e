use super::json::sorted;
use super::stream::{Format, TransformSink};
use super::{Destination, OutputFlags, OutputMode, Sink};
use crate::error::{KouchError, Result};
use serde_json::Value;
use std::io::Write;

pub struct YamlMode;

impl OutputMode for YamlMode {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn description(&self) -> &'static str {
        "the response converted to YAML"
    }

    fn new_sink(&self, _flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>> {
        Ok(Box::new(TransformSink::new(YamlFormat, dest)))
    }
}

pub struct YamlFormat;

impl Format for YamlFormat {
    fn format(&self, value: &Value, out: &mut dyn Write) -> Result<()> {
        let text =
            serde_yaml::to_string(&sorted(value)).map_err(|e| KouchError::Output(e.to_string()))?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: Value) -> String {
        let mut out = Vec::new();
        YamlFormat.format(&value, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_document() {
        assert_eq!(
            render(json!({"_id": "foo", "count": 2, "tags": ["a"]})),
            "_id: foo\ncount: 2\ntags:\n- a\n"
        );
    }

    #[test]
    fn test_scalar() {
        assert_eq!(render(json!(true)), "true\n");
    }
}
