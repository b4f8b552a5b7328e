//! User-supplied templates, rendered with minijinja.
//!
//! The decoded response is the template context: an object's keys are
//! available directly (`{{ _id }}`), and `this` always names the whole value,
//! which is how arrays and scalars are reached. A key literally named `this`
//! in the response shadows it.

use super::stream::{Format, TransformSink};
use super::{Destination, OutputFlags, OutputMode, Sink};
use crate::error::{KouchError, Result};
use minijinja::Environment;
use serde_json::{Map, Value};
use std::io::Write;

const TEMPLATE_NAME: &str = "output";

pub struct TemplateMode;

impl OutputMode for TemplateMode {
    fn name(&self) -> &'static str {
        "template"
    }

    fn description(&self) -> &'static str {
        "the response rendered through --template or --template-file"
    }

    fn new_sink(&self, flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>> {
        let source = template_source(flags)?;
        let format = TemplateFormat::new(source)?;
        Ok(Box::new(TransformSink::new(format, dest)))
    }
}

fn template_source(flags: &OutputFlags) -> Result<String> {
    match (&flags.template, &flags.template_file) {
        (Some(_), Some(_)) => Err(KouchError::ConflictingFlags("--template", "--template-file")),
        (Some(source), None) => Ok(source.clone()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| KouchError::InvalidFlag {
            flag: "template-file".to_string(),
            message: format!("{}: {}", path.display(), e),
        }),
        (None, None) => Err(KouchError::Template(
            "no template given, use --template or --template-file".to_string(),
        )),
    }
}

pub struct TemplateFormat {
    env: Environment<'static>,
}

impl TemplateFormat {
    /// Compiles `source`, failing on syntax errors.
    pub fn new(source: String) -> Result<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    pub fn render(&self, value: &Value) -> Result<String> {
        let mut context = match value {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        context
            .entry("this".to_string())
            .or_insert_with(|| value.clone());

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let rendered = template.render(minijinja::Value::from_serialize(&context))?;
        Ok(rendered)
    }
}

impl Format for TemplateFormat {
    fn format(&self, value: &Value, out: &mut dyn Write) -> Result<()> {
        let text = self.render(value)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}
