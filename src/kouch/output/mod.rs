//! # Output Rendering
//!
//! Response bodies are written into a [`Sink`] chosen by name from an
//! [`OutputRegistry`]:
//!
//! | Mode       | Behavior                                                    |
//! |------------|-------------------------------------------------------------|
//! | `raw`      | bytes are passed through untouched                          |
//! | `json`     | re-encoded JSON with sorted keys, prefix/indent/HTML escape |
//! | `yaml`     | the decoded document as YAML                                |
//! | `template` | a user template evaluated against the decoded document      |
//!
//! Every mode except `raw` is built on [`stream::TransformSink`]. Callers
//! must always end with [`Sink::finish`]; only then are errors from the
//! background transform reported.
//!
//! Requests made with `--head` skip sinks entirely and print headers through
//! [`head::write_headers`].

use crate::error::{KouchError, Result};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub mod head;
pub mod json;
pub mod raw;
pub mod stream;
pub mod template;
pub mod yaml;

/// Where rendered output ends up. Owned by exactly one sink.
pub type Destination = Box<dyn Write + Send>;

/// A writer that must be finalized.
pub trait Sink: Write + Send {
    /// Ends the input and waits for rendering to complete.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Settings shared by the output modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFlags {
    pub json_prefix: String,
    pub json_indent: String,
    pub json_escape_html: bool,
    pub template: Option<String>,
    pub template_file: Option<PathBuf>,
}

/// A named rendering strategy.
pub trait OutputMode: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Creates a sink writing to `dest`. Configuration problems, such as a
    /// template that does not parse, are reported here rather than after the
    /// request has been made.
    fn new_sink(&self, flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>>;
}

/// The table of available output modes.
pub struct OutputRegistry {
    modes: BTreeMap<&'static str, Box<dyn OutputMode>>,
}

pub const DEFAULT_MODE: &str = "json";

impl Default for OutputRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl OutputRegistry {
    pub fn empty() -> Self {
        Self {
            modes: BTreeMap::new(),
        }
    }

    /// The built-in modes: raw, json, yaml and template.
    pub fn standard() -> Self {
        Self::empty()
            .register(raw::RawMode)
            .register(json::JsonMode)
            .register(yaml::YamlMode)
            .register(template::TemplateMode)
    }

    /// Registers a mode, replacing any mode of the same name.
    pub fn register<M: OutputMode + 'static>(mut self, mode: M) -> Self {
        self.modes.insert(mode.name(), Box::new(mode));
        self
    }

    pub fn select(&self, name: &str) -> Result<&dyn OutputMode> {
        self.modes
            .get(name)
            .map(|m| m.as_ref())
            .ok_or_else(|| KouchError::UnknownOutputFormat(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modes.keys().copied().collect()
    }
}

/// Opens the output destination: the named file, or stdout.
///
/// An existing file is only replaced when `clobber` is set.
pub fn open_destination(path: Option<&Path>, clobber: bool) -> Result<Destination> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout()));
    };
    let mut options = OpenOptions::new();
    options.write(true);
    if clobber {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    match options.open(path) {
        Ok(file) => Ok(Box::new(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(KouchError::Output(format!(
            "{} already exists, use --clobber to overwrite",
            path.display()
        ))),
        Err(e) => Err(KouchError::Write(e)),
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// A cloneable in-memory destination for inspecting sink output.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contents(&self) -> Vec<u8> {
            self.0.lock().map(|b| b.clone()).unwrap_or_default()
        }

        pub fn contents_str(&self) -> String {
            String::from_utf8_lossy(&self.contents()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut inner = self
                .0
                .lock()
                .map_err(|_| io::Error::other("buffer lock poisoned"))?;
            inner.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// A destination on a full disk: every write fails with `ENOSPC`.
    pub struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(28))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::SharedBuffer;
    use super::*;

    fn render(mode: &str, flags: &OutputFlags, input: &[u8]) -> Result<String> {
        let buffer = SharedBuffer::new();
        let registry = OutputRegistry::standard();
        let mut sink = registry
            .select(mode)?
            .new_sink(flags, Box::new(buffer.clone()))?;
        sink.write_all(input)?;
        sink.finish()?;
        Ok(buffer.contents_str())
    }

    #[test]
    fn test_standard_modes() {
        assert_eq!(
            OutputRegistry::standard().names(),
            vec!["json", "raw", "template", "yaml"]
        );
        assert!(OutputRegistry::standard().select(DEFAULT_MODE).is_ok());
    }

    #[test]
    fn test_unknown_mode() {
        match OutputRegistry::standard().select("xml") {
            Err(KouchError::UnknownOutputFormat(name)) => assert_eq!(name, "xml"),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("xml should not be registered"),
        }
    }

    #[test]
    fn test_json_sorts_keys() {
        let out = render("json", &OutputFlags::default(), br#"{"foo":"bar","baz":123}"#).unwrap();
        assert_eq!(out, "{\"baz\":123,\"foo\":\"bar\"}\n");
    }

    #[test]
    fn test_invalid_json_writes_nothing() {
        for mode in ["json", "yaml"] {
            let buffer = SharedBuffer::new();
            let registry = OutputRegistry::standard();
            let mut sink = registry
                .select(mode)
                .unwrap()
                .new_sink(&OutputFlags::default(), Box::new(buffer.clone()))
                .unwrap();
            sink.write_all(b"oink").unwrap();
            assert!(matches!(sink.finish(), Err(KouchError::MalformedInput { .. })));
            assert!(buffer.contents().is_empty(), "{} wrote output", mode);
        }
    }

    #[test]
    fn test_raw_passes_bytes_through() {
        let out = render("raw", &OutputFlags::default(), b"oink {\"b\":1,\"a\":2}").unwrap();
        assert_eq!(out, "oink {\"b\":1,\"a\":2}");
    }

    #[test]
    fn test_yaml_mode() {
        let out = render("yaml", &OutputFlags::default(), br#"{"foo":"bar","baz":[1,2]}"#).unwrap();
        assert_eq!(out, "baz:\n- 1\n- 2\nfoo: bar\n");
    }

    #[test]
    fn test_template_mode() {
        let flags = OutputFlags {
            template: Some("{{ _id }} is at {{ _rev }}".to_string()),
            ..OutputFlags::default()
        };
        let out = render("template", &flags, br#"{"_id":"foo","_rev":"1-abc"}"#).unwrap();
        assert_eq!(out, "foo is at 1-abc");
    }

    #[test]
    fn test_registry_accepts_custom_modes() {
        struct Shout;
        impl OutputMode for Shout {
            fn name(&self) -> &'static str {
                "json"
            }
            fn description(&self) -> &'static str {
                "replacement"
            }
            fn new_sink(&self, _flags: &OutputFlags, dest: Destination) -> Result<Box<dyn Sink>> {
                Ok(Box::new(raw::RawSink::new(dest)))
            }
        }
        let registry = OutputRegistry::standard().register(Shout);
        assert_eq!(registry.select("json").unwrap().description(), "replacement");
    }

    #[test]
    fn test_failed_destination_is_write_error() {
        use super::fixtures::FullDisk;
        for mode in ["json", "yaml", "raw"] {
            let registry = OutputRegistry::standard();
            let mut sink = registry
                .select(mode)
                .unwrap()
                .new_sink(&OutputFlags::default(), Box::new(FullDisk))
                .unwrap();
            let written = sink.write_all(br#"{"a":1}"#);
            let err = sink.finish().err().or(written.err().map(KouchError::Write));
            match err {
                Some(e) => assert_eq!(e.exit_status().code(), 23, "{}: {:?}", mode, e),
                None => panic!("{} reported no error", mode),
            }
        }
    }

    #[test]
    fn test_destination_refuses_to_clobber() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.json");
        std::fs::write(&path, "old").unwrap();

        assert!(matches!(
            open_destination(Some(&path), false),
            Err(KouchError::Output(_))
        ));

        let mut dest = open_destination(Some(&path), true).unwrap();
        dest.write_all(b"new").unwrap();
        drop(dest);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_destination_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fresh.json");
        let mut dest = open_destination(Some(&path), false).unwrap();
        dest.write_all(b"{}").unwrap();
        drop(dest);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
