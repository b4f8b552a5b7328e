use super::Request;
use crate::error::{KouchError, Result};
use crate::options::{build, Body, Flag};
use crate::target::{Field, Target};
use crate::transport::{Method, Transport};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataFormat {
    #[default]
    Json,
    Yaml,
}

/// Where a request body comes from. A `data_file` of `-` means stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataArgs {
    pub data: Option<String>,
    pub data_file: Option<PathBuf>,
    pub format: DataFormat,
}

impl DataArgs {
    /// Reads the body bytes, pulling from `stdin` when asked to.
    pub fn read(&self, stdin: &mut dyn Read) -> Result<Vec<u8>> {
        match (&self.data, &self.data_file) {
            (Some(_), Some(_)) => Err(KouchError::ConflictingFlags("--data", "--data-file")),
            (Some(data), None) => Ok(data.clone().into_bytes()),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut buf = Vec::new();
                stdin.read_to_end(&mut buf)?;
                Ok(buf)
            }
            (None, Some(path)) => std::fs::read(path).map_err(|e| KouchError::InvalidFlag {
                flag: "data-file".to_string(),
                message: format!("{}: {}", path.display(), e),
            }),
            (None, None) => Err(KouchError::InvalidFlag {
                flag: "data".to_string(),
                message: "no data provided, use --data or --data-file".to_string(),
            }),
        }
    }

    /// Reads the body as a JSON document, converting from YAML if needed.
    pub fn read_json(&self, stdin: &mut dyn Read) -> Result<Vec<u8>> {
        let raw = self.read(stdin)?;
        let value: serde_json::Value = match self.format {
            DataFormat::Json => serde_json::from_slice(&raw).map_err(|e| invalid_data(&e))?,
            DataFormat::Yaml => serde_yaml::from_slice(&raw).map_err(|e| invalid_data(&e))?,
        };
        serde_json::to_vec(&value).map_err(|e| invalid_data(&e))
    }
}

fn invalid_data(e: &dyn std::fmt::Display) -> KouchError {
    KouchError::InvalidFlag {
        flag: "data".to_string(),
        message: e.to_string(),
    }
}

/// Flags of `put doc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocArgs {
    pub batch: bool,
    pub new_edits: bool,
    pub rev: Option<String>,
    pub auto_rev: bool,
}

impl Default for DocArgs {
    fn default() -> Self {
        Self {
            batch: false,
            new_edits: true,
            rev: None,
            auto_rev: false,
        }
    }
}

/// Flags of `put att`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttArgs {
    pub content_type: String,
    pub rev: Option<String>,
    pub auto_rev: bool,
}

pub const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

impl Default for AttArgs {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_ATTACHMENT_TYPE.to_string(),
            rev: None,
            auto_rev: false,
        }
    }
}

/// `PUT /{db}/{id}` with a JSON body.
pub fn document(
    target: Target,
    body: Vec<u8>,
    args: &DocArgs,
    transport: &dyn Transport,
) -> Result<Request> {
    let flags = [
        Flag::string("batch", args.batch.then_some("ok")),
        Flag::bool("new-edits", args.new_edits, true),
        Flag::Rev(args.rev.as_deref()),
        Flag::AutoRev(args.auto_rev),
    ];
    let options = build(target, &flags, transport)?.with_body(Body::json(body));
    options.validate(&[Field::Root, Field::Database, Field::Document])?;
    let path = options.document_path()?;
    Ok(Request::new(Method::Put, path, options))
}

/// `PUT /{db}/{id}/{filename}` with the attachment content.
pub fn attachment(
    target: Target,
    body: Vec<u8>,
    args: &AttArgs,
    transport: &dyn Transport,
) -> Result<Request> {
    let flags = [Flag::Rev(args.rev.as_deref()), Flag::AutoRev(args.auto_rev)];
    let content_type = if args.content_type.is_empty() {
        DEFAULT_ATTACHMENT_TYPE.to_string()
    } else {
        args.content_type.clone()
    };
    let options = build(target, &flags, transport)?.with_body(Body {
        data: body,
        content_type,
    });
    options.validate(&[Field::Root, Field::Database, Field::Document, Field::Filename])?;
    let path = options.attachment_path()?;
    Ok(Request::new(Method::Put, path, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;
    use std::io::Cursor;

    fn target(file: Option<&str>) -> Target {
        Target {
            root: Some("http://localhost:5984".into()),
            database: Some("db".into()),
            document: Some("doc".into()),
            filename: file.map(Into::into),
            ..Target::default()
        }
    }

    fn no_stdin() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    #[test]
    fn test_inline_data() {
        let args = DataArgs {
            data: Some(r#"{"a": 1}"#.into()),
            ..DataArgs::default()
        };
        assert_eq!(args.read_json(&mut no_stdin()).unwrap(), br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn test_yaml_data_becomes_json() {
        let args = DataArgs {
            data: Some("foo: bar\nn: 2\n".into()),
            format: DataFormat::Yaml,
            ..DataArgs::default()
        };
        let body = args.read_json(&mut no_stdin()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"foo": "bar", "n": 2}));
    }

    #[test]
    fn test_stdin_data() {
        let args = DataArgs {
            data_file: Some(PathBuf::from("-")),
            ..DataArgs::default()
        };
        let mut stdin = Cursor::new(b"{\"from\":\"stdin\"}".to_vec());
        assert_eq!(args.read(&mut stdin).unwrap(), b"{\"from\":\"stdin\"}".to_vec());
    }

    #[test]
    fn test_data_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("doc.json");
        std::fs::write(&path, "{}").unwrap();
        let args = DataArgs {
            data_file: Some(path),
            ..DataArgs::default()
        };
        assert_eq!(args.read(&mut no_stdin()).unwrap(), b"{}".to_vec());
    }

    #[test]
    fn test_data_sources_conflict() {
        let args = DataArgs {
            data: Some("{}".into()),
            data_file: Some(PathBuf::from("x.json")),
            ..DataArgs::default()
        };
        assert!(matches!(
            args.read(&mut no_stdin()),
            Err(KouchError::ConflictingFlags("--data", "--data-file"))
        ));
    }

    #[test]
    fn test_invalid_json_data() {
        let args = DataArgs {
            data: Some("oink".into()),
            ..DataArgs::default()
        };
        assert!(matches!(
            args.read_json(&mut no_stdin()),
            Err(KouchError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn test_put_doc() {
        let args = DocArgs {
            batch: true,
            new_edits: false,
            ..DocArgs::default()
        };
        let req = document(target(None), b"{}".to_vec(), &args, &MemoryTransport::new()).unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/db/doc");
        assert_eq!(req.options.query.get("batch"), Some("ok"));
        assert_eq!(req.options.query.get("new_edits"), Some("false"));
        let body = req.options.body.unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.data, b"{}".to_vec());
    }

    #[test]
    fn test_put_doc_defaults() {
        let req = document(
            target(None),
            b"{}".to_vec(),
            &DocArgs::default(),
            &MemoryTransport::new(),
        )
        .unwrap();
        assert!(req.options.query.is_empty());
    }

    #[test]
    fn test_put_doc_auto_rev() {
        let transport = MemoryTransport::new().with_response(
            Method::Head,
            "/db/doc",
            200,
            &[("ETag", "\"4-beef\"")],
            b"",
        );
        let args = DocArgs {
            auto_rev: true,
            ..DocArgs::default()
        };
        let req = document(target(None), b"{}".to_vec(), &args, &transport).unwrap();
        assert_eq!(req.options.query.get("rev"), Some("4-beef"));
    }

    #[test]
    fn test_put_attachment() {
        let args = AttArgs {
            rev: Some("1-a".into()),
            ..AttArgs::default()
        };
        let req = attachment(
            target(Some("foo.txt")),
            b"hello".to_vec(),
            &args,
            &MemoryTransport::new(),
        )
        .unwrap();
        assert_eq!(req.path, "/db/doc/foo.txt");
        assert_eq!(req.options.query.get("rev"), Some("1-a"));
        assert_eq!(
            req.options.body.unwrap().content_type,
            "application/octet-stream"
        );
    }
}
