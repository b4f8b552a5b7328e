//! # Options Accumulator
//!
//! Turns a resolved [`Target`] plus per-command flags into the
//! [`RequestOptions`] handed to a [`Transport`].
//!
//! Each flag becomes at most one query parameter, named by replacing dashes
//! with underscores (`atts-since` → `atts_since`). Booleans and numbers are
//! only sent when they differ from their declared default, which keeps
//! requests free of noise. A consequence worth knowing: passing
//! `--inclusive-end=true` explicitly sends nothing, exactly as if the flag had
//! been left out.
//!
//! Required-field checks are not done here. Callers run
//! [`RequestOptions::validate`] with the fields their verb needs.

use crate::error::{KouchError, Result};
use crate::target::{Field, Target};
use crate::transport::{Method, Transport};
use std::borrow::Cow;

/// Query parameters in the order they were added. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl Body {
    pub fn json(data: Vec<u8>) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
        }
    }
}

/// A complete request description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub target: Target,
    pub query: Query,
    pub body: Option<Body>,
    pub head: bool,
}

/// A command-line flag as seen by the accumulator.
#[derive(Debug, Clone, Copy)]
pub enum Flag<'a> {
    Bool {
        name: &'static str,
        value: bool,
        default: bool,
    },
    Uint {
        name: &'static str,
        value: u64,
        default: u64,
    },
    Str {
        name: &'static str,
        value: Option<&'a str>,
    },
    /// A JSON-valued parameter such as `key`, sent as given once it parses.
    Json {
        name: &'static str,
        value: Option<&'a str>,
    },
    List {
        name: &'static str,
        values: &'a [String],
    },
    Rev(Option<&'a str>),
    AutoRev(bool),
    Head(bool),
}

impl<'a> Flag<'a> {
    pub fn bool(name: &'static str, value: bool, default: bool) -> Self {
        Flag::Bool {
            name,
            value,
            default,
        }
    }

    pub fn uint(name: &'static str, value: u64, default: u64) -> Self {
        Flag::Uint {
            name,
            value,
            default,
        }
    }

    pub fn string(name: &'static str, value: Option<&'a str>) -> Self {
        Flag::Str { name, value }
    }

    pub fn json(name: &'static str, value: Option<&'a str>) -> Self {
        Flag::Json { name, value }
    }

    pub fn list(name: &'static str, values: &'a [String]) -> Self {
        Flag::List { name, values }
    }
}

/// Query parameter name for a dash-separated flag name.
pub fn param_name(flag: &str) -> String {
    flag.replace('-', "_")
}

/// Builds request options for `target` from `flags`.
///
/// When `--auto-rev` is set this issues a HEAD request through `transport`
/// to learn the document's current revision before returning.
pub fn build(
    target: Target,
    flags: &[Flag<'_>],
    transport: &dyn Transport,
) -> Result<RequestOptions> {
    let mut options = RequestOptions::new(target);
    let mut auto_rev = false;

    for flag in flags {
        match *flag {
            Flag::Bool {
                name,
                value,
                default,
            } => {
                if value != default {
                    options.query.add(param_name(name), value.to_string());
                }
            }
            Flag::Uint {
                name,
                value,
                default,
            } => {
                if value != default {
                    options.query.add(param_name(name), value.to_string());
                }
            }
            Flag::Str { name, value } => {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    options.query.add(param_name(name), value);
                }
            }
            Flag::Json { name, value } => {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    options.query.add(param_name(name), json_param(name, value)?);
                }
            }
            Flag::List { name, values } => {
                if !values.is_empty() {
                    let encoded = serde_json::to_string(values).map_err(|e| {
                        KouchError::InvalidFlag {
                            flag: name.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    options.query.add(param_name(name), encoded);
                }
            }
            Flag::Rev(rev) => {
                if let Some(rev) = rev.filter(|r| !r.is_empty()) {
                    options.query.add("rev", rev);
                }
            }
            Flag::AutoRev(enabled) => auto_rev = auto_rev || enabled,
            Flag::Head(head) => options.head = head,
        }
    }

    if auto_rev {
        if options.query.contains("rev") {
            return Err(KouchError::ConflictingFlags("--rev", "--auto-rev"));
        }
        let rev = current_rev(&options.target, transport)?;
        options.query.add("rev", rev);
    }

    Ok(options)
}

fn json_param(name: &str, value: &str) -> Result<String> {
    serde_json::from_str::<serde_json::Value>(value).map_err(|e| KouchError::InvalidFlag {
        flag: name.to_string(),
        message: format!("not valid JSON: {}", e),
    })?;
    Ok(value.to_string())
}

/// Fetches the current revision of the target document with a HEAD request.
fn current_rev(target: &Target, transport: &dyn Transport) -> Result<String> {
    let probe = RequestOptions {
        target: target.clone(),
        head: true,
        ..RequestOptions::default()
    };
    probe.validate(&[Field::Root, Field::Database, Field::Document])?;
    let path = probe.document_path()?;

    tracing::debug!(path = %path, "fetching current revision");
    let response = transport.execute(Method::Head, &path, &probe)?;
    response
        .header("ETag")
        .map(|etag| etag.trim().trim_matches('"').to_string())
        .filter(|rev| !rev.is_empty())
        .ok_or_else(|| KouchError::InvalidFlag {
            flag: "auto-rev".to_string(),
            message: "server did not report a revision".to_string(),
        })
}

impl RequestOptions {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Checks that every field in `required` is present, reporting the first
    /// missing one in root, database, document, filename order.
    pub fn validate(&self, required: &[Field]) -> Result<()> {
        for field in [Field::Root, Field::Database, Field::Document, Field::Filename] {
            if required.contains(&field) && self.target.get(field).is_none() {
                return Err(match field {
                    Field::Root => KouchError::NoRoot,
                    Field::Database => KouchError::NoDatabase,
                    Field::Document => KouchError::NoDocument,
                    Field::Filename => KouchError::NoFilename,
                });
            }
        }
        Ok(())
    }

    pub fn database_path(&self) -> Result<String> {
        let db = self.target.database.as_deref().ok_or(KouchError::NoDatabase)?;
        Ok(format!("/{}", encode_segment(db)))
    }

    pub fn document_path(&self) -> Result<String> {
        let doc = self.target.document.as_deref().ok_or(KouchError::NoDocument)?;
        Ok(format!("{}/{}", self.database_path()?, encode_document(doc)))
    }

    pub fn attachment_path(&self) -> Result<String> {
        let file = self.target.filename.as_deref().ok_or(KouchError::NoFilename)?;
        Ok(format!("{}/{}", self.document_path()?, encode_segment(file)))
    }
}

/// Encodes one path segment for the wire. Escapes already present are
/// decoded first so that `foo%2Fbar` is not double-encoded.
pub fn encode_segment(segment: &str) -> String {
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    urlencoding::encode(&decoded).into_owned()
}

fn encode_document(id: &str) -> String {
    for prefix in ["_design/", "_local/"] {
        if let Some(rest) = id.strip_prefix(prefix) {
            return format!("{}{}", prefix, encode_segment(rest));
        }
    }
    encode_segment(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;

    fn doc_target() -> Target {
        Target {
            root: Some("http://localhost:5984".into()),
            database: Some("db".into()),
            document: Some("doc".into()),
            ..Target::default()
        }
    }

    fn build_query(flags: &[Flag<'_>]) -> Query {
        build(doc_target(), flags, &MemoryTransport::new())
            .unwrap()
            .query
    }

    #[test]
    fn test_param_name() {
        assert_eq!(param_name("atts-since"), "atts_since");
        assert_eq!(param_name("end-key-doc-id"), "end_key_doc_id");
        assert_eq!(param_name("conflicts"), "conflicts");
    }

    #[test]
    fn test_bool_flags_only_sent_when_not_default() {
        let query = build_query(&[
            Flag::bool("conflicts", false, false),
            Flag::bool("revs-info", true, false),
        ]);
        assert_eq!(query.pairs(), &[("revs_info".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_default_true_flag_left_true_is_omitted() {
        // Explicit `--inclusive-end=true` cannot be told apart from omission.
        let query = build_query(&[Flag::bool("inclusive-end", true, true)]);
        assert!(query.is_empty());

        let query = build_query(&[Flag::bool("inclusive-end", false, true)]);
        assert_eq!(query.get("inclusive_end"), Some("false"));
    }

    #[test]
    fn test_uint_flags() {
        let query = build_query(&[Flag::uint("limit", 0, 0), Flag::uint("skip", 10, 0)]);
        assert_eq!(query.pairs(), &[("skip".to_string(), "10".to_string())]);
    }

    #[test]
    fn test_list_flag_is_json_array() {
        let revs = vec!["1-abc".to_string(), "2-def".to_string()];
        let query = build_query(&[Flag::list("atts-since", &revs), Flag::list("open-revs", &[])]);
        assert_eq!(query.get("atts_since"), Some(r#"["1-abc","2-def"]"#));
        assert!(!query.contains("open_revs"));
    }

    #[test]
    fn test_json_flags() {
        let query = build_query(&[
            Flag::json("start-key", Some(r#"["a",1]"#)),
            Flag::json("end-key", Some(r#""foo""#)),
            Flag::json("key", None),
        ]);
        assert_eq!(query.get("start_key"), Some(r#"["a",1]"#));
        assert_eq!(query.get("end_key"), Some(r#""foo""#));
        assert!(!query.contains("key"));
    }

    #[test]
    fn test_json_flag_must_parse() {
        let err = build(
            doc_target(),
            &[Flag::json("start-key", Some("foo"))],
            &MemoryTransport::new(),
        )
        .unwrap_err();
        match err {
            KouchError::InvalidFlag { flag, message } => {
                assert_eq!(flag, "start-key");
                assert!(message.starts_with("not valid JSON"), "{}", message);
            }
            other => panic!("expected InvalidFlag, got {:?}", other),
        }
    }

    #[test]
    fn test_string_flags_skip_empty() {
        let query = build_query(&[Flag::string("batch", Some("")), Flag::string("w", Some("2"))]);
        assert_eq!(query.pairs(), &[("w".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_rev_is_always_literal() {
        let query = build_query(&[Flag::Rev(Some("1-xyz"))]);
        assert_eq!(query.get("rev"), Some("1-xyz"));
        let query = build_query(&[Flag::Rev(Some(""))]);
        assert!(query.is_empty());
    }

    #[test]
    fn test_repeated_keys_are_kept() {
        let query = build_query(&[Flag::string("w", Some("1")), Flag::string("w", Some("2"))]);
        assert_eq!(query.len(), 2);
        assert_eq!(query.get("w"), Some("1"));
    }

    #[test]
    fn test_head_flag() {
        let options = build(doc_target(), &[Flag::Head(true)], &MemoryTransport::new()).unwrap();
        assert!(options.head);
    }

    #[test]
    fn test_auto_rev_probes_document() {
        let transport = MemoryTransport::new().with_response(
            Method::Head,
            "/db/doc",
            200,
            &[("ETag", "\"3-cafe\"")],
            b"",
        );
        let options = build(doc_target(), &[Flag::AutoRev(true)], &transport).unwrap();
        assert_eq!(options.query.get("rev"), Some("3-cafe"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Head);
        assert_eq!(requests[0].path, "/db/doc");
    }

    #[test]
    fn test_auto_rev_without_etag_fails() {
        let transport = MemoryTransport::new().with_response(Method::Head, "/db/doc", 200, &[], b"");
        let err = build(doc_target(), &[Flag::AutoRev(true)], &transport).unwrap_err();
        assert!(matches!(err, KouchError::InvalidFlag { .. }));
    }

    #[test]
    fn test_auto_rev_and_rev_conflict() {
        let err = build(
            doc_target(),
            &[Flag::Rev(Some("1-a")), Flag::AutoRev(true)],
            &MemoryTransport::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "--rev and --auto-rev are mutually exclusive");
    }

    #[test]
    fn test_auto_rev_needs_document() {
        let target = Target {
            document: None,
            ..doc_target()
        };
        let err = build(target, &[Flag::AutoRev(true)], &MemoryTransport::new()).unwrap_err();
        assert!(matches!(err, KouchError::NoDocument));
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let options = RequestOptions::new(Target {
            database: Some("db".into()),
            ..Target::default()
        });
        assert!(matches!(
            options.validate(&[Field::Filename, Field::Root]),
            Err(KouchError::NoRoot)
        ));
        assert!(matches!(
            options.validate(&[Field::Database, Field::Document]),
            Err(KouchError::NoDocument)
        ));
        assert!(options.validate(&[Field::Database]).is_ok());
    }

    #[test]
    fn test_validate_accepts_bare_host_root() {
        let options = RequestOptions::new(Target {
            root: Some("localhost:5984".into()),
            ..Target::default()
        });
        assert!(options.validate(&[Field::Root]).is_ok());
    }

    #[test]
    fn test_paths_encode_segments() {
        let options = RequestOptions::new(Target {
            database: Some("foo/bar".into()),
            document: Some("_design/a b".into()),
            filename: Some("x.txt".into()),
            ..Target::default()
        });
        assert_eq!(options.database_path().unwrap(), "/foo%2Fbar");
        assert_eq!(options.document_path().unwrap(), "/foo%2Fbar/_design/a%20b");
        assert_eq!(options.attachment_path().unwrap(), "/foo%2Fbar/_design/a%20b/x.txt");
    }

    #[test]
    fn test_typed_escapes_are_not_double_encoded() {
        assert_eq!(encode_segment("foo%2Fbar"), "foo%2Fbar");
        assert_eq!(encode_segment("_local"), "_local");
    }
}
