use super::Request;
use crate::error::Result;
use crate::options::{build, Flag};
use crate::target::{Field, Target};
use crate::transport::{Method, Transport};

/// Flags of `get doc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocArgs {
    pub attachments: bool,
    pub att_encoding_info: bool,
    pub atts_since: Vec<String>,
    pub conflicts: bool,
    pub deleted_conflicts: bool,
    pub latest: bool,
    pub local_seq: bool,
    pub meta: bool,
    pub open_revs: Vec<String>,
    pub rev: Option<String>,
    pub revs: bool,
    pub revs_info: bool,
    pub head: bool,
}

/// Flags of `get all-docs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllDocsArgs {
    pub conflicts: bool,
    pub descending: bool,
    pub end_key: Option<String>,
    pub end_key_doc_id: Option<String>,
    pub include_docs: bool,
    pub inclusive_end: bool,
    pub key: Option<String>,
    pub keys: Vec<String>,
    pub limit: u64,
    pub skip: u64,
    pub start_key: Option<String>,
    pub start_key_doc_id: Option<String>,
    pub update_seq: bool,
}

impl Default for AllDocsArgs {
    fn default() -> Self {
        Self {
            conflicts: false,
            descending: false,
            end_key: None,
            end_key_doc_id: None,
            include_docs: false,
            inclusive_end: true,
            key: None,
            keys: Vec::new(),
            limit: 0,
            skip: 0,
            start_key: None,
            start_key_doc_id: None,
            update_seq: false,
        }
    }
}

/// `GET /`: server version and vendor information.
pub fn server(target: Target, transport: &dyn Transport) -> Result<Request> {
    let options = build(target, &[], transport)?;
    options.validate(&[Field::Root])?;
    Ok(Request::new(Method::Get, "/".to_string(), options))
}

/// `GET /{db}`: database information.
pub fn database(target: Target, head: bool, transport: &dyn Transport) -> Result<Request> {
    let options = build(target, &[Flag::Head(head)], transport)?;
    options.validate(&[Field::Root, Field::Database])?;
    let path = options.database_path()?;
    Ok(Request::new(Method::Get, path, options))
}

/// `GET /{db}/{id}`.
pub fn document(target: Target, args: &DocArgs, transport: &dyn Transport) -> Result<Request> {
    let flags = [
        Flag::bool("attachments", args.attachments, false),
        Flag::bool("att-encoding-info", args.att_encoding_info, false),
        Flag::list("atts-since", &args.atts_since),
        Flag::bool("conflicts", args.conflicts, false),
        Flag::bool("deleted-conflicts", args.deleted_conflicts, false),
        Flag::bool("latest", args.latest, false),
        Flag::bool("local-seq", args.local_seq, false),
        Flag::bool("meta", args.meta, false),
        Flag::list("open-revs", &args.open_revs),
        Flag::Rev(args.rev.as_deref()),
        Flag::bool("revs", args.revs, false),
        Flag::bool("revs-info", args.revs_info, false),
        Flag::Head(args.head),
    ];
    let options = build(target, &flags, transport)?;
    options.validate(&[Field::Root, Field::Database, Field::Document])?;
    let path = options.document_path()?;
    Ok(Request::new(Method::Get, path, options))
}

/// `GET /{db}/{id}/{filename}`. Attachments default to raw output.
pub fn attachment(
    target: Target,
    rev: Option<&str>,
    head: bool,
    transport: &dyn Transport,
) -> Result<Request> {
    let options = build(target, &[Flag::Rev(rev), Flag::Head(head)], transport)?;
    options.validate(&[Field::Root, Field::Database, Field::Document, Field::Filename])?;
    let path = options.attachment_path()?;
    Ok(Request::new(Method::Get, path, options).with_default_format("raw"))
}

/// `GET /{db}/_all_docs`.
pub fn all_docs(target: Target, args: &AllDocsArgs, transport: &dyn Transport) -> Result<Request> {
    let flags = [
        Flag::bool("conflicts", args.conflicts, false),
        Flag::bool("descending", args.descending, false),
        Flag::json("end-key", args.end_key.as_deref()),
        Flag::string("end-key-doc-id", args.end_key_doc_id.as_deref()),
        Flag::bool("include-docs", args.include_docs, false),
        Flag::bool("inclusive-end", args.inclusive_end, true),
        Flag::json("key", args.key.as_deref()),
        Flag::list("keys", &args.keys),
        Flag::uint("limit", args.limit, 0),
        Flag::uint("skip", args.skip, 0),
        Flag::json("start-key", args.start_key.as_deref()),
        Flag::string("start-key-doc-id", args.start_key_doc_id.as_deref()),
        Flag::bool("update-seq", args.update_seq, false),
    ];
    let options = build(target, &flags, transport)?;
    options.validate(&[Field::Root, Field::Database])?;
    let path = format!("{}/_all_docs", options.database_path()?);
    Ok(Request::new(Method::Get, path, options))
}
