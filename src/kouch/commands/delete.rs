use super::Request;
use crate::error::Result;
use crate::options::{build, Flag};
use crate::target::{Field, Target};
use crate::transport::{Method, Transport};

/// Revision flags shared by the document and attachment deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevArgs {
    pub rev: Option<String>,
    pub auto_rev: bool,
}

/// `DELETE /{db}`.
pub fn database(target: Target, transport: &dyn Transport) -> Result<Request> {
    let options = build(target, &[], transport)?;
    options.validate(&[Field::Root, Field::Database])?;
    let path = options.database_path()?;
    Ok(Request::new(Method::Delete, path, options))
}

/// `DELETE /{db}/{id}`.
pub fn document(
    target: Target,
    args: &RevArgs,
    batch: bool,
    transport: &dyn Transport,
) -> Result<Request> {
    let flags = [
        Flag::Rev(args.rev.as_deref()),
        Flag::AutoRev(args.auto_rev),
        Flag::string("batch", batch.then_some("ok")),
    ];
    let options = build(target, &flags, transport)?;
    options.validate(&[Field::Root, Field::Database, Field::Document])?;
    let path = options.document_path()?;
    Ok(Request::new(Method::Delete, path, options))
}

/// `DELETE /{db}/{id}/{filename}`.
pub fn attachment(target: Target, args: &RevArgs, transport: &dyn Transport) -> Result<Request> {
    let flags = [Flag::Rev(args.rev.as_deref()), Flag::AutoRev(args.auto_rev)];
    let options = build(target, &flags, transport)?;
    options.validate(&[Field::Root, Field::Database, Field::Document, Field::Filename])?;
    let path = options.attachment_path()?;
    Ok(Request::new(Method::Delete, path, options))
}
