//! # Address Grammar
//!
//! Operators name resources with short strings whose meaning depends on what
//! the command operates on. The same input `foo/bar` is a database `bar` on
//! root `foo` for a database command, and document `bar` in database `foo` for
//! a document command. The [`Scope`] fixed by the command decides which rule
//! applies.
//!
//! Strings are split **right to left**: the most specific resource is always
//! the last segment, and whatever remains on the left falls through to the
//! next, less specific field. Document ids under `_design/` and `_local/` are
//! a single id and never split.
//!
//! | Scope      | Accepted forms                                              |
//! |------------|-------------------------------------------------------------|
//! | Root       | `scheme://host[:port][/path]`, `host[:port]`                |
//! | Database   | `name`, `/name`, `http://host/name`                         |
//! | Document   | `id`, `db/id`, `db/_design/id`, `db/_local/id`, full URL    |
//! | Attachment | `filename`, `id/filename`, `/db/id/filename`, full URL      |
//!
//! Percent-encoding is never interpreted here. `foo%2Fbar` stays a single
//! segment until it is put on the wire.

use crate::error::{KouchError, Result};
use std::fmt;

/// The class of resource an address string is interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Root,
    Database,
    Document,
    Attachment,
}

impl Scope {
    /// Whether a target in this scope may carry a value for `field`.
    pub fn permits(self, field: Field) -> bool {
        match field {
            Field::Root => true,
            Field::Database => self != Scope::Root,
            Field::Document => matches!(self, Scope::Document | Scope::Attachment),
            Field::Filename => self == Scope::Attachment,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scope::Root => "root",
            Scope::Database => "database",
            Scope::Document => "document",
            Scope::Attachment => "attachment",
        }
    }

    /// Help text describing the address forms accepted in this scope.
    pub fn help(self) -> &'static str {
        match self {
            Scope::Root => "Server root, as `scheme://host[:port][/path]` or bare `host[:port]`",
            Scope::Database => "Database, as `name`, `/name` or a full URL ending in `.../name`",
            Scope::Document => {
                "Document, as `id`, `db/id`, `db/_design/id`, `db/_local/id` or a full URL"
            }
            Scope::Attachment => {
                "Attachment, as `filename`, `id/filename`, `/db/id/filename` or a full URL. \
                 Use --filename, --id and --database for names containing slashes"
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resource fields of a [`Target`], in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Root,
    Database,
    Document,
    Filename,
}

impl Field {
    /// Fields a flag may override, in the order conflicts are checked.
    pub const OVERRIDABLE: [Field; 3] = [Field::Database, Field::Document, Field::Filename];

    pub fn flag(self) -> &'static str {
        match self {
            Field::Root => "--root",
            Field::Database => "--database",
            Field::Document => "--id",
            Field::Filename => "--filename",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Field::Root => "root URL",
            Field::Database => "database",
            Field::Document => "document ID",
            Field::Filename => "filename",
        }
    }
}

/// A decomposed resource address.
///
/// Absent and empty are the same thing: constructors never store `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub root: Option<String>,
    pub database: Option<String>,
    pub document: Option<String>,
    pub filename: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Target {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Root => self.root.as_deref(),
            Field::Database => self.database.as_deref(),
            Field::Document => self.document.as_deref(),
            Field::Filename => self.filename.as_deref(),
        }
    }

    /// Returns a copy with `field` replaced.
    pub fn with(mut self, field: Field, value: Option<String>) -> Self {
        let value = non_empty(value);
        match field {
            Field::Root => self.root = value,
            Field::Database => self.database = value,
            Field::Document => self.document = value,
            Field::Filename => self.filename = value,
        }
        self
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = non_empty(username);
        self.password = non_empty(password);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn segment(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses `input` as an address in `scope`.
///
/// An empty input is the empty target, never an error: commands fall back to
/// flags and the configured context.
pub fn parse(scope: Scope, input: &str) -> Result<Target> {
    if input.is_empty() {
        return Ok(Target::default());
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        parse_url(scope, input)
    } else {
        parse_relative(scope, input)
    }
}

fn parse_relative(scope: Scope, input: &str) -> Result<Target> {
    let (root, target) = split_scope(scope, input);
    let target = target.with(Field::Root, segment(root));
    require_trailing(scope, &target)?;
    Ok(target)
}

fn parse_url(scope: Scope, input: &str) -> Result<Target> {
    let url = url::Url::parse(input).map_err(|e| KouchError::UrlMalformed(e.to_string()))?;

    let username = urlencoding::decode(url.username())
        .map(|u| u.into_owned())
        .unwrap_or_else(|_| url.username().to_string());
    let password = url.password().map(|p| {
        urlencoding::decode(p)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| p.to_string())
    });

    let (base, path) = split_authority(input);
    let (rest, target) = split_scope(scope, path);
    let target = target
        .with(Field::Root, segment(&format!("{}{}", base, rest)))
        .with_credentials(segment(&username), password);

    require_trailing(scope, &target)?;
    for field in [Field::Database, Field::Document] {
        if scope.permits(field) && target.get(field).is_none() {
            return Err(KouchError::IncompleteTarget(field.describe()));
        }
    }
    Ok(target)
}

/// Splits a URL string into `scheme://host[:port]` (user-info removed) and
/// the path. Query and fragment are dropped.
fn split_authority(input: &str) -> (String, &str) {
    let scheme_end = input.find("://").map(|i| i + 3).unwrap_or(0);
    let after_scheme = &input[scheme_end..];
    let authority_len = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..authority_len];
    let host = match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    };

    let remainder = &after_scheme[authority_len..];
    let path_len = remainder.find(['?', '#']).unwrap_or(remainder.len());

    (
        format!("{}{}", &input[..scheme_end], host),
        &remainder[..path_len],
    )
}

/// Peels scope-specific segments off the right of `path`, returning the
/// unconsumed prefix and the peeled fields.
fn split_scope(scope: Scope, path: &str) -> (&str, Target) {
    let target = Target::default();
    match scope {
        Scope::Root => (path, target),
        Scope::Database => {
            let (rest, db) = split_last(path);
            (rest, target.with(Field::Database, segment(db)))
        }
        Scope::Document => {
            let (rest, doc) = split_document(path);
            let (rest, db) = split_last(rest);
            let target = target
                .with(Field::Document, segment(&doc))
                .with(Field::Database, segment(db));
            (rest, target)
        }
        Scope::Attachment => {
            let (rest, filename) = split_last(path);
            let (rest, doc) = split_document(rest);
            let (rest, db) = split_last(rest);
            let target = target
                .with(Field::Filename, segment(filename))
                .with(Field::Document, segment(&doc))
                .with(Field::Database, segment(db));
            (rest, target)
        }
    }
}

fn split_last(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((rest, last)) => (rest, last),
        None => ("", path),
    }
}

fn split_document(path: &str) -> (&str, String) {
    let (rest, last) = split_last(path);
    if last.is_empty() {
        return (rest, String::new());
    }
    let (before, prefix) = split_last(rest);
    if prefix == "_design" || prefix == "_local" {
        (before, format!("{}/{}", prefix, last))
    } else {
        (rest, last.to_string())
    }
}

fn require_trailing(scope: Scope, target: &Target) -> Result<()> {
    let field = match scope {
        Scope::Root => return Ok(()),
        Scope::Database => Field::Database,
        Scope::Document => Field::Document,
        Scope::Attachment => Field::Filename,
    };
    match target.get(field) {
        Some(_) => Ok(()),
        None => Err(KouchError::IncompleteTarget(field.describe())),
    }
}
