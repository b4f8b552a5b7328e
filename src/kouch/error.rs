use thiserror::Error;

/// Process exit statuses. The numbering follows curl's so that scripts written
/// against either tool can share their error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Unknown = 1,
    FailedToInit = 2,
    UrlMalformed = 3,
    CouldntResolveHost = 6,
    FailedToConnect = 7,
    WeirdReply = 8,
    HttpError = 22,
    WriteError = 23,
    ReadError = 26,
    Timeout = 28,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Error, Debug)]
pub enum KouchError {
    #[error("URL malformed: {0}")]
    UrlMalformed(String),

    #[error("incomplete target, missing {0}")]
    IncompleteTarget(&'static str),

    #[error("{flag} specified, but the implicit target already names a {field}")]
    Conflict {
        flag: &'static str,
        field: &'static str,
    },

    #[error("{0} and {1} are mutually exclusive")]
    ConflictingFlags(&'static str, &'static str),

    #[error("{flag} is not valid for {scope} targets")]
    FieldNotInScope {
        flag: &'static str,
        scope: &'static str,
    },

    #[error("no root URL provided")]
    NoRoot,

    #[error("no database specified")]
    NoDatabase,

    #[error("no document ID specified")]
    NoDocument,

    #[error("no filename specified")]
    NoFilename,

    #[error("invalid value for --{flag}: {message}")]
    InvalidFlag { flag: String, message: String },

    #[error("malformed response at line {line}, column {column}: {message}")]
    MalformedInput {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unrecognized output format '{0}'")]
    UnknownOutputFormat(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Http { status: u16, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output error: {0}")]
    Output(String),

    #[error("failed reading response: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed writing output: {0}")]
    Write(#[source] std::io::Error),
}

impl KouchError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            KouchError::UrlMalformed(_) => ExitStatus::UrlMalformed,
            KouchError::IncompleteTarget(_)
            | KouchError::Conflict { .. }
            | KouchError::ConflictingFlags(..)
            | KouchError::FieldNotInScope { .. }
            | KouchError::NoRoot
            | KouchError::NoDatabase
            | KouchError::NoDocument
            | KouchError::NoFilename
            | KouchError::InvalidFlag { .. }
            | KouchError::UnknownOutputFormat(_)
            | KouchError::Template(_)
            | KouchError::Config(_) => ExitStatus::FailedToInit,
            KouchError::MalformedInput { .. } => ExitStatus::WeirdReply,
            KouchError::Http { .. } => ExitStatus::HttpError,
            KouchError::Transport(e) => transport_status(e),
            KouchError::Io(e) => match e.kind() {
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::WriteZero => {
                    ExitStatus::WriteError
                }
                std::io::ErrorKind::UnexpectedEof => ExitStatus::ReadError,
                _ => ExitStatus::Unknown,
            },
            KouchError::Output(_) | KouchError::Write(_) => ExitStatus::WriteError,
            KouchError::Read(_) => ExitStatus::ReadError,
        }
    }

    /// Reclassifies a plain I/O failure as a failure to write output.
    pub fn on_write(self) -> Self {
        match self {
            KouchError::Io(e) => KouchError::Write(e),
            other => other,
        }
    }
}

fn transport_status(e: &reqwest::Error) -> ExitStatus {
    if e.is_builder() {
        ExitStatus::UrlMalformed
    } else if e.is_timeout() {
        ExitStatus::Timeout
    } else if e.is_connect() {
        if looks_like_dns_failure(e) {
            ExitStatus::CouldntResolveHost
        } else {
            ExitStatus::FailedToConnect
        }
    } else if e.is_body() || e.is_decode() {
        ExitStatus::ReadError
    } else {
        ExitStatus::Unknown
    }
}

// reqwest does not classify resolver failures, so walk the source chain.
fn looks_like_dns_failure(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        let text = err.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = err.source();
    }
    false
}

impl From<serde_json::Error> for KouchError {
    fn from(e: serde_json::Error) -> Self {
        KouchError::MalformedInput {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}

impl From<minijinja::Error> for KouchError {
    fn from(e: minijinja::Error) -> Self {
        KouchError::Template(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KouchError>;
