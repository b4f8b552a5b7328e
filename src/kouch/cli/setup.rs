use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use kouch::api::OutputSettings;
use kouch::commands::{delete, get, put, Address};
use kouch::output::OutputFlags;
use kouch::resolve::FlagOverrides;
use kouch::target::Scope;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kouch", bin_name = "kouch", version)]
#[command(about = "Command-line client for CouchDB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the kouch config file [default: $KOUCHCONFIG, then the user config dir]
    #[arg(long, global = true, value_name = "FILE")]
    pub kouchconfig: Option<PathBuf>,

    /// Config context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Server root URL, used when the target does not name one
    #[arg(long, global = true, value_name = "URL")]
    pub root: Option<String>,

    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: raw, json, yaml or template
    #[arg(short = 'F', long, global = true, value_name = "FORMAT")]
    pub output_format: Option<String>,

    /// Write output to FILE instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long, global = true)]
    pub clobber: bool,

    /// Prefix for each line of JSON output after the first
    #[arg(long, global = true, default_value = "", hide_default_value = true)]
    pub json_prefix: String,

    /// Indentation for JSON output; compact when empty
    #[arg(long, global = true, default_value = "", hide_default_value = true)]
    pub json_indent: String,

    /// Escape <, > and & in JSON output
    #[arg(long, global = true)]
    pub json_escape_html: bool,

    /// Template source for template output
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// File holding the template for template output
    #[arg(long, global = true, value_name = "FILE")]
    pub template_file: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            format: self.output_format.clone(),
            flags: OutputFlags {
                json_prefix: self.json_prefix.clone(),
                json_indent: self.json_indent.clone(),
                json_escape_html: self.json_escape_html,
                template: self.template.clone(),
                template_file: self.template_file.clone(),
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource
    #[command(subcommand, display_order = 1)]
    Get(GetCommands),

    /// Create or update a resource
    #[command(subcommand, display_order = 2)]
    Put(PutCommands),

    /// Create a resource
    #[command(subcommand, display_order = 3)]
    Create(CreateCommands),

    /// Delete a resource
    #[command(subcommand, display_order = 4)]
    Delete(DeleteCommands),

    /// Inspect the config file
    #[command(subcommand, display_order = 5)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RootTarget {
    #[arg(value_name = "TARGET", help = Scope::Root.help())]
    pub target: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DbTarget {
    #[arg(value_name = "TARGET", help = Scope::Database.help())]
    pub target: Option<String>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DocTarget {
    #[arg(value_name = "TARGET", help = Scope::Document.help())]
    pub target: Option<String>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,

    /// Document ID
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AttTarget {
    #[arg(value_name = "TARGET", help = Scope::Attachment.help())]
    pub target: Option<String>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,

    /// Document ID
    #[arg(long)]
    pub id: Option<String>,

    /// Attachment filename
    #[arg(long)]
    pub filename: Option<String>,
}

impl RootTarget {
    pub fn address(&self) -> Address {
        Address::new(self.target.clone().unwrap_or_default())
    }
}

impl DbTarget {
    pub fn address(&self) -> Address {
        Address::new(self.target.clone().unwrap_or_default()).with_overrides(FlagOverrides {
            database: self.database.clone(),
            ..FlagOverrides::default()
        })
    }
}

impl DocTarget {
    pub fn address(&self) -> Address {
        Address::new(self.target.clone().unwrap_or_default()).with_overrides(FlagOverrides {
            database: self.database.clone(),
            document: self.id.clone(),
            ..FlagOverrides::default()
        })
    }
}

impl AttTarget {
    pub fn address(&self) -> Address {
        Address::new(self.target.clone().unwrap_or_default()).with_overrides(FlagOverrides {
            database: self.database.clone(),
            document: self.id.clone(),
            filename: self.filename.clone(),
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RevFlags {
    /// Document revision
    #[arg(long)]
    pub rev: Option<String>,

    /// Look up the current revision before sending the request
    #[arg(long)]
    pub auto_rev: bool,
}

impl From<&RevFlags> for delete::RevArgs {
    fn from(flags: &RevFlags) -> Self {
        Self {
            rev: flags.rev.clone(),
            auto_rev: flags.auto_rev,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum DataFormatArg {
    #[default]
    Json,
    Yaml,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DataFlags {
    /// Request body
    #[arg(long)]
    pub data: Option<String>,

    /// Read the request body from FILE, or from stdin when FILE is -
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Format of the document body; YAML is converted to JSON
    #[arg(long, value_enum, default_value_t = DataFormatArg::Json)]
    pub data_format: DataFormatArg,
}

impl From<&DataFlags> for put::DataArgs {
    fn from(flags: &DataFlags) -> Self {
        Self {
            data: flags.data.clone(),
            data_file: flags.data_file.clone(),
            format: match flags.data_format {
                DataFormatArg::Json => put::DataFormat::Json,
                DataFormatArg::Yaml => put::DataFormat::Yaml,
            },
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct GetDocFlags {
    /// Include attachment bodies
    #[arg(long)]
    pub attachments: bool,

    /// Include encoding information in attachment stubs
    #[arg(long)]
    pub att_encoding_info: bool,

    /// Only include attachments changed since these revisions
    #[arg(long, value_delimiter = ',', value_name = "REVS")]
    pub atts_since: Vec<String>,

    /// Include conflicting revisions
    #[arg(long)]
    pub conflicts: bool,

    /// Include deleted conflicting revisions
    #[arg(long)]
    pub deleted_conflicts: bool,

    /// Return the latest leaf revisions
    #[arg(long)]
    pub latest: bool,

    /// Include the last update sequence
    #[arg(long)]
    pub local_seq: bool,

    /// Same as --conflicts --deleted-conflicts --revs-info
    #[arg(long)]
    pub meta: bool,

    /// Fetch these leaf revisions, or all with `all`
    #[arg(long, value_delimiter = ',', value_name = "REVS")]
    pub open_revs: Vec<String>,

    #[command(flatten)]
    pub rev: GetRevFlag,

    /// Include the revision history
    #[arg(long)]
    pub revs: bool,

    /// Include detailed revision information
    #[arg(long)]
    pub revs_info: bool,

    /// Print response headers only
    #[arg(short = 'I', long)]
    pub head: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GetRevFlag {
    /// Fetch this revision
    #[arg(long)]
    pub rev: Option<String>,
}

impl From<&GetDocFlags> for get::DocArgs {
    fn from(flags: &GetDocFlags) -> Self {
        Self {
            attachments: flags.attachments,
            att_encoding_info: flags.att_encoding_info,
            atts_since: flags.atts_since.clone(),
            conflicts: flags.conflicts,
            deleted_conflicts: flags.deleted_conflicts,
            latest: flags.latest,
            local_seq: flags.local_seq,
            meta: flags.meta,
            open_revs: flags.open_revs.clone(),
            rev: flags.rev.rev.clone(),
            revs: flags.revs,
            revs_info: flags.revs_info,
            head: flags.head,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AllDocsFlags {
    /// Include conflicting revisions (with --include-docs)
    #[arg(long)]
    pub conflicts: bool,

    /// Return rows in descending key order
    #[arg(long)]
    pub descending: bool,

    /// Stop at this key (JSON)
    #[arg(long, alias = "endkey")]
    pub end_key: Option<String>,

    /// Stop at this document ID
    #[arg(long, alias = "endkey-docid")]
    pub end_key_doc_id: Option<String>,

    /// Include the full documents
    #[arg(long)]
    pub include_docs: bool,

    /// Include rows matching --end-key
    #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
    pub inclusive_end: bool,

    /// Only return rows matching this key (JSON)
    #[arg(long)]
    pub key: Option<String>,

    /// Only return rows matching these keys
    #[arg(long, value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Maximum number of rows
    #[arg(long, default_value_t = 0, hide_default_value = true)]
    pub limit: u64,

    /// Rows to skip
    #[arg(long, default_value_t = 0, hide_default_value = true)]
    pub skip: u64,

    /// Start at this key (JSON)
    #[arg(long, alias = "startkey")]
    pub start_key: Option<String>,

    /// Start at this document ID
    #[arg(long, alias = "startkey-docid")]
    pub start_key_doc_id: Option<String>,

    /// Include the update sequence
    #[arg(long)]
    pub update_seq: bool,
}

impl From<&AllDocsFlags> for get::AllDocsArgs {
    fn from(flags: &AllDocsFlags) -> Self {
        Self {
            conflicts: flags.conflicts,
            descending: flags.descending,
            end_key: flags.end_key.clone(),
            end_key_doc_id: flags.end_key_doc_id.clone(),
            include_docs: flags.include_docs,
            inclusive_end: flags.inclusive_end,
            key: flags.key.clone(),
            keys: flags.keys.clone(),
            limit: flags.limit,
            skip: flags.skip,
            start_key: flags.start_key.clone(),
            start_key_doc_id: flags.start_key_doc_id.clone(),
            update_seq: flags.update_seq,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum GetCommands {
    /// Server version and vendor information
    Server {
        #[command(flatten)]
        target: RootTarget,
    },

    /// Database information
    #[command(alias = "database")]
    Db {
        #[command(flatten)]
        target: DbTarget,

        /// Print response headers only
        #[arg(short = 'I', long)]
        head: bool,
    },

    /// A document
    #[command(alias = "document")]
    Doc {
        #[command(flatten)]
        target: DocTarget,

        #[command(flatten)]
        flags: GetDocFlags,
    },

    /// An attachment, written raw unless --output-format says otherwise
    #[command(alias = "attachment")]
    Att {
        #[command(flatten)]
        target: AttTarget,

        #[command(flatten)]
        rev: GetRevFlag,

        /// Print response headers only
        #[arg(short = 'I', long)]
        head: bool,
    },

    /// Rows of the _all_docs view
    AllDocs {
        #[command(flatten)]
        target: DbTarget,

        #[command(flatten)]
        flags: AllDocsFlags,
    },
}

#[derive(Subcommand, Debug)]
pub enum PutCommands {
    /// Create or update a document
    #[command(alias = "document")]
    Doc {
        #[command(flatten)]
        target: DocTarget,

        #[command(flatten)]
        data: DataFlags,

        /// Let the server batch the write (batch=ok)
        #[arg(long)]
        batch: bool,

        /// Assign a new revision; false stores the revision as given
        #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
        new_edits: bool,

        #[command(flatten)]
        rev: RevFlags,
    },

    /// Upload an attachment
    #[command(alias = "attachment")]
    Att {
        #[command(flatten)]
        target: AttTarget,

        #[command(flatten)]
        data: DataFlags,

        /// Content type of the attachment
        #[arg(long, default_value = put::DEFAULT_ATTACHMENT_TYPE)]
        content_type: String,

        #[command(flatten)]
        rev: RevFlags,
    },
}

#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create a database
    #[command(alias = "database")]
    Db {
        #[command(flatten)]
        target: DbTarget,

        /// Number of shards
        #[arg(short = 'q', long, default_value_t = 0, hide_default_value = true)]
        shards: u64,

        /// Number of replicas
        #[arg(short = 'n', long, default_value_t = 0, hide_default_value = true)]
        replicas: u64,

        /// Create a partitioned database
        #[arg(long)]
        partitioned: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeleteCommands {
    /// Delete a database
    #[command(alias = "database")]
    Db {
        #[command(flatten)]
        target: DbTarget,
    },

    /// Delete a document
    #[command(alias = "document")]
    Doc {
        #[command(flatten)]
        target: DocTarget,

        #[command(flatten)]
        rev: RevFlags,

        /// Let the server batch the write (batch=ok)
        #[arg(long)]
        batch: bool,
    },

    /// Delete an attachment
    #[command(alias = "attachment")]
    Att {
        #[command(flatten)]
        target: AttTarget,

        #[command(flatten)]
        rev: RevFlags,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    View {
        /// Show passwords instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },

    /// List the configured contexts
    GetContexts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_get_doc_flags() {
        let cli = parse(&[
            "kouch",
            "get",
            "doc",
            "db/doc",
            "--conflicts",
            "--open-revs",
            "1-a,2-b",
            "--rev",
            "3-c",
            "-F",
            "yaml",
        ]);
        match cli.command {
            Commands::Get(GetCommands::Doc { target, flags }) => {
                assert_eq!(target.target.as_deref(), Some("db/doc"));
                let args = get::DocArgs::from(&flags);
                assert!(args.conflicts);
                assert_eq!(args.open_revs, vec!["1-a", "2-b"]);
                assert_eq!(args.rev.as_deref(), Some("3-c"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.global.output_format.as_deref(), Some("yaml"));
    }

    #[test]
    fn test_inclusive_end_defaults_true() {
        let cli = parse(&["kouch", "get", "all-docs", "db"]);
        match cli.command {
            Commands::Get(GetCommands::AllDocs { flags, .. }) => assert!(flags.inclusive_end),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = parse(&["kouch", "get", "all-docs", "db", "--inclusive-end=false"]);
        match cli.command {
            Commands::Get(GetCommands::AllDocs { flags, .. }) => assert!(!flags.inclusive_end),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_attachment_overrides() {
        let cli = parse(&[
            "kouch",
            "get",
            "att",
            "foo.txt",
            "--database",
            "db",
            "--id",
            "doc",
        ]);
        match cli.command {
            Commands::Get(GetCommands::Att { target, .. }) => {
                let address = target.address();
                assert_eq!(address.raw, "foo.txt");
                assert_eq!(address.overrides.database.as_deref(), Some("db"));
                assert_eq!(address.overrides.document.as_deref(), Some("doc"));
                assert_eq!(address.overrides.filename, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "kouch",
            "get",
            "db",
            "foo",
            "--root",
            "http://localhost:5984",
            "--json-indent",
            "  ",
        ]);
        assert_eq!(cli.global.root.as_deref(), Some("http://localhost:5984"));
        assert_eq!(cli.global.output_settings().flags.json_indent, "  ");
    }

    #[test]
    fn test_create_db_short_flags() {
        let cli = parse(&["kouch", "create", "db", "foo", "-q", "8", "-n", "3"]);
        match cli.command {
            Commands::Create(CreateCommands::Db {
                shards, replicas, ..
            }) => {
                assert_eq!(shards, 8);
                assert_eq!(replicas, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
