//! # CLI Layer
//!
//! The binary's only jobs: parse arguments, set up logging, load the config,
//! build the request through [`KouchApi`] and point the output at stdout or
//! `--output`. Errors bubble up to `main`, which maps them to exit codes.

use super::setup::{
    Cli, Commands, ConfigCommands, CreateCommands, DeleteCommands, GetCommands, GlobalArgs,
    PutCommands,
};
use clap::Parser;
use kouch::api::KouchApi;
use kouch::commands::{create, delete, get, put, Request};
use kouch::config::KouchConfig;
use kouch::error::Result;
use kouch::output::open_destination;
use kouch::transport::http::HttpTransport;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KOUCH_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = load_config(&cli.global)?;
    let api = KouchApi::new(HttpTransport::new()?, config);
    let output = cli.global.output_settings();

    let request = match &cli.command {
        Commands::Config(cmd) => {
            let dest = open_destination(cli.global.output.as_deref(), cli.global.clobber)?;
            return match cmd {
                ConfigCommands::View { show_secrets } => {
                    api.config_view(*show_secrets, &output, dest)
                }
                ConfigCommands::GetContexts => api.config_contexts(&output, dest),
            };
        }
        Commands::Get(cmd) => get_request(&api, cmd)?,
        Commands::Put(cmd) => put_request(&api, cmd)?,
        Commands::Create(cmd) => create_request(&api, cmd)?,
        Commands::Delete(cmd) => delete_request(&api, cmd)?,
    };

    let dest = open_destination(cli.global.output.as_deref(), cli.global.clobber)?;
    api.send(&request, &output, dest)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(global: &GlobalArgs) -> Result<KouchConfig> {
    let config = match KouchConfig::locate(global.kouchconfig.as_deref()) {
        Some(path) => KouchConfig::load(path)?,
        None => KouchConfig::default(),
    };
    config.with_overrides(global.context.as_deref(), global.root.as_deref())
}

type Api = KouchApi<HttpTransport>;

fn get_request(api: &Api, cmd: &GetCommands) -> Result<Request> {
    match cmd {
        GetCommands::Server { target } => api.get_server(&target.address()),
        GetCommands::Db { target, head } => api.get_database(&target.address(), *head),
        GetCommands::Doc { target, flags } => {
            api.get_document(&target.address(), &get::DocArgs::from(flags))
        }
        GetCommands::Att { target, rev, head } => {
            api.get_attachment(&target.address(), rev.rev.as_deref(), *head)
        }
        GetCommands::AllDocs { target, flags } => {
            api.get_all_docs(&target.address(), &get::AllDocsArgs::from(flags))
        }
    }
}

fn put_request(api: &Api, cmd: &PutCommands) -> Result<Request> {
    match cmd {
        PutCommands::Doc {
            target,
            data,
            batch,
            new_edits,
            rev,
        } => {
            let body = put::DataArgs::from(data).read_json(&mut std::io::stdin().lock())?;
            let args = put::DocArgs {
                batch: *batch,
                new_edits: *new_edits,
                rev: rev.rev.clone(),
                auto_rev: rev.auto_rev,
            };
            api.put_document(&target.address(), body, &args)
        }
        PutCommands::Att {
            target,
            data,
            content_type,
            rev,
        } => {
            let body = put::DataArgs::from(data).read(&mut std::io::stdin().lock())?;
            let args = put::AttArgs {
                content_type: content_type.clone(),
                rev: rev.rev.clone(),
                auto_rev: rev.auto_rev,
            };
            api.put_attachment(&target.address(), body, &args)
        }
    }
}

fn create_request(api: &Api, cmd: &CreateCommands) -> Result<Request> {
    match cmd {
        CreateCommands::Db {
            target,
            shards,
            replicas,
            partitioned,
        } => {
            let args = create::DbArgs {
                shards: *shards,
                replicas: *replicas,
                partitioned: *partitioned,
            };
            api.create_database(&target.address(), &args)
        }
    }
}

fn delete_request(api: &Api, cmd: &DeleteCommands) -> Result<Request> {
    match cmd {
        DeleteCommands::Db { target } => api.delete_database(&target.address()),
        DeleteCommands::Doc { target, rev, batch } => {
            api.delete_document(&target.address(), &delete::RevArgs::from(rev), *batch)
        }
        DeleteCommands::Att { target, rev } => {
            api.delete_attachment(&target.address(), &delete::RevArgs::from(rev))
        }
    }
}
