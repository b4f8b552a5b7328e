use super::Request;
use crate::error::Result;
use crate::options::{build, Flag};
use crate::target::{Field, Target};
use crate::transport::{Method, Transport};

/// Flags of `create db`. Zero leaves the server default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbArgs {
    pub shards: u64,
    pub replicas: u64,
    pub partitioned: bool,
}

/// `PUT /{db}`.
pub fn database(target: Target, args: &DbArgs, transport: &dyn Transport) -> Result<Request> {
    let flags = [
        Flag::uint("q", args.shards, 0),
        Flag::uint("n", args.replicas, 0),
        Flag::bool("partitioned", args.partitioned, false),
    ];
    let options = build(target, &flags, transport)?;
    options.validate(&[Field::Root, Field::Database])?;
    let path = options.database_path()?;
    Ok(Request::new(Method::Put, path, options))
}
