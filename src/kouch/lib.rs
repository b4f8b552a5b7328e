//! # Kouch Architecture
//!
//! Kouch is a command-line client for CouchDB-style document servers. The
//! library does the work; the `kouch` binary is a thin clap front end over
//! it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, sets up logging, opens stdout/files    │
//! │  - The ONLY place that knows about exit codes               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Resolves address strings against config and flags        │
//! │  - Sends requests and picks the output mode                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Builds method, path, query and body for each verb        │
//! │  - No output of its own                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport Layer (transport/)                               │
//! │  - Abstract Transport trait                                 │
//! │  - HttpTransport (production), MemoryTransport (testing)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Response bodies flow from the transport into an output [`output::Sink`].
//! Structured modes decode the body on a worker thread while it is still
//! arriving; see [`output::stream`].
//!
//! ## Addresses
//!
//! A command names its resource with one address string, read according to
//! the command's [`target::Scope`]. `db/doc`, `/db/doc/file.txt` and
//! `http://host:5984/db/doc` are all addresses. Parts of an address can also
//! be given as `--database`, `--id` and `--filename`, but never both ways at
//! once: see [`resolve`].
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Request building for each verb
//! - [`target`]: Address grammar
//! - [`resolve`]: Merging addresses, flags and config into a target
//! - [`options`]: Turning flags into query parameters
//! - [`transport`]: Transport abstraction and implementations
//! - [`output`]: Output modes and the streaming transform
//! - [`config`]: Contexts file handling
//! - [`error`]: Error types and exit statuses
//! - `cli`: Argument parsing for the binary (not part of the lib API)

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod options;
pub mod output;
pub mod resolve;
pub mod target;
pub mod transport;
