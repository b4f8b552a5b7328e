//! # API Facade
//!
//! [`KouchApi`] is the single entry point for a client: it resolves address
//! strings against the loaded configuration, dispatches to the command
//! layer and sends the result through an output mode.
//!
//! `KouchApi<T: Transport>` is generic over the transport:
//! - Production: `KouchApi<HttpTransport>`
//! - Testing: `KouchApi<MemoryTransport>`
//!
//! The facade writes only to the [`Destination`] it is handed. It never
//! touches stdout or stderr itself.

use crate::commands::{self, create, delete, get, put, Address, Request};
use crate::config::KouchConfig;
use crate::error::Result;
use crate::output::{Destination, OutputFlags, OutputRegistry};
use crate::resolve::resolve;
use crate::target::{Scope, Target};
use crate::transport::Transport;

/// How to render results: a mode name (or the request's default) and the
/// formatter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSettings {
    pub format: Option<String>,
    pub flags: OutputFlags,
}

pub struct KouchApi<T: Transport> {
    transport: T,
    config: KouchConfig,
    registry: OutputRegistry,
}

impl<T: Transport> KouchApi<T> {
    pub fn new(transport: T, config: KouchConfig) -> Self {
        Self {
            transport,
            config,
            registry: OutputRegistry::standard(),
        }
    }

    pub fn with_registry(mut self, registry: OutputRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &KouchConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &OutputRegistry {
        &self.registry
    }

    fn target(&self, scope: Scope, address: &Address) -> Result<Target> {
        resolve(scope, &address.raw, &address.overrides, &self.config)
    }

    pub fn get_server(&self, address: &Address) -> Result<Request> {
        get::server(self.target(Scope::Root, address)?, &self.transport)
    }

    pub fn get_database(&self, address: &Address, head: bool) -> Result<Request> {
        get::database(self.target(Scope::Database, address)?, head, &self.transport)
    }

    pub fn get_document(&self, address: &Address, args: &get::DocArgs) -> Result<Request> {
        get::document(self.target(Scope::Document, address)?, args, &self.transport)
    }

    pub fn get_attachment(
        &self,
        address: &Address,
        rev: Option<&str>,
        head: bool,
    ) -> Result<Request> {
        get::attachment(
            self.target(Scope::Attachment, address)?,
            rev,
            head,
            &self.transport,
        )
    }

    pub fn get_all_docs(&self, address: &Address, args: &get::AllDocsArgs) -> Result<Request> {
        get::all_docs(self.target(Scope::Database, address)?, args, &self.transport)
    }

    pub fn put_document(
        &self,
        address: &Address,
        body: Vec<u8>,
        args: &put::DocArgs,
    ) -> Result<Request> {
        put::document(
            self.target(Scope::Document, address)?,
            body,
            args,
            &self.transport,
        )
    }

    pub fn put_attachment(
        &self,
        address: &Address,
        body: Vec<u8>,
        args: &put::AttArgs,
    ) -> Result<Request> {
        put::attachment(
            self.target(Scope::Attachment, address)?,
            body,
            args,
            &self.transport,
        )
    }

    pub fn create_database(&self, address: &Address, args: &create::DbArgs) -> Result<Request> {
        create::database(self.target(Scope::Database, address)?, args, &self.transport)
    }

    pub fn delete_database(&self, address: &Address) -> Result<Request> {
        delete::database(self.target(Scope::Database, address)?, &self.transport)
    }

    pub fn delete_document(
        &self,
        address: &Address,
        args: &delete::RevArgs,
        batch: bool,
    ) -> Result<Request> {
        delete::document(
            self.target(Scope::Document, address)?,
            args,
            batch,
            &self.transport,
        )
    }

    pub fn delete_attachment(&self, address: &Address, args: &delete::RevArgs) -> Result<Request> {
        delete::attachment(self.target(Scope::Attachment, address)?, args, &self.transport)
    }

    /// Sends `request` and renders the response into `dest`.
    pub fn send(&self, request: &Request, output: &OutputSettings, dest: Destination) -> Result<()> {
        let name = output.format.as_deref().unwrap_or(request.default_format);
        let mode = self.registry.select(name)?;
        commands::send(&self.transport, request, mode, &output.flags, dest)
    }

    /// Renders the effective configuration.
    pub fn config_view(
        &self,
        show_secrets: bool,
        output: &OutputSettings,
        dest: Destination,
    ) -> Result<()> {
        let body = commands::config::view(&self.config, show_secrets)?;
        self.render(&body, output, dest)
    }

    /// Renders the list of configured contexts.
    pub fn config_contexts(&self, output: &OutputSettings, dest: Destination) -> Result<()> {
        let body = commands::config::get_contexts(&self.config)?;
        self.render(&body, output, dest)
    }

    fn render(&self, body: &[u8], output: &OutputSettings, dest: Destination) -> Result<()> {
        let name = output
            .format
            .as_deref()
            .unwrap_or(crate::output::DEFAULT_MODE);
        let mode = self.registry.select(name)?;
        commands::render(body, mode, &output.flags, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Context;
    use crate::error::KouchError;
    use crate::output::fixtures::SharedBuffer;
    use crate::resolve::FlagOverrides;
    use crate::transport::memory::MemoryTransport;
    use crate::transport::Method;

    fn config() -> KouchConfig {
        KouchConfig {
            default_context: None,
            contexts: vec![Context {
                name: "local".into(),
                root: Some("http://localhost:5984".into()),
                user: Some("admin".into()),
                password: Some("abc123".into()),
            }],
        }
    }

    fn api(transport: MemoryTransport) -> KouchApi<MemoryTransport> {
        KouchApi::new(transport, config())
    }

    #[test]
    fn test_get_document_end_to_end() {
        let api = api(MemoryTransport::new().with_json(
            Method::Get,
            "/foo/_design/bar",
            r#"{"_rev":"1-a","_id":"_design/bar"}"#,
        ));
        let request = api
            .get_document(&Address::new("foo/_design/bar"), &get::DocArgs::default())
            .unwrap();

        let buffer = SharedBuffer::new();
        api.send(&request, &OutputSettings::default(), Box::new(buffer.clone()))
            .unwrap();
        assert_eq!(
            buffer.contents_str(),
            "{\"_id\":\"_design/bar\",\"_rev\":\"1-a\"}\n"
        );

        let sent = api.transport().requests();
        assert_eq!(sent[0].path, "/foo/_design/bar");
        assert_eq!(sent[0].username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_attachment_from_url_is_raw() {
        let api = api(MemoryTransport::new().with_response(
            Method::Get,
            "/foo/123/foo.txt",
            200,
            &[("Content-Type", "text/plain")],
            b"not json",
        ));
        let request = api
            .get_attachment(&Address::new("http://foo.com/foo/123/foo.txt"), None, false)
            .unwrap();
        assert_eq!(request.options.target.root.as_deref(), Some("http://foo.com"));

        let buffer = SharedBuffer::new();
        api.send(&request, &OutputSettings::default(), Box::new(buffer.clone()))
            .unwrap();
        assert_eq!(buffer.contents_str(), "not json");
    }

    #[test]
    fn test_explicit_format_overrides_default() {
        let api = api(MemoryTransport::new().with_json(Method::Get, "/", r#"{"couchdb":"Welcome"}"#));
        let request = api.get_server(&Address::default()).unwrap();
        let output = OutputSettings {
            format: Some("yaml".into()),
            ..OutputSettings::default()
        };
        let buffer = SharedBuffer::new();
        api.send(&request, &output, Box::new(buffer.clone())).unwrap();
        assert_eq!(buffer.contents_str(), "couchdb: Welcome\n");
    }

    #[test]
    fn test_unknown_format() {
        let api = api(MemoryTransport::new());
        let request = api.get_server(&Address::default()).unwrap();
        let output = OutputSettings {
            format: Some("toml".into()),
            ..OutputSettings::default()
        };
        let err = api
            .send(&request, &output, Box::new(SharedBuffer::new()))
            .unwrap_err();
        assert!(matches!(err, KouchError::UnknownOutputFormat(_)));
        assert!(api.transport().requests().is_empty());
    }

    #[test]
    fn test_conflicting_override() {
        let api = api(MemoryTransport::new());
        let address = Address::new("foo/bar").with_overrides(FlagOverrides {
            database: Some("baz".into()),
            ..FlagOverrides::default()
        });
        let err = api
            .get_document(&address, &get::DocArgs::default())
            .unwrap_err();
        assert_eq!(err.exit_status().code(), 2);
    }

    #[test]
    fn test_config_contexts() {
        let api = api(MemoryTransport::new());
        let buffer = SharedBuffer::new();
        api.config_contexts(&OutputSettings::default(), Box::new(buffer.clone()))
            .unwrap();
        assert_eq!(
            buffer.contents_str(),
            "[{\"default\":true,\"name\":\"local\",\"root\":\"http://localhost:5984\",\"user\":\"admin\"}]\n"
        );
    }

    #[test]
    fn test_config_view_redacts() {
        let api = api(MemoryTransport::new());
        let buffer = SharedBuffer::new();
        api.config_view(false, &OutputSettings::default(), Box::new(buffer.clone()))
            .unwrap();
        assert!(buffer.contents_str().contains("REDACTED"));
        assert!(!buffer.contents_str().contains("abc123"));
    }
}
