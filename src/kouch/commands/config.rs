use crate::config::KouchConfig;
use crate::error::{KouchError, Result};
use serde::Serialize;

const REDACTED: &str = "REDACTED";

/// The effective configuration as JSON, with passwords redacted unless
/// `show_secrets` is set.
pub fn view(config: &KouchConfig, show_secrets: bool) -> Result<Vec<u8>> {
    let mut config = config.clone();
    if !show_secrets {
        for ctx in &mut config.contexts {
            if ctx.password.is_some() {
                ctx.password = Some(REDACTED.to_string());
            }
        }
    }
    serde_json::to_vec(&config).map_err(|e| KouchError::Config(e.to_string()))
}

#[derive(Serialize)]
struct ContextRow<'a> {
    name: &'a str,
    root: Option<&'a str>,
    user: Option<&'a str>,
    default: bool,
}

/// One JSON row per context, marking the one used by default.
pub fn get_contexts(config: &KouchConfig) -> Result<Vec<u8>> {
    let default = config.default_context().map(|c| c.name.as_str());
    let rows: Vec<ContextRow<'_>> = config
        .contexts
        .iter()
        .map(|ctx| ContextRow {
            name: &ctx.name,
            root: ctx.root.as_deref(),
            user: ctx.user.as_deref(),
            default: Some(ctx.name.as_str()) == default,
        })
        .collect();
    serde_json::to_vec(&rows).map_err(|e| KouchError::Config(e.to_string()))
}
