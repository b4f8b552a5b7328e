use crate::error::{KouchError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.yaml";
const CONFIG_ENV: &str = "KOUCHCONFIG";

/// A named server connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Context {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Configuration for kouch, stored as YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct KouchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_context: Option<String>,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl KouchConfig {
    /// Picks the config file: an explicit path, then `$KOUCHCONFIG`, then the
    /// platform config directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        ProjectDirs::from("io", "kivik", "kouch").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Load config from the given file, or return defaults if not found
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: KouchConfig = serde_yaml::from_str(&content)
            .map_err(|e| KouchError::Config(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        for (i, ctx) in self.contexts.iter().enumerate() {
            if ctx.name.is_empty() {
                return Err(KouchError::Config(format!("context #{} has no name", i + 1)));
            }
            if self.contexts[..i].iter().any(|c| c.name == ctx.name) {
                return Err(KouchError::Config(format!(
                    "context '{}' is defined more than once",
                    ctx.name
                )));
            }
        }
        if let Some(name) = &self.default_context {
            if self.context(name).is_none() {
                return Err(KouchError::Config(format!(
                    "default context '{}' is not defined",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// The context named by `default-context`, or the only context when
    /// exactly one is defined.
    pub fn default_context(&self) -> Option<&Context> {
        match &self.default_context {
            Some(name) => self.context(name),
            None if self.contexts.len() == 1 => self.contexts.first(),
            None => None,
        }
    }

    /// Applies `--context` and `--root` on top of the loaded file.
    ///
    /// `--root` replaces the root of the selected context, creating an
    /// anonymous one when nothing is selected.
    pub fn with_overrides(mut self, context: Option<&str>, root: Option<&str>) -> Result<Self> {
        if let Some(name) = context {
            if self.context(name).is_none() {
                return Err(KouchError::Config(format!("context '{}' is not defined", name)));
            }
            self.default_context = Some(name.to_string());
        }

        if let Some(root) = root.filter(|r| !r.is_empty()) {
            let selected = self.default_context().map(|c| c.name.clone());
            match selected {
                Some(name) => {
                    if let Some(ctx) = self.contexts.iter_mut().find(|c| c.name == name) {
                        ctx.root = Some(root.to_string());
                    }
                    self.default_context = Some(name);
                }
                None => {
                    self.contexts.push(Context {
                        name: "--root".to_string(),
                        root: Some(root.to_string()),
                        ..Context::default()
                    });
                    self.default_context = Some("--root".to_string());
                }
            }
        }
        Ok(self)
    }
}
