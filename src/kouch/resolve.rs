//! # Target Resolver
//!
//! Merges three sources into the final [`Target`] of a command:
//!
//! 1. the address string (parsed by [`crate::target::parse`]),
//! 2. explicit `--database`, `--id` and `--filename` flags,
//! 3. the default context from the config, which only ever supplies the root,
//!    and its credentials when that root is used.
//!
//! A field may come from the address or from a flag, never both. The merge is
//! a fold over `(source, field, value)` assignments in field order (database,
//! document, filename), so when several fields collide the error always names
//! the first of them. A flag for a field the scope has no place for fails at
//! its turn in the same fold.

use crate::config::KouchConfig;
use crate::error::{KouchError, Result};
use crate::target::{parse, Field, Scope, Target};

/// Values given through the explicit target flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub database: Option<String>,
    pub document: Option<String>,
    pub filename: Option<String>,
}

impl FlagOverrides {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Root => None,
            Field::Database => self.database.as_deref(),
            Field::Document => self.document.as_deref(),
            Field::Filename => self.filename.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Address,
    Flag,
}

struct Assignment<'a> {
    source: Source,
    field: Field,
    value: &'a str,
}

/// Resolves `raw` in `scope` against flag overrides and the config's default
/// context.
pub fn resolve(
    scope: Scope,
    raw: &str,
    overrides: &FlagOverrides,
    config: &KouchConfig,
) -> Result<Target> {
    let parsed = parse(scope, raw)?;

    let mut assignments = Vec::new();
    for field in Field::OVERRIDABLE {
        if let Some(value) = parsed.get(field) {
            assignments.push(Assignment {
                source: Source::Address,
                field,
                value,
            });
        }
        if let Some(value) = overrides.get(field) {
            assignments.push(Assignment {
                source: Source::Flag,
                field,
                value,
            });
        }
    }

    let mut merged = Target {
        root: parsed.root.clone(),
        username: parsed.username.clone(),
        password: parsed.password.clone(),
        ..Target::default()
    };
    for assignment in assignments {
        if merged.get(assignment.field).is_some() {
            return Err(KouchError::Conflict {
                flag: assignment.field.flag(),
                field: assignment.field.describe(),
            });
        }
        if !scope.permits(assignment.field) {
            return Err(KouchError::FieldNotInScope {
                flag: assignment.field.flag(),
                scope: scope.name(),
            });
        }
        tracing::trace!(
            field = assignment.field.describe(),
            from_flag = assignment.source == Source::Flag,
            "target field set"
        );
        merged = merged.with(assignment.field, Some(assignment.value.to_string()));
    }

    if let Some(ctx) = config.default_context() {
        if merged.root.is_none() {
            merged = merged.with(Field::Root, ctx.root.clone());
            if !merged.has_credentials() {
                merged = merged.with_credentials(ctx.user.clone(), ctx.password.clone());
            }
        }
    }

    Ok(merged)
}
