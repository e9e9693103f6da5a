//! Top-level shortcuts that stand in for `<plugin> <method>`.
//!
//! Every alias is globally unique. Registering a method's aliases either
//! claims all of them or none, so a clash never leaves a half-registered
//! method behind.

use std::collections::BTreeMap;

use clap::Command;

use crate::error::RegistrationError;
use crate::schema::MethodDescriptor;

/// Where an alias points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    alias: String,
    plugin: String,
    method: String,
    command: String,
}

impl AliasEntry {
    /// The alias itself.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Plugin owning the target method.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Target method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Sub-command token the alias expands to.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Owner rendered as `plugin.method`.
    #[must_use]
    pub fn owner(&self) -> String {
        format!("{}.{}", self.plugin, self.method)
    }
}

/// Alias table plus the help entries shown for aliased methods.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: BTreeMap<String, AliasEntry>,
    commands: BTreeMap<String, Command>,
}

impl AliasRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims every alias of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateAlias`] if any alias is already
    /// taken or repeated; nothing is registered in that case.
    pub fn register(&mut self, descriptor: &MethodDescriptor) -> Result<(), RegistrationError> {
        let Some(command) = descriptor.alias_command() else {
            return Ok(());
        };
        let mut claimed: BTreeMap<String, AliasEntry> = BTreeMap::new();
        for alias in descriptor.aliases() {
            let entry = AliasEntry {
                alias: alias.clone(),
                plugin: descriptor.plugin().to_owned(),
                method: descriptor.name().to_owned(),
                command: descriptor.command_name().to_owned(),
            };
            if let Some(existing) = self.entries.get(alias).or_else(|| claimed.get(alias)) {
                return Err(RegistrationError::DuplicateAlias {
                    alias: alias.clone(),
                    owner: existing.owner(),
                });
            }
            claimed.insert(alias.clone(), entry);
        }
        self.commands
            .insert(command.get_name().to_owned(), command);
        self.entries.append(&mut claimed);
        Ok(())
    }

    /// Drops every alias owned by `plugin`.
    pub fn release(&mut self, plugin: &str) {
        self.entries.retain(|_, entry| entry.plugin != plugin);
        let entries = &self.entries;
        self.commands
            .retain(|primary, _| entries.contains_key(primary));
    }

    /// Looks up the target of `alias`.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<&AliasEntry> {
        self.entries.get(alias)
    }

    /// Whether `alias` is registered.
    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Every registered alias, sorted.
    pub fn entries(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.values()
    }

    /// Top-level help entries, one per aliased method.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Number of registered aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alias is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
