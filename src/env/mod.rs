//! Explicit execution context for subprocess invocations.
//!
//! Instead of mutating the process-wide environment table, every variable a
//! spawned command should see lives in an [`EnvContext`] that is threaded
//! through the runner and applied per command. Temporary overrides (such as
//! pinning `LC_ALL` for a single invocation) are set on the `Command`
//! itself, so the context is never left in a transient state.

pub mod sync;

use indexmap::IndexMap;
use std::path::Path;
use std::process::Command;

/// Insertion-ordered key/value set applied to every spawned command.
#[derive(Debug, Clone, Default)]
pub struct EnvContext {
    vars: IndexMap<String, String>,
}

impl EnvContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        let mut ctx = Self::new();
        for (key, value) in std::env::vars() {
            ctx.vars.insert(key, value);
        }
        ctx
    }

    /// Set a variable, preserving its position if it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Get a variable's value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Remove a variable, returning its prior value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.shift_remove(key)
    }

    /// Whether a variable is present.
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Merge a profile's variables into the context, in their map order.
    pub fn extend(&mut self, vars: &IndexMap<String, String>) {
        for (key, value) in vars {
            self.set(key.clone(), value.clone());
        }
    }

    /// Append a directory to `PATH` (creating it when unset).
    pub fn append_path(&mut self, dir: &Path) {
        let dir = dir.display().to_string();
        let path = match self.get("PATH") {
            Some(current) if !current.is_empty() => format!("{}:{}", current, dir),
            _ => dir,
        };
        self.set("PATH", path);
    }

    /// Restore a variable to a prior value, removing it when there was none.
    pub fn restore(&mut self, key: &str, prior: Option<String>) {
        match prior {
            Some(value) => self.set(key, value),
            None => {
                self.remove(key);
            }
        }
    }

    /// Configure a command to run with exactly this context's variables.
    pub fn apply(&self, command: &mut Command) {
        command.env_clear();
        command.envs(&self.vars);
    }

    /// Iterate variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }
}
