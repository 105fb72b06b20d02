use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Default number of variable bindings the store accepts before `set`
/// starts failing.
pub const DEFAULT_CAPACITY: usize = 256;

/// Shell-local state threaded through expansion and command execution.
///
/// The environment contains:
/// - a bounded store of shell variables, created by `set`, read during
///   `$NAME` expansion and never exported to child processes;
/// - `current_dir`: the working directory commands are launched in, moved
///   by `cd` and printed by `pwd`.
///
/// The store deliberately does not mirror the process environment: child
/// processes inherit the real environment on their own, while `$NAME`
/// expansion only ever sees bindings made with `set`.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    capacity: usize,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Create an empty store with the default capacity, with `current_dir`
    /// initialized from `std::env::current_dir()`.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store that will hold at most `capacity` bindings.
    pub fn with_capacity(capacity: usize) -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            capacity,
            current_dir,
        }
    }

    /// Get the value bound to a variable name, if any.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Bind or update a variable.
    ///
    /// Updating an existing binding always succeeds; creating a new one
    /// fails once the store is at capacity.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.vars.contains_key(&name) && self.vars.len() >= self.capacity {
            return Err(anyhow!("environment storage full"));
        }
        self.vars.insert(name, value.into());
        Ok(())
    }

    /// Remove a binding; unknown names are reported instead of ignored.
    pub fn unset(&mut self, name: &str) -> Result<()> {
        match self.vars.remove(name) {
            Some(_) => Ok(()),
            None => Err(anyhow!("unset: {name}: not set")),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
