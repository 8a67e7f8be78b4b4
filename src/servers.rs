//! Suffix → server table and referral handler overrides.
//!
//! The table is built once at startup, programmatically or from a text
//! file, and is read-only afterwards.
//!
//! ```text
//! # suffix      server                          handler
//! com           whois.verisign-grs.com          gtld
//! nl            whois.domain-registry.nl        nl
//! io            https://gw.example.io/w?q={query}
//! @whois.markmonitor.com  markmonitor
//! ```
//!
//! Lines starting with `@` map a referral address to a handler identity.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, WhoisError};

const REFERRAL_MARKER: char = '@';

/// Where queries for one suffix go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    /// Server specifier (see [`Request::build`](crate::Request::build)).
    pub server: String,
    /// Handler identity, if the authority's output can be parsed.
    pub handler: Option<String>,
}

impl ServerEntry {
    /// Creates an entry without a handler.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            handler: None,
        }
    }

    /// Attaches a handler identity.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }
}

/// Static lookup configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    suffixes: HashMap<String, ServerEntry>,
    referral_handlers: HashMap<String, String>,
}

impl ServerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `suffix` (with or without a leading dot) to `entry`.
    pub fn insert(&mut self, suffix: &str, entry: ServerEntry) {
        self.suffixes.insert(normalize(suffix), entry);
    }

    /// Maps a referral address to a handler identity.
    pub fn insert_referral_handler(&mut self, referral: &str, handler: impl Into<String>) {
        self.referral_handlers
            .insert(referral.trim().to_ascii_lowercase(), handler.into());
    }

    /// Finds the entry for the longest suffix of `query` that is in the
    /// table. Suffixes match whole labels only.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<&ServerEntry> {
        let query = normalize(query);
        let mut candidate = query.as_str();
        loop {
            if let Some(entry) = self.suffixes.get(candidate) {
                return Some(entry);
            }
            let (_, rest) = candidate.split_once('.')?;
            candidate = rest;
        }
    }

    /// Returns the handler override for a referral address.
    #[must_use]
    pub fn referral_handler(&self, referral: &str) -> Option<&str> {
        self.referral_handlers
            .get(&referral.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of suffix entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    /// Returns `true` if no suffix is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Parses the line format shown in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`WhoisError::InvalidConfig`] for a line with too few or too
    /// many fields.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if let Some(referral) = fields[0].strip_prefix(REFERRAL_MARKER) {
                match fields.as_slice() {
                    [_, handler] if !referral.is_empty() => {
                        table.insert_referral_handler(referral, *handler);
                    }
                    _ => return Err(invalid_line(n, line)),
                }
                continue;
            }

            match fields.as_slice() {
                [suffix, server] => table.insert(suffix, ServerEntry::new(*server)),
                [suffix, server, handler] => {
                    table.insert(suffix, ServerEntry::new(*server).with_handler(*handler));
                }
                _ => return Err(invalid_line(n, line)),
            }
        }

        Ok(table)
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// Returns [`WhoisError::Io`] if the file cannot be read, or
    /// [`WhoisError::InvalidConfig`] if a line is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::parse(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            suffixes = table.len(),
            referrals = table.referral_handlers.len(),
            "Loaded server table"
        );
        Ok(table)
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_matches('.').to_ascii_lowercase()
}

fn invalid_line(n: usize, line: &str) -> WhoisError {
    WhoisError::InvalidConfig(format!("line {}: {line}", n + 1))
}
