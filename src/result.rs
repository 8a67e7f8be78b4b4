//! Lookup result tree.

use serde::Serialize;
use serde_json::{Map, Value};

/// Lookup type recorded when nothing else set one.
pub const DEFAULT_LOOKUP_KIND: &str = "domain";

/// One transport round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    /// Host (raw socket) or URL without query string (HTTP).
    pub server: String,
    /// Argument actually sent.
    pub args: String,
    /// Port contacted.
    pub port: u16,
}

/// Client-side bookkeeping about the authorities consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    /// Append-only, one record per round trip.
    pub servers: Vec<ServerRecord>,

    /// Address of a more specific authority, set by a handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,

    /// Lookup-type tag (`"domain"`, `"ip"`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// The result of a lookup: raw lines, bookkeeping and handler output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    /// Lines exactly as received, in order.
    pub rawdata: Vec<String>,

    /// Servers consulted, referral and type.
    pub registry_info: RegistryInfo,

    /// Handler-defined nested mapping. Never written by the core.
    pub structured_info: Map<String, Value>,

    /// Errors accumulated during the lookup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl LookupResult {
    /// Creates a result holding only raw lines.
    #[must_use]
    pub fn from_raw(rawdata: Vec<String>) -> Self {
        Self {
            rawdata,
            ..Self::default()
        }
    }

    /// Returns the referral address, if a handler reported one.
    #[must_use]
    pub fn referral(&self) -> Option<&str> {
        self.registry_info.referral.as_deref()
    }

    /// Returns the lookup type, falling back to `"domain"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.registry_info
            .kind
            .as_deref()
            .unwrap_or(DEFAULT_LOOKUP_KIND)
    }
}
