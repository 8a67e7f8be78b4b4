//! # whois-client
//!
//! A registry lookup client for WHOIS, RWHOIS and HTML WHOIS gateways.
//!
//! Given a query (usually a domain name or an IP address) the client picks
//! the authority for its suffix, sends the query over a raw TCP line
//! protocol or an HTTP GET, and collects the answer as text lines. If a
//! [`Handler`] is registered for the authority it turns those lines into
//! structured fields. When the handler reports a referral to a more
//! specific authority, the client queries that one too and merges the
//! second answer into the first.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use whois_client::{
//!     ClientConfig, HandlerOutput, HandlerRegistry, LookupResult, ServerEntry, ServerTable,
//!     WhoisClient,
//! };
//!
//! let mut servers = ServerTable::new();
//! servers.insert("com", ServerEntry::new("whois.verisign-grs.com").with_handler("verisign"));
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("verisign", || {
//!     |mut result: LookupResult, _query: &str, _deep: bool| {
//!         result.registry_info.referral = result
//!             .rawdata
//!             .iter()
//!             .find_map(|l| l.strip_prefix("Registrar WHOIS Server:"))
//!             .map(|s| s.trim().to_string());
//!         HandlerOutput::from(result)
//!     }
//! });
//!
//! let client = WhoisClient::new(ClientConfig::new(), servers, handlers);
//! let result = client.lookup("example.com", true);
//! println!("{:#?}", result.registry_info.servers);
//! ```
//!
//! ## Failure model
//!
//! Lookups never return an error. Connection failures, missing handlers
//! and handler-reported problems are collected in
//! [`LookupResult::errors`] next to whatever data could be gathered.
//! Every call goes to the network; nothing is cached.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod collect;
pub mod config;
pub mod error;
pub mod handler;
pub mod html;
pub mod merge;
pub mod query;
pub mod result;
pub mod servers;
pub mod transport;
pub mod util;

pub use client::WhoisClient;
pub use collect::collect_lines;
pub use config::{ClientConfig, DEFAULT_PORT};
pub use error::{Result, WhoisError};
pub use handler::{GENERIC_HANDLER, Handler, HandlerOutput, HandlerRegistry};
pub use html::html_to_lines;
pub use merge::merge;
pub use query::{Query, Request, Status, Transport};
pub use result::{LookupResult, RegistryInfo, ServerRecord};
pub use servers::{ServerEntry, ServerTable};
pub use util::{CallerIdentity, LocalIdentity};
