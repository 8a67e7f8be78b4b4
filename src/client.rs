//! The lookup client: raw queries, handler dispatch and deep lookups.

use std::fmt;

use crate::config::ClientConfig;
use crate::error::WhoisError;
use crate::handler::{GENERIC_HANDLER, HandlerRegistry};
use crate::merge::merge;
use crate::query::{Query, Request, Status, Transport};
use crate::result::{DEFAULT_LOOKUP_KIND, LookupResult};
use crate::servers::ServerTable;
use crate::transport::{ConnectPolicy, exchange, fetch_http, open_connection};
use crate::util::{CallerIdentity, LocalIdentity};

/// Registry lookup client.
///
/// Holds only read-only configuration, so one client can serve many
/// concurrent lookups; each lookup gets its own [`Query`] session.
///
/// # Example
///
/// ```rust,ignore
/// use whois_client::{ClientConfig, HandlerRegistry, ServerTable, WhoisClient};
///
/// let servers = ServerTable::load("servers.conf")?;
/// let client = WhoisClient::new(ClientConfig::new(), servers, HandlerRegistry::new());
///
/// let result = client.lookup("example.com", true);
/// for line in &result.rawdata {
///     println!("{line}");
/// }
/// ```
pub struct WhoisClient {
    config: ClientConfig,
    servers: ServerTable,
    handlers: HandlerRegistry,
    identity: Box<dyn CallerIdentity>,
}

impl WhoisClient {
    /// Creates a client using the local host as caller identity.
    #[must_use]
    pub fn new(config: ClientConfig, servers: ServerTable, handlers: HandlerRegistry) -> Self {
        Self {
            config,
            servers,
            handlers,
            identity: Box::new(LocalIdentity::new()),
        }
    }

    /// Replaces the caller identity used for `{ip}` and `{hname}`.
    #[must_use]
    pub fn with_identity(mut self, identity: impl CallerIdentity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the server table.
    #[must_use]
    pub const fn servers(&self) -> &ServerTable {
        &self.servers
    }

    /// Queries the session's server and returns the raw lines.
    ///
    /// Returns an empty vec when no server is configured or the authority
    /// cannot be reached; the reason is pushed onto `session.errors`.
    ///
    /// # Panics
    ///
    /// HTTP gateways are fetched with `reqwest::blocking`, which panics when
    /// called from inside an async runtime. Call this from a plain thread
    /// or through `tokio::task::spawn_blocking`.
    pub fn fetch_raw_lines(&self, session: &mut Query) -> Vec<String> {
        let Some(server) = session.server.clone() else {
            session.status = Status::Error;
            session.errors.push(WhoisError::NoServerConfigured);
            return Vec::new();
        };

        let request = Request::build(&server, &session.text, &self.config, self.identity.as_ref());
        session.request = Some(request.clone());

        let lines = match &request.transport {
            Transport::Http { url } => {
                session.status = Status::Ready;
                fetch_http(url, self.config.timeout).inspect(|_| session.status = Status::Ok)
            }
            Transport::Socket { host, port } => self.query_socket(host, *port, &request.args, session),
        };

        match lines {
            Some(lines) => {
                tracing::info!(server = %request.server, lines = lines.len(), "Received response");
                lines
            }
            None => {
                session.status = Status::Error;
                session.errors.push(WhoisError::ConnectFailed {
                    server: request.server,
                });
                Vec::new()
            }
        }
    }

    fn query_socket(&self, host: &str, port: u16, args: &str, session: &mut Query) -> Option<Vec<String>> {
        let policy = ConnectPolicy {
            max_retries: self.config.max_retries,
            retry_delay: self.config.retry_delay,
            timeout: self.config.timeout,
        };
        let stream = open_connection(host, port, policy, &mut session.status).ok()?;
        match exchange(stream, args, self.config.buffer_size) {
            Ok(lines) => Some(lines),
            Err(e) => {
                tracing::warn!(host = %host, port, error = %e, "Failed to send query");
                None
            }
        }
    }

    /// Looks up `query`, resolving its server from the server table.
    ///
    /// With `follow_referral`, a referral reported by the handler is
    /// queried and its structured data merged in.
    ///
    /// # Panics
    ///
    /// Panics when run inside an async runtime and the lookup reaches an
    /// HTTP gateway, since those are fetched with `reqwest::blocking`. From
    /// async code, wrap the call in `tokio::task::spawn_blocking`.
    #[must_use]
    pub fn lookup(&self, query: &str, follow_referral: bool) -> LookupResult {
        let mut session = Query::new(query);
        if let Some(entry) = self.servers.resolve(query) {
            session.server = Some(entry.server.clone());
            session.handler.clone_from(&entry.handler);
        }
        self.lookup_query(session, follow_referral)
    }

    /// Runs a lookup for a prepared session.
    ///
    /// # Panics
    ///
    /// Same as [`WhoisClient::lookup`]: not callable from async context.
    #[must_use]
    pub fn lookup_query(&self, mut session: Query, follow_referral: bool) -> LookupResult {
        if session.server.is_none() {
            session.status = Status::Error;
            session.errors.push(WhoisError::NoServerConfigured);
            tracing::warn!(query = %session.text, "No server configured");
            return LookupResult {
                errors: session.error_messages(),
                ..LookupResult::default()
            };
        }

        let rawdata = self.fetch_raw_lines(&mut session);
        let mut result = LookupResult::from_raw(rawdata.clone());
        result.registry_info.servers.push(session.server_record());

        let handler = session.handler.clone().filter(|_| !rawdata.is_empty());
        if let Some(handler) = handler {
            // The handler sees the tree without bookkeeping; servers it
            // reports are appended after ours.
            let servers = std::mem::take(&mut result.registry_info.servers);
            result = self.dispatch(
                &mut session,
                result,
                &handler,
                self.config.generic_recursion,
                follow_referral,
            );
            let reported = std::mem::replace(&mut result.registry_info.servers, servers);
            result.registry_info.servers.extend(reported);

            if result.rawdata.is_empty() {
                result.rawdata = rawdata;
            }

            if follow_referral {
                result = self.deep_lookup(&mut session, result);
            }
        }

        if result.registry_info.kind.is_none() {
            result.registry_info.kind = Some(
                session
                    .kind
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOOKUP_KIND.to_string()),
            );
        }
        result.errors = session.error_messages();
        result
    }

    /// Runs handler `handler_id` over `result`.
    ///
    /// A missing handler is recorded as an error and leaves `result`
    /// unchanged. The generic handler only runs when
    /// `allow_generic_recursion` is set.
    #[must_use]
    pub fn dispatch(
        &self,
        session: &mut Query,
        result: LookupResult,
        handler_id: &str,
        allow_generic_recursion: bool,
        deep_lookup: bool,
    ) -> LookupResult {
        let Some(handler) = self.handlers.get(handler_id) else {
            tracing::warn!(handler = %handler_id, "Handler not registered");
            session.errors.push(WhoisError::HandlerNotFound {
                id: handler_id.to_string(),
            });
            return result;
        };

        if handler_id == GENERIC_HANDLER && !allow_generic_recursion {
            tracing::debug!(handler = %handler_id, "Generic handler disabled, skipping");
            return result;
        }

        tracing::debug!(handler = %handler_id, query = %session.text, "Dispatching handler");
        let output = handler.parse(result, &session.text, deep_lookup);
        if let Some(error) = output.error {
            session.errors.push(WhoisError::HandlerReported(error));
        }
        output.result
    }

    /// Follows the referral in `result`, if any, and merges what the
    /// referral's handler extracts.
    ///
    /// Never fails: an unreachable referral, an empty answer or a missing
    /// handler leaves `result` without extra structured data. Once the
    /// referral has answered it is cleared from `registry_info`, so a
    /// result carries a referral only while it is still unfollowed.
    #[must_use]
    pub fn deep_lookup(&self, session: &mut Query, mut result: LookupResult) -> LookupResult {
        let Some(referral) = result.registry_info.referral.clone() else {
            return result;
        };

        tracing::debug!(referral = %referral, query = %session.text, "Following referral");
        session.server = Some(referral.clone());
        let subraw = self.fetch_raw_lines(session);
        if subraw.is_empty() {
            if session.errors.last().is_some_and(WhoisError::is_connect_failure) {
                tracing::warn!(referral = %referral, "Referral unreachable, keeping first answer");
            }
            return result;
        }

        result.registry_info.servers.push(session.server_record());
        result.registry_info.referral = None;
        result.rawdata.clone_from(&subraw);

        session.handler = self.referral_handler(&referral);
        let Some(handler) = session.handler.clone() else {
            tracing::debug!(referral = %referral, "No handler for referral");
            return result;
        };

        let sub = self.dispatch(
            session,
            LookupResult::from_raw(subraw),
            &handler,
            self.config.generic_recursion,
            false,
        );
        result.structured_info = merge(
            std::mem::take(&mut result.structured_info),
            sub.structured_info,
        );
        result
    }

    /// Picks a handler for a referral: the override table first, then the
    /// second label of the referral host if such a handler is registered.
    fn referral_handler(&self, referral: &str) -> Option<String> {
        if let Some(handler) = self.servers.referral_handler(referral) {
            return Some(handler.to_string());
        }

        let request = Request::build(referral, "", &self.config, self.identity.as_ref());
        let label = request.server.split('.').nth(1)?.to_ascii_lowercase();
        self.handlers.contains(&label).then_some(label)
    }
}

impl fmt::Debug for WhoisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhoisClient")
            .field("config", &self.config)
            .field("servers", &self.servers)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
