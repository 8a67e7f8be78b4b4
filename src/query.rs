//! Per-lookup session state and request building.
//!
//! A [`Query`] carries everything one lookup mutates: the server specifier,
//! the resolved transport target, the handler identity and the errors
//! accumulated along the way. [`Request::build`] turns a server specifier
//! and a query text into a transport-ready request.

use crate::config::ClientConfig;
use crate::error::WhoisError;
use crate::result::ServerRecord;
use crate::util::CallerIdentity;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";
const RWHOIS_PREFIX: &str = "rwhois://";

/// Connection status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing attempted yet.
    #[default]
    Unset,
    /// A connection attempt is in progress.
    Ready,
    /// The last connection attempt succeeded.
    Ok,
    /// The last attempt failed, or no server is configured.
    Error,
}

/// How a request reaches its authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// One CRLF-terminated line over TCP, read until the peer closes.
    Socket {
        /// Host to connect to.
        host: String,
        /// Port to connect to.
        port: u16,
    },
    /// HTTP(S) GET of an HTML page.
    Http {
        /// Full URL including the substituted query string.
        url: String,
    },
}

/// A transport-ready request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Where and how to send it.
    pub transport: Transport,
    /// Server as recorded in the result (host, or URL without query).
    pub server: String,
    /// Argument sent to the authority.
    pub args: String,
    /// Port recorded in the result.
    pub port: u16,
}

impl Request {
    /// Builds a request for `query` against `server`.
    ///
    /// `server` may be `host`, `host:port`, `rwhois://host:port`,
    /// `host?template` or an `http(s)://` URL with an optional `?template`.
    /// Templates have `{query}`, `{version}`, `{ip}` and `{hname}` replaced;
    /// the caller identity is consulted only for placeholders that appear.
    #[must_use]
    pub fn build(
        server: &str,
        query: &str,
        config: &ClientConfig,
        identity: &dyn CallerIdentity,
    ) -> Self {
        let server = server.trim();

        if server.starts_with(HTTP_PREFIX) || server.starts_with(HTTPS_PREFIX) {
            let (base, template) = server.split_once('?').unwrap_or((server, ""));
            let args = if template.is_empty() {
                String::new()
            } else {
                substitute(template, query, &config.version, identity)
            };
            let url = if args.is_empty() {
                base.to_string()
            } else {
                format!("{base}?{args}")
            };
            let port = http_port(base);
            return Self {
                transport: Transport::Http { url },
                server: base.to_string(),
                args,
                port,
            };
        }

        // A leading '?' is not a template separator.
        let (host, args) = match server.find('?') {
            Some(pos) if pos > 0 => (
                server[..pos].trim(),
                substitute(server[pos + 1..].trim(), query, &config.version, identity),
            ),
            _ => (server, query.to_string()),
        };

        let host = host.strip_prefix(RWHOIS_PREFIX).unwrap_or(host);
        let (host, port) = split_port(host, config.port);

        Self {
            transport: Transport::Socket {
                host: host.to_string(),
                port,
            },
            server: host.to_string(),
            args,
            port,
        }
    }
}

/// Explicit URL port, else the scheme default.
fn http_port(base: &str) -> u16 {
    reqwest::Url::parse(base)
        .ok()
        .and_then(|url| url.port_or_known_default())
        .unwrap_or(if base.starts_with(HTTPS_PREFIX) { 443 } else { 80 })
}

fn split_port(host: &str, default_port: u16) -> (&str, u16) {
    match host.find(':') {
        Some(pos) if pos > 0 => {
            let (name, port) = (host[..pos].trim(), host[pos + 1..].trim());
            match port.parse() {
                Ok(port) => (name, port),
                Err(_) => {
                    tracing::warn!(host = %host, default_port, "Unparsable port in server specifier, using default");
                    (name, default_port)
                }
            }
        }
        _ => (host, default_port),
    }
}

/// Replaces every placeholder in `template`.
///
/// `{ip}` and `{hname}` are resolved only when present; reverse DNS is slow.
pub fn substitute(
    template: &str,
    query: &str,
    version: &str,
    identity: &dyn CallerIdentity,
) -> String {
    let mut args = template
        .replace("{query}", query)
        .replace("{version}", version);

    let wants_ip = args.contains("{ip}");
    let wants_hname = args.contains("{hname}");
    if wants_ip || wants_hname {
        let ip = identity.ip();
        if wants_ip {
            args = args.replace("{ip}", &ip);
        }
        if wants_hname {
            args = args.replace("{hname}", &identity.hostname(&ip));
        }
    }
    args
}

/// Mutable state for one logical lookup.
///
/// Created per top-level call and owned by it; never share one between
/// concurrent lookups.
#[derive(Debug, Default)]
pub struct Query {
    /// Text being looked up.
    pub text: String,
    /// Server specifier; `None` until one is resolved.
    pub server: Option<String>,
    /// Handler identity for the current authority.
    pub handler: Option<String>,
    /// Lookup-type tag, copied into the result.
    pub kind: Option<String>,
    /// The request most recently built from this session.
    pub request: Option<Request>,
    /// Connection status.
    pub status: Status,
    /// Errors accumulated so far.
    pub errors: Vec<WhoisError>,
}

impl Query {
    /// Creates a session whose server is resolved from the server table.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a session against an explicit server specifier.
    #[must_use]
    pub fn with_server(text: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            server: Some(server.into()),
            ..Self::default()
        }
    }

    /// Sets the handler identity.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Sets the lookup-type tag.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Returns the bookkeeping record for the current round trip.
    ///
    /// Falls back to the query text for empty arguments and to port 43
    /// when no request was built.
    #[must_use]
    pub fn server_record(&self) -> ServerRecord {
        let (server, args, port) = self.request.as_ref().map_or_else(
            || (self.server.clone().unwrap_or_default(), String::new(), 0),
            |r| (r.server.clone(), r.args.clone(), r.port),
        );
        ServerRecord {
            server,
            args: if args.is_empty() { self.text.clone() } else { args },
            port: if port == 0 { crate::config::DEFAULT_PORT } else { port },
        }
    }

    /// Error messages accumulated so far.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::tests::CountingIdentity;

    fn build(server: &str, query: &str) -> (Request, CountingIdentity) {
        let identity = CountingIdentity::default();
        let config = ClientConfig::new().with_version("test-1.0");
        (Request::build(server, query, &config, &identity), identity)
    }

    #[test]
    fn plain_host_uses_default_port_and_raw_query() {
        let (r, _) = build("whois.example.net", "example.net");
        assert_eq!(
            r.transport,
            Transport::Socket {
                host: "whois.example.net".into(),
                port: 43
            }
        );
        assert_eq!(r.args, "example.net");
        assert_eq!(r.server, "whois.example.net");
    }

    #[test]
    fn explicit_port_and_rwhois_prefix() {
        let (r, _) = build("rwhois://rwhois.example.net:4321", "192.0.2.1");
        assert_eq!(
            r.transport,
            Transport::Socket {
                host: "rwhois.example.net".into(),
                port: 4321
            }
        );
        assert_eq!(r.port, 4321);
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        let (r, _) = build("whois.example.net:http", "x");
        assert_eq!(r.port, 43);
        assert_eq!(r.server, "whois.example.net");
    }

    #[test]
    fn template_replaces_every_occurrence() {
        let (r, identity) = build("whois.example.net?{query} {version} {ip} {query}", "example.org");
        assert_eq!(r.args, "example.org test-1.0 192.0.2.7 example.org");
        assert_eq!(r.server, "whois.example.net");
        assert_eq!(identity.ip_calls(), 1);
        assert_eq!(identity.hostname_calls(), 0);
    }

    #[test]
    fn hostname_resolved_only_when_referenced() {
        let (r, identity) = build("whois.example.net?-V {version} {hname} {query}", "x");
        assert_eq!(r.args, "-V test-1.0 client.example.test x");
        assert_eq!(identity.hostname_calls(), 1);

        let (_, identity) = build("whois.example.net?{query}", "x");
        assert_eq!(identity.ip_calls(), 0);
        assert_eq!(identity.hostname_calls(), 0);
    }

    #[test]
    fn leading_question_mark_is_not_a_template() {
        let (r, _) = build("?odd", "x");
        assert_eq!(r.args, "x");
    }

    #[test]
    fn http_specifier_builds_url() {
        let (r, _) = build("https://gw.example.net/whois?domain={query}", "example.io");
        assert_eq!(
            r.transport,
            Transport::Http {
                url: "https://gw.example.net/whois?domain=example.io".into()
            }
        );
        assert_eq!(r.server, "https://gw.example.net/whois");
        assert_eq!(r.args, "domain=example.io");
        assert_eq!(r.port, 443);

        let (r, _) = build("http://gw.example.net/lookup", "example.io");
        assert_eq!(
            r.transport,
            Transport::Http {
                url: "http://gw.example.net/lookup".into()
            }
        );
        assert_eq!(r.port, 80);
    }

    #[test]
    fn http_specifier_records_explicit_port() {
        let (r, _) = build("https://gw.example.net:8443/whois?q={query}", "example.io");
        assert_eq!(r.server, "https://gw.example.net:8443/whois");
        assert_eq!(r.port, 8443);

        let (r, _) = build("http://127.0.0.1:8080/w", "example.io");
        assert_eq!(r.port, 8080);
    }

    #[test]
    fn server_record_falls_back_to_query_and_port() {
        let q = Query::with_server("example.net", "whois.example.net");
        let record = q.server_record();
        assert_eq!(record.server, "whois.example.net");
        assert_eq!(record.args, "example.net");
        assert_eq!(record.port, 43);
    }
}
