//! Socket and HTTP transports.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use crate::collect::collect_lines;
use crate::html::html_to_lines;
use crate::query::Status;

/// Connection parameters for [`open_connection`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// Bound on each connect attempt and on reads and writes afterwards.
    pub timeout: Duration,
}

/// Opens a TCP connection, retrying on failure.
///
/// Makes `max_retries + 1` attempts and sleeps `retry_delay` between failed
/// ones (never after the last). `status` is `Ready` during an attempt, `Ok`
/// once connected and `Error` after a failed attempt. The returned stream
/// has its read and write timeouts set.
///
/// # Errors
///
/// Returns the last connect error once all attempts are exhausted.
pub fn open_connection(
    host: &str,
    port: u16,
    policy: ConnectPolicy,
    status: &mut Status,
) -> io::Result<TcpStream> {
    let stream = retry_connect(policy, status, |attempt| {
        tracing::debug!(host = %host, port, attempt, "Connecting");
        connect_once(host, port, policy.timeout)
    })
    .inspect_err(|e| {
        tracing::warn!(
            host = %host,
            port,
            attempts = policy.max_retries + 1,
            error = %e,
            "Giving up on connection"
        );
    })?;

    stream.set_read_timeout(Some(policy.timeout))?;
    stream.set_write_timeout(Some(policy.timeout))?;
    Ok(stream)
}

/// Runs `connect` until it succeeds or `max_retries + 1` attempts failed,
/// sleeping `retry_delay` between attempts.
fn retry_connect<T>(
    policy: ConnectPolicy,
    status: &mut Status,
    mut connect: impl FnMut(u32) -> io::Result<T>,
) -> io::Result<T> {
    let mut last_err = io::Error::new(io::ErrorKind::NotConnected, "no connection attempt made");

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            thread::sleep(policy.retry_delay);
        }

        *status = Status::Ready;
        match connect(attempt) {
            Ok(conn) => {
                *status = Status::Ok;
                return Ok(conn);
            }
            Err(e) => {
                *status = Status::Error;
                tracing::debug!(attempt, error = %e, "Connect attempt failed");
                last_err = e;
            }
        }
    }
    Err(last_err)
}

fn connect_once(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    let mut last_err = io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("{host} did not resolve to any address"),
    );
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

/// Sends one query line and collects the reply until the peer closes.
///
/// # Errors
///
/// Returns an error if the query cannot be written. Read failures end
/// collection early instead.
pub fn exchange(mut stream: TcpStream, args: &str, buffer_size: usize) -> io::Result<Vec<String>> {
    stream.write_all(format!("{}\r\n", args.trim()).as_bytes())?;
    stream.flush()?;
    Ok(collect_lines(stream, buffer_size))
}

/// Fetches an HTML page and converts it to text lines.
///
/// Returns `None` on any failure: connect error, non-success status or an
/// unreadable body.
#[must_use]
pub fn fetch_http(url: &str, timeout: Duration) -> Option<Vec<String>> {
    let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build HTTP client");
            return None;
        }
    };

    let body = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text);

    match body {
        Ok(body) => {
            let lines = html_to_lines(&body);
            tracing::info!(url = %url, lines = lines.len(), "Fetched HTTP gateway page");
            Some(lines)
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "HTTP fetch failed");
            None
        }
    }
}
