//! Caller identity used in argument templates.

use std::ffi::CStr;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Any routable address works; UDP `connect` only consults the route table.
const ROUTE_PROBE: &str = "192.0.2.1:43";

const HOST_BUF_LEN: usize = 1025;

/// Supplies the caller's address and hostname for `{ip}` and `{hname}`.
pub trait CallerIdentity: Send + Sync {
    /// The caller's IP address.
    fn ip(&self) -> String;

    /// The reverse-DNS name of `ip`, or `ip` itself when it has none.
    fn hostname(&self, ip: &str) -> String;
}

/// Identity derived from the local host.
///
/// The address is the one the kernel would use for outbound traffic; the
/// hostname comes from `getnameinfo(3)`.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    ip: Option<IpAddr>,
}

impl LocalIdentity {
    /// Creates an identity that probes the outbound address.
    #[must_use]
    pub const fn new() -> Self {
        Self { ip: None }
    }

    /// Creates an identity with a fixed address (e.g. behind NAT).
    #[must_use]
    pub const fn with_ip(ip: IpAddr) -> Self {
        Self { ip: Some(ip) }
    }
}

impl CallerIdentity for LocalIdentity {
    fn ip(&self) -> String {
        self.ip
            .or_else(outbound_ip)
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .to_string()
    }

    fn hostname(&self, ip: &str) -> String {
        ip.parse()
            .ok()
            .and_then(reverse_lookup)
            .unwrap_or_else(|| ip.to_string())
    }
}

fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE).ok()?;
    Some(socket.local_addr().ok()?.ip())
}

/// Resolves the PTR name of `ip`. `None` if it has no name.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reverse_lookup(ip: IpAddr) -> Option<String> {
    let mut host = [0 as libc::c_char; HOST_BUF_LEN];

    let rc = match ip {
        IpAddr::V4(v4) => {
            // SAFETY: `sockaddr_in` is plain old data; all-zero is valid.
            let mut addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
            addr.sin_family = libc::AF_INET as libc::sa_family_t;
            addr.sin_addr.s_addr = u32::from_ne_bytes(v4.octets());
            #[cfg(any(
                target_vendor = "apple",
                target_os = "freebsd",
                target_os = "dragonfly",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            {
                addr.sin_len = std::mem::size_of::<libc::sockaddr_in>() as u8;
            }
            // SAFETY: `addr` and `host` outlive the call and the lengths
            // passed match their sizes.
            unsafe {
                libc::getnameinfo(
                    std::ptr::from_ref(&addr).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                    host.as_mut_ptr(),
                    HOST_BUF_LEN as libc::socklen_t,
                    std::ptr::null_mut(),
                    0,
                    libc::NI_NAMEREQD,
                )
            }
        }
        IpAddr::V6(v6) => {
            // SAFETY: `sockaddr_in6` is plain old data; all-zero is valid.
            let mut addr: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
            addr.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            addr.sin6_addr.s6_addr = v6.octets();
            #[cfg(any(
                target_vendor = "apple",
                target_os = "freebsd",
                target_os = "dragonfly",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            {
                addr.sin6_len = std::mem::size_of::<libc::sockaddr_in6>() as u8;
            }
            // SAFETY: as above.
            unsafe {
                libc::getnameinfo(
                    std::ptr::from_ref(&addr).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                    host.as_mut_ptr(),
                    HOST_BUF_LEN as libc::socklen_t,
                    std::ptr::null_mut(),
                    0,
                    libc::NI_NAMEREQD,
                )
            }
        }
    };

    if rc != 0 {
        tracing::debug!(ip = %ip, rc, "Reverse lookup found no name");
        return None;
    }

    // SAFETY: on success getnameinfo wrote a NUL-terminated string into `host`.
    let name = unsafe { CStr::from_ptr(host.as_ptr()) };
    Some(name.to_string_lossy().into_owned())
}
