//! Protocol/port token resolution.
//!
//! Profiles declare their processes as `"udp/1194"`-style tokens; the
//! concrete OpenVPN transport depends on the address family of the listen
//! address (an IPv6 listener needs the `6`-qualified transports).

use strum::Display;

use crate::error::CoreError;

/// Address-family-qualified OpenVPN transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Transport {
    #[strum(serialize = "udp")]
    Udp,
    #[strum(serialize = "udp6")]
    Udp6,
    #[strum(serialize = "tcp-server")]
    TcpServer,
    #[strum(serialize = "tcp6-server")]
    Tcp6Server,
}

impl Transport {
    pub fn is_udp(self) -> bool {
        matches!(self, Self::Udp | Self::Udp6)
    }

    pub fn is_tcp(self) -> bool {
        !self.is_udp()
    }
}

/// Resolve a `proto/port` token against a listen address.
pub fn resolve(token: &str, listen: &str) -> Result<(Transport, u16), CoreError> {
    let (proto, port) = token.split_once('/').ok_or_else(|| CoreError::MalformedProtoPort {
        token: token.to_owned(),
    })?;
    let port: u16 = port.parse().map_err(|_| CoreError::MalformedProtoPort {
        token: token.to_owned(),
    })?;

    let v6 = listen.contains(':');
    let transport = match proto {
        "udp" => {
            if v6 {
                Transport::Udp6
            } else {
                Transport::Udp
            }
        }
        "tcp" => {
            if v6 {
                Transport::Tcp6Server
            } else {
                Transport::TcpServer
            }
        }
        other => {
            return Err(CoreError::UnsupportedProtocol {
                proto: other.to_owned(),
            });
        }
    };

    Ok((transport, port))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn udp_on_v6_listener() {
        assert_eq!(resolve("udp/1194", "::").unwrap(), (Transport::Udp6, 1194));
    }

    #[test]
    fn tcp_on_v4_listener() {
        assert_eq!(
            resolve("tcp/1194", "0.0.0.0").unwrap(),
            (Transport::TcpServer, 1194)
        );
    }

    #[test]
    fn udp_on_v4_listener() {
        assert_eq!(resolve("udp/443", "203.0.113.1").unwrap(), (Transport::Udp, 443));
    }

    #[test]
    fn tcp_on_v6_listener() {
        assert_eq!(
            resolve("tcp/443", "2001:db8::1").unwrap(),
            (Transport::Tcp6Server, 443)
        );
    }

    #[test]
    fn unsupported_protocol_fails() {
        assert!(matches!(
            resolve("sctp/80", "::"),
            Err(CoreError::UnsupportedProtocol { proto }) if proto == "sctp"
        ));
    }

    #[test]
    fn malformed_tokens_fail() {
        assert!(matches!(
            resolve("udp1194", "::"),
            Err(CoreError::MalformedProtoPort { .. })
        ));
        assert!(matches!(
            resolve("udp/many", "::"),
            Err(CoreError::MalformedProtoPort { .. })
        ));
    }

    #[test]
    fn transport_strings() {
        assert_eq!(Transport::Udp6.to_string(), "udp6");
        assert_eq!(Transport::TcpServer.to_string(), "tcp-server");
        assert!(Transport::Udp.is_udp());
        assert!(Transport::Tcp6Server.is_tcp());
    }
}
