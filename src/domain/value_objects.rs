//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// IP protocol family of an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V4 => "ipv4",
            Self::V6 => "ipv6",
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated IP address.
///
/// Text input goes through `AddressNormalizer`; an already typed `IpAddr`
/// is valid by construction and may be wrapped directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    ip: IpAddr,
    version: IpVersion,
}

impl Address {
    pub fn from_ip(ip: IpAddr) -> Self {
        let version = match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        };
        Self { ip, version }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn version(&self) -> IpVersion {
        self.version
    }

    /// The IPv4 address this address denotes, if any.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) yield their embedded
    /// IPv4 address; IPv4-compatible and other IPv6 forms yield `None`.
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        match self.ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ip)
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Self::from_ip(ip)
    }
}
