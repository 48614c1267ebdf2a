//! Address Normalizer
//!
//! Turns untrusted text (query parameters, forwarding headers) into a
//! validated [`Address`].

use crate::domain::value_objects::Address;
use std::net::{IpAddr, Ipv6Addr};

/// Raw text was not an IPv4 or IPv6 literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid IP address: {input:?}")]
pub struct InvalidAddress {
    pub input: String,
}

impl InvalidAddress {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Parser for textual IP addresses.
///
/// IPv4 must be a dotted quad of decimal octets (0-255, no leading zeros).
/// IPv6 may appear bare or in brackets, as forwarding proxies sometimes
/// write it. Hostnames, ports, prefixes and zone ids are rejected.
pub struct AddressNormalizer;

impl AddressNormalizer {
    pub fn normalize(raw: &str) -> Result<Address, InvalidAddress> {
        let trimmed = raw.trim();

        if let Some(inner) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return inner
                .parse::<Ipv6Addr>()
                .map(|v6| Address::from_ip(IpAddr::V6(v6)))
                .map_err(|_| InvalidAddress::new(raw));
        }

        trimmed
            .parse::<IpAddr>()
            .map(Address::from_ip)
            .map_err(|_| InvalidAddress::new(raw))
    }
}
