//! Mock Catalog
//!
//! Curated answers for a handful of well-known public addresses, used when
//! no database can answer.

use crate::domain::entities::GeoRecord;
use crate::domain::value_objects::Address;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// One curated address.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub ip: IpAddr,
    pub location: &'static str,
    pub operator: &'static str,
    /// Public recursive DNS resolver (consulted by the classifier too)
    pub resolver: bool,
}

const fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

#[allow(clippy::too_many_arguments)]
const fn v6(a: u16, b: u16, c: u16, d: u16, e: u16, f: u16, g: u16, h: u16) -> IpAddr {
    IpAddr::V6(Ipv6Addr::new(a, b, c, d, e, f, g, h))
}

const fn resolver(ip: IpAddr, location: &'static str, operator: &'static str) -> CatalogEntry {
    CatalogEntry {
        ip,
        location,
        operator,
        resolver: true,
    }
}

const fn landmark(ip: IpAddr, location: &'static str, operator: &'static str) -> CatalogEntry {
    CatalogEntry {
        ip,
        location,
        operator,
        resolver: false,
    }
}

static ENTRIES: &[CatalogEntry] = &[
    resolver(v4(8, 8, 8, 8), "United States", "Google DNS"),
    resolver(v4(1, 1, 1, 1), "United States", "Cloudflare DNS"),
    resolver(v4(114, 114, 114, 114), "China", "114DNS"),
    resolver(v4(223, 5, 5, 5), "China, Hangzhou", "Alibaba Cloud DNS"),
    resolver(v4(119, 29, 29, 29), "China, Shenzhen", "Tencent DNS"),
    resolver(v4(180, 76, 76, 76), "China, Beijing", "Baidu DNS"),
    resolver(v4(208, 67, 222, 222), "United States", "OpenDNS"),
    resolver(v4(9, 9, 9, 9), "United States", "Quad9 DNS"),
    resolver(v6(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888), "United States", "Google DNS"),
    resolver(v6(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111), "United States", "Cloudflare DNS"),
    resolver(v6(0x2400, 0x3200, 0, 0, 0, 0, 0, 0x1), "China, Hangzhou", "Alibaba Cloud DNS"),
    resolver(v6(0x2620, 0xfe, 0, 0, 0, 0, 0, 0xfe), "United States", "Quad9 DNS"),
    landmark(v4(198, 41, 0, 4), "United States", "Verisign (a.root-servers.net)"),
    landmark(v4(199, 9, 14, 201), "United States", "USC-ISI (b.root-servers.net)"),
    landmark(
        v6(0x2001, 0x503, 0xba3e, 0, 0, 0, 0x2, 0x30),
        "United States",
        "Verisign (a.root-servers.net)",
    ),
];

/// Static lookup table of well-known public addresses.
pub struct MockCatalog;

impl MockCatalog {
    /// All curated entries, in table order.
    pub fn entries() -> &'static [CatalogEntry] {
        ENTRIES
    }

    /// Look up any curated address.
    pub fn lookup(addr: &Address) -> Option<GeoRecord> {
        Self::find(addr, |_| true)
    }

    /// Look up only curated public DNS resolvers.
    pub fn lookup_resolver(addr: &Address) -> Option<GeoRecord> {
        Self::find(addr, |entry| entry.resolver)
    }

    fn find<F>(addr: &Address, filter: F) -> Option<GeoRecord>
    where
        F: Fn(&CatalogEntry) -> bool,
    {
        // ::ffff:8.8.8.8 is the same host as 8.8.8.8
        let mapped = addr.as_ipv4().map(IpAddr::V4);

        Self::entries()
            .iter()
            .filter(|entry| filter(entry))
            .find(|entry| entry.ip == addr.ip() || Some(entry.ip) == mapped)
            .map(|entry| GeoRecord::new(entry.location, entry.operator))
    }
}
