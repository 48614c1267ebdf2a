//! Address Classifier
//!
//! Pure domain logic that labels non-public addresses from their structure
//! alone. This service has NO external dependencies - it's pure Rust.

use crate::domain::entities::GeoRecord;
use crate::domain::services::MockCatalog;
use crate::domain::value_objects::Address;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The rule that produced a [`Classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationRule {
    /// Curated public DNS resolver
    WellKnownResolver,
    /// 127.0.0.0/8, ::1
    Loopback,
    /// 10.0.0.0/8
    PrivateClassA,
    /// 172.16.0.0/12
    PrivateClassB,
    /// 192.168.0.0/16
    PrivateClassC,
    /// fc00::/7
    UniqueLocal,
    /// fe80::/10
    LinkLocal,
    /// 169.254.0.0/16
    AutoConfiguration,
    /// 224.0.0.0/4, ff00::/8
    Multicast,
    /// 2001:db8::/32
    Documentation,
}

impl ClassificationRule {
    /// Rules backed by the curated catalog rather than address structure.
    pub fn is_curated(&self) -> bool {
        matches!(self, Self::WellKnownResolver)
    }

    /// Fixed (location, operator) label; curated rules have none.
    pub fn label(&self) -> Option<(&'static str, &'static str)> {
        let label = match self {
            Self::WellKnownResolver => return None,
            Self::Loopback => ("local loopback", "localhost"),
            Self::PrivateClassA | Self::PrivateClassB => {
                ("private network, enterprise", "local area network")
            }
            Self::PrivateClassC => ("private network, LAN", "local area network"),
            Self::UniqueLocal => ("private network (IPv6)", "local area network"),
            Self::LinkLocal => ("link-local", "local link"),
            Self::AutoConfiguration => ("auto-configuration address", "local link"),
            Self::Multicast => ("multicast", "multicast group"),
            Self::Documentation => ("documentation/test network", "reserved"),
        };
        Some(label)
    }
}

/// Result of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub rule: ClassificationRule,
    pub record: GeoRecord,
}

/// Offline classifier for loopback, private, link-local, multicast and
/// documentation ranges.
///
/// Rules are evaluated in a fixed order and the first match wins:
/// 1. Curated public resolvers
/// 2. IPv6 structural rules (IPv4-mapped addresses use the IPv4 rules)
/// 3. IPv4 structural rules
pub struct AddressClassifier;

impl AddressClassifier {
    pub fn classify(addr: &Address) -> Option<Classification> {
        if let Some(record) = MockCatalog::lookup_resolver(addr) {
            return Some(Classification {
                rule: ClassificationRule::WellKnownResolver,
                record,
            });
        }

        let rule = match addr.ip() {
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Self::classify_v4(v4),
                None => Self::classify_v6(v6),
            },
            IpAddr::V4(v4) => Self::classify_v4(v4),
        }?;
        let (location, operator) = rule.label()?;

        Some(Classification {
            rule,
            record: GeoRecord::new(location, operator),
        })
    }

    fn classify_v6(ip: Ipv6Addr) -> Option<ClassificationRule> {
        let segments = ip.segments();

        if ip.is_loopback() {
            Some(ClassificationRule::Loopback)
        } else if segments[0] & 0xfe00 == 0xfc00 {
            Some(ClassificationRule::UniqueLocal)
        } else if segments[0] & 0xffc0 == 0xfe80 {
            Some(ClassificationRule::LinkLocal)
        } else if ip.is_multicast() {
            Some(ClassificationRule::Multicast)
        } else if segments[0] == 0x2001 && segments[1] == 0x0db8 {
            Some(ClassificationRule::Documentation)
        } else {
            None
        }
    }

    fn classify_v4(ip: Ipv4Addr) -> Option<ClassificationRule> {
        match ip.octets() {
            [127, ..] => Some(ClassificationRule::Loopback),
            [10, ..] => Some(ClassificationRule::PrivateClassA),
            // 172.32.0.0 and up are public
            [172, 16..=31, ..] => Some(ClassificationRule::PrivateClassB),
            [192, 168, ..] => Some(ClassificationRule::PrivateClassC),
            [169, 254, ..] => Some(ClassificationRule::AutoConfiguration),
            [224..=239, ..] => Some(ClassificationRule::Multicast),
            _ => None,
        }
    }
}
