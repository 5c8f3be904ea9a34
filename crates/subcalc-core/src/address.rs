//! Address parsing and classification
//!
//! Parses dotted-quad IPv4 and colon-hex IPv6 text (zero compression and
//! embedded IPv4 included) and exposes the integer value, padded binary and
//! hexadecimal forms, the reverse-lookup name and scope flags.

use crate::{low_mask, prefix_mask, CalcError, IpVersion, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IPv4 blocks treated as private (IANA special-purpose registry)
const PRIVATE_V4: &[(u32, u8)] = &[
    (0x0000_0000, 8), // 0.0.0.0/8
    (0x0A00_0000, 8), // 10.0.0.0/8
    (0x7F00_0000, 8), // 127.0.0.0/8
    (0xA9FE_0000, 16), // 169.254.0.0/16
    (0xAC10_0000, 12), // 172.16.0.0/12
    (0xC000_0000, 29), // 192.0.0.0/29
    (0xC000_00AA, 31), // 192.0.0.170/31
    (0xC000_0200, 24), // 192.0.2.0/24
    (0xC0A8_0000, 16), // 192.168.0.0/16
    (0xC612_0000, 15), // 198.18.0.0/15
    (0xC633_6400, 24), // 198.51.100.0/24
    (0xCB00_7100, 24), // 203.0.113.0/24
    (0xF000_0000, 4), // 240.0.0.0/4
    (0xFFFF_FFFF, 32), // 255.255.255.255/32
];

/// Globally reachable carve-outs inside `PRIVATE_V4`
const GLOBAL_V4_EXCEPTIONS: &[(u32, u8)] = &[
    (0xC000_0009, 32), // 192.0.0.9/32
    (0xC000_000A, 32), // 192.0.0.10/32
];

/// 100.64.0.0/10, carrier-grade NAT: neither private nor global
const SHARED_V4: (u32, u8) = (0x6440_0000, 10);

/// IPv6 blocks treated as private
const PRIVATE_V6: &[(u128, u8)] = &[
    (0x1, 128), // ::1/128
    (0x0, 128), // ::/128
    (0x0064_FF9B_0001 << 80, 48), // 64:ff9b:1::/48
    (0x0100 << 112, 64), // 100::/64
    (0x2001 << 112, 23), // 2001::/23
    (0x2001_0DB8 << 96, 32), // 2001:db8::/32
    (0x2001_0010 << 96, 28), // 2001:10::/28
    (0xFC00 << 112, 7), // fc00::/7
    (0xFE80 << 112, 10), // fe80::/10
];

/// Globally reachable carve-outs inside `PRIVATE_V6`
const GLOBAL_V6_EXCEPTIONS: &[(u128, u8)] = &[
    ((0x2001_0001 << 96) | 1, 128), // 2001:1::1/128
    ((0x2001_0001 << 96) | 2, 128), // 2001:1::2/128
    (0x2001_0003 << 96, 32), // 2001:3::/32
    (0x2001_0004_0112 << 80, 48), // 2001:4:112::/48
    (0x2001_0020 << 96, 28), // 2001:20::/28
    (0x2001_0030 << 96, 28), // 2001:30::/28
];

/// Coarse classification reported to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    Private,
    Public,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Private => f.write_str("Private"),
            AddressKind::Public => f.write_str("Public"),
        }
    }
}

/// A parsed IP address
///
/// The variant is chosen once at parse time; everything downstream dispatches
/// on it rather than re-inspecting text.
///
/// # Examples
///
/// ```
/// use subcalc_core::Address;
///
/// let addr = Address::parse("2001:db8::1").unwrap();
/// assert_eq!(addr.to_bits(), 0x2001_0db8_0000_0000_0000_0000_0000_0001);
/// assert_eq!(addr.to_string(), "2001:db8::1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl Address {
    /// Parse textual IPv4 or IPv6 address
    pub fn parse(text: &str) -> Result<Self> {
        match text.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => Ok(Address::V4(v4)),
            Ok(IpAddr::V6(v6)) => Ok(Address::V6(v6)),
            Err(_) => Err(CalcError::InvalidAddress(text.to_string())),
        }
    }

    /// Build an address of the given version from its integer value
    ///
    /// Bits above the version's width are discarded.
    pub fn from_bits(version: IpVersion, value: u128) -> Self {
        let value = value & version.max_value();
        match version {
            IpVersion::V4 => Address::V4(Ipv4Addr::from(value as u32)),
            IpVersion::V6 => Address::V6(Ipv6Addr::from(value)),
        }
    }

    /// Address family
    pub fn version(&self) -> IpVersion {
        match self {
            Address::V4(_) => IpVersion::V4,
            Address::V6(_) => IpVersion::V6,
        }
    }

    /// Big-endian integer value
    pub fn to_bits(&self) -> u128 {
        match self {
            Address::V4(v4) => u32::from(*v4) as u128,
            Address::V6(v6) => u128::from(*v6),
        }
    }

    /// Zero-padded binary string (32 or 128 digits)
    pub fn to_binary(&self) -> String {
        match self {
            Address::V4(v4) => format!("{:032b}", u32::from(*v4)),
            Address::V6(v6) => format!("{:0128b}", u128::from(*v6)),
        }
    }

    /// Zero-padded lowercase hexadecimal string (8 or 32 digits)
    pub fn to_hex(&self) -> String {
        match self {
            Address::V4(v4) => format!("{:08x}", u32::from(*v4)),
            Address::V6(v6) => format!("{:032x}", u128::from(*v6)),
        }
    }

    /// Name used for PTR lookups (`in-addr.arpa` / `ip6.arpa`)
    pub fn reverse_pointer(&self) -> String {
        match self {
            Address::V4(v4) => {
                let o = v4.octets();
                format!("{}.{}.{}.{}.in-addr.arpa", o[3], o[2], o[1], o[0])
            }
            Address::V6(_) => {
                let nibbles: Vec<String> =
                    self.to_hex().chars().rev().map(|c| c.to_string()).collect();
                format!("{}.ip6.arpa", nibbles.join("."))
            }
        }
    }

    /// Address falls inside a private or special-purpose block
    ///
    /// IPv4-mapped IPv6 addresses are judged by their embedded IPv4 address.
    pub fn is_private(&self) -> bool {
        match self {
            Address::V4(_) => {
                self.in_any(PRIVATE_V4) && !self.in_any(GLOBAL_V4_EXCEPTIONS)
            }
            Address::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Address::V4(v4).is_private(),
                None => self.in_any(PRIVATE_V6) && !self.in_any(GLOBAL_V6_EXCEPTIONS),
            },
        }
    }

    /// Address is publicly routable
    pub fn is_global(&self) -> bool {
        match self {
            Address::V4(_) => {
                let (base, len) = SHARED_V4;
                !self.in_block(base as u128, len) && !self.is_private()
            }
            Address::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Address::V4(v4).is_global(),
                None => !self.is_private(),
            },
        }
    }

    pub fn is_loopback(&self) -> bool {
        match self {
            Address::V4(v4) => v4.is_loopback(),
            Address::V6(v6) => v6.is_loopback(),
        }
    }

    pub fn is_multicast(&self) -> bool {
        match self {
            Address::V4(v4) => v4.is_multicast(),
            Address::V6(v6) => v6.is_multicast(),
        }
    }

    pub fn is_link_local(&self) -> bool {
        match self {
            Address::V4(v4) => v4.is_link_local(),
            Address::V6(_) => self.in_block(0xFE80 << 112, 10),
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.to_bits() == 0
    }

    /// Private/Public classification
    pub fn kind(&self) -> AddressKind {
        if self.is_private() {
            AddressKind::Private
        } else {
            AddressKind::Public
        }
    }

    fn in_any<T: Copy + Into<u128>>(&self, table: &[(T, u8)]) -> bool {
        table
            .iter()
            .any(|&(base, len)| self.in_block(base.into(), len))
    }

    fn in_block(&self, base: u128, prefix_len: u8) -> bool {
        let width = self.version().width();
        let mask = prefix_mask(width, prefix_len);
        self.to_bits() & mask == base & mask & low_mask(width)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::V4(v4) => fmt::Display::fmt(v4, f),
            Address::V6(v6) => fmt::Display::fmt(v6, f),
        }
    }
}

impl std::str::FromStr for Address {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Address::V4(v4),
            IpAddr::V6(v6) => Address::V6(v6),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::parse(&text).map_err(serde::de::Error::custom)
    }
}
