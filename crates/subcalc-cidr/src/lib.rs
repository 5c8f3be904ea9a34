//! Subnet math and CIDR range summarization
//!
//! Provides the numeric half of the calculator:
//! - Resolve an address plus a prefix length or netmask into a [`Network`]
//! - Derive netmask, wildcard, broadcast and usable host range ([`subnet`])
//! - Summarize an address range into a minimal CIDR list ([`summarize`])
//! - Build exact match patterns from a summary ([`pattern`])
//! - Produce the boundary-facing success/error mappings ([`report`])
//!
//! # Examples
//!
//! ```
//! use subcalc_cidr::Network;
//!
//! let net = Network::resolve("192.168.1.77", "255.255.255.0").unwrap();
//! assert_eq!(net.prefix_len(), 24);
//! assert_eq!(net.to_string(), "192.168.1.0/24");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv6Addr;
use tracing::debug;

pub use subcalc_core::{Address, CalcError, IpVersion, Result};
use subcalc_core::{low_mask, prefix_mask};

pub mod pattern;
pub mod report;
pub mod subnet;
pub mod summarize;

pub use subnet::{derive, HostCount, SubnetDetails};
pub use summarize::summarize;

const INVALID_SPEC: &str = "Please enter a valid CIDR or Netmask.";

/// Canonical network: base address with host bits cleared, plus prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Network {
    /// Network (base) address
    base: Address,
    /// Prefix length (0-32 or 0-128)
    prefix_len: u8,
}

impl Network {
    /// Create network from any address in it and a prefix length
    ///
    /// Host bits in `address` are discarded.
    pub fn new(address: Address, prefix_len: u8) -> Result<Self> {
        let version = address.version();
        if prefix_len > version.width() {
            return Err(CalcError::InvalidNetworkSpec(format!(
                "prefix length must be between 0 and {}",
                version.width()
            )));
        }

        Ok(Self::from_parts(version, address.to_bits(), prefix_len))
    }

    /// Build from raw parts already known to be in range
    pub(crate) fn from_parts(version: IpVersion, bits: u128, prefix_len: u8) -> Self {
        let mask = prefix_mask(version.width(), prefix_len);
        Self {
            base: Address::from_bits(version, bits & mask),
            prefix_len,
        }
    }

    /// Resolve an address and a network specifier
    ///
    /// `spec` is either a decimal prefix length or a netmask (dotted-quad for
    /// IPv4, colon-hex for IPv6). Which form applies is decided by syntax
    /// alone: pure digits are a prefix length, anything with `.` or `:` is a
    /// mask.
    ///
    /// # Examples
    ///
    /// ```
    /// use subcalc_cidr::Network;
    ///
    /// let net = Network::resolve("2001:db8::1", "64").unwrap();
    /// assert_eq!(net.to_string(), "2001:db8::/64");
    /// assert!(Network::resolve("10.0.0.1", "255.0.255.0").is_err());
    /// ```
    pub fn resolve(address: &str, spec: &str) -> Result<Self> {
        let address = Address::parse(address)?;
        let prefix_len = parse_spec(address.version(), spec)?;
        let network = Self::new(address, prefix_len)?;
        debug!(%address, spec = %spec, %network, "resolved network");
        Ok(network)
    }

    /// Parse `address/spec` notation
    pub fn parse(cidr: &str) -> Result<Self> {
        match cidr.split_once('/') {
            Some((address, spec)) => Self::resolve(address, spec),
            None => Err(CalcError::InvalidNetworkSpec(
                "expected format: address/prefix".to_string(),
            )),
        }
    }

    /// Network (base) address
    pub fn network(&self) -> Address {
        self.base
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Address family
    pub fn version(&self) -> IpVersion {
        self.base.version()
    }

    /// Netmask as an integer
    pub fn mask(&self) -> u128 {
        prefix_mask(self.version().width(), self.prefix_len)
    }

    /// Netmask in address form
    pub fn netmask(&self) -> Address {
        Address::from_bits(self.version(), self.mask())
    }

    /// Wildcard (host) mask in address form
    pub fn hostmask(&self) -> Address {
        Address::from_bits(self.version(), self.host_bits_mask())
    }

    /// First address as an integer
    pub fn first(&self) -> u128 {
        self.base.to_bits()
    }

    /// Last address as an integer (all host bits set)
    pub fn last(&self) -> u128 {
        self.first() | self.host_bits_mask()
    }

    /// Last address in the block; the broadcast address for IPv4
    pub fn broadcast(&self) -> Address {
        Address::from_bits(self.version(), self.last())
    }

    /// Number of host bits
    pub fn host_bits(&self) -> u8 {
        self.version().width() - self.prefix_len
    }

    /// Check if address is in this network
    pub fn contains(&self, address: &Address) -> bool {
        address.version() == self.version() && address.to_bits() & self.mask() == self.first()
    }

    fn host_bits_mask(&self) -> u128 {
        low_mask(self.host_bits())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

impl std::str::FromStr for Network {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        Network::parse(s)
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Network::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Resolve an address and network specifier; see [`Network::resolve`]
pub fn resolve(address: &str, spec: &str) -> Result<Network> {
    Network::resolve(address, spec)
}

/// Interpret a network specifier as a prefix length for `version`
pub fn parse_spec(version: IpVersion, spec: &str) -> Result<u8> {
    let width = version.width();

    if !spec.is_empty() && spec.chars().all(|c| c.is_ascii_digit()) {
        // at most as many digits as the widest prefix ("32" or "128")
        let max_digits = width.to_string().len();
        return match spec.parse::<u8>() {
            Ok(prefix_len) if spec.len() <= max_digits && prefix_len <= width => Ok(prefix_len),
            _ => Err(CalcError::InvalidNetworkSpec(format!(
                "prefix length must be between 0 and {}",
                width
            ))),
        };
    }

    let mask = match version {
        IpVersion::V4 if spec.contains('.') && !spec.contains(':') => parse_dotted_mask(spec)?,
        IpVersion::V6 if spec.contains(':') => spec
            .parse::<Ipv6Addr>()
            .map(u128::from)
            .map_err(|_| CalcError::InvalidNetworkSpec(format!("'{}' is not an IPv6 netmask", spec)))?,
        _ => return Err(CalcError::InvalidNetworkSpec(INVALID_SPEC.to_string())),
    };

    mask_to_prefix(mask, width).ok_or_else(|| {
        CalcError::InvalidNetworkSpec(format!("'{}' is not a contiguous netmask", spec))
    })
}

/// Prefix length of a contiguous netmask or hostmask
///
/// A value that is both (all zeros) is read as a netmask.
pub fn mask_to_prefix(mask: u128, width: u8) -> Option<u8> {
    let full = low_mask(width);
    let mask = mask & full;

    let inverted = !mask & full;
    if inverted & inverted.wrapping_add(1) == 0 {
        return Some(width - inverted.count_ones() as u8);
    }

    if mask & mask.wrapping_add(1) == 0 {
        return Some(width - mask.count_ones() as u8);
    }

    None
}

fn parse_dotted_mask(spec: &str) -> Result<u128> {
    let octets: Vec<&str> = spec.split('.').collect();
    let out_of_range =
        || CalcError::InvalidNetworkSpec("netmask must have four octets between 0 and 255".to_string());

    if octets.len() != 4 {
        return Err(out_of_range());
    }

    let mut result = 0u32;
    for (i, octet_str) in octets.iter().enumerate() {
        let leading_zero = octet_str.len() > 1 && octet_str.starts_with('0');
        if octet_str.is_empty() || octet_str.len() > 3 || leading_zero {
            return Err(out_of_range());
        }
        let octet: u8 = octet_str.parse().map_err(|_| out_of_range())?;
        result |= (octet as u32) << (24 - i * 8);
    }

    Ok(result as u128)
}
