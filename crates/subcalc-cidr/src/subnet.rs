//! Derived subnet properties
//!
//! The usable host range depends on both address family and prefix length.
//! All of it is decided in one place, [`host_range`], keyed by
//! `(version, prefix_len)`:
//!
//! | Version | prefix | HostMin | HostMax | Usable |
//! |---|---|---|---|---|
//! | v4 | 32 | base | base | 1 |
//! | v4 | 31 | base | last | 2 |
//! | v4 | 0-30 | base+1 | last-1 | total-2 |
//! | v6 | 128 | base | base | 1 |
//! | v6 | 127 | base | last | 2 |
//! | v6 | 0-126 | base+1 | last-1 | total |

use crate::{Address, IpVersion, Network};
use serde::{Serialize, Serializer};
use std::fmt;

/// Decimal form of 2^128, the size of `::/0`
const TWO_POW_128: &str = "340282366920938463463374607431768211456";

/// Number of usable hosts
///
/// Only `::/0` overflows a `u128`; it gets its own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCount {
    Finite(u128),
    TwoPow128,
}

impl HostCount {
    /// Total addresses in a block with `host_bits` free bits
    pub fn of_block(host_bits: u8) -> Self {
        if host_bits >= 128 {
            HostCount::TwoPow128
        } else {
            HostCount::Finite(1u128 << host_bits)
        }
    }
}

impl fmt::Display for HostCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCount::Finite(n) => write!(f, "{}", n),
            HostCount::TwoPow128 => f.write_str(TWO_POW_128),
        }
    }
}

// JSON numbers up to u64, decimal strings beyond (IPv6 /64 and wider).
impl Serialize for HostCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            HostCount::Finite(n) => match u64::try_from(*n) {
                Ok(small) => serializer.serialize_u64(small),
                Err(_) => serializer.collect_str(n),
            },
            HostCount::TwoPow128 => serializer.serialize_str(TWO_POW_128),
        }
    }
}

/// Everything derived from a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetDetails {
    pub network: Network,
    pub netmask: Address,
    pub wildcard: Address,
    pub broadcast: Address,
    pub host_min: Address,
    pub host_max: Address,
    pub total_hosts: HostCount,
}

/// Derive netmask, wildcard, last address and usable host range
///
/// # Examples
///
/// ```
/// use subcalc_cidr::{derive, HostCount, Network};
///
/// let details = derive(&Network::resolve("192.168.1.10", "31").unwrap());
/// assert_eq!(details.host_min.to_string(), "192.168.1.10");
/// assert_eq!(details.host_max.to_string(), "192.168.1.11");
/// assert_eq!(details.total_hosts, HostCount::Finite(2));
/// ```
pub fn derive(network: &Network) -> SubnetDetails {
    let (host_min, host_max, total_hosts) = host_range(network);
    let version = network.version();

    SubnetDetails {
        network: *network,
        netmask: network.netmask(),
        wildcard: network.hostmask(),
        broadcast: network.broadcast(),
        host_min: Address::from_bits(version, host_min),
        host_max: Address::from_bits(version, host_max),
        total_hosts,
    }
}

/// Usable `(min, max, count)` for a network
pub fn host_range(network: &Network) -> (u128, u128, HostCount) {
    let first = network.first();
    let last = network.last();

    match (network.version(), network.prefix_len()) {
        (IpVersion::V4, 32) | (IpVersion::V6, 128) => (first, first, HostCount::Finite(1)),
        (IpVersion::V4, 31) | (IpVersion::V6, 127) => (first, last, HostCount::Finite(2)),
        (IpVersion::V4, _) => {
            let total = 1u128 << network.host_bits();
            (first + 1, last - 1, HostCount::Finite(total.saturating_sub(2)))
        }
        (IpVersion::V6, _) => (first + 1, last - 1, HostCount::of_block(network.host_bits())),
    }
}
