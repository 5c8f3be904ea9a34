//! Core types for subcalc (IPv4/IPv6 network calculator)
//!
//! This crate provides the foundational types used throughout the workspace:
//! - [`Address`] - a parsed IPv4 or IPv6 address
//! - [`IpVersion`] - address family and bit width
//! - [`CalcError`] - the error taxonomy shared by every calculation
//! - [`validate::sanitize`] - character-level input screening
//!
//! ```
//! use subcalc_core::{Address, IpVersion};
//!
//! let addr = Address::parse("192.168.1.10").unwrap();
//! assert_eq!(addr.version(), IpVersion::V4);
//! ```

use std::fmt;
use thiserror::Error;

mod address;
pub mod validate;

pub use address::{Address, AddressKind};

/// IP protocol version
///
/// Selected once when an address is parsed and carried through the rest of
/// the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpVersion {
    /// 32-bit IPv4
    V4,
    /// 128-bit IPv6
    V6,
}

impl IpVersion {
    /// Number of bits in an address of this version
    pub fn width(self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }

    /// Largest integer value an address of this version can hold
    pub fn max_value(self) -> u128 {
        match self {
            IpVersion::V4 => u32::MAX as u128,
            IpVersion::V6 => u128::MAX,
        }
    }

    /// Version number as reported to users (4 or 6)
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

/// Error types for calculator operations
///
/// Every variant is recoverable: callers turn it into a message for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// A required field was missing or blank
    #[error("{0} is required")]
    EmptyInput(String),

    /// Raw input contained symbols outside the address alphabet
    #[error("{0} contains invalid characters")]
    InvalidCharacters(String),

    /// Text parsed as neither IPv4 nor IPv6
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// Network specifier is not a valid prefix length or netmask
    #[error("Invalid network input: {0}")]
    InvalidNetworkSpec(String),

    /// Integer range is reversed or wider than the address family
    #[error("Invalid address range: {first} - {last}")]
    InvalidRange { first: u128, last: u128 },
}

/// Result type alias for calculator operations
pub type Result<T> = std::result::Result<T, CalcError>;

/// Mask with the top `prefix_len` bits of a `width`-bit value set
///
/// `prefix_len` larger than `width` is clamped to `width`.
pub fn prefix_mask(width: u8, prefix_len: u8) -> u128 {
    let full = full_mask(width);
    let host_bits = width.saturating_sub(prefix_len) as u32;
    full.checked_shl(host_bits).unwrap_or(0) & full
}

/// Mask with the low `bits` bits set
pub fn low_mask(bits: u8) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

fn full_mask(width: u8) -> u128 {
    low_mask(width)
}
