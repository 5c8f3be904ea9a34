//! Range to minimal CIDR list
//!
//! Walks an inclusive integer range from its low end, emitting at each step
//! the largest block that is aligned at the current floor and still fits in
//! what remains. The result is the unique minimal covering: no gaps, no
//! overlaps, nothing outside the range.

use crate::{Address, CalcError, IpVersion, Network, Result};
use subcalc_core::low_mask;
use tracing::debug;

/// Summarize the inclusive range `[first, last]` into CIDR blocks
///
/// Blocks come back in ascending order. Fails if `first > last` or either
/// bound is wider than `version` allows.
///
/// # Examples
///
/// ```
/// use subcalc_cidr::{summarize, IpVersion};
///
/// // 10.0.0.1 - 10.0.0.6
/// let blocks = summarize(0x0A000001, 0x0A000006, IpVersion::V4).unwrap();
/// let text: Vec<String> = blocks.iter().map(|b| b.to_string()).collect();
/// assert_eq!(text, ["10.0.0.1/32", "10.0.0.2/31", "10.0.0.4/31", "10.0.0.6/32"]);
/// ```
pub fn summarize(first: u128, last: u128, version: IpVersion) -> Result<Vec<Network>> {
    if first > last || last > version.max_value() {
        return Err(CalcError::InvalidRange { first, last });
    }

    let blocks = walk(first, last, version);
    debug!(version = %version, first = %first, last = %last, blocks = blocks.len(), "summarized range");
    Ok(blocks)
}

/// Summarize the range between two addresses of the same family
pub fn summarize_addresses(first: &Address, last: &Address) -> Result<Vec<Network>> {
    if first.version() != last.version() {
        return Err(CalcError::InvalidRange {
            first: first.to_bits(),
            last: last.to_bits(),
        });
    }
    summarize(first.to_bits(), last.to_bits(), first.version())
}

/// Summarize the address span of a network
pub fn summarize_network(network: &Network) -> Vec<Network> {
    walk(network.first(), network.last(), network.version())
}

/// Check whether any block contains `address`
pub fn covers(blocks: &[Network], address: &Address) -> bool {
    blocks.iter().any(|b| b.contains(address))
}

/// Emit maximal aligned blocks from `first` up to `last`; bounds must be valid
fn walk(first: u128, last: u128, version: IpVersion) -> Vec<Network> {
    let width = version.width();
    let mut blocks = Vec::new();
    let mut floor = first;

    loop {
        let align = if floor == 0 {
            width
        } else {
            (floor.trailing_zeros() as u8).min(width)
        };
        let bits = align.min(fit_bits(last - floor));
        let block_last = floor | low_mask(bits);

        blocks.push(Network::from_parts(version, floor, width - bits));

        if block_last >= last {
            break;
        }
        floor = block_last + 1;
    }

    blocks
}

/// floor(log2(span + 1)): largest block size (in bits) fitting `span + 1` addresses
fn fit_bits(span: u128) -> u8 {
    if span == u128::MAX {
        128
    } else {
        (127 - (span + 1).leading_zeros()) as u8
    }
}
